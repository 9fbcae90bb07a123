// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Fanning independent samples out over threads.

Every expensive loop in this crate has the same shape: fill slot `i` of a
pre-sized buffer with a pure function of `i`. The buffer is cut into
disjoint contiguous chunks before any work starts and each rayon task owns
its chunk outright, so there is no locking and the result does not depend on
scheduling: a parallel run is bit-identical to a sequential one.

*/

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::errors::{Error, Result};

/// Aim for this many chunks per worker thread, to even out the load.
const CHUNKS_PER_THREAD: usize = 8;


/// How to run an indexed loop.
#[derive(Copy,Clone,Debug,Eq,Hash,PartialEq)]
pub enum Executor {
    /// On the calling thread.
    Sequential,

    /// On a rayon thread pool. With `threads: None` the current pool is
    /// used (the global one, sized to the hardware, unless inside
    /// [`Executor::install`]); otherwise a dedicated pool with the given
    /// number of threads is built for each call to `fill`.
    Parallel {
        /// The number of worker threads, if not the default.
        threads: Option<usize>,
    },
}

impl Default for Executor {
    fn default() -> Self {
        Executor::Parallel { threads: None }
    }
}

impl Executor {
    /// Set `out[i] = f(i)` for every index of `out`.
    pub fn fill<T, F>(&self, out: &mut [T], f: F) -> Result<()>
        where T: Send, F: Fn(usize) -> T + Sync
    {
        match *self {
            Executor::Sequential => {
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = f(i);
                }
            },

            Executor::Parallel { threads: None } => fill_chunks(out, &f),

            Executor::Parallel { threads: Some(n) } => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| Error::WorkerPool(e.to_string()))?;
                pool.install(|| fill_chunks(out, &f));
            },
        }

        Ok(())
    }

    /// Run `f` with a dedicated thread pool already in place.
    ///
    /// With `threads: Some(n)` the pool is built once here and `f` receives
    /// an executor that fans out onto it, so repeated loops inside `f` share
    /// one pool. Other executors are passed through unchanged.
    pub fn install<R, F>(&self, f: F) -> Result<R>
        where R: Send, F: FnOnce(Executor) -> R + Send
    {
        match *self {
            Executor::Parallel { threads: Some(n) } => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| Error::WorkerPool(e.to_string()))?;
                Ok(pool.install(|| f(Executor::Parallel { threads: None })))
            },

            other => Ok(f(other)),
        }
    }

    /// Allocate a buffer of `n` elements and fill it with `f(i)`.
    pub fn collect<T, F>(&self, n: usize, f: F) -> Result<Vec<T>>
        where T: Send + Default + Clone, F: Fn(usize) -> T + Sync
    {
        let mut out = vec![T::default(); n];
        self.fill(&mut out, f)?;
        Ok(out)
    }
}


fn fill_chunks<T, F>(out: &mut [T], f: &F)
    where T: Send, F: Fn(usize) -> T + Sync
{
    let chunk_len = (out.len() / (rayon::current_num_threads() * CHUNKS_PER_THREAD)).max(1);

    out.par_chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(c, slots)| {
            let start = c * chunk_len;

            for (j, slot) in slots.iter_mut().enumerate() {
                *slot = f(start + j);
            }
        });
}


#[cfg(test)]
mod tests {
    use super::Executor;

    fn work(i: usize) -> f64 {
        let x = i as f64 * 1e-3;
        (0..200).map(|k| (x * k as f64).sin() / (1. + k as f64)).sum()
    }

    #[test]
    fn parallel_matches_sequential() {
        let seq = Executor::Sequential.collect(10007, work).unwrap();

        for ex in &[Executor::Parallel { threads: None }, Executor::Parallel { threads: Some(3) }] {
            let par = ex.collect(10007, work).unwrap();
            assert_eq!(seq, par);
        }
    }

    #[test]
    fn index_order_is_preserved() {
        let v = Executor::default().collect(1000, |i| i).unwrap();
        assert!(v.iter().enumerate().all(|(i, &x)| i == x));
    }

    #[test]
    fn installed_pool_is_shared() {
        let (inner, sizes) = Executor::Parallel { threads: Some(3) }.install(|ex| {
            let sizes: Vec<usize> = (0..4).map(|_| {
                ex.collect(64, |_| rayon::current_num_threads()).unwrap()[0]
            }).collect();
            (ex, sizes)
        }).unwrap();

        assert_eq!(inner, Executor::Parallel { threads: None });
        assert!(sizes.iter().all(|&n| n == 3));

        let seq = Executor::Sequential.install(|ex| ex).unwrap();
        assert_eq!(seq, Executor::Sequential);
    }

    #[test]
    fn empty_buffer() {
        let v: Vec<f64> = Executor::default().collect(0, work).unwrap();
        assert!(v.is_empty());
    }
}
