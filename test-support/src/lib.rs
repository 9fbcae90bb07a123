// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

//! Helpers shared by the inscar tests, benchmarks, and demo programs.

#[macro_use] extern crate slog;

use slog::Drain;

/// Create a terminal `slog` logger for use in demo programs.
///
/// Records go through an asynchronous drain that blocks rather than drops
/// when its queue fills up, so nothing is lost at the end of a short run.
pub fn default_log() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain)
        .overflow_strategy(slog_async::OverflowStrategy::Block)
        .build().fuse();
    slog::Logger::root(drain, o!("app" => "inscar"))
}

/// A logger that swallows everything. Tests use this so that the output of
/// `cargo test` stays readable.
pub fn quiet_log() -> slog::Logger {
    slog::Logger::root(slog::Discard, o!())
}


/// A simple utility for sampling random numbers.
///
/// The distribution can be uniform or log-uniform.
pub struct Sampler {
    is_log: bool,
    low: f64,
    range: f64
}

impl Sampler {
    /// Create a new Sampler. The bounds may be given in either order.
    pub fn new(is_log: bool, low: f64, high: f64) -> Self {
        let (mut low, mut high) = if low > high { (high, low) } else { (low, high) };

        if is_log {
            low = low.ln();
            high = high.ln();
        }

        Sampler { is_log, low, range: high - low }
    }

    /// Sample a number from the distribution.
    pub fn get(&self) -> f64 {
        let n = self.low + rand::random::<f64>() * self.range;

        if self.is_log {
            n.exp()
        } else {
            n
        }
    }
}


/// The largest relative deviation of `ours` from `reference`, considering
/// only samples where the reference exceeds `floor` times its own peak.
///
/// Spectra span many orders of magnitude; comparing the far wings would just
/// measure round-off.
pub fn max_relative_deviation(ours: &[f64], reference: &[f64], floor: f64) -> f64 {
    assert_eq!(ours.len(), reference.len());

    let peak = reference.iter().cloned().fold(0., f64::max);
    let mut worst = 0_f64;

    for (a, b) in ours.iter().zip(reference.iter()) {
        if *b > floor * peak {
            worst = worst.max(((a - b) / b).abs());
        }
    }

    worst
}
