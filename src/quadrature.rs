// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Composite quadrature on sampled, possibly non-uniform grids.

Every integral in this crate is evaluated on a fixed grid that is shared by
many integrands: the Gordeyev axis is the same for every frequency, and the
velocity axis is the same for every Gordeyev sample. So rather than adaptive
integrators we precompute a vector of weights once and take dot products.

Both rules accept non-uniform grids. Simpson’s rule works on consecutive
pairs of sub-intervals `(h0, h1)` and is exact for quadratics on each pair;
it needs an even number of sub-intervals, i.e. an odd number of samples.

*/

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};


/// Which composite rule to use.
#[derive(Copy,Clone,Debug,Eq,Hash,PartialEq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadratureRule {
    /// The trapezoid rule; error O(h²).
    Trapezoid,

    /// Simpson’s rule for non-uniform grids; error O(h⁴).
    Simpson,
}

impl Default for QuadratureRule {
    fn default() -> Self {
        QuadratureRule::Simpson
    }
}


impl QuadratureRule {
    /// Check that `x` is a grid this rule can integrate over.
    pub fn check_axis(&self, x: &[f64]) -> Result<()> {
        if x.len() < 2 {
            return Err(Error::invalid("axis", "need at least two samples"));
        }

        if x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(Error::invalid("axis", "samples must be finite and strictly increasing"));
        }

        if *self == QuadratureRule::Simpson && x.len() % 2 == 0 {
            return Err(Error::invalid(
                "axis",
                format!("Simpson's rule needs an even number of sub-intervals; got {}", x.len() - 1)
            ));
        }

        Ok(())
    }

    /// Compute weights `w` such that `Σ w[i] y[i]` approximates the integral
    /// of `y` over `x`.
    pub fn weights(&self, x: &[f64]) -> Result<Vec<f64>> {
        self.check_axis(x)?;
        let mut w = vec![0.; x.len()];

        match *self {
            QuadratureRule::Trapezoid => {
                for (i, pair) in x.windows(2).enumerate() {
                    let half = 0.5 * (pair[1] - pair[0]);
                    w[i] += half;
                    w[i + 1] += half;
                }
            },

            QuadratureRule::Simpson => {
                for i in (0..x.len() - 2).step_by(2) {
                    let (c0, c1, c2) = simpson_pair_coefficients(x[i + 1] - x[i], x[i + 2] - x[i + 1]);
                    w[i] += c0;
                    w[i + 1] += c1;
                    w[i + 2] += c2;
                }
            },
        }

        Ok(w)
    }

    /// Integrate the samples `y` over the grid `x`.
    pub fn integrate(&self, x: &[f64], y: &[f64]) -> Result<f64> {
        if x.len() != y.len() {
            return Err(Error::invalid(
                "axis",
                format!("grid has {} samples but integrand has {}", x.len(), y.len())
            ));
        }

        match *self {
            QuadratureRule::Trapezoid => {
                self.check_axis(x)?;
                Ok(trapezoid(x, y))
            },
            QuadratureRule::Simpson => simpson(x, y),
        }
    }
}


/// The weights of the three samples of one Simpson panel with sub-interval
/// widths `h0` and `h1`.
#[inline]
fn simpson_pair_coefficients(h0: f64, h1: f64) -> (f64, f64, f64) {
    let hs = h0 + h1;
    let scale = hs / 6.;
    (
        scale * (2. - h1 / h0),
        scale * hs * hs / (h0 * h1),
        scale * (2. - h0 / h1),
    )
}


/// The trapezoid rule: `Σ (x[i] - x[i-1]) (y[i] + y[i-1]) / 2`.
///
/// Mismatched lengths are truncated to the shorter slice; no further checks
/// are done.
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| 0.5 * (xs[1] - xs[0]) * (ys[1] + ys[0]))
        .sum()
}


/// Simpson’s rule on a possibly non-uniform grid.
pub fn simpson(x: &[f64], y: &[f64]) -> Result<f64> {
    QuadratureRule::Simpson.check_axis(x)?;

    if x.len() != y.len() {
        return Err(Error::invalid("axis", "grid and integrand lengths differ"));
    }

    let mut total = 0.;

    for i in (0..x.len() - 2).step_by(2) {
        let (c0, c1, c2) = simpson_pair_coefficients(x[i + 1] - x[i], x[i + 2] - x[i + 1]);
        total += c0 * y[i] + c1 * y[i + 1] + c2 * y[i + 2];
    }

    Ok(total)
}


/// `n` evenly spaced samples from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            v[n - 1] = stop;
            v
        }
    }
}


/// A grid from 0 to `max` that is denser near zero: the samples are
/// `linspace(0, max^(1/order), n)^order`.
///
/// The integrands we care about vary fastest near the origin (the Gordeyev
/// kernel) or are concentrated there (the velocity distributions).
pub fn warped_axis(max: f64, n: usize, order: i32) -> Vec<f64> {
    let root = max.powf(1. / order as f64);
    let mut v: Vec<f64> = linspace(0., root, n).into_iter().map(|x| x.powi(order)).collect();

    if let Some(last) = v.last_mut() {
        *last = max;
    }

    v
}


#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use super::*;

    fn sin_error(rule: QuadratureRule, n: usize) -> f64 {
        let x = linspace(0., PI, n);
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        (rule.integrate(&x, &y).unwrap() - 2.).abs()
    }

    #[test]
    fn trapezoid_is_second_order() {
        let coarse = sin_error(QuadratureRule::Trapezoid, 11);
        let fine = sin_error(QuadratureRule::Trapezoid, 21);
        assert!(coarse / fine > 3.5, "ratio {}", coarse / fine);
    }

    #[test]
    fn simpson_is_fourth_order() {
        let coarse = sin_error(QuadratureRule::Simpson, 11);
        let fine = sin_error(QuadratureRule::Simpson, 21);
        assert!(coarse / fine > 14., "ratio {}", coarse / fine);
    }

    #[test]
    fn simpson_quadratic_on_warped_grid() {
        let x = warped_axis(2., 41, 3);
        let y: Vec<f64> = x.iter().map(|v| 3. * v * v - v + 1.).collect();
        // ∫₀² (3x² - x + 1) dx = 8 - 2 + 2
        assert_approx_eq!(simpson(&x, &y).unwrap(), 8., 1e-10);
    }

    #[test]
    fn weights_match_direct_integration() {
        let x = warped_axis(1.5e-4, 101, 3);
        let y: Vec<f64> = x.iter().map(|v| (-v * 2e4).exp() * (v * 1e5).cos()).collect();

        for rule in &[QuadratureRule::Trapezoid, QuadratureRule::Simpson] {
            let w = rule.weights(&x).unwrap();
            let dot: f64 = w.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
            let direct = rule.integrate(&x, &y).unwrap();
            assert_approx_eq!(dot, direct, 1e-9 * direct.abs());
        }
    }

    #[test]
    fn simpson_rejects_odd_interval_count() {
        let x = linspace(0., 1., 10);
        let y = vec![1.; 10];
        assert!(QuadratureRule::Simpson.integrate(&x, &y).is_err());
        assert!(QuadratureRule::Trapezoid.integrate(&x, &y).is_ok());
    }

    #[test]
    fn rejects_non_increasing_grid() {
        let x = [0., 1., 1., 2., 3.];
        assert!(QuadratureRule::Trapezoid.check_axis(&x).is_err());
    }

    #[test]
    fn warped_axis_endpoints() {
        let v = warped_axis(6e6, 1001, 3);
        assert_eq!(v[0], 0.);
        assert_eq!(v[1000], 6e6);
        assert!(v[1] - v[0] < v[1000] - v[999]);
    }
}
