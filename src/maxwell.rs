// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! The Maxwell-Boltzmann distribution.

The density is `f(v) = (2π σ²)^(-3/2) exp(-v² / 2σ²)` with `σ² = k_B T / m`.
Its characteristic function along a gyro-orbit is Gaussian in `p(y)`, so the
Gordeyev integral needs no velocity integral at all.

*/

use crate::{BOLTZMANN, DistributionFunction, TWO_PI};


/// A Maxwellian velocity distribution. See the module-level documentation
/// for details.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct MaxwellDistribution {
    thermal_variance: f64,
}

impl DistributionFunction for MaxwellDistribution {
    fn density(&self, v: f64) -> f64 {
        (TWO_PI * self.thermal_variance).powf(-1.5) * self.exponential(v)
    }
}

impl MaxwellDistribution {
    /// Create a new distribution for particles of the given temperature (K)
    /// and mass (kg).
    pub fn new(temperature: f64, mass: f64) -> Self {
        MaxwellDistribution {
            thermal_variance: BOLTZMANN * temperature / mass,
        }
    }

    /// The squared thermal speed `k_B T / m`.
    pub fn thermal_variance(&self) -> f64 {
        self.thermal_variance
    }

    #[inline]
    fn exponential(&self, v: f64) -> f64 {
        (-0.5 * v * v / self.thermal_variance).exp()
    }

    /// The one-dimensional reduced distribution `(2π σ²)^(-1/2) exp(-v² /
    /// 2σ²)`, which integrates to unity over the real line.
    pub fn density_1d(&self, v: f64) -> f64 {
        (TWO_PI * self.thermal_variance).powf(-0.5) * self.exponential(v)
    }

    /// The Gordeyev kernel `exp(-ν y - p² σ² / 2)` at orbit parameter `p`
    /// (s/m), time `y` (s), and collision frequency `nu` (Hz).
    pub fn gordeyev_kernel(&self, p: f64, y: f64, nu: f64) -> f64 {
        (-nu * y - 0.5 * p * p * self.thermal_variance).exp()
    }
}
