// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! A thermal core plus a Gaussian shell of suprathermal particles.

This is a simple model of photo-electrons: a Maxwellian core at the electron
temperature, plus a small population concentrated around the speed `r =
sqrt(k_B T_ES / m)` set by a second, much higher temperature:

```text
f(v) = (1 - w) f_M(v) + w A exp(-s (|v| - r)² / (2 k_B T / m))
```

The shell steepness `s` sharpens the shell relative to the core’s thermal
width. The shell normalization `A` has no convenient closed form, so it is
computed numerically on the velocity axis that the Gordeyev integral uses;
that makes the normalization exact to the same quadrature error as
everything else.

*/

use crate::errors::{Error, Result};
use crate::maxwell::MaxwellDistribution;
use crate::quadrature::QuadratureRule;
use crate::{BOLTZMANN, DistributionFunction, ELEMENTARY_CHARGE, PI};

/// Default steepness of the shell relative to the thermal core.
pub const DEFAULT_STEEPNESS: f64 = 5.;

/// Default fraction of the particles in the shell.
pub const DEFAULT_SHELL_FRACTION: f64 = 1. / (1. + 1e4);


/// A Gaussian-shell velocity distribution. See the module-level
/// documentation for details.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct GaussShellDistribution {
    core: MaxwellDistribution,
    shell_temperature: f64,
    shell_speed: f64,
    steepness: f64,
    shell_fraction: f64,
    shell_norm: f64,
}

impl DistributionFunction for GaussShellDistribution {
    fn density(&self, v: f64) -> f64 {
        (1. - self.shell_fraction) * self.core.density(v)
            + self.shell_fraction * self.shell_norm * self.shell_profile(v)
    }
}

impl GaussShellDistribution {
    /// Create a new distribution. The core has temperature `temperature`
    /// (K) and the shell sits at the thermal speed of `shell_temperature`
    /// (K); `mass` is the particle mass (kg).
    ///
    /// The result is not yet usable; call `normalize` first.
    pub fn new(temperature: f64, shell_temperature: f64, mass: f64) -> Self {
        GaussShellDistribution {
            core: MaxwellDistribution::new(temperature, mass),
            shell_temperature,
            shell_speed: (BOLTZMANN * shell_temperature / mass).sqrt(),
            steepness: DEFAULT_STEEPNESS,
            shell_fraction: DEFAULT_SHELL_FRACTION,
            shell_norm: f64::NAN,
        }
    }

    /// Override the shell steepness and the fraction of particles in it.
    pub fn shape(mut self, steepness: f64, shell_fraction: f64) -> Self {
        self.steepness = steepness;
        self.shell_fraction = shell_fraction;
        self
    }

    /// Normalize the shell on the given velocity grid.
    pub fn normalize(mut self, velocity_axis: &[f64], rule: QuadratureRule) -> Result<Self> {
        if !(self.steepness > 0.) {
            return Err(Error::invalid("steepness", "must be positive"));
        }

        if !(self.shell_fraction >= 0. && self.shell_fraction <= 1.) {
            return Err(Error::invalid("shell_fraction", "must lie between 0 and 1"));
        }

        let integrand: Vec<f64> = velocity_axis.iter()
            .map(|&v| 4. * PI * v * v * self.shell_profile(v))
            .collect();
        let integral = rule.integrate(velocity_axis, &integrand)?;

        if !(integral > 0.) || !integral.is_finite() {
            return Err(Error::NumericDegeneracy(format!(
                "Gaussian shell at {:.3e} m/s cannot be normalized on the velocity grid (integral {})",
                self.shell_speed, integral
            )));
        }

        self.shell_norm = 1. / integral;
        Ok(self)
    }

    #[inline]
    fn shell_profile(&self, v: f64) -> f64 {
        let d = v.abs() - self.shell_speed;
        (-0.5 * self.steepness * d * d / self.core.thermal_variance()).exp()
    }

    /// The speed of the shell, in m/s.
    pub fn shell_speed(&self) -> f64 {
        self.shell_speed
    }

    /// The temperature setting the shell speed, in K.
    pub fn shell_temperature(&self) -> f64 {
        self.shell_temperature
    }

    /// The kinetic energy of a particle moving at the shell speed, in eV.
    pub fn shell_energy_ev(&self) -> f64 {
        0.5 * BOLTZMANN * self.shell_temperature / ELEMENTARY_CHARGE
    }
}
