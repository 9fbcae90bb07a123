// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! The kappa (generalized Lorentzian) distribution.

```text
f(v) = A (1 + v² / (κ θ²))^(-κ-1),    θ² = (2κ - 3) / κ · k_B T / m
A = (π κ θ²)^(-3/2) Γ(κ + 1) / Γ(κ - 1/2)
```

With this choice of θ the kinetic temperature is *T* for every κ, and the
distribution tends to the Maxwellian of the same temperature as κ grows. A
finite temperature requires κ > 3/2.

The Gordeyev kernel is

```text
h(y) = exp(-ν y) z^(κ+1/2) K_(κ+1/2)(z) / (2^(κ-1/2) Γ(κ+1/2)),
z = p(y) sqrt((2κ - 3) k_B T / m)
```

where the normalizing denominator is exactly the `z → 0` limit of the
numerator. Both grow without bound with κ, so the ratio is formed from
logarithms.

*/

use crate::errors::{Error, Result};
use crate::special::{ln_gamma, ln_scaled_bessel_k};
use crate::{BOLTZMANN, DistributionFunction, PI};


/// A kappa velocity distribution. See the module-level documentation for
/// details.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct KappaDistribution {
    kappa: f64,
    thermal_variance: f64,
    kappa_theta_sq: f64,
    ln_norm: f64,
    kernel_scale: f64,
    ln_kernel_norm: f64,
}

impl DistributionFunction for KappaDistribution {
    fn density(&self, v: f64) -> f64 {
        (self.ln_norm - (self.kappa + 1.) * (v * v / self.kappa_theta_sq).ln_1p()).exp()
    }
}

impl KappaDistribution {
    /// Create a new kappa distribution with index `kappa`, temperature (K),
    /// and mass (kg).
    pub fn new(kappa: f64, temperature: f64, mass: f64) -> Result<Self> {
        if !(kappa > 1.5) || !kappa.is_finite() {
            return Err(Error::invalid("kappa", format!("must be finite and exceed 3/2; got {}", kappa)));
        }

        let thermal_variance = BOLTZMANN * temperature / mass;
        let kappa_theta_sq = (2. * kappa - 3.) * thermal_variance;
        let ln_norm = -1.5 * (PI * kappa_theta_sq).ln() + ln_gamma(kappa + 1.) - ln_gamma(kappa - 0.5);

        Ok(KappaDistribution {
            kappa,
            thermal_variance,
            kappa_theta_sq,
            ln_norm,
            kernel_scale: kappa_theta_sq.sqrt(),
            ln_kernel_norm: (kappa - 0.5) * std::f64::consts::LN_2 + ln_gamma(kappa + 0.5),
        })
    }

    /// The kappa index.
    pub fn kappa(&self) -> f64 {
        self.kappa
    }

    /// The squared thermal speed `k_B T / m`.
    pub fn thermal_variance(&self) -> f64 {
        self.thermal_variance
    }

    /// The factor `(κ - 3/2) / (κ - 1/2)` by which the squared Debye length
    /// of a kappa population is reduced relative to a Maxwellian one.
    pub fn debye_correction(&self) -> f64 {
        (self.kappa - 1.5) / (self.kappa - 0.5)
    }

    /// The normalized Gordeyev kernel at orbit parameter `p` (s/m), time `y`
    /// (s), and collision frequency `nu` (Hz). Equals `exp(-ν y)` at `p =
    /// 0`.
    pub fn gordeyev_kernel(&self, p: f64, y: f64, nu: f64) -> f64 {
        let z = p.abs() * self.kernel_scale;
        (-nu * y + ln_scaled_bessel_k(self.kappa + 0.5, z) - self.ln_kernel_norm).exp()
    }
}
