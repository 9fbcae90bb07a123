// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! The Gordeyev integral of one particle species.

```text
G(ω) = ∫ exp(-i ω y) h(y) dy
```

over the particle’s Gordeyev axis. A particle gyrating in the magnetic field
samples its velocity distribution’s characteristic function at the orbit
parameter

```text
p(y)² = 2 k⊥² (1 - cos(ω_c y)) / ω_c² + k∥² y²
```

with `k⊥ = k sin θ` and `k∥ = k cos θ`. For the Maxwellian and kappa
families the kernel `h(y)` is a closed-form function of `p(y)`. For
everything else

```text
h(y) = p'(y) ∫ v sin(p(y) v) f(v) dv,
```

the derivative along the orbit of the characteristic function, which we
integrate numerically on the shared velocity axis.

The kernel is computed once per Gordeyev sample and the quadrature weights
once per axis; each frequency then costs one dot product. Both loops are run
through the [`Executor`].

*/

use num_complex::Complex64;
use slog::Logger;

use crate::config::{Parameters, Particle, Species};
use crate::errors::Result;
use crate::parallel::Executor;
use crate::vdf::{Family, Vdf};
use crate::{DistributionFunction, PI};

/// Kernel values below this fraction of the peak are considered negligible
/// when judging the resolution.
const SIGNIFICANCE: f64 = 1e-3;


/// The geometry of a gyro-orbit relative to the radar wave vector.
#[derive(Copy,Clone,Debug,PartialEq)]
pub struct Orbit {
    k_perp: f64,
    k_par: f64,
    k_abs: f64,
    gyro_frequency: f64,
}

impl Orbit {
    /// Set up an orbit for wavenumber `k` (rad/m), aspect angle `theta`
    /// (rad), and gyro frequency (rad/s).
    pub fn new(k: f64, theta: f64, gyro_frequency: f64) -> Self {
        Orbit {
            k_perp: k * theta.sin(),
            k_par: k * theta.cos(),
            k_abs: k.abs(),
            gyro_frequency: gyro_frequency.abs(),
        }
    }

    /// `2 sin(ω_c y / 2) / ω_c` and `cos(ω_c y / 2)`, the perpendicular
    /// excursion and its derivative. An unmagnetized particle moves in a
    /// straight line.
    #[inline]
    fn perpendicular(&self, y: f64) -> (f64, f64) {
        if self.gyro_frequency < f64::MIN_POSITIVE {
            return (y, 1.);
        }

        let (sin, cos) = (0.5 * self.gyro_frequency * y).sin_cos();
        (2. * sin / self.gyro_frequency, cos)
    }

    /// The orbit parameter `p(y)`, in s/m.
    ///
    /// This is evaluated as `sqrt(k⊥² (2 sin(ω_c y/2) / ω_c)² + k∥² y²)`,
    /// which equals the textbook form but does not lose precision to the
    /// `1 - cos` when `ω_c y` is small.
    pub fn p(&self, y: f64) -> f64 {
        let (s, _) = self.perpendicular(y);
        (self.k_perp * s).hypot(self.k_par * y)
    }

    /// The derivative `dp/dy`. At `p = 0` this takes its limiting value
    /// `|k|`.
    pub fn p_derivative(&self, y: f64) -> f64 {
        let (s, c) = self.perpendicular(y);
        let p = (self.k_perp * s).hypot(self.k_par * y);

        if p == 0. {
            return self.k_abs;
        }

        (self.k_perp * self.k_perp * s * c + self.k_par * self.k_par * y) / p
    }
}


/// The susceptibility term of one species, sampled on the frequency axis.
#[derive(Clone,Debug)]
pub struct SpeciesTerm {
    /// Which species this is.
    pub species: Species,

    /// The term `F(ω)`.
    pub values: Vec<Complex64>,

    /// Indices of frequency samples where `F` is not finite.
    pub degenerate: Vec<usize>,

    /// Resolution diagnostics.
    pub warnings: Vec<String>,
}


/// The state of one Gordeyev calculation.
#[derive(Clone,Debug)]
pub struct GordeyevIntegral<'a> {
    particle: &'a Particle,
    params: &'a Parameters,
    logger: &'a Logger,
    executor: Executor,
    orbit: Orbit,
}

impl<'a> GordeyevIntegral<'a> {
    /// Prepare to integrate `particle` under the run `params`.
    pub fn new(particle: &'a Particle, params: &'a Parameters, logger: &'a Logger, executor: Executor) -> Self {
        GordeyevIntegral {
            particle,
            params,
            logger,
            executor,
            orbit: Orbit::new(params.radar_wavenumber, params.settings.aspect_angle, particle.gyro_frequency),
        }
    }

    /// The orbit geometry.
    pub fn orbit(&self) -> &Orbit {
        &self.orbit
    }

    /// The kernel `h(y)` on the particle’s Gordeyev axis.
    pub fn kernel(&self) -> Result<Vec<f64>> {
        let y = &self.particle.gordeyev_axis;
        let nu = self.particle.collision_frequency;

        match self.particle.vdf {
            Vdf::Maxwell(ref d) => self.executor.collect(y.len(), |i| {
                d.gordeyev_kernel(self.orbit.p(y[i]), y[i], nu)
            }),

            Vdf::Kappa(ref d) => self.executor.collect(y.len(), |i| {
                d.gordeyev_kernel(self.orbit.p(y[i]), y[i], nu)
            }),

            _ => self.velocity_kernel(),
        }
    }

    /// `p'(y) ∫ v sin(p(y) v) f(v) dv` on the Gordeyev axis.
    fn velocity_kernel(&self) -> Result<Vec<f64>> {
        let v = &self.params.velocity_axis;
        let weights = self.params.resolution.rule.weights(v)?;
        let vdf = &self.particle.vdf;

        let g: Vec<f64> = v.iter()
            .zip(weights.iter())
            .map(|(&vj, &wj)| wj * vj * vdf.density(vj))
            .collect();

        let y = &self.particle.gordeyev_axis;

        self.executor.collect(y.len(), |i| {
            let p = self.orbit.p(y[i]);

            if p == 0. {
                return 0.;
            }

            let integral: f64 = v.iter().zip(g.iter()).map(|(&vj, &gj)| gj * (p * vj).sin()).sum();
            self.orbit.p_derivative(y[i]) * integral
        })
    }

    /// `G(ω) = Σ w_j h_j exp(-i ω y_j)` for every frequency of the run.
    pub fn transform(&self, kernel: &[f64]) -> Result<Vec<Complex64>> {
        let y = &self.particle.gordeyev_axis;
        let weights = self.params.resolution.rule.weights(y)?;
        let wh: Vec<f64> = weights.iter().zip(kernel.iter()).map(|(w, h)| w * h).collect();
        let omega = &self.params.angular_frequency;

        self.executor.collect(omega.len(), |i| {
            let w = omega[i];
            let mut re = 0.;
            let mut im = 0.;

            for (&yj, &c) in y.iter().zip(wh.iter()) {
                let (sin, cos) = (w * yj).sin_cos();
                re += c * cos;
                im -= c * sin;
            }

            Complex64::new(re, im)
        })
    }

    /// Compute the susceptibility term `F(ω)`.
    ///
    /// For the closed-form families `F = 1 - (iω + ν) G`. For the numerical
    /// family `F = 4π (k_B T / m) G` times the distribution’s velocity scale;
    /// collisions do not enter, and a nonzero ν only produces a warning.
    pub fn compute(&self) -> Result<SpeciesTerm> {
        let family = self.particle.vdf.family();

        debug!(self.logger, "beginning Gordeyev integral";
               "species" => %self.particle.species,
               "family" => ?family,
               "n_y" => self.particle.gordeyev_axis.len(),
               "y_max" => self.particle.gordeyev_axis.last().cloned().unwrap_or(0.),
               "gyro_frequency" => self.particle.gyro_frequency,
        );

        let kernel = self.kernel()?;
        trace!(self.logger, "kernel done"; "species" => %self.particle.species,
               "h0" => kernel.first().cloned().unwrap_or(f64::NAN));

        let g = self.transform(&kernel)?;
        let omega = &self.params.angular_frequency;
        let nu = self.particle.collision_frequency;

        let values: Vec<Complex64> = match family {
            Family::Plain | Family::Kappa => g.iter().zip(omega.iter())
                .map(|(&gi, &w)| Complex64::new(1., 0.) - Complex64::new(nu, w) * gi)
                .collect(),

            Family::Numerical => {
                let scale = 4. * PI * self.particle.thermal_variance() * self.particle.vdf.velocity_scale();
                g.iter().map(|gi| *gi * scale).collect()
            },
        };

        let degenerate: Vec<usize> = values.iter()
            .enumerate()
            .filter(|(_, f)| !f.is_finite())
            .map(|(i, _)| i)
            .collect();

        let mut warnings = self.resolution_warnings(&kernel, family);

        if family == Family::Numerical && nu > 0. {
            warnings.push(format!(
                "{} collision frequency {:.3e} Hz is ignored by the numerical Gordeyev integral",
                self.particle.species, nu
            ));
        }

        for w in &warnings {
            warn!(self.logger, "{}", w; "species" => %self.particle.species);
        }

        debug!(self.logger, "Gordeyev integral done";
               "species" => %self.particle.species,
               "n_degenerate" => degenerate.len(),
               "n_warnings" => warnings.len(),
        );

        Ok(SpeciesTerm {
            species: self.particle.species,
            values,
            degenerate,
            warnings,
        })
    }

    /// Heuristic checks of whether the grids resolve this integrand. None of
    /// these stop the calculation.
    fn resolution_warnings(&self, kernel: &[f64], family: Family) -> Vec<String> {
        let mut warnings = Vec::new();
        let y = &self.particle.gordeyev_axis;
        let species = self.particle.species;

        if kernel.iter().any(|h| !h.is_finite()) {
            warnings.push(format!("{} Gordeyev kernel contains non-finite values", species));
            return warnings;
        }

        let peak = kernel.iter().fold(0_f64, |m, h| m.max(h.abs()));

        if peak == 0. {
            warnings.push(format!("{} Gordeyev kernel vanishes everywhere", species));
            return warnings;
        }

        let threshold = SIGNIFICANCE * peak;

        if let (Some(&h_last), Some(&y_last)) = (kernel.last(), y.last()) {
            if h_last.abs() > threshold {
                warnings.push(format!(
                    "{} Gordeyev kernel has not decayed at y_max = {:.3e} s ({:.2e} of its peak); \
                     the axis is truncated", species, y_last, h_last.abs() / peak
                ));
            }
        }

        let omega_max = self.params.angular_frequency.iter().fold(0_f64, |m, w| m.max(w.abs()));
        let mut dy_max = 0_f64;
        let mut p_max = 0_f64;

        for (i, pair) in y.windows(2).enumerate() {
            if kernel[i].abs() > threshold || kernel[i + 1].abs() > threshold {
                dy_max = dy_max.max(pair[1] - pair[0]);
                p_max = p_max.max(self.orbit.p(pair[1]));
            }
        }

        if omega_max * dy_max > PI {
            warnings.push(format!(
                "{} Gordeyev axis spacing {:.3e} s undersamples the highest frequency ({:.3e} rad/s)",
                species, dy_max, omega_max
            ));
        }

        if family == Family::Numerical {
            let v = &self.params.velocity_axis;
            let weight: Vec<f64> = v.iter().map(|&x| x * x * self.particle.vdf.density(x)).collect();
            let w_peak = weight.iter().fold(0_f64, |m, w| m.max(w.abs()));
            let mut dv_max = 0_f64;

            for (i, pair) in v.windows(2).enumerate() {
                if weight[i].abs() > SIGNIFICANCE * w_peak || weight[i + 1].abs() > SIGNIFICANCE * w_peak {
                    dv_max = dv_max.max(pair[1] - pair[0]);
                }
            }

            if p_max * dv_max > PI {
                warnings.push(format!(
                    "{} velocity axis spacing {:.3e} m/s is too coarse for orbit parameters up to {:.3e} s/m",
                    species, dv_max, p_max
                ));
            }
        }

        warnings
    }
}


#[cfg(test)]
mod tests {
    use inscar_test_support::quiet_log;

    use crate::config::{Parameters, Particle, Resolution, SystemSettings};
    use crate::parallel::Executor;
    use crate::vdf::Vdf;
    use crate::{MASS_ELECTRON, PI, TWO_PI};
    use super::*;

    #[test]
    fn p_unmagnetized_limit() {
        let k = -18.;
        let o = Orbit::new(k, 0.7, 0.);

        for &y in &[0., 1e-7, 3e-5, 1e-2] {
            assert_approx_eq!(o.p(y), k.abs() * y, 1e-12 * (1. + k.abs() * y));
            assert_approx_eq!(o.p_derivative(y), k.abs(), 1e-12);
        }
    }

    #[test]
    fn p_matches_textbook_form() {
        let (k, theta, wc) = (-18.02, PI / 4., 6.156e6);
        let o = Orbit::new(k, theta, wc);
        let (kp, kl) = (k * theta.sin(), k * theta.cos());

        for &y in &[1e-6, 1e-5, 1e-4] {
            let textbook = (2. * kp * kp / (wc * wc) * (1. - (y * wc).cos()) + kl * kl * y * y).sqrt();
            assert_approx_eq!(o.p(y), textbook, 1e-8 * textbook);

            let h = 1e-6 * y;
            let numeric = (o.p(y + h) - o.p(y - h)) / (2. * h);
            assert_approx_eq!(o.p_derivative(y), numeric, 1e-5 * numeric.abs());
        }

        assert_eq!(o.p(0.), 0.);
        assert_eq!(o.p_derivative(0.), k.abs());
    }

    #[test]
    fn perpendicular_orbit_is_bounded() {
        let wc = 6.156e6;
        let o = Orbit::new(-18., PI / 2., wc);
        let bound = 2. * 18. / wc;

        for i in 0..1000 {
            let y = i as f64 * 1e-8;
            assert!(o.p(y) <= bound * (1. + 1e-12));
        }

        assert_approx_eq!(o.p(PI / wc), bound, 1e-9 * bound);
    }

    fn unmagnetized() -> Parameters {
        let s = SystemSettings::from_pairs(vec![
            ("B", 0.), ("F0", 4.3e8), ("F_MAX", 2e5), ("MI", 16.), ("NE", 2e11),
            ("NU_E", 0.), ("NU_I", 0.), ("T_E", 1000.), ("T_I", 1000.), ("THETA", 0.5),
        ]).unwrap();
        let r = Resolution::default().n_frequency(64).n_gordeyev(4001).n_velocity(4001).y_limits(3e-5, 3e-3);
        Parameters::new(s, r).unwrap()
    }

    /// Without a field or collisions the Maxwellian transform has the closed
    /// form `Re G = sqrt(π/2) / (kσ) exp(-ω² / 2k²σ²)`.
    #[test]
    fn maxwell_transform_real_part() {
        let params = unmagnetized();
        let e = Particle::electron(&params);
        let log = quiet_log();
        let gi = GordeyevIntegral::new(&e, &params, &log, Executor::Sequential);
        let g = gi.transform(&gi.kernel().unwrap()).unwrap();
        let ks = params.radar_wavenumber.abs() * e.thermal_variance().sqrt();

        for (i, &w) in params.angular_frequency.iter().enumerate() {
            let expected = (PI / 2.).sqrt() / ks * (-0.5 * (w / ks).powi(2)).exp();
            assert_approx_eq!(g[i].re, expected, 1e-6 * expected);
        }
    }

    #[test]
    fn numerical_maxwell_matches_closed_form() {
        let params = unmagnetized();
        let closed = Particle::electron(&params);
        let numerical = closed.clone().with_vdf(closed.vdf.clone().into_numerical());
        let log = quiet_log();

        let a = GordeyevIntegral::new(&closed, &params, &log, Executor::default()).compute().unwrap();
        let b = GordeyevIntegral::new(&numerical, &params, &log, Executor::default()).compute().unwrap();

        for (fa, fb) in a.values.iter().zip(b.values.iter()) {
            assert!((fa - fb).norm() < 1e-3 * fa.norm().max(1e-2), "{} vs {}", fa, fb);
        }
    }

    #[test]
    fn kappa_kernel_tends_to_maxwell() {
        let params = unmagnetized();
        let m = Particle::electron(&params);
        let k = m.clone().with_vdf(Vdf::Kappa(
            crate::kappa::KappaDistribution::new(1e4, m.temperature, MASS_ELECTRON).unwrap()
        ));
        let log = quiet_log();

        let hm = GordeyevIntegral::new(&m, &params, &log, Executor::Sequential).kernel().unwrap();
        let hk = GordeyevIntegral::new(&k, &params, &log, Executor::Sequential).kernel().unwrap();

        assert_eq!(hk[0], 1.);

        for (a, b) in hm.iter().zip(hk.iter()) {
            assert!(b.is_finite());
            assert_approx_eq!(a, b, 1e-3);
        }
    }

    #[test]
    fn truncated_axis_is_reported() {
        let s = SystemSettings::from_pairs(vec![
            ("B", 0.), ("MI", 16.), ("NE", 2e11), ("NU_E", 0.), ("NU_I", 0.),
            ("T_E", 1000.), ("T_I", 1000.), ("THETA", 0.5), ("F_MAX", 1e4),
        ]).unwrap();
        let r = Resolution::default().n_frequency(16).n_gordeyev(101).y_limits(1e-8, 1e-6);
        let params = Parameters::new(s, r).unwrap();
        let e = Particle::electron(&params);
        let log = quiet_log();

        let term = GordeyevIntegral::new(&e, &params, &log, Executor::Sequential).compute().unwrap();
        assert!(term.warnings.iter().any(|w| w.contains("not decayed")));
        assert!(term.degenerate.is_empty());
    }

    fn coarse(f_max: f64, resolution: Resolution) -> Parameters {
        let s = SystemSettings::from_pairs(vec![
            ("B", 0.), ("MI", 16.), ("NE", 2e11), ("NU_E", 0.), ("NU_I", 0.),
            ("T_E", 1000.), ("T_I", 1000.), ("THETA", 0.5), ("F_MAX", f_max),
        ]).unwrap();
        Parameters::new(s, resolution).unwrap()
    }

    #[test]
    fn aliasing_is_reported() {
        let r = Resolution::default().n_frequency(16).n_gordeyev(101).n_velocity(101)
            .y_limits(3e-5, 2e-3).order(1);
        let params = coarse(2e6, r);
        let e = Particle::electron(&params);
        let log = quiet_log();

        let term = GordeyevIntegral::new(&e, &params, &log, Executor::Sequential).compute().unwrap();
        assert!(term.warnings.iter().any(|w| w.contains("undersamples the highest frequency")),
                "{:?}", term.warnings);
    }

    #[test]
    fn coarse_velocity_axis_is_reported() {
        let r = Resolution::default().n_frequency(16).n_gordeyev(401).n_velocity(21)
            .y_limits(3e-5, 3e-3).order(1);
        let params = coarse(2e5, r);
        let closed = Particle::electron(&params);
        let numerical = closed.clone().with_vdf(closed.vdf.clone().into_numerical());
        let log = quiet_log();

        let term = GordeyevIntegral::new(&numerical, &params, &log, Executor::Sequential).compute().unwrap();
        assert!(term.warnings.iter().any(|w| w.contains("velocity axis spacing")), "{:?}", term.warnings);

        let term = GordeyevIntegral::new(&closed, &params, &log, Executor::Sequential).compute().unwrap();
        assert!(!term.warnings.iter().any(|w| w.contains("velocity axis spacing")));
    }

    #[test]
    fn ignored_collisions_are_reported() {
        let params = unmagnetized();
        let closed = Particle::electron(&params);
        let mut numerical = closed.clone().with_vdf(closed.vdf.clone().into_numerical());
        numerical.collision_frequency = 1e5;
        let log = quiet_log();

        let term = GordeyevIntegral::new(&numerical, &params, &log, Executor::Sequential).compute().unwrap();
        assert!(term.warnings.iter().any(|w| w.contains("collision frequency")));

        let mut collisional = closed.clone();
        collisional.collision_frequency = 1e5;
        let term = GordeyevIntegral::new(&collisional, &params, &log, Executor::Sequential).compute().unwrap();
        assert!(!term.warnings.iter().any(|w| w.contains("collision frequency")));
    }

    #[test]
    fn frequencies_are_independent_of_executor() {
        let params = unmagnetized();
        let e = Particle::electron(&params);
        let log = quiet_log();

        let a = GordeyevIntegral::new(&e, &params, &log, Executor::Sequential).compute().unwrap();
        let b = GordeyevIntegral::new(&e, &params, &log, Executor::Parallel { threads: Some(4) }).compute().unwrap();
        assert_eq!(a.values, b.values);
        assert!(params.angular_frequency.iter().all(|w| w.abs() <= TWO_PI * 2e5));
    }
}
