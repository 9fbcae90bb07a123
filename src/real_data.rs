// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Distributions built from tabulated, energy-binned measurements.

The table gives a distribution value per energy bin, typically a
photo-electron flux averaged over pitch angle at one altitude. Energies are
converted to speeds with `v = sqrt(2 E e / m)` and the values are linearly
interpolated in speed; outside the tabulated range the suprathermal term is
zero. A one-dimensional Maxwellian at the particle temperature supplies the
thermal population, and the sum is normalized numerically on the velocity
axis.

Reading the tables from disk is somebody else’s job: callers supply a
[`DistributionSource`].

*/

use crate::errors::{Error, Result};
use crate::maxwell::MaxwellDistribution;
use crate::quadrature::QuadratureRule;
use crate::{DistributionFunction, ELEMENTARY_CHARGE, PI};


/// A table of distribution values on an ascending grid of energies.
#[derive(Clone,Debug,PartialEq)]
pub struct EnergyTable {
    energies_ev: Vec<f64>,
    values: Vec<f64>,
}

impl EnergyTable {
    /// Create a table. Energies (eV) must be non-negative, finite, and
    /// strictly increasing; values must be finite. Both must have the same
    /// length, at least two.
    pub fn new(energies_ev: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if energies_ev.len() != values.len() {
            return Err(Error::invalid("energy_table", format!(
                "{} energies but {} values", energies_ev.len(), values.len()
            )));
        }

        if energies_ev.len() < 2 {
            return Err(Error::invalid("energy_table", "need at least two entries"));
        }

        if !(energies_ev[0] >= 0.) || energies_ev.windows(2).any(|w| !(w[1] > w[0]) || !w[1].is_finite()) {
            return Err(Error::invalid("energy_table", "energies must be non-negative and strictly increasing"));
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid("energy_table", "values must be finite"));
        }

        Ok(EnergyTable { energies_ev, values })
    }

    /// The tabulated energies, in eV.
    pub fn energies_ev(&self) -> &[f64] {
        &self.energies_ev
    }

    /// The tabulated values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}


/// Something that can supply tabulated distributions.
///
/// `mat_file` identifies the data set (in practice, a time of day) and
/// `altitude` selects the row within it.
pub trait DistributionSource: Send + Sync {
    /// Load the table for the given data set and altitude (km).
    fn load(&self, mat_file: &str, altitude: f64) -> Result<EnergyTable>;
}

impl<F> DistributionSource for F where F: Fn(&str, f64) -> Result<EnergyTable> + Send + Sync {
    fn load(&self, mat_file: &str, altitude: f64) -> Result<EnergyTable> {
        self(mat_file, altitude)
    }
}


/// A distribution made of a thermal background plus interpolated tabulated
/// data. See the module-level documentation for details.
#[derive(Clone,Debug,PartialEq)]
pub struct RealDataDistribution {
    background: MaxwellDistribution,
    speeds: Vec<f64>,
    values: Vec<f64>,
    norm: f64,
}

impl DistributionFunction for RealDataDistribution {
    fn density(&self, v: f64) -> f64 {
        self.norm * self.unnormalized(v)
    }
}

impl RealDataDistribution {
    /// Create a distribution from `table`, for particles of the given
    /// temperature (K) and mass (kg), normalized on `velocity_axis`.
    pub fn new(table: &EnergyTable, temperature: f64, mass: f64,
               velocity_axis: &[f64], rule: QuadratureRule) -> Result<Self> {
        let speeds = table.energies_ev.iter()
            .map(|e| (2. * e * ELEMENTARY_CHARGE / mass).sqrt())
            .collect();

        let mut d = RealDataDistribution {
            background: MaxwellDistribution::new(temperature, mass),
            speeds,
            values: table.values.clone(),
            norm: 1.,
        };

        let integrand: Vec<f64> = velocity_axis.iter()
            .map(|&v| 4. * PI * v * v * d.unnormalized(v))
            .collect();
        let integral = rule.integrate(velocity_axis, &integrand)?;

        if !(integral > 0.) || !integral.is_finite() {
            return Err(Error::NumericDegeneracy(format!(
                "tabulated distribution cannot be normalized on the velocity grid (integral {})", integral
            )));
        }

        d.norm = 1. / integral;
        Ok(d)
    }

    fn unnormalized(&self, v: f64) -> f64 {
        self.background.density_1d(v) + self.interpolate(v)
    }

    /// Linear interpolation in speed; zero outside the table.
    fn interpolate(&self, v: f64) -> f64 {
        let n = self.speeds.len();

        if !(v >= self.speeds[0]) || v > self.speeds[n - 1] {
            return 0.;
        }

        let i = self.speeds.partition_point(|&s| s <= v);

        if i >= n {
            return self.values[n - 1];
        }

        let (s0, s1) = (self.speeds[i - 1], self.speeds[i]);
        let t = (v - s0) / (s1 - s0);
        self.values[i - 1] + t * (self.values[i] - self.values[i - 1])
    }
}


#[cfg(test)]
mod tests {
    use crate::quadrature::{linspace, simpson, warped_axis, QuadratureRule};
    use crate::{DistributionFunction, Error, MASS_ELECTRON, PI};
    use super::*;

    fn flat_table() -> EnergyTable {
        EnergyTable::new(linspace(1., 110., 600), vec![1e-12; 600]).unwrap()
    }

    #[test]
    fn normalization() {
        let v = warped_axis(6e6, 10001, 3);

        for &t in &[200., 1500., 5000.] {
            let d = RealDataDistribution::new(&flat_table(), t, MASS_ELECTRON, &v, QuadratureRule::Simpson).unwrap();
            let y: Vec<f64> = v.iter().map(|&x| 4. * PI * x * x * d.density(x)).collect();
            assert_approx_eq!(simpson(&v, &y).unwrap(), 1., 1e-3);
        }
    }

    #[test]
    fn interpolation_clamps() {
        let table = EnergyTable::new(vec![1., 4.], vec![2., 6.]).unwrap();
        let v = warped_axis(6e6, 1001, 3);
        let d = RealDataDistribution::new(&table, 200., MASS_ELECTRON, &v, QuadratureRule::Simpson).unwrap();

        let s0 = (2. * ELEMENTARY_CHARGE / MASS_ELECTRON).sqrt();
        assert_eq!(d.interpolate(0.5 * s0), 0.);
        assert_eq!(d.interpolate(2.01 * s0), 0.);
        assert_approx_eq!(d.interpolate(s0), 2., 1e-12);
        assert_approx_eq!(d.interpolate(1.999 * s0), 5.996, 1e-9);
        assert_approx_eq!(d.interpolate(1.5 * s0), 4., 1e-9);
    }

    #[test]
    fn closure_source() {
        let source = |file: &str, z: f64| -> Result<EnergyTable> {
            assert_eq!(file, "fe_zmuE-07.mat");
            assert_eq!(z, 300.);
            Ok(flat_table())
        };

        let t = DistributionSource::load(&source, "fe_zmuE-07.mat", 300.).unwrap();
        assert_eq!(t.energies_ev().len(), 600);
    }

    #[test]
    fn malformed_tables() {
        assert!(EnergyTable::new(vec![1., 2.], vec![1.]).is_err());
        assert!(EnergyTable::new(vec![2., 1.], vec![1., 1.]).is_err());
        assert!(EnergyTable::new(vec![1., 2.], vec![1., f64::NAN]).is_err());

        let table = EnergyTable::new(vec![1e6, 2e6], vec![0., 0.]).unwrap();
        let v = warped_axis(1e3, 101, 3);
        let r = RealDataDistribution::new(&table, 1e-30, MASS_ELECTRON, &v, QuadratureRule::Simpson);

        match r {
            Err(Error::NumericDegeneracy(_)) => {},
            other => panic!("unexpected: {:?}", other),
        }
    }
}
