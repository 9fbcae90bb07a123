// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Selecting a velocity distribution.

Callers name distributions with short strings; [`VdfName`] parses those once
and [`Vdf`] holds the constructed distribution. Which Gordeyev integration
path a distribution takes is a property of the variant, not of the name: a
Maxwellian wrapped as [`Vdf::Arbitrary`] goes through the full numerical
integral even though a closed form exists, which is how the closed forms are
cross-checked.

*/

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::errors::Error;
use crate::gauss_shell::GaussShellDistribution;
use crate::kappa::KappaDistribution;
use crate::maxwell::MaxwellDistribution;
use crate::real_data::RealDataDistribution;
use crate::DistributionFunction;


/// The names of the distribution models.
#[derive(Copy,Clone,Debug,Eq,Hash,PartialEq)]
pub enum VdfName {
    /// `maxwell`
    Maxwell,

    /// `kappa`
    Kappa,

    /// `gauss_shell`
    GaussShell,

    /// `real_data`
    RealData,

    /// `a_vdf`: an arbitrary distribution integrated numerically.
    Arbitrary,
}

impl VdfName {
    /// The canonical string form of this name.
    pub fn as_str(&self) -> &'static str {
        match *self {
            VdfName::Maxwell => "maxwell",
            VdfName::Kappa => "kappa",
            VdfName::GaussShell => "gauss_shell",
            VdfName::RealData => "real_data",
            VdfName::Arbitrary => "a_vdf",
        }
    }
}

impl FromStr for VdfName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "maxwell" => Ok(VdfName::Maxwell),
            "kappa" => Ok(VdfName::Kappa),
            "gauss_shell" => Ok(VdfName::GaussShell),
            "real_data" => Ok(VdfName::RealData),
            "a_vdf" => Ok(VdfName::Arbitrary),
            _ => Err(Error::UnsupportedModel(s.to_owned())),
        }
    }
}

impl fmt::Display for VdfName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VdfName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}


/// How the Gordeyev integral of a distribution is evaluated, and how its
/// result is turned into a susceptibility term.
#[derive(Copy,Clone,Debug,Eq,Hash,PartialEq,Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Closed-form Maxwellian kernel.
    Plain,

    /// Closed-form kappa kernel.
    Kappa,

    /// Nested numerical integral over velocity.
    Numerical,
}


/// A velocity distribution, ready to be integrated.
#[derive(Clone,Debug)]
pub enum Vdf {
    /// A Maxwellian with the closed-form kernel.
    Maxwell(MaxwellDistribution),

    /// A kappa distribution with the closed-form kernel.
    Kappa(KappaDistribution),

    /// Thermal core plus Gaussian shell.
    GaussShell(GaussShellDistribution),

    /// Thermal background plus tabulated data.
    RealData(RealDataDistribution),

    /// Any distribution, integrated numerically.
    Arbitrary(Arc<dyn DistributionFunction>),
}

impl Vdf {
    /// Which integration family this variant belongs to.
    pub fn family(&self) -> Family {
        match *self {
            Vdf::Maxwell(_) => Family::Plain,
            Vdf::Kappa(_) => Family::Kappa,
            _ => Family::Numerical,
        }
    }

    /// Force this distribution onto the numerical integration path.
    pub fn into_numerical(self) -> Vdf {
        match self {
            Vdf::Maxwell(d) => Vdf::Arbitrary(Arc::new(d)),
            Vdf::Kappa(d) => Vdf::Arbitrary(Arc::new(d)),
            other => other,
        }
    }

    /// The kappa index, for closed-form kappa distributions.
    pub fn kappa(&self) -> Option<f64> {
        match *self {
            Vdf::Kappa(ref d) => Some(d.kappa()),
            _ => None,
        }
    }

    fn as_distribution(&self) -> &dyn DistributionFunction {
        match *self {
            Vdf::Maxwell(ref d) => d,
            Vdf::Kappa(ref d) => d,
            Vdf::GaussShell(ref d) => d,
            Vdf::RealData(ref d) => d,
            Vdf::Arbitrary(ref d) => d.as_ref(),
        }
    }
}

impl DistributionFunction for Vdf {
    fn density(&self, v: f64) -> f64 {
        self.as_distribution().density(v)
    }

    fn velocity_scale(&self) -> f64 {
        self.as_distribution().velocity_scale()
    }
}


#[cfg(test)]
mod tests {
    use crate::{Error, MASS_ELECTRON};
    use super::*;

    #[test]
    fn parse_names() {
        for name in &["maxwell", "kappa", "gauss_shell", "real_data", "a_vdf"] {
            let parsed: VdfName = name.parse().unwrap();
            assert_eq!(parsed.as_str(), *name);
        }

        match "bogus".parse::<VdfName>() {
            Err(Error::UnsupportedModel(s)) => assert_eq!(s, "bogus"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn numerical_wrapping() {
        let m = MaxwellDistribution::new(300., MASS_ELECTRON);
        let closed = Vdf::Maxwell(m);
        assert_eq!(closed.family(), Family::Plain);

        let numerical = closed.clone().into_numerical();
        assert_eq!(numerical.family(), Family::Numerical);
        assert_eq!(numerical.density(1e5), closed.density(1e5));
        assert_eq!(numerical.velocity_scale(), 1.);

        let k = Vdf::Kappa(KappaDistribution::new(3., 300., MASS_ELECTRON).unwrap());
        assert_eq!(k.kappa(), Some(3.));
        assert_eq!(k.into_numerical().kappa(), None);
    }
}
