// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Calculate incoherent scatter radar spectra of magnetized plasmas.

An incoherent scatter radar (ISR) receives the weak echo of a radar pulse
scattered off thermal fluctuations of the ionospheric electron density. The
spectrum of that echo depends on the velocity distributions of the electrons
and ions, which enter through their *Gordeyev integrals*: one-sided Fourier
transforms, along a time-like axis, of the characteristic function of each
distribution sampled on the particle’s gyro-orbit.

The basic structure of the problem:

1. A [`config::Parameters`] value fixes the radar, the plasma, and the
   numerical grids for one run.
2. Each species is described by a [`config::Particle`] carrying its
   velocity distribution ([`vdf::Vdf`]).
3. The [`gordeyev`] engine reduces each particle to a complex susceptibility
   term sampled on the frequency axis, either through a closed-form kernel
   (Maxwellian and kappa distributions) or through a nested numerical
   integral over velocity (everything else).
4. The [`spectrum`] module combines the electron and ion terms into the
   scattered power spectrum.

Work over the frequency axis is split across threads by the [`parallel`]
layer. All quantities are SI.

*/

#![deny(missing_docs)]

#[macro_use] extern crate slog;
#[cfg(test)] #[macro_use] extern crate assert_approx_eq;

use std::fmt::Debug;

pub use std::f64::consts::PI;

/// Two times pi, as an `f64`.
pub const TWO_PI: f64 = 2. * PI;

/// The speed of light, in meters per second.
pub const SPEED_LIGHT: f64 = 299_792_458.;

/// The mass of the electron, in kilograms.
pub const MASS_ELECTRON: f64 = 9.1093837015e-31;

/// The mass of the proton, in kilograms.
pub const MASS_PROTON: f64 = 1.67262192369e-27;

/// The mass of the neutron, in kilograms.
pub const MASS_NEUTRON: f64 = 1.67492749804e-27;

/// The elementary charge, in Coulombs.
pub const ELEMENTARY_CHARGE: f64 = 1.602176634e-19;

/// The Boltzmann constant, in Joules per Kelvin.
pub const BOLTZMANN: f64 = 1.380649e-23;

/// The vacuum permittivity, in Farads per meter.
pub const EPSILON_0: f64 = 8.8541878128e-12;


/// An isotropic particle velocity distribution function.
///
/// Implementations are shared read-only between worker threads, hence the
/// `Send + Sync` bound.
pub trait DistributionFunction: Debug + Send + Sync {
    /// The phase-space density at speed `v` (m/s), normalized such that `4π
    /// ∫ v² f(v) dv = 1`.
    fn density(&self, v: f64) -> f64;

    /// The ratio between the velocity scale the distribution is expressed
    /// in and the thermal scale `sqrt(k_B T / m)` assumed by the numerical
    /// Gordeyev integral. This multiplies the result of that integral.
    ///
    /// All the distributions shipped here are written directly in terms of
    /// the thermal scale, so the default of unity applies to them.
    fn velocity_scale(&self) -> f64 {
        1.
    }
}


pub mod errors;
pub use errors::{Error, Result};

pub mod quadrature;
pub use quadrature::QuadratureRule;

pub mod special;

pub mod config;
pub use config::{Parameters, Particle, Resolution, Setting, Species, SystemSettings};

// Distributions

pub mod maxwell;
pub use maxwell::MaxwellDistribution;

pub mod kappa;
pub use kappa::KappaDistribution;

pub mod gauss_shell;
pub use gauss_shell::GaussShellDistribution;

pub mod real_data;
pub use real_data::{DistributionSource, EnergyTable, RealDataDistribution};

pub mod vdf;
pub use vdf::{Family, Vdf, VdfName};

// Machinery

pub mod parallel;
pub use parallel::Executor;

pub mod gordeyev;

pub mod spectrum;
pub use spectrum::{isr_spectrum, Metadata, Spectrum, SpectrumCalculation, SpectrumOptions};
