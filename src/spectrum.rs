// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Assembling the scattered power spectrum.

With the electron and ion susceptibility terms `F_e` and `F_i` in hand, the
spectrum is

```text
S(ω) = n_e / (π ω) · [ Im(-F_e) |1 + 2X_i² F_i|² + 4 X_e⁴ Im(-F_i) |F_e|² ]
                    / |1 + 2X_e² F_e + 2X_i² F_i|²
```

where `X_s² = 1 / (2 k² λ_s²)` and `λ_s` is the Debye length of species
*s*. The first term is the electron line, screened by the ions; the second
is the ion line, carried by the electrons.

[`SpectrumCalculation`] validates everything it is given, builds the two
particles, runs both Gordeyev integrals, and assembles the result.
[`isr_spectrum`] does the same with default settings and no logging.

*/

use std::sync::Arc;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use slog::{Discard, Logger};

use crate::config::{Parameters, Particle, Resolution, SystemSettings};
use crate::errors::{Error, Result};
use crate::gauss_shell::GaussShellDistribution;
use crate::gordeyev::{GordeyevIntegral, SpeciesTerm};
use crate::kappa::KappaDistribution;
use crate::maxwell::MaxwellDistribution;
use crate::parallel::Executor;
use crate::quadrature::trapezoid;
use crate::real_data::{DistributionSource, RealDataDistribution};
use crate::vdf::{Family, Vdf, VdfName};
use crate::{MASS_ELECTRON, PI};

/// Above this frequency limit the spectrum is taken to show the plasma line
/// rather than the ion line.
const PLASMA_LINE_F_MAX: f64 = 1e6;

/// Lower edge of the plasma-line band used by the area diagnostic, in Hz.
const PLASMA_LINE_F_MIN: f64 = 5e5;


/// Options that select and tune the distribution model.
#[derive(Clone,Debug,Default,PartialEq,Serialize,Deserialize)]
pub struct SpectrumOptions {
    /// The kappa index; required by the `kappa` model and by `a_vdf` with
    /// `vdf = "kappa"`.
    pub kappa: Option<f64>,

    /// The distribution integrated by the `a_vdf` model. Defaults to
    /// `maxwell`.
    pub vdf: Option<String>,

    /// Whether to compute the area under the spectral line.
    pub area: bool,
}

impl SpectrumOptions {
    /// Set the kappa index.
    pub fn kappa(mut self, kappa: f64) -> Self {
        self.kappa = Some(kappa);
        self
    }

    /// Set the distribution for the `a_vdf` model.
    pub fn vdf(mut self, name: &str) -> Self {
        self.vdf = Some(name.to_owned());
        self
    }

    /// Request the line-area diagnostic.
    pub fn area(mut self, area: bool) -> Self {
        self.area = area;
        self
    }
}


/// The stage of the calculation at which a sample became non-finite.
#[derive(Copy,Clone,Debug,Eq,Hash,PartialEq,Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The electron susceptibility term.
    Electron,

    /// The ion susceptibility term.
    Ion,

    /// The final assembly, e.g. the division by ω at zero frequency.
    Spectrum,
}


/// A frequency sample whose value is not a finite number.
#[derive(Copy,Clone,Debug,PartialEq,Serialize)]
pub struct Degeneracy {
    /// Index into the frequency axis.
    pub index: usize,

    /// The frequency, in Hz.
    pub frequency: f64,

    /// Where the problem first showed up.
    pub stage: Stage,
}


/// Everything needed to reproduce and interpret a spectrum.
#[derive(Clone,Debug,Serialize)]
pub struct Metadata {
    /// The model requested.
    pub model: VdfName,

    /// The distribution actually used for the electrons.
    pub electron_vdf: VdfName,

    /// How the electron Gordeyev integral was evaluated.
    pub electron_family: Family,

    /// The physical inputs.
    pub settings: SystemSettings,

    /// The model options.
    pub options: SpectrumOptions,

    /// The numerical resolution.
    pub resolution: Resolution,

    /// The signed radar wavenumber, in rad/m.
    pub radar_wavenumber: f64,

    /// The electron gyro frequency, in rad/s.
    pub electron_gyro_frequency: f64,

    /// The ion gyro frequency, in rad/s.
    pub ion_gyro_frequency: f64,

    /// The effective electron Debye length, in m.
    pub electron_debye_length: f64,

    /// The ion Debye length, in m.
    pub ion_debye_length: f64,

    /// Samples that are NaN or infinite. They are left in place in the
    /// power array.
    pub degenerate_samples: Vec<Degeneracy>,

    /// Resolution diagnostics.
    pub warnings: Vec<String>,

    /// The area under the line, if requested.
    pub line_area: Option<f64>,
}


/// A computed spectrum.
#[derive(Clone,Debug,Serialize)]
pub struct Spectrum {
    /// The frequency axis, in Hz.
    pub frequency: Vec<f64>,

    /// The scattered power at each frequency.
    pub power: Vec<f64>,

    /// Provenance and diagnostics.
    pub metadata: Metadata,
}


/// A configurable spectrum calculation.
pub struct SpectrumCalculation {
    logger: Logger,
    executor: Executor,
    resolution: Resolution,
    source: Option<Arc<dyn DistributionSource>>,
}

impl SpectrumCalculation {
    /// Create a calculation that logs to `logger`, with default resolution
    /// and parallel execution.
    pub fn new(logger: Logger) -> Self {
        SpectrumCalculation {
            logger,
            executor: Executor::default(),
            resolution: Resolution::default(),
            source: None,
        }
    }

    /// Choose how loops are executed.
    pub fn executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Choose the numerical resolution.
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Supply tabulated distributions for the `real_data` model.
    pub fn distribution_source<S: DistributionSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Compute the spectrum for the named model.
    ///
    /// All parameters are checked before any integration is done. The
    /// numerically integrated models (`gauss_shell`, `real_data`, and
    /// `a_vdf`) do not include electron collisions; a nonzero `NU_E` is
    /// noted in the metadata warnings.
    pub fn compute(&self, vdf_name: &str, settings: &SystemSettings, options: &SpectrumOptions) -> Result<Spectrum> {
        let model: VdfName = vdf_name.parse()?;

        let electron_name = match model {
            VdfName::Arbitrary => {
                let sub = options.vdf.as_deref().unwrap_or("maxwell");

                match sub.parse::<VdfName>()? {
                    VdfName::Arbitrary => return Err(Error::UnsupportedModel(format!("a_vdf with vdf = \"{}\"", sub))),
                    name => name,
                }
            },
            name => name,
        };

        let params = Parameters::new(settings.clone(), self.resolution.clone())?;
        let mut vdf = self.electron_vdf(electron_name, &params, options)?;

        if model == VdfName::Arbitrary {
            vdf = vdf.into_numerical();
        }

        let electron = Particle::electron(&params).with_vdf(vdf);
        let ion = Particle::ion(&params);
        let electron_family = electron.vdf.family();

        info!(self.logger, "computing ISR spectrum";
              "model" => %model,
              "electron_vdf" => %electron_name,
              "electron_family" => ?electron_family,
              "n_frequency" => params.frequency.len(),
              "f_max" => settings.frequency_limit,
        );

        let (fe, fi) = self.executor.install(|ex| -> Result<(SpeciesTerm, SpeciesTerm)> {
            let fe = GordeyevIntegral::new(&electron, &params, &self.logger, ex).compute()?;
            let fi = GordeyevIntegral::new(&ion, &params, &self.logger, ex).compute()?;
            Ok((fe, fi))
        })??;

        let mut electron_debye_length = electron.debye_length();

        if let Vdf::Kappa(ref d) = electron.vdf {
            electron_debye_length *= d.debye_correction().sqrt();
        }

        let ion_debye_length = ion.debye_length();
        let k2 = params.radar_wavenumber * params.radar_wavenumber;
        let xe2 = 1. / (2. * k2 * electron_debye_length * electron_debye_length);
        let xi2 = 1. / (2. * k2 * ion_debye_length * ion_debye_length);

        let power = assemble(&params.angular_frequency, settings.electron_density, xe2, xi2, &fe.values, &fi.values);

        let degenerate_samples = collect_degeneracies(&params.frequency, &fe, &fi, &power);

        if !degenerate_samples.is_empty() {
            warn!(self.logger, "spectrum contains non-finite samples";
                  "count" => degenerate_samples.len(),
                  "first_frequency" => degenerate_samples[0].frequency);
        }

        let line_area = if options.area {
            let a = line_area(&params.frequency, &power, settings.frequency_limit);
            let band = if settings.frequency_limit < PLASMA_LINE_F_MAX { "ion line" } else { "plasma line" };
            info!(self.logger, "line area"; "area" => a, "band" => band);
            Some(a)
        } else {
            None
        };

        let mut warnings = fe.warnings;
        warnings.extend(fi.warnings);

        debug!(self.logger, "spectrum done";
               "peak" => power.iter().cloned().filter(|p| p.is_finite()).fold(0., f64::max));

        Ok(Spectrum {
            frequency: params.frequency.clone(),
            power,
            metadata: Metadata {
                model,
                electron_vdf: electron_name,
                electron_family,
                settings: settings.clone(),
                options: options.clone(),
                resolution: params.resolution.clone(),
                radar_wavenumber: params.radar_wavenumber,
                electron_gyro_frequency: electron.gyro_frequency,
                ion_gyro_frequency: ion.gyro_frequency,
                electron_debye_length,
                ion_debye_length,
                degenerate_samples,
                warnings,
                line_area,
            },
        })
    }

    fn electron_vdf(&self, name: VdfName, params: &Parameters, options: &SpectrumOptions) -> Result<Vdf> {
        let s = &params.settings;
        let t = s.electron_temperature;
        let v = &params.velocity_axis;
        let rule = params.resolution.rule;

        Ok(match name {
            VdfName::Maxwell => Vdf::Maxwell(MaxwellDistribution::new(t, MASS_ELECTRON)),

            VdfName::Kappa => {
                let kappa = options.kappa.ok_or_else(|| Error::MissingParameter("kappa".to_owned()))?;
                Vdf::Kappa(KappaDistribution::new(kappa, t, MASS_ELECTRON)?)
            },

            VdfName::GaussShell => {
                let t_es = s.shell_temperature.ok_or_else(|| Error::MissingParameter("T_ES".to_owned()))?;
                let d = GaussShellDistribution::new(t, t_es, MASS_ELECTRON).normalize(v, rule)?;
                info!(self.logger, "Gaussian shell electrons";
                      "shell_energy_ev" => d.shell_energy_ev(),
                      "shell_speed" => d.shell_speed());
                Vdf::GaussShell(d)
            },

            VdfName::RealData => {
                let mat_file = s.mat_file.as_deref().ok_or_else(|| Error::MissingParameter("mat_file".to_owned()))?;
                let altitude = s.altitude.ok_or_else(|| Error::MissingParameter("Z".to_owned()))?;
                let source = self.source.as_ref()
                    .ok_or_else(|| Error::MissingParameter("distribution source".to_owned()))?;
                let table = source.load(mat_file, altitude)?;
                debug!(self.logger, "loaded tabulated distribution";
                       "mat_file" => mat_file, "z" => altitude, "n_bins" => table.energies_ev().len());
                Vdf::RealData(RealDataDistribution::new(&table, t, MASS_ELECTRON, v, rule)?)
            },

            VdfName::Arbitrary => return Err(Error::UnsupportedModel(name.to_string())),
        })
    }
}


/// Compute a spectrum with the default resolution, using all available
/// cores and discarding log output.
///
/// The `real_data` model needs a [`DistributionSource`] and is therefore only
/// available through [`SpectrumCalculation`].
pub fn isr_spectrum(vdf_name: &str, settings: &SystemSettings, options: &SpectrumOptions) -> Result<Spectrum> {
    SpectrumCalculation::new(Logger::root(Discard, o!())).compute(vdf_name, settings, options)
}


/// Combine the susceptibility terms into the scattered power. Returns the
/// magnitude of the expression in the module documentation; no sign or
/// finiteness checks are made.
pub fn assemble(omega: &[f64], ne: f64, xe2: f64, xi2: f64, fe: &[Complex64], fi: &[Complex64]) -> Vec<f64> {
    let one = Complex64::new(1., 0.);

    omega.iter()
        .zip(fe.iter().zip(fi.iter()))
        .map(|(&w, (&fe, &fi))| {
            let ion_screening = (one + 2. * xi2 * fi).norm_sqr();
            let dielectric = (one + 2. * xe2 * fe + 2. * xi2 * fi).norm_sqr();
            let numerator = (-fe).im * ion_screening + 4. * xe2 * xe2 * (-fi).im * fe.norm_sqr();
            (ne / (PI * w) * numerator / dielectric).abs()
        })
        .collect()
}


fn collect_degeneracies(frequency: &[f64], fe: &SpeciesTerm, fi: &SpeciesTerm, power: &[f64]) -> Vec<Degeneracy> {
    let mut out: Vec<Degeneracy> = Vec::new();

    for (i, p) in power.iter().enumerate() {
        let stage = if fe.degenerate.binary_search(&i).is_ok() {
            Stage::Electron
        } else if fi.degenerate.binary_search(&i).is_ok() {
            Stage::Ion
        } else if !p.is_finite() {
            Stage::Spectrum
        } else {
            continue;
        };

        out.push(Degeneracy { index: i, frequency: frequency[i], stage });
    }

    out
}


/// The area under the ion line (for `f_max` below 1 MHz) or under the
/// upper plasma line (frequencies above 0.5 MHz). Non-finite samples are
/// skipped.
pub fn line_area(frequency: &[f64], power: &[f64], f_max: f64) -> f64 {
    let f_min = if f_max < PLASMA_LINE_F_MAX { f64::NEG_INFINITY } else { PLASMA_LINE_F_MIN };

    let (f, p): (Vec<f64>, Vec<f64>) = frequency.iter()
        .zip(power.iter())
        .filter(|&(&f, &p)| f > f_min && p.is_finite())
        .map(|(&f, &p)| (f, p))
        .unzip();

    trapezoid(&f, &p)
}


#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::*;

    #[test]
    fn assembly_is_even_in_frequency() {
        let fe = Complex64::new(0.9, -0.05);
        let fi = Complex64::new(0.3, -0.6);
        let p = assemble(&[-1e3, 1e3], 2e11, 300., 300., &[fe.conj(), fe], &[fi.conj(), fi]);
        assert_eq!(p[0], p[1]);
        assert!(p[0] > 0.);
    }

    #[test]
    fn zero_frequency_is_not_finite() {
        let f = Complex64::new(1., 0.);
        let p = assemble(&[0.], 2e11, 300., 300., &[f], &[f]);
        assert!(!p[0].is_finite());
    }

    fn term(species: crate::config::Species, degenerate: Vec<usize>) -> SpeciesTerm {
        SpeciesTerm {
            species,
            values: vec![Complex64::new(1., 0.); 4],
            degenerate,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn degeneracies_name_their_stage() {
        use crate::config::Species;

        let f = [-2e3, -1e3, 1e3, 2e3];
        let fe = term(Species::Electron, vec![1]);
        let fi = term(Species::Ion, vec![1, 2]);
        let power = [1., f64::NAN, f64::NAN, f64::INFINITY];

        let d = collect_degeneracies(&f, &fe, &fi, &power);
        let stages: Vec<(usize, Stage)> = d.iter().map(|d| (d.index, d.stage)).collect();

        assert_eq!(stages, vec![(1, Stage::Electron), (2, Stage::Ion), (3, Stage::Spectrum)]);
        assert_eq!(d[1].frequency, 1e3);
        assert!(collect_degeneracies(&f, &term(Species::Electron, vec![]), &term(Species::Ion, vec![]),
                                     &[1., 2., 3., 4.]).is_empty());
    }

    #[test]
    fn area_bands() {
        let f = [-1e6, -6e5, 0., 6e5, 1e6];
        let p = [1., 1., 1., 1., 1.];
        assert_approx_eq!(line_area(&f, &p, 5e5), 2e6, 1e-6);
        assert_approx_eq!(line_area(&f, &p, 2e6), 4e5, 1e-6);

        let q = [1., f64::NAN, 1., 1., 1.];
        assert!(line_area(&f, &q, 5e5).is_finite());
    }

    #[test]
    fn options_builder() {
        let o = SpectrumOptions::default().kappa(3.).vdf("kappa").area(true);
        assert_eq!(o, SpectrumOptions { kappa: Some(3.), vdf: Some("kappa".to_owned()), area: true });
    }
}
