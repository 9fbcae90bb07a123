// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/*! Run parameters and the per-species particle model.

A run is configured by a [`SystemSettings`] value, keyed the way radar
people write them down (`B`, `F0`, `NE`, `T_E`, …), plus a [`Resolution`]
that fixes the numerical grids. Together they produce an immutable
[`Parameters`] value, from which the two [`Particle`]s are derived.

*/

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::maxwell::MaxwellDistribution;
use crate::quadrature::{warped_axis, QuadratureRule};
use crate::vdf::Vdf;
use crate::{BOLTZMANN, ELEMENTARY_CHARGE, EPSILON_0, MASS_ELECTRON, MASS_NEUTRON, MASS_PROTON, SPEED_LIGHT, TWO_PI};


/// A single value in a settings map: either a number or a piece of text.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
#[serde(untagged)]
pub enum Setting {
    /// A numerical value.
    Number(f64),

    /// A textual value, such as a file name.
    Text(String),
}

impl From<f64> for Setting {
    fn from(v: f64) -> Self {
        Setting::Number(v)
    }
}

impl From<&str> for Setting {
    fn from(v: &str) -> Self {
        Setting::Text(v.to_owned())
    }
}

impl From<String> for Setting {
    fn from(v: String) -> Self {
        Setting::Text(v)
    }
}

impl Setting {
    fn number(self, key: &str) -> Result<f64> {
        match self {
            Setting::Number(v) => Ok(v),
            Setting::Text(t) => t.trim().parse::<f64>()
                .map_err(|_| Error::invalid(key, format!("expected a number, got \"{}\"", t))),
        }
    }

    fn text(self, key: &str) -> Result<String> {
        match self {
            Setting::Text(t) => Ok(t),
            Setting::Number(_) => Err(Error::invalid(key, "expected text, got a number")),
        }
    }
}


/// The physical inputs of a run.
///
/// Serialized with the conventional short keys so that metadata round-trips
/// into the same format the settings were read from.
#[derive(Clone,Debug,PartialEq,Serialize)]
pub struct SystemSettings {
    /// Magnetic field strength, in Tesla. Key `B`.
    #[serde(rename = "B")]
    pub magnetic_field: f64,

    /// Radar transmitter frequency, in Hz. Key `F0`; defaults to 430 MHz.
    #[serde(rename = "F0")]
    pub radar_frequency: f64,

    /// Half-width of the computed frequency band, in Hz. Key `F_MAX`;
    /// defaults to 2 MHz.
    #[serde(rename = "F_MAX")]
    pub frequency_limit: f64,

    /// Ion mass in atomic mass units. Key `MI`.
    #[serde(rename = "MI")]
    pub ion_mass_number: f64,

    /// Electron number density, in m⁻³. Key `NE`.
    #[serde(rename = "NE")]
    pub electron_density: f64,

    /// Electron collision frequency, in Hz. Key `NU_E`.
    #[serde(rename = "NU_E")]
    pub electron_collision_frequency: f64,

    /// Ion collision frequency, in Hz. Key `NU_I`.
    #[serde(rename = "NU_I")]
    pub ion_collision_frequency: f64,

    /// Electron temperature, in K. Key `T_E`.
    #[serde(rename = "T_E")]
    pub electron_temperature: f64,

    /// Ion temperature, in K. Key `T_I`.
    #[serde(rename = "T_I")]
    pub ion_temperature: f64,

    /// Temperature characterizing the speed of the suprathermal shell of
    /// the Gaussian-shell model, in K. Key `T_ES`.
    #[serde(rename = "T_ES", skip_serializing_if = "Option::is_none")]
    pub shell_temperature: Option<f64>,

    /// Aspect angle between the radar beam and the magnetic field, in
    /// radians. Key `THETA`.
    #[serde(rename = "THETA")]
    pub aspect_angle: f64,

    /// Altitude used to look up tabulated distributions, in km. Key `Z`.
    #[serde(rename = "Z", skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    /// Identifier of the tabulated distribution data. Key `mat_file`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mat_file: Option<String>,

    /// Keys we do not interpret. They are carried along into the metadata.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Setting>,
}


fn take_number(map: &mut BTreeMap<String, Setting>, key: &str) -> Result<Option<f64>> {
    map.remove(key).map(|s| s.number(key)).transpose()
}

fn require_number(map: &mut BTreeMap<String, Setting>, key: &str) -> Result<f64> {
    take_number(map, key)?.ok_or_else(|| Error::MissingParameter(key.to_owned()))
}

fn check_positive(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0. {
        Ok(())
    } else {
        Err(Error::invalid(name, format!("must be positive and finite; got {}", v)))
    }
}

fn check_non_negative(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0. {
        Ok(())
    } else {
        Err(Error::invalid(name, format!("must be non-negative and finite; got {}", v)))
    }
}


impl SystemSettings {
    /// Build settings from a map of keys to values.
    ///
    /// The keys `B`, `MI`, `NE`, `NU_E`, `NU_I`, `T_E`, `T_I`, and `THETA`
    /// are required. Unrecognized keys are kept in `extra`.
    pub fn from_map(mut map: BTreeMap<String, Setting>) -> Result<Self> {
        let settings = SystemSettings {
            magnetic_field: require_number(&mut map, "B")?,
            radar_frequency: take_number(&mut map, "F0")?.unwrap_or(430e6),
            frequency_limit: take_number(&mut map, "F_MAX")?.unwrap_or(2e6),
            ion_mass_number: require_number(&mut map, "MI")?,
            electron_density: require_number(&mut map, "NE")?,
            electron_collision_frequency: require_number(&mut map, "NU_E")?,
            ion_collision_frequency: require_number(&mut map, "NU_I")?,
            electron_temperature: require_number(&mut map, "T_E")?,
            ion_temperature: require_number(&mut map, "T_I")?,
            shell_temperature: take_number(&mut map, "T_ES")?,
            aspect_angle: require_number(&mut map, "THETA")?,
            altitude: take_number(&mut map, "Z")?,
            mat_file: map.remove("mat_file").map(|s| s.text("mat_file")).transpose()?,
            extra: map,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Build settings from `(key, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
        where I: IntoIterator<Item = (K, V)>, K: Into<String>, V: Into<Setting>
    {
        Self::from_map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Parse settings from a JSON object.
    pub fn from_json(text: &str) -> Result<Self> {
        let map: BTreeMap<String, Setting> = serde_json::from_str(text)?;
        Self::from_map(map)
    }

    /// Basic domain checks on every value.
    pub fn validate(&self) -> Result<()> {
        check_non_negative("B", self.magnetic_field)?;
        check_positive("F0", self.radar_frequency)?;
        check_positive("F_MAX", self.frequency_limit)?;
        check_positive("MI", self.ion_mass_number)?;
        check_positive("NE", self.electron_density)?;
        check_non_negative("NU_E", self.electron_collision_frequency)?;
        check_non_negative("NU_I", self.ion_collision_frequency)?;
        check_positive("T_E", self.electron_temperature)?;
        check_positive("T_I", self.ion_temperature)?;

        if let Some(t) = self.shell_temperature {
            check_positive("T_ES", t)?;
        }

        if !self.aspect_angle.is_finite() {
            return Err(Error::invalid("THETA", "must be finite"));
        }

        if let Some(z) = self.altitude {
            if !z.is_finite() {
                return Err(Error::invalid("Z", "must be finite"));
            }
        }

        Ok(())
    }

    /// The ion mass in kg. Ion masses are given in units of the mean of the
    /// proton and neutron masses.
    pub fn ion_mass(&self) -> f64 {
        self.ion_mass_number * 0.5 * (MASS_PROTON + MASS_NEUTRON)
    }

    /// The signed radar wavenumber, in rad/m. The backscatter geometry
    /// doubles the transmitted wavenumber.
    pub fn radar_wavenumber(&self) -> f64 {
        -2. * TWO_PI * self.radar_frequency / SPEED_LIGHT
    }
}


/// Numerical resolution of a run.
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct Resolution {
    /// Number of samples on the frequency axis.
    pub n_frequency: usize,

    /// Number of samples on each Gordeyev axis.
    pub n_gordeyev: usize,

    /// Number of samples on the velocity axis.
    pub n_velocity: usize,

    /// Upper limit of the electron Gordeyev axis, in seconds.
    pub electron_y_max: f64,

    /// Upper limit of the ion Gordeyev axis, in seconds.
    pub ion_y_max: f64,

    /// Upper limit of the velocity axis, in m/s.
    pub v_max: f64,

    /// Power of the grid warp; see [`warped_axis`].
    pub order: i32,

    /// Quadrature rule for both the Gordeyev and velocity integrals.
    pub rule: QuadratureRule,
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution {
            n_frequency: 1000,
            n_gordeyev: 60001,
            n_velocity: 10001,
            electron_y_max: 1.5e-4,
            ion_y_max: 1.5e-2,
            v_max: 6e6,
            order: 3,
            rule: QuadratureRule::Simpson,
        }
    }
}

impl Resolution {
    /// Set the number of frequency samples.
    pub fn n_frequency(mut self, n: usize) -> Self {
        self.n_frequency = n;
        self
    }

    /// Set the number of samples on the Gordeyev axes.
    pub fn n_gordeyev(mut self, n: usize) -> Self {
        self.n_gordeyev = n;
        self
    }

    /// Set the number of samples on the velocity axis.
    pub fn n_velocity(mut self, n: usize) -> Self {
        self.n_velocity = n;
        self
    }

    /// Set the upper limits of the electron and ion Gordeyev axes.
    pub fn y_limits(mut self, electron: f64, ion: f64) -> Self {
        self.electron_y_max = electron;
        self.ion_y_max = ion;
        self
    }

    /// Set the upper limit of the velocity axis.
    pub fn v_max(mut self, v_max: f64) -> Self {
        self.v_max = v_max;
        self
    }

    /// Set the quadrature rule.
    pub fn rule(mut self, rule: QuadratureRule) -> Self {
        self.rule = rule;
        self
    }

    /// Set the power of the grid warp.
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// The upper limit of the Gordeyev axis of the given species.
    pub fn y_max(&self, species: Species) -> f64 {
        match species {
            Species::Electron => self.electron_y_max,
            Species::Ion => self.ion_y_max,
        }
    }

    /// Check that these grids can be built and integrated over.
    pub fn validate(&self) -> Result<()> {
        if self.n_frequency < 2 {
            return Err(Error::invalid("n_frequency", "need at least two samples"));
        }

        for &(name, n) in &[("n_gordeyev", self.n_gordeyev), ("n_velocity", self.n_velocity)] {
            if n < 3 {
                return Err(Error::invalid(name, "need at least three samples"));
            }

            if self.rule == QuadratureRule::Simpson && n % 2 == 0 {
                return Err(Error::invalid(
                    name,
                    format!("Simpson's rule needs an odd number of samples; got {}", n)
                ));
            }
        }

        check_positive("electron_y_max", self.electron_y_max)?;
        check_positive("ion_y_max", self.ion_y_max)?;
        check_positive("v_max", self.v_max)?;

        if self.order < 1 {
            return Err(Error::invalid("order", "must be at least 1"));
        }

        Ok(())
    }
}


/// The frequency axis: `F_MAX x³` for `x` evenly spaced over `[-1, 1]`.
///
/// The negative half is the exact negation of the positive half. An even
/// number of samples therefore never contains zero; an odd number puts an
/// exact zero in the middle.
pub fn frequency_axis(f_max: f64, n: usize) -> Vec<f64> {
    let mut f = vec![0.; n];

    if n < 2 {
        return f;
    }

    let denom = (n - 1) as f64;

    for i in 0..n / 2 {
        let x = (n - 1 - 2 * i) as f64 / denom;
        let v = f_max * x * x * x;
        f[n - 1 - i] = v;
        f[i] = -v;
    }

    f
}


/// Grids that underflow or are too short are reported under `name`.
fn check_named_axis(rule: QuadratureRule, x: &[f64], name: &str) -> Result<()> {
    rule.check_axis(x).map_err(|e| match e {
        Error::InvalidParameter { reason, .. } => Error::invalid(name, reason),
        other => other,
    })
}


/// The parameters of one run. Constructed once and then only read.
#[derive(Clone,Debug)]
pub struct Parameters {
    /// The physical inputs.
    pub settings: SystemSettings,

    /// The numerical resolution.
    pub resolution: Resolution,

    /// The signed radar wavenumber `-4π F0 / c`, in rad/m.
    pub radar_wavenumber: f64,

    /// The frequency axis, in Hz.
    pub frequency: Vec<f64>,

    /// The frequency axis, in rad/s.
    pub angular_frequency: Vec<f64>,

    /// The velocity axis used by numerical integrals, in m/s.
    pub velocity_axis: Vec<f64>,
}

impl Parameters {
    /// Validate the inputs and build the shared axes.
    pub fn new(settings: SystemSettings, resolution: Resolution) -> Result<Self> {
        settings.validate()?;
        resolution.validate()?;

        let frequency = frequency_axis(settings.frequency_limit, resolution.n_frequency);
        let angular_frequency = frequency.iter().map(|f| TWO_PI * f).collect();
        let velocity_axis = warped_axis(resolution.v_max, resolution.n_velocity, resolution.order);
        check_named_axis(resolution.rule, &velocity_axis, "velocity_axis")?;

        for &(species, name) in &[(Species::Electron, "electron_gordeyev_axis"), (Species::Ion, "ion_gordeyev_axis")] {
            let y = warped_axis(resolution.y_max(species), resolution.n_gordeyev, resolution.order);
            check_named_axis(resolution.rule, &y, name)?;
        }

        Ok(Parameters {
            radar_wavenumber: settings.radar_wavenumber(),
            settings,
            resolution,
            frequency,
            angular_frequency,
            velocity_axis,
        })
    }

    /// The Gordeyev axis of the given species.
    pub fn gordeyev_axis(&self, species: Species) -> Vec<f64> {
        let r = &self.resolution;
        warped_axis(r.y_max(species), r.n_gordeyev, r.order)
    }
}


/// The two species of the plasma.
#[derive(Copy,Clone,Debug,Eq,Hash,PartialEq,Serialize,Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Electrons.
    Electron,

    /// Singly charged ions.
    Ion,
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            Species::Electron => "electron",
            Species::Ion => "ion",
        })
    }
}


/// One particle species of the plasma.
#[derive(Clone,Debug)]
pub struct Particle {
    /// Which species this is.
    pub species: Species,

    /// Temperature, in K.
    pub temperature: f64,

    /// Mass, in kg.
    pub mass: f64,

    /// Number density, in m⁻³.
    pub number_density: f64,

    /// Collision frequency, in Hz.
    pub collision_frequency: f64,

    /// Gyro frequency `|q| B / m`, in rad/s.
    pub gyro_frequency: f64,

    /// Kappa index, if the distribution has one.
    pub kappa: Option<f64>,

    /// Samples of the Gordeyev integral’s time-like axis, in seconds.
    pub gordeyev_axis: Vec<f64>,

    /// The velocity distribution.
    pub vdf: Vdf,
}

impl Particle {
    fn new(params: &Parameters, species: Species, temperature: f64, mass: f64, collision_frequency: f64) -> Self {
        let s = &params.settings;

        Particle {
            species,
            temperature,
            mass,
            number_density: s.electron_density,
            collision_frequency,
            gyro_frequency: ELEMENTARY_CHARGE * s.magnetic_field / mass,
            kappa: None,
            gordeyev_axis: params.gordeyev_axis(species),
            vdf: Vdf::Maxwell(MaxwellDistribution::new(temperature, mass)),
        }
    }

    /// The electrons of the plasma, with a Maxwellian distribution.
    pub fn electron(params: &Parameters) -> Self {
        let s = &params.settings;
        Self::new(params, Species::Electron, s.electron_temperature, MASS_ELECTRON,
                  s.electron_collision_frequency)
    }

    /// The ions of the plasma, with a Maxwellian distribution. The ion
    /// density equals the electron density.
    pub fn ion(params: &Parameters) -> Self {
        let s = &params.settings;
        Self::new(params, Species::Ion, s.ion_temperature, s.ion_mass(), s.ion_collision_frequency)
    }

    /// Replace the velocity distribution.
    pub fn with_vdf(mut self, vdf: Vdf) -> Self {
        self.kappa = vdf.kappa();
        self.vdf = vdf;
        self
    }

    /// The squared thermal speed `k_B T / m`, in m²/s².
    pub fn thermal_variance(&self) -> f64 {
        BOLTZMANN * self.temperature / self.mass
    }

    /// The Debye length of this species, in m. The electron density sets the
    /// screening for both species.
    pub fn debye_length(&self) -> f64 {
        (EPSILON_0 * BOLTZMANN * self.temperature
         / (self.number_density * ELEMENTARY_CHARGE * ELEMENTARY_CHARGE)).sqrt()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn base_pairs() -> Vec<(&'static str, f64)> {
        vec![
            ("B", 3.5e-5), ("F0", 4.3e8), ("F_MAX", 2e6), ("MI", 16.), ("NE", 2e11),
            ("NU_E", 0.), ("NU_I", 0.), ("T_E", 200.), ("T_I", 200.), ("THETA", 0.785),
        ]
    }

    #[test]
    fn missing_key() {
        let pairs: Vec<_> = base_pairs().into_iter().filter(|(k, _)| *k != "NE").collect();

        match SystemSettings::from_pairs(pairs) {
            Err(Error::MissingParameter(k)) => assert_eq!(k, "NE"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn negative_temperature() {
        let mut pairs = base_pairs();
        pairs[7].1 = -10.;

        match SystemSettings::from_pairs(pairs) {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, "T_E"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn json_with_defaults_and_extras() {
        let s = SystemSettings::from_json(r#"{
            "B": 3.5e-5, "MI": 16, "NE": 2e11, "NU_E": 0, "NU_I": 0,
            "T_E": 2000, "T_I": 1500, "THETA": 0.5, "mat_file": "fe_zmuE-07.mat",
            "observer": "EISCAT"
        }"#).unwrap();

        assert_eq!(s.radar_frequency, 430e6);
        assert_eq!(s.frequency_limit, 2e6);
        assert_eq!(s.mat_file.as_deref(), Some("fe_zmuE-07.mat"));
        assert_eq!(s.extra.get("observer"), Some(&Setting::Text("EISCAT".to_owned())));

        let echoed = serde_json::to_value(&s).unwrap();
        assert_eq!(echoed["T_E"], 2000.);
        assert_eq!(echoed["observer"], "EISCAT");
    }

    #[test]
    fn text_numbers_are_accepted() {
        let mut map: BTreeMap<String, Setting> = base_pairs().into_iter()
            .map(|(k, v)| (k.to_owned(), Setting::Number(v)))
            .collect();
        map.insert("T_I".to_owned(), Setting::Text("1.5e3".to_owned()));
        assert_eq!(SystemSettings::from_map(map).unwrap().ion_temperature, 1500.);
    }

    #[test]
    fn frequency_axis_symmetry() {
        for &n in &[2, 7, 100, 1001] {
            let f = frequency_axis(2e6, n);
            assert_eq!(f[0], -2e6);
            assert_eq!(f[n - 1], 2e6);

            for i in 0..n {
                assert_eq!(f[i], -f[n - 1 - i]);
            }

            assert_eq!(f.iter().any(|&v| v == 0.), n % 2 == 1);
        }
    }

    #[test]
    fn derived_quantities() {
        let s = SystemSettings::from_pairs(base_pairs()).unwrap();
        let p = Parameters::new(s, Resolution::default().n_gordeyev(101).n_velocity(101)).unwrap();

        assert_approx_eq!(p.radar_wavenumber, -18.02427, 1e-4);

        let e = Particle::electron(&p);
        let i = Particle::ion(&p);
        assert_approx_eq!(i.mass / MASS_PROTON, 16.0110, 1e-3);
        assert_approx_eq!(e.gyro_frequency, 6.156e6, 1e3);
        assert_eq!(i.number_density, e.number_density);
        assert_eq!(*e.gordeyev_axis.last().unwrap(), 1.5e-4);
        assert_eq!(*i.gordeyev_axis.last().unwrap(), 1.5e-2);
    }

    #[test]
    fn simpson_needs_odd_sample_counts() {
        let s = SystemSettings::from_pairs(base_pairs()).unwrap();

        match Parameters::new(s.clone(), Resolution::default().n_gordeyev(1000)) {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, "n_gordeyev"),
            other => panic!("unexpected: {:?}", other),
        }

        let r = Resolution::default().n_gordeyev(1000).n_velocity(1000).rule(QuadratureRule::Trapezoid);
        assert!(Parameters::new(s, r).is_ok());
    }

    #[test]
    fn collapsed_gordeyev_axis_is_rejected_up_front() {
        let s = SystemSettings::from_pairs(base_pairs()).unwrap();
        let r = Resolution::default().n_gordeyev(101).n_velocity(101).y_limits(1e-320, 1.5e-2);

        match Parameters::new(s, r) {
            Err(Error::InvalidParameter { name, .. }) => assert_eq!(name, "electron_gordeyev_axis"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
