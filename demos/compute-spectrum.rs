// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

/// Compute one ISR spectrum and print it as tab-separated columns.
///
/// The system settings are read from a JSON file such as
///
/// ```json
/// {"B": 3.5e-5, "F0": 4.3e8, "F_MAX": 2e6, "MI": 16, "NE": 2e11,
///  "NU_E": 0, "NU_I": 0, "T_E": 200, "T_I": 200, "THETA": 0.7854}
/// ```
///
/// The metadata go to standard error as JSON.

extern crate clap;
extern crate inscar;
extern crate inscar_test_support;

use clap::{value_parser, Arg, ArgAction, Command};
use inscar::{Executor, QuadratureRule, Resolution, SpectrumCalculation, SpectrumOptions, SystemSettings};
use std::fs;
use std::io::{self, Write};
use std::process;


fn main() {
    let matches = Command::new("compute-spectrum")
        .version(clap::crate_version!())
        .about("Compute an incoherent scatter radar spectrum")
        .arg(Arg::new("SETTINGS")
             .help("Path to a JSON file of system settings")
             .required(true)
             .index(1))
        .arg(Arg::new("MODEL")
             .help("The distribution model: maxwell, kappa, gauss_shell, or a_vdf")
             .default_value("maxwell")
             .index(2))
        .arg(Arg::new("kappa")
             .long("kappa")
             .help("The kappa index")
             .value_parser(value_parser!(f64)))
        .arg(Arg::new("vdf")
             .long("vdf")
             .help("The distribution integrated numerically by the a_vdf model"))
        .arg(Arg::new("area")
             .long("area")
             .help("Report the area under the line")
             .action(ArgAction::SetTrue))
        .arg(Arg::new("threads")
             .long("threads")
             .help("Number of worker threads; 0 runs everything on the main thread")
             .value_parser(value_parser!(usize)))
        .arg(Arg::new("n_frequency")
             .long("n-frequency")
             .help("Number of frequency samples")
             .value_parser(value_parser!(usize)))
        .arg(Arg::new("n_gordeyev")
             .long("n-gordeyev")
             .help("Number of samples on the Gordeyev axes")
             .value_parser(value_parser!(usize)))
        .arg(Arg::new("n_velocity")
             .long("n-velocity")
             .help("Number of samples on the velocity axis")
             .value_parser(value_parser!(usize)))
        .arg(Arg::new("order")
             .long("order")
             .help("Power of the grid warp")
             .value_parser(value_parser!(i32)))
        .arg(Arg::new("trapezoid")
             .long("trapezoid")
             .help("Use the trapezoid rule instead of Simpson's")
             .action(ArgAction::SetTrue))
        .get_matches();

    let log = inscar_test_support::default_log();

    let text = match fs::read_to_string(matches.get_one::<String>("SETTINGS").unwrap()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: cannot read settings: {}", e);
            process::exit(1);
        }
    };

    let settings = match SystemSettings::from_json(&text) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let mut options = SpectrumOptions::default().area(matches.get_flag("area"));
    options.kappa = matches.get_one::<f64>("kappa").copied();
    options.vdf = matches.get_one::<String>("vdf").cloned();

    let mut resolution = Resolution::default();

    if let Some(&n) = matches.get_one::<usize>("n_frequency") {
        resolution = resolution.n_frequency(n);
    }

    if let Some(&n) = matches.get_one::<usize>("n_gordeyev") {
        resolution = resolution.n_gordeyev(n);
    }

    if let Some(&n) = matches.get_one::<usize>("n_velocity") {
        resolution = resolution.n_velocity(n);
    }

    if let Some(&o) = matches.get_one::<i32>("order") {
        resolution = resolution.order(o);
    }

    if matches.get_flag("trapezoid") {
        resolution = resolution.rule(QuadratureRule::Trapezoid);
    }

    let executor = match matches.get_one::<usize>("threads") {
        None => Executor::default(),
        Some(0) => Executor::Sequential,
        Some(&n) => Executor::Parallel { threads: Some(n) },
    };

    let model = matches.get_one::<String>("MODEL").unwrap();

    let spectrum = match SpectrumCalculation::new(log)
        .executor(executor)
        .resolution(resolution)
        .compute(model, &settings, &options)
    {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (f, p) in spectrum.frequency.iter().zip(spectrum.power.iter()) {
        writeln!(out, "{:.9e}\t{:.9e}", f, p).unwrap();
    }

    eprintln!("{}", serde_json::to_string_pretty(&spectrum.metadata).unwrap());
}
