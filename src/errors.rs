// Copyright 2017-2018 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the GPL version 3.

//! Error types.

use thiserror::Error;


/// Everything that can make a spectrum calculation refuse to run.
///
/// All of these are raised before any integration starts, with the exception
/// of `NumericDegeneracy`, which covers run-wide numerical failures such as a
/// distribution that cannot be normalized on the configured velocity grid.
/// Degeneracies of individual frequency samples are not errors; they are
/// recorded in the spectrum metadata instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The named distribution model is not one we know about.
    #[error("unsupported distribution model \"{0}\"")]
    UnsupportedModel(String),

    /// A parameter that the requested model needs was not provided.
    #[error("missing required parameter \"{0}\"")]
    MissingParameter(String),

    /// A parameter was provided, but its value is unusable.
    #[error("invalid value for parameter \"{name}\": {reason}")]
    InvalidParameter {
        /// The name of the offending parameter.
        name: String,

        /// What is wrong with it.
        reason: String,
    },

    /// A numerical computation produced non-finite or zero results where a
    /// usable number is required.
    #[error("numerical degeneracy: {0}")]
    NumericDegeneracy(String),

    /// A dedicated worker thread pool could not be created.
    #[error("could not build worker pool: {0}")]
    WorkerPool(String),

    /// Settings could not be parsed from JSON.
    #[error("malformed settings: {0}")]
    Settings(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for constructing an `InvalidParameter` error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}


/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
