//! Error types for sampling-lab
//!
//! Only two kinds of error ever reach the caller of
//! [`Orchestrator::run_experiment`](crate::orchestrator::Orchestrator::run_experiment):
//! a rejected request ([`Error::Validation`]) and a failure to create the
//! experiment record ([`Error::Persistence`]). Everything that goes wrong
//! inside a single generation task is captured as a
//! [`TaskFailure`](crate::orchestrator::TaskFailure) instead.

use thiserror::Error;

use crate::generation::GenerationError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// sampling-lab error types
#[derive(Error, Debug)]
pub enum Error {
    /// Bad input shape or range, rejected before any work begins
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Storage collaborator failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Remote generation failure
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Scoring raised where it should have been total
    #[error("Scoring failed: {0}\nScoring is expected to be total over any input. Please report this issue.")]
    Scoring(String),

    /// Lookup of a record that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration could not be loaded or is unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding/decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}
