//! Generation collaborator - the remote language-model call
//!
//! The orchestrator treats generation as an opaque async function
//! `generate(prompt, params) -> text` that may be slow or fail. Failures
//! carry a label ([`GenerationError::label`]) that is kept for
//! diagnostics; the orchestrator handles every kind the same way.
//!
//! # Example
//!
//! ```rust
//! use sampling_lab::generation::{GenerationError, GenerationParams, Generator};
//!
//! struct Echo;
//!
//! impl Generator for Echo {
//!     async fn generate(
//!         &self,
//!         prompt: &str,
//!         _params: &GenerationParams,
//!     ) -> Result<String, GenerationError> {
//!         Ok(prompt.to_string())
//!     }
//! }
//! ```

mod openai;

pub use openai::OpenAiClient;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::ParameterCombination;

/// Sampling parameters for a single generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f64,
    /// Nucleus-sampling cutoff
    pub top_p: f64,
    /// Model identifier
    pub model: String,
}

impl GenerationParams {
    /// Parameters for one grid cell.
    #[must_use]
    pub fn for_combination(combination: ParameterCombination, model: impl Into<String>) -> Self {
        Self {
            temperature: combination.temperature,
            top_p: combination.top_p,
            model: model.into(),
        }
    }
}

/// Labeled failure of a generation call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// Provider throttled the request (HTTP 429)
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// Credentials rejected (HTTP 401/403)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Connection, timeout or transport failure
    #[error("network failure: {0}")]
    Network(String),

    /// Provider answered without any content
    #[error("no content returned by the model")]
    EmptyResponse,

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Stable label for logs and diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::RateLimited(_) => "rate_limited",
            Self::Unauthorized(_) => "unauthorized",
            Self::Network(_) => "network",
            Self::EmptyResponse => "empty_response",
            Self::Other(_) => "other",
        }
    }
}

/// Remote text generation.
///
/// Implementations must be shareable across concurrently running tasks.
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt` with the given sampling parameters.
    fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// Cheap token estimate: one token per four characters, rounded up.
///
/// Not a tokenizer; callers must not rely on exactness.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        // counted in characters, not bytes
        assert_eq!(estimate_tokens("ééééé"), 2);
    }

    #[test]
    fn test_error_labels() {
        assert_eq!(GenerationError::RateLimited(String::new()).label(), "rate_limited");
        assert_eq!(GenerationError::Unauthorized(String::new()).label(), "unauthorized");
        assert_eq!(GenerationError::Network(String::new()).label(), "network");
        assert_eq!(GenerationError::EmptyResponse.label(), "empty_response");
        assert_eq!(GenerationError::Other("boom".into()).label(), "other");
        assert_eq!(GenerationError::Other("boom".into()).to_string(), "boom");
    }

    #[test]
    fn test_params_for_combination() {
        let params = GenerationParams::for_combination(ParameterCombination::new(0.3, 0.8), "m");
        assert!((params.temperature - 0.3).abs() < f64::EPSILON);
        assert!((params.top_p - 0.8).abs() < f64::EPSILON);
        assert_eq!(params.model, "m");
    }
}
