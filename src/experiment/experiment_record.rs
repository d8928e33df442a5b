//! Experiment - aggregate root of one parameter sweep

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Response;

/// One submitted prompt and the responses generated for it.
///
/// Immutable after creation except for the response collection, which
/// only grows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    id: String,
    prompt: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    responses: Vec<Response>,
}

impl Experiment {
    /// Create an experiment with the current timestamp and no responses.
    #[must_use]
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self::builder(id, prompt).build()
    }

    /// Create a builder for constructing an experiment with optional fields.
    #[must_use]
    pub fn builder(id: impl Into<String>, prompt: impl Into<String>) -> ExperimentBuilder {
        ExperimentBuilder::new(id, prompt)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the submitted prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the last-update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Responses loaded with this experiment.
    #[must_use]
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub(crate) fn responses_mut(&mut self) -> &mut [Response] {
        &mut self.responses
    }

    /// Attach the stored responses.
    pub fn set_responses(&mut self, responses: Vec<Response>) {
        self.responses = responses;
    }
}

/// Builder for `Experiment`.
#[derive(Debug)]
pub struct ExperimentBuilder {
    id: String,
    prompt: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    responses: Vec<Response>,
}

impl ExperimentBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            created_at: Utc::now(),
            updated_at: None,
            responses: Vec::new(),
        }
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set a custom update timestamp; defaults to the creation timestamp.
    #[must_use]
    pub const fn updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Attach responses.
    #[must_use]
    pub fn responses(mut self, responses: Vec<Response>) -> Self {
        self.responses = responses;
        self
    }

    /// Build the `Experiment`.
    #[must_use]
    pub fn build(self) -> Experiment {
        Experiment {
            id: self.id,
            prompt: self.prompt,
            created_at: self.created_at,
            updated_at: self.updated_at.unwrap_or(self.created_at),
            responses: self.responses,
        }
    }
}
