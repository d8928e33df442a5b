//! Response - one scored generation for one parameter combination

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grid::ParameterCombination;
use crate::scoring::QualityMetrics;

/// A persisted, scored response.
///
/// Created exactly once by the store after a successful generation and
/// scoring; never mutated afterwards except for re-derived details.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    id: String,
    experiment_id: String,
    temperature: f64,
    top_p: f64,
    model: String,
    response_text: String,
    metrics: QualityMetrics,
    response_time_ms: u64,
    token_count: usize,
    created_at: DateTime<Utc>,
}

impl Response {
    /// Materialize a stored response from its creation input.
    #[must_use]
    pub fn from_new(id: impl Into<String>, input: NewResponse, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            experiment_id: input.experiment_id,
            temperature: input.combination.temperature,
            top_p: input.combination.top_p,
            model: input.model,
            response_text: input.response_text,
            metrics: input.metrics,
            response_time_ms: input.response_time_ms,
            token_count: input.token_count,
            created_at,
        }
    }

    /// Get the response ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Sampling temperature used.
    #[must_use]
    pub const fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Top-p used.
    #[must_use]
    pub const fn top_p(&self) -> f64 {
        self.top_p
    }

    /// The `(temperature, top_p)` pair that produced this response.
    #[must_use]
    pub const fn combination(&self) -> ParameterCombination {
        ParameterCombination::new(self.temperature, self.top_p)
    }

    /// Model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Raw generated text.
    #[must_use]
    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    /// Quality scores.
    #[must_use]
    pub const fn metrics(&self) -> &QualityMetrics {
        &self.metrics
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut QualityMetrics {
        &mut self.metrics
    }

    /// Wall-clock duration of the generation call.
    #[must_use]
    pub const fn response_time_ms(&self) -> u64 {
        self.response_time_ms
    }

    /// Estimated token count of the response text.
    #[must_use]
    pub const fn token_count(&self) -> usize {
        self.token_count
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Input for persisting a response.
#[derive(Debug, Clone, PartialEq)]
pub struct NewResponse {
    /// Parent experiment
    pub experiment_id: String,
    /// Grid cell that produced the text
    pub combination: ParameterCombination,
    /// Model identifier
    pub model: String,
    /// Raw generated text
    pub response_text: String,
    /// Scores of `response_text`
    pub metrics: QualityMetrics,
    /// Generation wall-clock time
    pub response_time_ms: u64,
    /// Estimated tokens
    pub token_count: usize,
}

impl NewResponse {
    /// Create a builder with the required fields.
    #[must_use]
    pub fn builder(
        experiment_id: impl Into<String>,
        combination: ParameterCombination,
        response_text: impl Into<String>,
        metrics: QualityMetrics,
    ) -> NewResponseBuilder {
        NewResponseBuilder {
            experiment_id: experiment_id.into(),
            combination,
            model: String::new(),
            response_text: response_text.into(),
            metrics,
            response_time_ms: 0,
            token_count: 0,
        }
    }
}

/// Builder for `NewResponse`.
#[derive(Debug)]
pub struct NewResponseBuilder {
    experiment_id: String,
    combination: ParameterCombination,
    model: String,
    response_text: String,
    metrics: QualityMetrics,
    response_time_ms: u64,
    token_count: usize,
}

impl NewResponseBuilder {
    /// Set the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the generation wall-clock time.
    #[must_use]
    pub const fn response_time_ms(mut self, ms: u64) -> Self {
        self.response_time_ms = ms;
        self
    }

    /// Set the estimated token count.
    #[must_use]
    pub const fn token_count(mut self, tokens: usize) -> Self {
        self.token_count = tokens;
        self
    }

    /// Build the `NewResponse`.
    #[must_use]
    pub fn build(self) -> NewResponse {
        NewResponse {
            experiment_id: self.experiment_id,
            combination: self.combination,
            model: self.model,
            response_text: self.response_text,
            metrics: self.metrics,
            response_time_ms: self.response_time_ms,
            token_count: self.token_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring;

    #[test]
    fn test_response_from_new() {
        let text = "Qubits hold superpositions.";
        let input = NewResponse::builder(
            "exp-1",
            ParameterCombination::new(0.7, 0.9),
            text,
            scoring::score(text, "Explain qubits"),
        )
        .model("gpt-4o-mini")
        .response_time_ms(1234)
        .token_count(7)
        .build();

        let created = Utc::now();
        let response = Response::from_new("resp-1", input, created);

        assert_eq!(response.id(), "resp-1");
        assert_eq!(response.experiment_id(), "exp-1");
        assert_eq!(response.combination(), ParameterCombination::new(0.7, 0.9));
        assert_eq!(response.model(), "gpt-4o-mini");
        assert_eq!(response.response_text(), text);
        assert_eq!(response.response_time_ms(), 1234);
        assert_eq!(response.token_count(), 7);
        assert_eq!(response.created_at(), created);
    }

    #[test]
    fn test_response_json_field_names() {
        let text = "Short.";
        let input = NewResponse::builder(
            "exp-1",
            ParameterCombination::new(1.0, 0.5),
            text,
            scoring::score(text, "prompt words here"),
        )
        .build();
        let json = serde_json::to_value(Response::from_new("r", input, Utc::now())).unwrap();

        for field in ["experimentId", "topP", "responseText", "responseTimeMs", "tokenCount"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        assert!(json["metrics"]["details"].get("wordCount").is_some());
    }
}
