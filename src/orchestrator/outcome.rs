//! Aggregate outcome of one experiment run

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::experiment::{Response, TaskRecord};
use crate::generation::GenerationError;
use crate::grid::ParameterCombination;

/// Orchestrator lifecycle.
///
/// `Validating -> CreatingExperiment -> Dispatching -> AwaitingAll -> Aggregated`,
/// with `Rejected` reachable only from the first two phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Checking the request
    Validating,
    /// Persisting the experiment record
    CreatingExperiment,
    /// Spawning one task per grid cell
    Dispatching,
    /// Joining every task
    AwaitingAll,
    /// Aggregate built
    Aggregated,
    /// Request refused before any task ran
    Rejected,
}

impl Phase {
    /// Whether the run is over.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Aggregated | Self::Rejected)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::CreatingExperiment => "creating_experiment",
            Self::Dispatching => "dispatching",
            Self::AwaitingAll => "awaiting_all",
            Self::Aggregated => "aggregated",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Why a single task produced no response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The generation collaborator failed
    #[error("generation failed: {0}")]
    Generation(#[source] GenerationError),

    /// The scorer panicked
    #[error("scoring failed: {0}")]
    Scoring(String),

    /// The response row could not be written
    #[error("persistence failed: {0}")]
    Persistence(String),

    /// The experiment deadline expired first
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The task panicked outside scoring
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl FailureReason {
    /// Stable label for logs and diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Generation(e) => e.label(),
            Self::Scoring(_) => "scoring",
            Self::Persistence(_) => "persistence",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Panicked(_) => "panicked",
        }
    }
}

/// A task that settled without a response.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    /// Grid index of the task
    pub index: usize,
    /// Parameters of the task
    pub combination: ParameterCombination,
    /// Captured cause
    pub reason: FailureReason,
}

/// Summary numbers of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetadata {
    /// Number of persisted responses
    pub total_generated: usize,
    /// Wall-clock time from start to join completion
    pub total_time_ms: u64,
    /// Rounded mean overall score; 0 without responses
    pub average_score: u32,
}

/// Result of [`Orchestrator::run_experiment`](super::Orchestrator::run_experiment).
///
/// Serializes to `{experimentId, responses, metadata}`; failures and task
/// records are diagnostics only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    experiment_id: String,
    responses: Vec<Response>,
    metadata: AggregateMetadata,
    #[serde(skip)]
    failures: Vec<TaskFailure>,
    #[serde(skip)]
    tasks: Vec<TaskRecord>,
}

impl AggregateResult {
    pub(crate) fn new(
        experiment_id: String,
        responses: Vec<Response>,
        total_time_ms: u64,
        failures: Vec<TaskFailure>,
        tasks: Vec<TaskRecord>,
    ) -> Self {
        let metadata = AggregateMetadata {
            total_generated: responses.len(),
            total_time_ms,
            average_score: average_overall(&responses),
        };
        Self {
            experiment_id,
            responses,
            metadata,
            failures,
            tasks,
        }
    }

    /// ID of the experiment the responses belong to.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Persisted responses in completion order.
    #[must_use]
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// Consume the result, keeping the responses.
    #[must_use]
    pub fn into_responses(self) -> Vec<Response> {
        self.responses
    }

    /// Summary numbers.
    #[must_use]
    pub const fn metadata(&self) -> &AggregateMetadata {
        &self.metadata
    }

    /// Failed tasks, sorted by grid index.
    #[must_use]
    pub fn failures(&self) -> &[TaskFailure] {
        &self.failures
    }

    /// Every task of the run in grid order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }
}

#[allow(clippy::cast_precision_loss)]
fn average_overall(responses: &[Response]) -> u32 {
    if responses.is_empty() {
        return 0;
    }
    let sum: u64 = responses
        .iter()
        .map(|r| u64::from(r.metrics().overall()))
        .sum();
    crate::scoring::to_score(sum as f64 / responses.len() as f64)
}
