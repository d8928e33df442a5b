//! Experiment Records - experiments, responses and task lifecycle
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Response (N)
//!                      └── QualityMetrics (scores + derived details)
//! ```
//!
//! Task records are in-memory only; they describe one orchestrator run
//! and are never persisted.
//!
//! ## Usage
//!
//! ```rust
//! use sampling_lab::experiment::{ExperimentStore, KvExperimentStore, NewResponse};
//! use sampling_lab::grid::ParameterCombination;
//! use sampling_lab::scoring;
//!
//! # async fn example() -> sampling_lab::Result<()> {
//! let store = KvExperimentStore::in_memory();
//! let experiment = store.create_experiment("Explain quantum computing").await?;
//!
//! let text = "Qubits hold superpositions. Gates rotate them.";
//! let input = NewResponse::builder(
//!     experiment.id(),
//!     ParameterCombination::new(0.7, 1.0),
//!     text,
//!     scoring::score(text, experiment.prompt()),
//! )
//! .model("gpt-4o-mini")
//! .build();
//! store.create_response(input).await?;
//! # Ok(())
//! # }
//! ```

mod experiment_record;
mod response_record;
mod store;
mod task_record;

pub use experiment_record::{Experiment, ExperimentBuilder};
pub use response_record::{NewResponse, NewResponseBuilder, Response};
pub use store::{ExperimentStore, KvExperimentStore};
pub use task_record::{TaskRecord, TaskStatus};

use rayon::prelude::*;

use crate::scoring::MetricDetails;

/// Re-derive the descriptive details of every response from its text.
///
/// Scores are left untouched; only `details` is recomputed.
pub fn hydrate_details(experiment: &mut Experiment) {
    fill_details(experiment.responses_mut());
}

pub(crate) fn fill_details(responses: &mut [Response]) {
    responses.par_iter_mut().for_each(|response| {
        let details = MetricDetails::from_text(response.response_text());
        response.metrics_mut().set_details(details);
    });
}
