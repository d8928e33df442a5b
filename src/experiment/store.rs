//! Experiment Store - persistence contract for experiments and responses
//!
//! The orchestrator only needs single-row atomic operations:
//! create an experiment, append a response, and read them back. The
//! default implementation encodes rows as JSON in any [`KvStore`].
//!
//! ## Key layout
//!
//! ```text
//! experiment/<experiment-id>
//! response/<experiment-id>/<response-id>
//! ```
//!
//! Identifiers are `<unix-millis>-<sequence>`, so key order is creation
//! order within a process.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{fill_details, Experiment, NewResponse, Response};
use crate::kv::{KvStore, MemoryKvStore};
use crate::scoring::{MetricDetails, QualityMetrics};
use crate::{Error, Result};

const EXPERIMENT_PREFIX: &str = "experiment/";
const RESPONSE_PREFIX: &str = "response/";

/// Storage collaborator used by the orchestrator.
pub trait ExperimentStore: Send + Sync {
    /// Create and persist a new experiment for `prompt`.
    fn create_experiment(&self, prompt: &str) -> impl Future<Output = Result<Experiment>> + Send;

    /// Persist a response row tied to an existing experiment.
    fn create_response(&self, input: NewResponse) -> impl Future<Output = Result<Response>> + Send;

    /// Fetch an experiment with its responses (oldest first) and
    /// re-derived details. `None` if the ID is unknown.
    fn get_experiment(&self, id: &str) -> impl Future<Output = Result<Option<Experiment>>> + Send;

    /// All experiments, newest first, without responses.
    fn get_all_experiments(&self) -> impl Future<Output = Result<Vec<Experiment>>> + Send;

    /// Responses of one experiment, oldest first.
    ///
    /// Details are re-derived from the text when `prompt` is given and
    /// left zeroed otherwise.
    fn experiment_responses(
        &self,
        experiment_id: &str,
        prompt: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Response>>> + Send;

    /// Like [`get_experiment`](Self::get_experiment), but a missing ID is an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown ID.
    fn require_experiment(&self, id: &str) -> impl Future<Output = Result<Experiment>> + Send {
        async move {
            self.get_experiment(id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Experiment not found: {id}")))
        }
    }

    /// Number of stored experiments (connectivity probe).
    fn experiment_count(&self) -> impl Future<Output = Result<usize>> + Send {
        async move { Ok(self.get_all_experiments().await?.len()) }
    }
}

impl<T: ExperimentStore> ExperimentStore for Arc<T> {
    fn create_experiment(&self, prompt: &str) -> impl Future<Output = Result<Experiment>> + Send {
        (**self).create_experiment(prompt)
    }

    fn create_response(&self, input: NewResponse) -> impl Future<Output = Result<Response>> + Send {
        (**self).create_response(input)
    }

    fn get_experiment(&self, id: &str) -> impl Future<Output = Result<Option<Experiment>>> + Send {
        (**self).get_experiment(id)
    }

    fn get_all_experiments(&self) -> impl Future<Output = Result<Vec<Experiment>>> + Send {
        (**self).get_all_experiments()
    }

    fn experiment_responses(
        &self,
        experiment_id: &str,
        prompt: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        (**self).experiment_responses(experiment_id, prompt)
    }
}

/// Stored form of an experiment (responses live under their own keys).
#[derive(Debug, Serialize, Deserialize)]
struct ExperimentRow {
    id: String,
    prompt: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored form of a response. Details are derived data and not stored.
#[derive(Debug, Serialize, Deserialize)]
struct ResponseRow {
    id: String,
    experiment_id: String,
    temperature: f64,
    top_p: f64,
    model: String,
    response_text: String,
    coherence_score: Option<u32>,
    completeness_score: Option<u32>,
    structural_score: Option<u32>,
    overall_score: Option<u32>,
    response_time_ms: Option<u64>,
    token_count: Option<usize>,
    created_at: DateTime<Utc>,
}

impl ExperimentRow {
    fn into_experiment(self) -> Experiment {
        Experiment::builder(self.id, self.prompt)
            .created_at(self.created_at)
            .updated_at(self.updated_at)
            .build()
    }
}

impl ResponseRow {
    fn from_response(response: &Response) -> Self {
        let metrics = response.metrics();
        Self {
            id: response.id().to_string(),
            experiment_id: response.experiment_id().to_string(),
            temperature: response.temperature(),
            top_p: response.top_p(),
            model: response.model().to_string(),
            response_text: response.response_text().to_string(),
            coherence_score: Some(metrics.coherence()),
            completeness_score: Some(metrics.completeness()),
            structural_score: Some(metrics.structural()),
            overall_score: Some(metrics.overall()),
            response_time_ms: Some(response.response_time_ms()),
            token_count: Some(response.token_count()),
            created_at: response.created_at(),
        }
    }

    fn into_response(self) -> Response {
        let metrics = QualityMetrics::new(
            self.coherence_score.unwrap_or(0),
            self.completeness_score.unwrap_or(0),
            self.structural_score.unwrap_or(0),
            MetricDetails::default(),
        );
        let input = NewResponse {
            experiment_id: self.experiment_id,
            combination: crate::grid::ParameterCombination::new(self.temperature, self.top_p),
            model: self.model,
            response_text: self.response_text,
            metrics,
            response_time_ms: self.response_time_ms.unwrap_or(0),
            token_count: self.token_count.unwrap_or(0),
        };
        Response::from_new(self.id, input, self.created_at)
    }
}

/// [`ExperimentStore`] over any [`KvStore`], rows encoded as JSON.
///
/// # Example
///
/// ```rust
/// use sampling_lab::experiment::{ExperimentStore, KvExperimentStore};
///
/// # async fn example() -> sampling_lab::Result<()> {
/// let store = KvExperimentStore::in_memory();
/// let experiment = store.create_experiment("Explain quantum computing").await?;
/// assert!(store.get_experiment(experiment.id()).await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct KvExperimentStore<S> {
    kv: S,
    sequence: AtomicU64,
}

impl KvExperimentStore<MemoryKvStore> {
    /// Store backed by a fresh [`MemoryKvStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryKvStore::new())
    }
}

impl<S: KvStore> KvExperimentStore<S> {
    /// Wrap a KV backend.
    #[must_use]
    pub const fn new(kv: S) -> Self {
        Self {
            kv,
            sequence: AtomicU64::new(0),
        }
    }

    /// The underlying KV backend.
    #[must_use]
    pub const fn kv(&self) -> &S {
        &self.kv
    }

    fn next_id(&self, now: DateTime<Utc>) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{:013}-{seq:06}", now.timestamp_millis())
    }
}

fn experiment_key(id: &str) -> String {
    format!("{EXPERIMENT_PREFIX}{id}")
}

fn response_prefix(experiment_id: &str) -> String {
    format!("{RESPONSE_PREFIX}{experiment_id}/")
}

fn persistence(context: &str, err: impl std::fmt::Display) -> Error {
    Error::Persistence(format!("{context}: {err}"))
}

impl<S: KvStore> ExperimentStore for KvExperimentStore<S> {
    async fn create_experiment(&self, prompt: &str) -> Result<Experiment> {
        let now = Utc::now();
        let row = ExperimentRow {
            id: self.next_id(now),
            prompt: prompt.to_string(),
            created_at: now,
            updated_at: now,
        };
        let bytes =
            serde_json::to_vec(&row).map_err(|e| persistence("Failed to encode experiment", e))?;
        self.kv
            .set(&experiment_key(&row.id), bytes)
            .await
            .map_err(|e| persistence("Failed to write experiment", e))?;

        debug!(experiment_id = %row.id, "Experiment created");
        Ok(row.into_experiment())
    }

    async fn create_response(&self, input: NewResponse) -> Result<Response> {
        let exists = self
            .kv
            .exists(&experiment_key(&input.experiment_id))
            .await
            .map_err(|e| persistence("Failed to check experiment", e))?;
        if !exists {
            return Err(Error::Persistence(format!(
                "experiment {} does not exist",
                input.experiment_id
            )));
        }

        let now = Utc::now();
        let response = Response::from_new(self.next_id(now), input, now);
        let row = ResponseRow::from_response(&response);
        let bytes =
            serde_json::to_vec(&row).map_err(|e| persistence("Failed to encode response", e))?;
        let key = format!("{}{}", response_prefix(response.experiment_id()), response.id());
        self.kv
            .set(&key, bytes)
            .await
            .map_err(|e| persistence("Failed to write response", e))?;

        Ok(response)
    }

    async fn get_experiment(&self, id: &str) -> Result<Option<Experiment>> {
        let Some(bytes) = self
            .kv
            .get(&experiment_key(id))
            .await
            .map_err(|e| persistence("Failed to read experiment", e))?
        else {
            return Ok(None);
        };
        let row: ExperimentRow = serde_json::from_slice(&bytes)
            .map_err(|e| persistence("Corrupt experiment row", e))?;

        let mut experiment = row.into_experiment();
        let responses = self
            .experiment_responses(experiment.id(), Some(experiment.prompt()))
            .await?;
        experiment.set_responses(responses);
        Ok(Some(experiment))
    }

    async fn get_all_experiments(&self) -> Result<Vec<Experiment>> {
        let rows = self
            .kv
            .scan_prefix(EXPERIMENT_PREFIX)
            .await
            .map_err(|e| persistence("Failed to list experiments", e))?;

        let mut experiments = rows
            .iter()
            .map(|(_, bytes)| {
                serde_json::from_slice::<ExperimentRow>(bytes)
                    .map(ExperimentRow::into_experiment)
                    .map_err(|e| persistence("Corrupt experiment row", e))
            })
            .collect::<Result<Vec<_>>>()?;

        experiments.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        Ok(experiments)
    }

    async fn experiment_responses(
        &self,
        experiment_id: &str,
        prompt: Option<&str>,
    ) -> Result<Vec<Response>> {
        let rows = self
            .kv
            .scan_prefix(&response_prefix(experiment_id))
            .await
            .map_err(|e| persistence("Failed to list responses", e))?;

        let mut responses = rows
            .iter()
            .map(|(_, bytes)| {
                serde_json::from_slice::<ResponseRow>(bytes)
                    .map(ResponseRow::into_response)
                    .map_err(|e| persistence("Corrupt response row", e))
            })
            .collect::<Result<Vec<_>>>()?;

        responses.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });

        if prompt.is_some() {
            responses = derive_details(responses).await?;
        }
        Ok(responses)
    }
}

/// Run [`fill_details`] on the blocking pool so the rayon fan-out never
/// stalls an async worker.
async fn derive_details(mut responses: Vec<Response>) -> Result<Vec<Response>> {
    tokio::task::spawn_blocking(move || {
        fill_details(&mut responses);
        responses
    })
    .await
    .map_err(|e| persistence("Failed to derive response details", e))
}
