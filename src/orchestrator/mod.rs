//! Generation Orchestrator - concurrent generate, score and persist
//!
//! One task per grid cell, all dispatched at once on a [`JoinSet`]. A task
//! failure (generation error, scorer panic, write error, deadline) is
//! captured as a [`TaskFailure`] and never aborts sibling tasks or the run.
//! Only request validation and experiment creation can fail the call.
//!
//! # Example
//!
//! ```rust
//! use sampling_lab::config::LabConfig;
//! use sampling_lab::experiment::KvExperimentStore;
//! use sampling_lab::generation::{GenerationError, GenerationParams, Generator};
//! use sampling_lab::orchestrator::Orchestrator;
//!
//! struct Canned;
//!
//! impl Generator for Canned {
//!     async fn generate(&self, _: &str, _: &GenerationParams) -> Result<String, GenerationError> {
//!         Ok("Qubits hold superpositions. Gates rotate them.".to_string())
//!     }
//! }
//!
//! # async fn example() -> sampling_lab::Result<()> {
//! let orchestrator = Orchestrator::new(Canned, KvExperimentStore::in_memory(), LabConfig::default());
//! let result = orchestrator
//!     .run_experiment("Explain quantum computing in simple terms", &[0.1, 0.9], &[0.5])
//!     .await?;
//! assert_eq!(result.metadata().total_generated, 2);
//! # Ok(())
//! # }
//! ```

mod outcome;
mod validation;

pub use outcome::{AggregateMetadata, AggregateResult, FailureReason, Phase, TaskFailure};
pub use validation::validate_request;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use tokio::task::JoinSet;
use tokio::time::Instant as Deadline;
use tracing::{debug, error, info, warn};

use crate::config::LabConfig;
use crate::experiment::{ExperimentStore, NewResponse, Response, TaskRecord};
use crate::generation::{estimate_tokens, GenerationParams, Generator};
use crate::grid::{self, ParameterCombination};
use crate::scoring;
use crate::Result;

/// Drives one experiment run over shared generation and storage collaborators.
pub struct Orchestrator<G, S> {
    generator: Arc<G>,
    store: Arc<S>,
    config: LabConfig,
}

impl<G, S> Orchestrator<G, S>
where
    G: Generator + 'static,
    S: ExperimentStore + 'static,
{
    /// Create an orchestrator owning its collaborators.
    #[must_use]
    pub fn new(generator: G, store: S, config: LabConfig) -> Self {
        Self::from_shared(Arc::new(generator), Arc::new(store), config)
    }

    /// Create an orchestrator over already shared collaborators.
    #[must_use]
    pub const fn from_shared(generator: Arc<G>, store: Arc<S>, config: LabConfig) -> Self {
        Self {
            generator,
            store,
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &LabConfig {
        &self.config
    }

    /// Storage collaborator.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run one experiment within the configured deadline.
    ///
    /// # Errors
    ///
    /// `Error::Validation` for a rejected request and `Error::Persistence`
    /// when the experiment record cannot be created. Task failures are
    /// reported in the result, never as an error.
    pub async fn run_experiment(
        &self,
        prompt: &str,
        temperatures: &[f64],
        top_ps: &[f64],
    ) -> Result<AggregateResult> {
        let deadline = self.config.deadline().map(|budget| Deadline::now() + budget);
        self.run_experiment_until(prompt, temperatures, top_ps, deadline)
            .await
    }

    /// Run one experiment, aborting unsettled tasks at `deadline`.
    ///
    /// # Errors
    ///
    /// Same as [`run_experiment`](Self::run_experiment).
    pub async fn run_experiment_until(
        &self,
        prompt: &str,
        temperatures: &[f64],
        top_ps: &[f64],
        deadline: Option<Deadline>,
    ) -> Result<AggregateResult> {
        let started = Instant::now();
        let mut phase = Phase::Validating;
        debug!(%phase, "Experiment phase");

        if let Err(e) = validate_request(
            prompt,
            temperatures,
            top_ps,
            self.config.min_prompt_chars,
        ) {
            advance(&mut phase, Phase::Rejected);
            return Err(e);
        }

        advance(&mut phase, Phase::CreatingExperiment);
        let experiment = match self.store.create_experiment(prompt).await {
            Ok(experiment) => experiment,
            Err(e) => {
                advance(&mut phase, Phase::Rejected);
                return Err(e);
            }
        };

        let combinations = grid::expand(temperatures, top_ps);
        info!(
            experiment_id = experiment.id(),
            tasks = combinations.len(),
            model = %self.config.model,
            "Starting experiment"
        );

        advance(&mut phase, Phase::Dispatching);
        let prompt: Arc<str> = Arc::from(prompt);
        let experiment_id: Arc<str> = Arc::from(experiment.id());
        let model: Arc<str> = Arc::from(self.config.model.as_str());

        let mut tasks: Vec<TaskRecord> = combinations
            .iter()
            .enumerate()
            .map(|(index, &combination)| TaskRecord::new(index, combination))
            .collect();
        let mut set = JoinSet::new();
        let mut index_of = FxHashMap::default();

        for (index, &combination) in combinations.iter().enumerate() {
            let ctx = TaskContext {
                generator: Arc::clone(&self.generator),
                store: Arc::clone(&self.store),
                prompt: Arc::clone(&prompt),
                experiment_id: Arc::clone(&experiment_id),
                model: Arc::clone(&model),
            };
            tasks[index].start();
            let handle = set.spawn(async move { (index, ctx.run(combination).await) });
            index_of.insert(handle.id(), index);
        }

        advance(&mut phase, Phase::AwaitingAll);
        let mut responses = Vec::with_capacity(combinations.len());
        let mut failures = Vec::new();
        let mut expired = false;

        loop {
            let joined = match deadline {
                Some(at) if !expired => {
                    let next = tokio::time::timeout_at(at, set.join_next_with_id()).await;
                    if let Ok(next) = next {
                        next
                    } else {
                        warn!(
                            experiment_id = &*experiment_id,
                            pending = set.len(),
                            "Experiment deadline expired, aborting unsettled tasks"
                        );
                        expired = true;
                        set.abort_all();
                        continue;
                    }
                }
                _ => set.join_next_with_id().await,
            };
            let Some(joined) = joined else { break };

            let (index, outcome) = match joined {
                Ok((_, (index, outcome))) => (index, outcome),
                Err(join_error) => {
                    let Some(&index) = index_of.get(&join_error.id()) else {
                        continue;
                    };
                    let reason = match join_error.try_into_panic() {
                        Ok(payload) => FailureReason::Panicked(panic_message(&*payload)),
                        Err(_) => FailureReason::DeadlineExceeded,
                    };
                    (index, Err(reason))
                }
            };

            let combination = combinations[index];
            match outcome {
                Ok(response) => {
                    debug!(
                        index,
                        %combination,
                        overall = response.metrics().overall(),
                        "Task succeeded"
                    );
                    tasks[index].complete(true);
                    responses.push(response);
                }
                Err(reason) => {
                    warn!(
                        index,
                        %combination,
                        label = reason.label(),
                        error = %reason,
                        "Task failed"
                    );
                    tasks[index].complete(false);
                    failures.push(TaskFailure {
                        index,
                        combination,
                        reason,
                    });
                }
            }
        }
        failures.sort_by_key(|f| f.index);

        if responses.is_empty() {
            error!(
                experiment_id = &*experiment_id,
                failed = failures.len(),
                "Every generation task failed"
            );
        }

        let total_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = AggregateResult::new(
            experiment_id.to_string(),
            responses,
            total_time_ms,
            failures,
            tasks,
        );
        advance(&mut phase, Phase::Aggregated);

        info!(
            experiment_id = result.experiment_id(),
            generated = result.metadata().total_generated,
            failed = result.failures().len(),
            average_score = result.metadata().average_score,
            total_time_ms,
            "Experiment complete"
        );
        Ok(result)
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!(from = %phase, to = %next, "Experiment phase");
    *phase = next;
}

/// Everything one spawned task owns.
struct TaskContext<G, S> {
    generator: Arc<G>,
    store: Arc<S>,
    prompt: Arc<str>,
    experiment_id: Arc<str>,
    model: Arc<str>,
}

impl<G: Generator, S: ExperimentStore> TaskContext<G, S> {
    async fn run(
        self,
        combination: ParameterCombination,
    ) -> std::result::Result<Response, FailureReason> {
        let params = GenerationParams::for_combination(combination, &*self.model);
        let started = Instant::now();

        let text = self
            .generator
            .generate(&self.prompt, &params)
            .await
            .map_err(FailureReason::Generation)?;

        let metrics = panic::catch_unwind(AssertUnwindSafe(|| scoring::score(&text, &self.prompt)))
            .map_err(|payload| FailureReason::Scoring(panic_message(&*payload)))?;
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let token_count = estimate_tokens(&text);

        let input = NewResponse::builder(&*self.experiment_id, combination, text, metrics)
            .model(&*self.model)
            .response_time_ms(response_time_ms)
            .token_count(token_count)
            .build();

        self.store
            .create_response(input)
            .await
            .map_err(|e| FailureReason::Persistence(e.to_string()))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
