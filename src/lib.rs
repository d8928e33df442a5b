//! # sampling-lab: LLM Sampling-Parameter Experiments
//!
//! Runs one prompt across a grid of `(temperature, top_p)` settings,
//! scores every generated response with deterministic text heuristics, and
//! persists the experiment for later comparison and export.
//!
//! ## Design Principles
//!
//! - **Fault isolation**: one failed generation never aborts its siblings
//! - **Pure scoring**: metrics are a function of `(text, prompt)` only
//! - **Append-only records**: responses are written once, never mutated
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sampling_lab::config::LabConfig;
//! use sampling_lab::experiment::KvExperimentStore;
//! use sampling_lab::generation::OpenAiClient;
//! use sampling_lab::orchestrator::Orchestrator;
//!
//! # async fn run() -> sampling_lab::Result<()> {
//! let config = LabConfig::load()?;
//! let client = OpenAiClient::from_config(&config)?;
//! let orchestrator = Orchestrator::new(client, KvExperimentStore::in_memory(), config);
//!
//! let result = orchestrator
//!     .run_experiment("Explain quantum computing in simple terms", &[0.1, 0.9], &[0.5, 1.0])
//!     .await?;
//! println!("{} responses, average {}", result.metadata().total_generated, result.metadata().average_score);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod experiment;
pub mod export;
pub mod generation;
pub mod grid;
pub mod kv;
pub mod orchestrator;
pub mod scoring;
pub mod telemetry;
pub mod text;

pub use error::{Error, Result};
