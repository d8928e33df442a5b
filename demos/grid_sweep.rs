//! Grid Sweep: one prompt across a temperature/top-p grid
//!
//! Uses the OpenAI-compatible client when an API key is configured
//! (`OPENAI_API_KEY` or `SAMPLING_LAB_API_KEY`), otherwise a canned offline
//! generator whose output degrades as temperature rises.
//!
//! Run with: cargo run --example grid_sweep -- "<prompt>" "0.2,0.7,1.2" "0.5,1.0"

use std::time::Duration;

use sampling_lab::config::LabConfig;
use sampling_lab::experiment::{ExperimentStore, KvExperimentStore};
use sampling_lab::export;
use sampling_lab::generation::{GenerationError, GenerationParams, Generator, OpenAiClient};
use sampling_lab::grid::{parse_values, TEMPERATURE_RANGE, TOP_P_RANGE};
use sampling_lab::orchestrator::Orchestrator;
use sampling_lab::scoring::MetricAverages;
use sampling_lab::telemetry;

const DEFAULT_PROMPT: &str = "Explain quantum computing in simple terms";

/// Offline stand-in for a model: tidy at low temperature, rambling at high.
struct CannedGenerator;

impl Generator for CannedGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, GenerationError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let text = if params.temperature < 0.5 {
            "# Quantum computing\n\n\
             Quantum computing uses qubits. A qubit can hold a superposition of states.\n\n\
             Therefore, quantum computing explores many answers at once. In simple terms, \
             interference makes right answers likely."
        } else if params.temperature < 1.0 {
            "Quantum computing uses qubits instead of bits. However, qubits are fragile. \
             Simple terms hide a lot of physics."
        } else {
            "qubits maybe cats boxes spinning everything at once or not who knows really"
        };
        Ok(text.to_string())
    }
}

async fn sweep<G: Generator + 'static>(
    generator: G,
    config: LabConfig,
    prompt: &str,
    temperatures: &[f64],
    top_ps: &[f64],
) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(generator, KvExperimentStore::in_memory(), config);
    let result = orchestrator.run_experiment(prompt, temperatures, top_ps).await?;

    println!("=== Experiment {} ===", result.experiment_id());
    println!(
        "  Generated: {} | Failed: {} | Average score: {} | Time: {} ms\n",
        result.metadata().total_generated,
        result.failures().len(),
        result.metadata().average_score,
        result.metadata().total_time_ms
    );

    let mut responses = result.responses().to_vec();
    responses.sort_by(|a, b| {
        a.temperature()
            .total_cmp(&b.temperature())
            .then(a.top_p().total_cmp(&b.top_p()))
    });

    println!(
        "  {:>5} {:>5} {:>9} {:>12} {:>10} {:>7}",
        "temp", "top_p", "coherence", "completeness", "structural", "overall"
    );
    for r in &responses {
        let m = r.metrics();
        println!(
            "  {:>5} {:>5} {:>9} {:>12} {:>10} {:>7}",
            r.temperature(),
            r.top_p(),
            m.coherence(),
            m.completeness(),
            m.structural(),
            m.overall()
        );
    }

    let averages = MetricAverages::from_metrics(responses.iter().map(|r| r.metrics()));
    println!("\n  Averages: {averages:?}");

    for failure in result.failures() {
        println!("  Failed {}: {}", failure.combination, failure.reason);
    }

    let experiment = orchestrator
        .store()
        .require_experiment(result.experiment_id())
        .await?;
    println!("\n=== {} ===", export::file_name(experiment.id(), export::ExportFormat::Csv));
    print!("{}", export::to_csv(&experiment)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing("sampling_lab=info");

    let mut args = std::env::args().skip(1);
    let prompt = args.next().unwrap_or_else(|| DEFAULT_PROMPT.to_string());
    let temperatures = parse_values(
        &args.next().unwrap_or_else(|| "0.2,0.7,1.2".into()),
        TEMPERATURE_RANGE,
    );
    let top_ps = parse_values(&args.next().unwrap_or_else(|| "0.5,1.0".into()), TOP_P_RANGE);

    let config = LabConfig::load()?;
    if config.api_key.is_some() {
        let client = OpenAiClient::from_config(&config)?;
        sweep(client, config, &prompt, &temperatures, &top_ps).await
    } else {
        println!("No API key configured, using the canned offline generator\n");
        sweep(CannedGenerator, config, &prompt, &temperatures, &top_ps).await
    }
}
