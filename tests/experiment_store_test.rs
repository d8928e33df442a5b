//! Experiment store tests over the in-memory KV backend

use std::collections::HashSet;
use std::sync::Arc;

use sampling_lab::experiment::{
    hydrate_details, ExperimentStore, KvExperimentStore, NewResponse,
};
use sampling_lab::grid::ParameterCombination;
use sampling_lab::kv::KvStore;
use sampling_lab::scoring::{self, MetricDetails};
use sampling_lab::Error;

const PROMPT: &str = "Explain quantum computing in simple terms";

fn input(experiment_id: &str, combination: ParameterCombination, text: &str) -> NewResponse {
    NewResponse::builder(experiment_id, combination, text, scoring::score(text, PROMPT))
        .model("gpt-4o-mini")
        .response_time_ms(850)
        .token_count(text.chars().count().div_ceil(4))
        .build()
}

#[tokio::test]
async fn test_keys_follow_layout() {
    let store = KvExperimentStore::in_memory();
    let experiment = store.create_experiment(PROMPT).await.unwrap();
    let response = store
        .create_response(input(experiment.id(), ParameterCombination::new(0.7, 1.0), "Hello world."))
        .await
        .unwrap();

    let kv = store.kv();
    assert!(kv.exists(&format!("experiment/{}", experiment.id())).await.unwrap());
    assert!(kv
        .exists(&format!("response/{}/{}", experiment.id(), response.id()))
        .await
        .unwrap());
    assert_eq!(kv.len(), 2);
}

#[tokio::test]
async fn test_round_trip_preserves_fields() {
    let store = KvExperimentStore::in_memory();
    let experiment = store.create_experiment(PROMPT).await.unwrap();
    let text = "Quantum computing uses qubits.\n\nThey \"interfere\", which is useful.";
    let created = store
        .create_response(input(experiment.id(), ParameterCombination::new(1.2, 0.4), text))
        .await
        .unwrap();

    let loaded = store.get_experiment(experiment.id()).await.unwrap().unwrap();
    assert_eq!(loaded.responses(), &[created.clone()]);

    let response = &loaded.responses()[0];
    assert_eq!(response.temperature(), 1.2);
    assert_eq!(response.top_p(), 0.4);
    assert_eq!(response.response_text(), text);
    assert_eq!(response.response_time_ms(), 850);
    assert_eq!(response.metrics().details().paragraph_count, 2);
}

#[tokio::test]
async fn test_concurrent_response_writes_interleave_safely() {
    let store = Arc::new(KvExperimentStore::in_memory());
    let experiment = store.create_experiment(PROMPT).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20_u32 {
        let store = Arc::clone(&store);
        let id = experiment.id().to_string();
        handles.push(tokio::spawn(async move {
            let combination = ParameterCombination::new(f64::from(i) / 10.0, 1.0);
            store
                .create_response(input(&id, combination, "Concurrent write."))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let responses = store.experiment_responses(experiment.id(), None).await.unwrap();
    assert_eq!(responses.len(), 20);

    let ids: HashSet<&str> = responses.iter().map(|r| r.id()).collect();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn test_listing_omits_responses() {
    let store = KvExperimentStore::in_memory();
    let experiment = store.create_experiment(PROMPT).await.unwrap();
    store
        .create_response(input(experiment.id(), ParameterCombination::new(0.5, 0.5), "Text."))
        .await
        .unwrap();

    let all = store.get_all_experiments().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].responses().is_empty());
}

#[tokio::test]
async fn test_require_experiment() {
    let store = KvExperimentStore::in_memory();
    let experiment = store.create_experiment(PROMPT).await.unwrap();

    assert_eq!(store.require_experiment(experiment.id()).await.unwrap().id(), experiment.id());
    assert!(matches!(
        store.require_experiment("missing").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_shared_store_delegates() {
    let store = Arc::new(KvExperimentStore::in_memory());
    let experiment = ExperimentStore::create_experiment(&store, PROMPT).await.unwrap();
    assert_eq!(ExperimentStore::experiment_count(&store).await.unwrap(), 1);
    assert!(ExperimentStore::get_experiment(&store, experiment.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_hydrate_details_matches_fresh_scoring() {
    let store = KvExperimentStore::in_memory();
    let experiment = store.create_experiment(PROMPT).await.unwrap();
    let text = "First point. Second point!\n\nThird point?";
    store
        .create_response(input(experiment.id(), ParameterCombination::new(0.3, 0.3), text))
        .await
        .unwrap();

    let responses = store.experiment_responses(experiment.id(), None).await.unwrap();
    assert_eq!(responses[0].metrics().details(), &MetricDetails::default());

    let mut loaded = store.get_experiment(experiment.id()).await.unwrap().unwrap();
    loaded.set_responses(responses);
    hydrate_details(&mut loaded);
    assert_eq!(loaded.responses()[0].metrics().details(), &MetricDetails::from_text(text));
}
