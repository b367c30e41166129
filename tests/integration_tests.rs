//! Integration tests for the complete reasoning pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Custom JSON domain → ReasoningApi → knowledge graph
//! - Built-in domains through the sync and async APIs
//! - Streaming → merge, batch ordering, graph exports
//!
//! Run with: cargo test --test integration_tests

use approx::assert_relative_eq;
use futures::{stream, StreamExt};
use reasoning_core::{
    AsyncReasoningApi, ReasoningApi, ReasoningConfig, StepAction, StreamChunk, StreamOptions,
};
use reasoning_domains::{CustomDomain, DomainKind};
use std::io::Write;
use std::sync::Arc;

const TRIAGE: &str = r#"{
    "name": "triage",
    "terminology": { "symptom": ["fever"], "disease": ["flu"] },
    "relations": [ { "source": "symptom", "target": "disease", "relation": "indicates" } ]
}"#;

const CLINICAL_NOTE: &str = "Patient presents with fever and cough. CXR shows pneumonia. \
                             Started antibiotics and oxygen therapy.";

fn triage_api() -> ReasoningApi {
    ReasoningApi::new(Some(Arc::new(CustomDomain::from_json_str(TRIAGE).unwrap())))
}

fn medical_api() -> ReasoningApi {
    ReasoningApi::new(DomainKind::Medical.resolve().unwrap())
}

// ============================================================================
// Single document
// ============================================================================

#[test]
fn test_custom_domain_end_to_end() {
    let result = triage_api()
        .process_text("Patient has fever and flu.", true)
        .unwrap();

    assert_eq!(result.concepts.len(), 2);
    assert_eq!(result.concepts[0].text, "fever");
    assert_eq!(result.concepts[0].concept_type, "symptom");
    assert_eq!(result.concepts[1].text, "flu");

    assert_eq!(result.relationships.len(), 1);
    let rel = &result.relationships[0];
    assert_eq!(rel.source.text, "fever");
    assert_eq!(rel.target.text, "flu");
    assert_eq!(rel.relation_type, "indicates");

    // the domain has no chain templates, so the generic builder answers
    assert_eq!(result.reasoning_chains.len(), 1);
    let chain = &result.reasoning_chains[0];
    assert_eq!(chain.steps.len(), 2);
    assert_eq!(chain.steps[0].action, StepAction::Observe);
    assert_eq!(chain.steps[1].action, StepAction::Conclude);
    assert_eq!(chain.steps[1].rationale, "Based on fever, consider flu");
    assert_relative_eq!(chain.confidence, 0.7);

    let graph = result.knowledge_graph.unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    let path = graph.find_path("symptom_12_1", "disease_22_1", 5).unwrap();
    assert_eq!(path.len(), 2);

    assert_eq!(result.questions, Some(Vec::new()));
    assert!(result.questions_error.is_none());
}

#[test]
fn test_custom_domain_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TRIAGE.as_bytes()).unwrap();

    let domain = DomainKind::Custom(file.path().to_path_buf()).resolve().unwrap();
    let api = ReasoningApi::new(domain);
    assert_eq!(api.domain_info().name, "triage");
    assert_eq!(api.domain_info().terminology["disease"], vec!["flu"]);
}

#[test]
fn test_medical_note() {
    let result = medical_api().process_text(CLINICAL_NOTE, true).unwrap();

    let texts: Vec<&str> = result.concepts.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["fever", "cough", "CXR", "pneumonia", "antibiotics", "oxygen therapy"]
    );

    let chain_types: Vec<&str> = result.reasoning_chains.iter().map(|c| c.chain_type.as_str()).collect();
    assert_eq!(chain_types, vec!["diagnostic", "therapeutic"]);

    let questions = result.questions.unwrap();
    assert_eq!(questions.len(), 3);
    assert!(questions[0].contains("pneumonia"));

    let graph = result.knowledge_graph.unwrap();
    assert_eq!(graph.node_count(), 6);
    assert_eq!(graph.edge_count(), 15);
    assert!(graph.get_stats().node_types.contains("treatments"));
}

#[test]
fn test_domain_without_matches_falls_back_to_generic() {
    let result = medical_api()
        .process_text("Alice met Bob in Paris.", false)
        .unwrap();
    assert_eq!(result.concepts.len(), 3);
    assert!(result.concepts.iter().all(|c| c.concept_type == "unknown"));
    assert!(result.knowledge_graph.is_none());
}

#[test]
fn test_switching_domains() {
    let mut api = ReasoningApi::new(None);
    assert_eq!(api.domain_info().name, "generic");

    api.set_domain(reasoning_domains::builtin("business").unwrap());
    let result = api
        .process_text("Upselling lifted revenue despite integration risk.", true)
        .unwrap();
    assert_eq!(api.domain_info().name, "business");
    assert!(result.concepts.iter().any(|c| c.concept_type == "metrics"));
    assert_eq!(result.reasoning_chains[0].chain_type, "sales");
}

#[test]
fn test_graph_exports() {
    let graph = triage_api()
        .process_text("Patient has fever and flu.", true)
        .unwrap()
        .knowledge_graph
        .unwrap();

    assert!(graph.to_dot().contains("indicates"));
    assert!(graph.to_graphml().unwrap().contains("<graphml"));
    let cy = graph.to_cytoscape();
    assert_eq!(cy["edges"][0]["data"]["id"], "e0");

    let back = reasoning_core::KnowledgeGraph::from_dict(
        serde_json::from_str(&graph.to_json().unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(back.node_count(), 2);
    assert_eq!(back.edges()[0].edge_type, "indicates");
}

#[test]
fn test_blank_input_rejected() {
    let err = triage_api().process_text("  \n ", true).unwrap_err();
    assert!(err.is_validation());
}

// ============================================================================
// Async layer
// ============================================================================

#[tokio::test]
async fn test_stream_then_merge_with_domain() {
    let api = AsyncReasoningApi::new(medical_api());
    let lines: Vec<String> = CLINICAL_NOTE
        .split_inclusive(". ")
        .map(str::to_string)
        .collect();

    let records: Vec<StreamChunk> = api
        .process_stream(stream::iter(lines), StreamOptions::new(40, 10))
        .unwrap()
        .collect()
        .await;

    assert!(records.len() >= 2);
    let numbers: Vec<usize> = records.iter().map(|r| r.chunk_num).collect();
    assert_eq!(numbers, (1..=records.len()).collect::<Vec<_>>());
    assert!(records.last().unwrap().is_final);
    assert_eq!(records.iter().filter(|r| r.is_final).count(), 1);

    let merged = api.merge_stream_results(stream::iter(records)).await;
    assert!(merged.concepts.iter().any(|c| c.text == "pneumonia"));
    // overlap re-reads text but merged concepts stay unique by (text, type)
    let fevers = merged.concepts.iter().filter(|c| c.text == "fever").count();
    assert_eq!(fevers, 1);
    assert!(merged.knowledge_graph.is_some());
}

#[tokio::test]
async fn test_batch_across_domain_texts() {
    let config = ReasoningConfig {
        max_workers: 2,
        ..Default::default()
    };
    let api = AsyncReasoningApi::new(
        ReasoningApi::with_config(DomainKind::Meeting.resolve().unwrap(), config).unwrap(),
    );
    assert_eq!(api.max_workers(), 2);

    let texts = vec![
        "The team agreed on the budget topic.".to_string(),
        String::new(),
        "Action: the organizer sends the summary before the deadline.".to_string(),
    ];
    let results = api.process_batch(texts, true).await;

    assert_eq!(results.len(), 3);
    assert!(!results[0].is_error());
    assert!(results[1].is_error());
    assert!(results[2].concepts.iter().any(|c| c.concept_type == "dates"));

    let merged = reasoning_core::merge_results(results);
    assert_eq!(merged.chunk_count, 2);
}

#[tokio::test]
async fn test_async_matches_sync() {
    let sync = triage_api();
    let expected = sync.process_text("Patient has fever and flu.", true).unwrap();

    let api = AsyncReasoningApi::new(sync);
    let actual = api
        .process_text_async("Patient has fever and flu.", true)
        .await
        .unwrap();
    assert_eq!(actual, expected);
}
