//! Folding chunk/document results into one.

use super::AsyncReasoningApi;
use crate::api::build_knowledge_graph;
use crate::result::{AnalysisResult, MergedResult};
use crate::types::{Concept, ReasoningChain, Relationship};
use futures::{pin_mut, Stream, StreamExt};
use std::collections::HashSet;
use tracing::warn;

/// Incremental merge state.
///
/// Concepts are unique by exact `(text, type)` and relationships by exact
/// `(source text, target text, type)`; the first occurrence wins and later
/// duplicates are dropped whole. Chains are kept as they come. Error-shaped
/// records are skipped and not counted.
#[derive(Debug, Default)]
pub struct ResultMerger {
    concepts: Vec<Concept>,
    relationships: Vec<Relationship>,
    reasoning_chains: Vec<ReasoningChain>,
    seen_concepts: HashSet<(String, String)>,
    seen_relationships: HashSet<(String, String, String)>,
    chunk_count: usize,
}

impl ResultMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: AnalysisResult) {
        if result.is_error() {
            return;
        }
        self.chunk_count += 1;

        for concept in result.concepts {
            if self
                .seen_concepts
                .insert((concept.text.clone(), concept.concept_type.clone()))
            {
                self.concepts.push(concept.clamped());
            }
        }

        for rel in result.relationships {
            let key = (
                rel.source.text.clone(),
                rel.target.text.clone(),
                rel.relation_type.clone(),
            );
            if self.seen_relationships.insert(key) {
                self.relationships.push(rel.clamped());
            }
        }

        self.reasoning_chains
            .extend(result.reasoning_chains.into_iter().map(ReasoningChain::clamped));
    }

    /// Finish, rebuilding a graph from the merged concepts when there are any.
    pub fn finish(self) -> MergedResult {
        let mut merged = MergedResult {
            concepts: self.concepts,
            relationships: self.relationships,
            reasoning_chains: self.reasoning_chains,
            chunk_count: self.chunk_count,
            ..Default::default()
        };

        if !merged.concepts.is_empty() {
            match build_knowledge_graph(&merged.concepts, &merged.relationships) {
                Ok(graph) => merged.knowledge_graph = Some(graph),
                Err(e) => {
                    warn!(error = %e, "merged knowledge graph assembly failed");
                    merged.graph_error = Some(e.to_string());
                }
            }
        }
        merged
    }
}

/// Merge already collected results.
pub fn merge_results<I>(results: I) -> MergedResult
where
    I: IntoIterator,
    I::Item: Into<AnalysisResult>,
{
    let mut merger = ResultMerger::new();
    for result in results {
        merger.add(result.into());
    }
    merger.finish()
}

impl AsyncReasoningApi {
    /// Merge a stream of chunk records (or plain results) as they arrive.
    pub async fn merge_stream_results<S, R>(&self, results: S) -> MergedResult
    where
        S: Stream<Item = R>,
        R: Into<AnalysisResult>,
    {
        pin_mut!(results);
        let mut merger = ResultMerger::new();
        while let Some(result) = results.next().await {
            merger.add(result.into());
        }
        merger.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ReasoningApi;
    use crate::config::StreamOptions;
    use crate::result::StreamChunk;
    use futures::stream;

    fn flu(position: usize) -> Concept {
        Concept::new("flu", "disease", 0.9, "", position)
    }

    fn chunk(chunk_num: usize, concepts: Vec<Concept>) -> StreamChunk {
        StreamChunk {
            chunk_num,
            is_final: false,
            result: AnalysisResult {
                concepts,
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_duplicate_concept_kept_once() {
        let api = AsyncReasoningApi::new(ReasoningApi::new(None));
        let records = stream::iter(vec![chunk(1, vec![flu(3)]), chunk(2, vec![flu(40)])]);

        let merged = api.merge_stream_results(records).await;
        assert_eq!(merged.chunk_count, 2);
        assert_eq!(merged.concepts.len(), 1);
        assert_eq!(merged.concepts[0].position, 3);
        assert_eq!(merged.knowledge_graph.unwrap().node_count(), 1);
    }

    #[test]
    fn test_error_records_skipped() {
        let merged = merge_results(vec![
            AnalysisResult::failed("boom"),
            AnalysisResult {
                concepts: vec![flu(0)],
                ..Default::default()
            },
        ]);
        assert_eq!(merged.chunk_count, 1);
        assert_eq!(merged.concepts.len(), 1);
    }

    #[test]
    fn test_merged_confidence_is_clamped() {
        let loud: AnalysisResult = serde_json::from_str(
            r#"{"concepts":[{"text":"flu","type":"disease","confidence":7.0}],
                "relationships":[],"reasoning_chains":[]}"#,
        )
        .unwrap();
        let literal = AnalysisResult {
            concepts: vec![Concept {
                confidence: 3.0,
                ..Concept::new("fever", "symptom", 0.9, "", 0)
            }],
            ..Default::default()
        };

        let merged = merge_results(vec![loud, literal]);
        assert_eq!(merged.concepts.len(), 2);
        assert!(merged.concepts.iter().all(|c| c.confidence == 1.0));
    }

    #[test]
    fn test_concept_identity_is_case_sensitive() {
        let merged = merge_results(vec![AnalysisResult {
            concepts: vec![flu(0), Concept::new("Flu", "disease", 0.9, "", 9), Concept::new("flu", "symptom", 0.9, "", 5)],
            ..Default::default()
        }]);
        assert_eq!(merged.concepts.len(), 3);
    }

    #[test]
    fn test_relationships_dedup_and_chains_concatenate() {
        let fever = Concept::new("fever", "symptom", 0.9, "", 0);
        let rel = Relationship::new(fever.clone(), flu(10), "indicates", 0.8, "");
        let chain = ReasoningChain::new(
            "generic",
            vec![
                crate::types::ReasoningStep::new(fever.clone(), "observe", "Starting point"),
                crate::types::ReasoningStep::new(flu(10), "conclude", "Based on fever, consider flu"),
            ],
            0.7,
            "unknown",
        )
        .unwrap();
        let one = AnalysisResult {
            concepts: vec![fever, flu(10)],
            relationships: vec![rel.clone()],
            reasoning_chains: vec![chain.clone()],
            ..Default::default()
        };

        let merged = merge_results(vec![one.clone(), one]);
        assert_eq!(merged.relationships.len(), 1);
        assert_eq!(merged.reasoning_chains.len(), 2);
        assert_eq!(merged.knowledge_graph.unwrap().edge_count(), 1);
    }

    #[test]
    fn test_nothing_to_merge_has_no_graph() {
        let merged = merge_results(Vec::<AnalysisResult>::new());
        assert_eq!(merged.chunk_count, 0);
        assert!(merged.knowledge_graph.is_none());
        assert!(merged.graph_error.is_none());
    }

    #[tokio::test]
    async fn test_merge_live_stream() {
        let api = AsyncReasoningApi::new(ReasoningApi::new(None));
        let source = stream::iter(vec![
            "Alice met Bob. ".to_string(),
            "Later Bob met Carol. ".to_string(),
            "Alice called Carol.".to_string(),
        ]);
        let records = api.process_stream(source, StreamOptions::new(20, 4)).unwrap();

        let merged = api.merge_stream_results(records).await;
        assert!(merged.chunk_count >= 2);
        let names: HashSet<&str> = merged.concepts.iter().map(|c| c.text.as_str()).collect();
        assert!(names.contains("Alice"));
        assert!(names.contains("Carol"));
        assert_eq!(merged.concepts.iter().filter(|c| c.text == "Bob").count(), 1);
    }
}
