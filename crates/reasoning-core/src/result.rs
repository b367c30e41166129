//! Result records produced by the pipeline, the stream and the merge step.

use crate::graph::KnowledgeGraph;
use crate::types::{Concept, ReasoningChain, Relationship};
use serde::{Deserialize, Serialize};

/// Outcome of analysing one text (or one stream chunk).
///
/// Serializes to `{concepts, relationships, reasoning_chains, knowledge_graph?,
/// graph_error?, questions?, questions_error?, error?}`; absent optional keys
/// are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub reasoning_chains: Vec<ReasoningChain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions_error: Option<String>,
    /// Set only on error-shaped records (failed stream chunk or batch item)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Error-shaped record: empty collections plus the failure message.
    pub fn failed(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// One record of a streaming run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// 1-based, strictly increasing within a stream
    pub chunk_num: usize,
    /// Only the last record of a stream may carry `true`
    pub is_final: bool,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

impl From<StreamChunk> for AnalysisResult {
    fn from(chunk: StreamChunk) -> Self {
        chunk.result
    }
}

/// Accumulation of several chunk/document results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    pub concepts: Vec<Concept>,
    pub relationships: Vec<Relationship>,
    pub reasoning_chains: Vec<ReasoningChain>,
    /// Non-error records consumed
    pub chunk_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_error: Option<String>,
}
