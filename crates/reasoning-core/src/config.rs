//! Pipeline configuration.

use crate::error::{ReasoningError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the generic fallbacks and the concurrency layer.
///
/// Every field has a default, so a JSON file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Max byte distance between two concepts for the generic mapper to pair them
    pub proximity_threshold: usize,
    /// Depth bound of the generic chain search
    pub max_chain_depth: usize,
    /// Default depth bound for graph path queries
    pub max_path_depth: usize,
    /// Characters of context kept around generic concepts
    pub context_window: usize,
    /// Characters of evidence kept around generic relationships
    pub evidence_window: usize,
    pub generic_concept_confidence: f32,
    pub generic_relationship_confidence: f32,
    pub generic_chain_confidence: f32,
    /// Capitalized phrases the generic extractor ignores (compared lowercased)
    pub stop_words: Vec<String>,
    /// Merge in concepts/relationships proposed by an enhancement service
    pub use_llm: bool,
    /// Batch admission limit
    pub max_workers: usize,
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 100,
            max_chain_depth: 5,
            max_path_depth: 5,
            context_window: 50,
            evidence_window: 20,
            generic_concept_confidence: 0.5,
            generic_relationship_confidence: 0.6,
            generic_chain_confidence: 0.7,
            stop_words: ["the", "a", "an", "this", "that"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            use_llm: false,
            max_workers: 4,
            chunk_size: 1000,
            overlap: 100,
        }
    }
}

impl ReasoningConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ReasoningError::Config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ReasoningError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(ReasoningError::Config("max_workers must be at least 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(ReasoningError::Config("chunk_size must be positive".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(ReasoningError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        for (name, value) in [
            ("generic_concept_confidence", self.generic_concept_confidence),
            ("generic_relationship_confidence", self.generic_relationship_confidence),
            ("generic_chain_confidence", self.generic_chain_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReasoningError::Config(format!("{name} must be within [0, 1]")));
            }
        }
        Ok(())
    }

    /// Stream options seeded from this config.
    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            chunk_size: self.chunk_size,
            overlap: self.overlap,
            include_graph: true,
        }
    }
}

/// Parameters of one streaming run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    /// Characters to accumulate before a chunk is processed
    pub chunk_size: usize,
    /// Trailing characters of each chunk carried into the next
    pub overlap: usize,
    pub include_graph: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        ReasoningConfig::default().stream_options()
    }
}

impl StreamOptions {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            include_graph: true,
        }
    }

    pub fn without_graph(mut self) -> Self {
        self.include_graph = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ReasoningError::invalid_input("chunk_size must be positive"));
        }
        if self.overlap >= self.chunk_size {
            return Err(ReasoningError::invalid_input(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}
