//! Optional language-model enhancement of extraction results.
//!
//! An [`EnhancementService`] proposes extra concepts and relationships on top
//! of what the pattern-based extractors found. It is best-effort: the
//! pipeline never depends on it for correctness, and every failure is logged
//! and dropped.

pub mod response;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaEnhancer};

use crate::types::{Concept, Relationship};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum EnhancementError {
    #[error("enhancement service unavailable: {0}")]
    Unavailable(String),
    #[error("enhancement request failed: {0}")]
    Request(String),
    #[error("invalid enhancement response: {0}")]
    InvalidResponse(String),
}

pub type EnhancementResult<T> = std::result::Result<T, EnhancementError>;

pub trait EnhancementService: Send + Sync {
    fn is_available(&self) -> bool;

    /// Propose concepts for `text`; `existing` are the pattern-based ones.
    fn extract_concepts(
        &self,
        text: &str,
        domain_name: &str,
        existing: &[Concept],
    ) -> EnhancementResult<Vec<Concept>>;

    /// Propose relationships between `concepts`; `existing` are the rule-based ones.
    fn infer_relationships(
        &self,
        concepts: &[Concept],
        text: &str,
        domain_name: &str,
        existing: &[Relationship],
    ) -> EnhancementResult<Vec<Relationship>>;
}

pub type EnhancerRef = Arc<dyn EnhancementService>;

/// Merge proposed concepts into pattern-based ones.
///
/// A proposal is a duplicate of an existing concept when the types match and
/// the lowercased texts are equal or one contains the other. Duplicates only
/// raise the existing concept's confidence (the first-seen context is kept);
/// everything else is appended in proposal order. Inputs are left untouched.
pub fn merge_concepts(existing: &[Concept], proposed: &[Concept]) -> Vec<Concept> {
    let mut merged: Vec<Concept> = existing.to_vec();

    for candidate in proposed {
        let candidate_text = candidate.text.to_lowercase();
        if candidate_text.trim().is_empty() {
            continue;
        }

        let duplicate = merged.iter().position(|c| {
            if c.concept_type != candidate.concept_type {
                return false;
            }
            let text = c.text.to_lowercase();
            text == candidate_text
                || text.contains(&candidate_text)
                || candidate_text.contains(&text)
        });

        match duplicate {
            Some(idx) => {
                if candidate.confidence > merged[idx].confidence {
                    merged[idx] = merged[idx].with_confidence(candidate.confidence);
                }
            }
            None => merged.push(candidate.clone()),
        }
    }

    merged
}

/// Append proposed relationships whose `(source, target, type)` identity is new.
pub fn merge_relationships(existing: &[Relationship], proposed: &[Relationship]) -> Vec<Relationship> {
    let mut seen: HashSet<(String, String, String)> =
        existing.iter().map(Relationship::dedup_key).collect();
    let mut merged = existing.to_vec();

    for rel in proposed {
        if seen.insert(rel.dedup_key()) {
            merged.push(rel.clone());
        }
    }

    merged
}
