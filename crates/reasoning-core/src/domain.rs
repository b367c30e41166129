//! Domain plugin capability.
//!
//! A domain is a pluggable rule-set (medical, business, meeting, user-defined)
//! that the extractor, mapper and chain builder consult before falling back to
//! their generic heuristics. The core only ever talks to `dyn Domain`; an
//! absent plugin is simply `None`.

use crate::types::{Concept, ReasoningChain, Relationship};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Concept type → terms of that type.
pub type Terminology = BTreeMap<String, Vec<String>>;

/// Concept type → concept texts found for it, input to question generation.
pub type ContentByType = BTreeMap<String, Vec<String>>;

/// Shared handle to a domain plugin.
pub type DomainRef = Arc<dyn Domain>;

/// Failure inside a domain plugin. The core treats every variant as "domain
/// unavailable for this call" and falls back.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DomainError {
    #[error("domain `{domain}` does not support {operation}")]
    Unsupported {
        domain: String,
        operation: &'static str,
    },
    #[error("domain `{domain}` failed: {message}")]
    Failed { domain: String, message: String },
}

impl DomainError {
    pub fn failed(domain: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Failed {
            domain: domain.into(),
            message: message.into(),
        }
    }
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;

pub trait Domain: Send + Sync {
    fn name(&self) -> &str;

    fn extract_concepts(&self, text: &str) -> DomainResult<Vec<Concept>>;

    fn identify_relationships(
        &self,
        concepts: &[Concept],
        text: &str,
    ) -> DomainResult<Vec<Relationship>>;

    fn build_reasoning_chains(
        &self,
        concepts: &[Concept],
        relationships: &[Relationship],
    ) -> DomainResult<Vec<ReasoningChain>>;

    fn generate_questions(&self, content: &ContentByType) -> DomainResult<Vec<String>>;

    fn terminology_mapping(&self) -> DomainResult<Terminology>;

    fn reasoning_patterns(&self) -> DomainResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Summary of the active domain, as reported by [`crate::ReasoningApi::domain_info`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DomainInfo {
    pub name: String,
    pub patterns: Vec<String>,
    pub terminology: Terminology,
}

impl DomainInfo {
    pub fn generic() -> Self {
        Self {
            name: "generic".to_string(),
            patterns: Vec::new(),
            terminology: Terminology::new(),
        }
    }

    /// Query a domain; capabilities that fail are reported empty.
    pub fn of(domain: &dyn Domain) -> Self {
        Self {
            name: domain.name().to_string(),
            patterns: domain.reasoning_patterns().unwrap_or_default(),
            terminology: domain.terminology_mapping().unwrap_or_default(),
        }
    }
}
