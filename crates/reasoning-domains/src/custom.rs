//! User-defined domains loaded from JSON.
//!
//! ```json
//! {
//!   "name": "triage",
//!   "terminology": { "symptom": ["fever"], "disease": ["flu"] },
//!   "relations": [ { "source": "symptom", "target": "disease", "relation": "indicates" } ]
//! }
//! ```
//!
//! Everything besides `name` and `terminology` is optional. Without
//! `default_relation` only rule-covered pairs are linked, and without
//! `chains` the domain builds no chains of its own so the generic builder
//! takes over.

use crate::terminology::{DomainDefinition, TerminologyDomain};
use reasoning_core::{
    Concept, ContentByType, Domain, DomainResult, ReasoningChain, Relationship, Terminology,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CustomDomainError {
    #[error("failed to read domain file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed domain definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid domain definition: {0}")]
    Invalid(String),

    #[error("term `{term}` cannot be compiled: {source}")]
    Pattern {
        term: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown domain `{0}`")]
    Unknown(String),
}

/// A [`TerminologyDomain`] defined by the user rather than built in.
#[derive(Debug)]
pub struct CustomDomain {
    inner: TerminologyDomain,
    source: Option<PathBuf>,
}

impl CustomDomain {
    pub fn from_definition(definition: DomainDefinition) -> Result<Self, CustomDomainError> {
        Ok(Self {
            inner: TerminologyDomain::new(definition)?,
            source: None,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CustomDomainError> {
        let definition: DomainDefinition = serde_json::from_str(json)?;
        Self::from_definition(definition)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CustomDomainError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CustomDomainError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut domain = Self::from_json_str(&json)?;
        info!(domain = %domain.name(), path = %path.display(), "loaded custom domain");
        domain.source = Some(path.to_path_buf());
        Ok(domain)
    }

    pub fn definition(&self) -> &DomainDefinition {
        self.inner.definition()
    }

    /// File the definition was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl Domain for CustomDomain {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn extract_concepts(&self, text: &str) -> DomainResult<Vec<Concept>> {
        self.inner.extract_concepts(text)
    }

    fn identify_relationships(
        &self,
        concepts: &[Concept],
        text: &str,
    ) -> DomainResult<Vec<Relationship>> {
        self.inner.identify_relationships(concepts, text)
    }

    fn build_reasoning_chains(
        &self,
        concepts: &[Concept],
        relationships: &[Relationship],
    ) -> DomainResult<Vec<ReasoningChain>> {
        self.inner.build_reasoning_chains(concepts, relationships)
    }

    fn generate_questions(&self, content: &ContentByType) -> DomainResult<Vec<String>> {
        self.inner.generate_questions(content)
    }

    fn terminology_mapping(&self) -> DomainResult<Terminology> {
        self.inner.terminology_mapping()
    }

    fn reasoning_patterns(&self) -> DomainResult<Vec<String>> {
        self.inner.reasoning_patterns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TRIAGE: &str = r#"{
        "name": "triage",
        "terminology": { "symptom": ["fever"], "disease": ["flu"] },
        "relations": [ { "source": "symptom", "target": "disease", "relation": "indicates" } ]
    }"#;

    #[test]
    fn test_minimal_definition() {
        let domain = CustomDomain::from_json_str(TRIAGE).unwrap();
        assert_eq!(domain.name(), "triage");
        assert!(domain.source().is_none());
        assert!(domain.definition().default_relation.is_none());
        assert!(domain.reasoning_patterns().unwrap().is_empty());

        let text = "Patient has fever and flu.";
        let concepts = domain.extract_concepts(text).unwrap();
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].confidence, 0.8);

        let rels = domain.identify_relationships(&concepts, text).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relation_type, "indicates");
        assert_eq!(rels[0].confidence, 0.75);

        assert!(domain.build_reasoning_chains(&concepts, &rels).unwrap().is_empty());
    }

    #[test]
    fn test_full_definition() {
        let json = r#"{
            "name": "support",
            "description": "Support tickets",
            "terminology": { "problem": ["crash", "timeout"], "fix": ["restart"] },
            "relations": [ { "source": "fix", "target": "problem", "relation": "resolves" } ],
            "default_relation": "mentions",
            "chains": [ {
                "type": "troubleshooting",
                "confidence": 0.6,
                "steps": [
                    { "type": "problem", "action": "observe", "rationale": "Reported" },
                    { "type": "fix", "action": "apply" }
                ]
            } ],
            "questions": [ { "type": "problem", "templates": ["How often does {} happen?"] } ],
            "reasoning_patterns": ["problem_to_fix"],
            "confidence": { "concept": 0.9 }
        }"#;
        let domain = CustomDomain::from_json_str(json).unwrap();
        assert_eq!(domain.definition().description, "Support tickets");
        assert_eq!(domain.definition().confidence.relationship, 0.75);

        let text = "A crash then a timeout; restart fixed it.";
        let concepts = domain.extract_concepts(text).unwrap();
        let rels = domain.identify_relationships(&concepts, text).unwrap();
        let labels: Vec<&str> = rels.iter().map(|r| r.relation_type.as_str()).collect();
        assert_eq!(labels, vec!["mentions", "resolves", "resolves"]);
        assert_eq!(rels[1].source.text, "restart");

        let chains = domain.build_reasoning_chains(&concepts, &rels).unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].confidence, 0.6);
        assert_eq!(chains[0].steps[1].rationale, "");

        let mut content = ContentByType::new();
        content.insert("problem".into(), vec!["crash".into()]);
        assert_eq!(
            domain.generate_questions(&content).unwrap(),
            vec!["How often does crash happen?"]
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRIAGE.as_bytes()).unwrap();

        let domain = CustomDomain::from_json_file(file.path()).unwrap();
        assert_eq!(domain.name(), "triage");
        assert_eq!(domain.source(), Some(file.path()));
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            CustomDomain::from_json_file("/nonexistent/domain.json"),
            Err(CustomDomainError::Io { .. })
        ));
        assert!(matches!(
            CustomDomain::from_json_str("{ not json"),
            Err(CustomDomainError::Json(_))
        ));
        assert!(matches!(
            CustomDomain::from_json_str(r#"{"name": "x"}"#),
            Err(CustomDomainError::Json(_))
        ));
        assert!(matches!(
            CustomDomain::from_json_str(r#"{"name": "x", "terminology": {}}"#),
            Err(CustomDomainError::Invalid(_))
        ));
    }
}
