//! Relationship mapping between extracted concepts.

use crate::config::ReasoningConfig;
use crate::domain::DomainRef;
use crate::enhance::{merge_relationships, EnhancerRef};
use crate::text;
use crate::types::{Concept, Relationship};
use tracing::{debug, warn};

/// Indicator phrases, checked in priority order against the lowercased span
/// covering both concepts.
const INDICATORS: &[(&str, &[&str])] = &[
    ("causes", &["causes", "leads to", "results in", "triggers"]),
    ("treats", &["treats", "cures", "alleviates", "manages"]),
    ("requires", &["requires", "needs", "depends on"]),
];

const DEFAULT_RELATION: &str = "relates_to";

#[derive(Clone)]
pub struct RelationshipMapper {
    domain: Option<DomainRef>,
    enhancer: Option<EnhancerRef>,
    proximity_threshold: usize,
    evidence_window: usize,
    confidence: f32,
    use_llm: bool,
}

impl RelationshipMapper {
    pub fn new(domain: Option<DomainRef>, config: &ReasoningConfig) -> Self {
        Self {
            domain,
            enhancer: None,
            proximity_threshold: config.proximity_threshold,
            evidence_window: config.evidence_window,
            confidence: config.generic_relationship_confidence,
            use_llm: config.use_llm,
        }
    }

    pub fn with_enhancer(mut self, enhancer: Option<EnhancerRef>) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn map_relationships(&self, concepts: &[Concept], text: &str) -> Vec<Relationship> {
        if concepts.is_empty() {
            return Vec::new();
        }

        let mut relationships = match &self.domain {
            Some(domain) => match domain.identify_relationships(concepts, text) {
                Ok(found) => found,
                Err(e) => {
                    debug!(domain = domain.name(), error = %e, "domain relationship mapping failed, using generic");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if relationships.is_empty() {
            relationships = self.generic_detection(concepts, text);
        }

        if self.use_llm {
            relationships = self.enhance(concepts, text, relationships);
        }
        relationships.into_iter().map(Relationship::clamped).collect()
    }

    /// Pairwise scan over `i < j` in extraction order.
    fn generic_detection(&self, concepts: &[Concept], text: &str) -> Vec<Relationship> {
        let mut relationships = Vec::new();

        for (i, source) in concepts.iter().enumerate() {
            for target in &concepts[i + 1..] {
                if source.position.abs_diff(target.position) > self.proximity_threshold {
                    continue;
                }

                let (start, end) = span(source, target);
                let between = text::window(text, start, end, 0).to_lowercase();
                relationships.push(Relationship::new(
                    source.clone(),
                    target.clone(),
                    classify(&between),
                    self.confidence,
                    text::window(text, start, end, self.evidence_window),
                ));
            }
        }

        relationships
    }

    fn enhance(&self, concepts: &[Concept], text: &str, relationships: Vec<Relationship>) -> Vec<Relationship> {
        let Some(enhancer) = self.enhancer.as_ref().filter(|e| e.is_available()) else {
            return relationships;
        };
        let domain_name = self.domain.as_ref().map(|d| d.name()).unwrap_or("general");

        match enhancer.infer_relationships(concepts, text, domain_name, &relationships) {
            Ok(proposed) => merge_relationships(&relationships, &proposed),
            Err(e) => {
                warn!(error = %e, "relationship enhancement failed");
                relationships
            }
        }
    }
}

/// Byte range from the earlier concept's start to the later end.
fn span(a: &Concept, b: &Concept) -> (usize, usize) {
    (a.position.min(b.position), a.end().max(b.end()))
}

fn classify(between: &str) -> &'static str {
    INDICATORS
        .iter()
        .find(|(_, words)| words.iter().any(|w| between.contains(w)))
        .map(|(relation, _)| *relation)
        .unwrap_or(DEFAULT_RELATION)
}
