//! Concept extraction.
//!
//! Domain plugin first; when it fails or finds nothing, a capitalized-phrase
//! heuristic takes over. An enhancement service, when enabled, may add more.

use crate::config::ReasoningConfig;
use crate::domain::DomainRef;
use crate::enhance::{merge_concepts, EnhancerRef};
use crate::text;
use crate::types::Concept;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// One or more consecutive capitalized words.
fn capitalized_phrase() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").unwrap())
}

#[derive(Clone)]
pub struct ConceptExtractor {
    domain: Option<DomainRef>,
    enhancer: Option<EnhancerRef>,
    context_window: usize,
    confidence: f32,
    stop_words: HashSet<String>,
    use_llm: bool,
}

impl ConceptExtractor {
    pub fn new(domain: Option<DomainRef>, config: &ReasoningConfig) -> Self {
        Self {
            domain,
            enhancer: None,
            context_window: config.context_window,
            confidence: config.generic_concept_confidence,
            stop_words: config.stop_words.iter().map(|w| w.to_lowercase()).collect(),
            use_llm: config.use_llm,
        }
    }

    pub fn with_enhancer(mut self, enhancer: Option<EnhancerRef>) -> Self {
        self.enhancer = enhancer;
        self
    }

    pub fn extract(&self, text: &str) -> Vec<Concept> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut concepts = match &self.domain {
            Some(domain) => match domain.extract_concepts(text) {
                Ok(found) => found,
                Err(e) => {
                    debug!(domain = domain.name(), error = %e, "domain extraction failed, using generic");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if concepts.is_empty() {
            concepts = self.generic_extraction(text);
        }

        if self.use_llm {
            concepts = self.enhance(text, concepts);
        }
        // Plugins and enhancers build concepts directly
        concepts.into_iter().map(Concept::clamped).collect()
    }

    fn generic_extraction(&self, text: &str) -> Vec<Concept> {
        capitalized_phrase()
            .find_iter(text)
            .filter(|m| !self.stop_words.contains(&m.as_str().to_lowercase()))
            .map(|m| {
                Concept::new(
                    m.as_str(),
                    "unknown",
                    self.confidence,
                    text::window(text, m.start(), m.end(), self.context_window),
                    m.start(),
                )
            })
            .collect()
    }

    fn enhance(&self, text: &str, concepts: Vec<Concept>) -> Vec<Concept> {
        let Some(enhancer) = self.enhancer.as_ref().filter(|e| e.is_available()) else {
            return concepts;
        };
        let domain_name = self.domain.as_ref().map(|d| d.name()).unwrap_or("general");

        match enhancer.extract_concepts(text, domain_name, &concepts) {
            Ok(proposed) => {
                let merged = merge_concepts(&concepts, &proposed);
                debug!(added = merged.len() - concepts.len(), "merged enhancement concepts");
                merged
            }
            Err(e) => {
                warn!(error = %e, "concept enhancement failed");
                concepts
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentByType, Domain, DomainError, DomainResult, Terminology};
    use crate::enhance::{EnhancementError, EnhancementResult, EnhancementService};
    use crate::types::{ReasoningChain, Relationship};
    use std::sync::Arc;

    struct FailingDomain;

    impl Domain for FailingDomain {
        fn name(&self) -> &str {
            "failing"
        }
        fn extract_concepts(&self, _text: &str) -> DomainResult<Vec<Concept>> {
            Err(DomainError::failed("failing", "boom"))
        }
        fn identify_relationships(&self, _: &[Concept], _: &str) -> DomainResult<Vec<Relationship>> {
            Err(DomainError::failed("failing", "boom"))
        }
        fn build_reasoning_chains(&self, _: &[Concept], _: &[Relationship]) -> DomainResult<Vec<ReasoningChain>> {
            Err(DomainError::failed("failing", "boom"))
        }
        fn generate_questions(&self, _: &ContentByType) -> DomainResult<Vec<String>> {
            Err(DomainError::failed("failing", "boom"))
        }
        fn terminology_mapping(&self) -> DomainResult<Terminology> {
            Ok(Terminology::new())
        }
    }

    /// Hands back out-of-range confidences.
    struct LoudDomain;

    impl Domain for LoudDomain {
        fn name(&self) -> &str {
            "loud"
        }
        fn extract_concepts(&self, text: &str) -> DomainResult<Vec<Concept>> {
            Ok(vec![Concept {
                text: text.to_string(),
                concept_type: "symptom".into(),
                confidence: 1.5,
                context: String::new(),
                position: 0,
            }])
        }
        fn identify_relationships(&self, _: &[Concept], _: &str) -> DomainResult<Vec<Relationship>> {
            Ok(Vec::new())
        }
        fn build_reasoning_chains(&self, _: &[Concept], _: &[Relationship]) -> DomainResult<Vec<ReasoningChain>> {
            Ok(Vec::new())
        }
        fn generate_questions(&self, _: &ContentByType) -> DomainResult<Vec<String>> {
            Ok(Vec::new())
        }
        fn terminology_mapping(&self) -> DomainResult<Terminology> {
            Ok(Terminology::new())
        }
    }

    struct FixedEnhancer(Vec<Concept>);

    impl EnhancementService for FixedEnhancer {
        fn is_available(&self) -> bool {
            true
        }
        fn extract_concepts(&self, _: &str, _: &str, _: &[Concept]) -> EnhancementResult<Vec<Concept>> {
            Ok(self.0.clone())
        }
        fn infer_relationships(&self, _: &[Concept], _: &str, _: &str, _: &[Relationship]) -> EnhancementResult<Vec<Relationship>> {
            Err(EnhancementError::Unavailable("not used".into()))
        }
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        let extractor = ConceptExtractor::new(None, &ReasoningConfig::default());
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("   \n\t").is_empty());
    }

    #[test]
    fn test_generic_capitalized_phrases() {
        let extractor = ConceptExtractor::new(None, &ReasoningConfig::default());
        let concepts = extractor.extract("The meeting with John Smith covered Budget Planning.");

        let texts: Vec<&str> = concepts.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["John Smith", "Budget Planning"]);
        assert_eq!(concepts[0].concept_type, "unknown");
        assert_eq!(concepts[0].confidence, 0.5);
        assert_eq!(concepts[0].position, 17);
    }

    #[test]
    fn test_stop_words_are_skipped() {
        let extractor = ConceptExtractor::new(None, &ReasoningConfig::default());
        let concepts = extractor.extract("This is it. That was An idea. Paris");
        let texts: Vec<&str> = concepts.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Paris"]);
    }

    #[test]
    fn test_domain_failure_falls_back() {
        let extractor = ConceptExtractor::new(Some(Arc::new(FailingDomain)), &ReasoningConfig::default());
        let concepts = extractor.extract("Alice met Bob");
        assert_eq!(concepts.len(), 2);
    }

    #[test]
    fn test_domain_confidence_is_clamped() {
        let extractor = ConceptExtractor::new(Some(Arc::new(LoudDomain)), &ReasoningConfig::default());
        let concepts = extractor.extract("fever");
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0].confidence, 1.0);
    }

    #[test]
    fn test_context_window() {
        let config = ReasoningConfig {
            context_window: 3,
            ..Default::default()
        };
        let extractor = ConceptExtractor::new(None, &config);
        let concepts = extractor.extract("we saw Rome today");
        assert_eq!(concepts[0].context, "aw Rome to");
    }

    #[test]
    fn test_enhancer_only_used_when_enabled() {
        let proposed = vec![Concept::new("Rome", "unknown", 0.9, "", 7), Concept::new("city", "place", 0.8, "", 0)];
        let enhancer: EnhancerRef = Arc::new(FixedEnhancer(proposed));

        let disabled = ConceptExtractor::new(None, &ReasoningConfig::default())
            .with_enhancer(Some(enhancer.clone()));
        assert_eq!(disabled.extract("we saw Rome").len(), 1);

        let config = ReasoningConfig {
            use_llm: true,
            ..Default::default()
        };
        let enabled = ConceptExtractor::new(None, &config).with_enhancer(Some(enhancer));
        let concepts = enabled.extract("we saw Rome");
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].confidence, 0.9);
        assert_eq!(concepts[1].text, "city");
    }
}
