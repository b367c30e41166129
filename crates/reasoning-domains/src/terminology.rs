//! Table-driven domain rule-set.
//!
//! Every built-in domain and every user-defined JSON domain is a
//! [`DomainDefinition`]: a terminology table, pairwise relation rules, chain
//! templates and question templates. [`TerminologyDomain`] compiles the table
//! once and answers the [`Domain`] capability from it.

use crate::custom::CustomDomainError;
use reasoning_core::text::window;
use reasoning_core::{
    Concept, ContentByType, Domain, DomainResult, ReasoningChain, ReasoningStep, Relationship,
    Terminology,
};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Characters of surrounding text kept as a concept's context.
pub const CONTEXT_WINDOW: usize = 30;

/// Characters kept on each side of a relationship's evidence span.
pub const EVIDENCE_WINDOW: usize = 20;

// ============================================================================
// Rule tables
// ============================================================================

/// `source` type followed by `target` type yields `relation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRule {
    pub source: String,
    pub target: String,
    pub relation: String,
}

impl RelationRule {
    pub fn new(source: &str, target: &str, relation: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            relation: relation.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTemplate {
    #[serde(rename = "type")]
    pub concept_type: String,
    pub action: String,
    #[serde(default)]
    pub rationale: String,
}

/// A chain made of the first concept of each listed type, in order.
/// Types with no concept are skipped; fewer than two steps means no chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainTemplate {
    #[serde(rename = "type")]
    pub chain_type: String,
    pub steps: Vec<StepTemplate>,
    #[serde(default = "default_chain_confidence")]
    pub confidence: f32,
}

impl ChainTemplate {
    pub fn new(chain_type: &str, confidence: f32, steps: &[(&str, &str, &str)]) -> Self {
        Self {
            chain_type: chain_type.to_string(),
            confidence,
            steps: steps
                .iter()
                .map(|(concept_type, action, rationale)| StepTemplate {
                    concept_type: concept_type.to_string(),
                    action: action.to_string(),
                    rationale: rationale.to_string(),
                })
                .collect(),
        }
    }
}

/// Question templates asked once per concept of `concept_type`; `{}` is
/// replaced with the concept text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    #[serde(rename = "type")]
    pub concept_type: String,
    pub templates: Vec<String>,
}

impl QuestionTemplate {
    pub fn new(concept_type: &str, templates: &[&str]) -> Self {
        Self {
            concept_type: concept_type.to_string(),
            templates: templates.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Confidence {
    pub concept: f32,
    pub relationship: f32,
}

impl Default for Confidence {
    fn default() -> Self {
        Self {
            concept: 0.8,
            relationship: 0.75,
        }
    }
}

fn default_chain_confidence() -> f32 {
    0.7
}

/// Full definition of a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub terminology: Terminology,
    #[serde(default)]
    pub relations: Vec<RelationRule>,
    /// Label for concept pairs no rule covers; `None` leaves them unlinked.
    #[serde(default)]
    pub default_relation: Option<String>,
    #[serde(default)]
    pub chains: Vec<ChainTemplate>,
    #[serde(default)]
    pub questions: Vec<QuestionTemplate>,
    #[serde(default)]
    pub reasoning_patterns: Vec<String>,
    #[serde(default)]
    pub confidence: Confidence,
}

impl DomainDefinition {
    pub fn validate(&self) -> Result<(), CustomDomainError> {
        if self.name.trim().is_empty() {
            return Err(CustomDomainError::Invalid("domain name is empty".into()));
        }
        if self.terminology.values().all(|terms| terms.is_empty()) {
            return Err(CustomDomainError::Invalid(format!(
                "domain `{}` defines no terms",
                self.name
            )));
        }
        let in_range = |c: f32| (0.0..=1.0).contains(&c);
        if !in_range(self.confidence.concept) || !in_range(self.confidence.relationship) {
            return Err(CustomDomainError::Invalid(format!(
                "domain `{}` confidence must be within [0, 1]",
                self.name
            )));
        }
        for chain in &self.chains {
            if !in_range(chain.confidence) {
                return Err(CustomDomainError::Invalid(format!(
                    "chain `{}` confidence must be within [0, 1]",
                    chain.chain_type
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Compiled domain
// ============================================================================

#[derive(Debug)]
struct TermMatcher {
    concept_type: String,
    term: String,
    pattern: Regex,
}

/// A [`DomainDefinition`] with its terms compiled to whole-word, case-insensitive
/// matchers.
#[derive(Debug)]
pub struct TerminologyDomain {
    definition: DomainDefinition,
    matchers: Vec<TermMatcher>,
}

impl TerminologyDomain {
    pub fn new(definition: DomainDefinition) -> Result<Self, CustomDomainError> {
        definition.validate()?;

        let mut matchers = Vec::new();
        for (concept_type, terms) in &definition.terminology {
            for term in terms.iter().filter(|t| !t.trim().is_empty()) {
                let pattern = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term)))
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| CustomDomainError::Pattern {
                        term: term.clone(),
                        source,
                    })?;
                matchers.push(TermMatcher {
                    concept_type: concept_type.clone(),
                    term: term.clone(),
                    pattern,
                });
            }
        }

        debug!(domain = %definition.name, terms = matchers.len(), "compiled domain terminology");
        Ok(Self { definition, matchers })
    }

    pub fn definition(&self) -> &DomainDefinition {
        &self.definition
    }

    pub fn description(&self) -> &str {
        &self.definition.description
    }

    fn rule(&self, source: &Concept, target: &Concept) -> Option<&str> {
        self.definition
            .relations
            .iter()
            .find(|r| r.source == source.concept_type && r.target == target.concept_type)
            .map(|r| r.relation.as_str())
    }

    /// Relation for a pair in text order. A rule written for the reverse
    /// order is applied with the endpoints swapped.
    fn relation_for<'c>(
        &self,
        first: &'c Concept,
        second: &'c Concept,
    ) -> Option<(&'c Concept, &'c Concept, &str)> {
        if let Some(relation) = self.rule(first, second) {
            return Some((first, second, relation));
        }
        if let Some(relation) = self.rule(second, first) {
            return Some((second, first, relation));
        }
        self.definition
            .default_relation
            .as_deref()
            .map(|relation| (first, second, relation))
    }
}

impl Domain for TerminologyDomain {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn extract_concepts(&self, text: &str) -> DomainResult<Vec<Concept>> {
        let mut concepts = Vec::new();
        for matcher in &self.matchers {
            for m in matcher.pattern.find_iter(text) {
                concepts.push(Concept::new(
                    matcher.term.clone(),
                    matcher.concept_type.clone(),
                    self.definition.confidence.concept,
                    window(text, m.start(), m.end(), CONTEXT_WINDOW),
                    m.start(),
                ));
            }
        }
        concepts.sort_by_key(|c| c.position);
        Ok(concepts)
    }

    fn identify_relationships(
        &self,
        concepts: &[Concept],
        text: &str,
    ) -> DomainResult<Vec<Relationship>> {
        let mut relationships = Vec::new();
        for (i, first) in concepts.iter().enumerate() {
            for second in &concepts[i + 1..] {
                let Some((source, target, relation)) = self.relation_for(first, second) else {
                    continue;
                };
                let start = source.position.min(target.position);
                let end = source.end().max(target.end());
                relationships.push(Relationship::new(
                    source.clone(),
                    target.clone(),
                    relation,
                    self.definition.confidence.relationship,
                    window(text, start, end, EVIDENCE_WINDOW),
                ));
            }
        }
        Ok(relationships)
    }

    fn build_reasoning_chains(
        &self,
        concepts: &[Concept],
        _relationships: &[Relationship],
    ) -> DomainResult<Vec<ReasoningChain>> {
        let chains = self
            .definition
            .chains
            .iter()
            .filter_map(|template| {
                let mut used = HashSet::new();
                let steps = template
                    .steps
                    .iter()
                    .filter_map(|step| {
                        let (index, concept) = concepts
                            .iter()
                            .enumerate()
                            .find(|(_, c)| c.concept_type == step.concept_type)?;
                        used.insert(index).then(|| {
                            ReasoningStep::new(concept.clone(), step.action.as_str(), step.rationale.as_str())
                        })
                    })
                    .collect();
                ReasoningChain::new(
                    template.chain_type.as_str(),
                    steps,
                    template.confidence,
                    self.definition.name.as_str(),
                )
            })
            .collect();
        Ok(chains)
    }

    fn generate_questions(&self, content: &ContentByType) -> DomainResult<Vec<String>> {
        let mut questions = Vec::new();
        for rule in &self.definition.questions {
            let Some(items) = content.get(&rule.concept_type) else {
                continue;
            };
            for item in items {
                questions.extend(rule.templates.iter().map(|t| t.replace("{}", item)));
            }
        }
        Ok(questions)
    }

    fn terminology_mapping(&self) -> DomainResult<Terminology> {
        Ok(self.definition.terminology.clone())
    }

    fn reasoning_patterns(&self) -> DomainResult<Vec<String>> {
        Ok(self.definition.reasoning_patterns.clone())
    }
}

/// Build a terminology table from `(type, terms)` rows.
pub(crate) fn table(rows: &[(&str, &[&str])]) -> Terminology {
    rows.iter()
        .map(|(concept_type, terms)| {
            (
                concept_type.to_string(),
                terms.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}
