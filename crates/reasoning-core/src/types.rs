//! Shared value types: concepts, relationships and reasoning chains.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Concept
// ============================================================================

/// An extracted named entity or phrase with a domain type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub text: String,
    /// Domain type, e.g. "symptom", "metric"; "unknown" for generic matches
    #[serde(rename = "type")]
    pub concept_type: String,
    /// Always within `[0, 1]`
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: f32,
    /// Surrounding text
    #[serde(default)]
    pub context: String,
    /// Byte offset of the match in the analysed text
    #[serde(default)]
    pub position: usize,
}

impl Concept {
    pub fn new(
        text: impl Into<String>,
        concept_type: impl Into<String>,
        confidence: f32,
        context: impl Into<String>,
        position: usize,
    ) -> Self {
        Self {
            text: text.into(),
            concept_type: concept_type.into(),
            confidence: clamp_confidence(confidence),
            context: context.into(),
            position,
        }
    }

    /// Identity used when merging concepts from different extraction passes.
    pub fn dedup_key(&self) -> (String, String) {
        (self.text.to_lowercase(), self.concept_type.clone())
    }

    /// Identity used when mapping concepts onto graph nodes.
    pub fn node_key(&self) -> (String, usize, String) {
        (self.text.clone(), self.position, self.concept_type.clone())
    }

    /// Copy of this concept carrying `confidence` instead.
    pub fn with_confidence(&self, confidence: f32) -> Self {
        Self {
            confidence: clamp_confidence(confidence),
            ..self.clone()
        }
    }

    /// Same concept with its confidence pulled back into `[0, 1]`.
    pub fn clamped(mut self) -> Self {
        self.confidence = clamp_confidence(self.confidence);
        self
    }

    /// Byte offset one past the end of the concept text.
    pub fn end(&self) -> usize {
        self.position + self.text.len()
    }
}

// ============================================================================
// Relationship
// ============================================================================

/// A typed, directed, evidenced link between two concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: Concept,
    pub target: Concept,
    #[serde(rename = "type")]
    pub relation_type: String,
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: f32,
    /// Text supporting the relationship
    #[serde(default)]
    pub evidence: String,
}

impl Relationship {
    pub fn new(
        source: Concept,
        target: Concept,
        relation_type: impl Into<String>,
        confidence: f32,
        evidence: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target,
            relation_type: relation_type.into(),
            confidence: clamp_confidence(confidence),
            evidence: evidence.into(),
        }
    }

    /// Same relationship with every confidence, endpoints included, in `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            source: self.source.clamped(),
            target: self.target.clamped(),
            confidence: clamp_confidence(self.confidence),
            ..self
        }
    }

    /// Case-insensitive `(source, target, type)` identity.
    pub fn dedup_key(&self) -> (String, String, String) {
        (
            self.source.text.to_lowercase(),
            self.target.text.to_lowercase(),
            self.relation_type.clone(),
        )
    }
}

// ============================================================================
// Reasoning chains
// ============================================================================

/// What a reasoning step does with its concept.
///
/// Generic chains only use `Observe`, `Analyze` and `Conclude`; domain plugins
/// contribute their own verbs ("diagnose", "treat", "measure", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepAction {
    Observe,
    Analyze,
    Conclude,
    Domain(String),
}

impl StepAction {
    pub fn as_str(&self) -> &str {
        match self {
            StepAction::Observe => "observe",
            StepAction::Analyze => "analyze",
            StepAction::Conclude => "conclude",
            StepAction::Domain(verb) => verb,
        }
    }
}

impl From<String> for StepAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "observe" => StepAction::Observe,
            "analyze" => StepAction::Analyze,
            "conclude" => StepAction::Conclude,
            _ => StepAction::Domain(value),
        }
    }
}

impl From<&str> for StepAction {
    fn from(value: &str) -> Self {
        StepAction::from(value.to_string())
    }
}

impl From<StepAction> for String {
    fn from(action: StepAction) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub concept: Concept,
    pub action: StepAction,
    /// Why this step follows the previous one
    pub rationale: String,
}

impl ReasoningStep {
    pub fn new(concept: Concept, action: impl Into<StepAction>, rationale: impl Into<String>) -> Self {
        Self {
            concept,
            action: action.into(),
            rationale: rationale.into(),
        }
    }
}

/// An ordered line of reasoning over extracted concepts.
///
/// Chains are only constructed through [`ReasoningChain::new`], which refuses
/// anything shorter than [`ReasoningChain::MIN_STEPS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningChain {
    #[serde(rename = "type")]
    pub chain_type: String,
    pub steps: Vec<ReasoningStep>,
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: f32,
    pub domain: String,
}

impl ReasoningChain {
    pub const MIN_STEPS: usize = 2;

    /// Build a chain, or `None` when there are fewer than two steps.
    pub fn new(
        chain_type: impl Into<String>,
        steps: Vec<ReasoningStep>,
        confidence: f32,
        domain: impl Into<String>,
    ) -> Option<Self> {
        if steps.len() < Self::MIN_STEPS {
            return None;
        }
        Some(Self {
            chain_type: chain_type.into(),
            steps,
            confidence: clamp_confidence(confidence),
            domain: domain.into(),
        })
    }

    /// Same chain with its own and its step concepts' confidences in `[0, 1]`.
    pub fn clamped(mut self) -> Self {
        self.confidence = clamp_confidence(self.confidence);
        for step in &mut self.steps {
            step.concept.confidence = clamp_confidence(step.concept.confidence);
        }
        self
    }

    pub fn is_valid(&self) -> bool {
        self.steps.len() >= Self::MIN_STEPS
    }
}

/// Clamp into `[0, 1]`; NaN becomes 0.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn deserialize_confidence<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    f32::deserialize(deserializer).map(clamp_confidence)
}
