//! Parsing of language-model extraction responses.
//!
//! Models are asked for a bare JSON array but frequently wrap it in a Markdown
//! code fence or add a sentence around it; [`strip_code_fence`] and
//! [`json_array_slice`] recover the array before `serde_json` sees it.

use super::{EnhancementError, EnhancementResult};
use crate::text;
use crate::types::{Concept, Relationship};
use serde::Deserialize;

const CONTEXT_WINDOW: usize = 50;

#[derive(Debug, Deserialize)]
struct ProposedConcept {
    #[serde(default)]
    text: String,
    #[serde(rename = "type", default = "unknown_type")]
    concept_type: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct ProposedRelationship {
    #[serde(default)]
    source: String,
    #[serde(default)]
    target: String,
    #[serde(rename = "type", default = "relates_to")]
    relation_type: String,
    #[serde(default = "default_confidence")]
    confidence: f32,
    #[serde(default)]
    evidence: String,
}

fn unknown_type() -> String {
    "unknown".to_string()
}

fn relates_to() -> String {
    "relates_to".to_string()
}

fn default_confidence() -> f32 {
    0.7
}

/// Remove a surrounding ```/```json fence, if any.
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}

/// The outermost `[...]` of `response`, ignoring prose around it.
pub fn json_array_slice(response: &str) -> Option<&str> {
    let body = strip_code_fence(response);
    let start = body.find('[')?;
    let end = body.rfind(']')?;
    (end > start).then(|| &body[start..=end])
}

/// Parse proposed concepts, locating each one in `source_text`.
///
/// Concepts not found in the text are kept at position 0, matching how the
/// pipeline treats implicit concepts.
pub fn parse_concepts(response: &str, source_text: &str) -> EnhancementResult<Vec<Concept>> {
    let array = json_array_slice(response)
        .ok_or_else(|| EnhancementError::InvalidResponse("no JSON array in response".into()))?;
    let items: Vec<serde_json::Value> = serde_json::from_str(array)
        .map_err(|e| EnhancementError::InvalidResponse(e.to_string()))?;

    let haystack = source_text.to_lowercase();
    let mut concepts = Vec::new();
    for item in items {
        // Non-object entries are skipped rather than failing the whole batch.
        let Ok(proposed) = serde_json::from_value::<ProposedConcept>(item) else {
            continue;
        };
        let needle = proposed.text.trim();
        if needle.is_empty() {
            continue;
        }

        let position = locate(&haystack, source_text, needle).unwrap_or(0);
        let context = text::window(source_text, position, position + needle.len(), CONTEXT_WINDOW);
        concepts.push(Concept::new(
            needle,
            proposed.concept_type,
            proposed.confidence,
            context,
            position,
        ));
    }
    Ok(concepts)
}

/// Parse proposed relationships, resolving endpoints against `concepts`.
///
/// Endpoints resolve by case-insensitive exact match first, then by substring
/// in either direction. Unresolvable entries and self-links are dropped.
pub fn parse_relationships(
    response: &str,
    concepts: &[Concept],
) -> EnhancementResult<Vec<Relationship>> {
    let array = json_array_slice(response)
        .ok_or_else(|| EnhancementError::InvalidResponse("no JSON array in response".into()))?;
    let items: Vec<serde_json::Value> = serde_json::from_str(array)
        .map_err(|e| EnhancementError::InvalidResponse(e.to_string()))?;

    let mut relationships = Vec::new();
    for item in items {
        let Ok(proposed) = serde_json::from_value::<ProposedRelationship>(item) else {
            continue;
        };
        let (Some(source), Some(target)) = (
            resolve(concepts, &proposed.source),
            resolve(concepts, &proposed.target),
        ) else {
            continue;
        };
        if source == target {
            continue;
        }
        relationships.push(Relationship::new(
            source.clone(),
            target.clone(),
            proposed.relation_type,
            proposed.confidence,
            proposed.evidence,
        ));
    }
    Ok(relationships)
}

fn locate(haystack_lower: &str, original: &str, needle: &str) -> Option<usize> {
    let idx = haystack_lower.find(&needle.to_lowercase())?;
    // Lowercasing can change byte lengths outside ASCII; only trust offsets
    // that still land on a boundary of the original text.
    original.is_char_boundary(idx).then_some(idx)
}

fn resolve<'a>(concepts: &'a [Concept], name: &str) -> Option<&'a Concept> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }
    concepts
        .iter()
        .find(|c| c.text.to_lowercase() == name)
        .or_else(|| {
            concepts.iter().find(|c| {
                let text = c.text.to_lowercase();
                name.contains(&text) || text.contains(&name)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[2]\n```\n"), "[2]");
        assert_eq!(strip_code_fence("  [3]  "), "[3]");
    }

    #[test]
    fn test_json_array_slice_ignores_prose() {
        assert_eq!(json_array_slice("Here you go: [1, 2] hope it helps"), Some("[1, 2]"));
        assert_eq!(json_array_slice("nothing here"), None);
    }

    #[test]
    fn test_parse_concepts_locates_positions() {
        let text = "Patient has Fever and flu.";
        let response = r#"```json
[
  {"text": "fever", "type": "symptom", "confidence": 0.95},
  {"text": "dehydration", "type": "condition"},
  "garbage",
  {"text": "  ", "type": "symptom"}
]
```"#;
        let concepts = parse_concepts(response, text).unwrap();
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].text, "fever");
        assert_eq!(concepts[0].position, 12);
        assert_eq!(concepts[0].confidence, 0.95);
        assert_eq!(concepts[1].position, 0);
        assert_eq!(concepts[1].confidence, 0.7);
    }

    #[test]
    fn test_parse_concepts_rejects_non_json() {
        assert!(parse_concepts("I could not find anything.", "text").is_err());
    }

    #[test]
    fn test_parse_relationships_resolves_and_drops_self_links() {
        let concepts = vec![
            Concept::new("chest pain", "symptom", 0.9, "", 0),
            Concept::new("myocardial infarction", "disease", 0.9, "", 20),
        ];
        let response = r#"[
            {"source": "Chest Pain", "target": "acute myocardial infarction", "type": "indicates", "confidence": 0.8},
            {"source": "chest pain", "target": "pain", "type": "relates_to"},
            {"source": "unknown thing", "target": "chest pain"}
        ]"#;

        let rels = parse_relationships(response, &concepts).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].source.text, "chest pain");
        assert_eq!(rels[0].target.text, "myocardial infarction");
        assert_eq!(rels[0].relation_type, "indicates");
    }
}
