//! Ollama-backed enhancement service (feature `ollama`).
//!
//! Uses Ollama's native `/api/generate` endpoint with a blocking client; the
//! pipeline already runs on a blocking worker inside the async layer.

use super::response::{parse_concepts, parse_relationships};
use super::{EnhancementError, EnhancementResult, EnhancementService};
use crate::types::{Concept, Relationship};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_PROMPT_CHARS: usize = 3000;
const MAX_RELATION_PROMPT_CHARS: usize = 2000;
const MAX_PROMPT_CONCEPTS: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub model: String,
    pub host: String,
    pub use_gpu: bool,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: "llama3.2:3b".to_string(),
            host: std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://127.0.0.1:11434".into()),
            use_gpu: true,
            timeout_secs: 120,
        }
    }
}

pub struct OllamaEnhancer {
    config: OllamaConfig,
    host: String,
    client: reqwest::blocking::Client,
    /// Probe result, computed on first use
    available: Mutex<Option<bool>>,
}

impl OllamaEnhancer {
    pub fn new(config: OllamaConfig) -> EnhancementResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EnhancementError::Request(format!("failed to build http client: {e}")))?;
        Ok(Self {
            host: normalize_host(&config.host),
            config,
            client,
            available: Mutex::new(None),
        })
    }

    fn probe(&self) -> bool {
        let url = format!("{}/api/tags", self.host);
        let response = match self.client.get(&url).timeout(Duration::from_secs(5)).send() {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                debug!(status = %resp.status(), "ollama tags request failed");
                return false;
            }
            Err(e) => {
                debug!(error = %e, url = %url, "ollama not reachable");
                return false;
            }
        };
        let Ok(body) = response.json::<serde_json::Value>() else {
            return false;
        };

        let family = self.config.model.split(':').next().unwrap_or_default();
        body["models"]
            .as_array()
            .map(|models| {
                models.iter().filter_map(|m| m["name"].as_str()).any(|name| {
                    name.contains(&self.config.model) || name.starts_with(family)
                })
            })
            .unwrap_or(false)
    }

    fn generate(&self, prompt: &str, system: &str) -> EnhancementResult<String> {
        if !self.is_available() {
            return Err(EnhancementError::Unavailable(format!(
                "model `{}` not served at {}",
                self.config.model, self.host
            )));
        }

        let url = format!("{}/api/generate", self.host);
        let body = json!({
            "model": self.config.model,
            "prompt": prompt,
            "system": system,
            "stream": false,
            "options": {
                "temperature": 0.3,
                "top_p": 0.9,
                "num_gpu": if self.config.use_gpu { -1 } else { 0 },
            }
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| EnhancementError::Request(format!("failed to reach ollama at {url}: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().unwrap_or_default();
            return Err(EnhancementError::Request(format!("ollama http error {status}: {text}")));
        }

        let value: serde_json::Value = resp
            .json()
            .map_err(|e| EnhancementError::InvalidResponse(e.to_string()))?;
        Ok(value["response"].as_str().unwrap_or_default().trim().to_string())
    }
}

impl EnhancementService for OllamaEnhancer {
    fn is_available(&self) -> bool {
        let mut cached = self.available.lock();
        *cached.get_or_insert_with(|| self.probe())
    }

    fn extract_concepts(
        &self,
        text: &str,
        domain_name: &str,
        existing: &[Concept],
    ) -> EnhancementResult<Vec<Concept>> {
        let system = format!(
            "You are an expert at extracting key concepts from {domain_name} text.\n\
             Extract explicit and implicit concepts, synonyms and expanded abbreviations.\n\
             Return a JSON array of objects with keys \"text\", \"type\", \"confidence\" (0.0-1.0) \
             and \"context\". Only return valid JSON, no other text."
        );
        let mut prompt = format!(
            "Extract all key concepts from this {domain_name} text:\n\n{}",
            truncate_chars(text, MAX_PROMPT_CHARS)
        );
        if !existing.is_empty() {
            let known: Vec<&str> = existing.iter().take(10).map(|c| c.text.as_str()).collect();
            prompt.push_str(&format!(
                "\n\nNote: these concepts were already found: {}. Add any additional concepts not in this list.",
                known.join(", ")
            ));
        }

        let response = self.generate(&prompt, &system)?;
        let concepts = parse_concepts(&response, text)?;
        debug!(count = concepts.len(), "ollama proposed concepts");
        Ok(concepts)
    }

    fn infer_relationships(
        &self,
        concepts: &[Concept],
        text: &str,
        domain_name: &str,
        existing: &[Relationship],
    ) -> EnhancementResult<Vec<Relationship>> {
        if concepts.len() < 2 {
            return Ok(Vec::new());
        }

        let system = format!(
            "You are an expert at identifying relationships between concepts in {domain_name} text.\n\
             Consider causal (causes, leads_to), treatment (treats, manages), requirement \
             (requires, depends_on) and general (relates_to) relationships.\n\
             Return a JSON array of objects with keys \"source\", \"target\", \"type\", \
             \"confidence\" (0.0-1.0) and \"evidence\". Only return valid JSON, no other text."
        );
        let listing: Vec<String> = concepts
            .iter()
            .take(MAX_PROMPT_CONCEPTS)
            .map(|c| format!("- {} ({})", c.text, c.concept_type))
            .collect();
        let prompt = format!(
            "Given these concepts from {domain_name} text:\n{}\n\nAnd the original text:\n{}\n\n\
             Identify all relationships between these concepts ({} already known). \
             Return relationships as a JSON array.",
            listing.join("\n"),
            truncate_chars(text, MAX_RELATION_PROMPT_CHARS),
            existing.len()
        );

        let response = self.generate(&prompt, &system)?;
        let relationships = parse_relationships(&response, concepts).map_err(|e| {
            warn!(error = %e, "ollama relationship response rejected");
            e
        })?;
        Ok(relationships)
    }
}

fn normalize_host(host: &str) -> String {
    let mut host = host.trim().to_string();
    if host.is_empty() {
        host = "http://127.0.0.1:11434".to_string();
    }
    if !host.starts_with("http://") && !host.starts_with("https://") {
        host = format!("http://{host}");
    }
    host.trim_end_matches('/').to_string()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    &text[..crate::text::char_to_byte(text, max)]
}
