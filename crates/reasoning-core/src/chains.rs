//! Reasoning chain construction.
//!
//! The generic builder treats relationships as a directed graph keyed by
//! concept text and records every path of two or more concepts reachable from
//! each extracted concept, up to a depth bound.

use crate::config::ReasoningConfig;
use crate::domain::DomainRef;
use crate::types::{Concept, ReasoningChain, ReasoningStep, Relationship, StepAction};
use std::collections::{HashMap, HashSet};
use tracing::debug;

type Adjacency<'a> = HashMap<&'a str, Vec<&'a Concept>>;

#[derive(Clone)]
pub struct ReasoningChainBuilder {
    domain: Option<DomainRef>,
    max_depth: usize,
    confidence: f32,
}

impl ReasoningChainBuilder {
    pub fn new(domain: Option<DomainRef>, config: &ReasoningConfig) -> Self {
        Self {
            domain,
            max_depth: config.max_chain_depth,
            confidence: config.generic_chain_confidence,
        }
    }

    pub fn build_chains(&self, concepts: &[Concept], relationships: &[Relationship]) -> Vec<ReasoningChain> {
        let chains = match &self.domain {
            Some(domain) => match domain.build_reasoning_chains(concepts, relationships) {
                // Plugins may hand back short chains; they are never emitted.
                Ok(found) => found
                    .into_iter()
                    .filter(ReasoningChain::is_valid)
                    .map(ReasoningChain::clamped)
                    .collect(),
                Err(e) => {
                    debug!(domain = domain.name(), error = %e, "domain chain building failed, using generic");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        if chains.is_empty() {
            self.generic_chains(concepts, relationships)
        } else {
            chains
        }
    }

    fn generic_chains(&self, concepts: &[Concept], relationships: &[Relationship]) -> Vec<ReasoningChain> {
        let mut graph: Adjacency<'_> = HashMap::new();
        for rel in relationships {
            graph.entry(rel.source.text.as_str()).or_default().push(&rel.target);
        }

        concepts
            .iter()
            .flat_map(|start| self.find_paths(start, &graph))
            .filter_map(|path| self.path_to_chain(&path))
            .collect()
    }

    /// Depth-first enumeration of the paths leaving `start`, in discovery
    /// order. A concept text never repeats within one path.
    fn find_paths<'a>(&self, start: &'a Concept, graph: &Adjacency<'a>) -> Vec<Vec<&'a Concept>> {
        let mut paths = Vec::new();
        let mut path: Vec<&Concept> = vec![start];
        let mut on_path: HashSet<&str> = HashSet::from([start.text.as_str()]);
        let mut frames: Vec<usize> = vec![0];

        while let Some(next_idx) = frames.last_mut() {
            let current = path[path.len() - 1];
            let neighbors = graph.get(current.text.as_str()).map(Vec::as_slice).unwrap_or(&[]);

            if path.len() - 1 < self.max_depth && *next_idx < neighbors.len() {
                let next = neighbors[*next_idx];
                *next_idx += 1;
                if on_path.insert(next.text.as_str()) {
                    path.push(next);
                    paths.push(path.clone());
                    frames.push(0);
                }
            } else {
                frames.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(done.text.as_str());
                }
            }
        }

        paths
    }

    fn path_to_chain(&self, path: &[&Concept]) -> Option<ReasoningChain> {
        let last = path.len().checked_sub(1)?;
        let steps = path
            .iter()
            .enumerate()
            .map(|(i, concept)| {
                let action = match i {
                    0 => StepAction::Observe,
                    i if i == last => StepAction::Conclude,
                    _ => StepAction::Analyze,
                };
                let rationale = if i == 0 {
                    "Starting point".to_string()
                } else {
                    format!("Based on {}, consider {}", path[i - 1].text, concept.text)
                };
                ReasoningStep::new((*concept).clone(), action, rationale)
            })
            .collect();

        ReasoningChain::new("generic", steps, self.confidence, "unknown")
    }
}
