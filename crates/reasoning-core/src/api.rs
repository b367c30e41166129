//! Single-document pipeline: extract, map, chain, then assemble the graph and
//! ask the domain for follow-up questions.

use crate::chains::ReasoningChainBuilder;
use crate::config::ReasoningConfig;
use crate::domain::{ContentByType, DomainInfo, DomainRef};
use crate::enhance::EnhancerRef;
use crate::error::{ReasoningError, Result};
use crate::extraction::ConceptExtractor;
use crate::graph::{Edge, GraphError, KnowledgeGraph, Node};
use crate::relationships::RelationshipMapper;
use crate::result::AnalysisResult;
use crate::types::{Concept, Relationship};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Synchronous reasoning pipeline bound to an optional domain plugin.
///
/// Cloning is cheap: domain and enhancer are shared handles.
#[derive(Clone)]
pub struct ReasoningApi {
    domain: Option<DomainRef>,
    enhancer: Option<EnhancerRef>,
    config: ReasoningConfig,
    concept_extractor: ConceptExtractor,
    relationship_mapper: RelationshipMapper,
    chain_builder: ReasoningChainBuilder,
}

impl ReasoningApi {
    pub fn new(domain: Option<DomainRef>) -> Self {
        Self::assemble(domain, None, ReasoningConfig::default())
    }

    pub fn with_config(domain: Option<DomainRef>, config: ReasoningConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(domain, None, config))
    }

    /// Attach an enhancement service; it is only consulted when `use_llm` is set.
    pub fn with_enhancer(self, enhancer: EnhancerRef) -> Self {
        Self::assemble(self.domain, Some(enhancer), self.config)
    }

    fn assemble(domain: Option<DomainRef>, enhancer: Option<EnhancerRef>, config: ReasoningConfig) -> Self {
        Self {
            concept_extractor: ConceptExtractor::new(domain.clone(), &config)
                .with_enhancer(enhancer.clone()),
            relationship_mapper: RelationshipMapper::new(domain.clone(), &config)
                .with_enhancer(enhancer.clone()),
            chain_builder: ReasoningChainBuilder::new(domain.clone(), &config),
            domain,
            enhancer,
            config,
        }
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    pub fn domain(&self) -> Option<&DomainRef> {
        self.domain.as_ref()
    }

    /// Swap the active domain for every pipeline stage.
    pub fn set_domain(&mut self, domain: DomainRef) {
        debug!(domain = domain.name(), "switching domain");
        *self = Self::assemble(Some(domain), self.enhancer.take(), self.config.clone());
    }

    /// [`KnowledgeGraph::find_path`] bounded by the configured `max_path_depth`.
    pub fn find_path(&self, graph: &KnowledgeGraph, start: &str, end: &str) -> Option<Vec<String>> {
        graph.find_path(start, end, self.config.max_path_depth)
    }

    pub fn domain_info(&self) -> DomainInfo {
        match &self.domain {
            Some(domain) => DomainInfo::of(domain.as_ref()),
            None => DomainInfo::generic(),
        }
    }

    /// Run the full pipeline over `text`.
    ///
    /// Fails only on empty or whitespace-only input. Graph assembly and
    /// question generation failures are reported in `graph_error` and
    /// `questions_error` instead. A panicking domain plugin unwinds out of
    /// this call; the async entry points report it as
    /// [`ReasoningError::Processing`].
    pub fn process_text(&self, text: &str, include_graph: bool) -> Result<AnalysisResult> {
        if text.trim().is_empty() {
            return Err(ReasoningError::invalid_input("text cannot be empty"));
        }

        let concepts = self.concept_extractor.extract(text);
        let relationships = self.relationship_mapper.map_relationships(&concepts, text);
        let reasoning_chains = self.chain_builder.build_chains(&concepts, &relationships);

        let mut result = AnalysisResult {
            concepts,
            relationships,
            reasoning_chains,
            ..Default::default()
        };

        if include_graph {
            match build_knowledge_graph(&result.concepts, &result.relationships) {
                Ok(graph) => result.knowledge_graph = Some(graph),
                Err(e) => {
                    warn!(error = %e, "knowledge graph assembly failed");
                    result.graph_error = Some(e.to_string());
                }
            }
        }

        if let Some(domain) = &self.domain {
            match domain.generate_questions(&content_by_type(&result.concepts)) {
                Ok(questions) => result.questions = Some(questions),
                Err(e) => {
                    warn!(domain = domain.name(), error = %e, "question generation failed");
                    result.questions = Some(Vec::new());
                    result.questions_error = Some(e.to_string());
                }
            }
        }

        info!(
            concepts = result.concepts.len(),
            relationships = result.relationships.len(),
            chains = result.reasoning_chains.len(),
            "processed text"
        );
        Ok(result)
    }
}

/// Assemble a graph with one node per distinct `(text, position, type)`.
///
/// Node ids are `{type}_{position}_{n}`, where `n` counts the concepts seen so
/// far at that type and position, so repeated pattern hits never collide.
/// Relationships whose endpoints did not become nodes are dropped.
pub fn build_knowledge_graph(
    concepts: &[Concept],
    relationships: &[Relationship],
) -> std::result::Result<KnowledgeGraph, GraphError> {
    let mut graph = KnowledgeGraph::new();
    let mut node_ids: HashMap<(String, usize, String), String> = HashMap::new();
    let mut counters: HashMap<(&str, usize), usize> = HashMap::new();

    for concept in concepts {
        let key = concept.node_key();
        if node_ids.contains_key(&key) {
            continue;
        }

        let counter = counters
            .entry((concept.concept_type.as_str(), concept.position))
            .or_default();
        *counter += 1;
        let id = format!("{}_{}_{}", concept.concept_type, concept.position, counter);

        graph.add_node(
            Node::new(&id, &concept.concept_type, &concept.text)
                .with_property("context", concept.context.as_str())
                .with_confidence(concept.confidence),
        );
        node_ids.insert(key, id);
    }

    for rel in relationships {
        let (Some(source), Some(target)) = (
            node_ids.get(&rel.source.node_key()),
            node_ids.get(&rel.target.node_key()),
        ) else {
            continue;
        };
        graph.add_edge(
            Edge::new(source, target, &rel.relation_type)
                .with_property("evidence", rel.evidence.as_str())
                .with_confidence(rel.confidence),
        )?;
    }

    Ok(graph)
}

/// Concept texts grouped by type, in extraction order.
pub fn content_by_type(concepts: &[Concept]) -> ContentByType {
    let mut content = ContentByType::new();
    for concept in concepts {
        content
            .entry(concept.concept_type.clone())
            .or_default()
            .push(concept.text.clone());
    }
    content
}
