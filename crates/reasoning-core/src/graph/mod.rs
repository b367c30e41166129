//! Directed, labeled knowledge graph assembled from concepts and relationships.
//!
//! Nodes are keyed by id; edges keep creation order. The adjacency map is
//! maintained incrementally and always mirrors the edge list.

mod export;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Free-form node/edge attributes.
pub type Properties = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    #[error("source node `{0}` not found in graph")]
    MissingSourceNode(String),
    #[error("target node `{0}` not found in graph")]
    MissingTargetNode(String),
    #[error("graph serialization failed: {0}")]
    Serialization(String),
}

fn full_confidence() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Concept type
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display text
    pub label: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            label: label.into(),
            properties: Properties::new(),
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    /// Relationship type
    #[serde(rename = "type")]
    pub edge_type: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

impl Edge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        edge_type: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            edge_type: edge_type.into(),
            properties: Properties::new(),
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Summary statistics of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub node_types: BTreeSet<String>,
    pub edge_types: BTreeSet<String>,
    /// Total out-degree divided by node count; 0 for an empty graph
    pub avg_degree: f64,
}

/// Plain node/edge listing; the serialized form of a [`KnowledgeGraph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "GraphData", try_from = "GraphData")]
pub struct KnowledgeGraph {
    nodes: BTreeMap<String, Node>,
    edges: Vec<Edge>,
    adjacency: BTreeMap<String, Vec<String>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a node by id.
    pub fn add_node(&mut self, node: Node) {
        self.adjacency.entry(node.id.clone()).or_default();
        self.nodes.insert(node.id.clone(), node);
    }

    /// Append an edge; both endpoints must already be in the graph.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&edge.source_id) {
            return Err(GraphError::MissingSourceNode(edge.source_id));
        }
        if !self.nodes.contains_key(&edge.target_id) {
            return Err(GraphError::MissingTargetNode(edge.target_id));
        }
        self.push_edge(edge);
        Ok(())
    }

    // Callers guarantee both endpoints exist.
    fn push_edge(&mut self, edge: Edge) {
        self.adjacency
            .entry(edge.source_id.clone())
            .or_default()
            .push(edge.target_id.clone());
        self.edges.push(edge);
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Targets of the edges leaving `id`, one entry per edge.
    pub fn get_neighbors(&self, id: &str) -> &[String] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_edges_from(&self, id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.source_id == id).collect()
    }

    pub fn get_edges_to(&self, id: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.target_id == id).collect()
    }

    /// First path from `start` to `end` found by depth-first search, at most
    /// `max_depth` edges long. Not necessarily the shortest.
    ///
    /// A node is never revisited within the current path; it becomes available
    /// again once the search backtracks past it.
    pub fn find_path(&self, start: &str, end: &str, max_depth: usize) -> Option<Vec<String>> {
        let start = self.nodes.get_key_value(start)?.0.as_str();
        let end = self.nodes.get_key_value(end)?.0.as_str();
        if start == end {
            return Some(vec![start.to_string()]);
        }

        let mut path: Vec<&str> = vec![start];
        let mut on_path: HashSet<&str> = HashSet::from([start]);
        // Next neighbor index to try, one frame per path entry
        let mut frames: Vec<usize> = vec![0];

        while let Some(next_idx) = frames.last_mut() {
            let current = path[path.len() - 1];
            let neighbors = self.get_neighbors(current);
            let depth = path.len() - 1;

            if depth < max_depth && *next_idx < neighbors.len() {
                let next = neighbors[*next_idx].as_str();
                *next_idx += 1;
                if next == end {
                    path.push(next);
                    return Some(path.into_iter().map(String::from).collect());
                }
                if on_path.insert(next) {
                    path.push(next);
                    frames.push(0);
                }
            } else {
                frames.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(done);
                }
            }
        }

        None
    }

    /// Copy of the nodes in `ids` (unknown ids ignored), plus the edges
    /// between them when `include_connections` is set.
    pub fn get_subgraph<I, S>(&self, ids: I, include_connections: bool) -> KnowledgeGraph
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut subgraph = KnowledgeGraph::new();
        let mut wanted: HashSet<String> = HashSet::new();
        for id in ids {
            let id = id.as_ref();
            if let Some(node) = self.nodes.get(id) {
                subgraph.add_node(node.clone());
            }
            wanted.insert(id.to_string());
        }

        if include_connections {
            for edge in &self.edges {
                if wanted.contains(&edge.source_id) && wanted.contains(&edge.target_id) {
                    subgraph.push_edge(edge.clone());
                }
            }
        }
        subgraph
    }

    /// Add the nodes of `other` whose ids are new here, then every edge of
    /// `other`. Edges carry no identity, so merging twice duplicates them.
    pub fn merge(&mut self, other: &KnowledgeGraph) {
        for node in other.nodes.values() {
            if !self.nodes.contains_key(&node.id) {
                self.add_node(node.clone());
            }
        }
        for edge in &other.edges {
            self.push_edge(edge.clone());
        }
    }

    pub fn get_stats(&self) -> GraphStats {
        let total_degree: usize = self.nodes.keys().map(|id| self.get_neighbors(id).len()).sum();
        let avg_degree = if self.nodes.is_empty() {
            0.0
        } else {
            total_degree as f64 / self.nodes.len() as f64
        };

        GraphStats {
            num_nodes: self.nodes.len(),
            num_edges: self.edges.len(),
            node_types: self.nodes.values().map(|n| n.node_type.clone()).collect(),
            edge_types: self.edges.iter().map(|e| e.edge_type.clone()).collect(),
            avg_degree,
        }
    }

    /// Generic map form: `{"nodes": [...], "edges": [...]}`.
    pub fn to_dict(&self) -> Result<serde_json::Value, GraphError> {
        serde_json::to_value(self).map_err(|e| GraphError::Serialization(e.to_string()))
    }

    /// Rebuild a graph from [`KnowledgeGraph::to_dict`] output. Edges are
    /// validated against the nodes as they are added.
    pub fn from_dict(value: serde_json::Value) -> Result<Self, GraphError> {
        let data: GraphData =
            serde_json::from_value(value).map_err(|e| GraphError::Serialization(e.to_string()))?;
        Self::try_from(data)
    }
}

impl From<KnowledgeGraph> for GraphData {
    fn from(graph: KnowledgeGraph) -> Self {
        GraphData {
            nodes: graph.nodes.into_values().collect(),
            edges: graph.edges,
        }
    }
}

impl TryFrom<GraphData> for KnowledgeGraph {
    type Error = GraphError;

    fn try_from(data: GraphData) -> Result<Self, Self::Error> {
        let mut graph = KnowledgeGraph::new();
        for node in data.nodes {
            graph.add_node(node);
        }
        for edge in data.edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }
}
