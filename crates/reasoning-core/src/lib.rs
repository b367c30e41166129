//! Reasoning Core: concept, relationship and reasoning-chain extraction
//!
//! Turns unstructured text into structured knowledge using pluggable domain
//! rule-sets, and assembles the result into a knowledge graph.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        EXTRACTION PIPELINE                           │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │   text ──► ConceptExtractor ──► RelationshipMapper ──► ChainBuilder  │
//! │                 │  ▲                  │  ▲                  │  ▲     │
//! │                 ▼  │                  ▼  │                  ▼  │     │
//! │            ┌─────────────── dyn Domain (optional) ───────────────┐   │
//! │            │  medical · business · meeting · custom JSON          │   │
//! │            └──────────────────────────────────────────────────────┘   │
//! │                 │                     │                              │
//! │                 └──── concepts + relationships ────► KnowledgeGraph  │
//! │                                                                      │
//! │   AsyncReasoningApi: blocking pool · chunked streams · batches       │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage asks the domain first and falls back to a generic heuristic
//! when the domain fails or has nothing to say. Domain failures never reach
//! the caller; only blank input does.
//!
//! ## Example
//!
//! ```
//! use reasoning_core::ReasoningApi;
//!
//! let api = ReasoningApi::new(None);
//! let result = api.process_text("Alice met Bob in Paris.", true).unwrap();
//! assert_eq!(result.concepts.len(), 3);
//! assert!(result.knowledge_graph.is_some());
//! ```

pub mod api;
pub mod async_api;
pub mod chains;
pub mod config;
pub mod domain;
pub mod enhance;
pub mod error;
pub mod extraction;
pub mod graph;
pub mod relationships;
pub mod result;
pub mod text;
pub mod types;

pub use api::{build_knowledge_graph, content_by_type, ReasoningApi};
pub use async_api::{merge_results, AsyncReasoningApi, Chunker, ResultMerger};
pub use chains::ReasoningChainBuilder;
pub use config::{ReasoningConfig, StreamOptions};
pub use domain::{ContentByType, Domain, DomainError, DomainInfo, DomainRef, DomainResult, Terminology};
pub use enhance::{EnhancementError, EnhancementService, EnhancerRef};
pub use error::{ReasoningError, Result};
pub use extraction::ConceptExtractor;
pub use graph::{Edge, GraphError, GraphStats, KnowledgeGraph, Node};
pub use relationships::RelationshipMapper;
pub use result::{AnalysisResult, MergedResult, StreamChunk};
pub use types::{Concept, ReasoningChain, ReasoningStep, Relationship, StepAction};
