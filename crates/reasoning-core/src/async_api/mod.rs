//! Async execution layer over [`ReasoningApi`].
//!
//! The pipeline itself is synchronous and CPU-bound, so every document runs on
//! tokio's blocking pool. On top of that sit three entry points:
//!
//! - [`AsyncReasoningApi::process_stream`] chunks an incoming text stream with
//!   overlap and yields one record per chunk, in order
//! - [`AsyncReasoningApi::process_batch`] analyses many texts with at most
//!   `max_workers` in flight, keeping input order
//! - [`AsyncReasoningApi::merge_stream_results`] folds chunk records into a
//!   single deduplicated result with a fresh graph

mod batch;
mod merge;
mod stream;

pub use merge::{merge_results, ResultMerger};
pub use stream::Chunker;

use crate::api::ReasoningApi;
use crate::domain::{DomainInfo, DomainRef};
use crate::error::{ReasoningError, Result};
use crate::result::AnalysisResult;
use std::sync::Arc;

#[derive(Clone)]
pub struct AsyncReasoningApi {
    api: Arc<ReasoningApi>,
    max_workers: usize,
}

impl AsyncReasoningApi {
    /// Wrap `api`; the batch admission limit comes from its config.
    pub fn new(api: ReasoningApi) -> Self {
        let max_workers = api.config().max_workers.max(1);
        Self {
            api: Arc::new(api),
            max_workers,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Result<Self> {
        if max_workers == 0 {
            return Err(ReasoningError::invalid_input("max_workers must be at least 1"));
        }
        self.max_workers = max_workers;
        Ok(self)
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn api(&self) -> &ReasoningApi {
        &self.api
    }

    /// Swap the domain. Requires exclusive access, so it cannot race a stream
    /// borrowed from this instance; batch tasks already running keep the
    /// domain they started with.
    pub fn set_domain(&mut self, domain: DomainRef) {
        Arc::make_mut(&mut self.api).set_domain(domain);
    }

    pub fn domain_info(&self) -> DomainInfo {
        self.api.domain_info()
    }

    /// [`ReasoningApi::process_text`] on the blocking pool.
    pub async fn process_text_async(&self, text: &str, include_graph: bool) -> Result<AnalysisResult> {
        analyze(Arc::clone(&self.api), text.to_owned(), include_graph).await
    }
}

async fn analyze(api: Arc<ReasoningApi>, text: String, include_graph: bool) -> Result<AnalysisResult> {
    tokio::task::spawn_blocking(move || api.process_text(&text, include_graph))
        .await
        .map_err(|e| ReasoningError::processing("analysis worker failed", e))?
}
