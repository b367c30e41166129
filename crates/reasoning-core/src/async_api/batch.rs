//! Bounded-concurrency batch analysis.

use super::{analyze, AsyncReasoningApi};
use crate::error::ReasoningError;
use crate::result::AnalysisResult;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

impl AsyncReasoningApi {
    /// Analyse every text concurrently, at most `max_workers` at a time.
    ///
    /// The output has one record per input, in input order. A text that
    /// cannot be analysed (including a blank one) gets an error-shaped record.
    /// Dropping the returned future closes admission, so queued items never
    /// start. Items already running on the blocking pool still finish; their
    /// results are discarded.
    pub async fn process_batch<S>(&self, texts: Vec<S>, include_graph: bool) -> Vec<AnalysisResult>
    where
        S: Into<String>,
    {
        self.process_batch_with_progress(texts, include_graph, |_, _| {})
            .await
    }

    /// [`AsyncReasoningApi::process_batch`], calling `progress(completed,
    /// total)` once per finished item. `completed` grows by one per call and
    /// the last call reports `total`.
    pub async fn process_batch_with_progress<S, P>(
        &self,
        texts: Vec<S>,
        include_graph: bool,
        mut progress: P,
    ) -> Vec<AnalysisResult>
    where
        S: Into<String>,
        P: FnMut(usize, usize),
    {
        let total = texts.len();
        if total == 0 {
            return Vec::new();
        }

        let gate = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        // Declared after `tasks`, so it drops first: the gate is closed
        // before aborted tasks can release their permits.
        let _admission = CloseOnDrop(Arc::clone(&gate));

        for (index, text) in texts.into_iter().enumerate() {
            let api = Arc::clone(&self.api);
            let gate = Arc::clone(&gate);
            let text: String = text.into();

            tasks.spawn(async move {
                let outcome = match gate.acquire_owned().await {
                    Ok(permit) => {
                        let outcome = analyze(api, text, include_graph).await;
                        drop(permit);
                        outcome
                    }
                    Err(e) => Err(ReasoningError::processing("batch admission gate closed", e)),
                };
                let result = outcome.unwrap_or_else(|e| {
                    debug!(index, error = %e, "batch item failed");
                    AnalysisResult::failed(e)
                });
                (index, result)
            });
        }

        let mut slots: Vec<Option<AnalysisResult>> = vec![None; total];
        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!(error = %e, "batch task did not finish"),
            }
            completed += 1;
            progress(completed, total);
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| AnalysisResult::failed("batch task did not finish")))
            .collect()
    }
}

/// Closes the batch admission gate when dropped.
struct CloseOnDrop(Arc<Semaphore>);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        self.0.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ReasoningApi;
    use crate::domain::{ContentByType, Domain, DomainResult, Terminology};
    use crate::types::{Concept, ReasoningChain, Relationship};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Records how many extractions overlap in time.
    struct SlowDomain {
        active: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
        delay: Duration,
    }

    impl SlowDomain {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                started: AtomicUsize::new(0),
                delay,
            })
        }
    }

    impl Domain for SlowDomain {
        fn name(&self) -> &str {
            "slow"
        }

        fn extract_concepts(&self, _text: &str) -> DomainResult<Vec<Concept>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
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

    #[tokio::test]
    async fn test_order_preserved_and_errors_isolated() {
        let api = AsyncReasoningApi::new(ReasoningApi::new(None));
        let results = api
            .process_batch(vec!["Fever and Flu", "", "Headache and Migraine"], true)
            .await;

        assert_eq!(results.len(), 3);
        assert!(!results[0].is_error());
        assert!(results[1].is_error());
        assert!(!results[2].is_error());
        assert_eq!(results[0].concepts[0].text, "Fever");
        assert_eq!(results[2].concepts[0].text, "Headache");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let api = AsyncReasoningApi::new(ReasoningApi::new(None));
        assert!(api.process_batch(Vec::<String>::new(), true).await.is_empty());
    }

    #[tokio::test]
    async fn test_progress_reaches_total_once() {
        let api = AsyncReasoningApi::new(ReasoningApi::new(None));
        let mut calls = Vec::new();
        let texts: Vec<String> = (0..7).map(|i| format!("Item Number {i}")).collect();

        api.process_batch_with_progress(texts, false, |done, total| calls.push((done, total)))
            .await;

        assert_eq!(calls, (1..=7).map(|n| (n, 7)).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let domain = SlowDomain::new(Duration::from_millis(30));
        let api = AsyncReasoningApi::new(ReasoningApi::new(Some(domain.clone())))
            .with_max_workers(2)
            .unwrap();

        let texts: Vec<String> = (0..8).map(|i| format!("Text {i}")).collect();
        let results = api.process_batch(texts, false).await;

        assert_eq!(results.len(), 8);
        assert!(domain.peak.load(Ordering::SeqCst) <= 2);
        assert!(domain.peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dropped_batch_admits_nothing_new() {
        let domain = SlowDomain::new(Duration::from_millis(200));
        let api = AsyncReasoningApi::new(ReasoningApi::new(Some(domain.clone())))
            .with_max_workers(1)
            .unwrap();

        let texts: Vec<String> = (0..10).map(|i| format!("Text {i}")).collect();
        let dropped = tokio::time::timeout(Duration::from_millis(50), api.process_batch(texts, false)).await;
        assert!(dropped.is_err());

        // Long enough for the running item and any wrongly admitted one to start
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(domain.started.load(Ordering::SeqCst), 1);
        assert_eq!(domain.active.load(Ordering::SeqCst), 0);
    }
}
