//! Concurrent batch processing with bounded parallelism and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::result::ProcessedJobInfo;
use crate::pipeline::JobProcessor;
use crate::sink::ResultSink;

/// Stops a running batch between items.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one batch item.
#[derive(Debug)]
pub enum BatchOutcome {
    Processed(Box<ProcessedJobInfo>),
    Failed(String),
    /// Never started because the batch was cancelled.
    Cancelled,
}

impl BatchOutcome {
    pub fn result(&self) -> Option<&ProcessedJobInfo> {
        match self {
            BatchOutcome::Processed(info) => Some(info.as_ref()),
            _ => None,
        }
    }
}

/// Outcomes in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Processed(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Failed(_)))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, BatchOutcome::Cancelled))
    }

    pub fn results(&self) -> impl Iterator<Item = &ProcessedJobInfo> {
        self.outcomes.iter().filter_map(BatchOutcome::result)
    }

    fn count(&self, pred: impl Fn(&BatchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Runs a shared processor over many postings on the blocking pool.
pub struct BatchRunner {
    processor: Arc<JobProcessor>,
    concurrency: usize,
}

impl BatchRunner {
    /// Concurrency comes from the processor's `batch` configuration.
    pub fn new(processor: Arc<JobProcessor>) -> Self {
        let concurrency = processor.config().batch.concurrency.max(1);
        Self { processor, concurrency }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Process all texts, at most `concurrency` at a time.
    ///
    /// Cancellation is checked before each item starts; items already
    /// running finish normally.
    pub async fn run(&self, texts: Vec<String>, cancel: &CancelHandle) -> BatchReport {
        let total = texts.len();
        info!("Starting batch of {} postings with concurrency {}", total, self.concurrency);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<BatchOutcome>> = (0..total).map(|_| None).collect();

        for (index, text) in texts.into_iter().enumerate() {
            if cancel.is_cancelled() {
                slots[index] = Some(BatchOutcome::Cancelled);
                continue;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    slots[index] = Some(BatchOutcome::Failed(e.to_string()));
                    continue;
                }
            };

            if cancel.is_cancelled() {
                slots[index] = Some(BatchOutcome::Cancelled);
                continue;
            }

            let processor = Arc::clone(&self.processor);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let outcome = match processor.process(&text) {
                    Ok(info) => BatchOutcome::Processed(Box::new(info)),
                    Err(e) => {
                        warn!("Batch item {} failed: {}", index, e);
                        BatchOutcome::Failed(e.to_string())
                    }
                };
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!("Batch worker did not complete: {}", e),
            }
        }

        let report = BatchReport {
            outcomes: slots
                .into_iter()
                .map(|slot| slot.unwrap_or_else(|| BatchOutcome::Failed("worker task aborted".to_string())))
                .collect(),
        };

        info!(
            "Batch finished: {} processed, {} failed, {} cancelled",
            report.processed(),
            report.failed(),
            report.cancelled()
        );
        report
    }

    /// Run the batch and append every processed result to `sink` in input order.
    pub async fn run_into<S: ResultSink + ?Sized>(
        &self,
        texts: Vec<String>,
        cancel: &CancelHandle,
        sink: &mut S,
    ) -> Result<BatchReport> {
        let report = self.run(texts, cancel).await;
        for result in report.results() {
            sink.store(result)?;
        }
        sink.flush()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::JobscanConfig;
    use crate::sink::VecSink;
    use jobscan_ner::{EntityRecognizer, EntitySpan};

    fn runner() -> BatchRunner {
        BatchRunner::new(Arc::new(JobProcessor::new(JobscanConfig::default()).unwrap()))
    }

    fn texts() -> Vec<String> {
        vec![
            "Python developer, remote".to_string(),
            "".to_string(),
            "Java engineer with AWS experience".to_string(),
            "Rust and Go, hybrid in Hanoi".to_string(),
        ]
    }

    /// Cancels the batch the first time it is asked to recognize text.
    struct CancellingRecognizer(CancelHandle);

    impl EntityRecognizer for CancellingRecognizer {
        fn name(&self) -> &str {
            "cancelling"
        }

        fn recognize(&self, _text: &str) -> jobscan_ner::Result<Vec<EntitySpan>> {
            self.0.cancel();
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_outcomes_in_input_order() {
        let report = runner().with_concurrency(2).run(texts(), &CancelHandle::new()).await;

        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.processed(), 3);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.outcomes[1], BatchOutcome::Failed(_)));
        assert_eq!(report.outcomes[0].result().unwrap().original_text, "Python developer, remote");
        assert_eq!(report.outcomes[3].result().unwrap().original_text, "Rust and Go, hybrid in Hanoi");
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let cancel = CancelHandle::new();
        cancel.cancel();
        let report = runner().run(texts(), &cancel).await;
        assert_eq!(report.cancelled(), 4);
    }

    #[tokio::test]
    async fn test_cancel_between_items() {
        let cancel = CancelHandle::new();
        let processor = JobProcessor::new(JobscanConfig::default())
            .unwrap()
            .with_recognizer(Arc::new(CancellingRecognizer(cancel.clone())));
        let report = BatchRunner::new(Arc::new(processor))
            .with_concurrency(1)
            .run(texts(), &cancel)
            .await;

        assert!(report.outcomes[0].result().is_some());
        assert_eq!(report.cancelled(), 3);
    }

    #[tokio::test]
    async fn test_run_into_sink() {
        let mut sink = VecSink::new();
        let report = runner().run_into(texts(), &CancelHandle::new(), &mut sink).await.unwrap();
        assert_eq!(report.processed(), 3);
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.documents()[1]["original_text"], "Java engineer with AWS experience");
    }
}
