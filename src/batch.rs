//! Running the engine over many documents.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

use crate::document::{ExtractionOutcome, SourceDocument};
use crate::engine::CoverEngine;
use crate::error::ExtractionError;

/// Extracts covers for a list of documents, one outcome per input, in input
/// order.
///
/// A failing document never affects its neighbours. With more than one
/// worker, documents are processed concurrently on scoped threads and the
/// results are put back in input order before returning.
#[derive(Clone)]
pub struct BatchRunner {
    engine: CoverEngine,
    workers: usize,
    timeout: Option<Duration>,
}

impl BatchRunner {
    pub fn new(engine: CoverEngine) -> Self {
        Self {
            engine,
            workers: 1,
            timeout: None,
        }
    }

    /// Process up to `workers` documents at once (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Fail any single document that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn run_all(&self, docs: &[SourceDocument]) -> Vec<ExtractionOutcome> {
        debug!(documents = docs.len(), workers = self.workers, "starting batch");
        if self.workers <= 1 || docs.len() <= 1 {
            return docs.iter().map(|doc| self.run_one(doc)).collect();
        }
        self.run_parallel(docs)
    }

    fn run_one(&self, doc: &SourceDocument) -> ExtractionOutcome {
        match self.timeout {
            Some(timeout) => self.engine.extract_with_timeout(doc, timeout),
            None => self.engine.extract(doc),
        }
    }

    fn run_parallel(&self, docs: &[SourceDocument]) -> Vec<ExtractionOutcome> {
        let (job_tx, job_rx): (Sender<usize>, Receiver<usize>) = unbounded();
        let (result_tx, result_rx): (Sender<(usize, ExtractionOutcome)>, _) = unbounded();

        for index in 0..docs.len() {
            let _ = job_tx.send(index);
        }
        drop(job_tx);

        let workers = self.workers.min(docs.len());
        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for index in job_rx {
                        let _ = result_tx.send((index, self.run_one(&docs[index])));
                    }
                });
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<ExtractionOutcome>> = vec![None; docs.len()];
        for (index, outcome) in result_rx {
            slots[index] = Some(outcome);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    warn!(index, "worker produced no result");
                    Err(ExtractionError::Internal("worker produced no result".into()))
                })
            })
            .collect()
    }
}
