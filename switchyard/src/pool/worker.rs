//! # Pool Worker
//!
//! One of the W identical workers of a pool. A worker owns nothing but its
//! loop variables; it is stateless between jobs.
//!
//! ## Core Algorithm
//! 1. Receive a job from the shared job queue
//! 2. Run the processor on it, catching any panic
//! 3. Publish exactly one outcome for the job on the shared result queue
//! 4. Repeat until the job queue is closed and drained
//!
//! A failed or panicking job becomes an `Err` outcome and the worker moves on.
//! The worker's [`CompletionToken`] is released when `run` returns, or while
//! unwinding if something outside the processor panics, so the pool's
//! barrier always sees it finish.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task;
use tracing::{debug, error, warn};

use switchyard_api::{Outcome, ProcessingError, Processor};

use crate::barrier::CompletionToken;
use crate::channel::{Receiver, Sender};
use crate::error::panic_message;

/// Status codes for worker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Parked on the job queue, waiting for the next job.
    Idle = 0,
    /// Running the processor or publishing an outcome.
    Processing = 1,
    /// The job queue was exhausted (or the results were abandoned) and the
    /// worker has exited.
    Finished = 2,
}

impl WorkerStatus {
    fn from_raw(raw: usize) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Processing,
            _ => Self::Finished,
        }
    }
}

/// Per-worker counters returned when the worker exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub id: usize,
    pub processed: usize,
    pub failed: usize,
}

pub(crate) struct Worker<J, R, P> {
    id: usize,
    jobs: Receiver<J>,
    results: Sender<Outcome<R>>,
    processor: Arc<P>,
    status: Arc<AtomicUsize>,
    token: CompletionToken,
    blocking: bool,
}

impl<J, R, P> fmt::Debug for Worker<J, R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("status", &WorkerStatus::from_raw(self.status.load(Ordering::Relaxed)))
            .finish()
    }
}

impl<J, R, P> Worker<J, R, P>
where
    J: Send + 'static,
    R: Send + 'static,
    P: Processor<J, R>,
{
    pub(crate) fn new(
        id: usize,
        jobs: Receiver<J>,
        results: Sender<Outcome<R>>,
        processor: Arc<P>,
        token: CompletionToken,
        blocking: bool,
    ) -> Self {
        Self {
            id,
            jobs,
            results,
            processor,
            status: Arc::new(AtomicUsize::new(WorkerStatus::Idle as usize)),
            token,
            blocking,
        }
    }

    /// Shared view of this worker's status for the pool handle.
    pub(crate) fn status(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.status)
    }

    fn set_status(&self, status: WorkerStatus) {
        self.status.store(status as usize, Ordering::Release);
    }

    /// Main worker loop
    pub(crate) async fn run(self) -> WorkerStats {
        let mut stats = WorkerStats {
            id: self.id,
            ..Default::default()
        };

        while let Some(job) = self.jobs.recv().await {
            self.set_status(WorkerStatus::Processing);

            let outcome = self.process(job).await;
            stats.processed += 1;
            if let Err(e) = &outcome {
                stats.failed += 1;
                warn!(worker = self.id, error = %e, "job failed");
            } else {
                debug!(worker = self.id, "job processed");
            }

            if self.results.send(outcome).await.is_err() {
                // Nobody will read any further outcome.
                warn!(worker = self.id, "result queue closed, worker exiting early");
                break;
            }
            self.set_status(WorkerStatus::Idle);
        }

        self.set_status(WorkerStatus::Finished);
        debug!(
            worker = self.id,
            processed = stats.processed,
            failed = stats.failed,
            "worker finished"
        );
        // Arrive only after this worker's last outcome has been handed over.
        self.token.complete();
        stats
    }

    async fn process(&self, job: J) -> Outcome<R> {
        if self.blocking {
            let processor = Arc::clone(&self.processor);
            return match task::spawn_blocking(move || processor.process(job)).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => Err(self.panicked(e.into_panic())),
                Err(e) => Err(ProcessingError::failed(e)),
            };
        }

        let processor = &self.processor;
        match panic::catch_unwind(AssertUnwindSafe(|| processor.process(job))) {
            Ok(outcome) => outcome,
            Err(payload) => Err(self.panicked(payload)),
        }
    }

    fn panicked(&self, payload: Box<dyn Any + Send>) -> ProcessingError {
        let reason = panic_message(payload);
        error!(worker = self.id, panic = %reason, "processor panicked");
        ProcessingError::Panicked(reason)
    }
}

pub(crate) fn read_status(raw: &AtomicUsize) -> WorkerStatus {
    WorkerStatus::from_raw(raw.load(Ordering::Acquire))
}
