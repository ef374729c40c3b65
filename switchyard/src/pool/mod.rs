//! Fan-out of one job stream over W identical workers.
//!
//! [`fan_out`] starts W workers that all pull from the same job queue and
//! push outcomes onto one shared result queue. A [`CompletionBarrier`] over
//! the W workers closes the result queue after the last worker has published
//! its last outcome, so a consumer reading the results sees exactly one
//! outcome per job followed by end-of-stream.
//!
//! # Blocking processors
//! By default a processor runs inline on its worker's task, so it must not
//! block: on a current-thread runtime a blocking processor stalls every other
//! task, producers and mergers included. Pools configured with
//! [`PoolConfig::blocking`] move each job onto tokio's blocking thread pool.
//!
//! # Shutdown
//! Pools have no stop operation. A pool drains when the producer closes the
//! job queue (or drops every sender). If the job queue is never closed the
//! workers stay idle and the result queue stays open.

mod worker;

use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use futures::future;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, Instrument};

use switchyard_api::{ActorError, Outcome, Processor, SetupError};

use crate::barrier::CompletionBarrier;
use crate::channel::{bounded, Receiver};
use crate::config::{DispatchConfig, PoolConfig, ResolvedPoolConfig};
use crate::{log_lifecycle, worker_span};

use self::worker::{read_status, Worker};
pub use self::worker::{WorkerStats, WorkerStatus};

/// Starts `workers` workers over `jobs` with an unbuffered result queue.
pub fn fan_out<J, R, P>(
    jobs: Receiver<J>,
    workers: usize,
    processor: P,
) -> Result<(Receiver<Outcome<R>>, PoolHandle), SetupError>
where
    J: Send + 'static,
    R: Send + 'static,
    P: Processor<J, R>,
{
    fan_out_with(jobs, &PoolConfig::with_workers(workers), processor)
}

/// Starts a pool as described by `config`, with [`DispatchConfig::default`]
/// filling unset fields.
///
/// Fails before spawning anything if the worker count is zero or no tokio
/// runtime is available.
pub fn fan_out_with<J, R, P>(
    jobs: Receiver<J>,
    config: &PoolConfig,
    processor: P,
) -> Result<(Receiver<Outcome<R>>, PoolHandle), SetupError>
where
    J: Send + 'static,
    R: Send + 'static,
    P: Processor<J, R>,
{
    spawn_pool(jobs, config.resolve()?, processor)
}

/// Like [`fan_out_with`], with `system` filling unset fields. `system` is
/// validated first.
pub fn fan_out_with_defaults<J, R, P>(
    jobs: Receiver<J>,
    config: &PoolConfig,
    system: &DispatchConfig,
    processor: P,
) -> Result<(Receiver<Outcome<R>>, PoolHandle), SetupError>
where
    J: Send + 'static,
    R: Send + 'static,
    P: Processor<J, R>,
{
    spawn_pool(jobs, config.resolve_with(system)?, processor)
}

pub(crate) fn spawn_pool<J, R, P>(
    jobs: Receiver<J>,
    config: ResolvedPoolConfig,
    processor: P,
) -> Result<(Receiver<Outcome<R>>, PoolHandle), SetupError>
where
    J: Send + 'static,
    R: Send + 'static,
    P: Processor<J, R>,
{
    let pool_size = config.workers;
    let runtime = Handle::try_current().map_err(|_| SetupError::NoRuntime)?;

    let (results_tx, results_rx) = bounded(config.result_capacity);
    let closer = results_tx.clone();
    let barrier = CompletionBarrier::new(pool_size, move || {
        closer.close();
    });

    let processor = Arc::new(processor);
    let mut statuses = Vec::with_capacity(pool_size);
    let mut tasks = Vec::with_capacity(pool_size);

    for id in 0..pool_size {
        let worker = Worker::new(
            id,
            jobs.clone(),
            results_tx.clone(),
            Arc::clone(&processor),
            barrier.token(),
            config.blocking,
        );
        statuses.push(worker.status());
        tasks.push(runtime.spawn(worker.run().instrument(worker_span!(id))));
    }
    // Workers hold the only remaining handles on both queues.
    drop(results_tx);
    drop(jobs);

    log_lifecycle!(
        "pool",
        format!("{pool_size} workers"),
        "started",
        blocking = config.blocking
    );

    Ok((
        results_rx,
        PoolHandle {
            pool_size,
            statuses,
            tasks,
            barrier,
        },
    ))
}

/// Summary of a drained pool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: Vec<WorkerStats>,
}

impl PoolReport {
    pub fn processed(&self) -> usize {
        self.workers.iter().map(|w| w.processed).sum()
    }

    pub fn failed(&self) -> usize {
        self.workers.iter().map(|w| w.failed).sum()
    }
}

/// Observes a running pool. Dropping it does not stop the workers.
pub struct PoolHandle {
    pool_size: usize,
    statuses: Vec<Arc<AtomicUsize>>,
    tasks: Vec<JoinHandle<WorkerStats>>,
    barrier: CompletionBarrier,
}

impl PoolHandle {
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Current status of every worker, indexed by worker id.
    pub fn statuses(&self) -> Vec<WorkerStatus> {
        self.statuses.iter().map(|s| read_status(s)).collect()
    }

    /// True once every worker has exited and the result queue is closed.
    pub fn is_finished(&self) -> bool {
        self.barrier.is_complete()
    }

    /// Waits for every worker to exit.
    pub async fn wait(self) -> Result<PoolReport, ActorError> {
        let joined = future::join_all(self.tasks).await;
        let mut workers = Vec::with_capacity(joined.len());
        for result in joined {
            match result {
                Ok(stats) => workers.push(stats),
                Err(e) if e.is_panic() => {
                    error!(error = %e, "worker task panicked");
                    return Err(ActorError::Panicked(e.to_string()));
                }
                Err(e) => return Err(ActorError::Other(anyhow!("worker task failed: {e}"))),
            }
        }
        log_lifecycle!("pool", format!("{} workers", self.pool_size), "drained");
        Ok(PoolReport { workers })
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`. The workers
    /// keep running if the timeout elapses.
    pub async fn wait_timeout(self, timeout: Duration) -> Result<PoolReport, ActorError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| ActorError::Other(anyhow!("pool still running after {timeout:?}")))?
    }
}

impl fmt::Debug for PoolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHandle")
            .field("pool_size", &self.pool_size)
            .field("statuses", &self.statuses())
            .field("finished", &self.is_finished())
            .finish()
    }
}
