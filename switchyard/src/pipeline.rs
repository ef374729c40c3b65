//! Producer, pool and merger wired together.
//!
//! ```text
//! jobs ──▶ [job queue] ──▶ W workers ──▶ [result queue] ──▶ fan-in ──▶ output
//! ```
//!
//! The producer closes the job queue after the last job, the pool's barrier
//! closes the result queue after the last worker, and the merger closes the
//! output after the result queue ends. Reading `output` to the end therefore
//! yields exactly one outcome per job.

use tokio::runtime::Handle;
use tracing::{debug, warn, Instrument};

use switchyard_api::{ActorError, Outcome, Processor, SetupError};

use crate::channel::{bounded, Receiver};
use crate::config::{DispatchConfig, PoolConfig};
use crate::fan_in::fan_in_with;
use crate::pool::{spawn_pool, PoolHandle, PoolReport};

/// Builder for a fan-out/fan-in run.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pool: PoolConfig,
    output_capacity: Option<usize>,
    system: DispatchConfig,
}

impl Pipeline {
    pub fn new(workers: usize) -> Self {
        Self {
            pool: PoolConfig::with_workers(workers),
            ..Default::default()
        }
    }

    /// Uses `system` for every setting not set on this builder.
    pub fn with_defaults(mut self, system: DispatchConfig) -> Self {
        self.system = system;
        self
    }

    pub fn job_capacity(mut self, capacity: usize) -> Self {
        self.pool = self.pool.job_capacity(capacity);
        self
    }

    pub fn result_capacity(mut self, capacity: usize) -> Self {
        self.pool = self.pool.result_capacity(capacity);
        self
    }

    pub fn output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = Some(capacity);
        self
    }

    /// See [`PoolConfig::blocking`].
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.pool = self.pool.blocking(blocking);
        self
    }

    /// Starts the pool, the merger and a producer feeding `jobs`.
    pub fn run<I, J, R, P>(&self, jobs: I, processor: P) -> Result<PipelineRun<R>, SetupError>
    where
        I: IntoIterator<Item = J>,
        I::IntoIter: Send + 'static,
        J: Send + 'static,
        R: Send + 'static,
        P: Processor<J, R>,
    {
        let runtime = Handle::try_current().map_err(|_| SetupError::NoRuntime)?;

        let config = self.pool.resolve_with(&self.system)?;
        let output_capacity = self
            .output_capacity
            .unwrap_or(self.system.default_output_capacity);

        let (job_tx, job_rx) = bounded(config.job_capacity);
        let (results, pool) = spawn_pool(job_rx, config, processor)?;
        let output = fan_in_with([results], output_capacity)?;

        let jobs = jobs.into_iter();
        let producer = async move {
            let mut sent = 0usize;
            for job in jobs {
                if job_tx.send(job).await.is_err() {
                    warn!(sent, "job queue closed early, producer stopping");
                    break;
                }
                sent += 1;
            }
            job_tx.close();
            debug!(sent, "producer finished");
        };
        runtime.spawn(producer.instrument(tracing::debug_span!("producer")));

        Ok(PipelineRun { output, pool })
    }
}

/// A running pipeline.
#[derive(Debug)]
pub struct PipelineRun<R> {
    /// Merged outcomes, one per job, closed after the last.
    pub output: Receiver<Outcome<R>>,
    pub pool: PoolHandle,
}

/// Everything a pipeline produced.
#[derive(Debug)]
pub struct Collected<R> {
    pub outcomes: Vec<Outcome<R>>,
    pub report: PoolReport,
}

impl<R> Collected<R> {
    /// Successful results, in arrival order.
    pub fn successes(&self) -> impl Iterator<Item = &R> {
        self.outcomes.iter().filter_map(|o| o.as_ref().ok())
    }
}

impl<R> PipelineRun<R> {
    /// Drains the output and waits for the pool to finish.
    pub async fn collect(self) -> Result<Collected<R>, ActorError> {
        let outcomes = self.output.drain().await;
        let report = self.pool.wait().await?;
        Ok(Collected { outcomes, report })
    }
}
