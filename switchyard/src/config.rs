use std::time::Duration;

use switchyard_api::errors::SetupError;

pub const DEFAULT_JOB_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

// --- Configuration Enums ---

/// How an actor loop's timer is re-armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickMode {
    /// The timer restarts after every event, so a tick means a full interval
    /// passed without any message.
    Idle,
    /// The timer fires on a fixed cadence regardless of traffic.
    Periodic,
}

// --- System Configuration ---

/// Defaults shared by every loop and pool built from one configuration.
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    /// Worker count used when a pool does not set one.
    pub default_pool_size: usize,

    /// Capacity of a pipeline's job queue.
    pub default_job_capacity: usize,

    /// Capacity of a pool's result queue. Zero is a rendezvous.
    pub default_result_capacity: usize,

    /// Capacity of an actor loop's inbound queue. Zero is a rendezvous.
    pub default_mailbox_capacity: usize,

    /// Interval of the actor loop's timer. `None` disables ticks.
    pub default_tick_interval: Option<Duration>,

    pub default_tick_mode: TickMode,

    /// Upper bound on how long a send to an actor loop may block.
    /// `None` waits for as long as the loop is alive.
    pub default_send_timeout: Option<Duration>,

    /// Capacity of a fan-in merger's output stream.
    pub default_output_capacity: usize,

    /// Whether pool processors run on tokio's blocking thread pool.
    pub default_blocking_processors: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_pool_size: num_cpus::get(),
            default_job_capacity: DEFAULT_JOB_QUEUE_CAPACITY,
            default_result_capacity: 0,
            default_mailbox_capacity: 0,
            default_tick_interval: Some(DEFAULT_TICK_INTERVAL),
            default_tick_mode: TickMode::Idle,
            default_send_timeout: Some(DEFAULT_SEND_TIMEOUT),
            default_output_capacity: 0,
            default_blocking_processors: false,
        }
    }
}

impl DispatchConfig {
    /// Applies system defaults wherever the loop config leaves a field unset.
    pub fn merge_with_loop_config(&self, loop_config: &LoopConfig) -> LoopConfig {
        LoopConfig {
            mailbox_capacity: loop_config.mailbox_capacity.or(Some(self.default_mailbox_capacity)),
            tick_interval: loop_config.tick_interval.or(Some(self.default_tick_interval)),
            tick_mode: loop_config.tick_mode.or(Some(self.default_tick_mode)),
            send_timeout: loop_config.send_timeout.or(Some(self.default_send_timeout)),
        }
    }

    /// Applies system defaults wherever the pool config leaves a field unset.
    pub fn merge_with_pool_config(&self, pool_config: &PoolConfig) -> PoolConfig {
        PoolConfig {
            workers: pool_config.workers.or(Some(self.default_pool_size)),
            job_capacity: pool_config.job_capacity.or(Some(self.default_job_capacity)),
            result_capacity: pool_config.result_capacity.or(Some(self.default_result_capacity)),
            blocking: pool_config.blocking.or(Some(self.default_blocking_processors)),
        }
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if self.default_pool_size == 0 {
            return Err(SetupError::InvalidConfig("default pool size is zero".to_string()));
        }
        if self.default_tick_interval == Some(Duration::ZERO) {
            return Err(SetupError::InvalidConfig("tick interval is zero".to_string()));
        }
        if self.default_send_timeout == Some(Duration::ZERO) {
            return Err(SetupError::InvalidConfig("send timeout is zero".to_string()));
        }
        Ok(())
    }
}

// --- Actor Loop Configuration ---

/// Per-loop overrides. Unset fields fall back to [`DispatchConfig`].
#[derive(Clone, Debug, Default)]
pub struct LoopConfig {
    pub mailbox_capacity: Option<usize>,

    /// `Some(None)` explicitly disables ticks.
    pub tick_interval: Option<Option<Duration>>,

    pub tick_mode: Option<TickMode>,

    /// `Some(None)` explicitly disables the send timeout.
    pub send_timeout: Option<Option<Duration>>,
}

impl LoopConfig {
    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = Some(capacity);
        self
    }

    pub fn with_tick(mut self, interval: Duration, mode: TickMode) -> Self {
        self.tick_interval = Some(Some(interval));
        self.tick_mode = Some(mode);
        self
    }

    pub fn without_tick(mut self) -> Self {
        self.tick_interval = Some(None);
        self
    }

    pub fn with_send_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Fully resolved settings, using [`DispatchConfig::default`] for gaps.
    pub(crate) fn resolve(&self) -> Result<ResolvedLoopConfig, SetupError> {
        self.resolve_with(&DispatchConfig::default())
    }

    /// Fully resolved settings, using `system` for gaps.
    pub(crate) fn resolve_with(&self, system: &DispatchConfig) -> Result<ResolvedLoopConfig, SetupError> {
        system.validate()?;
        let merged = system.merge_with_loop_config(self);
        let resolved = ResolvedLoopConfig {
            mailbox_capacity: merged.mailbox_capacity.unwrap_or_default(),
            tick_interval: merged.tick_interval.flatten(),
            tick_mode: merged.tick_mode.unwrap_or(TickMode::Idle),
            send_timeout: merged.send_timeout.flatten(),
        };
        if resolved.tick_interval == Some(Duration::ZERO) {
            return Err(SetupError::InvalidConfig("tick interval is zero".to_string()));
        }
        if resolved.send_timeout == Some(Duration::ZERO) {
            return Err(SetupError::InvalidConfig("send timeout is zero".to_string()));
        }
        Ok(resolved)
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ResolvedLoopConfig {
    pub mailbox_capacity: usize,
    pub tick_interval: Option<Duration>,
    pub tick_mode: TickMode,
    pub send_timeout: Option<Duration>,
}

// --- Worker Pool Configuration ---

/// Per-pool overrides. Unset fields fall back to [`DispatchConfig`].
#[derive(Clone, Debug, Default)]
pub struct PoolConfig {
    pub workers: Option<usize>,
    pub job_capacity: Option<usize>,
    pub result_capacity: Option<usize>,

    /// Run the processor on tokio's blocking thread pool instead of on the
    /// worker task. Needed for processors that block or burn CPU for long.
    pub blocking: Option<bool>,
}

impl PoolConfig {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: Some(workers),
            ..Default::default()
        }
    }

    pub fn result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = Some(capacity);
        self
    }

    pub fn job_capacity(mut self, capacity: usize) -> Self {
        self.job_capacity = Some(capacity);
        self
    }

    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = Some(blocking);
        self
    }

    pub(crate) fn resolve(&self) -> Result<ResolvedPoolConfig, SetupError> {
        self.resolve_with(&DispatchConfig::default())
    }

    /// Fully resolved settings, using `system` for gaps. Rejects a zero
    /// worker count before anything is spawned.
    pub(crate) fn resolve_with(&self, system: &DispatchConfig) -> Result<ResolvedPoolConfig, SetupError> {
        if self.workers == Some(0) {
            return Err(SetupError::InvalidWorkerCount(0));
        }
        system.validate()?;
        let merged = system.merge_with_pool_config(self);
        Ok(ResolvedPoolConfig {
            workers: merged.workers.unwrap_or(system.default_pool_size),
            job_capacity: merged.job_capacity.unwrap_or(system.default_job_capacity),
            result_capacity: merged.result_capacity.unwrap_or(system.default_result_capacity),
            blocking: merged.blocking.unwrap_or(system.default_blocking_processors),
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ResolvedPoolConfig {
    pub workers: usize,
    pub job_capacity: usize,
    pub result_capacity: usize,
    pub blocking: bool,
}
