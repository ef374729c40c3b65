//! # Switchyard
//!
//! A small task-dispatch substrate on tokio: bounded channels with explicit
//! close, an actor loop that serializes access to private state, a worker
//! pool that fans one job stream out over W workers, a completion barrier,
//! and a merger that fans K streams back into one.
//!
//! ## Module Organization
//!
//! - [`channel`]: bounded FIFO queues with idempotent close
//! - [`signal`]: one-shot broadcast shutdown signal
//! - [`barrier`]: run-once completion callback after N arrivals
//! - [`actor`]: the actor loop and its handles
//! - [`pool`]: fan-out over a fixed set of workers
//! - [`fan_in`]: merging K receivers into one
//! - [`gather`]: concurrent futures collected through a buffered channel
//! - [`pipeline`]: producer, pool and merger wired together
//! - [`config`]: defaults and per-component overrides
//! - [`logging`]: tracing subscriber setup
//!
//! Every call that spawns work requires a tokio runtime on the calling
//! thread and returns [`SetupError::NoRuntime`] otherwise.

pub mod actor;
pub mod barrier;
pub mod channel;
pub mod config;
pub mod error;
pub mod fan_in;
pub mod gather;
pub mod logging;
pub mod pipeline;
pub mod pool;
pub mod signal;

#[doc(hidden)]
pub use tracing;

pub use async_trait::async_trait;

pub use actor::{ActorHandle, ActorLoop, ExitReason, LoopJoinHandle, LoopReport};
pub use barrier::{Arrival, CompletionBarrier, CompletionToken};
pub use channel::{bounded, Receiver, Sender};
pub use config::{DispatchConfig, LoopConfig, PoolConfig, TickMode};
pub use error::{RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError};
pub use fan_in::{fan_in, fan_in_with};
pub use gather::{gather, scatter};
pub use pipeline::{Collected, Pipeline, PipelineRun};
pub use pool::{
    fan_out, fan_out_with, fan_out_with_defaults, PoolHandle, PoolReport, WorkerStats,
    WorkerStatus,
};
pub use signal::ShutdownSignal;

pub use switchyard_api::{
    enumerate_tagged, infallible, Actor, ActorError, ActorResult, ActorState, AskError,
    DeliveryError, LoopContext, LoopId, Message, Outcome, ProcessingError, Processor, SetupError,
    Tagged,
};
