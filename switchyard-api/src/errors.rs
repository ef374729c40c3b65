//! # Dispatch Error Types
//!
//! Error families shared by the actor loop and the worker pool.
//!
//! - `ActorError`: an actor's handler could not apply a message
//! - `ProcessingError`: a worker's processor failed on one job
//! - `SetupError`: a pool, loop or merger was configured badly
//! - `DeliveryError`: a message could not reach its actor loop
//! - `AskError`: a request/reply exchange did not produce a reply
//!
//! Per-job and per-message failures are values, not panics: the pool turns
//! them into `Err` outcomes on the result stream and the loop logs them and
//! carries on.

use std::time::Duration;
use thiserror::Error;

/// Error returned by an actor's message handler.
#[derive(Error, Debug)]
pub enum ActorError {
    /// The handler rejected or failed to apply a message.
    #[error("Message handling failed: {0}")]
    MessageHandlingError(String),

    /// The actor loop is no longer running.
    #[error("Actor stopped")]
    Stopped,

    /// The handler panicked while applying a message.
    #[error("Actor panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single job inside a worker pool.
///
/// A worker that produces one of these keeps running and moves on to its
/// next job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("Job processing failed: {0}")]
    Failed(String),

    #[error("Job processing panicked: {0}")]
    Panicked(String),
}

impl ProcessingError {
    /// Shorthand for a `Failed` error built from anything displayable.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }
}

/// Invalid configuration, reported before anything is spawned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("Invalid worker count: {0} (at least one worker is required)")]
    InvalidWorkerCount(usize),

    #[error("No tokio runtime is available on the calling thread")]
    NoRuntime,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A message could not be handed to an actor loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The loop's shutdown signal has fired or the loop has exited.
    #[error("Actor loop has shut down")]
    Shutdown,

    /// The inbound queue stayed full for the whole send timeout.
    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors related to the ask (request/reply) pattern.
#[derive(Error, Debug)]
pub enum AskError {
    #[error("Failed to deliver ask message: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Actor loop exited before replying")]
    NoReply,

    #[error("Ask operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Actor processing failed: {0}")]
    Actor(ActorError),
}
