//! # Switchyard API
//!
//! Runtime-free vocabulary for the switchyard task-dispatch substrate. Nothing
//! in this crate spawns, blocks or owns a queue; it only names the pieces that
//! the `switchyard` runtime moves around.
//!
//! ## Core Components
//!
//! - **Actors**: state owners driven one message at a time by an actor loop
//! - **Messages**: immutable sender + payload values delivered exactly once
//! - **Processors**: per-job functions run by the workers of a pool
//! - **Errors**: delivery, processing and setup failures
//!
//! ## Module Organization
//!
//! - [`actor`]: The `Actor` trait and lifecycle state
//! - [`context`]: Per-loop bookkeeping handed to every actor hook
//! - [`message`]: Message definitions
//! - [`processor`]: Job processing functions
//! - [`errors`]: Error types
//! - [`types`]: Common type definitions

pub mod actor;
pub mod context;
pub mod errors;
pub mod message;
pub mod processor;
pub mod types;

pub use actor::{Actor, ActorState};
pub use context::LoopContext;
pub use errors::{ActorError, AskError, DeliveryError, ProcessingError, SetupError};
pub use message::Message;
pub use processor::{infallible, Processor};
pub use types::{enumerate_tagged, ActorResult, LoopId, Outcome, Tagged};
