use std::any::Any;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use switchyard_api::errors::{ActorError, AskError, DeliveryError, ProcessingError, SetupError};

/// Errors returned by [`Sender::send`](crate::channel::Sender::send) and
/// friends. Every variant hands the undelivered value back to the caller.
#[derive(Error, PartialEq, Eq)]
pub enum SendError<T> {
    #[error("Channel is closed")]
    Closed(T),
    #[error("All receivers have been dropped")]
    Disconnected(T),
}

impl<T> SendError<T> {
    /// Recovers the value that could not be sent.
    pub fn into_inner(self) -> T {
        match self {
            Self::Closed(v) | Self::Disconnected(v) => v,
        }
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed(_) => f.write_str("Closed(..)"),
            Self::Disconnected(_) => f.write_str("Disconnected(..)"),
        }
    }
}

/// Errors returned by [`Sender::send_timeout`](crate::channel::Sender::send_timeout).
/// A timed-out value has already been dropped, so only the other variants
/// carry it back.
#[derive(Error, PartialEq, Eq)]
pub enum SendTimeoutError<T> {
    #[error("Send timed out after {0:?}")]
    Timeout(Duration),
    #[error("Channel is closed")]
    Closed(T),
    #[error("All receivers have been dropped")]
    Disconnected(T),
}

impl<T> SendTimeoutError<T> {
    pub fn into_inner(self) -> Option<T> {
        match self {
            Self::Timeout(_) => None,
            Self::Closed(v) | Self::Disconnected(v) => Some(v),
        }
    }
}

impl<T> fmt::Debug for SendTimeoutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(d) => write!(f, "Timeout({d:?})"),
            Self::Closed(_) => f.write_str("Closed(..)"),
            Self::Disconnected(_) => f.write_str("Disconnected(..)"),
        }
    }
}

/// Errors returned by [`Sender::try_send`](crate::channel::Sender::try_send).
#[derive(Error, PartialEq, Eq)]
pub enum TrySendError<T> {
    #[error("Channel is full (capacity: {capacity})")]
    Full { value: T, capacity: usize },
    #[error("Channel is closed")]
    Closed(T),
    #[error("All receivers have been dropped")]
    Disconnected(T),
}

impl<T> TrySendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Full { value, .. } | Self::Closed(value) | Self::Disconnected(value) => value,
        }
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full { capacity, .. } => write!(f, "Full {{ capacity: {capacity} }}"),
            Self::Closed(_) => f.write_str("Closed(..)"),
            Self::Disconnected(_) => f.write_str("Disconnected(..)"),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvTimeoutError {
    #[error("Receive timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    #[error("Channel is empty")]
    Empty,
    #[error("Channel is closed and drained")]
    Closed,
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(s) => s.to_string(),
            Err(_) => "unknown panic".to_string(),
        },
    }
}
