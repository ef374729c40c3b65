//! # Bounded Channel
//!
//! FIFO queue of fixed capacity with blocking send/receive and an explicit,
//! idempotent close. Built on `flume::bounded`, so a capacity of zero is a
//! true rendezvous: every send waits for a matching receive.
//!
//! ## Closing
//! flume closes a channel only when its last sender is dropped. The wrapper
//! keeps the one long-lived flume sender behind a mutex; `close()` takes it
//! out, after which receivers drain whatever is buffered and then observe
//! end-of-stream. Dropping every [`Sender`] has the same effect.
//!
//! A send that is already blocked when `close()` runs holds a temporary clone
//! of the flume sender and may still complete.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use futures::Stream;

use crate::error::{RecvTimeoutError, SendError, SendTimeoutError, TryRecvError, TrySendError};

struct Shared<T> {
    tx: Mutex<Option<flume::Sender<T>>>,
    closed: AtomicBool,
    capacity: usize,
}

impl<T> Shared<T> {
    fn close(&self) -> bool {
        let taken = self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.closed.store(true, Ordering::SeqCst);
        taken.is_some()
    }
}

/// Sending half of a bounded channel.
pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

/// Receiving half of a bounded channel. Clones compete for values; each value
/// is received exactly once.
pub struct Receiver<T> {
    rx: flume::Receiver<T>,
    capacity: usize,
}

/// Creates a bounded channel holding at most `capacity` values.
pub fn bounded<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = flume::bounded(capacity);
    let shared = Arc::new(Shared {
        tx: Mutex::new(Some(tx)),
        closed: AtomicBool::new(false),
        capacity,
    });
    (Sender { shared }, Receiver { rx, capacity })
}

impl<T> Sender<T> {
    /// Clones out the live flume sender, or `None` once closed.
    fn live(&self) -> Option<flume::Sender<T>> {
        self.shared
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sends a value, waiting while the channel is full.
    pub async fn send(&self, value: T) -> Result<(), SendError<T>> {
        let Some(tx) = self.live() else {
            return Err(SendError::Closed(value));
        };
        tx.send_async(value)
            .await
            .map_err(|flume::SendError(v)| self.lost(v))
    }

    /// Like [`send`](Self::send), but gives up after `timeout`. A timed-out
    /// value is withdrawn from the channel and dropped.
    pub async fn send_timeout(&self, value: T, timeout: Duration) -> Result<(), SendTimeoutError<T>> {
        let Some(tx) = self.live() else {
            return Err(SendTimeoutError::Closed(value));
        };
        match tokio::time::timeout(timeout, tx.send_async(value)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(flume::SendError(v))) => Err(match self.lost(v) {
                SendError::Closed(v) => SendTimeoutError::Closed(v),
                SendError::Disconnected(v) => SendTimeoutError::Disconnected(v),
            }),
            Err(_) => Err(SendTimeoutError::Timeout(timeout)),
        }
    }

    /// Sends without waiting.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        let Some(tx) = self.live() else {
            return Err(TrySendError::Closed(value));
        };
        tx.try_send(value).map_err(|e| match e {
            flume::TrySendError::Full(value) => TrySendError::Full {
                value,
                capacity: self.shared.capacity,
            },
            flume::TrySendError::Disconnected(v) => {
                if self.is_closed() {
                    TrySendError::Closed(v)
                } else {
                    TrySendError::Disconnected(v)
                }
            }
        })
    }

    fn lost(&self, value: T) -> SendError<T> {
        if self.is_closed() {
            SendError::Closed(value)
        } else {
            SendError::Disconnected(value)
        }
    }

    /// Closes the channel. Returns `true` for the call that closed it and
    /// `false` for every later call.
    pub fn close(&self) -> bool {
        self.shared.close()
    }

    /// A handle that can close the channel without keeping it open: once
    /// every `Sender` is dropped the channel disconnects as usual.
    pub(crate) fn closer(&self) -> Closer<T> {
        Closer {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// `true` once every receiver has been dropped.
    pub fn is_disconnected(&self) -> bool {
        self.live().map_or(true, |tx| tx.is_disconnected())
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Number of values currently buffered. Reads zero once closed; use the
    /// receiver's `len` to see what is left to drain.
    pub fn len(&self) -> usize {
        self.live().map_or(0, |tx| tx.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) struct Closer<T> {
    shared: Weak<Shared<T>>,
}

impl<T> Closer<T> {
    /// Same as [`Sender::close`]. A no-op once every sender is gone.
    pub(crate) fn close(&self) -> bool {
        self.shared.upgrade().is_some_and(|shared| shared.close())
    }
}

impl<T> Receiver<T> {
    /// Receives the next value, waiting while the channel is empty. Returns
    /// `None` once the channel is closed and drained.
    pub async fn recv(&self) -> Option<T> {
        self.rx.recv_async().await.ok()
    }

    /// Like [`recv`](Self::recv), bounded by `timeout`.
    pub async fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>, RecvTimeoutError> {
        tokio::time::timeout(timeout, self.recv())
            .await
            .map_err(|_| RecvTimeoutError::Timeout(timeout))
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.rx.try_recv().map_err(|e| match e {
            flume::TryRecvError::Empty => TryRecvError::Empty,
            flume::TryRecvError::Disconnected => TryRecvError::Closed,
        })
    }

    /// Receives until end-of-stream.
    pub async fn drain(&self) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(v) = self.recv().await {
            out.push(v);
        }
        out
    }

    /// `true` once the channel is closed, whether or not values remain buffered.
    pub fn is_closed(&self) -> bool {
        self.rx.is_disconnected()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Converts the receiver into a stream that ends at end-of-stream.
    pub fn into_stream(self) -> impl Stream<Item = T>
    where
        T: 'static,
    {
        self.rx.into_stream()
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("capacity", &self.shared.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("capacity", &self.capacity)
            .field("len", &self.rx.len())
            .finish()
    }
}
