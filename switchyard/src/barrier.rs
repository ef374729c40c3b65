//! # Completion Barrier
//!
//! Counts down a fixed number of parties and runs one completion callback
//! exactly once, when the last party arrives. This is a join primitive, not a
//! mutex: it counts and protects no shared memory.
//!
//! ## Key Concepts
//! - The remaining count only ever decreases and reaches zero once. The
//!   decrement is a compare-and-swap loop, so two parties finishing in the
//!   same instant cannot both observe "last" and the count never wraps.
//! - Arrivals past zero are reported as [`Arrival::Overrun`] and never re-run
//!   the callback.
//! - [`CompletionToken`] arrives on drop, so a party that unwinds still
//!   counts toward completion.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::signal::ShutdownSignal;

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Result of one [`CompletionBarrier::arrive`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Other parties are still outstanding.
    Pending(usize),
    /// This arrival was the last one; the callback has run.
    Completed,
    /// The barrier had already completed. Nothing happened.
    Overrun,
}

struct Inner {
    parties: usize,
    remaining: AtomicUsize,
    on_complete: Mutex<Option<Callback>>,
    done: ShutdownSignal,
}

impl Inner {
    fn complete(&self) {
        let callback = self
            .on_complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(callback) = callback {
            callback();
        }
        self.done.fire();
    }
}

/// Fires a callback exactly once after `parties` arrivals.
#[derive(Clone)]
pub struct CompletionBarrier {
    inner: Arc<Inner>,
}

impl CompletionBarrier {
    /// Creates a barrier over `parties`. With zero parties the callback runs
    /// before this returns.
    pub fn new<F>(parties: usize, on_complete: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let barrier = Self {
            inner: Arc::new(Inner {
                parties,
                remaining: AtomicUsize::new(parties),
                on_complete: Mutex::new(Some(Box::new(on_complete))),
                done: ShutdownSignal::new(),
            }),
        };
        if parties == 0 {
            barrier.inner.complete();
        }
        barrier
    }

    /// A barrier with no callback, used only to wait on.
    pub fn counting(parties: usize) -> Self {
        Self::new(parties, || {})
    }

    /// Records one party's completion.
    pub fn arrive(&self) -> Arrival {
        let mut current = self.inner.remaining.load(Ordering::Acquire);
        loop {
            if current == 0 {
                warn!(parties = self.inner.parties, "completion barrier overrun");
                return Arrival::Overrun;
            }
            match self.inner.remaining.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let remaining = current - 1;
        if remaining == 0 {
            debug!(parties = self.inner.parties, "completion barrier reached");
            self.inner.complete();
            Arrival::Completed
        } else {
            Arrival::Pending(remaining)
        }
    }

    /// Hands out a guard that arrives exactly once, on drop at the latest.
    pub fn token(&self) -> CompletionToken {
        CompletionToken {
            barrier: Some(self.clone()),
        }
    }

    /// Waits until every party has arrived and the callback has returned.
    pub async fn wait(&self) {
        self.inner.done.fired().await
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining.load(Ordering::Acquire)
    }

    pub fn parties(&self) -> usize {
        self.inner.parties
    }

    pub fn is_complete(&self) -> bool {
        self.inner.done.is_fired()
    }
}

impl fmt::Debug for CompletionBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionBarrier")
            .field("parties", &self.inner.parties)
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// One party's share of a [`CompletionBarrier`].
#[derive(Debug)]
pub struct CompletionToken {
    barrier: Option<CompletionBarrier>,
}

impl CompletionToken {
    /// Arrives now instead of on drop.
    pub fn complete(mut self) -> Arrival {
        match self.barrier.take() {
            Some(barrier) => barrier.arrive(),
            None => Arrival::Overrun,
        }
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        if let Some(barrier) = self.barrier.take() {
            barrier.arrive();
        }
    }
}
