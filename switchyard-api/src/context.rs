use crate::types::LoopId;

/// Bookkeeping for one running actor loop.
///
/// The loop owns the context and lends it to every actor hook. Calling
/// [`stop`](LoopContext::stop) is how an actor ends its own loop: the loop
/// finishes the current event and exits instead of waiting again.
#[derive(Debug, Clone)]
pub struct LoopContext {
    id: LoopId,
    processed: u64,
    failed: u64,
    ticks: u64,
    stop_requested: bool,
}

impl LoopContext {
    pub fn new(id: LoopId) -> Self {
        Self {
            id,
            processed: 0,
            failed: 0,
            ticks: 0,
            stop_requested: false,
        }
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    /// Messages handled so far, failed ones included.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Messages whose handler returned an error.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Asks the loop to exit after the current event.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn is_stopping(&self) -> bool {
        self.stop_requested
    }

    /// Called by the loop after each handled message.
    pub fn record_message(&mut self, ok: bool) {
        self.processed += 1;
        if !ok {
            self.failed += 1;
        }
    }

    /// Called by the loop after each tick.
    pub fn record_tick(&mut self) {
        self.ticks += 1;
    }
}
