use async_trait::async_trait;

use crate::context::LoopContext;
use crate::message::Message;
use crate::types::ActorResult;

/// Actor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    Created,
    Running,
    Stopped,
}

/// A private state owner driven by an actor loop.
///
/// The loop calls these hooks from a single task, one at a time, so an
/// implementation mutates `self` freely without any lock. Nothing outside the
/// loop ever holds a reference to the actor.
#[async_trait]
pub trait Actor: Send + 'static {
    /// Payload type of inbound messages.
    type Payload: Send + 'static;
    /// Value returned to `ask` callers. `tell` discards it.
    type Reply: Send + 'static;

    /// Runs once before the first event is awaited.
    async fn started(&mut self, _ctx: &mut LoopContext) {}

    /// Applies one message to the actor's state.
    async fn handle(
        &mut self,
        msg: Message<Self::Payload>,
        ctx: &mut LoopContext,
    ) -> ActorResult<Self::Reply>;

    /// Periodic action run whenever the loop's timer fires.
    async fn tick(&mut self, _ctx: &mut LoopContext) {}

    /// Runs once after the loop has stopped receiving.
    async fn stopped(&mut self, _ctx: &mut LoopContext) {}
}
