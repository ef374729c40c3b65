//! # Actor Loop
//!
//! Serializes every read and write of an actor's private state through one
//! task, without any lock.
//!
//! ## Key Concepts
//! - The loop owns the actor. Callers hold an [`ActorHandle`], which can only
//!   enqueue messages and fire the shutdown signal.
//! - Each iteration waits on exactly one of three sources: an inbound
//!   message, the tick timer or the shutdown signal. `tokio::select!` picks
//!   uniformly at random among sources that are ready together, so none of
//!   them can starve the others.
//! - Reads go through the same queue as writes ([`ActorHandle::ask`]), so they
//!   are ordered with respect to every mutation.
//!
//! ## Shutdown
//! The loop exits when the shutdown signal fires, when the actor calls
//! [`LoopContext::stop`], when every handle is dropped, or when a handler
//! panics. On exit it fires the signal itself and closes its inbound queue,
//! so any later send fails with [`DeliveryError::Shutdown`] instead of
//! blocking.
//!
//! A send that returned `Ok` is never lost to a shutdown: after the signal
//! fires the loop still handles every envelope that made it into the queue
//! before the close. When the actor stopped itself or a handler panicked,
//! queued envelopes are dropped instead and pending asks observe
//! [`AskError::NoReply`].

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use switchyard_api::{
    Actor, ActorError, ActorResult, ActorState, AskError, DeliveryError, LoopContext, LoopId,
    Message, SetupError,
};

use crate::channel::{self, Receiver, Sender};
use crate::config::{DispatchConfig, LoopConfig, ResolvedLoopConfig, TickMode};
use crate::error::panic_message;
use crate::signal::ShutdownSignal;

/// What travels through an actor loop's inbound queue.
enum Envelope<A: Actor> {
    Tell(Message<A::Payload>),
    Ask(Message<A::Payload>, oneshot::Sender<ActorResult<A::Reply>>),
}

/// Why an actor loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The shutdown signal fired.
    Shutdown,
    /// The actor called [`LoopContext::stop`].
    Stopped,
    /// Every handle was dropped, so no message could ever arrive again.
    Disconnected,
    /// A handler panicked. The actor's state is no longer trusted.
    Panicked(String),
}

/// Summary returned by [`LoopJoinHandle::join`].
#[derive(Debug, Clone)]
pub struct LoopReport {
    pub id: LoopId,
    pub processed: u64,
    pub failed: u64,
    pub ticks: u64,
    pub exit: ExitReason,
}

/// Lifecycle state shared between a loop and its handles.
#[derive(Debug, Default)]
struct StateCell(AtomicU8);

impl StateCell {
    fn set(&self, state: ActorState) {
        let raw = match state {
            ActorState::Created => 0,
            ActorState::Running => 1,
            ActorState::Stopped => 2,
        };
        self.0.store(raw, Ordering::Release);
    }

    fn get(&self) -> ActorState {
        match self.0.load(Ordering::Acquire) {
            0 => ActorState::Created,
            1 => ActorState::Running,
            _ => ActorState::Stopped,
        }
    }
}

/// Cloneable address of an actor loop.
pub struct ActorHandle<A: Actor> {
    id: LoopId,
    inbox: Sender<Envelope<A>>,
    shutdown: ShutdownSignal,
    state: Arc<StateCell>,
    send_timeout: Option<Duration>,
}

impl<A: Actor> ActorHandle<A> {
    pub fn id(&self) -> LoopId {
        self.id
    }

    /// Sends `payload` on behalf of `from`.
    pub async fn send(&self, from: impl Into<String>, payload: A::Payload) -> Result<(), DeliveryError> {
        self.tell(Message::new(from, payload)).await
    }

    /// Enqueues a message, waiting while the inbound queue is full. With a
    /// zero-capacity queue this returns only once the loop has taken the
    /// message.
    pub async fn tell(&self, msg: Message<A::Payload>) -> Result<(), DeliveryError> {
        self.deliver(Envelope::Tell(msg)).await
    }

    /// Sends a message and waits for the actor's reply.
    pub async fn ask(&self, from: impl Into<String>, payload: A::Payload) -> Result<A::Reply, AskError> {
        let (tx, rx) = oneshot::channel();
        self.deliver(Envelope::Ask(Message::new(from, payload), tx)).await?;
        match rx.await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(AskError::Actor(e)),
            Err(_) => Err(AskError::NoReply),
        }
    }

    /// [`ask`](Self::ask), bounded by `timeout` end to end.
    pub async fn ask_timeout(
        &self,
        from: impl Into<String>,
        payload: A::Payload,
        timeout: Duration,
    ) -> Result<A::Reply, AskError> {
        time::timeout(timeout, self.ask(from, payload))
            .await
            .unwrap_or(Err(AskError::Timeout(timeout)))
    }

    async fn deliver(&self, envelope: Envelope<A>) -> Result<(), DeliveryError> {
        if self.shutdown.is_fired() {
            return Err(DeliveryError::Shutdown);
        }

        let attempt = async {
            tokio::select! {
                // A send that completed counts as delivered even if the
                // signal fired in the same instant.
                biased;
                res = self.inbox.send(envelope) => res.map_err(|_| DeliveryError::Shutdown),
                () = self.shutdown.fired() => Err(DeliveryError::Shutdown),
            }
        };

        let result = match self.send_timeout {
            Some(limit) => time::timeout(limit, attempt)
                .await
                .unwrap_or(Err(DeliveryError::Timeout(limit))),
            None => attempt.await,
        };
        if let Err(e) = &result {
            debug!(loop_id = %self.id, error = %e, "delivery failed");
        }
        result
    }

    /// Fires the loop's shutdown signal. Returns `true` for the call that
    /// fired it; later calls are no-ops.
    pub fn shutdown(&self) -> bool {
        let fired = self.shutdown.fire();
        if fired {
            info!(loop_id = %self.id, "shutdown requested");
        }
        fired
    }

    pub fn state(&self) -> ActorState {
        self.state.get()
    }

    pub fn mailbox_capacity(&self) -> usize {
        self.inbox.capacity()
    }

    /// `true` while the loop can still accept messages.
    pub fn is_alive(&self) -> bool {
        !self.shutdown.is_fired() && !self.inbox.is_disconnected()
    }
}

impl<A: Actor> Clone for ActorHandle<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inbox: self.inbox.clone(),
            shutdown: self.shutdown.clone(),
            state: Arc::clone(&self.state),
            send_timeout: self.send_timeout,
        }
    }
}

impl<A: Actor> fmt::Debug for ActorHandle<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorHandle")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .field("shutdown", &self.shutdown.is_fired())
            .finish()
    }
}

/// An actor together with its inbound queue, not yet running.
pub struct ActorLoop<A: Actor> {
    id: LoopId,
    actor: A,
    inbox: Receiver<Envelope<A>>,
    handle: ActorHandle<A>,
    config: ResolvedLoopConfig,
}

impl<A: Actor> ActorLoop<A> {
    /// Creates a loop with [`DispatchConfig::default`] filling unset fields.
    pub fn new(actor: A, config: &LoopConfig) -> Result<Self, SetupError> {
        Self::build(actor, config.resolve()?)
    }

    /// Creates a loop with `system` filling unset fields. `system` is
    /// validated first.
    pub fn with_defaults(actor: A, config: &LoopConfig, system: &DispatchConfig) -> Result<Self, SetupError> {
        Self::build(actor, config.resolve_with(system)?)
    }

    fn build(actor: A, config: ResolvedLoopConfig) -> Result<Self, SetupError> {
        let id = Uuid::new_v4();
        let (tx, rx) = channel::bounded(config.mailbox_capacity);
        let handle = ActorHandle {
            id,
            inbox: tx,
            shutdown: ShutdownSignal::new(),
            state: Arc::new(StateCell::default()),
            send_timeout: config.send_timeout,
        };
        Ok(Self {
            id,
            actor,
            inbox: rx,
            handle,
            config,
        })
    }

    pub fn id(&self) -> LoopId {
        self.id
    }

    /// A handle for sending to this loop. Messages sent before
    /// [`start`](Self::start) wait in the queue (or block, at capacity zero).
    pub fn handle(&self) -> ActorHandle<A> {
        self.handle.clone()
    }

    /// Spawns the loop on the current tokio runtime. Consumes the loop, so it
    /// can only be started once.
    pub fn start(self) -> Result<LoopJoinHandle, SetupError> {
        let runtime = Handle::try_current().map_err(|_| SetupError::NoRuntime)?;
        let id = self.id;
        let span = crate::loop_span!(id);
        let join = runtime.spawn(self.run().instrument(span));
        Ok(LoopJoinHandle { id, join })
    }

    async fn run(self) -> LoopReport {
        let ActorLoop {
            id,
            mut actor,
            inbox,
            handle,
            config,
        } = self;
        // The loop keeps no sender of its own, so dropping every handle
        // closes the queue.
        let ActorHandle {
            inbox: own_sender,
            shutdown,
            state,
            ..
        } = handle;
        let closer = own_sender.closer();
        drop(own_sender);

        let mut ctx = LoopContext::new(id);
        state.set(ActorState::Running);
        info!(
            mailbox_capacity = config.mailbox_capacity,
            tick_interval = ?config.tick_interval,
            "actor loop started"
        );
        actor.started(&mut ctx).await;

        // A disabled timer is never polled, so its deadline is irrelevant.
        let interval = config.tick_interval;
        let timer = time::sleep(interval.unwrap_or(Duration::from_secs(3600)));
        tokio::pin!(timer);

        let mut exit = loop {
            if ctx.is_stopping() {
                break ExitReason::Stopped;
            }

            tokio::select! {
                envelope = inbox.recv() => {
                    let Some(envelope) = envelope else {
                        break ExitReason::Disconnected;
                    };
                    if let Err(reason) = dispatch(&mut actor, envelope, &mut ctx).await {
                        break ExitReason::Panicked(reason);
                    }
                    if let (Some(every), TickMode::Idle) = (interval, config.tick_mode) {
                        timer.as_mut().reset(Instant::now() + every);
                    }
                }
                () = &mut timer, if interval.is_some() => {
                    actor.tick(&mut ctx).await;
                    ctx.record_tick();
                    if let Some(every) = interval {
                        let next = match config.tick_mode {
                            TickMode::Idle => Instant::now() + every,
                            TickMode::Periodic => timer.deadline() + every,
                        };
                        timer.as_mut().reset(next);
                    }
                }
                () = shutdown.fired() => break ExitReason::Shutdown,
            }
        };

        shutdown.fire();
        closer.close();
        if exit == ExitReason::Shutdown {
            if let Err(reason) = drain_delivered(&mut actor, &inbox, &mut ctx).await {
                exit = ExitReason::Panicked(reason);
            }
        }
        drop(inbox);

        if !matches!(exit, ExitReason::Panicked(_)) {
            actor.stopped(&mut ctx).await;
        }
        state.set(ActorState::Stopped);

        info!(
            processed = ctx.processed(),
            failed = ctx.failed(),
            ticks = ctx.ticks(),
            exit = ?exit,
            "actor loop stopped"
        );

        LoopReport {
            id,
            processed: ctx.processed(),
            failed: ctx.failed(),
            ticks: ctx.ticks(),
            exit,
        }
    }
}

/// Handles what was accepted before the queue closed. The queue is closed,
/// so this ends once in-flight sends have either landed or given up.
async fn drain_delivered<A: Actor>(
    actor: &mut A,
    inbox: &Receiver<Envelope<A>>,
    ctx: &mut LoopContext,
) -> Result<(), String> {
    let mut drained = 0usize;
    while !ctx.is_stopping() {
        let Some(envelope) = inbox.recv().await else {
            break;
        };
        dispatch(actor, envelope, ctx).await?;
        drained += 1;
    }
    if drained > 0 {
        debug!(drained, "handled messages delivered before shutdown");
    }
    Ok(())
}

/// Applies one envelope. `Err` carries a panic message.
async fn dispatch<A: Actor>(
    actor: &mut A,
    envelope: Envelope<A>,
    ctx: &mut LoopContext,
) -> Result<(), String> {
    let (msg, reply) = match envelope {
        Envelope::Tell(msg) => (msg, None),
        Envelope::Ask(msg, reply) => (msg, Some(reply)),
    };
    let from = msg.from().to_string();

    let outcome = AssertUnwindSafe(actor.handle(msg, ctx)).catch_unwind().await;
    match outcome {
        Ok(result) => {
            match &result {
                Ok(_) => debug!(from = %from, "message handled"),
                Err(e) => warn!(from = %from, error = %e, "message handler failed"),
            }
            ctx.record_message(result.is_ok());
            if let Some(reply) = reply {
                // The asker may have timed out and gone away.
                let _ = reply.send(result);
            }
            Ok(())
        }
        Err(payload) => {
            let reason = panic_message(payload);
            error!(from = %from, panic = %reason, "message handler panicked");
            ctx.record_message(false);
            if let Some(reply) = reply {
                let _ = reply.send(Err(ActorError::Panicked(reason.clone())));
            }
            Err(reason)
        }
    }
}

/// Join handle of a started loop.
#[derive(Debug)]
pub struct LoopJoinHandle {
    id: LoopId,
    join: JoinHandle<LoopReport>,
}

impl LoopJoinHandle {
    pub fn id(&self) -> LoopId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the loop to exit.
    pub async fn join(self) -> Result<LoopReport, ActorError> {
        self.join
            .await
            .map_err(|e| ActorError::Other(anyhow::anyhow!("actor loop {} task failed: {}", self.id, e)))
    }

    /// [`join`](Self::join), giving up after `timeout`.
    pub async fn join_timeout(self, timeout: Duration) -> Result<LoopReport, ActorError> {
        let id = self.id;
        time::timeout(timeout, self.join()).await.unwrap_or_else(|_| {
            Err(ActorError::Other(anyhow::anyhow!(
                "actor loop {} still running after {:?}",
                id,
                timeout
            )))
        })
    }
}
