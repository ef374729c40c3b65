#![allow(dead_code)]

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use switchyard::{Actor, ActorError, ActorResult, LoopContext, LoopJoinHandle, Message};

/// Upper bound for anything a test waits on, so a liveness bug fails the
/// test instead of hanging it.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Awaits `fut`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(TEST_TIMEOUT, fut)
        .await
        .expect("operation did not finish in time")
}

pub async fn wait_for(duration_millis: u64) {
    tokio::time::sleep(Duration::from_millis(duration_millis)).await;
}

/// Commands understood by [`Counter`].
#[derive(Debug, Clone)]
pub enum CounterCmd {
    Add(i64),
    Get,
    Fail,
    Panic,
    Stop,
}

/// Keeps a running total and a log of who sent what.
#[derive(Debug, Default)]
pub struct Counter {
    pub total: i64,
    pub senders: Vec<String>,
    pub ticks: u64,
    pub started: bool,
}

#[async_trait]
impl Actor for Counter {
    type Payload = CounterCmd;
    type Reply = i64;

    async fn started(&mut self, _ctx: &mut LoopContext) {
        self.started = true;
    }

    async fn handle(&mut self, msg: Message<CounterCmd>, ctx: &mut LoopContext) -> ActorResult<i64> {
        self.senders.push(msg.from().to_string());
        match msg.into_payload() {
            CounterCmd::Add(n) => self.total += n,
            CounterCmd::Get => {}
            CounterCmd::Fail => {
                return Err(ActorError::MessageHandlingError("refused".to_string()));
            }
            CounterCmd::Panic => panic!("counter exploded"),
            CounterCmd::Stop => ctx.stop(),
        }
        Ok(self.total)
    }

    async fn tick(&mut self, _ctx: &mut LoopContext) {
        self.ticks += 1;
    }
}

pub async fn join(handle: LoopJoinHandle) -> switchyard::LoopReport {
    handle
        .join_timeout(TEST_TIMEOUT)
        .await
        .expect("actor loop did not exit")
}
