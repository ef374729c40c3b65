//! A registry server whose user map is owned by one actor loop.
//!
//! Several clients register users concurrently. No lock guards the map: every
//! read and write goes through the loop's inbound queue. The loop logs a
//! heartbeat after each quiet second and stops gracefully on shutdown.
//!
//! ```text
//! cargo run --example registry_server
//! ```

use std::collections::HashMap;
use std::time::Duration;

use switchyard::logging;
use switchyard::{
    async_trait, Actor, ActorError, ActorLoop, ActorResult, LoopConfig, LoopContext, Message,
    TickMode,
};
use tracing::info;

#[derive(Debug)]
enum Command {
    Register { name: String },
    Lookup { name: String },
    Count,
}

#[derive(Debug)]
enum Reply {
    Registered,
    Found(Option<String>),
    Count(usize),
}

#[derive(Default)]
struct Registry {
    users: HashMap<String, String>,
}

#[async_trait]
impl Actor for Registry {
    type Payload = Command;
    type Reply = Reply;

    async fn started(&mut self, ctx: &mut LoopContext) {
        info!(loop_id = %ctx.id(), "registry online");
    }

    async fn handle(&mut self, msg: Message<Command>, _ctx: &mut LoopContext) -> ActorResult<Reply> {
        let (from, command) = msg.into_parts();
        match command {
            Command::Register { name } => {
                if self.users.contains_key(&name) {
                    return Err(ActorError::MessageHandlingError(format!(
                        "{name} is already registered"
                    )));
                }
                println!("{from} registered {name}");
                self.users.insert(name, from);
                Ok(Reply::Registered)
            }
            Command::Lookup { name } => Ok(Reply::Found(self.users.get(&name).cloned())),
            Command::Count => Ok(Reply::Count(self.users.len())),
        }
    }

    async fn tick(&mut self, ctx: &mut LoopContext) {
        info!(users = self.users.len(), handled = ctx.processed(), "registry idle");
    }

    async fn stopped(&mut self, _ctx: &mut LoopContext) {
        info!(users = self.users.len(), "registry stopped");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_default();

    let config = LoopConfig::default().with_tick(Duration::from_secs(1), TickMode::Idle);
    let server = ActorLoop::new(Registry::default(), &config)?;
    let handle = server.handle();
    let running = server.start()?;

    let mut clients = Vec::new();
    for client in ["alpha", "beta", "gamma"] {
        let handle = handle.clone();
        clients.push(tokio::spawn(async move {
            for n in 0..3 {
                let name = format!("user-{client}-{n}");
                handle.send(client, Command::Register { name }).await?;
            }
            Ok::<_, anyhow::Error>(())
        }));
    }
    for client in clients {
        client.await??;
    }

    // A duplicate is rejected without stopping the server.
    let duplicate = handle
        .ask("main", Command::Register { name: "user-alpha-0".to_string() })
        .await;
    println!("duplicate registration: {duplicate:?}");

    if let Reply::Found(owner) = handle.ask("main", Command::Lookup { name: "user-beta-1".to_string() }).await? {
        println!("user-beta-1 registered by {owner:?}");
    }
    if let Reply::Count(count) = handle.ask("main", Command::Count).await? {
        println!("{count} users registered");
    }

    // Let one idle tick go by before shutting down.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.shutdown();

    let report = running.join().await?;
    println!(
        "server exited ({:?}) after {} messages and {} ticks",
        report.exit, report.processed, report.ticks
    );
    Ok(())
}
