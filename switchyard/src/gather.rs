//! Run a batch of futures concurrently and collect what they produce.
//!
//! [`scatter`] spawns every task at once, each publishing its output into a
//! channel buffered to the task count, so no task ever waits on the reader.
//! The channel closes after the last task has published.

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tracing::debug;

use switchyard_api::SetupError;

use crate::barrier::CompletionBarrier;
use crate::channel::{bounded, Receiver};

/// Spawns `tasks` and returns a receiver yielding their outputs in
/// completion order. A task that panics contributes no output.
pub fn scatter<T>(tasks: Vec<BoxFuture<'static, T>>) -> Result<Receiver<T>, SetupError>
where
    T: Send + 'static,
{
    let runtime = Handle::try_current().map_err(|_| SetupError::NoRuntime)?;

    let (tx, rx) = bounded(tasks.len());
    let closer = tx.clone();
    let barrier = CompletionBarrier::new(tasks.len(), move || {
        closer.close();
    });

    debug!(tasks = tasks.len(), "scatter");
    for task in tasks {
        let tx = tx.clone();
        let token = barrier.token();
        runtime.spawn(async move {
            let value = task.await;
            // Capacity equals the task count, so this never waits.
            let _ = tx.send(value).await;
            token.complete();
        });
    }

    Ok(rx)
}

/// Runs `tasks` concurrently and returns every output once all are done.
pub async fn gather<T>(tasks: Vec<BoxFuture<'static, T>>) -> Result<Vec<T>, SetupError>
where
    T: Send + 'static,
{
    let rx = scatter(tasks)?;
    Ok(rx.drain().await)
}
