//! Merges K receivers into one.
//!
//! One forwarder task per input moves values onto the shared output in the
//! order that input yields them. Values from different inputs interleave in
//! whatever order the forwarders win the output. A [`CompletionBarrier`] over
//! the K forwarders closes the output after the last of them has exhausted
//! its input, so the merged stream ends exactly once. With no inputs the
//! output is closed before `fan_in` returns.

use tokio::runtime::Handle;
use tracing::{debug, Instrument};

use switchyard_api::SetupError;

use crate::barrier::{CompletionBarrier, CompletionToken};
use crate::channel::{bounded, Receiver, Sender};
use crate::config::DispatchConfig;

/// Merges `streams` into an unbuffered output.
pub fn fan_in<T, I>(streams: I) -> Result<Receiver<T>, SetupError>
where
    T: Send + 'static,
    I: IntoIterator<Item = Receiver<T>>,
{
    fan_in_with(streams, DispatchConfig::default().default_output_capacity)
}

/// Merges `streams` into an output buffered to `output_capacity`.
pub fn fan_in_with<T, I>(streams: I, output_capacity: usize) -> Result<Receiver<T>, SetupError>
where
    T: Send + 'static,
    I: IntoIterator<Item = Receiver<T>>,
{
    let runtime = Handle::try_current().map_err(|_| SetupError::NoRuntime)?;
    let streams: Vec<_> = streams.into_iter().collect();

    let (output_tx, output_rx) = bounded(output_capacity);
    let closer = output_tx.clone();
    let barrier = CompletionBarrier::new(streams.len(), move || {
        closer.close();
    });

    debug!(inputs = streams.len(), "fan-in started");
    for (index, input) in streams.into_iter().enumerate() {
        let forward = forward(input, output_tx.clone(), barrier.token());
        runtime.spawn(forward.instrument(tracing::debug_span!("forwarder", index)));
    }

    Ok(output_rx)
}

async fn forward<T>(input: Receiver<T>, output: Sender<T>, token: CompletionToken) {
    let mut forwarded = 0usize;
    while let Some(value) = input.recv().await {
        if output.send(value).await.is_err() {
            debug!(forwarded, "output dropped, forwarder exiting");
            break;
        }
        forwarded += 1;
    }
    debug!(forwarded, "input exhausted");
    token.complete();
}
