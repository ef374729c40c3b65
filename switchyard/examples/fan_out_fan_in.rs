//! Doubles the numbers 1 through 10 on three workers and prints the merged
//! results.
//!
//! ```text
//! cargo run --example fan_out_fan_in
//! ```

use std::thread;
use std::time::Duration;

use switchyard::logging;
use switchyard::{bounded, fan_in, fan_out_with, PoolConfig, ProcessingError};
use tracing::info;

const WORKERS: usize = 3;

fn double(job: u64) -> Result<u64, ProcessingError> {
    // Simulated work.
    thread::sleep(Duration::from_millis(100));
    Ok(job * 2)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_development();

    let (jobs_tx, jobs_rx) = bounded(10);
    // `double` sleeps, so it runs on the blocking thread pool.
    let config = PoolConfig::with_workers(WORKERS).blocking(true);
    let (results, pool) = fan_out_with(jobs_rx, &config, double)?;

    for job in 1..=10u64 {
        jobs_tx.send(job).await?;
    }
    jobs_tx.close();

    let merged = fan_in([results])?;
    while let Some(outcome) = merged.recv().await {
        match outcome {
            Ok(result) => println!("Final result: {result}"),
            Err(e) => println!("Job failed: {e}"),
        }
    }

    let report = pool.wait().await?;
    for worker in &report.workers {
        info!(worker = worker.id, processed = worker.processed, "worker summary");
    }
    Ok(())
}
