//! Worker command implementations.

use custos_domain::SystemClock;
use custos_worker::{Worker, WorkerLoop};

use crate::cli::RunOnceArgs;
use crate::config::Config;
use crate::error::Result;
use crate::indexer::SessionIndexer;
use crate::output::Formatter;
use crate::Store;

/// Execute the run-once command.
///
/// Runs a single cycle, or with `--drain` keeps cycling until a cycle finds
/// the queue empty.
pub fn execute_run_once(
    args: RunOnceArgs,
    store: &mut Store,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let indexer = SessionIndexer::from_config(&config.memory);
    let mut worker = Worker::new(config.worker.clone(), indexer);

    loop {
        let cycle = worker.run_once(store, &SystemClock)?;
        println!("{}", formatter.format_cycle(&cycle)?);

        if !args.drain || cycle.is_idle() {
            break;
        }
    }

    tracing::debug!("{}", worker.metrics().summary());
    Ok(())
}

/// Execute the work command: run the worker loop until Ctrl+C.
pub async fn execute_work(store: &mut Store, config: &Config, formatter: &Formatter) -> Result<()> {
    let indexer = SessionIndexer::from_config(&config.memory);
    let mut worker = WorkerLoop::new(config.worker.clone(), indexer);

    println!(
        "{}",
        formatter.info(&format!(
            "Worker running every {}s (Ctrl+C to stop)",
            config.worker.poll_interval_secs
        ))
    );
    worker.run(store).await?;

    println!("{}", worker.metrics().summary());
    Ok(())
}
