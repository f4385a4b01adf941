//! `keyed-task-queue` server binary.
//!
//! Configuration is read from the environment (and `.env`):
//! `TASK_QUEUE_HOST`, `TASK_QUEUE_PORT`, `TASK_QUEUE_MAX_CONCURRENCY`,
//! `TASK_QUEUE_WORKER_THREADS`. Log filtering follows `RUST_LOG`.

use anyhow::Context;
use tokio::net::TcpListener;

use keyed_task_queue::builders::build_scheduler;
use keyed_task_queue::config::AppConfig;
use keyed_task_queue::core::{AppResult, SleepExecutor};
use keyed_task_queue::gateway::{serve, wait_for_shutdown_signal};
use keyed_task_queue::runtime::TokioSpawner;
use keyed_task_queue::util::init_tracing;

fn main() -> AppResult<()> {
    init_tracing();
    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.worker_threads)
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> AppResult<()> {
    let scheduler = build_scheduler(
        &config.scheduler,
        SleepExecutor,
        TokioSpawner::current(),
        None,
    )?;

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("HTTP server running. Access it at: http://{addr}/");

    serve(listener, scheduler, async {
        match wait_for_shutdown_signal().await {
            Ok(()) => tracing::info!("shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handlers");
                std::future::pending::<()>().await;
            }
        }
    })
    .await
    .context("serving gateway")?;

    tracing::info!("server stopped");
    Ok(())
}
