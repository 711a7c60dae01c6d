//! Speech-therapy inference worker.
//!
//! Consumes audio-submission messages from a queue, runs phoneme-level
//! acoustic analysis and emotion detection, scores and persists a feedback
//! report, updates the child's curriculum, and tracks phoneme-distribution
//! drift. `/health` and `/metrics` are served over HTTP alongside the
//! message loop.

mod broker;
mod config;
mod context;
mod curriculum;
mod drift;
mod error;
mod http;
mod lexicon;
mod metrics;
mod persistence;
mod pipeline;
mod scorer;

use std::io;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::WorkerConfig;
use context::WorkerContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = WorkerConfig::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(cfg.log_level.clone()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::info!("speechpath worker starting");

    let ctx = Arc::new(WorkerContext::build(cfg).await?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_task = tokio::spawn(http::serve(ctx.clone(), shutdown_rx.clone()));
    let broker_task = tokio::spawn(broker::run(ctx.clone(), shutdown_rx));

    wait_for_termination().await;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    let (http_result, broker_result) = tokio::join!(http_task, broker_task);
    http_result??;
    broker_result??;

    tracing::info!("speechpath worker stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigterm.recv() => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    let _ = tokio::signal::ctrl_c().await;
}
