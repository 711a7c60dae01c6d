//! `/health` and `/metrics`, served alongside the message loop in the same
//! process.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::context::WorkerContext;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    asr_loaded: bool,
    ser_loaded: bool,
}

async fn health(State(ctx): State<Arc<WorkerContext>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        asr_loaded: ctx.backend.asr_loaded(),
        ser_loaded: ctx.backend.ser_loaded(),
    })
}

async fn metrics(State(ctx): State<Arc<WorkerContext>>) -> impl IntoResponse {
    ctx.metrics.encode()
}

pub fn router(ctx: Arc<WorkerContext>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(ctx)
}

pub async fn serve(ctx: Arc<WorkerContext>, mut shutdown: tokio::sync::watch::Receiver<bool>) -> anyhow::Result<()> {
    let bind = ctx.config.http_bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(addr = %bind, "serving /health and /metrics");
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|v| *v).await;
        })
        .await?;
    Ok(())
}
