//! AMQP message loop: pulls deliveries, dispatches each through the
//! pipeline, and completes or abandons based on outcome.
//!
//! Back-pressure is expressed as channel QoS (`basic_qos` prefetch =
//! `max_in_flight`) plus an owning semaphore around the handler spawn, so
//! the broker never has more than `max_in_flight` unacknowledged
//! deliveries in flight at once — the AMQP-native equivalent of the
//! source's "batch of 5, 5s max wait" receive loop.

use std::sync::Arc;

use futures::StreamExt;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions};
use lapin::types::FieldTable;
use lapin::{Connection, ConnectionProperties};
use tokio::sync::{watch, Semaphore};

use crate::context::WorkerContext;
use crate::pipeline::process_message;

/// Waits until `shutdown` carries `true`.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|v| *v).await;
}

pub async fn run(ctx: Arc<WorkerContext>, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
    let Some(url) = ctx.config.broker_url.clone() else {
        tracing::warn!("broker connection not set; worker idle");
        wait_for_shutdown(&mut shutdown).await;
        return Ok(());
    };

    let conn = Connection::connect(&url, ConnectionProperties::default()).await?;
    let channel = conn.create_channel().await?;
    channel
        .basic_qos(ctx.config.max_in_flight as u16, BasicQosOptions::default())
        .await?;

    let mut consumer = channel
        .basic_consume(
            &ctx.config.queue_name,
            "speechpath-worker",
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await?;

    let permits = Arc::new(Semaphore::new(ctx.config.max_in_flight));

    loop {
        tokio::select! {
            _ = wait_for_shutdown(&mut shutdown) => {
                tracing::info!("message loop stopping; draining in-flight handlers");
                let _ = permits.acquire_many(ctx.config.max_in_flight as u32).await;
                break;
            }
            next = consumer.next() => {
                match next {
                    Some(Ok(delivery)) => {
                        let permit = permits.clone().acquire_owned().await?;
                        let ctx = ctx.clone();
                        tokio::spawn(async move {
                            let _permit = permit;
                            let payload = String::from_utf8_lossy(&delivery.data).into_owned();
                            match process_message(&ctx, &payload).await {
                                Ok(()) => {
                                    if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
                                        tracing::warn!(error = %e, "failed to ack delivery");
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!(error = %e, "message processing failed; abandoning");
                                    if let Err(e) = delivery.nack(BasicNackOptions { requeue: true, ..Default::default() }).await {
                                        tracing::warn!(error = %e, "failed to nack delivery");
                                    }
                                }
                            }
                        });
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "consumer stream error");
                    }
                    None => {
                        tracing::info!("consumer stream closed");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
