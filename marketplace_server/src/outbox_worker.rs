use log::*;
use marketplace_engine::{events::EventProducers, OutboxApi, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::config::OutboxConfig;

/// Starts the outbox worker, which retries chat provisioning and notification delivery until they succeed or run out
/// of attempts. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_outbox_worker(db: SqliteDatabase, producers: EventProducers, config: OutboxConfig) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(config.poll_interval);
        let api = OutboxApi::new(db, producers, config.retry_policy);
        info!("📮️ Outbox worker started. Polling every {}s", config.poll_interval.as_secs());
        loop {
            timer.tick().await;
            trace!("📮️ Running outbox job");
            match api.process_due_tasks(config.batch_size).await {
                Ok(summary) if summary.is_empty() => trace!("📮️ Nothing due in the outbox"),
                Ok(summary) => {
                    info!(
                        "📮️ Outbox run complete. {} processed, {} rescheduled, {} given up",
                        summary.processed, summary.retried, summary.failed
                    );
                },
                Err(e) => {
                    error!("📮️ Error running outbox job: {e}");
                },
            }
        }
    })
}
