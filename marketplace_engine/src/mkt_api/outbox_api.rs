use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OutboxPayload, OutboxTask},
    traits::{ChatManagement, MarketplaceError, NotificationSink, OutboxFilter, OutboxManagement, RetryPlan},
};

/// Exponential backoff for failed outbox tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub max_delay: Duration,
    pub max_attempts: i64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { base: Duration::from_secs(30), max_delay: Duration::from_secs(3600), max_attempts: 8 }
    }
}

impl RetryPolicy {
    /// Schedules the next attempt for a task that has already failed `attempts` times (not counting this failure).
    pub fn next_attempt(&self, attempts: i64, now: DateTime<Utc>) -> RetryPlan {
        let failures = attempts.saturating_add(1);
        if failures >= self.max_attempts {
            return RetryPlan::GiveUp;
        }
        let exponent = u32::try_from(attempts.clamp(0, 31)).unwrap_or(31);
        let delay = self.base.saturating_mul(2u32.saturating_pow(exponent)).min(self.max_delay);
        let delay = ChronoDuration::from_std(delay).unwrap_or_else(|_| ChronoDuration::days(365));
        RetryPlan::RetryAt(now + delay)
    }
}

/// What a single pass over the outbox did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxRunSummary {
    pub processed: usize,
    pub retried: usize,
    pub failed: usize,
}

impl OutboxRunSummary {
    pub fn is_empty(&self) -> bool {
        self.processed + self.retried + self.failed == 0
    }
}

/// `OutboxApi` delivers the side effects that were recorded alongside state changes: chat provisioning and
/// notifications.
pub struct OutboxApi<B, N> {
    db: B,
    sink: N,
    policy: RetryPolicy,
}

impl<B, N> Debug for OutboxApi<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OutboxApi ({:?})", self.policy)
    }
}

impl<B, N> OutboxApi<B, N> {
    pub fn new(db: B, sink: N, policy: RetryPolicy) -> Self {
        Self { db, sink, policy }
    }
}

impl<B, N> OutboxApi<B, N>
where
    B: OutboxManagement + ChatManagement,
    N: NotificationSink,
{
    pub async fn enqueue(&self, payload: OutboxPayload) -> Result<Option<OutboxTask>, MarketplaceError> {
        let task = self.db.enqueue_task(payload).await?;
        match &task {
            Some(t) => debug!("📮️ Task {} ({}) queued", t.id, t.idempotency_key),
            None => trace!("📮️ Task was already queued"),
        }
        Ok(task)
    }

    pub async fn list_tasks(&self, filter: OutboxFilter) -> Result<Vec<OutboxTask>, MarketplaceError> {
        self.db.fetch_tasks(filter).await
    }

    /// Runs up to `limit` due tasks, oldest first. A failing task never stops the rest of the batch.
    pub async fn process_due_tasks(&self, limit: i64) -> Result<OutboxRunSummary, MarketplaceError> {
        let now = Utc::now();
        let tasks = self.db.fetch_due_tasks(now, limit).await?;
        let mut summary = OutboxRunSummary::default();
        for task in tasks {
            match self.run_task(&task).await {
                Ok(()) => {
                    self.db.mark_task_processed(task.id).await?;
                    trace!("📮️ Task {} done", task.id);
                    summary.processed += 1;
                },
                Err(reason) => {
                    let plan = self.policy.next_attempt(task.attempts, Utc::now());
                    let updated = self.db.mark_task_failed(task.id, &reason, plan).await?;
                    match plan {
                        RetryPlan::RetryAt(at) => {
                            warn!("📮️ Task {} failed (attempt {}). Retrying at {at}. {reason}", task.id, updated.attempts);
                            summary.retried += 1;
                        },
                        RetryPlan::GiveUp => {
                            error!("📮️ Giving up on task {} after {} attempts. {reason}", task.id, updated.attempts);
                            summary.failed += 1;
                        },
                    }
                },
            }
        }
        if !summary.is_empty() {
            info!(
                "📮️ Outbox run: {} processed, {} retried, {} failed",
                summary.processed, summary.retried, summary.failed
            );
        }
        Ok(summary)
    }

    async fn run_task(&self, task: &OutboxTask) -> Result<(), String> {
        match &task.payload.0 {
            OutboxPayload::ProvisionChat { order_id } => match self.db.create_chat_for_order(*order_id).await {
                Ok(chat) => {
                    debug!("📮️ Chat {} provisioned for order {order_id}", chat.id);
                    Ok(())
                },
                // The order was deleted before the chat was needed
                Err(MarketplaceError::OrderNotFound(_)) => {
                    debug!("📮️ Order {order_id} no longer exists. Dropping chat provisioning.");
                    Ok(())
                },
                Err(e) => Err(e.to_string()),
            },
            OutboxPayload::Notify { notification } => self.sink.notify(notification).await.map_err(|e| e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy { base: Duration::from_secs(10), max_delay: Duration::from_secs(60), max_attempts: 5 }
    }

    #[test]
    fn backoff_doubles_and_is_capped() {
        let now = Utc::now();
        let delays = (0..4)
            .map(|attempts| match policy().next_attempt(attempts, now) {
                RetryPlan::RetryAt(at) => (at - now).num_seconds(),
                RetryPlan::GiveUp => -1,
            })
            .collect::<Vec<_>>();
        assert_eq!(delays, vec![10, 20, 40, 60]);
    }

    #[test]
    fn gives_up_at_max_attempts() {
        let now = Utc::now();
        assert_eq!(policy().next_attempt(4, now), RetryPlan::GiveUp);
        assert_eq!(policy().next_attempt(10, now), RetryPlan::GiveUp);
    }
}
