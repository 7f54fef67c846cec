use chrono::{DateTime, Utc};

use crate::{
    db_types::{OutboxPayload, OutboxTask},
    traits::{MarketplaceError, OutboxFilter, RetryPlan},
};

#[allow(async_fn_in_trait)]
pub trait OutboxManagement {
    /// Records a task. If a task with the same idempotency key exists, nothing is written and `None` is returned.
    async fn enqueue_task(&self, payload: OutboxPayload) -> Result<Option<OutboxTask>, MarketplaceError>;

    /// Pending tasks whose `next_attempt_at` is not later than `now`, oldest first.
    async fn fetch_due_tasks(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<OutboxTask>, MarketplaceError>;

    async fn mark_task_processed(&self, task_id: i64) -> Result<(), MarketplaceError>;

    /// Records a failed attempt. The task is either rescheduled or given up on according to `plan`.
    async fn mark_task_failed(
        &self,
        task_id: i64,
        error: &str,
        plan: RetryPlan,
    ) -> Result<OutboxTask, MarketplaceError>;

    async fn fetch_tasks(&self, filter: OutboxFilter) -> Result<Vec<OutboxTask>, MarketplaceError>;
}
