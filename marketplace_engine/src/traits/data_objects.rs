use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Chat, Message};

/// A chat in a participant's inbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    #[serde(flatten)]
    pub chat: Chat,
    pub last_message: Option<Message>,
    /// Messages from the counterpart that the caller has not read yet
    pub unread_count: i64,
}

/// Selects outbox rows for inspection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxFilter {
    /// Not yet processed and not given up on
    #[default]
    Pending,
    /// Gave up after the maximum number of attempts
    Failed,
    /// Everything
    All,
}

/// The scheduling decision for a failed outbox task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPlan {
    RetryAt(DateTime<Utc>),
    GiveUp,
}
