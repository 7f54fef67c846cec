use thiserror::Error;

use crate::db_types::Notification;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("The notification sink has shut down")]
    SinkClosed,
    #[error("Notification was rejected. {0}")]
    Rejected(String),
}

/// The outbound notification channel (email, push or an in-app inbox). Delivery is fire-and-forget from the point of
/// view of the workflow; failures are retried by the outbox.
#[allow(async_fn_in_trait)]
pub trait NotificationSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}
