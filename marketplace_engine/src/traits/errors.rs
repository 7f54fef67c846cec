use thiserror::Error;

use crate::db_types::OrderStatusType;

/// The error type shared by every backend trait and engine API.
///
/// Variants fall into the classes the HTTP layer cares about: missing (or invisible) entities, permission failures,
/// state-machine conflicts, malformed requests, gateway failures and storage failures.
#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("Delivery {0} does not exist")]
    DeliveryNotFound(i64),
    #[error("Chat {0} does not exist")]
    ChatNotFound(i64),
    #[error("Message {0} does not exist")]
    MessageNotFound(i64),
    #[error("Review {0} does not exist")]
    ReviewNotFound(i64),
    #[error("Service {0} does not exist")]
    ServiceNotFound(i64),
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("File {0} is not part of this delivery")]
    FileNotFound(String),
    #[error("Forbidden. {0}")]
    Forbidden(String),
    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("The record was modified by another request. {0}")]
    StaleState(String),
    #[error("Not allowed in the current state. {0}")]
    StatusConflict(String),
    #[error("Invalid request. {0}")]
    InvalidRequest(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("The payment gateway is unavailable. {0}")]
    GatewayUnavailable(String),
    #[error("The payment gateway did not respond within {0} seconds")]
    GatewayTimeout(u64),
    #[error("Could not dispatch side effect. {0}")]
    DispatchError(String),
}

impl MarketplaceError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::OrderNotFound(_)
                | Self::PaymentNotFound(_)
                | Self::DeliveryNotFound(_)
                | Self::ChatNotFound(_)
                | Self::MessageNotFound(_)
                | Self::ReviewNotFound(_)
                | Self::ServiceNotFound(_)
                | Self::UserNotFound(_)
                | Self::FileNotFound(_)
        )
    }

    /// State-machine guards and uniqueness violations
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::IllegalTransition { .. } | Self::StaleState(_) | Self::StatusConflict(_) | Self::AlreadyExists(_)
        )
    }
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                MarketplaceError::AlreadyExists(db.message().to_string())
            },
            _ => MarketplaceError::DatabaseError(e.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for MarketplaceError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        MarketplaceError::DatabaseError(format!("Migration failed. {e}"))
    }
}
