use serde::{Deserialize, Serialize};

use crate::db_types::{Notification, Order, OrderStatusType};

/// Published once, when a reconciled payment moves an order from `PENDING_PAYMENT` to `PAID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Published when an order is cancelled, refunded or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    /// The status the order had before it was annulled
    pub previous_status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order, previous_status: OrderStatusType) -> Self {
        Self { order, previous_status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDispatched {
    pub notification: Notification,
}

impl NotificationDispatched {
    pub fn new(notification: Notification) -> Self {
        Self { notification }
    }
}
