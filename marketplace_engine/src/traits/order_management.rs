use mkt_common::MinorUnits;

use crate::{
    db_types::{NewOrder, Order, OrderStatusType, OutboxTask},
    traits::MarketplaceError,
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order and, in the same transaction, records a `ProvisionChat` outbox task for it.
    ///
    /// Returns the order and the outbox task so that the caller can try to provision the chat right away and mark the
    /// task as processed.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, OutboxTask), MarketplaceError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, MarketplaceError>;

    /// Fetches the orders where the given user is the buyer or the seller, newest first. `None` returns every order.
    async fn fetch_orders_for_user(&self, user_id: Option<i64>) -> Result<Vec<Order>, MarketplaceError>;

    /// Moves the order from `from` to `to`, but only if it is still in the `from` state.
    ///
    /// Callers must have validated the edge against the lifecycle table. If the order is no longer in `from`,
    /// [`MarketplaceError::StaleState`] is returned and nothing is written.
    async fn transition_order(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, MarketplaceError>;

    /// Changes the order amount, provided the order is still in `expected_status`.
    async fn update_order_amount(
        &self,
        order_id: i64,
        amount: MinorUnits,
        expected_status: OrderStatusType,
    ) -> Result<Order, MarketplaceError>;

    /// Deletes the order along with its chat, messages, payments and unprocessed outbox tasks, in one transaction.
    ///
    /// The delete only goes ahead if the order is still in `expected_status`, otherwise
    /// [`MarketplaceError::StaleState`] is returned. The deleted order is returned.
    async fn delete_order(&self, order_id: i64, expected_status: OrderStatusType) -> Result<Order, MarketplaceError>;
}
