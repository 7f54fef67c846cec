use crate::{
    db_types::{Delivery, DeliveryEdit, NewDelivery, Order, OrderStatusType},
    traits::MarketplaceError,
};

/// Storage for the delivery workflow.
///
/// Each state-changing method updates the delivery, the owning order and the notification outbox in one transaction.
#[allow(async_fn_in_trait)]
pub trait DeliveryManagement {
    /// Moves the order from `order_status` to `DELIVERED`, stores the delivery and queues a `DELIVERY_RECEIVED`
    /// notification for the buyer.
    async fn insert_delivery(
        &self,
        delivery: NewDelivery,
        order_status: OrderStatusType,
    ) -> Result<(Delivery, Order), MarketplaceError>;

    /// Marks a `DELIVERED` delivery as `APPROVED`, completes the order and queues a `DELIVERY_APPROVED` notification
    /// for the seller. If the delivery was approved or sent back concurrently, [`MarketplaceError::StaleState`] is
    /// returned.
    async fn approve_delivery(&self, delivery_id: i64) -> Result<(Delivery, Order), MarketplaceError>;

    /// Marks a `DELIVERED` delivery as `REVISION_REQUIRED` with the buyer's feedback, moves the order to
    /// `REVISION_REQUIRED` and queues a `REVISION_REQUESTED` notification for the seller.
    async fn request_revision(&self, delivery_id: i64, feedback: &str) -> Result<(Delivery, Order), MarketplaceError>;

    /// Applies additive and subtractive edits to the file manifest. The delivery status is not touched.
    async fn update_delivery(&self, delivery_id: i64, edit: DeliveryEdit) -> Result<Delivery, MarketplaceError>;

    async fn fetch_delivery(&self, delivery_id: i64) -> Result<Option<Delivery>, MarketplaceError>;

    /// Deliveries where the user is the buyer or the seller, newest first. `None` returns every delivery.
    async fn fetch_deliveries_for_user(&self, user_id: Option<i64>) -> Result<Vec<Delivery>, MarketplaceError>;

    async fn fetch_deliveries_for_order(&self, order_id: i64) -> Result<Vec<Delivery>, MarketplaceError>;
}
