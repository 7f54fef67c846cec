use crate::{
    db_types::{NewPayment, Order, OrderStatusType, Payment, PaymentMethod, PaymentUpdate, ReconciledPayment},
    traits::MarketplaceError,
};

#[allow(async_fn_in_trait)]
pub trait PaymentManagement {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, MarketplaceError>;

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, MarketplaceError>;

    /// Payments on orders where the user is the buyer or seller, newest first. `None` returns every payment.
    async fn fetch_payments_for_user(&self, user_id: Option<i64>) -> Result<Vec<Payment>, MarketplaceError>;

    /// The most recent payment for the order with the given method. This is the row gateway notifications apply to.
    async fn fetch_latest_payment(
        &self,
        order_id: i64,
        method: PaymentMethod,
    ) -> Result<Option<Payment>, MarketplaceError>;

    /// Stores the gateway's checkout preference id against the payment.
    async fn set_payment_intent_id(&self, payment_id: i64, intent_id: &str) -> Result<Payment, MarketplaceError>;

    /// Applies a status update to a payment, and if the new status is `completed`, moves the owning order from
    /// `PENDING_PAYMENT` to `PAID` in the same transaction.
    ///
    /// Updates never regress a settled payment (see [`crate::db_types::PaymentStatus::can_become`]); such updates are
    /// reported with `payment_changed == false` rather than as errors. The order transition is conditional on the
    /// order still being `PENDING_PAYMENT`, so duplicate notifications never pay an order twice and a late
    /// notification never resurrects a cancelled order.
    async fn reconcile_payment(&self, update: PaymentUpdate) -> Result<ReconciledPayment, MarketplaceError>;

    /// Marks a `completed` payment as `refunded` and moves its order from `order_status` to `CANCELED`, atomically.
    async fn refund_payment(
        &self,
        payment_id: i64,
        order_status: OrderStatusType,
    ) -> Result<(Payment, Order), MarketplaceError>;
}
