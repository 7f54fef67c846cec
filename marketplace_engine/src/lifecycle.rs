//! The order lifecycle.
//!
//! Every status change an order goes through is listed in [`TRANSITIONS`]. Backends never write an order status
//! without checking it here first, and then apply the change with a conditional update against the expected current
//! status, so two racing transitions can never both succeed.
use crate::{
    db_types::OrderStatusType::{self, *},
    traits::MarketplaceError,
};

/// Who (or what) triggers a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The seller accepted a quote request
    SellerApproval,
    /// A successful payment was reconciled
    PaymentConfirmed,
    /// The seller acknowledged a paid order
    SellerStart,
    /// The seller submitted a delivery
    DeliverySubmitted,
    /// The buyer approved the latest delivery
    BuyerApproval,
    /// The buyer asked for changes to the latest delivery
    BuyerRevision,
    /// A participant (or an admin) cancelled an unpaid order
    Cancellation,
    /// A completed payment was refunded
    Refund,
}

pub const TRANSITIONS: [(OrderStatusType, OrderStatusType, Trigger); 14] = [
    (Requested, PendingPayment, Trigger::SellerApproval),
    (Requested, Canceled, Trigger::Cancellation),
    (PendingPayment, Paid, Trigger::PaymentConfirmed),
    (PendingPayment, Canceled, Trigger::Cancellation),
    (Paid, InProgress, Trigger::SellerStart),
    (Paid, Delivered, Trigger::DeliverySubmitted),
    (InProgress, Delivered, Trigger::DeliverySubmitted),
    (RevisionRequired, Delivered, Trigger::DeliverySubmitted),
    (Delivered, Completed, Trigger::BuyerApproval),
    (Delivered, RevisionRequired, Trigger::BuyerRevision),
    (Paid, Canceled, Trigger::Refund),
    (InProgress, Canceled, Trigger::Refund),
    (Delivered, Canceled, Trigger::Refund),
    (RevisionRequired, Canceled, Trigger::Refund),
];

/// Orders that can still be cancelled (or deleted) without a refund. Anything that has been paid for keeps its record.
pub const CANCELLABLE: [OrderStatusType; 2] = [Requested, PendingPayment];

/// Orders that accept a new delivery
pub const DELIVERABLE: [OrderStatusType; 3] = [Paid, InProgress, RevisionRequired];

/// Orders whose payment can be refunded
pub const REFUNDABLE: [OrderStatusType; 4] = [Paid, InProgress, Delivered, RevisionRequired];

pub fn is_allowed(from: OrderStatusType, to: OrderStatusType) -> bool {
    TRANSITIONS.iter().any(|(f, t, _)| *f == from && *t == to)
}

/// Returns the trigger for the given edge, if the edge exists.
pub fn trigger_for(from: OrderStatusType, to: OrderStatusType) -> Option<Trigger> {
    TRANSITIONS.iter().find(|(f, t, _)| *f == from && *t == to).map(|(_, _, trigger)| *trigger)
}

/// Returns `Ok(())` if the order may move from `from` to `to`, or [`MarketplaceError::IllegalTransition`] otherwise.
pub fn check_transition(from: OrderStatusType, to: OrderStatusType) -> Result<(), MarketplaceError> {
    if is_allowed(from, to) {
        Ok(())
    } else {
        Err(MarketplaceError::IllegalTransition { from, to })
    }
}

/// Checks a status change requested directly by a user. Same-status updates and edges that only side effects may
/// drive (payment confirmation, deliveries, reviews and refunds) are rejected.
pub fn check_status_change(from: OrderStatusType, to: OrderStatusType) -> Result<(), MarketplaceError> {
    match trigger_for(from, to) {
        Some(Trigger::SellerApproval | Trigger::SellerStart | Trigger::Cancellation) => Ok(()),
        _ => Err(MarketplaceError::IllegalTransition { from, to }),
    }
}
