//! Authorization policy.
//!
//! There is exactly one policy function per operation. Each takes the caller and the target entity and returns a
//! [`Decision`]. A caller with no relationship to an entity gets [`Decision::Hidden`], which surfaces as "not found" so
//! that the existence of other people's orders is never leaked. A caller who can see the entity but may not perform
//! the operation gets [`Decision::Deny`].
//!
//! Policies only look at *who* is asking. Whether the entity is in the right state for the operation is a separate
//! check, made by the lifecycle module and enforced again by the conditional updates in the backend.
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Chat, Delivery, Order, OrderStatusType, Review, Role},
    traits::MarketplaceError,
};

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn user(user_id: i64) -> Self {
        Self { user_id, role: Role::User }
    }

    pub fn admin(user_id: i64) -> Self {
        Self { user_id, role: Role::Admin }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The user id to filter listings by. Admins see everything.
    pub fn scope(&self) -> Option<i64> {
        if self.is_admin() {
            None
        } else {
            Some(self.user_id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Hidden,
    Deny(String),
}

impl Decision {
    fn deny<S: Into<String>>(reason: S) -> Self {
        Self::Deny(reason.into())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts the decision into a result. `not_found` builds the error reported for hidden entities.
    pub fn enforce<F>(self, not_found: F) -> Result<(), MarketplaceError>
    where F: FnOnce() -> MarketplaceError {
        match self {
            Self::Allow => Ok(()),
            Self::Hidden => Err(not_found()),
            Self::Deny(reason) => Err(MarketplaceError::Forbidden(reason)),
        }
    }
}

fn order_visibility(actor: &Actor, order: &Order) -> Option<Decision> {
    if actor.is_admin() || order.is_participant(actor.user_id) {
        None
    } else {
        Some(Decision::Hidden)
    }
}

//--------------------------------------         Orders         -------------------------------------------------------

pub fn view_order(actor: &Actor, order: &Order) -> Decision {
    order_visibility(actor, order).unwrap_or(Decision::Allow)
}

/// Who may drive a user-initiated status change. Workflow-driven edges (payments, deliveries) have their own policies.
pub fn change_order_status(actor: &Actor, order: &Order, to: OrderStatusType) -> Decision {
    use OrderStatusType::*;
    if let Some(hidden) = order_visibility(actor, order) {
        return hidden;
    }
    let is_buyer = order.buyer_id == actor.user_id;
    let is_seller = order.seller_id == actor.user_id;
    match (order.status, to) {
        (Requested, PendingPayment) if is_seller || actor.is_admin() => Decision::Allow,
        (Requested, PendingPayment) => Decision::deny("Only the seller can approve an order request"),
        (Requested, Canceled) => Decision::Allow,
        (PendingPayment, Canceled) if is_buyer || actor.is_admin() => Decision::Allow,
        (PendingPayment, Canceled) => Decision::deny("Only the buyer can cancel an order awaiting payment"),
        (Paid, InProgress) if is_seller || actor.is_admin() => Decision::Allow,
        (Paid, InProgress) => Decision::deny("Only the seller can start work on an order"),
        // Illegal edges are reported by the lifecycle check
        _ => Decision::Allow,
    }
}

/// Deleting an order is cancelling it, so the cancellation rules apply.
pub fn delete_order(actor: &Actor, order: &Order) -> Decision {
    change_order_status(actor, order, OrderStatusType::Canceled)
}

pub fn edit_order_amount(actor: &Actor, order: &Order) -> Decision {
    if let Some(hidden) = order_visibility(actor, order) {
        return hidden;
    }
    if order.seller_id == actor.user_id || actor.is_admin() {
        Decision::Allow
    } else {
        Decision::deny("Only the seller can change the price of an order")
    }
}

//--------------------------------------        Payments        -------------------------------------------------------

pub fn create_payment_intent(actor: &Actor, order: &Order) -> Decision {
    if let Some(hidden) = order_visibility(actor, order) {
        return hidden;
    }
    if order.buyer_id == actor.user_id {
        Decision::Allow
    } else {
        Decision::deny("Only the buyer can pay for an order")
    }
}

pub fn record_payment(actor: &Actor, order: &Order) -> Decision {
    if let Some(hidden) = order_visibility(actor, order) {
        return hidden;
    }
    if order.buyer_id == actor.user_id || actor.is_admin() {
        Decision::Allow
    } else {
        Decision::deny("Only the buyer can record a payment")
    }
}

/// Payments are as visible as the orders they belong to.
pub fn view_payment(actor: &Actor, order: &Order) -> Decision {
    view_order(actor, order)
}

pub fn update_payment(actor: &Actor, order: &Order) -> Decision {
    if let Some(hidden) = order_visibility(actor, order) {
        return hidden;
    }
    if actor.is_admin() {
        Decision::Allow
    } else {
        Decision::deny("Only an administrator can edit a payment")
    }
}

pub fn refund_payment(actor: &Actor, order: &Order) -> Decision {
    if let Some(hidden) = order_visibility(actor, order) {
        return hidden;
    }
    if order.seller_id == actor.user_id || actor.is_admin() {
        Decision::Allow
    } else {
        Decision::deny("Only the seller can refund a payment")
    }
}

//--------------------------------------       Deliveries       -------------------------------------------------------

pub fn create_delivery(actor: &Actor, order: &Order) -> Decision {
    if let Some(hidden) = order_visibility(actor, order) {
        return hidden;
    }
    if order.seller_id == actor.user_id {
        Decision::Allow
    } else {
        Decision::deny("Only the seller can deliver work for an order")
    }
}

pub fn view_delivery(actor: &Actor, delivery: &Delivery) -> Decision {
    if actor.is_admin() || delivery.is_participant(actor.user_id) {
        Decision::Allow
    } else {
        Decision::Hidden
    }
}

/// Approving a delivery and asking for a revision are the buyer's decisions.
pub fn review_delivery(actor: &Actor, delivery: &Delivery) -> Decision {
    match view_delivery(actor, delivery) {
        Decision::Allow if delivery.buyer_id == actor.user_id => Decision::Allow,
        Decision::Allow => Decision::deny("Only the buyer can approve a delivery or ask for a revision"),
        other => other,
    }
}

pub fn update_delivery(actor: &Actor, delivery: &Delivery) -> Decision {
    match view_delivery(actor, delivery) {
        Decision::Allow if delivery.seller_id == actor.user_id => Decision::Allow,
        Decision::Allow => Decision::deny("Only the seller can edit a delivery"),
        other => other,
    }
}

/// Files are only handed out to the parties of the order. Admins can see the manifest but not download.
pub fn download_delivery_file(actor: &Actor, delivery: &Delivery) -> Decision {
    if delivery.is_participant(actor.user_id) {
        Decision::Allow
    } else if actor.is_admin() {
        Decision::deny("Only the buyer and seller can download delivered files")
    } else {
        Decision::Hidden
    }
}

//--------------------------------------         Chats          -------------------------------------------------------

/// Chats are private to the two participants.
pub fn access_chat(actor: &Actor, chat: &Chat) -> Decision {
    if chat.is_participant(actor.user_id) {
        Decision::Allow
    } else {
        Decision::Hidden
    }
}

//--------------------------------------        Reviews         -------------------------------------------------------

pub fn create_review(actor: &Actor, order: &Order) -> Decision {
    if let Some(hidden) = order_visibility(actor, order) {
        return hidden;
    }
    if order.buyer_id == actor.user_id {
        Decision::Allow
    } else {
        Decision::deny("Only the buyer can review an order")
    }
}

pub fn view_review(actor: &Actor, review: &Review, order: &Order) -> Decision {
    if actor.is_admin() || review.user_id == actor.user_id || order.is_participant(actor.user_id) {
        Decision::Allow
    } else {
        Decision::Hidden
    }
}

pub fn modify_review(actor: &Actor, review: &Review, order: &Order) -> Decision {
    match view_review(actor, review, order) {
        Decision::Allow if review.user_id == actor.user_id || actor.is_admin() => Decision::Allow,
        Decision::Allow => Decision::deny("Only the author can change a review"),
        other => other,
    }
}
