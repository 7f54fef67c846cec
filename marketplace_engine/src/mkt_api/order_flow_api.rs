use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderStatusType},
    events::{EventProducers, OrderAnnulledEvent},
    lifecycle::{check_status_change, CANCELLABLE},
    mkt_api::order_objects::{ModifyOrderRequest, NewOrderRequest},
    policy::{self, Actor},
    traits::{CatalogManagement, ChatManagement, MarketplaceError, OrderManagement, OutboxManagement},
};

/// `OrderFlowApi` drives orders through their lifecycle on behalf of buyers, sellers and admins.
///
/// Every method authorizes the caller with the matching [`policy`] function before checking the lifecycle rules.
/// Status changes are applied by the backend as conditional updates, so a request that loses a race gets a conflict
/// rather than overwriting the winner.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + CatalogManagement + ChatManagement + OutboxManagement
{
    /// Places a new order for the caller.
    ///
    /// The order and a chat provisioning task are stored together. The chat is then provisioned right away on a
    /// best-effort basis: if that fails, the order is still returned (with no `chat_id`) and the outbox worker
    /// retries later.
    pub async fn create_order(&self, actor: &Actor, request: NewOrderRequest) -> Result<Order, MarketplaceError> {
        request.validate()?;
        let service_id = request.service_id;
        let service =
            self.db.fetch_service(service_id).await?.ok_or(MarketplaceError::ServiceNotFound(service_id))?;
        let new_order = request.into_new_order(actor.user_id, &service)?;
        let (mut order, task) = self.db.insert_order(new_order).await?;
        info!("🔄️ Order {} created by user {} with status {}", order.id, actor.user_id, order.status);
        match self.db.create_chat_for_order(order.id).await {
            Ok(chat) => {
                order.chat_id = Some(chat.id);
                if let Err(e) = self.db.mark_task_processed(task.id).await {
                    warn!("🔄️ Chat {} was created but task {} could not be closed: {e}", chat.id, task.id);
                }
            },
            Err(e) => {
                warn!("🔄️ Could not provision a chat for order {}. The outbox will retry. {e}", order.id);
            },
        }
        Ok(order)
    }

    pub async fn list_orders(&self, actor: &Actor) -> Result<Vec<Order>, MarketplaceError> {
        self.db.fetch_orders_for_user(actor.scope()).await
    }

    pub async fn fetch_order(&self, actor: &Actor, order_id: i64) -> Result<Order, MarketplaceError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        policy::view_order(actor, &order).enforce(|| MarketplaceError::OrderNotFound(order_id))?;
        Ok(order)
    }

    /// The seller accepts a quote request. `REQUESTED -> PENDING_PAYMENT`.
    pub async fn approve_request(&self, actor: &Actor, order_id: i64) -> Result<Order, MarketplaceError> {
        self.change_status(actor, order_id, OrderStatusType::PendingPayment).await
    }

    /// The seller acknowledges a paid order. `PAID -> IN_PROGRESS`.
    pub async fn start_work(&self, actor: &Actor, order_id: i64) -> Result<Order, MarketplaceError> {
        self.change_status(actor, order_id, OrderStatusType::InProgress).await
    }

    pub async fn cancel_order(&self, actor: &Actor, order_id: i64) -> Result<Order, MarketplaceError> {
        self.change_status(actor, order_id, OrderStatusType::Canceled).await
    }

    /// Applies a price change and/or a manual status change.
    ///
    /// The price can only change while the order is `REQUESTED`, since that is what the seller is being asked to
    /// confirm. A price change is applied before a status change, so a seller can adjust and approve in one request.
    pub async fn update_order(
        &self,
        actor: &Actor,
        order_id: i64,
        request: ModifyOrderRequest,
    ) -> Result<Order, MarketplaceError> {
        request.validate()?;
        let mut order = self.fetch_order(actor, order_id).await?;
        if let Some(amount) = request.amount {
            policy::edit_order_amount(actor, &order).enforce(|| MarketplaceError::OrderNotFound(order_id))?;
            if order.status != OrderStatusType::Requested {
                return Err(MarketplaceError::StatusConflict(format!(
                    "The price of order {order_id} can only change while it is REQUESTED. It is {}",
                    order.status
                )));
            }
            order = self.db.update_order_amount(order_id, amount.into(), OrderStatusType::Requested).await?;
            info!("🔄️ Order {order_id} amount changed to {} by user {}", order.amount, actor.user_id);
        }
        if let Some(status) = request.status {
            order = self.apply_status_change(actor, order, status).await?;
        }
        Ok(order)
    }

    /// Deletes an order that has not been paid for. Paid orders are never deleted, whoever asks.
    pub async fn delete_order(&self, actor: &Actor, order_id: i64) -> Result<Order, MarketplaceError> {
        let order = self.fetch_order(actor, order_id).await?;
        policy::delete_order(actor, &order).enforce(|| MarketplaceError::OrderNotFound(order_id))?;
        if !CANCELLABLE.contains(&order.status) {
            return Err(MarketplaceError::IllegalTransition { from: order.status, to: OrderStatusType::Canceled });
        }
        let deleted = self.db.delete_order(order_id, order.status).await?;
        info!("🔄️ Order {order_id} deleted by user {}", actor.user_id);
        self.producers.publish_order_annulled(OrderAnnulledEvent::new(deleted.clone(), order.status)).await;
        Ok(deleted)
    }

    async fn change_status(
        &self,
        actor: &Actor,
        order_id: i64,
        to: OrderStatusType,
    ) -> Result<Order, MarketplaceError> {
        let order = self.fetch_order(actor, order_id).await?;
        self.apply_status_change(actor, order, to).await
    }

    async fn apply_status_change(
        &self,
        actor: &Actor,
        order: Order,
        to: OrderStatusType,
    ) -> Result<Order, MarketplaceError> {
        let order_id = order.id;
        policy::change_order_status(actor, &order, to).enforce(|| MarketplaceError::OrderNotFound(order_id))?;
        check_status_change(order.status, to)?;
        let updated = self.db.transition_order(order_id, order.status, to).await?;
        info!("🔄️ Order {order_id} moved from {} to {to} by user {}", order.status, actor.user_id);
        if to == OrderStatusType::Canceled {
            self.producers.publish_order_annulled(OrderAnnulledEvent::new(updated.clone(), order.status)).await;
        }
        Ok(updated)
    }
}
