use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Delivery, DeliveryFile, DeliveryStatus, NewDelivery, Order, OrderStatusType},
    lifecycle::DELIVERABLE,
    mkt_api::delivery_objects::{FileUpload, NewDeliveryRequest, RevisionRequest, UpdateDeliveryRequest},
    policy::{self, Actor},
    traits::{DeliveryManagement, MarketplaceError, OrderManagement},
};

/// `DeliveryApi` runs the hand-over of finished work: the seller submits a delivery, and the buyer approves it or
/// sends it back for revision.
pub struct DeliveryApi<B> {
    db: B,
}

impl<B> Debug for DeliveryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeliveryApi")
    }
}

impl<B> DeliveryApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> DeliveryApi<B>
where B: DeliveryManagement + OrderManagement
{
    /// Submits work for an order that is paid, in progress, or waiting on a revision. The order moves to `DELIVERED`
    /// and the buyer is notified.
    pub async fn create_delivery(
        &self,
        actor: &Actor,
        request: NewDeliveryRequest,
    ) -> Result<(Delivery, Order), MarketplaceError> {
        request.validate()?;
        let order_id = request.order_id;
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        policy::create_delivery(actor, &order).enforce(|| MarketplaceError::OrderNotFound(order_id))?;
        if !DELIVERABLE.contains(&order.status) {
            return Err(MarketplaceError::IllegalTransition { from: order.status, to: OrderStatusType::Delivered });
        }
        let files = request.files.into_iter().map(FileUpload::into_delivery_file).collect();
        let delivery = NewDelivery::for_order(&order, request.description, files);
        let (delivery, order) = self.db.insert_delivery(delivery, order.status).await?;
        info!("📦️ Delivery {} submitted for order {order_id} with {} files", delivery.id, delivery.files.len());
        Ok((delivery, order))
    }

    pub async fn approve_delivery(&self, actor: &Actor, delivery_id: i64) -> Result<(Delivery, Order), MarketplaceError> {
        let delivery = self.fetch_pending_review(actor, delivery_id).await?;
        let (delivery, order) = self.db.approve_delivery(delivery.id).await?;
        info!("📦️ Delivery {delivery_id} approved. Order {} is complete.", order.id);
        Ok((delivery, order))
    }

    pub async fn request_revision(
        &self,
        actor: &Actor,
        delivery_id: i64,
        request: RevisionRequest,
    ) -> Result<(Delivery, Order), MarketplaceError> {
        let feedback = request.feedback()?;
        let delivery = self.fetch_pending_review(actor, delivery_id).await?;
        let (delivery, order) = self.db.request_revision(delivery.id, feedback).await?;
        info!("📦️ Revision requested for delivery {delivery_id} on order {}", order.id);
        Ok((delivery, order))
    }

    /// Adds and removes files. The delivery and order statuses are left as they are.
    pub async fn update_delivery(
        &self,
        actor: &Actor,
        delivery_id: i64,
        request: UpdateDeliveryRequest,
    ) -> Result<Delivery, MarketplaceError> {
        let delivery = self.fetch_visible(actor, delivery_id).await?;
        policy::update_delivery(actor, &delivery).enforce(|| MarketplaceError::DeliveryNotFound(delivery_id))?;
        let edit = request.into_edit()?;
        if let Some(missing) = edit.remove_file_ids.iter().find(|id| delivery.file(id).is_none()) {
            return Err(MarketplaceError::FileNotFound(missing.clone()));
        }
        let updated = self.db.update_delivery(delivery_id, edit).await?;
        debug!("📦️ Delivery {delivery_id} now has {} files", updated.files.len());
        Ok(updated)
    }

    pub async fn list_deliveries(&self, actor: &Actor) -> Result<Vec<Delivery>, MarketplaceError> {
        self.db.fetch_deliveries_for_user(actor.scope()).await
    }

    pub async fn fetch_delivery(&self, actor: &Actor, delivery_id: i64) -> Result<Delivery, MarketplaceError> {
        self.fetch_visible(actor, delivery_id).await
    }

    pub async fn deliveries_for_order(&self, actor: &Actor, order_id: i64) -> Result<Vec<Delivery>, MarketplaceError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        policy::view_order(actor, &order).enforce(|| MarketplaceError::OrderNotFound(order_id))?;
        self.db.fetch_deliveries_for_order(order_id).await
    }

    /// Looks up a file in the delivery's manifest. The caller serves it from the returned URL.
    pub async fn download_file(
        &self,
        actor: &Actor,
        delivery_id: i64,
        file_id: &str,
    ) -> Result<DeliveryFile, MarketplaceError> {
        let delivery = self.db.fetch_delivery(delivery_id).await?.ok_or(MarketplaceError::DeliveryNotFound(delivery_id))?;
        policy::download_delivery_file(actor, &delivery).enforce(|| MarketplaceError::DeliveryNotFound(delivery_id))?;
        delivery.file(file_id).cloned().ok_or_else(|| MarketplaceError::FileNotFound(file_id.to_string()))
    }

    async fn fetch_visible(&self, actor: &Actor, delivery_id: i64) -> Result<Delivery, MarketplaceError> {
        let delivery = self.db.fetch_delivery(delivery_id).await?.ok_or(MarketplaceError::DeliveryNotFound(delivery_id))?;
        policy::view_delivery(actor, &delivery).enforce(|| MarketplaceError::DeliveryNotFound(delivery_id))?;
        Ok(delivery)
    }

    async fn fetch_pending_review(&self, actor: &Actor, delivery_id: i64) -> Result<Delivery, MarketplaceError> {
        let delivery = self.fetch_visible(actor, delivery_id).await?;
        policy::review_delivery(actor, &delivery).enforce(|| MarketplaceError::DeliveryNotFound(delivery_id))?;
        if delivery.status != DeliveryStatus::Delivered {
            return Err(MarketplaceError::StatusConflict(format!(
                "Delivery {delivery_id} is {} and has already been reviewed",
                delivery.status
            )));
        }
        Ok(delivery)
    }
}
