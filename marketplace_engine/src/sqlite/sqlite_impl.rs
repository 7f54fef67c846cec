//! `SqliteDatabase` is the SQLite implementation of a marketplace engine backend.
//!
//! It implements every storage trait in [`crate::traits`]. Every write runs in a transaction that is committed before
//! the method returns, so the next call sees it on any pooled connection. Status changes are conditional updates
//! against the status the caller expects.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use mkt_common::MinorUnits;
use sqlx::{migrate, SqliteConnection, SqlitePool};

use super::db::{catalog, chats, db_url, deliveries, new_pool, orders, outbox, payments, reviews};
use crate::{
    db_types::{
        Chat,
        Delivery,
        DeliveryEdit,
        DeliveryStatus,
        Message,
        NewDelivery,
        NewMessage,
        NewOrder,
        NewPayment,
        NewReview,
        NewService,
        NewUser,
        Notification,
        Order,
        OrderStatusType,
        OutboxPayload,
        OutboxTask,
        Payment,
        PaymentMethod,
        PaymentStatus,
        PaymentUpdate,
        ReconciledPayment,
        Review,
        Service,
        User,
    },
    lifecycle::REFUNDABLE,
    traits::{
        CatalogManagement,
        ChatManagement,
        ChatSummary,
        DeliveryManagement,
        MarketplaceDatabase,
        MarketplaceError,
        OrderManagement,
        OutboxFilter,
        OutboxManagement,
        PaymentManagement,
        RetryPlan,
        ReviewManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `MKT_DATABASE_URL`
    pub async fn new(max_connections: u32) -> Result<Self, MarketplaceError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, MarketplaceError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), MarketplaceError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}

/// Tells a vanished order apart from one that moved on. Used after a conditional update matched no rows.
async fn stale_or_missing(order_id: i64, expected: OrderStatusType, conn: &mut SqliteConnection) -> MarketplaceError {
    match orders::fetch_order(order_id, conn).await {
        Ok(Some(order)) => MarketplaceError::StaleState(format!(
            "Order {order_id} is {} but {expected} was expected",
            order.status
        )),
        Ok(None) => MarketplaceError::OrderNotFound(order_id),
        Err(e) => e.into(),
    }
}

/// Cancels the order behind a refunded payment, as long as it is still in a refundable state. Completed orders stay
/// completed.
async fn cancel_refunded_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<(Order, OrderStatusType)>, MarketplaceError> {
    let Some(order) = orders::fetch_order(order_id, conn).await? else {
        return Ok(None);
    };
    if !REFUNDABLE.contains(&order.status) {
        debug!("🗃️ Order {order_id} is {} and is left as it is after the refund", order.status);
        return Ok(None);
    }
    let previous = order.status;
    let cancelled = orders::update_status(order_id, previous, OrderStatusType::Canceled, conn).await?;
    Ok(cancelled.map(|order| (order, previous)))
}

async fn queue_notification(notification: Notification, conn: &mut SqliteConnection) -> Result<(), MarketplaceError> {
    outbox::enqueue(OutboxPayload::Notify { notification }, conn).await?;
    Ok(())
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_service(&self, service_id: i64) -> Result<Option<Service>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_service(service_id, &mut conn).await?)
    }

    async fn insert_service(&self, service: NewService) -> Result<Service, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let service = catalog::insert_service(service, &mut tx).await?;
        tx.commit().await?;
        Ok(service)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(catalog::fetch_user(user_id, &mut conn).await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let user = catalog::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, OutboxTask), MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        let task = outbox::enqueue(OutboxPayload::ProvisionChat { order_id: order.id }, &mut tx)
            .await?
            .ok_or_else(|| MarketplaceError::AlreadyExists(format!("Chat provisioning task for order {}", order.id)))?;
        tx.commit().await?;
        debug!("🗃️ Order {} saved with chat provisioning task {}", order.id, task.id);
        Ok((order, task))
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn fetch_orders_for_user(&self, user_id: Option<i64>) -> Result<Vec<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_user(user_id, &mut conn).await?)
    }

    async fn transition_order(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        match orders::update_status(order_id, from, to, &mut tx).await? {
            Some(order) => {
                tx.commit().await?;
                Ok(order)
            },
            None => {
                let err = stale_or_missing(order_id, from, &mut tx).await;
                tx.rollback().await?;
                Err(err)
            },
        }
    }

    async fn update_order_amount(
        &self,
        order_id: i64,
        amount: MinorUnits,
        expected_status: OrderStatusType,
    ) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        match orders::update_amount(order_id, amount, expected_status, &mut tx).await? {
            Some(order) => {
                tx.commit().await?;
                Ok(order)
            },
            None => {
                let err = stale_or_missing(order_id, expected_status, &mut tx).await;
                tx.rollback().await?;
                Err(err)
            },
        }
    }

    async fn delete_order(&self, order_id: i64, expected_status: OrderStatusType) -> Result<Order, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        match orders::delete_order_cascade(order_id, expected_status, &mut tx).await? {
            Some(order) => {
                tx.commit().await?;
                Ok(order)
            },
            None => {
                let err = stale_or_missing(order_id, expected_status, &mut tx).await;
                tx.rollback().await?;
                Err(err)
            },
        }
    }
}

impl PaymentManagement for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::insert_payment(payment, &mut tx).await?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment(payment_id, &mut conn).await?)
    }

    async fn fetch_payments_for_user(&self, user_id: Option<i64>) -> Result<Vec<Payment>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payments_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_latest_payment(
        &self,
        order_id: i64,
        method: PaymentMethod,
    ) -> Result<Option<Payment>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_latest_payment(order_id, method, &mut conn).await?)
    }

    async fn set_payment_intent_id(&self, payment_id: i64, intent_id: &str) -> Result<Payment, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::set_payment_intent_id(payment_id, intent_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::PaymentNotFound(payment_id))?;
        tx.commit().await?;
        Ok(payment)
    }

    async fn reconcile_payment(&self, update: PaymentUpdate) -> Result<ReconciledPayment, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let (payment, payment_changed) = match payments::apply_status_update(&update, &mut tx).await? {
            Some(p) => (p, true),
            None => {
                let p = payments::fetch_payment(update.payment_id, &mut tx)
                    .await?
                    .ok_or(MarketplaceError::PaymentNotFound(update.payment_id))?;
                debug!(
                    "🗃️ Payment {} is {}. Update to {} ignored.",
                    p.id, p.status, update.status
                );
                (p, false)
            },
        };
        // Also retried when the payment was already completed, in case an earlier attempt stopped half-way
        let paid_order = if payment.status == PaymentStatus::Completed {
            let txid = payment.transaction_id.as_deref();
            orders::mark_paid(payment.order_id, txid, &mut tx).await?
        } else {
            None
        };
        let annulled_order = if payment_changed && payment.status == PaymentStatus::Refunded {
            cancel_refunded_order(payment.order_id, &mut tx).await?
        } else {
            None
        };
        tx.commit().await?;
        if let Some(order) = &paid_order {
            info!("🗃️ Order {} is now PAID (payment {})", order.id, payment.id);
        }
        if let Some((order, previous)) = &annulled_order {
            info!("🗃️ Order {} cancelled from {previous} after payment {} was refunded", order.id, payment.id);
        }
        Ok(ReconciledPayment { payment, payment_changed, paid_order, annulled_order })
    }

    async fn refund_payment(
        &self,
        payment_id: i64,
        order_status: OrderStatusType,
    ) -> Result<(Payment, Order), MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let Some(payment) = payments::mark_refunded(payment_id, &mut tx).await? else {
            let err = match payments::fetch_payment(payment_id, &mut tx).await? {
                Some(p) => MarketplaceError::StaleState(format!("Payment {payment_id} is {}", p.status)),
                None => MarketplaceError::PaymentNotFound(payment_id),
            };
            tx.rollback().await?;
            return Err(err);
        };
        let order_id = payment.order_id;
        let Some(order) = orders::update_status(order_id, order_status, OrderStatusType::Canceled, &mut tx).await?
        else {
            let err = stale_or_missing(order_id, order_status, &mut tx).await;
            tx.rollback().await?;
            return Err(err);
        };
        tx.commit().await?;
        info!("🗃️ Payment {payment_id} refunded and order {order_id} cancelled");
        Ok((payment, order))
    }
}

impl DeliveryManagement for SqliteDatabase {
    async fn insert_delivery(
        &self,
        delivery: NewDelivery,
        order_status: OrderStatusType,
    ) -> Result<(Delivery, Order), MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order_id = delivery.order_id;
        let Some(order) = orders::update_status(order_id, order_status, OrderStatusType::Delivered, &mut tx).await?
        else {
            let err = stale_or_missing(order_id, order_status, &mut tx).await;
            tx.rollback().await?;
            return Err(err);
        };
        let delivery = deliveries::insert_delivery(delivery, &mut tx).await?;
        queue_notification(Notification::delivery_received(&delivery), &mut tx).await?;
        tx.commit().await?;
        Ok((delivery, order))
    }

    async fn approve_delivery(&self, delivery_id: i64) -> Result<(Delivery, Order), MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let Some(delivery) = deliveries::approve(delivery_id, &mut tx).await? else {
            let err = stale_delivery(delivery_id, &mut tx).await;
            tx.rollback().await?;
            return Err(err);
        };
        let order_id = delivery.order_id;
        let from = OrderStatusType::Delivered;
        let Some(order) = orders::update_status(order_id, from, OrderStatusType::Completed, &mut tx).await? else {
            let err = stale_or_missing(order_id, from, &mut tx).await;
            tx.rollback().await?;
            return Err(err);
        };
        queue_notification(Notification::delivery_approved(&delivery), &mut tx).await?;
        tx.commit().await?;
        Ok((delivery, order))
    }

    async fn request_revision(&self, delivery_id: i64, feedback: &str) -> Result<(Delivery, Order), MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let Some(delivery) = deliveries::request_revision(delivery_id, feedback, &mut tx).await? else {
            let err = stale_delivery(delivery_id, &mut tx).await;
            tx.rollback().await?;
            return Err(err);
        };
        let order_id = delivery.order_id;
        let from = OrderStatusType::Delivered;
        let Some(order) = orders::update_status(order_id, from, OrderStatusType::RevisionRequired, &mut tx).await?
        else {
            let err = stale_or_missing(order_id, from, &mut tx).await;
            tx.rollback().await?;
            return Err(err);
        };
        queue_notification(Notification::revision_requested(&delivery, feedback), &mut tx).await?;
        tx.commit().await?;
        Ok((delivery, order))
    }

    async fn update_delivery(&self, delivery_id: i64, edit: DeliveryEdit) -> Result<Delivery, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let delivery =
            deliveries::touch(delivery_id, &mut tx).await?.ok_or(MarketplaceError::DeliveryNotFound(delivery_id))?;
        let mut files = delivery.files.0;
        edit.apply_to(&mut files);
        let updated = deliveries::update_contents(delivery_id, edit.description.as_deref(), &files, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn fetch_delivery(&self, delivery_id: i64) -> Result<Option<Delivery>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(deliveries::fetch_delivery(delivery_id, &mut conn).await?)
    }

    async fn fetch_deliveries_for_user(&self, user_id: Option<i64>) -> Result<Vec<Delivery>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(deliveries::fetch_deliveries_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_deliveries_for_order(&self, order_id: i64) -> Result<Vec<Delivery>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(deliveries::fetch_deliveries_for_order(order_id, &mut conn).await?)
    }
}

async fn stale_delivery(delivery_id: i64, conn: &mut SqliteConnection) -> MarketplaceError {
    match deliveries::fetch_delivery(delivery_id, conn).await {
        Ok(Some(d)) => MarketplaceError::StaleState(format!(
            "Delivery {delivery_id} is {} but {} was expected",
            d.status,
            DeliveryStatus::Delivered
        )),
        Ok(None) => MarketplaceError::DeliveryNotFound(delivery_id),
        Err(e) => e.into(),
    }
}

impl ChatManagement for SqliteDatabase {
    async fn create_chat_for_order(&self, order_id: i64) -> Result<Chat, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let inserted = chats::insert_chat_for_order(order_id, &mut tx).await?;
        let chat = chats::fetch_chat_for_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        orders::set_chat_id(order_id, chat.id, &mut tx).await?;
        tx.commit().await?;
        if inserted > 0 {
            debug!("🗃️ Chat {} created for order {order_id}", chat.id);
        }
        Ok(chat)
    }

    async fn fetch_chat(&self, chat_id: i64) -> Result<Option<Chat>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chats::fetch_chat(chat_id, &mut conn).await?)
    }

    async fn fetch_chats_for_user(
        &self,
        user_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ChatSummary>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let chats = chats::fetch_chats_for_user(user_id, cursor, limit, &mut conn).await?;
        let mut result = Vec::with_capacity(chats.len());
        for chat in chats {
            let last_message = chats::fetch_last_message(chat.id, &mut conn).await?;
            let unread_count = chats::unread_count(chat.id, user_id, &mut conn).await?;
            result.push(ChatSummary { chat, last_message, unread_count });
        }
        Ok(result)
    }

    async fn fetch_messages(
        &self,
        chat_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chats::fetch_messages(chat_id, cursor, limit, &mut conn).await?)
    }

    async fn fetch_message(&self, chat_id: i64, message_id: i64) -> Result<Option<Message>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chats::fetch_message(chat_id, message_id, &mut conn).await?)
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let chat_id = message.chat_id;
        let message = chats::insert_message(message, &mut tx).await?;
        if let Some(sender_id) = message.sender_id {
            let chat = chats::fetch_chat(chat_id, &mut tx).await?.ok_or(MarketplaceError::ChatNotFound(chat_id))?;
            let excerpt = mkt_common::helpers::truncate_chars(&message.body, 100);
            let notification = Notification::chat_message(&chat, sender_id, &excerpt).with_message_id(message.id);
            queue_notification(notification, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(message)
    }

    async fn mark_message_read(
        &self,
        chat_id: i64,
        message_id: i64,
        reader_id: i64,
    ) -> Result<Option<Message>, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let message = chats::mark_message_read(chat_id, message_id, reader_id, &mut tx).await?;
        tx.commit().await?;
        Ok(message)
    }

    async fn mark_all_read(&self, chat_id: i64, reader_id: i64) -> Result<u64, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let updated = chats::mark_all_read(chat_id, reader_id, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn unread_count(&self, chat_id: i64, user_id: i64) -> Result<i64, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(chats::unread_count(chat_id, user_id, &mut conn).await?)
    }
}

/// Recomputes both rating aggregates touched by a review on the given order.
async fn refresh_ratings(order_id: i64, conn: &mut SqliteConnection) -> Result<(), MarketplaceError> {
    let order = orders::fetch_order(order_id, conn).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
    reviews::refresh_service_rating(order.service_id, conn).await?;
    reviews::refresh_seller_rating(order.seller_id, conn).await?;
    trace!("🗃️ Ratings refreshed for service {} and seller {}", order.service_id, order.seller_id);
    Ok(())
}

impl ReviewManagement for SqliteDatabase {
    async fn insert_review(&self, review: NewReview) -> Result<Review, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order_id = review.order_id;
        let review = reviews::insert_review(review, &mut tx).await.map_err(|e| match MarketplaceError::from(e) {
            MarketplaceError::AlreadyExists(_) => MarketplaceError::AlreadyExists(format!("A review for order {order_id}")),
            other => other,
        })?;
        refresh_ratings(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(review)
    }

    async fn update_review(
        &self,
        review_id: i64,
        rating: Option<i64>,
        comment: Option<Option<String>>,
    ) -> Result<Review, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let review = reviews::update_review(review_id, rating, comment, &mut tx)
            .await?
            .ok_or(MarketplaceError::ReviewNotFound(review_id))?;
        refresh_ratings(review.order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(review)
    }

    async fn delete_review(&self, review_id: i64) -> Result<Review, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let review =
            reviews::delete_review(review_id, &mut tx).await?.ok_or(MarketplaceError::ReviewNotFound(review_id))?;
        refresh_ratings(review.order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(review)
    }

    async fn fetch_review(&self, review_id: i64) -> Result<Option<Review>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reviews::fetch_review(review_id, &mut conn).await?)
    }

    async fn fetch_reviews_for_service(&self, service_id: i64) -> Result<Vec<Review>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reviews::fetch_reviews_for_service(service_id, &mut conn).await?)
    }

    async fn fetch_reviews_for_seller(&self, seller_id: i64) -> Result<Vec<Review>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reviews::fetch_reviews_for_seller(seller_id, &mut conn).await?)
    }

    async fn fetch_reviews_involving(&self, user_id: Option<i64>) -> Result<Vec<Review>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(reviews::fetch_reviews_involving(user_id, &mut conn).await?)
    }
}

impl OutboxManagement for SqliteDatabase {
    async fn enqueue_task(&self, payload: OutboxPayload) -> Result<Option<OutboxTask>, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let task = outbox::enqueue(payload, &mut tx).await?;
        tx.commit().await?;
        Ok(task)
    }

    async fn fetch_due_tasks(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<OutboxTask>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(outbox::fetch_due(now, limit, &mut conn).await?)
    }

    async fn mark_task_processed(&self, task_id: i64) -> Result<(), MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        outbox::mark_processed(task_id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn mark_task_failed(
        &self,
        task_id: i64,
        error: &str,
        plan: RetryPlan,
    ) -> Result<OutboxTask, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let task = outbox::mark_failed(task_id, error, plan, &mut tx).await?.ok_or_else(|| {
            MarketplaceError::DispatchError(format!("Outbox task {task_id} disappeared while recording a failure"))
        })?;
        tx.commit().await?;
        Ok(task)
    }

    async fn fetch_tasks(&self, filter: OutboxFilter) -> Result<Vec<OutboxTask>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(outbox::fetch_tasks(filter, &mut conn).await?)
    }
}
