//! Records and enumerations that are persisted by the engine backends.
//!
//! Every struct that maps onto a table derives [`FromRow`] so that backends can use `query_as` directly. JSON field
//! names are camelCase, since these types are returned verbatim by the HTTP layer.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use mkt_common::MinorUnits;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------          Role          -------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Self::User),
            "Admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------    OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The buyer asked for a quote. The seller must approve the request before the buyer can pay.
    Requested,
    /// The order is waiting for a successful payment.
    PendingPayment,
    /// A payment has been reconciled against the order.
    Paid,
    /// The seller has acknowledged the order and started work.
    InProgress,
    /// The seller has submitted a delivery that the buyer has not reviewed yet.
    Delivered,
    /// The buyer asked for changes to the latest delivery.
    RevisionRequired,
    /// The buyer approved a delivery. Terminal.
    Completed,
    /// The order was cancelled or refunded. Terminal.
    Canceled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Paid => "PAID",
            Self::InProgress => "IN_PROGRESS",
            Self::Delivered => "DELIVERED",
            Self::RevisionRequired => "REVISION_REQUIRED",
            Self::Completed => "COMPLETED",
            Self::Canceled => "CANCELED",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQUESTED" => Ok(Self::Requested),
            "PENDING_PAYMENT" => Ok(Self::PendingPayment),
            "PAID" => Ok(Self::Paid),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DELIVERED" => Ok(Self::Delivered),
            "REVISION_REQUIRED" => Ok(Self::RevisionRequired),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELED" => Ok(Self::Canceled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to REQUESTED");
            OrderStatusType::Requested
        })
    }
}

//--------------------------------------          Order         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub service_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub status: OrderStatusType,
    pub amount: MinorUnits,
    pub currency: String,
    /// The gateway's settlement id of the payment that paid for this order
    pub payment_ref: Option<String>,
    pub chat_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub service_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub status: OrderStatusType,
}

impl NewOrder {
    /// Creates a new order that goes straight to `PENDING_PAYMENT`. Use [`NewOrder::as_request`] for orders that
    /// need seller approval first.
    pub fn new(service_id: i64, buyer_id: i64, seller_id: i64, amount: MinorUnits, currency: &str) -> Self {
        Self {
            service_id,
            buyer_id,
            seller_id,
            amount,
            currency: currency.to_string(),
            status: OrderStatusType::PendingPayment,
        }
    }

    pub fn as_request(mut self, as_request: bool) -> Self {
        self.status = if as_request { OrderStatusType::Requested } else { OrderStatusType::PendingPayment };
        self
    }
}

//--------------------------------------     PaymentStatus      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Settled payments only ever move forward (`completed -> refunded`). Anything else is a stale notification.
    pub fn can_become(&self, next: PaymentStatus) -> bool {
        match (self, next) {
            (Self::Completed, Self::Refunded) => true,
            (Self::Completed | Self::Refunded, _) => false,
            _ => true,
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     PaymentMethod      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Checkout through the Mercado Pago gateway
    MercadoPago,
    /// A payment recorded by hand, e.g. a bank transfer confirmed by an admin
    Manual,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MercadoPago => write!(f, "mercadopago"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

//--------------------------------------        Payment         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    /// The gateway's checkout preference id
    pub payment_intent_id: Option<String>,
    /// The gateway's settled payment id
    pub transaction_id: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub order_id: i64,
    pub amount: MinorUnits,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub description: Option<String>,
}

impl NewPayment {
    /// A pending payment for the full amount of the order
    pub fn for_order(order: &Order, method: PaymentMethod) -> Self {
        Self {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency.clone(),
            payment_method: method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            description: None,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_transaction_id<S: Into<String>>(mut self, txid: S) -> Self {
        self.transaction_id = Some(txid.into());
        self
    }
}

/// A status change for a payment, typically the result of a gateway notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentUpdate {
    pub payment_id: i64,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
}

/// The outcome of applying a [`PaymentUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledPayment {
    pub payment: Payment,
    /// True if the update changed the payment row. Stale or duplicate updates leave it untouched.
    pub payment_changed: bool,
    /// Set when this update moved the order from `PENDING_PAYMENT` to `PAID`.
    pub paid_order: Option<Order>,
    /// Set when this update refunded the payment and cancelled the order. Carries the order's previous status.
    pub annulled_order: Option<(Order, OrderStatusType)>,
}

//--------------------------------------     DeliveryStatus     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Delivered,
    Approved,
    RevisionRequired,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivered => write!(f, "DELIVERED"),
            Self::Approved => write!(f, "APPROVED"),
            Self::RevisionRequired => write!(f, "REVISION_REQUIRED"),
        }
    }
}

//--------------------------------------      DeliveryFile      -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryFile {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    /// Location of the file in external storage
    pub url: String,
}

//--------------------------------------        Delivery        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: i64,
    pub order_id: i64,
    pub seller_id: i64,
    pub buyer_id: i64,
    pub description: Option<String>,
    pub files: Json<Vec<DeliveryFile>>,
    pub status: DeliveryStatus,
    pub delivery_date: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub revision_requested_at: Option<DateTime<Utc>>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }

    pub fn file(&self, file_id: &str) -> Option<&DeliveryFile> {
        self.files.iter().find(|f| f.id == file_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDelivery {
    pub order_id: i64,
    pub seller_id: i64,
    pub buyer_id: i64,
    pub description: Option<String>,
    pub files: Vec<DeliveryFile>,
}

impl NewDelivery {
    /// The delivery parties always mirror the order's parties.
    pub fn for_order(order: &Order, description: Option<String>, files: Vec<DeliveryFile>) -> Self {
        Self { order_id: order.id, seller_id: order.seller_id, buyer_id: order.buyer_id, description, files }
    }
}

/// Additive and subtractive edits to a delivery's file manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryEdit {
    pub description: Option<String>,
    pub add_files: Vec<DeliveryFile>,
    pub remove_file_ids: Vec<String>,
}

impl DeliveryEdit {
    /// Removes the listed ids, then appends the new files in order. Existing files keep their position.
    pub fn apply_to(&self, files: &mut Vec<DeliveryFile>) {
        files.retain(|f| !self.remove_file_ids.contains(&f.id));
        files.extend(self.add_files.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.add_files.is_empty() && self.remove_file_ids.is_empty()
    }
}

//--------------------------------------          Chat          -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: i64,
    pub order_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }

    /// The other participant in the conversation
    pub fn counterpart_of(&self, user_id: i64) -> i64 {
        if user_id == self.buyer_id {
            self.seller_id
        } else {
            self.buyer_id
        }
    }
}

//--------------------------------------        Message         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    /// `None` for system-generated messages
    pub sender_id: Option<i64>,
    pub body: String,
    pub attachments: Option<Json<Value>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub chat_id: i64,
    pub sender_id: Option<i64>,
    pub body: String,
    pub attachments: Option<Value>,
}

//--------------------------------------         Review         -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub order_id: i64,
    /// The author. Always the order's buyer.
    pub user_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub order_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub comment: Option<String>,
}

//--------------------------------------        Service         -------------------------------------------------------
/// The catalog entry an order is placed against. Catalog management lives elsewhere; the engine only reads services
/// and maintains their rating aggregate.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub base_price: MinorUnits,
    pub currency: String,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewService {
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub base_price: MinorUnits,
    pub currency: String,
}

//--------------------------------------          User          -------------------------------------------------------
/// A marketplace account, as far as the engine cares about it: contact details and the seller rating aggregate.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub average_rating_as_musician: f64,
    pub total_reviews_as_musician: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
}

impl NewUser {
    pub fn new<S: Into<String>>(email: S, display_name: S) -> Self {
        Self { email: email.into(), display_name: display_name.into() }
    }
}

//--------------------------------------      Notification      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationEvent {
    DeliveryReceived,
    DeliveryApproved,
    RevisionRequested,
    ChatMessage,
}

impl Display for NotificationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeliveryReceived => write!(f, "DELIVERY_RECEIVED"),
            Self::DeliveryApproved => write!(f, "DELIVERY_APPROVED"),
            Self::RevisionRequested => write!(f, "REVISION_REQUESTED"),
            Self::ChatMessage => write!(f, "CHAT_MESSAGE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub order_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    pub title: String,
    pub message: String,
}

/// A message for the external notification sink (email, push, in-app inbox).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub event: NotificationEvent,
    pub recipient_id: i64,
    pub payload: NotificationPayload,
}

impl Notification {
    pub fn delivery_received(delivery: &Delivery) -> Self {
        Self::for_order(
            NotificationEvent::DeliveryReceived,
            delivery.buyer_id,
            delivery.order_id,
            "Work delivered",
            format!(
                "The seller has delivered the work for order #{}. Review it and approve it if it is complete.",
                delivery.order_id
            ),
        )
        .with_delivery_id(delivery.id)
    }

    pub fn delivery_approved(delivery: &Delivery) -> Self {
        Self::for_order(
            NotificationEvent::DeliveryApproved,
            delivery.seller_id,
            delivery.order_id,
            "Work approved",
            "The buyer approved your delivery. The order is complete.".to_string(),
        )
        .with_delivery_id(delivery.id)
    }

    pub fn revision_requested(delivery: &Delivery, feedback: &str) -> Self {
        Self::for_order(
            NotificationEvent::RevisionRequested,
            delivery.seller_id,
            delivery.order_id,
            "Revision requested",
            format!("The buyer asked for a revision of your delivery. Feedback: \"{feedback}\""),
        )
        .with_delivery_id(delivery.id)
    }

    pub fn chat_message(chat: &Chat, sender_id: i64, excerpt: &str) -> Self {
        let mut notification = Self::for_order(
            NotificationEvent::ChatMessage,
            chat.counterpart_of(sender_id),
            chat.order_id,
            "New message",
            excerpt.to_string(),
        );
        notification.payload.chat_id = Some(chat.id);
        notification
    }

    fn for_order(event: NotificationEvent, recipient_id: i64, order_id: i64, title: &str, message: String) -> Self {
        let payload = NotificationPayload {
            order_id,
            delivery_id: None,
            chat_id: None,
            message_id: None,
            title: title.to_string(),
            message,
        };
        Self { event, recipient_id, payload }
    }

    pub fn with_delivery_id(mut self, id: i64) -> Self {
        self.payload.delivery_id = Some(id);
        self
    }

    pub fn with_message_id(mut self, id: i64) -> Self {
        self.payload.message_id = Some(id);
        self
    }

    /// Notifications are delivered at most once per event and subject.
    pub fn idempotency_key(&self) -> String {
        let p = &self.payload;
        let subject = match (p.message_id, p.delivery_id) {
            (Some(m), _) => format!("message:{m}"),
            (None, Some(d)) => format!("delivery:{d}"),
            (None, None) => format!("order:{}", p.order_id),
        };
        format!("notify:{}:{subject}:{}", self.event, self.recipient_id)
    }
}

//--------------------------------------       OutboxTask       -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OutboxTaskKind {
    ProvisionChat,
    Notify,
}

impl Display for OutboxTaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProvisionChat => write!(f, "ProvisionChat"),
            Self::Notify => write!(f, "Notify"),
        }
    }
}

/// The recorded intent of a deferred side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboxPayload {
    ProvisionChat { order_id: i64 },
    Notify { notification: Notification },
}

impl OutboxPayload {
    pub fn kind(&self) -> OutboxTaskKind {
        match self {
            Self::ProvisionChat { .. } => OutboxTaskKind::ProvisionChat,
            Self::Notify { .. } => OutboxTaskKind::Notify,
        }
    }

    pub fn order_id(&self) -> i64 {
        match self {
            Self::ProvisionChat { order_id } => *order_id,
            Self::Notify { notification } => notification.payload.order_id,
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            Self::ProvisionChat { order_id } => format!("provision_chat:{order_id}"),
            Self::Notify { notification } => notification.idempotency_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxTask {
    pub id: i64,
    pub kind: OutboxTaskKind,
    pub order_id: Option<i64>,
    pub payload: Json<OutboxPayload>,
    pub idempotency_key: String,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub next_attempt_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

impl OutboxTask {
    pub fn is_pending(&self) -> bool {
        self.processed_at.is_none() && self.failed_at.is_none()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_status_round_trip() {
        for s in ["REQUESTED", "PENDING_PAYMENT", "PAID", "IN_PROGRESS", "DELIVERED", "REVISION_REQUIRED", "COMPLETED", "CANCELED"]
        {
            let status = OrderStatusType::from_str(s).expect("valid status");
            assert_eq!(status.to_string(), s);
        }
        assert!(OrderStatusType::from_str("Paid").is_err());
        assert_eq!(OrderStatusType::from("garbage".to_string()), OrderStatusType::Requested);
        assert_eq!(serde_json::to_string(&OrderStatusType::PendingPayment).unwrap(), "\"PENDING_PAYMENT\"");
    }

    #[test]
    fn settled_payments_do_not_regress() {
        use PaymentStatus::*;
        assert!(Pending.can_become(Completed));
        assert!(Processing.can_become(Failed));
        assert!(Failed.can_become(Completed));
        assert!(Completed.can_become(Refunded));
        assert!(!Completed.can_become(Pending));
        assert!(!Completed.can_become(Completed));
        assert!(!Refunded.can_become(Completed));
    }

    #[test]
    fn delivery_edits_keep_order() {
        let file = |id: &str| DeliveryFile {
            id: id.to_string(),
            filename: format!("{id}.wav"),
            mime_type: "audio/wav".into(),
            size: 10,
            url: format!("https://files.example.com/{id}"),
        };
        let mut files = vec![file("a"), file("b"), file("c")];
        let edit = DeliveryEdit { description: None, add_files: vec![file("d")], remove_file_ids: vec!["b".into()] };
        edit.apply_to(&mut files);
        let ids = files.iter().map(|f| f.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "c", "d"]);
    }

    #[test]
    fn notification_keys() {
        let chat = Chat { id: 3, order_id: 7, buyer_id: 1, seller_id: 2, created_at: Utc::now() };
        let n = Notification::chat_message(&chat, 1, "hi").with_message_id(11);
        assert_eq!(n.recipient_id, 2);
        assert_eq!(n.idempotency_key(), "notify:CHAT_MESSAGE:message:11:2");
        let payload = OutboxPayload::Notify { notification: n };
        assert_eq!(payload.kind(), OutboxTaskKind::Notify);
        assert_eq!(payload.order_id(), 7);
        assert_eq!(OutboxPayload::ProvisionChat { order_id: 7 }.idempotency_key(), "provision_chat:7");
    }
}
