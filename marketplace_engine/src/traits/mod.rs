//! # Storage and integration contracts.
//!
//! The engine APIs are generic over these traits. A storage backend implements the `*Management` traits, and
//! [`MarketplaceDatabase`] ties them together. The SQLite backend lives in [`crate::sqlite`].
//!
//! * [`OrderManagement`] stores orders and applies conditional status transitions.
//! * [`PaymentManagement`] stores payments and reconciles them with their orders.
//! * [`DeliveryManagement`] drives the delivery workflow.
//! * [`ChatManagement`] provisions one chat per order and tracks message read state.
//! * [`ReviewManagement`] stores reviews and keeps the rating aggregates current.
//! * [`OutboxManagement`] records deferred side effects.
//! * [`CatalogManagement`] reads services and accounts.
//!
//! Two traits describe collaborators outside the engine: the [`PaymentProvider`] (the checkout gateway) and the
//! [`NotificationSink`].
mod catalog_management;
mod chat_management;
mod data_objects;
mod delivery_management;
mod errors;
mod marketplace_database;
mod notification_sink;
mod order_management;
mod outbox_management;
mod payment_management;
mod payment_provider;
mod review_management;

pub use catalog_management::CatalogManagement;
pub use chat_management::ChatManagement;
pub use data_objects::{ChatSummary, OutboxFilter, RetryPlan};
pub use delivery_management::DeliveryManagement;
pub use errors::MarketplaceError;
pub use marketplace_database::MarketplaceDatabase;
pub use notification_sink::{NotificationError, NotificationSink};
pub use order_management::OrderManagement;
pub use outbox_management::OutboxManagement;
pub use payment_management::PaymentManagement;
pub use payment_provider::{CheckoutPreference, CheckoutRequest, GatewayPayment, PaymentProvider, ProviderError};
pub use review_management::ReviewManagement;
