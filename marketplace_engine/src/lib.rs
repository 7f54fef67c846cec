//! Marketplace Engine
//!
//! The marketplace engine runs the order lifecycle of a services marketplace: a buyer orders a service, pays for it
//! through a checkout gateway, the seller delivers the work, the buyer approves it or asks for a revision, and finally
//! leaves a review. Buyer and seller talk in a chat that belongs to the order.
//!
//! The library is divided into these parts:
//! 1. Domain types ([`db_types`]), the order state machine ([`lifecycle`]) and the authorization rules ([`policy`]).
//! 2. Storage contracts ([`traits`]) and the SQLite backend that implements them.
//! 3. The public API ([`mod@mkt_api`]). Each API is generic over the storage traits it needs.
//!
//! The engine also emits events (an order was paid, an order was cancelled, a notification is due) that the host
//! application can subscribe to via [`events::EventHooks`].
pub mod db_types;
pub mod events;
pub mod lifecycle;
pub mod mkt_api;
pub mod policy;
pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use mkt_api::{
    chat_api::ChatApi,
    chat_objects,
    delivery_api::DeliveryApi,
    delivery_objects,
    order_flow_api::OrderFlowApi,
    order_objects,
    outbox_api::{OutboxApi, OutboxRunSummary, RetryPolicy},
    payment_api::PaymentApi,
    payment_objects,
    review_api::ReviewApi,
    review_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::MarketplaceError;
