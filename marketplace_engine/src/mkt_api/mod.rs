//! # Marketplace engine public API
//!
//! The `mkt_api` module exposes the programmatic API of the marketplace. It is split by workflow so that a server can
//! wire up only the parts it needs.
//!
//! * [`order_flow_api`] places orders and moves them through the seller-driven part of the lifecycle.
//! * [`payment_api`] opens gateway checkouts, reconciles gateway notifications and handles manual payments and
//!   refunds.
//! * [`delivery_api`] runs delivery submission, approval and revision requests.
//! * [`chat_api`] serves the per-order conversation.
//! * [`review_api`] manages reviews of completed orders.
//! * [`outbox_api`] delivers deferred side effects with retries.
//!
//! The `*_objects` modules hold the request and response types for each API.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits it needs. Every operation takes the
//! authenticated [`Actor`](crate::policy::Actor) as its first argument.
//!
//! ```rust,ignore
//! use marketplace_engine::{policy::Actor, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/marketplace.db", 5).await?;
//! let api = OrderFlowApi::new(db, producers);
//! let orders = api.list_orders(&Actor::user(42)).await?;
//! ```

pub mod chat_api;
pub mod chat_objects;
pub mod delivery_api;
pub mod delivery_objects;
pub mod order_flow_api;
pub mod order_objects;
pub mod outbox_api;
pub mod payment_api;
pub mod payment_objects;
pub mod review_api;
pub mod review_objects;
