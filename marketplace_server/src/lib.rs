//! # Marketplace server
//! This crate hosts the HTTP server for the services marketplace. It is responsible for:
//! * Authenticating callers with bearer access tokens.
//! * Exposing the order, payment, delivery, chat and review workflows of the marketplace engine under `/api`.
//! * Receiving Mercado Pago payment notifications and reconciling them against local payments.
//! * Running the outbox worker, which retries deferred side effects in the background.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following unauthenticated routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/payments/mercadopago/webhook`: The webhook route for Mercado Pago notifications. Requests must carry a valid
//!   `x-signature` header unless signature checks are switched off.
//!
//! Everything else lives under `/api` and is listed in [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod outbox_worker;
pub mod routes;
pub mod server;
