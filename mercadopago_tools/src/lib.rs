//! Mercado Pago REST client.
//!
//! Covers the two calls the marketplace needs: creating a Checkout Pro preference and looking up a payment when a
//! webhook notification arrives.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::MercadoPagoApi;
pub use config::MercadoPagoConfig;
pub use data_objects::{
    BackUrls,
    MpPayment,
    Payer,
    Preference,
    PreferenceItem,
    PreferenceRequest,
    WebhookData,
    WebhookNotification,
};
pub use error::MercadoPagoApiError;
