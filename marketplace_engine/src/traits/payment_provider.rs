use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Could not reach the payment provider. {0}")]
    Unreachable(String),
    #[error("The payment provider rejected the request. {0}")]
    Rejected(String),
    #[error("The payment provider returned an unexpected response. {0}")]
    InvalidResponse(String),
}

/// Everything the provider needs to open a checkout for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub order_id: i64,
    pub service_id: i64,
    pub title: String,
    pub description: String,
    /// Price in major units of `currency`, as the provider expects
    pub unit_price: f64,
    pub currency: String,
    pub payer_email: Option<String>,
    pub success_url: String,
    pub failure_url: String,
    pub pending_url: String,
    pub notification_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPreference {
    pub preference_id: String,
    /// Where the buyer is sent to complete the payment
    pub init_point: String,
}

/// The provider's view of a payment, as fetched when reconciling a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    /// The provider's raw status vocabulary, e.g. `approved`, `in_process`, `rejected`
    pub status: String,
    /// The order id we sent when creating the checkout, if the provider echoed it back
    pub external_reference: Option<String>,
}

/// An external payment gateway.
#[allow(async_fn_in_trait)]
pub trait PaymentProvider: Clone {
    async fn create_preference(&self, request: &CheckoutRequest) -> Result<CheckoutPreference, ProviderError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, ProviderError>;
}
