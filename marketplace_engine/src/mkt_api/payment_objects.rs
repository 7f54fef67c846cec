use std::time::Duration;

use mkt_common::MinorUnits;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, Payment, PaymentMethod, PaymentStatus, ReconciledPayment},
    traits::MarketplaceError,
};

/// Where the checkout sends the buyer back to, and where the gateway posts notifications.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Base URL of the buyer-facing web app
    pub app_url: String,
    /// Public base URL of this API
    pub api_url: String,
    pub gateway_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:3000".into(),
            api_url: "http://localhost:8360".into(),
            gateway_timeout: Duration::from_secs(10),
        }
    }
}

impl CheckoutConfig {
    pub fn back_url(&self, outcome: &str, order_id: i64) -> String {
        format!("{}/payment/{outcome}?orderId={order_id}", self.app_url.trim_end_matches('/'))
    }

    pub fn notification_url(&self) -> String {
        format!("{}/payments/mercadopago/webhook", self.api_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub init_point: String,
    pub preference_id: String,
    pub payment_id: i64,
}

/// What happened to a gateway notification.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// Not a payment notification
    Ignored,
    /// The gateway payment does not reference one of our orders
    UnknownReference(String),
    /// The order has no gateway payment on record. Nothing is created on the gateway's word alone.
    NoLocalPayment(i64),
    Reconciled(ReconciledPayment),
}

impl CallbackOutcome {
    /// The order that became paid as a result of this notification, if any
    pub fn paid_order(&self) -> Option<&Order> {
        match self {
            Self::Reconciled(r) => r.paid_order.as_ref(),
            _ => None,
        }
    }
}

/// Maps the gateway's status vocabulary onto ours. Anything unrecognised is treated as pending, never as success.
pub fn map_gateway_status(status: &str) -> PaymentStatus {
    match status {
        "approved" => PaymentStatus::Completed,
        "rejected" | "cancelled" => PaymentStatus::Failed,
        "refunded" | "charged_back" => PaymentStatus::Refunded,
        "in_process" => PaymentStatus::Processing,
        _ => PaymentStatus::Pending,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaymentRequest {
    pub order_id: i64,
    pub amount: i64,
    pub currency: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub description: Option<String>,
}

fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Manual
}

impl NewPaymentRequest {
    /// A payment must be for exactly what the order costs. Gateway payments are only ever opened through a checkout,
    /// since the latest gateway row for an order is the one notifications settle.
    pub fn check_against(&self, order: &Order) -> Result<(), MarketplaceError> {
        if self.payment_method == PaymentMethod::MercadoPago {
            return Err(MarketplaceError::InvalidRequest(
                "Mercado Pago payments are created by opening a checkout, not recorded by hand".into(),
            ));
        }
        if MinorUnits::from(self.amount) != order.amount || self.currency != order.currency {
            return Err(MarketplaceError::InvalidRequest(format!(
                "Payment of {} {} does not match the order total of {} {}",
                self.amount,
                self.currency,
                order.amount.value(),
                order.currency
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    pub payment: Payment,
    pub order: Order,
}
