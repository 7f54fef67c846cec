use chrono::{DateTime, FixedOffset};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The body of `POST /checkout/preferences`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<Payer>,
    pub back_urls: BackUrls,
    pub auto_return: String,
    /// Echoed back on every payment made against the preference. We put the order id here.
    pub external_reference: String,
    pub notification_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub currency_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// The parts of a created preference that we use.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preference {
    pub id: String,
    pub init_point: String,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}

/// A payment as returned by `GET /v1/payments/{id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MpPayment {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub status_detail: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub transaction_amount: Option<f64>,
    #[serde(default)]
    pub currency_id: Option<String>,
    #[serde(default)]
    pub date_approved: Option<DateTime<FixedOffset>>,
}

/// A webhook notification. Only `type` and `data.id` matter; the payment itself is always fetched again.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type", alias = "topic", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    pub data: WebhookData,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookData {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Mercado Pago sends numeric ids in some payloads and strings in others.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected a string or number id, got {other}"))),
    }
}
