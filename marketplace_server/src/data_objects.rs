use std::fmt::Display;

use marketplace_engine::{
    db_types::{Delivery, Order},
    traits::OutboxFilter,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The webhook's answer. The gateway retries anything that is not a 200, so failures are reported in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub ok: bool,
}

/// A delivery together with the order it moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub delivery: Delivery,
    pub order: Order,
}

impl From<(Delivery, Order)> for DeliveryOutcome {
    fn from((delivery, order): (Delivery, Order)) -> Self {
        Self { delivery, order }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceParams {
    pub order_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboxQuery {
    pub status: Option<OutboxFilter>,
}

/// Older notification formats put the event type and payment id in the query string instead of the body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookQuery {
    #[serde(rename = "type", alias = "topic")]
    pub event_type: Option<String>,
    #[serde(rename = "data.id", alias = "id")]
    pub data_id: Option<String>,
}
