use mkt_common::{is_valid_currency_code, MinorUnits};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewOrder, OrderStatusType, Service},
    traits::MarketplaceError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub service_id: i64,
    pub seller_id: i64,
    pub amount: i64,
    pub currency: String,
    /// Ask the seller to confirm the price before paying
    #[serde(default)]
    pub as_request: bool,
}

impl NewOrderRequest {
    pub fn validate(&self) -> Result<(), MarketplaceError> {
        if self.amount < 1 {
            return Err(MarketplaceError::InvalidRequest("The amount must be at least 1".into()));
        }
        if !is_valid_currency_code(&self.currency) {
            return Err(MarketplaceError::InvalidRequest(format!("{} is not a valid currency code", self.currency)));
        }
        Ok(())
    }

    /// Checks the request against the service it refers to, and builds the order.
    pub fn into_new_order(self, buyer_id: i64, service: &Service) -> Result<NewOrder, MarketplaceError> {
        if service.owner_id == buyer_id {
            return Err(MarketplaceError::InvalidRequest("You cannot order your own service".into()));
        }
        if service.owner_id != self.seller_id {
            return Err(MarketplaceError::InvalidRequest("The seller must be the owner of the service".into()));
        }
        let order = NewOrder::new(service.id, buyer_id, self.seller_id, MinorUnits::from(self.amount), &self.currency)
            .as_request(self.as_request);
        Ok(order)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyOrderRequest {
    pub status: Option<OrderStatusType>,
    pub amount: Option<i64>,
}

impl ModifyOrderRequest {
    /// Statuses that users may set directly. Everything else is the result of a payment, delivery or review.
    pub const MANUAL_STATUSES: [OrderStatusType; 3] =
        [OrderStatusType::PendingPayment, OrderStatusType::InProgress, OrderStatusType::Canceled];

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.amount.is_none()
    }

    pub fn validate(&self) -> Result<(), MarketplaceError> {
        if self.is_empty() {
            return Err(MarketplaceError::InvalidRequest("Nothing to update".into()));
        }
        if let Some(status) = self.status {
            if !Self::MANUAL_STATUSES.contains(&status) {
                return Err(MarketplaceError::InvalidRequest(format!(
                    "{status} is set by the order workflow and cannot be set directly"
                )));
            }
        }
        if matches!(self.amount, Some(a) if a < 1) {
            return Err(MarketplaceError::InvalidRequest("The amount must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;

    fn service() -> Service {
        Service {
            id: 4,
            owner_id: 2,
            title: "Mixing".into(),
            description: None,
            base_price: MinorUnits::from(10_000),
            currency: "ARS".into(),
            rating_avg: 0.0,
            rating_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn new_order_requests() {
        let json = r#"{"serviceId": 4, "sellerId": 2, "amount": 15000, "currency": "ARS", "asRequest": true}"#;
        let req: NewOrderRequest = serde_json::from_str(json).unwrap();
        assert!(req.validate().is_ok());
        let order = req.clone().into_new_order(1, &service()).unwrap();
        assert_eq!(order.status, OrderStatusType::Requested);
        assert_eq!(order.amount, MinorUnits::from(15_000));

        assert!(req.clone().into_new_order(2, &service()).is_err());
        let wrong_seller = NewOrderRequest { seller_id: 3, ..req.clone() };
        assert!(wrong_seller.into_new_order(1, &service()).is_err());
        let bad_currency = NewOrderRequest { currency: "ars".into(), ..req.clone() };
        assert!(bad_currency.validate().is_err());
        let zero = NewOrderRequest { amount: 0, ..req };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn as_request_defaults_to_false() {
        let json = r#"{"serviceId": 4, "sellerId": 2, "amount": 100, "currency": "USD"}"#;
        let req: NewOrderRequest = serde_json::from_str(json).unwrap();
        let order = req.into_new_order(1, &service()).unwrap();
        assert_eq!(order.status, OrderStatusType::PendingPayment);
    }

    #[test]
    fn workflow_statuses_cannot_be_set() {
        let req = ModifyOrderRequest { status: Some(OrderStatusType::Paid), amount: None };
        assert!(req.validate().is_err());
        let req = ModifyOrderRequest { status: Some(OrderStatusType::Canceled), amount: None };
        assert!(req.validate().is_ok());
        assert!(ModifyOrderRequest::default().validate().is_err());
    }
}
