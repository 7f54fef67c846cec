//! Connects the engine's [`PaymentProvider`] contract to the Mercado Pago REST client.
use log::*;
use marketplace_engine::traits::{CheckoutPreference, CheckoutRequest, GatewayPayment, PaymentProvider, ProviderError};
use mercadopago_tools::{
    BackUrls,
    MercadoPagoApi,
    MercadoPagoApiError,
    MercadoPagoConfig,
    Payer,
    PreferenceItem,
    PreferenceRequest,
};

#[derive(Debug, Clone)]
pub struct MercadoPagoProvider {
    api: Option<MercadoPagoApi>,
}

impl MercadoPagoProvider {
    /// A provider without credentials still starts. Every call then fails as if the gateway were unreachable.
    pub fn from_config(config: MercadoPagoConfig) -> Self {
        match MercadoPagoApi::new(config) {
            Ok(api) => Self { api: Some(api) },
            Err(e) => {
                warn!("💳️ Mercado Pago checkouts are disabled. {e}");
                Self { api: None }
            },
        }
    }

    fn api(&self) -> Result<&MercadoPagoApi, ProviderError> {
        self.api.as_ref().ok_or_else(|| ProviderError::Unreachable("Mercado Pago is not configured".into()))
    }
}

impl PaymentProvider for MercadoPagoProvider {
    async fn create_preference(&self, request: &CheckoutRequest) -> Result<CheckoutPreference, ProviderError> {
        let preference = self.api()?.create_preference(&preference_request(request)).await.map_err(provider_error)?;
        Ok(CheckoutPreference { preference_id: preference.id, init_point: preference.init_point })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, ProviderError> {
        let payment = self.api()?.get_payment(payment_id).await.map_err(provider_error)?;
        Ok(GatewayPayment { id: payment.id, status: payment.status, external_reference: payment.external_reference })
    }
}

pub fn preference_request(request: &CheckoutRequest) -> PreferenceRequest {
    PreferenceRequest {
        items: vec![PreferenceItem {
            id: request.service_id.to_string(),
            title: request.title.clone(),
            description: request.description.clone(),
            quantity: 1,
            unit_price: request.unit_price,
            currency_id: request.currency.clone(),
        }],
        payer: request.payer_email.clone().map(|email| Payer { email }),
        back_urls: BackUrls {
            success: request.success_url.clone(),
            failure: request.failure_url.clone(),
            pending: request.pending_url.clone(),
        },
        auto_return: "approved".to_string(),
        external_reference: request.order_id.to_string(),
        notification_url: request.notification_url.clone(),
    }
}

fn provider_error(e: MercadoPagoApiError) -> ProviderError {
    match e {
        e if e.is_rejection() => ProviderError::Rejected(e.to_string()),
        MercadoPagoApiError::JsonError(s) => ProviderError::InvalidResponse(s),
        e => ProviderError::Unreachable(e.to_string()),
    }
}
