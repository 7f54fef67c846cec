use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::MercadoPagoConfig,
    data_objects::{MpPayment, Preference, PreferenceRequest},
    MercadoPagoApiError,
};

#[derive(Clone)]
pub struct MercadoPagoApi {
    config: MercadoPagoConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for MercadoPagoApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MercadoPagoApi({})", self.config.api_url)
    }
}

impl MercadoPagoApi {
    pub fn new(config: MercadoPagoConfig) -> Result<Self, MercadoPagoApiError> {
        if config.access_token.is_empty() {
            return Err(MercadoPagoApiError::NotConfigured("An access token is required".into()));
        }
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| MercadoPagoApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MercadoPagoApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MercadoPagoConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, MercadoPagoApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| MercadoPagoApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MercadoPagoApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message =
                response.text().await.map_err(|e| MercadoPagoApiError::RestResponseError(e.to_string()))?;
            Err(MercadoPagoApiError::QueryError { status, message })
        }
    }

    /// Creates a Checkout Pro preference. The buyer completes payment at the returned `init_point`.
    pub async fn create_preference(&self, request: &PreferenceRequest) -> Result<Preference, MercadoPagoApiError> {
        debug!("Creating preference for reference {}", request.external_reference);
        let preference: Preference =
            self.rest_query(Method::POST, "/checkout/preferences", &[], Some(request)).await?;
        info!("Preference {} created for reference {}", preference.id, request.external_reference);
        Ok(preference)
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<MpPayment, MercadoPagoApiError> {
        let path = format!("/v1/payments/{payment_id}");
        let payment: MpPayment = self.rest_query(Method::GET, &path, &[], None::<()>).await?;
        debug!("Payment {payment_id} is {} (reference {:?})", payment.status, payment.external_reference);
        Ok(payment)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_requires_a_token() {
        let err = MercadoPagoApi::new(MercadoPagoConfig::default()).err().unwrap();
        assert!(matches!(err, MercadoPagoApiError::NotConfigured(_)));
    }

    #[test]
    fn urls() {
        let mut config = MercadoPagoConfig::new("TEST-123");
        config.api_url = "http://localhost:9999/".into();
        let api = MercadoPagoApi::new(config).unwrap();
        assert_eq!(api.url("/v1/payments/5"), "http://localhost:9999/v1/payments/5");
        let api = MercadoPagoApi::new(MercadoPagoConfig::new("TEST-123")).unwrap();
        assert_eq!(api.url("/checkout/preferences"), "https://api.mercadopago.com/checkout/preferences");
    }
}
