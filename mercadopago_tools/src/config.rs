use log::*;
use mkt_common::Secret;

pub const DEFAULT_API_URL: &str = "https://api.mercadopago.com";

#[derive(Debug, Clone, Default)]
pub struct MercadoPagoConfig {
    pub api_url: String,
    pub access_token: Secret<String>,
    /// The key Mercado Pago signs webhook notifications with
    pub webhook_secret: Secret<String>,
}

impl MercadoPagoConfig {
    pub fn new<S: Into<String>>(access_token: S) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_token: Secret::new(access_token.into()),
            webhook_secret: Secret::default(),
        }
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("MKT_MERCADOPAGO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let access_token = Secret::new(std::env::var("MKT_MERCADOPAGO_ACCESS_TOKEN").unwrap_or_else(|_| {
            warn!("🪛️ MKT_MERCADOPAGO_ACCESS_TOKEN is not set. Checkouts cannot be created.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("MKT_MERCADOPAGO_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("🪛️ MKT_MERCADOPAGO_WEBHOOK_SECRET is not set. Webhook signatures cannot be verified.");
            String::default()
        }));
        Self { api_url, access_token, webhook_secret }
    }
}
