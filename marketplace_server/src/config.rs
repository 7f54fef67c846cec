use std::{env, str::FromStr, time::Duration};

use log::*;
use marketplace_engine::{chat_objects::ChatLimits, payment_objects::CheckoutConfig, RetryPolicy};
use mercadopago_tools::MercadoPagoConfig;
use mkt_common::{helpers::parse_boolean_flag, Secret};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8360;
const DEFAULT_APP_URL: &str = "http://localhost:3000";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_OUTBOX_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_OUTBOX_BATCH_SIZE: i64 = 50;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Where gateway checkouts send buyers back to, and where the gateway posts notifications
    pub checkout: CheckoutConfig,
    pub mercadopago: MercadoPagoConfig,
    /// If false, webhook notifications are accepted without checking their signature. **DANGER**
    pub webhook_signature_checks: bool,
    pub chat_limits: ChatLimits,
    pub outbox: OutboxConfig,
}

#[derive(Clone, Debug)]
pub struct OutboxConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
    pub retry_policy: RetryPolicy,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_OUTBOX_POLL_INTERVAL_SECS),
            batch_size: DEFAULT_OUTBOX_BATCH_SIZE,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            checkout: CheckoutConfig::default(),
            mercadopago: MercadoPagoConfig::default(),
            webhook_signature_checks: true,
            chat_limits: ChatLimits::default(),
            outbox: OutboxConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env_or_default("MKT_PORT", DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MKT_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let app_url = env::var("MKT_APP_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MKT_APP_URL is not set. Checkout return links will point to {DEFAULT_APP_URL}");
            DEFAULT_APP_URL.to_string()
        });
        let api_url = env::var("MKT_API_URL").ok().unwrap_or_else(|| {
            let url = format!("http://{host}:{port}");
            warn!("🪛️ MKT_API_URL is not set. The gateway will be asked to notify {url}, which is probably not public.");
            url
        });
        let gateway_timeout =
            Duration::from_secs(env_or_default("MKT_GATEWAY_TIMEOUT_SECS", DEFAULT_GATEWAY_TIMEOUT_SECS));
        let checkout = CheckoutConfig { app_url, api_url, gateway_timeout };
        let mercadopago = MercadoPagoConfig::new_from_env_or_default();
        let webhook_signature_checks = parse_boolean_flag(env::var("MKT_WEBHOOK_SIGNATURE_CHECKS").ok(), true);
        if !webhook_signature_checks {
            warn!("🚨️ Webhook signature checks are disabled. Anyone can post payment notifications to this server.");
        }
        let chat_limits = match env::var("MKT_CHAT_LIST_LIMIT_CAP").ok().map(|s| s.parse::<i64>()) {
            Some(Ok(cap)) if cap > 0 => ChatLimits::default().with_chat_cap(cap),
            Some(_) => {
                warn!("🪛️ MKT_CHAT_LIST_LIMIT_CAP must be a positive integer. Using the default.");
                ChatLimits::default()
            },
            None => ChatLimits::default(),
        };
        let outbox = OutboxConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            auth,
            checkout,
            mercadopago,
            webhook_signature_checks,
            chat_limits,
            outbox,
        }
    }
}

impl OutboxConfig {
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();
        config.poll_interval =
            Duration::from_secs(env_or_default("MKT_OUTBOX_POLL_INTERVAL_SECS", DEFAULT_OUTBOX_POLL_INTERVAL_SECS));
        config.retry_policy.max_attempts =
            env_or_default("MKT_OUTBOX_MAX_ATTEMPTS", config.retry_policy.max_attempts).max(1);
        config
    }
}

/// Reads and parses an environment variable. Unset variables quietly take the default; unparseable ones log a warning.
fn env_or_default<T: FromStr + std::fmt::Display>(name: &str, default: T) -> T
where T::Err: std::fmt::Display {
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key access tokens are signed with. Tokens are issued by the identity service, which shares this key.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No externally issued \
             token will be accepted. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("MKT_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [MKT_JWT_SECRET]")))?;
        if secret.trim().len() < 16 {
            return Err(ServerError::ConfigurationError("MKT_JWT_SECRET must be at least 16 characters long".into()));
        }
        Ok(Self::new(secret))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_auth_config_is_random() {
        let a = AuthConfig::default();
        let b = AuthConfig::default();
        assert_eq!(a.jwt_secret.reveal().len(), 48);
        assert_ne!(a.jwt_secret.reveal(), b.jwt_secret.reveal());
    }

    #[test]
    fn secrets_are_not_printed() {
        let config = ServerConfig { auth: AuthConfig::new("a-very-secret-signing-key"), ..ServerConfig::default() };
        let printed = format!("{config:?}");
        assert!(!printed.contains("a-very-secret-signing-key"));
    }

    #[test]
    fn outbox_defaults() {
        let config = OutboxConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.retry_policy.max_attempts, 8);
    }
}
