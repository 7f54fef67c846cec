use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The parts of Mercado Pago's `x-signature` header, `ts=<unix time>,v1=<hex hmac>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSignature {
    pub ts: String,
    pub v1: String,
}

impl WebhookSignature {
    pub fn parse(header: &str) -> Option<Self> {
        let mut ts = None;
        let mut v1 = None;
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("ts", val)) => ts = Some(val.trim().to_string()),
                Some(("v1", val)) => v1 = Some(val.trim().to_string()),
                _ => {},
            }
        }
        match (ts, v1) {
            (Some(ts), Some(v1)) if !ts.is_empty() && !v1.is_empty() => Some(Self { ts, v1 }),
            _ => None,
        }
    }
}

/// Builds the string Mercado Pago signs: `id:<data.id>;request-id:<x-request-id>;ts:<ts>;`. Parts whose value is
/// missing from the request are left out. Alphanumeric ids are signed in lower case.
pub fn signature_manifest(data_id: Option<&str>, request_id: Option<&str>, ts: &str) -> String {
    let mut manifest = String::new();
    if let Some(id) = data_id.filter(|s| !s.is_empty()) {
        manifest.push_str(&format!("id:{};", id.to_lowercase()));
    }
    if let Some(request_id) = request_id.filter(|s| !s.is_empty()) {
        manifest.push_str(&format!("request-id:{request_id};"));
    }
    manifest.push_str(&format!("ts:{ts};"));
    trace!("🔐️ Signature manifest: {manifest}");
    manifest
}

/// Constant-time check of a hex-encoded HMAC-SHA256 signature.
pub fn verify_hmac(secret: &str, data: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(&signature).is_ok()
}

/// Signs `data` the way Mercado Pago does. Used to build signed requests in tests.
#[cfg(test)]
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}
