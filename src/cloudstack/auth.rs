//! CloudStack Authentication
//!
//! Every API request carries the caller's API key and a signature computed
//! over the request parameters with the secret key:
//!
//! 1. parameters (including `apiKey`) are sorted by name
//! 2. joined as `name=urlencoded(value)` with `&`
//! 3. the whole string is lowercased and signed with HMAC-SHA1
//! 4. the base64 signature is appended as the URL-encoded `signature` parameter

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

/// API key pair used to sign requests
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    secret_key: String,
}

impl ApiCredentials {
    pub fn new(api_key: &str, secret_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    /// Build the signed query string for a set of request parameters
    pub fn signed_query(&self, params: &[(&str, &str)]) -> String {
        let mut pairs: Vec<(&str, String)> = params
            .iter()
            .map(|(name, value)| (*name, encode(value)))
            .collect();
        pairs.push(("apiKey", encode(&self.api_key)));
        pairs.sort_by_key(|(name, _)| name.to_lowercase());

        let query = pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("&");

        let signature = self.sign(&query.to_lowercase());
        format!("{}&signature={}", query, encode(&signature))
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = Hmac::<Sha1>::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC key should be valid");
        mac.update(payload.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }
}

/// Percent-encode a value, spaces as `%20`
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
