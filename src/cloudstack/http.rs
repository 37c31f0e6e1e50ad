//! HTTP utilities for CloudStack API calls

use super::error::ApiError;
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull `errortext` out of a CloudStack error body.
///
/// Errors come back wrapped in the command's response object, e.g.
/// `{"listvirtualmachinesresponse": {"errorcode": 431, "errortext": "..."}}`.
fn error_text(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .as_object()?
        .values()
        .find_map(|inner| inner.get("errortext"))
        .and_then(|text| text.as_str())
        .map(str::to_string)
}

/// HTTP client wrapper for CloudStack API calls
#[derive(Clone)]
pub struct CloudStackHttpClient {
    client: Client,
}

impl CloudStackHttpClient {
    /// Create a new HTTP client, verifying TLS certificates when `verify_tls` is set
    pub fn new(verify_tls: bool) -> Result<Self, ApiError> {
        if !verify_tls {
            tracing::warn!("TLS certificate verification is disabled for the CloudStack API");
        }

        let client = Client::builder()
            .user_agent(concat!("cloudstack-provider/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Make a signed GET request. The URL must already carry the signed query.
    pub async fn get(&self, url: Url) -> Result<Value, ApiError> {
        // The query holds the API key and signature
        tracing::debug!("GET {}", url.path());

        let response = self.client.get(url).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            let message = error_text(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            });
            return Err(ApiError::Status { status, message });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
