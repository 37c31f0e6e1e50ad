//! CloudStack API errors

use reqwest::StatusCode;

/// Error returned by a CloudStack API lookup
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The lookup matched no virtual machine
    #[error("no match found for {0}")]
    NotFound(String),

    /// A lookup by name matched more than one virtual machine
    #[error("found {count} matches for {name}")]
    Ambiguous { name: String, count: usize },

    /// The management server answered with a non-success status
    #[error("API request failed: {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response: {0}")]
    Decode(String),

    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl ApiError {
    /// True when the lookup succeeded but returned zero matches
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_zero_matches_is_not_found() {
        assert!(ApiError::NotFound("node-1".into()).is_not_found());
        assert!(!ApiError::Ambiguous {
            name: "node-1".into(),
            count: 2
        }
        .is_not_found());
        assert!(!ApiError::Status {
            status: StatusCode::NOT_FOUND,
            message: "not found".into()
        }
        .is_not_found());
    }
}
