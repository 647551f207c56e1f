//! Error types for the Advantage API clients

use thiserror::Error;

/// Result type alias for Advantage client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type shared by both API clients.
///
/// The upstream APIs answer with a mix of transport failures, non-success
/// statuses, and occasionally non-JSON bodies; every client method funnels
/// those into this one hierarchy so callers match on a single type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Non-success response. `body` is the raw response text, preserved
    /// verbatim so upstream diagnostics survive into the error message.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid API response: {0}")]
    Decode(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Network("Request timed out".to_string())
        } else if err.is_connect() {
            Error::Network("Failed to connect to API".to_string())
        } else if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_message() {
        let err = Error::Auth("token request failed (401)".to_string());
        assert!(err.to_string().contains("Authentication failed"));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_status_error_preserves_body() {
        let err = Error::Status {
            status: 503,
            body: "upstream unavailable".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("upstream unavailable"));
    }

    #[test]
    fn test_decode_error_message() {
        let err = Error::Decode("expected value at line 1".to_string());
        assert!(err.to_string().contains("Invalid API response"));
    }

    #[test]
    fn test_network_error_message() {
        let err = Error::Network("Connection refused".to_string());
        assert!(err.to_string().contains("Connection refused"));
    }

    #[test]
    fn test_error_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();

        match err {
            Error::Decode(_) => (),
            _ => panic!("Expected Error::Decode"),
        }
    }
}
