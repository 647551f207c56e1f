//! OAuth2 client-credentials authentication for the threat-intel API
//!
//! Acquires bearer tokens from the `/token` endpoint using HTTP Basic
//! credentials and the client_credentials grant. The token is cached with its
//! expiry; `TokenProvider::bearer()` re-runs the exchange when the cached
//! token is past (or within 60 seconds of) expiration, so callers always hold
//! a usable credential.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{Error, Result};

/// Safety buffer subtracted from the token lifetime. A token inside the
/// buffer is replaced before the request is sent, so it cannot race the
/// expiry boundary server-side.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Timeout for token-exchange requests
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable session credentials for the token exchange.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub host: String,
}

/// Fields of the token-endpoint response that matter to the client.
/// Extra fields in the vendor response are ignored.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    token_type: Option<String>,
}

/// A bearer credential with its computed expiry instant.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The raw bearer value, sent as `Authorization: Bearer <value>`
    pub bearer: String,
    /// Instant after which the token is no longer usable
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// True once the token is past, or within the safety buffer of, expiry.
    fn is_expired(&self) -> bool {
        self.expires_at - ChronoDuration::seconds(EXPIRY_BUFFER_SECS) <= Utc::now()
    }
}

/// Manages token acquisition and caching for the threat-intel API.
///
/// The cached token lives behind an `RwLock` so client methods can take
/// `&self`; the write lock is held only for the exchange itself, never
/// across an API round-trip.
pub struct TokenProvider {
    http: HttpClient,
    credentials: Credentials,
    current: RwLock<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http,
            credentials,
            current: RwLock::new(None),
        })
    }

    /// Creates a provider with a pre-seeded token, bypassing the exchange.
    /// Used by tests to avoid real HTTP during token acquisition.
    #[cfg(test)]
    pub(crate) fn with_token(host: &str, bearer: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            http: HttpClient::new(),
            credentials: Credentials {
                username: String::new(),
                password: String::new(),
                host: host.to_string(),
            },
            current: RwLock::new(Some(AccessToken {
                bearer: bearer.to_string(),
                expires_at,
            })),
        }
    }

    /// Returns a valid bearer value, exchanging credentials first if no token
    /// is cached or the cached one is expired.
    pub async fn bearer(&self) -> Result<String> {
        {
            let current = self.current.read().await;
            if let Some(token) = current.as_ref() {
                if !token.is_expired() {
                    return Ok(token.bearer.clone());
                }
            }
        }

        let mut current = self.current.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = current.as_ref() {
            if !token.is_expired() {
                return Ok(token.bearer.clone());
            }
        }

        let token = self.exchange().await?;
        let bearer = token.bearer.clone();
        *current = Some(token);
        Ok(bearer)
    }

    /// Performs the client-credentials exchange against `{host}/token`.
    ///
    /// The body is read as text before the status check so the vendor's
    /// error detail survives into the `Auth` error on failure.
    async fn exchange(&self) -> Result<AccessToken> {
        let url = format!("{}/token", self.credentials.host);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Auth(format!(
                "token request failed ({status}): {body}"
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Auth(format!("malformed token response: {e}")))?;

        log::debug!(
            "acquired access token (type={}, expires_in={}s)",
            parsed.token_type.as_deref().unwrap_or("Bearer"),
            parsed.expires_in
        );

        Ok(AccessToken {
            bearer: parsed.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(parsed.expires_in as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_deserializes_vendor_format() {
        let json = r#"{
            "access_token": "eyJ0eXAi.test.token",
            "token_type": "Bearer",
            "expires_in": 1799
        }"#;
        let resp: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "eyJ0eXAi.test.token");
        assert_eq!(resp.expires_in, 1799);
    }

    #[test]
    fn test_token_response_ignores_unknown_fields() {
        let json = r#"{
            "access_token": "tok",
            "expires_in": 1799,
            "scope": "read",
            "issued_at": 1709251200
        }"#;
        assert!(serde_json::from_str::<TokenResponse>(json).is_ok());
    }

    #[test]
    fn test_fresh_token_is_not_expired() {
        let token = AccessToken {
            bearer: "tok".to_string(),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        };
        assert!(!token.is_expired());
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let token = AccessToken {
            bearer: "tok".to_string(),
            expires_at: Utc::now() - ChronoDuration::seconds(1),
        };
        assert!(token.is_expired());
    }

    #[test]
    fn test_token_within_buffer_is_expired() {
        // 30s of lifetime left is inside the 60s safety buffer
        let token = AccessToken {
            bearer: "tok".to_string(),
            expires_at: Utc::now() + ChronoDuration::seconds(30),
        };
        assert!(token.is_expired());
    }

    #[tokio::test]
    async fn test_bearer_returns_cached_token() {
        let provider = TokenProvider::with_token(
            "https://api.example.test",
            "cached-token",
            Utc::now() + ChronoDuration::hours(1),
        );
        assert_eq!(provider.bearer().await.unwrap(), "cached-token");
    }
}
