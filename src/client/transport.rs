//! Injected HTTP capability for the monitoring client
//!
//! `DtmClient` does not own a concrete HTTP stack; it calls through the
//! `HttpTransport` trait. `SessionTransport` is the reqwest-backed default,
//! carrying whatever session credential the embedding application supplies.
//! Tests and embedders can substitute their own implementation.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;

use crate::error::{Error, Result};

/// Timeout for monitoring API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A decoded-but-unparsed HTTP response: status plus raw body text.
///
/// Most endpoints convert this to JSON via [`RawResponse::into_json`]; the
/// OpenAPI vocabulary endpoint hands it to the caller as-is because its
/// payload is YAML.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Enforce a success status, then decode the body as JSON.
    pub fn into_json(self) -> Result<Value> {
        if !self.is_success() {
            return Err(Error::Status {
                status: self.status,
                body: self.body,
            });
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Minimal HTTP verbs the monitoring client needs.
///
/// `query` pairs may repeat a key (`monitor_id`, `doc_type`); `headers`
/// carries per-request overrides such as a non-JSON `accept`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<RawResponse>;

    async fn post_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> Result<RawResponse>;

    async fn patch_json(&self, path: &str, body: &Value) -> Result<RawResponse>;
}

/// Session credential attached to every monitoring API request.
#[derive(Debug, Clone)]
pub enum SessionAuth {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// HTTP Basic with key id / secret
    Basic { username: String, password: String },
    /// No credential; auth handled elsewhere (e.g. a fronting proxy)
    None,
}

/// reqwest-backed [`HttpTransport`] holding one persistent connection pool
/// for the lifetime of the client.
pub struct SessionTransport {
    http: HttpClient,
    host: String,
    auth: SessionAuth,
}

impl SessionTransport {
    pub fn new(host: &str, auth: SessionAuth) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            SessionAuth::Bearer(token) => request.bearer_auth(token),
            SessionAuth::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            SessionAuth::None => request,
        }
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<RawResponse> {
        let response = self.apply_auth(request).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for SessionTransport {
    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> Result<RawResponse> {
        let url = format!("{}{}", self.host, path);
        let mut request = self.http.get(&url).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        self.execute(request).await
    }

    async fn post_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &Value,
    ) -> Result<RawResponse> {
        let url = format!("{}{}", self.host, path);
        let request = self.http.post(&url).query(query).json(body);
        self.execute(request).await
    }

    async fn patch_json(&self, path: &str, body: &Value) -> Result<RawResponse> {
        let url = format!("{}{}", self.host, path);
        let request = self.http.patch(&url).json(body);
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_response_success_decodes_json() {
        let raw = RawResponse {
            status: 200,
            body: r#"{"monitors": []}"#.to_string(),
        };
        let value = raw.into_json().unwrap();
        assert!(value["monitors"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_raw_response_error_preserves_body() {
        let raw = RawResponse {
            status: 404,
            body: "monitor not found".to_string(),
        };
        match raw.into_json() {
            Err(Error::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "monitor not found");
            }
            other => panic!("Expected Error::Status, got {other:?}"),
        }
    }

    #[test]
    fn test_raw_response_bad_json_is_decode_error() {
        let raw = RawResponse {
            status: 200,
            body: "<html>gateway</html>".to_string(),
        };
        assert!(matches!(raw.into_json(), Err(Error::Decode(_))));
    }

    #[test]
    fn test_session_transport_trims_trailing_slash() {
        let transport =
            SessionTransport::new("https://api.example.test/", SessionAuth::None).unwrap();
        assert_eq!(transport.host, "https://api.example.test");
    }
}
