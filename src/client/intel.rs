//! Threat Intelligence v4 API client
//!
//! Token-authenticated client for the typed item endpoints (`/v4/{type}`),
//! the cross-type search, and single-item detail lookups. Credentials are
//! exchanged for a bearer token at construction; the token is transparently
//! re-acquired when it nears expiry.

use reqwest::{Client as HttpClient, StatusCode, header};
use serde_json::Value;
use std::time::Duration;

use super::auth::{Credentials, TokenProvider};
use super::query::{ItemQuery, ItemType, SearchRequest};
use crate::error::{Error, Result};

/// Production host of the threat-intel API
const DEFAULT_HOST: &str = "https://api.intelligence.fireeye.com";

/// Client-identifying header required by the vendor
const APP_NAME_HEADER: &str = "X-App-Name";
const APP_NAME: &str = "advantage-rs client";

/// Timeout for threat-intel API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Threat Intelligence v4 API.
///
/// One instance owns one connection pool and one token lifecycle. Responses
/// are returned as raw [`serde_json::Value`]; the API's schemas are
/// versioned server-side and not validated locally.
pub struct IntelClient {
    http: HttpClient,
    base_url: String,
    auth: TokenProvider,
}

impl IntelClient {
    /// Connect to the production API, performing the initial credential
    /// exchange eagerly so an invalid key fails fast.
    pub async fn connect(username: &str, password: &str) -> Result<Self> {
        Self::connect_to(username, password, DEFAULT_HOST).await
    }

    /// Connect against a custom host. Used by tests to point at a local mock
    /// server, and by tenants on non-default API gateways.
    pub async fn connect_to(username: &str, password: &str, host: &str) -> Result<Self> {
        let base_url = host.trim_end_matches('/').to_string();
        let auth = TokenProvider::new(Credentials {
            username: username.to_string(),
            password: password.to_string(),
            host: base_url.clone(),
        })?;

        // Eager exchange: construction fails on bad credentials rather than
        // deferring the surprise to the first request.
        auth.bearer().await?;

        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    /// Fetch a page of typed items.
    ///
    /// Returns `Ok(Some(json))` on 200 and `Ok(None)` on 204. The API uses
    /// 204 to signal "no data for this query/cursor", which is distinct from
    /// a 200 carrying an empty collection. Any other status becomes
    /// [`Error::Status`] carrying the response body.
    pub async fn get_items(
        &self,
        item_type: ItemType,
        query: &ItemQuery,
    ) -> Result<Option<Value>> {
        let url = format!("{}/v4/{}", self.base_url, item_type.as_str());
        let response = self
            .request(self.http.get(&url))
            .await?
            .query(&query.to_query_params())
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => Ok(Some(response.json::<Value>().await?)),
            StatusCode::NO_CONTENT => Ok(None),
            _ => {
                let body = response.text().await.unwrap_or_default();
                log::error!("item listing returned {status} for {url}: {body}");
                Err(Error::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Cross-type search over all intelligence records.
    pub async fn search(&self, request: &SearchRequest) -> Result<Value> {
        let url = format!("{}/v4/search", self.base_url);
        let response = self
            .request(self.http.post(&url))
            .await?
            .json(request)
            .send()
            .await?;

        Self::read_json(response).await
    }

    /// Single-item detail lookup by type and id.
    pub async fn get_detail(&self, item_type: ItemType, id: &str) -> Result<Value> {
        let url = format!("{}/v4/{}/{}", self.base_url, item_type.as_str(), id);
        let response = self.request(self.http.get(&url)).await?.send().await?;

        Self::read_json(response).await
    }

    /// Attach the fixed header set: bearer credential, JSON accept, and the
    /// client identity. The bearer value is re-acquired here when stale.
    async fn request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let token = self.auth.bearer().await?;
        Ok(builder
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .header(APP_NAME_HEADER, APP_NAME))
    }

    async fn read_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
