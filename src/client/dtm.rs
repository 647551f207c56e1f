//! Digital Threat Monitoring API client
//!
//! Endpoint shaping for the `/v4/dtm` namespace: organization email settings,
//! API vocabulary, monitor management, alert listing, research-tools search,
//! document retrieval, and forum browsing. All HTTP goes through an injected
//! [`HttpTransport`], so the embedding application controls session and auth.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::query::SortOrder;
use super::transport::{HttpTransport, RawResponse, SessionAuth, SessionTransport};
use crate::error::Result;

/// Default page size for monitor listings
const DEFAULT_MONITOR_PAGE_SIZE: usize = 50;

/// Default page size for alert listings and document search
const DEFAULT_ALERT_PAGE_SIZE: usize = 25;

/// Monitor status fields sent by the shared PATCH helper.
///
/// Unset fields serialize as explicit `null` (no `skip_serializing_if`):
/// the API treats `null` as "leave unmodified", so the body always carries
/// all three keys.
#[derive(Debug, Clone, Default, Serialize)]
struct MonitorStatusUpdate {
    enabled: Option<bool>,
    email_notify_enabled: Option<bool>,
    email_notify_immediate: Option<bool>,
}

/// Filters for the alert listing endpoint.
///
/// Defaults mirror the API's documented behavior: newest first by creation
/// time, a ten-minute life window, references excluded.
#[derive(Debug, Clone)]
pub struct AlertQuery {
    pub size: usize,
    pub status: Option<String>,
    /// Alert life window, e.g. `10m`, `1h`, `7d`
    pub life: String,
    pub order: SortOrder,
    /// Include entity/topic references in each alert
    pub refs: bool,
    pub sort: String,
    /// Restrict to these monitors; emitted as repeated `monitor_id` keys
    pub monitor_ids: Vec<String>,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self {
            size: DEFAULT_ALERT_PAGE_SIZE,
            status: None,
            life: "10m".to_string(),
            order: SortOrder::Desc,
            refs: false,
            sort: "created_at".to_string(),
            monitor_ids: Vec::new(),
        }
    }
}

impl AlertQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn life(mut self, life: impl Into<String>) -> Self {
        self.life = life.into();
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn refs(mut self, refs: bool) -> Self {
        self.refs = refs;
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn monitor_id(mut self, id: impl Into<String>) -> Self {
        self.monitor_ids.push(id.into());
        self
    }

    fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("size", self.size.to_string())];

        if let Some(ref status) = self.status {
            params.push(("status", status.clone()));
        }

        params.push(("life", self.life.clone()));
        params.push(("order", self.order.as_str().to_string()));
        params.push(("refs", self.refs.to_string()));
        params.push(("sort", self.sort.clone()));

        for id in &self.monitor_ids {
            params.push(("monitor_id", id.clone()));
        }

        params
    }
}

/// Query-string filters for the research-tools document search.
#[derive(Debug, Clone)]
pub struct DocSearchOptions {
    pub size: usize,
    /// Restrict to these document types; emitted as repeated `doc_type` keys
    pub doc_types: Vec<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Truncate document text to this many characters
    pub truncate: Option<usize>,
}

impl Default for DocSearchOptions {
    fn default() -> Self {
        Self {
            size: DEFAULT_ALERT_PAGE_SIZE,
            doc_types: Vec::new(),
            since: None,
            until: None,
            truncate: None,
        }
    }
}

impl DocSearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_types.push(doc_type.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn truncate(mut self, chars: usize) -> Self {
        self.truncate = Some(chars);
        self
    }

    fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("size", self.size.to_string())];

        for doc_type in &self.doc_types {
            params.push(("doc_type", doc_type.clone()));
        }

        if let Some(since) = self.since {
            params.push(("since", since.to_rfc3339()));
        }

        if let Some(until) = self.until {
            params.push(("until", until.to_rfc3339()));
        }

        if let Some(truncate) = self.truncate {
            params.push(("truncate", truncate.to_string()));
        }

        params
    }
}

/// Retrieval toggles for single-document lookups.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    /// Include the document's entities and classifications
    pub refs: bool,
    /// Truncate document text to this many characters
    pub truncate: Option<usize>,
    /// Strip unsafe HTML from the document body
    pub sanitize: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            refs: false,
            truncate: None,
            sanitize: true,
        }
    }
}

impl DocumentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refs(mut self, refs: bool) -> Self {
        self.refs = refs;
        self
    }

    pub fn truncate(mut self, chars: usize) -> Self {
        self.truncate = Some(chars);
        self
    }

    pub fn sanitize(mut self, sanitize: bool) -> Self {
        self.sanitize = sanitize;
        self
    }

    fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("refs", self.refs.to_string())];

        if let Some(truncate) = self.truncate {
            params.push(("truncate", truncate.to_string()));
        }

        params.push(("sanitize", self.sanitize.to_string()));
        params
    }
}

/// Client for the Digital Threat Monitoring API.
pub struct DtmClient {
    http: Arc<dyn HttpTransport>,
}

impl DtmClient {
    /// Wrap an existing transport. The transport carries host and session
    /// credentials; this client only shapes endpoints.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { http: transport }
    }

    /// Convenience constructor over the default reqwest transport.
    pub fn with_session(host: &str, auth: SessionAuth) -> Result<Self> {
        Ok(Self::new(Arc::new(SessionTransport::new(host, auth)?)))
    }

    /// Email notification settings for the organization.
    pub async fn get_email_settings(&self) -> Result<Value> {
        self.http
            .get("/v4/dtm/settings/email", &[], &[])
            .await?
            .into_json()
    }

    /// OpenAPI spec for this REST API. The payload is YAML, so the response
    /// is returned raw rather than parsed.
    pub async fn get_vocab_openapi(&self) -> Result<RawResponse> {
        self.http
            .get("/v4/dtm/vocab/openapi", &[], &[("accept", "text/yaml")])
            .await
    }

    /// Details of a single monitor.
    pub async fn get_monitor(&self, monitor_id: &str) -> Result<Value> {
        self.http
            .get(&format!("/v4/dtm/monitors/{monitor_id}"), &[], &[])
            .await?
            .into_json()
    }

    /// List monitors. `limit` defaults to 50.
    pub async fn get_monitor_list(&self, limit: Option<usize>) -> Result<Value> {
        let size = limit.unwrap_or(DEFAULT_MONITOR_PAGE_SIZE);
        self.http
            .get("/v4/dtm/monitors", &[("size", size.to_string())], &[])
            .await?
            .into_json()
    }

    /// Enable a monitor. Notification fields are left unmodified.
    pub async fn enable_monitor(&self, monitor_id: &str) -> Result<Value> {
        self.update_monitor_statuses(
            monitor_id,
            MonitorStatusUpdate {
                enabled: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    /// Disable a monitor. Notification fields are left unmodified.
    pub async fn disable_monitor(&self, monitor_id: &str) -> Result<Value> {
        self.update_monitor_statuses(
            monitor_id,
            MonitorStatusUpdate {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .await
    }

    /// Update a monitor's email notification toggles without touching its
    /// enabled state.
    pub async fn set_monitor_email_notifications(
        &self,
        monitor_id: &str,
        notify_enabled: Option<bool>,
        notify_immediate: Option<bool>,
    ) -> Result<Value> {
        self.update_monitor_statuses(
            monitor_id,
            MonitorStatusUpdate {
                enabled: None,
                email_notify_enabled: notify_enabled,
                email_notify_immediate: notify_immediate,
            },
        )
        .await
    }

    async fn update_monitor_statuses(
        &self,
        monitor_id: &str,
        update: MonitorStatusUpdate,
    ) -> Result<Value> {
        let body = serde_json::to_value(&update)?;
        self.http
            .patch_json(&format!("/v4/dtm/monitors/{monitor_id}"), &body)
            .await?
            .into_json()
    }

    /// List alerts matching the given filters.
    pub async fn get_alerts(&self, query: &AlertQuery) -> Result<Value> {
        self.http
            .get("/v4/dtm/alerts", &query.to_query_params(), &[])
            .await?
            .into_json()
    }

    /// Full-text search over the research-tools document corpus.
    pub async fn search_research_tools(
        &self,
        query: &str,
        options: &DocSearchOptions,
    ) -> Result<Value> {
        self.http
            .post_json(
                "/v4/dtm/docs/search",
                &options.to_query_params(),
                &json!({ "query": query }),
            )
            .await?
            .into_json()
    }

    /// Retrieve a document by type and id.
    pub async fn get_document(
        &self,
        doc_type: &str,
        doc_id: &str,
        options: &DocumentOptions,
    ) -> Result<Value> {
        self.http
            .get(
                &format!("/v4/dtm/docs/{doc_type}/{doc_id}"),
                &options.to_query_params(),
                &[],
            )
            .await?
            .into_json()
    }

    /// List boards for a forum.
    pub async fn get_forum_boards(&self, forum_id: u64) -> Result<Value> {
        self.http
            .get(&format!("/v4/dtm/views/forums/{forum_id}"), &[], &[])
            .await?
            .into_json()
    }

    /// List threads for a board within a forum.
    pub async fn get_forum_boards_threads(
        &self,
        forum_id: u64,
        board_name: &str,
    ) -> Result<Value> {
        self.http
            .get(
                &format!("/v4/dtm/views/forums/{forum_id}/boards"),
                &[("board", board_name.to_string())],
                &[],
            )
            .await?
            .into_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_status_update_serializes_explicit_nulls() {
        let update = MonitorStatusUpdate {
            enabled: Some(true),
            ..Default::default()
        };
        let body = serde_json::to_value(&update).unwrap();

        assert_eq!(
            body,
            json!({
                "enabled": true,
                "email_notify_enabled": null,
                "email_notify_immediate": null,
            })
        );
    }

    #[test]
    fn test_alert_query_defaults() {
        let params = AlertQuery::new().to_query_params();

        assert_eq!(
            params,
            vec![
                ("size", "25".to_string()),
                ("life", "10m".to_string()),
                ("order", "desc".to_string()),
                ("refs", "false".to_string()),
                ("sort", "created_at".to_string()),
            ]
        );
    }

    #[test]
    fn test_alert_query_repeats_monitor_ids() {
        let params = AlertQuery::new()
            .status("new")
            .monitor_id("mon-1")
            .monitor_id("mon-2")
            .to_query_params();

        assert!(params.contains(&("status", "new".to_string())));
        let ids: Vec<_> = params
            .iter()
            .filter(|(k, _)| *k == "monitor_id")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(ids, vec!["mon-1", "mon-2"]);
    }

    #[test]
    fn test_doc_search_options_params() {
        let since = chrono::Utc::now();
        let params = DocSearchOptions::new()
            .size(10)
            .doc_type("paste")
            .doc_type("forum_post")
            .since(since)
            .truncate(500)
            .to_query_params();

        assert_eq!(params[0], ("size", "10".to_string()));
        let types: Vec<_> = params
            .iter()
            .filter(|(k, _)| *k == "doc_type")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(types, vec!["paste", "forum_post"]);
        assert!(params.contains(&("since", since.to_rfc3339())));
        assert!(params.contains(&("truncate", "500".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "until"));
    }

    #[test]
    fn test_document_options_defaults() {
        let params = DocumentOptions::new().to_query_params();

        assert_eq!(
            params,
            vec![
                ("refs", "false".to_string()),
                ("sanitize", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_document_options_with_truncate() {
        let params = DocumentOptions::new()
            .refs(true)
            .truncate(1000)
            .sanitize(false)
            .to_query_params();

        assert_eq!(
            params,
            vec![
                ("refs", "true".to_string()),
                ("truncate", "1000".to_string()),
                ("sanitize", "false".to_string()),
            ]
        );
    }
}
