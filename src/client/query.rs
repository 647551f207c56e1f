//! Query shaping for the threat-intel endpoints
//!
//! Provides the item-type vocabulary, the listing filter builder, and the
//! cross-type search request body.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Default page size used by listing and search endpoints.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Vendor-defined category of intelligence record.
///
/// Rendered as the path segment of item endpoints (`/v4/{item_type}`) and as
/// the optional `type` filter of the cross-type search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemType {
    ThreatActor,
    Malware,
    Vulnerability,
    Indicator,
    Report,
}

impl ItemType {
    /// Path-segment spelling of this item type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::ThreatActor => "threat-actor",
            ItemType::Malware => "malware",
            ItemType::Vulnerability => "vulnerability",
            ItemType::Indicator => "indicator",
            ItemType::Report => "report",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "threat-actor" => Ok(ItemType::ThreatActor),
            "malware" => Ok(ItemType::Malware),
            "vulnerability" => Ok(ItemType::Vulnerability),
            "indicator" => Ok(ItemType::Indicator),
            "report" => Ok(ItemType::Report),
            other => Err(Error::Decode(format!("unknown item type: {other}"))),
        }
    }
}

/// Sort order for listing requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending order (oldest first)
    Asc,
    /// Descending order (newest first)
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Filter parameters for the typed item listing endpoint.
///
/// Use the builder pattern to configure filters:
///
/// ```ignore
/// let query = ItemQuery::new()
///     .limit(100)
///     .start(two_days_ago)
///     .value("198.51.100.7");
/// ```
///
/// A pagination cursor takes over the whole query: when `next` is set, the
/// emitted parameter set is the cursor alone, because the cursor encodes the
/// full query state server-side.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Lower bound on record time, sent as Unix seconds (`start_epoch`)
    pub start: Option<DateTime<Utc>>,
    /// Upper bound on record time, sent as Unix seconds (`end_epoch`)
    pub end: Option<DateTime<Utc>>,
    /// Page size (default: 25)
    pub limit: Option<usize>,
    /// Exact-match value filter (indicator endpoints)
    pub value: Option<String>,
    /// Opaque cursor from a previous page's response
    pub next: Option<String>,
}

impl ItemQuery {
    /// Create an empty query with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lower time bound.
    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Set the upper time bound.
    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Set the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the exact-match value filter.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the pagination cursor.
    pub fn next(mut self, cursor: impl Into<String>) -> Self {
        self.next = Some(cursor.into());
        self
    }

    /// Convert to query string parameters.
    ///
    /// When a cursor is present the result is exactly `[("next", cursor)]`;
    /// all other filters are dropped for that call. Otherwise `limit` is
    /// always included and time/value filters only when set.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        if let Some(ref cursor) = self.next {
            return vec![("next", cursor.clone())];
        }

        let mut params = Vec::new();
        params.push(("limit", self.limit.unwrap_or(DEFAULT_PAGE_SIZE).to_string()));

        if let Some(start) = self.start {
            params.push(("start_epoch", start.timestamp().to_string()));
        }

        if let Some(end) = self.end {
            params.push(("end_epoch", end.timestamp().to_string()));
        }

        if let Some(ref value) = self.value {
            params.push(("value", value.clone()));
        }

        params
    }
}

/// Body of the cross-type search endpoint (`POST /v4/search`).
///
/// Optional fields are omitted from the JSON body when unset.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub limit: usize,

    /// The search expression
    pub search: String,

    /// Opaque cursor from a previous search response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// Restrict results to one item category
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
}

impl SearchRequest {
    /// Create a search request with the default page size.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            search: query.into(),
            next: None,
            item_type: None,
        }
    }

    /// Set the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the pagination cursor.
    pub fn next(mut self, cursor: impl Into<String>) -> Self {
        self.next = Some(cursor.into());
        self
    }

    /// Restrict results to one item category.
    pub fn item_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_item_type_path_segments() {
        assert_eq!(ItemType::ThreatActor.as_str(), "threat-actor");
        assert_eq!(ItemType::Malware.as_str(), "malware");
        assert_eq!(ItemType::Vulnerability.as_str(), "vulnerability");
        assert_eq!(ItemType::Indicator.as_str(), "indicator");
        assert_eq!(ItemType::Report.as_str(), "report");
    }

    #[test]
    fn test_item_type_from_str_round_trip() {
        for ty in [
            ItemType::ThreatActor,
            ItemType::Malware,
            ItemType::Vulnerability,
            ItemType::Indicator,
            ItemType::Report,
        ] {
            assert_eq!(ty.as_str().parse::<ItemType>().unwrap(), ty);
        }
        assert!("campaign".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_item_query_default() {
        let query = ItemQuery::new();
        let params = query.to_query_params();

        // Only the default limit is emitted; unset filters are absent
        assert_eq!(params, vec![("limit", "25".to_string())]);
    }

    #[test]
    fn test_item_query_filters_as_epoch() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let query = ItemQuery::new()
            .limit(100)
            .start(start)
            .end(end)
            .value("198.51.100.7");

        let params = query.to_query_params();
        assert_eq!(params.len(), 4);
        assert!(params.contains(&("limit", "100".to_string())));
        assert!(params.contains(&("start_epoch", start.timestamp().to_string())));
        assert!(params.contains(&("end_epoch", end.timestamp().to_string())));
        assert!(params.contains(&("value", "198.51.100.7".to_string())));
    }

    #[test]
    fn test_item_query_cursor_overrides_filters() {
        let query = ItemQuery::new()
            .limit(100)
            .start(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
            .value("198.51.100.7")
            .next("b2Zmc2V0PTUw");

        // The cursor encodes the full query state; nothing else is sent
        let params = query.to_query_params();
        assert_eq!(params, vec![("next", "b2Zmc2V0PTUw".to_string())]);
    }

    #[test]
    fn test_search_request_minimal_body() {
        let request = SearchRequest::new("apt29");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body, serde_json::json!({"limit": 25, "search": "apt29"}));
    }

    #[test]
    fn test_search_request_full_body() {
        let request = SearchRequest::new("emotet")
            .limit(10)
            .next("42")
            .item_type(ItemType::Malware);
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "limit": 10,
                "search": "emotet",
                "next": "42",
                "type": "malware",
            })
        );
    }
}
