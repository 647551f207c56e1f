//! Client library for the Mandiant Advantage threat-intelligence APIs.
//!
//! Two independent clients, one per API family:
//!
//! - [`IntelClient`] wraps the Threat Intelligence v4 API: typed item listings
//!   (indicators, reports, vulnerabilities, malware, threat actors), a
//!   cross-type search, and single-item detail lookups. Authenticates by
//!   exchanging username/password for a bearer token and transparently
//!   re-acquires the token as it nears expiry.
//! - [`DtmClient`] wraps the Digital Threat Monitoring API: monitor management,
//!   alert listing, research-tools document search, and forum browsing.
//!   Authenticates with a session credential supplied by the embedding
//!   application, over an injectable [`HttpTransport`].
//!
//! Responses are returned as [`serde_json::Value`]; the vendor's schemas are
//! versioned server-side and not validated locally. List endpoints hand back
//! an opaque `next` cursor which the caller replays verbatim to fetch the
//! following page.
//!
//! ```ignore
//! use advantage::{IntelClient, ItemQuery, ItemType};
//!
//! let client = IntelClient::connect(&key_id, &key_secret).await?;
//! let page = client
//!     .get_items(ItemType::Indicator, &ItemQuery::new().limit(100))
//!     .await?;
//! match page {
//!     Some(items) => println!("{items}"),
//!     None => println!("no data in range"),
//! }
//! ```

pub mod client;
pub mod error;

pub use client::{
    AccessToken, AlertQuery, Credentials, DocSearchOptions, DocumentOptions, DtmClient,
    HttpTransport, IntelClient, ItemQuery, ItemType, RawResponse, SearchRequest, SessionAuth,
    SessionTransport, SortOrder, TokenProvider,
};
pub use error::{Error, Result};
