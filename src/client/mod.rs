//! Mandiant Advantage API clients

pub mod auth;
pub mod dtm;
pub mod intel;
pub mod query;
pub mod transport;

pub use auth::{AccessToken, Credentials, TokenProvider};
pub use dtm::{AlertQuery, DocSearchOptions, DocumentOptions, DtmClient};
pub use intel::IntelClient;
pub use query::{DEFAULT_PAGE_SIZE, ItemQuery, ItemType, SearchRequest, SortOrder};
pub use transport::{HttpTransport, RawResponse, SessionAuth, SessionTransport};
