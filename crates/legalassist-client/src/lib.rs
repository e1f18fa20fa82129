//! Backend access for Legal Assist: HTTP transport, response normalization,
//! placeholder sources and the citation viewer.

pub mod config;
mod error;
pub mod normalize;
pub mod source;
pub mod viewer;

#[cfg(feature = "http")]
pub mod http;

pub use config::{ClientConfig, QueryEndpoint};
pub use error::ClientError;
pub use source::{CachedSource, SourceCache, placeholder_source};
pub use viewer::{CitationViewer, LoadTicket, SourceFetcher, ViewerState};

#[cfg(feature = "http")]
pub use http::RagClient;
