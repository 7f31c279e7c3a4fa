//! Apache Solr integration for the Armature framework.
//!
//! This crate provides an async client for Solr with support for:
//! - Searching with arbitrary handler parameters over GET or POST
//! - Decoding of facets, stats, spellcheck, highlighting and MoreLikeThis
//! - Page-by-page iteration with a cursor
//! - Bounded concurrent batch searches
//! - XML and JSON updates, deletes, commit, optimize and rollback
//! - Administrative endpoints (ping, system info, configuration files)
//!
//! # Example
//!
//! ```rust,no_run
//! use armature_solr::{InputType, QueryParams, SolrClient, SolrConfig};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Book {
//!     id: String,
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create client
//!     let config = SolrConfig::new("http://localhost:8983/solr/books").with_version(4);
//!     let client = SolrClient::connect(config).await?;
//!
//!     // Index a document
//!     let book = Book {
//!         id: "1".to_string(),
//!         title: "Lucene in Action".to_string(),
//!     };
//!     client.update(&[book], InputType::Json, true).await?;
//!
//!     // Search
//!     let response = client
//!         .search(&QueryParams::query("title:lucene").set("facet", true).add("facet.field", "cat"))
//!         .await?;
//!     let books: Vec<Book> = response.documents_as()?;
//!     println!("{} of {:?}", books.len(), response.total_results);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod config;
mod cursor;
mod error;
mod facets;
mod query;
mod response;
mod spellcheck;
mod transport;
mod update;
mod util;
mod version;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{DEFAULT_MLT_RESOURCE, DEFAULT_RESOURCE, SolrClient};
pub use config::{DEFAULT_BASE_URL, SolrConfig};
pub use cursor::{Cursor, CursorState, DEFAULT_ROWS};
pub use error::{Result, SolrError};
pub use facets::{FacetBuckets, FacetTable, FacetValue, parse_facets};
pub use query::{ParamValue, QueryParams, build_request};
pub use response::{Document, SolrResponse, extract_error_message};
pub use spellcheck::{SpellcheckResult, parse_spellcheck};
pub use transport::{Credentials, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use update::{
    AddDoc, AddField, AddMessage, CommitOptions, InputType, OptimizeOptions, add_xml, commit_xml,
    delete_by_id_xml, delete_by_query_xml, json_body, optimize_xml, parse_add_xml, rollback_xml,
};
pub use util::to_iso8601;
pub use version::ProtocolVersion;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Cursor, Document, InputType, QueryParams, Result, SolrClient, SolrConfig, SolrError,
        SolrResponse,
    };
}
