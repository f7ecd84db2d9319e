//! Export Download Library
//!
//! This library adds "download as CSV / XLS / JSON / YAML / TSV" to list views.
//! A view declares the resources it exports and the formats it offers; the
//! library builds one download link per (format, resource) pair and serves the
//! export requests those links produce.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `dataset`: Tabular export data and format writers
//! - `dispatch`: Export request resolution and responses
//! - `error`: Error types and handling
//! - `format`: Known export formats
//! - `links`: Download link generation
//! - `menu`: HTML download menu
//! - `page`: Dedicated export views and list pages with downloads
//! - `query`: Ordered query parameters
//! - `records`: Record sources and filters
//! - `resource`: Exportable resources
//! - `view`: Validated view configuration
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use export_download::dispatch::{DownloadDispatcher, DownloadRequest};
//! use export_download::records::StaticRecords;
//! use export_download::resource::{FieldResource, Resource};
//! use export_download::view::ViewConfiguration;
//!
//! # fn main() -> export_download::Result<()> {
//! let resources: Vec<Arc<dyn Resource>> =
//!     vec![Arc::new(FieldResource::new("BookResource", "book").with_fields(["id", "title"]))];
//! let config = ViewConfiguration::from_codes("BookList", resources, &["csv", "json"])?;
//! let records = StaticRecords::from_json_str(r#"[{"id": 1, "title": "Dune"}]"#)?;
//!
//! let dispatcher = DownloadDispatcher::new(Arc::new(config), Arc::new(records));
//! let response =
//!     dispatcher.dispatch(&DownloadRequest::get("resource_class=0&resource_format=csv"))?;
//!
//! assert_eq!(response.content_type, "text/csv");
//! assert_eq!(response.body, b"id,title\n1,Dune\n");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dataset;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod links;
pub mod menu;
pub mod page;
pub mod query;
pub mod records;
pub mod resource;
pub mod view;

// Re-export commonly used types
pub use config::Config;
pub use dispatch::{DownloadDispatcher, DownloadRequest, DownloadResponse};
pub use error::{ExportDownloadError, Result};
pub use format::FormatCode;
pub use links::{ResourceLinks, build_links, build_page_links};
pub use page::{ExportView, ListPage};
pub use query::QueryParams;
pub use records::{Record, RecordFilter, RecordSource};
pub use resource::{Resource, ResourceDescriptor};
pub use view::ViewConfiguration;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
