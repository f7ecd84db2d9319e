//! Error handling for export-download.
//!
//! This module provides:
//! - A single crate-wide error type wrapping the specific error kinds
//! - Configuration errors raised while a view is being set up
//! - Request errors that become client-facing 404/405 responses
//! - Export errors raised while records are fetched or serialized
//!
//! # Example
//!
//! ```rust
//! use export_download::error::{ExportDownloadError, RequestError};
//!
//! let err: ExportDownloadError = RequestError::NotFound("unknown format".into()).into();
//! assert_eq!(err.status(), http::StatusCode::NOT_FOUND);
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, ExportDownloadError, ExportError, RequestError, Result};
