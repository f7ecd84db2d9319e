//! Download dispatching
//!
//! The dispatcher turns a request into an exported file:
//!
//! 1. Only `GET` is accepted
//! 2. The resource index and format are read from the query, with defaults
//!    `0` and the first allowed format
//! 3. Both are checked against the view configuration
//! 4. All records are fetched and optionally filtered
//! 5. The selected resource builds a dataset, serialized in the selected format
//!
//! Every rejected request is a [`RequestError`]: `NotFound` for bad
//! parameters, `MethodNotAllowed` for other methods.

use std::sync::Arc;

use chrono::Local;
use http::{HeaderValue, Method, header};
use tracing::{debug, info};

use crate::error::{ExportError, RequestError, Result};
use crate::format::FormatCode;
use crate::query::QueryParams;
use crate::records::{RecordFilter, RecordSource};
use crate::view::ViewConfiguration;

/// Methods the dispatcher accepts
pub const ALLOWED_METHODS: [Method; 1] = [Method::GET];

/// Incoming request, reduced to what the dispatcher reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Request method
    pub method: Method,
    /// Raw query parameters
    pub params: QueryParams,
}

impl DownloadRequest {
    /// Create a request
    pub fn new(method: Method, params: QueryParams) -> Self {
        Self { method, params }
    }

    /// `GET` request with a raw query string
    pub fn get(query: &str) -> Self {
        Self::new(Method::GET, QueryParams::parse(query))
    }

    /// Build from any `http::Request`, reading its URI query
    pub fn from_http<B>(request: &http::Request<B>) -> Self {
        let query = request.uri().query().unwrap_or("");
        Self::new(request.method().clone(), QueryParams::parse(query))
    }
}

/// Selection resolved from a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    /// Declaration index of the selected resource
    pub resource_index: usize,
    /// Selected format
    pub format: FormatCode,
}

impl ExportRequest {
    /// Resolve the selector parameters against a view
    ///
    /// # Arguments
    /// * `config` - View configuration
    /// * `params` - Query parameters of the request
    ///
    /// # Returns
    /// * `Result<Self, RequestError>` - Selection, or `NotFound` with the reason
    pub fn resolve(
        config: &ViewConfiguration,
        params: &QueryParams,
    ) -> std::result::Result<Self, RequestError> {
        let names = config.parameters();
        let raw_index = params.get(&names.resource_class).unwrap_or("0");
        let raw_format = params
            .get(&names.resource_format)
            .unwrap_or_else(|| config.default_format().code());

        if raw_format.is_empty() {
            return Err(RequestError::NotFound(format!(
                "You have to pass {} as GET parameter",
                names.resource_format
            )));
        }

        let format = FormatCode::lookup(raw_format).ok_or_else(|| {
            RequestError::NotFound(format!("Export format {raw_format} not found"))
        })?;
        if !config.allows(format) {
            return Err(RequestError::NotFound(format!(
                "Export format {raw_format} is not offered by {}",
                config.name()
            )));
        }

        let raw_index = raw_index.trim();
        let (index, shown) = match raw_index.parse::<i64>() {
            Ok(index) => (usize::try_from(index).ok(), index.to_string()),
            // Integers too large for i64 are still integers, just out of range.
            Err(_) if is_integer_literal(raw_index) => (None, raw_index.to_string()),
            Err(_) => {
                return Err(RequestError::NotFound(format!(
                    "Parameter {} must be an integer",
                    names.resource_class
                )));
            }
        };
        let resource_index = index
            .filter(|&i| i < config.descriptors().len())
            .ok_or_else(|| {
                RequestError::NotFound(format!(
                    "Parameter {}.{}={shown} does not exist",
                    config.name(),
                    names.resource_class
                ))
            })?;

        Ok(Self {
            resource_index,
            format,
        })
    }
}

/// Whether `text` is an optionally signed run of decimal digits
fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Exported file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResponse {
    /// Content type registered for the format
    pub content_type: &'static str,
    /// Suggested attachment filename
    pub filename: String,
    /// Serialized bytes
    pub body: Vec<u8>,
    /// Format of the body
    pub format: FormatCode,
}

impl DownloadResponse {
    /// Convert into an `http::Response` with attachment headers
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let mut response = http::Response::new(self.body);
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        if let Ok(value) =
            HeaderValue::from_str(&format!("attachment; filename=\"{}\"", self.filename))
        {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        response
    }
}

/// Suggested filename for an export: `<model>-<timestamp>.<ext>`
pub fn default_filename(model: &str, format: FormatCode) -> String {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let model: String = model
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}.{}", model, timestamp, format.extension())
}

/// Serves exports for one view
#[derive(Clone)]
pub struct DownloadDispatcher {
    config: Arc<ViewConfiguration>,
    source: Arc<dyn RecordSource>,
    filter: Option<Arc<dyn RecordFilter>>,
}

impl DownloadDispatcher {
    /// Create a dispatcher over a record source
    pub fn new(config: Arc<ViewConfiguration>, source: Arc<dyn RecordSource>) -> Self {
        Self {
            config,
            source,
            filter: None,
        }
    }

    /// Narrow records with a filter before exporting
    pub fn with_filter(mut self, filter: Arc<dyn RecordFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    /// View configuration served by this dispatcher
    pub fn config(&self) -> &ViewConfiguration {
        &self.config
    }

    /// Handle a request
    ///
    /// # Arguments
    /// * `request` - Method and query parameters
    ///
    /// # Returns
    /// * `Result<DownloadResponse>` - Exported file, a request error, or an
    ///   export error from the source, filter or writer
    pub fn dispatch(&self, request: &DownloadRequest) -> Result<DownloadResponse> {
        if !ALLOWED_METHODS.contains(&request.method) {
            debug!("Rejected {} request to {}", request.method, self.config.name());
            return Err(RequestError::MethodNotAllowed {
                method: request.method.clone(),
                allowed: ALLOWED_METHODS.to_vec(),
            }
            .into());
        }

        let selection = ExportRequest::resolve(&self.config, &request.params)?;
        debug!(
            "Resolved export for {}: resource #{} as {}",
            self.config.name(),
            selection.resource_index,
            selection.format
        );

        let mut records = self.source.all()?;
        if let Some(filter) = &self.filter {
            records = filter.filter(&request.params, records)?;
        }

        let descriptor = self
            .config
            .descriptor(selection.resource_index)
            .ok_or_else(|| {
                ExportError::Source(format!(
                    "resource #{} vanished from {}",
                    selection.resource_index,
                    self.config.name()
                ))
            })?;

        let dataset = descriptor.resource().export(&records)?;
        let body = dataset.export(selection.format)?;

        info!(
            "Exported {} records of {} as {} ({} bytes)",
            dataset.height(),
            descriptor.label(),
            selection.format,
            body.len()
        );

        Ok(DownloadResponse {
            content_type: selection.format.content_type(),
            filename: default_filename(descriptor.model_name(), selection.format),
            body,
            format: selection.format,
        })
    }

    /// Handle a request and always produce an HTTP response
    ///
    /// Errors become plain-text 404/405/500 responses.
    pub fn respond(&self, request: &DownloadRequest) -> http::Response<Vec<u8>> {
        match self.dispatch(request) {
            Ok(response) => response.into_http(),
            Err(e) => {
                if !e.is_request_error() {
                    tracing::error!("Export failed for {}: {}", self.config.name(), e);
                }
                e.into_http()
            }
        }
    }
}
