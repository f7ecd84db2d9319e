use std::{fmt, io};

use http::{HeaderValue, Method, StatusCode, header};

/// Crate-wide `Result` type using [`ExportDownloadError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ExportDownloadError>;

/// Top-level error type for export-download operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum ExportDownloadError {
    /// Configuration errors (fatal, raised at setup time).
    Config(ConfigError),

    /// Client-facing request errors.
    Request(RequestError),

    /// Record retrieval or serialization errors.
    Export(ExportError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Configuration-specific errors.
///
/// These are programmer errors: a view declared without resources, with an
/// unknown format and so on. They are surfaced before any request is served.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// The view declares no resource.
    NoResources { view: String },

    /// A declared resource does not satisfy the exportable contract.
    NotExportable {
        view: String,
        resource: String,
        reason: String,
    },

    /// The view declares no format.
    NoFormats { view: String },

    /// A declared format is not one of the known format codes.
    UnknownFormat { view: String, format: String },

    /// A format is declared more than once.
    DuplicateFormat { view: String, format: String },

    /// Query parameter names are empty or collide.
    InvalidParameters { view: String, reason: String },

    /// Generic configuration error.
    Generic(String),
}

/// Request errors, reported to the client with a plain-text reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// The request used a method other than the accepted ones.
    MethodNotAllowed { method: Method, allowed: Vec<Method> },

    /// A selector parameter is missing, malformed or out of range.
    NotFound(String),
}

/// Export-specific errors.
#[derive(Debug)]
pub enum ExportError {
    /// The record source or filter failed.
    Source(String),

    /// Serializing the dataset failed.
    Serialize { format: String, reason: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ExportDownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportDownloadError::Config(e) => write!(f, "Configuration error: {e}"),
            ExportDownloadError::Request(e) => write!(f, "{e}"),
            ExportDownloadError::Export(e) => write!(f, "Export error: {e}"),
            ExportDownloadError::Io(e) => write!(f, "I/O error: {e}"),
            ExportDownloadError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::NoResources { view } => {
                write!(f, "{view}.resources must declare at least one resource")
            }
            ConfigError::NotExportable {
                view,
                resource,
                reason,
            } => write!(
                f,
                "Resource {resource} in {view}.resources is not exportable: {reason}"
            ),
            ConfigError::NoFormats { view } => {
                write!(f, "{view}.formats must declare at least one format")
            }
            ConfigError::UnknownFormat { view, format } => {
                write!(f, "Format '{format}' in {view}.formats is not a valid format")
            }
            ConfigError::DuplicateFormat { view, format } => {
                write!(f, "Format '{format}' is declared twice in {view}.formats")
            }
            ConfigError::InvalidParameters { view, reason } => {
                write!(f, "Invalid {view}.parameters: {reason}")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::MethodNotAllowed { method, allowed } => {
                let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                write!(
                    f,
                    "Method {method} not allowed (allowed: {})",
                    allowed.join(", ")
                )
            }
            RequestError::NotFound(reason) => write!(f, "{reason}"),
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Source(msg) => write!(f, "Failed to fetch records: {msg}"),
            ExportError::Serialize { format, reason } => {
                write!(f, "Failed to write {format}: {reason}")
            }
        }
    }
}

impl std::error::Error for ExportDownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportDownloadError::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for ConfigError {}
impl std::error::Error for RequestError {}
impl std::error::Error for ExportError {}

/* ========================= HTTP mapping ========================= */

impl RequestError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl ExportDownloadError {
    /// HTTP status reported for this error.
    ///
    /// Only request errors are client-facing; everything else is a server error.
    pub fn status(&self) -> StatusCode {
        match self {
            ExportDownloadError::Request(e) => e.status(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is a client-facing request error.
    pub fn is_request_error(&self) -> bool {
        matches!(self, ExportDownloadError::Request(_))
    }

    /// Convert the error into a plain-text HTTP response.
    ///
    /// 405 responses carry an `Allow` header listing the accepted methods.
    pub fn into_http(self) -> http::Response<Vec<u8>> {
        let status = self.status();
        let body = match &self {
            ExportDownloadError::Request(e) => e.to_string(),
            // Internal details stay in the logs.
            _ => status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string(),
        };

        let mut response = http::Response::new(body.into_bytes());
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );

        if let ExportDownloadError::Request(RequestError::MethodNotAllowed { allowed, .. }) = &self
        {
            let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
            if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }

        response
    }
}

/* ========================= Conversions to ExportDownloadError ========================= */

impl From<io::Error> for ExportDownloadError {
    fn from(err: io::Error) -> Self {
        ExportDownloadError::Io(err)
    }
}

impl From<ConfigError> for ExportDownloadError {
    fn from(err: ConfigError) -> Self {
        ExportDownloadError::Config(err)
    }
}

impl From<RequestError> for ExportDownloadError {
    fn from(err: RequestError) -> Self {
        ExportDownloadError::Request(err)
    }
}

impl From<ExportError> for ExportDownloadError {
    fn from(err: ExportError) -> Self {
        ExportDownloadError::Export(err)
    }
}

impl From<toml::de::Error> for ExportDownloadError {
    fn from(err: toml::de::Error) -> Self {
        ExportDownloadError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<serde_json::Error> for ExportDownloadError {
    fn from(err: serde_json::Error) -> Self {
        ExportDownloadError::Export(ExportError::Serialize {
            format: "json".to_string(),
            reason: err.to_string(),
        })
    }
}

impl From<serde_yaml::Error> for ExportDownloadError {
    fn from(err: serde_yaml::Error) -> Self {
        ExportDownloadError::Export(ExportError::Serialize {
            format: "yaml".to_string(),
            reason: err.to_string(),
        })
    }
}

impl From<csv::Error> for ExportDownloadError {
    fn from(err: csv::Error) -> Self {
        ExportDownloadError::Export(ExportError::Serialize {
            format: "csv".to_string(),
            reason: err.to_string(),
        })
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportDownloadError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ExportDownloadError::Export(ExportError::Serialize {
            format: "xls".to_string(),
            reason: err.to_string(),
        })
    }
}

impl From<String> for ExportDownloadError {
    fn from(msg: String) -> Self {
        ExportDownloadError::Generic(msg)
    }
}

impl From<&str> for ExportDownloadError {
    fn from(msg: &str) -> Self {
        ExportDownloadError::Generic(msg.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_status() {
        let not_found = RequestError::NotFound("missing".into());
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let not_allowed = RequestError::MethodNotAllowed {
            method: Method::POST,
            allowed: vec![Method::GET],
        };
        assert_eq!(not_allowed.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_not_allowed_response_has_allow_header() {
        let err: ExportDownloadError = RequestError::MethodNotAllowed {
            method: Method::DELETE,
            allowed: vec![Method::GET],
        }
        .into();

        let response = err.into_http();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET");
    }

    #[test]
    fn test_not_found_body_is_reason() {
        let err: ExportDownloadError =
            RequestError::NotFound("Export format pdf not found".into()).into();
        let response = err.into_http();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body(), b"Export format pdf not found");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err: ExportDownloadError = ExportError::Source("db down".into()).into();
        assert!(!err.is_request_error());
        let response = err.into_http();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), b"Internal Server Error");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnknownFormat {
            view: "BookList".into(),
            format: "pdf".into(),
        };
        assert_eq!(
            err.to_string(),
            "Format 'pdf' in BookList.formats is not a valid format"
        );
    }
}
