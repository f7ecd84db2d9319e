//! Configuration management for export-download
//!
//! This module handles loading, parsing, and validating configuration from:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments (applied by the CLI)
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values
//!
//! # Example
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [view]
//! name = "BookList"
//! formats = ["csv", "xls", "json"]
//! export_url = "/{model}/export/"
//!
//! [[view.resources]]
//! name = "BookResource"
//! model = "book"
//! description = "Books"
//! fields = [{ attribute = "title", column_name = "Title" }, { attribute = "author__name" }]
//!
//! [view.filter]
//! fields = ["genre"]
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};
use crate::menu::DEFAULT_BUTTON_CLASS;
use crate::records::FieldFilter;
use crate::resource::{FieldResource, Resource};
use crate::view::{Parameters, ViewConfiguration};

/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "EXPORT_DOWNLOAD_LOG_LEVEL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Exporting view declaration
    #[serde(default)]
    pub view: ViewConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Declaration of an exporting view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// View name used in messages
    #[serde(default = "default_view_name")]
    pub name: String,

    /// Offered formats, in menu order
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,

    /// Export route pattern (`{model}` is replaced); unset for same-page links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_url: Option<String>,

    /// CSS class of the menu button
    #[serde(default = "default_button_class")]
    pub button_class: String,

    /// Query parameter names
    #[serde(default)]
    pub parameters: Parameters,

    /// Exported resources, in declaration order
    #[serde(default)]
    pub resources: Vec<FieldResource>,

    /// Optional record filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<FilterConfig>,
}

/// Record filter declaration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Fields that may be matched from query parameters
    #[serde(default)]
    pub fields: Vec<String>,
}

// Default value functions
fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

fn default_view_name() -> String {
    "ExportView".to_string()
}

fn default_formats() -> Vec<String> {
    vec!["csv".to_string(), "xls".to_string()]
}

fn default_button_class() -> String {
    DEFAULT_BUTTON_CLASS.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            name: default_view_name(),
            formats: default_formats(),
            parameters: Parameters::default(),
            export_url: None,
            button_class: default_button_class(),
            resources: Vec::new(),
            filter: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    ///
    /// # Arguments
    /// * `text` - TOML document
    ///
    /// # Returns
    /// * `Result<Config>` - Parsed configuration or error
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults
    ///
    /// An explicit path must exist. Without one, the default path is tried and
    /// defaults are used when it is absent. Environment overrides are applied
    /// last.
    ///
    /// # Arguments
    /// * `path` - Explicit configuration file, if any
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    debug!("No configuration file, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// `EXPORT_DOWNLOAD_LOG_LEVEL` overrides the log level; invalid values are
    /// ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            self.apply_log_level(&level);
        }
    }

    fn apply_log_level(&mut self, level: &str) {
        match level.parse::<LogLevel>() {
            Ok(level) => self.logging.level = level,
            Err(e) => warn!("Ignoring {}: {}", ENV_LOG_LEVEL, e),
        }
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - Path to default configuration file
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".export-download")
            .join("config.toml")
    }

    /// Save configuration to a file
    ///
    /// # Arguments
    /// * `path` - Path where to save the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Success or error
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = self.to_toml()?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Serialize configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        self.view.build()?;
        if let Some(filter) = &self.view.filter {
            filter.validate(&self.view.name)?;
        }
        Ok(())
    }
}

impl ViewConfig {
    /// Build the validated view configuration
    ///
    /// # Returns
    /// * `Result<ViewConfiguration, ConfigError>` - Configuration or the first broken rule
    pub fn build(&self) -> std::result::Result<ViewConfiguration, ConfigError> {
        let resources: Vec<Arc<dyn Resource>> = self
            .resources
            .iter()
            .cloned()
            .map(|r| Arc::new(r) as Arc<dyn Resource>)
            .collect();

        let config = ViewConfiguration::from_codes(self.name.clone(), resources, &self.formats)?;
        config.with_parameters(self.parameters.clone())
    }

    /// Record filter declared for the view
    pub fn record_filter(&self) -> Option<FieldFilter> {
        self.filter
            .as_ref()
            .filter(|f| !f.fields.is_empty())
            .map(|f| FieldFilter::new(f.fields.iter().cloned()))
    }
}

impl FilterConfig {
    fn validate(&self, view: &str) -> std::result::Result<(), ConfigError> {
        match self.fields.iter().find(|f| f.trim().is_empty()) {
            Some(field) => Err(ConfigError::InvalidValue {
                field: format!("{view}.filter.fields"),
                value: field.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportDownloadError;
    use crate::format::FormatCode;

    const SAMPLE: &str = r#"
[logging]
level = "debug"
timestamps = false

[view]
name = "BookList"
formats = ["json", "csv"]
export_url = "/{model}/export/"
button_class = "btn-primary"

[view.parameters]
resource_class = "rc"

[[view.resources]]
name = "BookResource"
model = "book"
description = "Books"
fields = [{ attribute = "title", column_name = "Title" }, { attribute = "author__name" }]

[[view.resources]]
name = "RawResource"
model = "book"

[view.filter]
fields = ["genre"]
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.view.formats, vec!["csv", "xls"]);
        assert_eq!(config.view.button_class, "btn-default");
        assert!(config.view.resources.is_empty());
    }

    #[test]
    fn test_parse_sample() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(!config.logging.timestamps);
        assert_eq!(config.view.parameters.resource_class, "rc");
        assert_eq!(config.view.parameters.resource_format, "resource_format");
        assert_eq!(config.view.resources.len(), 2);
        assert_eq!(
            config.view.resources[0].fields[0].column_name.as_deref(),
            Some("Title")
        );

        let view = config.view.build().unwrap();
        assert_eq!(view.formats(), [FormatCode::Json, FormatCode::Csv]);
        assert_eq!(view.descriptors()[0].label(), "Books");
        assert_eq!(view.descriptors()[1].label(), "RawResource");
        assert_eq!(view.parameters().resource_class, "rc");
        assert_eq!(config.view.record_filter().unwrap().fields(), ["genre"]);
        config.validate().unwrap();
    }

    #[test]
    fn test_default_view_is_invalid() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(
            err,
            ExportDownloadError::Config(ConfigError::NoResources { .. })
        ));
    }

    #[test]
    fn test_unknown_format_in_file() {
        let text = SAMPLE.replace(r#"["json", "csv"]"#, r#"["json", "pdf"]"#);
        let err = Config::from_toml(&text).unwrap().validate().unwrap_err();
        assert!(matches!(
            err,
            ExportDownloadError::Config(ConfigError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn test_colliding_parameter_names_in_file() {
        let text = SAMPLE.replace(
            "resource_class = \"rc\"",
            "resource_class = \"rc\"\nresource_format = \"rc\"",
        );
        let config = Config::from_toml(&text).unwrap();
        assert_eq!(config.view.parameters.resource_format, "rc");

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ExportDownloadError::Config(ConfigError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[view\nname=").unwrap_err();
        assert!(matches!(
            err,
            ExportDownloadError::Config(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::from_toml(SAMPLE).unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(Some(path.as_path())).unwrap();
        assert_eq!(loaded.view.name, "BookList");
        assert_eq!(loaded.view.resources.len(), 2);
        assert_eq!(loaded.view.export_url.as_deref(), Some("/{model}/export/"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load_from_file(Some(Path::new("/nonexistent/config.toml"))).unwrap_err();
        assert!(matches!(
            err,
            ExportDownloadError::Config(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_log_level_override() {
        let mut config = Config::default();
        config.apply_log_level("TRACE");
        assert_eq!(config.logging.level, LogLevel::Trace);
        config.apply_log_level("loud");
        assert_eq!(config.logging.level, LogLevel::Trace);
        assert_eq!(LogLevel::Info.to_tracing_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_empty_filter_field_rejected() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.view.filter = Some(FilterConfig {
            fields: vec![" ".to_string()],
        });
        assert!(config.validate().is_err());
    }
}
