//! View configuration and its validation
//!
//! A [`ViewConfiguration`] pairs the ordered resources of a view with the
//! formats it offers. It is validated once when built and never changes
//! afterwards; requests only read it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::format::FormatCode;
use crate::resource::{Resource, ResourceDescriptor};

/// Default name of the resource selector parameter
pub const DEFAULT_RESOURCE_CLASS_PARAMETER: &str = "resource_class";

/// Default name of the format selector parameter
pub const DEFAULT_RESOURCE_FORMAT_PARAMETER: &str = "resource_format";

/// Default name of the same-page download marker
pub const DEFAULT_DOWNLOAD_PARAMETER: &str = "download";

/// Names of the query parameters a view reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// Resource index selector
    #[serde(default = "default_resource_class")]
    pub resource_class: String,

    /// Format code selector
    #[serde(default = "default_resource_format")]
    pub resource_format: String,

    /// Marker whose presence selects download handling
    #[serde(default = "default_download")]
    pub download: String,
}

fn default_resource_class() -> String {
    DEFAULT_RESOURCE_CLASS_PARAMETER.to_string()
}

fn default_resource_format() -> String {
    DEFAULT_RESOURCE_FORMAT_PARAMETER.to_string()
}

fn default_download() -> String {
    DEFAULT_DOWNLOAD_PARAMETER.to_string()
}

impl Parameters {
    /// Check that every name is set and the three names are distinct
    ///
    /// # Returns
    /// * `Result<(), String>` - Ok, or the first problem found
    pub fn check(&self) -> Result<(), String> {
        let names = [
            ("resource_class", &self.resource_class),
            ("resource_format", &self.resource_format),
            ("download", &self.download),
        ];

        for (i, (role, name)) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(format!("{role} name is empty"));
            }
            if let Some((other, _)) = names[..i].iter().find(|(_, n)| n == name) {
                return Err(format!("{role} and {other} share the name '{name}'"));
            }
        }
        Ok(())
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            resource_class: default_resource_class(),
            resource_format: default_resource_format(),
            download: default_download(),
        }
    }
}

/// Validated resources and formats of one view
#[derive(Debug, Clone)]
pub struct ViewConfiguration {
    name: String,
    descriptors: Vec<ResourceDescriptor>,
    formats: Vec<FormatCode>,
    parameters: Parameters,
}

impl ViewConfiguration {
    /// Build and validate a configuration
    ///
    /// # Arguments
    /// * `name` - View name, used in error messages and logs
    /// * `resources` - Resources in declaration order
    /// * `formats` - Allowed formats in menu order
    ///
    /// # Returns
    /// * `Result<Self, ConfigError>` - Configuration, or the first rule it breaks
    pub fn new(
        name: impl Into<String>,
        resources: Vec<Arc<dyn Resource>>,
        formats: Vec<FormatCode>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();

        if resources.is_empty() {
            return Err(ConfigError::NoResources { view: name });
        }
        for resource in &resources {
            if let Err(reason) = resource.check() {
                return Err(ConfigError::NotExportable {
                    view: name,
                    resource: resource.name().to_string(),
                    reason,
                });
            }
        }

        if formats.is_empty() {
            return Err(ConfigError::NoFormats { view: name });
        }
        for (i, format) in formats.iter().enumerate() {
            if formats[..i].contains(format) {
                return Err(ConfigError::DuplicateFormat {
                    view: name,
                    format: format.to_string(),
                });
            }
        }

        let descriptors = resources
            .into_iter()
            .enumerate()
            .map(|(i, r)| ResourceDescriptor::new(i, r))
            .collect::<Vec<_>>();

        debug!(
            "Validated view {}: {} resources, formats [{}]",
            name,
            descriptors.len(),
            formats
                .iter()
                .map(|f| f.code())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            name,
            descriptors,
            formats,
            parameters: Parameters::default(),
        })
    }

    /// Build a configuration from declared format codes
    ///
    /// Every code must be a key of the known format table.
    pub fn from_codes<S: AsRef<str>>(
        name: impl Into<String>,
        resources: Vec<Arc<dyn Resource>>,
        codes: &[S],
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if codes.is_empty() {
            return Err(ConfigError::NoFormats { view: name });
        }

        let mut formats = Vec::with_capacity(codes.len());
        for code in codes {
            let code = code.as_ref();
            match code.parse::<FormatCode>() {
                Ok(format) => formats.push(format),
                Err(_) => {
                    return Err(ConfigError::UnknownFormat {
                        view: name,
                        format: code.to_string(),
                    });
                }
            }
        }

        Self::new(name, resources, formats)
    }

    /// Replace the query parameter names
    ///
    /// # Returns
    /// * `Result<Self, ConfigError>` - Configuration, or `InvalidParameters`
    ///   when a name is empty or two names collide
    pub fn with_parameters(mut self, parameters: Parameters) -> Result<Self, ConfigError> {
        if let Err(reason) = parameters.check() {
            return Err(ConfigError::InvalidParameters {
                view: self.name,
                reason,
            });
        }
        self.parameters = parameters;
        Ok(self)
    }

    /// View name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resources in declaration order
    pub fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    /// Resource at a declaration index
    pub fn descriptor(&self, index: usize) -> Option<&ResourceDescriptor> {
        self.descriptors.get(index)
    }

    /// Allowed formats in declaration order
    pub fn formats(&self) -> &[FormatCode] {
        &self.formats
    }

    /// Whether a format is offered by this view
    pub fn allows(&self, format: FormatCode) -> bool {
        self.formats.contains(&format)
    }

    /// Format used when the request names none: the first allowed format
    pub fn default_format(&self) -> FormatCode {
        // Non-empty by construction.
        self.formats[0]
    }

    /// Query parameter names
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::FieldResource;

    fn resources() -> Vec<Arc<dyn Resource>> {
        vec![
            Arc::new(FieldResource::new("A", "book")),
            Arc::new(FieldResource::new("B", "book").with_description("Second")),
        ]
    }

    #[test]
    fn test_valid_configuration() {
        let config = ViewConfiguration::from_codes("BookList", resources(), &["csv", "xls"]).unwrap();
        assert_eq!(config.name(), "BookList");
        assert_eq!(config.descriptors().len(), 2);
        assert_eq!(config.descriptor(1).unwrap().identity(), 1);
        assert_eq!(config.formats(), [FormatCode::Csv, FormatCode::Xls]);
        assert_eq!(config.default_format(), FormatCode::Csv);
        assert!(config.allows(FormatCode::Xls));
        assert!(!config.allows(FormatCode::Json));
        assert_eq!(config.parameters(), &Parameters::default());
    }

    #[test]
    fn test_rejects_missing_resources() {
        let err = ViewConfiguration::new("V", Vec::new(), vec![FormatCode::Csv]).unwrap_err();
        assert!(matches!(err, ConfigError::NoResources { .. }));
    }

    #[test]
    fn test_rejects_unexportable_resource() {
        let bad: Vec<Arc<dyn Resource>> = vec![Arc::new(FieldResource::new("Bad", ""))];
        let err = ViewConfiguration::new("V", bad, vec![FormatCode::Csv]).unwrap_err();
        assert!(matches!(err, ConfigError::NotExportable { ref resource, .. } if resource == "Bad"));
    }

    #[test]
    fn test_rejects_missing_formats() {
        let err = ViewConfiguration::new("V", resources(), Vec::new()).unwrap_err();
        assert!(matches!(err, ConfigError::NoFormats { .. }));

        let none: [&str; 0] = [];
        let err = ViewConfiguration::from_codes("V", resources(), &none).unwrap_err();
        assert!(matches!(err, ConfigError::NoFormats { .. }));
    }

    #[test]
    fn test_rejects_unknown_format() {
        let err = ViewConfiguration::from_codes("V", resources(), &["csv", "pdf"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFormat { ref format, .. } if format == "pdf"));
    }

    #[test]
    fn test_rejects_duplicate_format() {
        let err = ViewConfiguration::from_codes("V", resources(), &["csv", "CSV"]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateFormat { .. }));
    }

    #[test]
    fn test_custom_parameters() {
        let parameters = Parameters {
            resource_class: "rc".into(),
            resource_format: "rf".into(),
            download: "dl".into(),
        };
        let config = ViewConfiguration::from_codes("V", resources(), &["json"])
            .unwrap()
            .with_parameters(parameters.clone())
            .unwrap();
        assert_eq!(config.parameters(), &parameters);
    }

    #[test]
    fn test_rejects_colliding_parameter_names() {
        let base = || ViewConfiguration::from_codes("V", resources(), &["csv"]).unwrap();

        let same_selectors = Parameters {
            resource_class: "p".into(),
            resource_format: "p".into(),
            ..Parameters::default()
        };
        let err = base().with_parameters(same_selectors).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameters { ref view, .. } if view == "V"));
        assert_eq!(
            err.to_string(),
            "Invalid V.parameters: resource_format and resource_class share the name 'p'"
        );

        let marker_is_selector = Parameters {
            download: "resource_class".into(),
            ..Parameters::default()
        };
        assert!(base().with_parameters(marker_is_selector).is_err());

        let empty = Parameters {
            resource_format: " ".into(),
            ..Parameters::default()
        };
        assert!(matches!(
            base().with_parameters(empty),
            Err(ConfigError::InvalidParameters { .. })
        ));
    }
}
