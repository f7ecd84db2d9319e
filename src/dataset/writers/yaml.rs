//! YAML writer
//!
//! Writes the dataset as a sequence of mappings keyed by header.

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::format::FormatCode;

use super::FormatWriter;

/// Writer for YAML format
#[derive(Debug, Clone, Default)]
pub struct YamlWriter;

impl YamlWriter {
    /// Create a YAML writer
    pub fn new() -> Self {
        Self
    }
}

impl FormatWriter for YamlWriter {
    fn format(&self) -> FormatCode {
        FormatCode::Yaml
    }

    fn write(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let objects = dataset.objects();
        let text = serde_yaml::to_string(&objects)?;
        debug!("Wrote {} rows as yaml", objects.len());
        Ok(text.into_bytes())
    }
}
