//! JSON writer
//!
//! Writes the dataset as an array of objects keyed by header, in column order.

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::format::FormatCode;

use super::FormatWriter;

/// Writer for JSON format
#[derive(Debug, Clone, Default)]
pub struct JsonWriter {
    /// Pretty-print with indentation
    pretty: bool,
}

impl JsonWriter {
    /// Compact JSON writer
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Pretty-printed JSON writer
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl FormatWriter for JsonWriter {
    fn format(&self) -> FormatCode {
        FormatCode::Json
    }

    fn write(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let objects = dataset.objects();
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&objects)?
        } else {
            serde_json::to_vec(&objects)?
        };
        debug!("Wrote {} rows as json", objects.len());
        Ok(bytes)
    }
}
