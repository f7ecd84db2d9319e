//! Format writers for datasets
//!
//! This module provides a unified interface for serializing a dataset into
//! the bytes of one export format (CSV, TSV, JSON, YAML, spreadsheet).

use crate::error::Result;
use crate::format::FormatCode;

use super::Dataset;

pub mod csv;
pub mod json;
pub mod xls;
pub mod yaml;

pub use csv::CsvWriter;
pub use json::JsonWriter;
pub use xls::XlsWriter;
pub use yaml::YamlWriter;

/// Trait for writing datasets in one format
pub trait FormatWriter: Send + Sync {
    /// Format produced by this writer
    fn format(&self) -> FormatCode;

    /// Serialize a dataset
    ///
    /// # Arguments
    /// * `dataset` - Dataset to write
    ///
    /// # Returns
    /// * `Result<Vec<u8>>` - Serialized bytes
    fn write(&self, dataset: &Dataset) -> Result<Vec<u8>>;
}

/// Writer registered for a format
pub fn writer_for(format: FormatCode) -> Box<dyn FormatWriter> {
    match format {
        FormatCode::Csv => Box::new(CsvWriter::csv()),
        FormatCode::Tsv => Box::new(CsvWriter::tsv()),
        FormatCode::Json => Box::new(JsonWriter::new()),
        FormatCode::Yaml => Box::new(YamlWriter::new()),
        FormatCode::Xls => Box::new(XlsWriter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_format_has_a_writer() {
        for format in FormatCode::ALL {
            assert_eq!(writer_for(format).format(), format);
        }
    }
}
