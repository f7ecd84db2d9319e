//! CSV and TSV writers
//!
//! Both formats share one writer that differs only by delimiter. Values are
//! rendered as plain text; quoting is left to the `csv` crate.

use ::csv::{QuoteStyle, WriterBuilder};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{ExportError, Result};
use crate::format::FormatCode;
use crate::records::cell_text;

use super::FormatWriter;

/// Writer for delimiter-separated formats
#[derive(Debug, Clone)]
pub struct CsvWriter {
    /// Field delimiter
    delimiter: u8,
    /// Format this writer produces
    format: FormatCode,
}

impl CsvWriter {
    /// Comma-separated writer
    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            format: FormatCode::Csv,
        }
    }

    /// Tab-separated writer
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            format: FormatCode::Tsv,
        }
    }

    fn serialize_error(&self, reason: impl ToString) -> ExportError {
        ExportError::Serialize {
            format: self.format.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FormatWriter for CsvWriter {
    fn format(&self) -> FormatCode {
        self.format
    }

    fn write(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .from_writer(Vec::new());

        writer
            .write_record(&dataset.headers)
            .map_err(|e| self.serialize_error(e))?;

        for row in &dataset.rows {
            let record: Vec<String> = row.iter().map(cell_text).collect();
            writer
                .write_record(&record)
                .map_err(|e| self.serialize_error(e))?;
        }

        let bytes = writer.into_inner().map_err(|e| self.serialize_error(e))?;
        debug!(
            "Wrote {} rows as {} ({} bytes)",
            dataset.height(),
            self.format,
            bytes.len()
        );
        Ok(bytes)
    }
}
