//! Spreadsheet writer
//!
//! Writes a single-sheet workbook: a header row followed by one row per record.
//! Numbers and booleans keep their cell type, nested values are written as
//! their JSON text.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use serde_json::Value;
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{ExportError, Result};
use crate::format::FormatCode;

use super::FormatWriter;

/// Name of the exported worksheet
const SHEET_NAME: &str = "Export";

/// Writer for spreadsheet format
#[derive(Debug, Clone, Default)]
pub struct XlsWriter {
    /// Render the header row in bold
    bold_headers: bool,
}

impl XlsWriter {
    /// Create a spreadsheet writer with bold headers
    pub fn new() -> Self {
        Self { bold_headers: true }
    }

    fn write_cell(
        sheet: &mut Worksheet,
        row: u32,
        col: u16,
        value: &Value,
    ) -> std::result::Result<(), XlsxError> {
        match value {
            Value::Null => {}
            Value::Bool(b) => {
                sheet.write_boolean(row, col, *b)?;
            }
            Value::Number(n) => match n.as_f64() {
                Some(f) => {
                    sheet.write_number(row, col, f)?;
                }
                None => {
                    sheet.write_string(row, col, n.to_string())?;
                }
            },
            Value::String(s) => {
                sheet.write_string(row, col, s)?;
            }
            other => {
                sheet.write_string(row, col, other.to_string())?;
            }
        }
        Ok(())
    }

    fn build(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let width = u16::try_from(dataset.width()).map_err(|_| ExportError::Serialize {
            format: FormatCode::Xls.to_string(),
            reason: format!("{} columns exceed the sheet width", dataset.width()),
        })?;
        let height = u32::try_from(dataset.height())
            .ok()
            .and_then(|h| h.checked_add(1))
            .ok_or_else(|| ExportError::Serialize {
                format: FormatCode::Xls.to_string(),
                reason: format!("{} rows exceed the sheet height", dataset.height()),
            })?;

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        let header_format = if self.bold_headers {
            Format::new().set_bold()
        } else {
            Format::new()
        };

        for (col, header) in (0..width).zip(&dataset.headers) {
            sheet.write_string_with_format(0, col, header, &header_format)?;
        }

        for (row_index, row) in (1..height).zip(&dataset.rows) {
            for (col, value) in (0..width).zip(row) {
                Self::write_cell(sheet, row_index, col, value)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

impl FormatWriter for XlsWriter {
    fn format(&self) -> FormatCode {
        FormatCode::Xls
    }

    fn write(&self, dataset: &Dataset) -> Result<Vec<u8>> {
        let bytes = self.build(dataset)?;
        debug!(
            "Wrote {} rows as workbook ({} bytes)",
            dataset.height(),
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportDownloadError;
    use serde_json::json;

    #[test]
    fn test_workbook_is_zip_container() {
        let mut ds = Dataset::new(vec!["title".into(), "price".into(), "ok".into()]);
        ds.push_row(vec![json!("Dune"), json!(9.5), json!(true)]);
        ds.push_row(vec![json!({"nested": 1}), Value::Null, json!(false)]);

        let bytes = XlsWriter::new().write(&ds).unwrap();
        assert!(bytes.len() > 4);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_too_many_columns_is_an_error() {
        let headers: Vec<String> = (0..=usize::from(u16::MAX)).map(|i| format!("c{i}")).collect();
        let ds = Dataset::new(headers);

        let err = XlsWriter::new().write(&ds).unwrap_err();
        assert!(matches!(
            err,
            ExportDownloadError::Export(ExportError::Serialize { ref reason, .. })
                if reason == "65536 columns exceed the sheet width"
        ));
    }

    #[test]
    fn test_empty_workbook() {
        let ds = Dataset::new(Vec::new());
        let bytes = XlsWriter::default().write(&ds).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
