//! Tabular datasets produced by resources
//!
//! A resource turns records into a [`Dataset`]: an ordered header row and one
//! row of values per record. Writers in [`writers`] serialize a dataset into
//! the bytes of one export format.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::format::FormatCode;

pub mod writers;

pub use writers::{CsvWriter, FormatWriter, JsonWriter, XlsWriter, YamlWriter, writer_for};

/// Headers plus rows of values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    /// Column headers
    pub headers: Vec<String>,
    /// One row per record, aligned with `headers`
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create an empty dataset with the given headers
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row
    ///
    /// Short rows are padded with nulls and long rows truncated so every row
    /// stays aligned with the headers.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.headers.len(), Value::Null);
        self.rows.push(row);
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Rows as header-keyed objects, column order preserved
    pub fn objects(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Serialize the dataset in the given format
    ///
    /// # Arguments
    /// * `format` - Target format
    ///
    /// # Returns
    /// * `Result<Vec<u8>>` - Serialized bytes or error
    pub fn export(&self, format: FormatCode) -> Result<Vec<u8>> {
        writer_for(format).write(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_row_aligns() {
        let mut ds = Dataset::new(vec!["a".into(), "b".into()]);
        ds.push_row(vec![json!(1)]);
        ds.push_row(vec![json!(1), json!(2), json!(3)]);
        assert_eq!(ds.height(), 2);
        assert_eq!(ds.width(), 2);
        assert_eq!(ds.rows[0], vec![json!(1), Value::Null]);
        assert_eq!(ds.rows[1].len(), 2);
    }

    #[test]
    fn test_objects_keep_column_order() {
        let mut ds = Dataset::new(vec!["z".into(), "a".into()]);
        ds.push_row(vec![json!("last"), json!("first")]);
        let objects = ds.objects();
        let keys: Vec<&String> = objects[0].keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
