//! Record sources and filters
//!
//! The dispatcher never queries storage itself. It asks a [`RecordSource`] for
//! the full record set and, when one is configured, narrows it with a
//! [`RecordFilter`] driven by the raw query parameters.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::query::QueryParams;
use crate::resource::ExportField;

/// One record, as an ordered field map
pub type Record = Map<String, Value>;

/// Capability: provides every record of a model
pub trait RecordSource: Send + Sync {
    /// Fetch all records
    ///
    /// # Returns
    /// * `Result<Vec<Record>>` - The full record set or error
    fn all(&self) -> Result<Vec<Record>>;
}

/// Capability: narrows a record set using raw query parameters
pub trait RecordFilter: Send + Sync {
    /// Filter records
    ///
    /// # Arguments
    /// * `params` - Raw query parameters of the request
    /// * `records` - Records to narrow
    ///
    /// # Returns
    /// * `Result<Vec<Record>>` - Remaining records or error
    fn filter(&self, params: &QueryParams, records: Vec<Record>) -> Result<Vec<Record>>;
}

impl<F> RecordSource for F
where
    F: Fn() -> Result<Vec<Record>> + Send + Sync,
{
    fn all(&self) -> Result<Vec<Record>> {
        self()
    }
}

/// In-memory record source
#[derive(Debug, Clone, Default)]
pub struct StaticRecords {
    records: Vec<Record>,
}

impl StaticRecords {
    /// Wrap a list of records
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Build a source from a JSON array of objects
    ///
    /// # Arguments
    /// * `value` - JSON array; every element must be an object
    ///
    /// # Returns
    /// * `Result<Self>` - Source or error if the shape is wrong
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(ExportError::Source("records must be a JSON array".to_string()).into());
        };

        let mut records = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match item {
                Value::Object(map) => records.push(map),
                other => {
                    return Err(ExportError::Source(format!(
                        "record #{i} is not an object: {other}"
                    ))
                    .into());
                }
            }
        }
        Ok(Self { records })
    }

    /// Parse a JSON document holding an array of objects
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ExportError::Source(format!("invalid records file: {e}")))?;
        Self::from_json(value)
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the source is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for StaticRecords {
    fn all(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }
}

/// Exact-match filter over declared fields
///
/// For every declared field present in the query with a non-empty value, a
/// record is kept when its field text equals one of the values. Fields may
/// follow relations (`author__name`), like export columns. Parameters
/// that are not declared fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    fields: Vec<String>,
}

impl FieldFilter {
    /// Create a filter over the given fields
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Declared filter fields
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn matches(record: &Record, field: &str, wanted: &[&String]) -> bool {
        let text = cell_text(&ExportField::new(field).value(record));
        wanted.iter().any(|w| **w == text)
    }
}

impl RecordFilter for FieldFilter {
    fn filter(&self, params: &QueryParams, records: Vec<Record>) -> Result<Vec<Record>> {
        let active: Vec<(&str, Vec<&String>)> = self
            .fields
            .iter()
            .filter_map(|field| {
                let values: Vec<&String> = params
                    .get_all(field)
                    .iter()
                    .filter(|v| !v.is_empty())
                    .collect();
                (!values.is_empty()).then_some((field.as_str(), values))
            })
            .collect();

        if active.is_empty() {
            return Ok(records);
        }

        let before = records.len();
        let kept: Vec<Record> = records
            .into_iter()
            .filter(|record| {
                active
                    .iter()
                    .all(|(field, wanted)| Self::matches(record, field, wanted))
            })
            .collect();

        debug!(
            "Field filter kept {} of {} records ({} active fields)",
            kept.len(),
            before,
            active.len()
        );
        Ok(kept)
    }
}

/// Plain-text rendering of a field value
///
/// Strings are verbatim, null is empty, everything else is its JSON text.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}
