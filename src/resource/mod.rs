//! Exportable resources
//!
//! A [`Resource`] describes one export shape: which columns are written, in
//! which order, under which headers. Views declare an ordered list of
//! resources; each becomes a [`ResourceDescriptor`] whose identity is its
//! position in that list.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::records::Record;

/// Separator for relation paths in field attributes (`author__name`)
pub const RELATION_SEPARATOR: &str = "__";

/// Capability: turns records into an exportable dataset
pub trait Resource: Send + Sync {
    /// Type name, used as label when no description is set
    fn name(&self) -> &str;

    /// Human-readable description shown in download menus
    fn description(&self) -> Option<&str> {
        None
    }

    /// Model the resource exports, used to derive default export routes
    fn model_name(&self) -> &str;

    /// Check that the resource can export anything at all
    ///
    /// # Returns
    /// * `Result<(), String>` - Ok, or the reason the resource is unusable
    fn check(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    /// Build the dataset for a record set
    ///
    /// # Arguments
    /// * `records` - Records to export, already filtered
    ///
    /// # Returns
    /// * `Result<Dataset>` - Dataset or error
    fn export(&self, records: &[Record]) -> Result<Dataset>;
}

/// One exported column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportField {
    /// Record attribute, `__` separates relation steps
    pub attribute: String,

    /// Column header, defaults to the attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
}

impl ExportField {
    /// Field exported under its own name
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            column_name: None,
        }
    }

    /// Set the column header
    pub fn with_column_name(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = Some(column_name.into());
        self
    }

    /// Header written for this field
    pub fn header(&self) -> &str {
        self.column_name.as_deref().unwrap_or(&self.attribute)
    }

    /// Read the field from a record, following relation steps
    ///
    /// Missing steps yield `null`.
    pub fn value(&self, record: &Record) -> Value {
        let mut steps = self.attribute.split(RELATION_SEPARATOR);
        let Some(first) = steps.next() else {
            return Value::Null;
        };

        let mut current = match record.get(first) {
            Some(v) => v,
            None => return Value::Null,
        };
        for step in steps {
            current = match current.get(step) {
                Some(v) => v,
                None => return Value::Null,
            };
        }
        current.clone()
    }
}

/// Declarative resource over a list of fields
///
/// With no declared fields, every key seen in the records is exported, in
/// first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldResource {
    /// Resource type name
    pub name: String,

    /// Exported model
    pub model: String,

    /// Optional menu label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Exported columns
    #[serde(default)]
    pub fields: Vec<ExportField>,
}

impl FieldResource {
    /// Create a resource without fields
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a field
    pub fn field(mut self, field: ExportField) -> Self {
        self.fields.push(field);
        self
    }

    /// Append several plain fields
    pub fn with_fields<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .extend(attributes.into_iter().map(ExportField::new));
        self
    }

    fn discovered_fields(records: &[Record]) -> Vec<ExportField> {
        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    fields.push(ExportField::new(key.clone()));
                }
            }
        }
        fields
    }
}

impl Resource for FieldResource {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("resource name is empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model is empty".to_string());
        }

        let mut headers = HashSet::new();
        for field in &self.fields {
            if field.attribute.trim().is_empty() {
                return Err("field attribute is empty".to_string());
            }
            if field
                .attribute
                .split(RELATION_SEPARATOR)
                .any(str::is_empty)
            {
                return Err(format!("malformed attribute '{}'", field.attribute));
            }
            if !headers.insert(field.header()) {
                return Err(format!("duplicate column '{}'", field.header()));
            }
        }
        Ok(())
    }

    fn export(&self, records: &[Record]) -> Result<Dataset> {
        let discovered;
        let fields = if self.fields.is_empty() {
            discovered = Self::discovered_fields(records);
            &discovered
        } else {
            &self.fields
        };

        let mut dataset = Dataset::new(fields.iter().map(|f| f.header().to_string()).collect());
        for record in records {
            dataset.push_row(fields.iter().map(|f| f.value(record)).collect());
        }
        Ok(dataset)
    }
}

/// A declared resource and its position in the view
#[derive(Clone)]
pub struct ResourceDescriptor {
    identity: usize,
    resource: Arc<dyn Resource>,
}

impl ResourceDescriptor {
    /// Bind a resource to its declaration index
    pub fn new(identity: usize, resource: Arc<dyn Resource>) -> Self {
        Self { identity, resource }
    }

    /// Declaration index, 0-based
    pub fn identity(&self) -> usize {
        self.identity
    }

    /// The resource itself
    pub fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    /// Menu label: the description, or the type name when none is set
    pub fn label(&self) -> &str {
        self.resource
            .description()
            .unwrap_or_else(|| self.resource.name())
    }

    /// Exported model name
    pub fn model_name(&self) -> &str {
        self.resource.model_name()
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("identity", &self.identity)
            .field("name", &self.resource.name())
            .field("model", &self.resource.model_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_field_value_follows_relations() {
        let r = record(json!({ "title": "Dune", "author": { "name": "Herbert" } }));
        assert_eq!(ExportField::new("author__name").value(&r), json!("Herbert"));
        assert_eq!(ExportField::new("author__age").value(&r), Value::Null);
        assert_eq!(ExportField::new("missing").value(&r), Value::Null);
    }

    #[test]
    fn test_export_declared_fields() {
        let resource = FieldResource::new("BookResource", "book")
            .field(ExportField::new("title").with_column_name("Title"))
            .field(ExportField::new("author__name").with_column_name("Author"));

        let records = vec![
            record(json!({ "id": 1, "title": "Dune", "author": { "name": "Herbert" } })),
            record(json!({ "id": 2, "title": "Emma" })),
        ];
        let ds = resource.export(&records).unwrap();
        assert_eq!(ds.headers, vec!["Title", "Author"]);
        assert_eq!(ds.rows[0], vec![json!("Dune"), json!("Herbert")]);
        assert_eq!(ds.rows[1], vec![json!("Emma"), Value::Null]);
    }

    #[test]
    fn test_export_discovers_fields_in_order() {
        let resource = FieldResource::new("AllFields", "book");
        let records = vec![
            record(json!({ "id": 1, "title": "Dune" })),
            record(json!({ "id": 2, "isbn": "x" })),
        ];
        let ds = resource.export(&records).unwrap();
        assert_eq!(ds.headers, vec!["id", "title", "isbn"]);
        assert_eq!(ds.rows[1], vec![json!(2), Value::Null, json!("x")]);
    }

    #[test]
    fn test_check_rejects_bad_declarations() {
        assert!(FieldResource::new("", "book").check().is_err());
        assert!(FieldResource::new("R", "").check().is_err());
        assert!(
            FieldResource::new("R", "book")
                .with_fields(["a", "a"])
                .check()
                .is_err()
        );
        assert!(
            FieldResource::new("R", "book")
                .with_fields(["author__"])
                .check()
                .is_err()
        );
        assert!(
            FieldResource::new("R", "book")
                .with_fields(["a", "b__c"])
                .check()
                .is_ok()
        );
    }

    #[test]
    fn test_descriptor_label_falls_back_to_name() {
        let plain = ResourceDescriptor::new(0, Arc::new(FieldResource::new("BookResource", "book")));
        assert_eq!(plain.label(), "BookResource");

        let described = ResourceDescriptor::new(
            1,
            Arc::new(FieldResource::new("BookResource", "book").with_description("All books")),
        );
        assert_eq!(described.label(), "All books");
        assert_eq!(described.identity(), 1);
        assert_eq!(described.model_name(), "book");
    }
}
