//! Source records.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::MappingError;

/// One entity occurrence of an inbound batch.
///
/// Scalar attributes are kept as the strings they arrived as; conversion is
/// the mapper's job. Nested lists become named child records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    children: BTreeMap<String, Vec<SourceRecord>>,
}

impl SourceRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_field(name, value);
        self
    }

    /// Builder-style child append.
    #[must_use]
    pub fn with_child(mut self, list: impl Into<String>, child: SourceRecord) -> Self {
        self.push_child(list, child);
        self
    }

    /// Set a field, replacing any previous value.
    pub fn insert_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Append a child record to the named list.
    pub fn push_child(&mut self, list: impl Into<String>, child: SourceRecord) {
        self.children.entry(list.into()).or_default().push(child);
    }

    /// Trimmed field value, `None` when absent or blank.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Trimmed field value or a [`MappingError::MissingField`].
    pub fn require(&self, name: &str) -> Result<&str, MappingError> {
        self.get(name).ok_or_else(|| MappingError::missing(name))
    }

    /// Child records of the named list (empty if none).
    pub fn children(&self, list: &str) -> &[SourceRecord] {
        self.children.get(list).map_or(&[], Vec::as_slice)
    }

    /// All scalar fields.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the record carries neither fields nor children.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.children.is_empty()
    }

    /// Build a record from a JSON object.
    ///
    /// Strings, numbers and booleans become fields, `null` is dropped,
    /// arrays of objects and nested objects become child lists.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut record = Self::new();
        for (key, value) in object {
            match value {
                Value::Null => {}
                Value::String(s) => record.insert_field(key, s.clone()),
                Value::Number(n) => record.insert_field(key, n.to_string()),
                Value::Bool(b) => record.insert_field(key, b.to_string()),
                Value::Object(nested) => record.push_child(key, Self::from_json_object(nested)),
                Value::Array(items) => {
                    for item in items {
                        match item {
                            Value::Object(nested) => {
                                record.push_child(key, Self::from_json_object(nested));
                            }
                            Value::Null => {}
                            scalar => {
                                let value = match scalar {
                                    Value::String(s) => s.clone(),
                                    other => other.to_string(),
                                };
                                record.push_child(key, Self::new().with_field("value", value));
                            }
                        }
                    }
                }
            }
        }
        record
    }

    /// JSON snapshot used for diagnostics.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
