//! Inbound batch parsing.
//!
//! Splits a JSON, CSV or XML document into [`SourceRecord`]s.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::error::BatchParseError;
use crate::record::SourceRecord;

/// Batch file formats understood by [`InboundBatch::from_path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFormat {
    Json,
    Csv,
    Xml,
}

impl BatchFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "json" => Some(BatchFormat::Json),
            "csv" => Some(BatchFormat::Csv),
            "xml" => Some(BatchFormat::Xml),
            _ => None,
        }
    }
}

/// Ordered records of one inbound batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundBatch {
    records: Vec<SourceRecord>,
}

impl InboundBatch {
    /// Create a batch from already parsed records.
    #[must_use]
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self { records }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in input order.
    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    /// Consume the batch.
    pub fn into_records(self) -> Vec<SourceRecord> {
        self.records
    }

    /// Parse a JSON batch.
    ///
    /// Accepts a top-level array of objects or an envelope object whose one
    /// array-of-objects member holds the records (e.g.
    /// `{"batchId": "B-7", "records": [...]}`). Other envelope members are
    /// ignored. An object without such a member is itself the only record;
    /// a record with child lists must therefore be wrapped in an array.
    pub fn from_json(input: &str) -> Result<Self, BatchParseError> {
        let value: Value = serde_json::from_str(input)?;
        let records = match &value {
            Value::Array(items) => Self::json_records(items)?,
            Value::Object(object) => {
                let lists: Vec<&Vec<Value>> = object
                    .values()
                    .filter_map(Value::as_array)
                    .filter(|items| items.iter().all(Value::is_object))
                    .collect();
                match lists.as_slice() {
                    [] => vec![SourceRecord::from_json_object(object)],
                    [items] => Self::json_records(items)?,
                    _ => {
                        return Err(BatchParseError::Shape(format!(
                            "{} array members could hold the records",
                            lists.len()
                        )))
                    }
                }
            }
            other => {
                return Err(BatchParseError::Shape(format!(
                    "expected an array or object, found {other}"
                )))
            }
        };
        Ok(Self::new(records))
    }

    fn json_records(items: &[Value]) -> Result<Vec<SourceRecord>, BatchParseError> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object()
                    .map(SourceRecord::from_json_object)
                    .ok_or_else(|| BatchParseError::Shape(format!("record {i} is not an object")))
            })
            .collect()
    }

    /// Parse a CSV batch with a header row. Empty cells are dropped.
    pub fn from_csv(input: &str) -> Result<Self, BatchParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(input.as_bytes());
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let mut record = SourceRecord::new();
            for (name, value) in headers.iter().zip(row.iter()) {
                if !value.is_empty() {
                    record.insert_field(name, value);
                }
            }
            records.push(record);
        }
        Ok(Self::new(records))
    }

    /// Parse an XML batch, taking every `record_element` as one record.
    ///
    /// Attributes and leaf elements of a record become fields. Elements
    /// with element content become child records keyed by their name, and
    /// so does a leaf element that repeats: each occurrence turns into a
    /// child record with a single `value` field, as repeated JSON scalars do.
    pub fn from_xml(input: &str, record_element: &str) -> Result<Self, BatchParseError> {
        let root = XmlNode::parse(input)?;
        let mut records = Vec::new();
        root.collect(record_element, &mut records);
        Ok(Self::new(records))
    }

    /// Read and parse a batch file, choosing the format by extension.
    pub fn from_path(path: &Path, xml_record_element: &str) -> Result<Self, BatchParseError> {
        let format = BatchFormat::from_path(path).ok_or_else(|| {
            BatchParseError::Shape(format!("unknown batch file type: {}", path.display()))
        })?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| BatchParseError::Shape(format!("cannot read {}: {e}", path.display())))?;

        match format {
            BatchFormat::Json => Self::from_json(&content),
            BatchFormat::Csv => Self::from_csv(&content),
            BatchFormat::Xml => Self::from_xml(&content, xml_record_element),
        }
    }
}

/// Minimal element tree used while splitting XML batches.
#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn from_start(e: &BytesStart<'_>) -> Result<Self, BatchParseError> {
        let name = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| BatchParseError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.local_name().into_inner()).to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| BatchParseError::Xml(e.to_string()))?
                .to_string();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    fn parse(input: &str) -> Result<Self, BatchParseError> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut stack = vec![XmlNode::default()];
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => stack.push(Self::from_start(e)?),
                Ok(Event::Empty(ref e)) => {
                    let node = Self::from_start(e)?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
                Ok(Event::Text(ref e)) => {
                    let text = e.unescape().map_err(|e| BatchParseError::Xml(e.to_string()))?;
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(node) = stack.last_mut() {
                        node.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                    }
                }
                Ok(Event::End(_)) => {
                    if stack.len() < 2 {
                        return Err(BatchParseError::Xml("unbalanced end tag".to_string()));
                    }
                    if let Some(node) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(node);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(BatchParseError::Xml(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        if stack.len() != 1 {
            return Err(BatchParseError::Xml("unexpected end of document".to_string()));
        }
        Ok(stack.pop().unwrap_or_default())
    }

    fn collect(&self, record_element: &str, out: &mut Vec<SourceRecord>) {
        for child in &self.children {
            if child.name == record_element {
                out.push(child.to_record());
            } else {
                child.collect(record_element, out);
            }
        }
    }

    fn to_record(&self) -> SourceRecord {
        let mut record = SourceRecord::new();
        for (key, value) in &self.attributes {
            record.insert_field(key, value);
        }
        let mut leaf_counts: HashMap<&str, usize> = HashMap::new();
        for child in self.children.iter().filter(|c| c.is_leaf()) {
            *leaf_counts.entry(child.name.as_str()).or_default() += 1;
        }
        for child in &self.children {
            if !child.is_leaf() {
                record.push_child(&child.name, child.to_record());
            } else if leaf_counts.get(child.name.as_str()).copied().unwrap_or(0) > 1 {
                let item = SourceRecord::new().with_field("value", &child.text);
                record.push_child(&child.name, item);
            } else {
                record.insert_field(&child.name, &child.text);
            }
        }
        record
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty() && self.attributes.is_empty()
    }
}
