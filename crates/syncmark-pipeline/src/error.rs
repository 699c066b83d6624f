//! Pipeline error types.
//!
//! One enum per stage. Everything that is fatal for a single record is
//! folded into [`RecordError`] at the pipeline boundary.

use syncmark_connector::error::ConnectorError;
use thiserror::Error;

use crate::outcome::SyncStep;

/// A source record violated an assumption of the target schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A field the mapper needs is absent or blank.
    #[error("required field '{field}' is missing")]
    MissingField { field: String },

    /// A field is present but cannot be converted.
    #[error("field '{field}' has invalid value '{value}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// The typed target document could not be serialized.
    #[error("serialization failed: {message}")]
    Serialization { message: String },
}

impl MappingError {
    /// Create a missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for MappingError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

/// The integrity mark could not be computed or placed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// The header closing tag does not occur in the document.
    #[error("insertion point '{marker}' not found")]
    InsertionPointMissing { marker: String },

    /// The header closing tag occurs more than once.
    #[error("insertion point '{marker}' occurs {count} times")]
    AmbiguousInsertionPoint { marker: String, count: usize },

    /// Only XML documents can carry an integrity mark.
    #[error("integrity marks require an XML payload")]
    UnsupportedPayload,

    /// `verify` was called on a document without a mark.
    #[error("document carries no '{element}' element")]
    MarkMissing { element: String },
}

/// A remote call failed or answered with a non-2xx status.
#[derive(Debug, Error)]
#[error("{step} call failed: {message}")]
pub struct TransportError {
    /// Step that failed.
    pub step: SyncStep,
    /// HTTP status, `None` if no response was received.
    pub status: Option<u16>,
    /// Response body, `None` if no response was received.
    pub body: Option<String>,
    /// Human-readable description.
    pub message: String,
    #[source]
    source: Option<ConnectorError>,
}

impl TransportError {
    /// Wrap a connector error raised during `step`.
    pub fn from_connector(step: SyncStep, error: ConnectorError) -> Self {
        Self {
            step,
            status: error.status(),
            body: error.body().map(str::to_string),
            message: error.to_string(),
            source: Some(error),
        }
    }

    /// An HTTP answer that the step cannot accept.
    pub fn unexpected_status(step: SyncStep, status: u16, body: impl Into<String>) -> Self {
        Self {
            step,
            status: Some(status),
            body: Some(body.into()),
            message: format!("unexpected HTTP status {status}"),
            source: None,
        }
    }

    /// Whether the request never produced an HTTP response.
    pub fn is_transport_failure(&self) -> bool {
        self.status.is_none()
    }
}

/// The persistence store rejected or failed a write.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Entry exists and overwrite was not requested.
    #[error("entry '{key}' already exists in store '{store}'")]
    AlreadyExists { store: String, key: String },

    /// Underlying I/O failure.
    #[error("failed to write '{key}' to store '{store}': {source}")]
    Io {
        store: String,
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// A diagnostic snapshot could not be recorded.
#[derive(Debug, Error)]
#[error("failed to record diagnostic '{name}': {source}")]
pub struct DiagnosticsError {
    pub name: String,
    #[source]
    pub source: std::io::Error,
}

/// Anything that turns one record into a failed outcome.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Digest(#[from] DigestError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The batch was aborted before the record reached the remote system.
    #[error("record cancelled after batch abort")]
    Cancelled,
}

impl RecordError {
    /// Short classification used in outcomes and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            RecordError::Mapping(_) => "mapping",
            RecordError::Digest(_) => "digest",
            RecordError::Transport(_) => "transport",
            RecordError::Cancelled => "cancelled",
        }
    }

    /// HTTP status of a failed remote call.
    pub fn status(&self) -> Option<u16> {
        match self {
            RecordError::Transport(e) => e.status,
            _ => None,
        }
    }

    /// Response body of a failed remote call.
    pub fn body(&self) -> Option<&str> {
        match self {
            RecordError::Transport(e) => e.body.as_deref(),
            _ => None,
        }
    }
}

/// An inbound batch could not be split into records.
#[derive(Debug, Error)]
pub enum BatchParseError {
    #[error("invalid JSON batch: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid CSV batch: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid XML batch: {0}")]
    Xml(String),

    #[error("unsupported batch shape: {0}")]
    Shape(String),
}
