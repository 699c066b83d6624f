//! Wire-level types shared by all connectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content type of an outbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// `application/json`
    #[default]
    Json,
    /// `application/xml`
    Xml,
}

impl ContentType {
    /// MIME type sent in the `Content-Type` header.
    #[must_use]
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Xml => "application/xml",
        }
    }

    /// Short name used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "json",
            ContentType::Xml => "xml",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ParseContentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "application/json" => Ok(ContentType::Json),
            "xml" | "application/xml" => Ok(ContentType::Xml),
            _ => Err(ParseContentTypeError(s.to_string())),
        }
    }
}

/// Error parsing a content type from string.
#[derive(Debug, Clone)]
pub struct ParseContentTypeError(String);

impl fmt::Display for ParseContentTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid content type '{}', expected one of: json, xml",
            self.0
        )
    }
}

impl std::error::Error for ParseContentTypeError {}

/// Serialized document ready for transmission.
///
/// The body is kept as the exact string that goes on the wire, so a digest
/// computed over it stays valid through transmission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Content type of the body.
    pub content_type: ContentType,
    /// Wire body.
    pub body: String,
}

impl Payload {
    /// Create a JSON payload.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Json,
            body: body.into(),
        }
    }

    /// Create an XML payload.
    pub fn xml(body: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Xml,
            body: body.into(),
        }
    }

    /// Wire bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.body.as_bytes()
    }
}

/// Raw answer of the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl RemoteResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 404 status.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Body is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}
