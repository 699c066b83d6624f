//! Connector configuration types
//!
//! Base trait and common configuration structures.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConnectorResult;
use crate::types::ContentType;

/// Trait for connector-specific configuration.
pub trait ConnectorConfig: Clone + Send + Sync {
    /// Validate the configuration.
    ///
    /// Returns an error if the configuration is invalid.
    fn validate(&self) -> ConnectorResult<()>;

    /// Create a redacted version of this config (for logging/display).
    ///
    /// Sensitive fields should be replaced with placeholders.
    fn redacted(&self) -> Self;
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// No authentication.
    #[default]
    None,

    /// HTTP Basic authentication.
    Basic {
        username: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
}

impl AuthConfig {
    /// Create basic auth configuration.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthConfig::Basic {
            username: username.into(),
            password: Some(password.into()),
        }
    }

    /// Replace secrets with a placeholder.
    #[must_use]
    pub fn redacted(&self) -> Self {
        match self {
            AuthConfig::None => AuthConfig::None,
            AuthConfig::Basic { username, password } => AuthConfig::Basic {
                username: username.clone(),
                password: password.as_ref().map(|_| "***".to_string()),
            },
        }
    }
}

/// Connection settings shared across connector types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// Whole-call timeout in milliseconds (connect, send and read).
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

fn default_connection_timeout_ms() -> u64 {
    10_000
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connection_timeout_ms: default_connection_timeout_ms(),
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

impl ConnectionSettings {
    /// Create new connection settings with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call timeout. The connect timeout never exceeds it.
    #[must_use]
    pub fn with_call_timeout_ms(mut self, ms: u64) -> Self {
        self.call_timeout_ms = ms;
        self.connection_timeout_ms = self.connection_timeout_ms.min(ms);
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn with_connection_timeout_ms(mut self, ms: u64) -> Self {
        self.connection_timeout_ms = ms;
        self
    }

    /// Get connect timeout as Duration.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Get call timeout as Duration.
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// How the existence lookup carries the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LookupStyle {
    /// `GET {base}{path}?{identifier}`
    #[default]
    Query,
    /// `GET {base}{path}/{identifier}`
    Path,
}

impl LookupStyle {
    /// Short name used in configuration.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStyle::Query => "query",
            LookupStyle::Path => "path",
        }
    }
}

impl fmt::Display for LookupStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LookupStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "query" => Ok(LookupStyle::Query),
            "path" => Ok(LookupStyle::Path),
            _ => Err(format!(
                "invalid lookup style '{s}', expected one of: query, path"
            )),
        }
    }
}

/// What the activation call sends as its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivationBody {
    /// Empty body.
    #[default]
    Empty,
    /// The mapped document.
    Document,
}

/// Endpoint template for one entity type.
///
/// All paths are relative to the connector base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointTemplate {
    /// Resource path of the entity type (e.g. `/BusinessPartner`). May be empty.
    #[serde(default)]
    pub path: String,

    /// Identifier placement for the existence lookup.
    #[serde(default)]
    pub lookup_style: LookupStyle,

    /// Content type for create, update, activate and submit bodies.
    #[serde(default)]
    pub content_type: ContentType,

    /// Body of the activation call.
    #[serde(default)]
    pub activation_body: ActivationBody,

    /// Path segment appended for create.
    #[serde(default = "default_create_segment")]
    pub create_segment: String,

    /// Path segment appended for update.
    #[serde(default = "default_update_segment")]
    pub update_segment: String,

    /// Path segment appended after the identifier for activation.
    #[serde(default = "default_activate_segment")]
    pub activate_segment: String,
}

fn default_create_segment() -> String {
    "Create".to_string()
}

fn default_update_segment() -> String {
    "Update".to_string()
}

fn default_activate_segment() -> String {
    "Activate".to_string()
}

impl EndpointTemplate {
    /// Create an endpoint template with default segments.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            lookup_style: LookupStyle::default(),
            content_type: ContentType::default(),
            activation_body: ActivationBody::default(),
            create_segment: default_create_segment(),
            update_segment: default_update_segment(),
            activate_segment: default_activate_segment(),
        }
    }

    /// Set the lookup style.
    #[must_use]
    pub fn with_lookup_style(mut self, style: LookupStyle) -> Self {
        self.lookup_style = style;
        self
    }

    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Set the activation body.
    #[must_use]
    pub fn with_activation_body(mut self, body: ActivationBody) -> Self {
        self.activation_body = body;
        self
    }
}
