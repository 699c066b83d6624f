//! REST Connector configuration
//!
//! Base URL, credentials, timeouts and the URL conventions of the target
//! system.

use std::collections::HashMap;
use syncmark_connector::config::{
    AuthConfig, ConnectionSettings, ConnectorConfig, EndpointTemplate, LookupStyle,
};
use syncmark_connector::error::{ConnectorError, ConnectorResult};
use url::Url;

use crate::retry::{LogVerbosity, RetryConfig};

/// Configuration for REST connector.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL for API requests (e.g., "https://erp.example.com/api").
    pub base_url: String,

    /// Authentication configuration.
    pub auth: AuthConfig,

    /// Connection settings (timeouts).
    pub connection: ConnectionSettings,

    /// Default headers to include in all requests.
    pub default_headers: HashMap<String, String>,

    /// Retry configuration for the existence lookup.
    pub retry: RetryConfig,

    /// Logging verbosity for request/response logging.
    pub log_verbosity: LogVerbosity,
}

impl RestConfig {
    /// Create a new REST config with required fields.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: AuthConfig::None,
            connection: ConnectionSettings::default(),
            default_headers: HashMap::new(),
            retry: RetryConfig::default(),
            log_verbosity: LogVerbosity::default(),
        }
    }

    /// Set authentication.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Set basic authentication.
    pub fn with_basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_auth(AuthConfig::basic(username, password))
    }

    /// Set connection settings.
    pub fn with_connection(mut self, connection: ConnectionSettings) -> Self {
        self.connection = connection;
        self
    }

    /// Add a default header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Set retry configuration.
    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Disable retries.
    pub fn without_retry(mut self) -> Self {
        self.retry = RetryConfig::disabled();
        self
    }

    /// Set logging verbosity.
    pub fn with_log_verbosity(mut self, verbosity: LogVerbosity) -> Self {
        self.log_verbosity = verbosity;
        self
    }

    /// `{base}{path}` for an entity type.
    fn resource_url(&self, endpoint: &EndpointTemplate) -> ConnectorResult<Url> {
        let base = self.base_url.trim_end_matches('/');
        let path = endpoint.path.trim_end_matches('/');
        let joined = if path.is_empty() || path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        Url::parse(&joined).map_err(|e| {
            ConnectorError::invalid_configuration(format!("invalid endpoint URL '{joined}': {e}"))
        })
    }

    fn with_segments(mut url: Url, segments: &[&str]) -> ConnectorResult<Url> {
        url.path_segments_mut()
            .map_err(|()| ConnectorError::invalid_configuration("base_url cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Existence lookup URL: `{base}{path}?{id}` or `{base}{path}/{id}`.
    pub fn lookup_url(&self, endpoint: &EndpointTemplate, identifier: &str) -> ConnectorResult<Url> {
        let url = self.resource_url(endpoint)?;
        match endpoint.lookup_style {
            LookupStyle::Query => {
                let mut url = url;
                url.set_query(Some(identifier));
                Ok(url)
            }
            LookupStyle::Path => Self::with_segments(url, &[identifier]),
        }
    }

    /// Create URL: `{base}{path}/Create`.
    pub fn create_url(&self, endpoint: &EndpointTemplate) -> ConnectorResult<Url> {
        Self::with_segments(self.resource_url(endpoint)?, &[&endpoint.create_segment])
    }

    /// Update URL: `{base}{path}/Update`.
    pub fn update_url(&self, endpoint: &EndpointTemplate) -> ConnectorResult<Url> {
        Self::with_segments(self.resource_url(endpoint)?, &[&endpoint.update_segment])
    }

    /// Activation URL: `{base}{path}/{id}/Activate`.
    pub fn activate_url(
        &self,
        endpoint: &EndpointTemplate,
        identifier: &str,
    ) -> ConnectorResult<Url> {
        Self::with_segments(
            self.resource_url(endpoint)?,
            &[identifier, &endpoint.activate_segment],
        )
    }

    /// Submission URL: `{base}{path}`.
    pub fn submit_url(&self, endpoint: &EndpointTemplate) -> ConnectorResult<Url> {
        self.resource_url(endpoint)
    }
}

impl ConnectorConfig for RestConfig {
    fn validate(&self) -> ConnectorResult<()> {
        if self.base_url.is_empty() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "base_url is required".to_string(),
            });
        }

        let url = Url::parse(&self.base_url).map_err(|e| ConnectorError::InvalidConfiguration {
            message: format!("invalid base_url: {e}"),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConnectorError::InvalidConfiguration {
                    message: format!("unsupported scheme: {other}"),
                })
            }
        }

        if url.host_str().is_none() {
            return Err(ConnectorError::InvalidConfiguration {
                message: "base_url has no host".to_string(),
            });
        }

        if self.connection.call_timeout_ms == 0 {
            return Err(ConnectorError::InvalidConfiguration {
                message: "call timeout must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.auth = config.auth.redacted();
        config
    }
}
