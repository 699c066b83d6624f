//! REST Connector implementation
//!
//! Implements the connector capability traits over HTTP with `reqwest`.

use async_trait::async_trait;
use reqwest::{header, Client, Method, Response};
use std::sync::Arc;
use tracing::{debug, info, instrument, trace, warn};
use url::Url;

use syncmark_connector::config::{AuthConfig, ConnectorConfig, EndpointTemplate};
use syncmark_connector::error::{ConnectorError, ConnectorResult};
use syncmark_connector::traits::{ActivateOp, Connector, CreateOp, LookupOp, SubmitOp, UpdateOp};
use syncmark_connector::types::{Payload, RemoteResponse};

use crate::config::RestConfig;

/// REST Connector for synchronizing entities with an HTTP target system.
pub struct RestConnector {
    /// Configuration.
    config: RestConfig,

    /// Display name for this connector instance.
    display_name: String,

    /// HTTP client.
    client: Arc<Client>,
}

impl std::fmt::Debug for RestConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestConnector")
            .field("config", &self.config.redacted())
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl RestConnector {
    /// Create a new REST connector with the given configuration.
    pub fn new(config: RestConfig) -> ConnectorResult<Self> {
        config.validate()?;

        let display_name = format!("REST: {}", config.base_url);
        let client = Self::build_client(&config)?;

        Ok(Self {
            config,
            display_name,
            client: Arc::new(client),
        })
    }

    /// Connector configuration.
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Build the reqwest client with configuration.
    fn build_client(config: &RestConfig) -> ConnectorResult<Client> {
        Client::builder()
            .timeout(config.connection.call_timeout())
            .connect_timeout(config.connection.connection_timeout())
            .build()
            .map_err(|e| ConnectorError::InvalidConfiguration {
                message: format!("Failed to build HTTP client: {e}"),
            })
    }

    /// Get authentication header value.
    fn auth_header(&self) -> Option<String> {
        match &self.config.auth {
            AuthConfig::None => None,
            AuthConfig::Basic { username, password } => {
                let credentials = format!("{}:{}", username, password.as_deref().unwrap_or(""));
                Some(format!("Basic {}", base64_encode(credentials)))
            }
        }
    }

    /// Build a request with all configured headers.
    fn build_request(
        &self,
        method: Method,
        url: &Url,
        payload: Option<&Payload>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url.clone());

        for (name, value) in &self.config.default_headers {
            builder = builder.header(name, value);
        }

        if let Some(auth_value) = self.auth_header() {
            builder = builder.header(header::AUTHORIZATION, auth_value);
        }

        match payload {
            Some(payload) => builder
                .header(header::CONTENT_TYPE, payload.content_type.mime())
                .body(payload.body.clone()),
            None => builder,
        }
    }

    /// Map a `reqwest` failure that produced no response.
    fn transport_error(&self, url: &Url, e: reqwest::Error) -> ConnectorError {
        if e.is_timeout() {
            ConnectorError::ConnectionTimeout {
                timeout_ms: self.config.connection.call_timeout_ms,
            }
        } else if e.is_connect() {
            ConnectorError::connection_failed_with_source(format!("Connection failed: {url}"), e)
        } else {
            ConnectorError::network_with_source(format!("Request failed: {url}"), e)
        }
    }

    /// Read status and body from a response.
    async fn read_response(&self, url: &Url, response: Response) -> ConnectorResult<RemoteResponse> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        if self.config.log_verbosity.is_enabled() {
            debug!(url = %url, status = %status, "Received REST response");
        }
        if self.config.log_verbosity.log_bodies() {
            trace!(body = %body, "Response body");
        }

        Ok(RemoteResponse::new(status.as_u16(), body))
    }

    /// Send a request exactly once.
    async fn send(
        &self,
        method: Method,
        url: &Url,
        payload: Option<&Payload>,
    ) -> ConnectorResult<RemoteResponse> {
        let verbosity = &self.config.log_verbosity;
        let request = self.build_request(method.clone(), url, payload);

        if verbosity.is_enabled() {
            debug!(url = %url, method = %method, "Sending REST request");
        }
        if verbosity.log_headers() {
            trace!(headers = ?self.config.default_headers, "Request headers");
        }
        if verbosity.log_bodies() {
            if let Some(payload) = payload {
                trace!(body = %payload.body, "Request body");
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;
        self.read_response(url, response).await
    }

    /// Send an idempotent GET, retrying transient failures.
    ///
    /// Once retries are exhausted a transient status is returned as a
    /// normal response; a transport failure is returned as the error.
    async fn get_with_retry(&self, url: &Url) -> ConnectorResult<RemoteResponse> {
        let retry = &self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = self.send(Method::GET, url, None).await;

            let retry_after = match &result {
                Ok(response) if ConnectorError::is_transient_status(response.status) => {
                    Some(format!("status {}", response.status))
                }
                Err(e) if e.is_transient() => Some(e.error_code().to_string()),
                _ => None,
            };
            let reason = match retry_after {
                Some(reason) if retry.allows_retry_after(attempt) => reason,
                _ => {
                    if let Err(e) = &result {
                        debug!(url = %url, code = e.error_code(), attempt, "Lookup failed");
                    }
                    return result;
                }
            };
            let wait = retry.backoff(attempt);

            warn!(
                url = %url,
                reason = %reason,
                attempt,
                wait_ms = wait.as_millis(),
                "Transient lookup failure, retrying with backoff"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Turn a non-2xx answer of a write call into an error.
    fn require_success(response: RemoteResponse) -> ConnectorResult<RemoteResponse> {
        if response.is_success() {
            Ok(response)
        } else {
            Err(ConnectorError::unexpected_status(
                response.status,
                response.body,
            ))
        }
    }
}

/// Base64 encode bytes to string.
fn base64_encode(data: impl AsRef<[u8]>) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    STANDARD.encode(data)
}

#[async_trait]
impl Connector for RestConnector {
    fn display_name(&self) -> &str {
        &self.display_name
    }
}

#[async_trait]
impl LookupOp for RestConnector {
    #[instrument(skip(self, endpoint), fields(path = %endpoint.path))]
    async fn lookup(
        &self,
        endpoint: &EndpointTemplate,
        identifier: &str,
    ) -> ConnectorResult<RemoteResponse> {
        let url = self.config.lookup_url(endpoint, identifier)?;
        self.get_with_retry(&url).await
    }
}

#[async_trait]
impl CreateOp for RestConnector {
    #[instrument(skip(self, endpoint, payload), fields(path = %endpoint.path))]
    async fn create(
        &self,
        endpoint: &EndpointTemplate,
        payload: &Payload,
    ) -> ConnectorResult<RemoteResponse> {
        let url = self.config.create_url(endpoint)?;
        let response = Self::require_success(self.send(Method::POST, &url, Some(payload)).await?)?;
        info!(url = %url, status = response.status, "Entity created");
        Ok(response)
    }
}

#[async_trait]
impl UpdateOp for RestConnector {
    #[instrument(skip(self, endpoint, payload), fields(path = %endpoint.path))]
    async fn update(
        &self,
        endpoint: &EndpointTemplate,
        payload: &Payload,
    ) -> ConnectorResult<RemoteResponse> {
        let url = self.config.update_url(endpoint)?;
        let response = Self::require_success(self.send(Method::POST, &url, Some(payload)).await?)?;
        info!(url = %url, status = response.status, "Entity updated");
        Ok(response)
    }
}

#[async_trait]
impl ActivateOp for RestConnector {
    #[instrument(skip(self, endpoint, payload), fields(path = %endpoint.path))]
    async fn activate(
        &self,
        endpoint: &EndpointTemplate,
        identifier: &str,
        payload: Option<&Payload>,
    ) -> ConnectorResult<RemoteResponse> {
        let url = self.config.activate_url(endpoint, identifier)?;
        let response = Self::require_success(self.send(Method::POST, &url, payload).await?)?;
        info!(url = %url, status = response.status, "Entity activated");
        Ok(response)
    }
}

#[async_trait]
impl SubmitOp for RestConnector {
    #[instrument(skip(self, endpoint, payload), fields(path = %endpoint.path))]
    async fn submit(
        &self,
        endpoint: &EndpointTemplate,
        payload: &Payload,
    ) -> ConnectorResult<RemoteResponse> {
        let url = self.config.submit_url(endpoint)?;
        let response = Self::require_success(self.send(Method::POST, &url, Some(payload)).await?)?;
        info!(url = %url, status = response.status, "Document submitted");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_connector_new() {
        let config = RestConfig::new("https://erp.example.com/api").with_basic_auth("svc", "pw");

        let connector = RestConnector::new(config);
        assert!(connector.is_ok());

        let connector = connector.unwrap();
        assert!(connector.display_name().contains("erp.example.com"));
    }

    #[test]
    fn test_rest_connector_invalid_config() {
        let connector = RestConnector::new(RestConfig::new(""));
        assert!(connector.is_err());
    }

    #[test]
    fn test_basic_auth_header() {
        let config = RestConfig::new("https://erp.example.com").with_basic_auth("user", "pass");
        let connector = RestConnector::new(config).unwrap();
        assert_eq!(
            connector.auth_header().as_deref(),
            Some("Basic dXNlcjpwYXNz")
        );
    }

    #[test]
    fn test_no_auth_header() {
        let connector = RestConnector::new(RestConfig::new("https://erp.example.com")).unwrap();
        assert!(connector.auth_header().is_none());
    }

    #[test]
    fn test_require_success() {
        assert!(RestConnector::require_success(RemoteResponse::new(201, "")).is_ok());

        let err = RestConnector::require_success(RemoteResponse::new(400, "bad")).unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.body(), Some("bad"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = RestConfig::new("https://erp.example.com").with_basic_auth("svc", "hunter2");
        let connector = RestConnector::new(config).unwrap();
        let debug = format!("{connector:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }
}
