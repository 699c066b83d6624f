//! Connector error types
//!
//! Error definitions with transient/permanent classification.

use thiserror::Error;

/// Error that can occur during connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Connection errors (usually transient)
    /// Failed to establish connection to target system.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection or read timed out.
    #[error("connection timeout after {timeout_ms} ms")]
    ConnectionTimeout { timeout_ms: u64 },

    /// Network error during communication.
    #[error("network error: {message}")]
    NetworkError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Remote errors
    /// Target system answered with a non-2xx status.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16, body: String },

    // Configuration errors (permanent)
    /// Connector configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Payload could not be encoded or decoded.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl ConnectorError {
    /// Check if this error is transient and the call could succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            ConnectorError::ConnectionFailed { .. }
            | ConnectorError::ConnectionTimeout { .. }
            | ConnectorError::NetworkError { .. } => true,
            ConnectorError::UnexpectedStatus { status, .. } => Self::is_transient_status(*status),
            _ => false,
        }
    }

    /// HTTP statuses that signal a temporary condition on the remote side.
    pub fn is_transient_status(status: u16) -> bool {
        matches!(status, 429 | 502 | 503 | 504)
    }

    /// Whether the request never produced an HTTP response.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            ConnectorError::ConnectionFailed { .. }
                | ConnectorError::ConnectionTimeout { .. }
                | ConnectorError::NetworkError { .. }
        )
    }

    /// HTTP status carried by the error, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConnectorError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body carried by the error, if the remote answered at all.
    pub fn body(&self) -> Option<&str> {
        match self {
            ConnectorError::UnexpectedStatus { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            ConnectorError::ConnectionTimeout { .. } => "CONNECTION_TIMEOUT",
            ConnectorError::NetworkError { .. } => "NETWORK_ERROR",
            ConnectorError::UnexpectedStatus { status: 401, .. } => "AUTH_FAILED",
            ConnectorError::UnexpectedStatus { status: 403, .. } => "AUTHORIZATION_FAILED",
            ConnectorError::UnexpectedStatus { status: 404, .. } => "OBJECT_NOT_FOUND",
            ConnectorError::UnexpectedStatus { status: 409, .. } => "OBJECT_EXISTS",
            ConnectorError::UnexpectedStatus { .. } => "UNEXPECTED_STATUS",
            ConnectorError::InvalidConfiguration { .. } => "INVALID_CONFIG",
            ConnectorError::Serialization { .. } => "SERIALIZATION_ERROR",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection failed error with source.
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        ConnectorError::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an unexpected status error.
    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        ConnectorError::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        ConnectorError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        let transient_errors = vec![
            ConnectorError::connection_failed("test"),
            ConnectorError::ConnectionTimeout { timeout_ms: 500 },
            ConnectorError::network("test"),
            ConnectorError::unexpected_status(503, "busy"),
            ConnectorError::unexpected_status(429, "slow down"),
        ];

        for err in transient_errors {
            assert!(
                err.is_transient(),
                "Expected {} to be transient",
                err.error_code()
            );
        }
    }

    #[test]
    fn test_permanent_errors() {
        let permanent_errors = vec![
            ConnectorError::unexpected_status(400, "bad request"),
            ConnectorError::unexpected_status(401, ""),
            ConnectorError::unexpected_status(409, "duplicate"),
            ConnectorError::invalid_configuration("no base url"),
            ConnectorError::Serialization {
                message: "test".to_string(),
            },
        ];

        for err in permanent_errors {
            assert!(
                !err.is_transient(),
                "Expected {} to be permanent",
                err.error_code()
            );
        }
    }

    #[test]
    fn test_transient_statuses() {
        for status in [429, 502, 503, 504] {
            assert!(ConnectorError::is_transient_status(status), "{status}");
        }
        for status in [400, 404, 409, 500, 501] {
            assert!(!ConnectorError::is_transient_status(status), "{status}");
        }
    }

    #[test]
    fn test_transport_failure_has_no_status() {
        let err = ConnectorError::ConnectionTimeout { timeout_ms: 100 };
        assert!(err.is_transport_failure());
        assert_eq!(err.status(), None);
        assert_eq!(err.body(), None);

        let err = ConnectorError::unexpected_status(500, "boom");
        assert!(!err.is_transport_failure());
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.body(), Some("boom"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ConnectorError::unexpected_status(401, "").error_code(),
            "AUTH_FAILED"
        );
        assert_eq!(
            ConnectorError::unexpected_status(404, "").error_code(),
            "OBJECT_NOT_FOUND"
        );
        assert_eq!(
            ConnectorError::unexpected_status(500, "").error_code(),
            "UNEXPECTED_STATUS"
        );
        assert_eq!(
            ConnectorError::connection_failed("test").error_code(),
            "CONNECTION_FAILED"
        );
    }

    #[test]
    fn test_error_display() {
        let err = ConnectorError::ConnectionTimeout { timeout_ms: 30000 };
        assert_eq!(err.to_string(), "connection timeout after 30000 ms");

        let err = ConnectorError::unexpected_status(502, "gateway");
        assert_eq!(err.to_string(), "unexpected HTTP status 502");
    }

    #[test]
    fn test_error_with_source() {
        let source_err = std::io::Error::new(std::io::ErrorKind::Other, "underlying error");
        let err = ConnectorError::connection_failed_with_source("failed", source_err);

        assert!(err.is_transient());
        if let ConnectorError::ConnectionFailed { source, .. } = &err {
            assert!(source.is_some());
        } else {
            panic!("Expected ConnectionFailed variant");
        }
    }
}
