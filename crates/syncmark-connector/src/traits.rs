//! Connector capability traits
//!
//! Each remote call the pipeline needs is its own capability, so a test
//! double or an alternative transport only implements what it supports.

use async_trait::async_trait;

use crate::config::EndpointTemplate;
use crate::error::ConnectorResult;
use crate::types::{Payload, RemoteResponse};

/// Base trait for all connectors.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Get the display name for this connector instance.
    fn display_name(&self) -> &str;
}

/// Capability for reading the remote representation of an entity.
#[async_trait]
pub trait LookupOp: Connector {
    /// Fetch the entity keyed by its natural identifier.
    ///
    /// Returns `Ok` for every HTTP answer, including 4xx and 5xx, so the
    /// caller can classify the status itself. Only failures that produced no
    /// HTTP response at all are returned as errors.
    async fn lookup(
        &self,
        endpoint: &EndpointTemplate,
        identifier: &str,
    ) -> ConnectorResult<RemoteResponse>;
}

/// Capability for creating entities in the target system.
#[async_trait]
pub trait CreateOp: Connector {
    /// `POST {path}/{create_segment}` with the payload.
    ///
    /// Non-2xx answers are returned as `ConnectorError::UnexpectedStatus`.
    async fn create(
        &self,
        endpoint: &EndpointTemplate,
        payload: &Payload,
    ) -> ConnectorResult<RemoteResponse>;
}

/// Capability for updating entities in the target system.
#[async_trait]
pub trait UpdateOp: Connector {
    /// `POST {path}/{update_segment}` with the payload.
    ///
    /// Non-2xx answers are returned as `ConnectorError::UnexpectedStatus`.
    async fn update(
        &self,
        endpoint: &EndpointTemplate,
        payload: &Payload,
    ) -> ConnectorResult<RemoteResponse>;
}

/// Capability for activating a created or updated entity.
#[async_trait]
pub trait ActivateOp: Connector {
    /// `POST {path}/{identifier}/{activate_segment}`, with or without a body.
    ///
    /// Non-2xx answers are returned as `ConnectorError::UnexpectedStatus`.
    async fn activate(
        &self,
        endpoint: &EndpointTemplate,
        identifier: &str,
        payload: Option<&Payload>,
    ) -> ConnectorResult<RemoteResponse>;
}

/// Capability for single-shot document submission.
#[async_trait]
pub trait SubmitOp: Connector {
    /// `POST {path}` with the payload. Only the status is meaningful.
    ///
    /// Non-2xx answers are returned as `ConnectorError::UnexpectedStatus`.
    async fn submit(
        &self,
        endpoint: &EndpointTemplate,
        payload: &Payload,
    ) -> ConnectorResult<RemoteResponse>;
}

/// A connector bundle with every capability the pipeline uses.
pub trait SyncTarget:
    Connector + LookupOp + CreateOp + UpdateOp + ActivateOp + SubmitOp + Send + Sync
{
}

impl<T> SyncTarget for T where
    T: Connector + LookupOp + CreateOp + UpdateOp + ActivateOp + SubmitOp + Send + Sync
{
}
