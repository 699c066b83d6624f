//! # Connector Framework
//!
//! Transport abstractions the synchronize-and-mark pipeline calls into.
//!
//! The pipeline never talks HTTP directly. It calls the capability traits
//! defined here, and a concrete connector (see `syncmark-connector-rest`)
//! maps them onto the wire.
//!
//! ## Architecture
//!
//! - [`Connector`] - Base trait all connectors implement
//! - [`LookupOp`] - Fetch the remote representation of an entity by its natural identifier
//! - [`CreateOp`], [`UpdateOp`] - Write operations selected by the existence check
//! - [`ActivateOp`] - Terminal state transition after create/update
//! - [`SubmitOp`] - Single-shot submission (tax filings)
//!
//! ## Example
//!
//! ```ignore
//! use syncmark_connector::prelude::*;
//!
//! let endpoint = EndpointTemplate::new("/BusinessPartner")
//!     .with_lookup_style(LookupStyle::Query);
//!
//! let response = connector.lookup(&endpoint, "BP1500").await?;
//! if response.is_success() && response.body.contains("<BusinessPartner>") {
//!     connector.update(&endpoint, &payload).await?;
//! } else {
//!     connector.create(&endpoint, &payload).await?;
//! }
//! connector.activate(&endpoint, "BP1500", None).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`types`] - Wire payloads and raw responses
//! - [`error`] - Error types with transient/permanent classification
//! - [`traits`] - Connector capability traits
//! - [`config`] - Authentication, timeouts and endpoint templates

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```
/// use syncmark_connector::prelude::*;
/// ```
pub mod prelude {
    // Types
    pub use crate::types::{ContentType, Payload, RemoteResponse};

    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult};

    // Traits
    pub use crate::traits::{
        ActivateOp, Connector, CreateOp, LookupOp, SubmitOp, SyncTarget, UpdateOp,
    };

    // Configuration
    pub use crate::config::{
        ActivationBody, AuthConfig, ConnectionSettings, ConnectorConfig, EndpointTemplate,
        LookupStyle,
    };
}

// Re-export async_trait for connector implementors
pub use async_trait::async_trait;
