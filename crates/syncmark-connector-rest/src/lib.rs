//! # REST Connector
//!
//! HTTP transport for the syncmark pipeline.
//!
//! Implements the capability traits of `syncmark-connector` against a target
//! system that follows the `{base}{path}/Create`, `{base}{path}/Update` and
//! `{base}{path}/{id}/Activate` conventions.
//!
//! ## Features
//!
//! - HTTP Basic authentication
//! - Query-string or path-segment existence lookups
//! - JSON or XML bodies per entity type
//! - Per-call connect and total timeouts
//! - Retry with exponential backoff for the idempotent lookup only
//! - Configurable request/response logging
//!
//! ## Example
//!
//! ```ignore
//! use syncmark_connector_rest::{RestConfig, RestConnector};
//! use syncmark_connector::prelude::*;
//!
//! let config = RestConfig::new("https://erp.example.com/api")
//!     .with_basic_auth("svc-sync", "secret");
//!
//! let connector = RestConnector::new(config)?;
//! let response = connector
//!     .lookup(&EndpointTemplate::new("/BusinessPartner"), "BP1500")
//!     .await?;
//! ```

pub mod config;
pub mod connector;
pub mod retry;

// Re-exports
pub use config::RestConfig;
pub use connector::RestConnector;
pub use retry::{LogVerbosity, RetryConfig};
