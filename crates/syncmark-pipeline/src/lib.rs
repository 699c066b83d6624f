//! # Synchronize-and-Mark Pipeline
//!
//! Per-record synchronization of business entities into a target system.
//!
//! This crate provides:
//! - Batch parsing (JSON, CSV, XML) into source records
//! - Eligibility rules with accumulated rejection reasons
//! - Typed mapping strategies per entity type
//! - SHA-1 integrity marks for regulatory submissions
//! - Existence probing and the create/update/activate state machine
//! - Bounded, order-preserving batch orchestration with fail-fast
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐
//! │ InboundBatch │────►│ BatchOrchestrator  │
//! └──────────────┘     └─────────┬──────────┘
//!                                │ one task per record
//!                                ▼
//!   ┌───────────┐   ┌────────┐   ┌──────────────┐   ┌───────┐   ┌────────────┐
//!   │ Validator │──►│ Mapper │──►│ DigestMarker │──►│ Probe │──►│ SyncClient │
//!   └───────────┘   └────────┘   └──────────────┘   └───────┘   └────────────┘
//!                        │              │                              │
//!                        └──────────────┴──► DiagnosticsSink ◄─────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use syncmark_pipeline::{BatchOrchestrator, InboundBatch, RecordPipeline, SyncSettings};
//!
//! let settings = SyncSettings::from_env()?;
//! let ctx = Arc::new(settings.build_context()?);
//! let pipeline = RecordPipeline::new(Arc::new(connector));
//! let batch = InboundBatch::from_json(&input)?;
//!
//! let result = BatchOrchestrator::new(pipeline)
//!     .run(batch, ctx, &settings.policy())
//!     .await;
//! ```

pub mod batch;
pub mod client;
pub mod context;
pub mod digest;
pub mod entity;
pub mod error;
pub mod mapping;
pub mod orchestrator;
pub mod outcome;
pub mod pipeline;
pub mod probe;
pub mod record;
pub mod result;
pub mod settings;
pub mod sink;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{BatchFormat, InboundBatch};
pub use client::{SyncClient, SyncReport};
pub use context::SyncContext;
pub use digest::{DigestMarker, HexCase, IntegrityMark};
pub use entity::{EntityCatalog, EntityTypeConfig, SyncFlow};
pub use error::{
    BatchParseError, DiagnosticsError, DigestError, MappingError, PersistenceError, RecordError,
    TransportError,
};
pub use mapping::{EntityMapper, RankRounding, TargetDocument};
pub use orchestrator::{BatchOrchestrator, BatchPolicy};
pub use outcome::{
    ErrorDetail, ExistenceClassification, FinalState, StepStatus, SyncOutcome, SyncStep,
};
pub use pipeline::RecordPipeline;
pub use probe::{ExistenceProbe, ProbeFailureMode, ProbeResult};
pub use record::SourceRecord;
pub use result::{BatchResult, BatchSummary, Rejection, SkippedRecord};
pub use settings::{ConfigError, SyncSettings};
pub use sink::{
    DiagnosticEntry, DiagnosticsSink, DirectoryDiagnostics, DirectoryStore, MemoryDiagnostics,
    MemoryStore, PersistenceSink, TracingDiagnostics,
};
pub use validator::{ValidationRule, ValidationVerdict, Validator};
