//! Schema mapping: source record to typed target document.
//!
//! One [`EntityMapper`] per entity type. Mappers are pure: they never call
//! the remote system and never touch sinks.

pub mod absence;
pub mod business_partner;
pub mod convert;
pub mod fixed_asset;
pub mod product;
pub mod quote;
pub mod tax_filing;
mod xml;

pub use absence::AbsenceMapper;
pub use business_partner::BusinessPartnerMapper;
pub use convert::RankRounding;
pub use fixed_asset::FixedAssetMapper;
pub use product::ProductMapper;
pub use quote::QuoteMapper;
pub use tax_filing::TaxFilingMapper;

use serde::Serialize;
use std::fmt::Debug;
use syncmark_connector::types::Payload;

use crate::context::SyncContext;
use crate::error::MappingError;
use crate::record::SourceRecord;

/// Mapped document ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDocument {
    /// Natural identifier used in lookup and activation URLs.
    pub identifier: String,
    pub payload: Payload,
}

impl TargetDocument {
    /// Serialize a typed document as JSON.
    pub fn json<T: Serialize>(
        identifier: impl Into<String>,
        document: &T,
    ) -> Result<Self, MappingError> {
        Ok(Self {
            identifier: identifier.into(),
            payload: Payload::json(serde_json::to_string(document)?),
        })
    }

    pub fn xml(identifier: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            payload: Payload::xml(body),
        }
    }
}

/// Mapping strategy of one entity type.
pub trait EntityMapper: Send + Sync + Debug {
    /// Map a validated record.
    ///
    /// Fails with [`MappingError`] when a field the target needs is absent
    /// or cannot be converted.
    fn map(&self, record: &SourceRecord, ctx: &SyncContext) -> Result<TargetDocument, MappingError>;
}

/// Map every child of `list` with `f`, failing on the first error.
pub(crate) fn map_children<'a, T, F>(
    record: &'a SourceRecord,
    list: &str,
    f: F,
) -> Result<Vec<T>, MappingError>
where
    F: Fn(&'a SourceRecord) -> Result<T, MappingError>,
{
    record.children(list).iter().map(f).collect()
}

/// Normalize an optional date field.
pub(crate) fn optional_date(record: &SourceRecord, field: &str) -> Result<Option<String>, MappingError> {
    record
        .get(field)
        .map(|value| convert::normalize_date(field, value))
        .transpose()
}
