//! Product master mapping.

use rust_decimal::Decimal;
use serde::Serialize;

use super::convert::{pad_numeric, percent_to_decimal};
use super::{map_children, optional_date, EntityMapper, TargetDocument};
use crate::context::SyncContext;
use crate::error::MappingError;
use crate::record::SourceRecord;

/// Width of the target's material number.
pub const PRODUCT_ID_WIDTH: usize = 18;

#[derive(Debug, Clone, Default)]
pub struct ProductMapper;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ProductDocument<'a> {
    product: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    base_unit: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tax_rate: Option<Decimal>,
    plants: Vec<PlantData<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PlantData<'a> {
    plant: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_from: Option<String>,
}

fn plant(child: &SourceRecord) -> Result<PlantData<'_>, MappingError> {
    Ok(PlantData {
        plant: child.require("Plant")?,
        valid_from: optional_date(child, "ValidFrom")?,
    })
}

impl EntityMapper for ProductMapper {
    fn map(&self, record: &SourceRecord, _ctx: &SyncContext) -> Result<TargetDocument, MappingError> {
        let product = pad_numeric(record.require("ProductID")?, PRODUCT_ID_WIDTH);
        let tax_rate = record
            .get("TaxRate")
            .map(|value| percent_to_decimal("TaxRate", value))
            .transpose()?;

        let document = ProductDocument {
            product: product.clone(),
            description: record.get("Description"),
            base_unit: record.require("BaseUnit")?,
            tax_rate,
            plants: map_children(record, "Plants", plant)?,
        };
        TargetDocument::json(product, &document)
    }
}
