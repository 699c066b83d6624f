//! Sales quote mapping.

use rust_decimal::Decimal;
use serde::Serialize;

use super::convert::{parse_decimal, RankRounding};
use super::{map_children, optional_date, EntityMapper, TargetDocument};
use crate::context::SyncContext;
use crate::error::MappingError;
use crate::record::SourceRecord;

/// Maps quotes; item ranks are derived with an explicit [`RankRounding`].
#[derive(Debug, Clone)]
pub struct QuoteMapper {
    rounding: RankRounding,
}

impl QuoteMapper {
    pub fn new(rounding: RankRounding) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RankRounding {
        self.rounding
    }

    fn item<'a>(&self, child: &'a SourceRecord) -> Result<QuoteItem<'a>, MappingError> {
        Ok(QuoteItem {
            rank: self.rounding.apply("Position", child.require("Position")?)?,
            product: child.require("Product")?,
            quantity: parse_decimal("Quantity", child.require("Quantity")?)?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QuoteDocument<'a> {
    quote: &'a str,
    customer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_to: Option<String>,
    items: Vec<QuoteItem<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QuoteItem<'a> {
    rank: u32,
    product: &'a str,
    quantity: Decimal,
}

impl EntityMapper for QuoteMapper {
    fn map(&self, record: &SourceRecord, _ctx: &SyncContext) -> Result<TargetDocument, MappingError> {
        let quote = record.require("QuoteID")?;
        let document = QuoteDocument {
            quote,
            customer: record.require("CustomerID")?,
            valid_to: optional_date(record, "ValidTo")?,
            items: map_children(record, "Item", |child| self.item(child))?,
        };
        TargetDocument::json(quote, &document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use serde_json::{json, Value};

    fn quote() -> SourceRecord {
        SourceRecord::new()
            .with_field("QuoteID", "Q-1")
            .with_field("CustomerID", "C-9")
            .with_field("ValidTo", "31.12.2024")
            .with_child(
                "Item",
                SourceRecord::new()
                    .with_field("Position", "10")
                    .with_field("Product", "P1")
                    .with_field("Quantity", "2"),
            )
            .with_child(
                "Item",
                SourceRecord::new()
                    .with_field("Position", "20.5")
                    .with_field("Product", "P2")
                    .with_field("Quantity", "1,5"),
            )
    }

    fn items(mapper: &QuoteMapper) -> Value {
        let doc = mapper.map(&quote(), &context("quote")).unwrap();
        let value: Value = serde_json::from_str(&doc.payload.body).unwrap();
        value["Items"].clone()
    }

    #[test]
    fn test_plain_rank() {
        assert_eq!(
            items(&QuoteMapper::new(RankRounding::Plain)),
            json!([
                {"Rank": 10, "Product": "P1", "Quantity": "2"},
                {"Rank": 21, "Product": "P2", "Quantity": "1.5"}
            ])
        );
    }

    #[test]
    fn test_decrement_rank() {
        let items = items(&QuoteMapper::new(RankRounding::Decrement));
        assert_eq!(items[0]["Rank"], 9);
        assert_eq!(items[1]["Rank"], 20);
    }

    #[test]
    fn test_header_fields() {
        let doc = QuoteMapper::new(RankRounding::Plain)
            .map(&quote(), &context("quote"))
            .unwrap();
        let value: Value = serde_json::from_str(&doc.payload.body).unwrap();
        assert_eq!(doc.identifier, "Q-1");
        assert_eq!(value["Customer"], "C-9");
        assert_eq!(value["ValidTo"], "2024-12-31");
    }

    #[test]
    fn test_item_without_product() {
        let record = SourceRecord::new()
            .with_field("QuoteID", "Q-1")
            .with_field("CustomerID", "C-9")
            .with_child(
                "Item",
                SourceRecord::new()
                    .with_field("Position", "10")
                    .with_field("Quantity", "1"),
            );
        let err = QuoteMapper::new(RankRounding::Plain)
            .map(&record, &context("quote"))
            .unwrap_err();
        assert_eq!(err, MappingError::missing("Product"));
    }
}
