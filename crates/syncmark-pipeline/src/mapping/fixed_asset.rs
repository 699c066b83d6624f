//! Fixed asset mapping (XML payload).

use super::convert::parse_decimal;
use super::xml::XmlBuilder;
use super::{optional_date, EntityMapper, TargetDocument};
use crate::context::SyncContext;
use crate::error::MappingError;
use crate::record::SourceRecord;

#[derive(Debug, Clone, Default)]
pub struct FixedAssetMapper;

impl EntityMapper for FixedAssetMapper {
    fn map(&self, record: &SourceRecord, _ctx: &SyncContext) -> Result<TargetDocument, MappingError> {
        let asset_id = record.require("AssetID")?;
        let capitalization_date = optional_date(record, "CapitalizationDate")?;

        let mut valuations = Vec::new();
        for child in record.children("Valuation") {
            let area = child.require("Area")?;
            let amount = parse_decimal("Amount", child.require("Amount")?)?;
            valuations.push((area, amount.to_string()));
        }

        let mut xml = XmlBuilder::new();
        xml.open("FixedAsset")
            .leaf("AssetID", asset_id)
            .leaf("CompanyCode", record.require("CompanyCode")?)
            .leaf_opt("AssetClass", record.get("AssetClass"))
            .leaf_opt("Description", record.get("Description"))
            .leaf_opt("CapitalizationDate", capitalization_date.as_deref())
            .open("Valuations");
        for (area, amount) in &valuations {
            xml.open("Valuation")
                .leaf("Area", area)
                .leaf("Amount", amount)
                .close();
        }

        Ok(TargetDocument::xml(asset_id, xml.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use syncmark_connector::types::ContentType;

    #[test]
    fn test_fixed_asset() {
        let record = SourceRecord::new()
            .with_field("AssetID", "100042")
            .with_field("CompanyCode", "1000")
            .with_field("Description", "Forklift & trailer")
            .with_field("CapitalizationDate", "20240115")
            .with_child(
                "Valuation",
                SourceRecord::new()
                    .with_field("Area", "01")
                    .with_field("Amount", "12500,50"),
            );

        let doc = FixedAssetMapper.map(&record, &context("fixed-asset")).unwrap();
        assert_eq!(doc.identifier, "100042");
        assert_eq!(doc.payload.content_type, ContentType::Xml);
        assert_eq!(
            doc.payload.body,
            "<FixedAsset><AssetID>100042</AssetID><CompanyCode>1000</CompanyCode>\
             <Description>Forklift &amp; trailer</Description>\
             <CapitalizationDate>2024-01-15</CapitalizationDate>\
             <Valuations><Valuation><Area>01</Area><Amount>12500.5</Amount></Valuation>\
             </Valuations></FixedAsset>"
        );
    }

    #[test]
    fn test_valuation_without_amount() {
        let record = SourceRecord::new()
            .with_field("AssetID", "100042")
            .with_field("CompanyCode", "1000")
            .with_child("Valuation", SourceRecord::new().with_field("Area", "01"));
        let err = FixedAssetMapper
            .map(&record, &context("fixed-asset"))
            .unwrap_err();
        assert_eq!(err, MappingError::missing("Amount"));
    }
}
