//! Self assessment tax filing mapping.
//!
//! Produces a GovTalk envelope whose `IRheader` is the insertion point of
//! the integrity mark. The mapper itself never adds the mark.

use super::convert::{normalize_date, parse_decimal};
use super::xml::XmlBuilder;
use super::{EntityMapper, TargetDocument};
use crate::context::SyncContext;
use crate::error::MappingError;
use crate::record::SourceRecord;

const ENVELOPE_NAMESPACE: &str = "http://www.govtalk.gov.uk/CM/envelope";
const SA100_NAMESPACE: &str = "http://www.govtalk.gov.uk/taxation/SA/SA100/1";
const MESSAGE_CLASS: &str = "HMRC-SA-SA100";

#[derive(Debug, Clone, Default)]
pub struct TaxFilingMapper;

/// Tax years end on 5 April of the given year.
fn period_end(value: &str) -> Result<String, MappingError> {
    if value.len() != 4 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(MappingError::invalid("TaxYear", value, "expected a four-digit year"));
    }
    normalize_date("TaxYear", &format!("{value}0405"))
}

impl EntityMapper for TaxFilingMapper {
    fn map(&self, record: &SourceRecord, ctx: &SyncContext) -> Result<TargetDocument, MappingError> {
        let utr = record.require("UTR")?;
        let tax_year = record.require("TaxYear")?;
        let period_end = period_end(tax_year)?;

        let mut incomes = Vec::new();
        for child in record.children("Income") {
            let kind = child.require("Type")?;
            let amount = parse_decimal("Amount", child.require("Amount")?)?;
            incomes.push((kind, amount.round_dp(2).to_string()));
        }

        let mut xml = XmlBuilder::new();
        xml.open_with("GovTalkMessage", &[("xmlns", ENVELOPE_NAMESPACE)])
            .leaf("EnvelopeVersion", "2.0")
            .open("Header")
            .open("MessageDetails")
            .leaf("Class", MESSAGE_CLASS)
            .leaf("Qualifier", "request")
            .leaf("Function", "submit")
            .close();
        if let Some(user) = ctx.user() {
            xml.open("SenderDetails")
                .open("IDAuthentication")
                .leaf("SenderID", user)
                .close()
                .close();
        }
        xml.close()
            .open("Body")
            .open_with("IRenvelope", &[("xmlns", SA100_NAMESPACE)])
            .open("IRheader")
            .open("Keys")
            .leaf_with("Key", &[("Type", "UTR")], utr)
            .close()
            .leaf("PeriodEnd", &period_end)
            .leaf("Sender", record.get("Sender").unwrap_or("Individual"))
            .close()
            .open("SA100")
            .leaf_opt("Forename", record.get("Forename"))
            .leaf_opt("Surname", record.get("Surname"));
        for (kind, amount) in &incomes {
            xml.open("Income")
                .leaf("Type", kind)
                .leaf("Amount", amount)
                .close();
        }

        Ok(TargetDocument::xml(format!("{utr}-{tax_year}"), xml.finish()))
    }
}
