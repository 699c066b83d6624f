//! Employee absence mapping.
//!
//! `Action = "D"` marks a deletion, which only needs the keys.

use serde::Serialize;

use super::convert::{left_pad, normalize_date};
use super::{optional_date, EntityMapper, TargetDocument};
use crate::context::SyncContext;
use crate::error::MappingError;
use crate::record::SourceRecord;

/// Width of the target's personnel number.
pub const EMPLOYEE_ID_WIDTH: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct AbsenceMapper;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct AbsenceDocument<'a> {
    absence: &'a str,
    #[serde(rename = "EmployeeID")]
    employee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    absence_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
    deleted: bool,
}

impl EntityMapper for AbsenceMapper {
    fn map(&self, record: &SourceRecord, _ctx: &SyncContext) -> Result<TargetDocument, MappingError> {
        let absence = record.require("AbsenceID")?;
        let employee_id = left_pad(record.require("EmployeeID")?, EMPLOYEE_ID_WIDTH, '0');
        let deleted = record
            .get("Action")
            .is_some_and(|action| action.eq_ignore_ascii_case("D"));

        let document = if deleted {
            AbsenceDocument {
                absence,
                employee_id,
                absence_type: None,
                start_date: optional_date(record, "StartDate")?,
                end_date: optional_date(record, "EndDate")?,
                deleted,
            }
        } else {
            let start_date = normalize_date("StartDate", record.require("StartDate")?)?;
            let end_date = optional_date(record, "EndDate")?.unwrap_or_else(|| start_date.clone());
            if end_date < start_date {
                return Err(MappingError::invalid(
                    "EndDate",
                    end_date,
                    "absence ends before it starts",
                ));
            }
            AbsenceDocument {
                absence,
                employee_id,
                absence_type: Some(record.require("AbsenceType")?),
                start_date: Some(start_date),
                end_date: Some(end_date),
                deleted,
            }
        };
        TargetDocument::json(absence, &document)
    }
}
