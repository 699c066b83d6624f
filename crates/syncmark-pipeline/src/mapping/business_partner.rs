//! Business partner mapping.
//!
//! `Category` discriminates natural persons (`1`) from organizations (`2`).

use serde::Serialize;

use super::{map_children, optional_date, EntityMapper, TargetDocument};
use crate::context::SyncContext;
use crate::error::MappingError;
use crate::record::SourceRecord;

#[derive(Debug, Clone, Default)]
pub struct BusinessPartnerMapper;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BusinessPartnerDocument<'a> {
    #[serde(rename = "BusinessPartner")]
    id: &'a str,
    category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    person: Option<PersonData<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    organization: Option<OrganizationData<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_term: Option<&'a str>,
    roles: Vec<RoleData<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PersonData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<&'a str>,
    last_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    birth_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OrganizationData<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RoleData<'a> {
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_from: Option<String>,
}

fn role(child: &SourceRecord) -> Result<RoleData<'_>, MappingError> {
    Ok(RoleData {
        role: child.require("RoleCode")?,
        valid_from: optional_date(child, "ValidFrom")?,
    })
}

impl EntityMapper for BusinessPartnerMapper {
    fn map(&self, record: &SourceRecord, _ctx: &SyncContext) -> Result<TargetDocument, MappingError> {
        let id = record.require("BusinessPartnerID")?;
        let category = record.require("Category")?;

        let (category, person, organization) = match category {
            "1" => (
                "Person",
                Some(PersonData {
                    first_name: record.get("FirstName"),
                    last_name: record.require("LastName")?,
                    birth_date: optional_date(record, "BirthDate")?,
                }),
                None,
            ),
            "2" => (
                "Organization",
                None,
                Some(OrganizationData {
                    name: record.require("OrganizationName")?,
                }),
            ),
            other => {
                return Err(MappingError::invalid(
                    "Category",
                    other,
                    "unknown partner category",
                ))
            }
        };

        let document = BusinessPartnerDocument {
            id,
            category,
            person,
            organization,
            search_term: record.get("SearchTerm"),
            roles: map_children(record, "Roles", role)?,
        };
        TargetDocument::json(id, &document)
    }
}
