//! Entity type configuration and the built-in catalog.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use syncmark_connector::config::{ActivationBody, EndpointTemplate, LookupStyle};
use syncmark_connector::types::ContentType;

use crate::digest::DigestMarker;
use crate::mapping::{
    AbsenceMapper, BusinessPartnerMapper, EntityMapper, FixedAssetMapper, ProductMapper,
    QuoteMapper, TaxFilingMapper,
};
use crate::probe::ProbeFailureMode;
use crate::settings::{ConfigError, SyncSettings};
use crate::validator::{ValidationRule, Validator};

/// How a mapped document reaches the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncFlow {
    /// Probe, then create or update, then activate.
    #[default]
    Upsert,
    /// One submission call, no probe.
    Submit,
}

/// Everything that distinguishes one entity type from another.
#[derive(Clone)]
pub struct EntityTypeConfig {
    pub name: String,
    /// Source field holding the natural identifier.
    pub id_field: String,
    pub validator: Validator,
    pub mapper: Arc<dyn EntityMapper>,
    pub endpoint: EndpointTemplate,
    /// Token whose presence in a lookup body means the entity exists.
    pub marker: String,
    /// Set for entity types that carry an integrity mark.
    pub digest: Option<DigestMarker>,
    pub flow: SyncFlow,
    pub probe_failure: ProbeFailureMode,
    /// Store that receives the final document before transmission.
    pub persistence_store: Option<String>,
    /// Record element name used when the batch is XML.
    pub xml_record_element: String,
}

impl EntityTypeConfig {
    pub fn new(
        name: impl Into<String>,
        id_field: impl Into<String>,
        mapper: Arc<dyn EntityMapper>,
        endpoint: EndpointTemplate,
        marker: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            xml_record_element: name.clone(),
            name,
            id_field: id_field.into(),
            validator: Validator::default(),
            mapper,
            endpoint,
            marker: marker.into(),
            digest: None,
            flow: SyncFlow::Upsert,
            probe_failure: ProbeFailureMode::default(),
            persistence_store: None,
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    #[must_use]
    pub fn with_digest(mut self, digest: DigestMarker) -> Self {
        self.digest = Some(digest);
        self
    }

    #[must_use]
    pub fn with_flow(mut self, flow: SyncFlow) -> Self {
        self.flow = flow;
        self
    }

    #[must_use]
    pub fn with_probe_failure(mut self, mode: ProbeFailureMode) -> Self {
        self.probe_failure = mode;
        self
    }

    #[must_use]
    pub fn with_persistence_store(mut self, store: impl Into<String>) -> Self {
        self.persistence_store = Some(store.into());
        self
    }

    #[must_use]
    pub fn with_xml_record_element(mut self, element: impl Into<String>) -> Self {
        self.xml_record_element = element.into();
        self
    }

    #[must_use]
    pub fn with_lookup_style(mut self, style: LookupStyle) -> Self {
        self.endpoint = self.endpoint.with_lookup_style(style);
        self
    }
}

impl fmt::Debug for EntityTypeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTypeConfig")
            .field("name", &self.name)
            .field("id_field", &self.id_field)
            .field("mapper", &self.mapper)
            .field("endpoint", &self.endpoint)
            .field("flow", &self.flow)
            .field("digest", &self.digest.is_some())
            .finish_non_exhaustive()
    }
}

/// Named entity type configurations.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entries: BTreeMap<String, EntityTypeConfig>,
}

impl EntityCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, config: EntityTypeConfig) {
        self.entries.insert(config.name.clone(), config);
    }

    pub fn get(&self, name: &str) -> Option<&EntityTypeConfig> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Clone the named entry or fail with the list of known names.
    pub fn resolve(&self, name: &str) -> Result<EntityTypeConfig, ConfigError> {
        self.get(name).cloned().ok_or_else(|| {
            let known = self.names().collect::<Vec<_>>().join(", ");
            ConfigError::UnknownEntityType(name.to_string(), known)
        })
    }

    /// The built-in entity types, tuned by the run settings.
    ///
    /// `quote` is only present when the settings choose a rank rounding.
    pub fn standard(settings: &SyncSettings) -> Self {
        let mut catalog = Self::new();

        catalog.insert(
            EntityTypeConfig::new(
                "business-partner",
                "BusinessPartnerID",
                Arc::new(BusinessPartnerMapper),
                EndpointTemplate::new("/BusinessPartner"),
                "\"BusinessPartner\"",
            )
            .with_validator(Validator::new(vec![
                ValidationRule::required("BusinessPartnerID"),
                ValidationRule::identifier_threshold("BusinessPartnerID", 1000),
                ValidationRule::max_length("BusinessPartnerID", 10),
                ValidationRule::required("Category"),
                ValidationRule::exclude_codes("Category", ["3"]),
            ]))
            .with_xml_record_element("BusinessPartner"),
        );

        catalog.insert(
            EntityTypeConfig::new(
                "product",
                "ProductID",
                Arc::new(ProductMapper),
                EndpointTemplate::new("/Product"),
                "\"Product\"",
            )
            .with_validator(Validator::new(vec![
                ValidationRule::required("ProductID"),
                ValidationRule::numeric_only("ProductID"),
                ValidationRule::max_length("ProductID", 18),
                ValidationRule::required("BaseUnit"),
            ]))
            .with_xml_record_element("Product"),
        );

        catalog.insert(
            EntityTypeConfig::new(
                "absence",
                "AbsenceID",
                Arc::new(AbsenceMapper),
                EndpointTemplate::new("/Absence").with_lookup_style(LookupStyle::Path),
                "\"Absence\"",
            )
            .with_validator(Validator::new(vec![
                ValidationRule::required("AbsenceID"),
                ValidationRule::required("EmployeeID"),
                ValidationRule::numeric_only("EmployeeID"),
                ValidationRule::max_length("EmployeeID", 8),
            ]))
            .with_xml_record_element("Absence"),
        );

        catalog.insert(
            EntityTypeConfig::new(
                "fixed-asset",
                "AssetID",
                Arc::new(FixedAssetMapper),
                EndpointTemplate::new("/FixedAsset")
                    .with_lookup_style(LookupStyle::Path)
                    .with_content_type(ContentType::Xml),
                "<FixedAsset",
            )
            .with_validator(Validator::new(vec![
                ValidationRule::required("AssetID"),
                ValidationRule::required("CompanyCode"),
                ValidationRule::max_length("CompanyCode", 4),
                ValidationRule::exclude_codes("AssetClass", ["LVA"]),
            ]))
            .with_xml_record_element("FixedAsset"),
        );

        if let Some(rounding) = settings.quote_rank_rounding {
            catalog.insert(
                EntityTypeConfig::new(
                    "quote",
                    "QuoteID",
                    Arc::new(QuoteMapper::new(rounding)),
                    EndpointTemplate::new("/Quote")
                        .with_activation_body(ActivationBody::Document),
                    "\"Quote\"",
                )
                .with_validator(Validator::new(vec![
                    ValidationRule::required("QuoteID"),
                    ValidationRule::required("CustomerID"),
                ]))
                .with_xml_record_element("Quote"),
            );
        }

        catalog.insert(
            EntityTypeConfig::new(
                "tax-filing",
                "UTR",
                Arc::new(TaxFilingMapper),
                EndpointTemplate::new("/submission").with_content_type(ContentType::Xml),
                "<GovTalkMessage",
            )
            .with_validator(Validator::new(vec![
                ValidationRule::required("UTR"),
                ValidationRule::numeric_only("UTR"),
                ValidationRule::max_length("UTR", 10),
                ValidationRule::required("TaxYear"),
            ]))
            .with_digest(DigestMarker::new().with_hex_case(settings.digest_hex_case))
            .with_flow(SyncFlow::Submit)
            .with_persistence_store("TaxFilings")
            .with_xml_record_element("TaxFiling"),
        );

        for entry in catalog.entries.values_mut() {
            entry.probe_failure = settings.probe_failure_mode;
            if let Some(style) = settings.lookup_style {
                entry.endpoint.lookup_style = style;
            }
        }
        catalog
    }
}
