//! Shared fixtures for unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use syncmark_connector::config::{AuthConfig, EndpointTemplate};
use syncmark_connector::error::{ConnectorError, ConnectorResult};
use syncmark_connector::traits::{
    ActivateOp, Connector, CreateOp, LookupOp, SubmitOp, UpdateOp,
};
use syncmark_connector::types::{Payload, RemoteResponse};

use crate::context::SyncContext;
use crate::entity::EntityCatalog;
use crate::mapping::RankRounding;
use crate::outcome::SyncStep;
use crate::settings::SyncSettings;

/// Context for a built-in entity type with `tester`/`secret` credentials.
pub(crate) fn context(entity: &str) -> SyncContext {
    let settings = SyncSettings {
        quote_rank_rounding: Some(RankRounding::Plain),
        ..SyncSettings::default()
    };
    let entity = EntityCatalog::standard(&settings).resolve(entity).unwrap();
    SyncContext::new("http://erp.test", AuthConfig::basic("tester", "secret"), entity)
}

/// In-memory target. Activated identifiers count as existing.
#[derive(Debug, Default)]
pub(crate) struct FakeTarget {
    marker: String,
    calls: Mutex<Vec<(SyncStep, Option<String>)>>,
    existing: Mutex<HashSet<String>>,
    failures: Mutex<HashMap<SyncStep, u16>>,
}

impl FakeTarget {
    pub(crate) fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn with_existing(self, identifier: &str) -> Self {
        self.existing.lock().unwrap().insert(identifier.to_string());
        self
    }

    /// Answer `step` with `status` from now on.
    pub(crate) fn fail(self, step: SyncStep, status: u16) -> Self {
        self.failures.lock().unwrap().insert(step, status);
        self
    }

    pub(crate) fn steps(&self) -> Vec<SyncStep> {
        self.calls.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }

    /// Body sent with each call (`None` for lookups and empty activations).
    pub(crate) fn bodies(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().iter().map(|(_, b)| b.clone()).collect()
    }

    fn call(&self, step: SyncStep, body: Option<&Payload>) -> ConnectorResult<RemoteResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((step, body.map(|p| p.body.clone())));
        match self.failures.lock().unwrap().get(&step) {
            Some(status) => Err(ConnectorError::unexpected_status(*status, "rejected")),
            None => Ok(RemoteResponse::new(200, "")),
        }
    }
}

impl Connector for FakeTarget {
    fn display_name(&self) -> &str {
        "fake"
    }
}

#[async_trait]
impl LookupOp for FakeTarget {
    async fn lookup(
        &self,
        _endpoint: &EndpointTemplate,
        identifier: &str,
    ) -> ConnectorResult<RemoteResponse> {
        self.calls.lock().unwrap().push((SyncStep::Probe, None));
        if let Some(status) = self.failures.lock().unwrap().get(&SyncStep::Probe) {
            return Ok(RemoteResponse::new(*status, "lookup failed"));
        }
        if self.existing.lock().unwrap().contains(identifier) {
            Ok(RemoteResponse::new(200, format!("{} {identifier}", self.marker)))
        } else {
            Ok(RemoteResponse::new(404, ""))
        }
    }
}

#[async_trait]
impl CreateOp for FakeTarget {
    async fn create(
        &self,
        _endpoint: &EndpointTemplate,
        payload: &Payload,
    ) -> ConnectorResult<RemoteResponse> {
        self.call(SyncStep::Create, Some(payload))
    }
}

#[async_trait]
impl UpdateOp for FakeTarget {
    async fn update(
        &self,
        _endpoint: &EndpointTemplate,
        payload: &Payload,
    ) -> ConnectorResult<RemoteResponse> {
        self.call(SyncStep::Update, Some(payload))
    }
}

#[async_trait]
impl ActivateOp for FakeTarget {
    async fn activate(
        &self,
        _endpoint: &EndpointTemplate,
        identifier: &str,
        payload: Option<&Payload>,
    ) -> ConnectorResult<RemoteResponse> {
        let response = self.call(SyncStep::Activate, payload)?;
        self.existing.lock().unwrap().insert(identifier.to_string());
        Ok(response)
    }
}

#[async_trait]
impl SubmitOp for FakeTarget {
    async fn submit(
        &self,
        _endpoint: &EndpointTemplate,
        payload: &Payload,
    ) -> ConnectorResult<RemoteResponse> {
        self.call(SyncStep::Submit, Some(payload))
    }
}
