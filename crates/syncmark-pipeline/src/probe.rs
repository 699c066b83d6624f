//! Existence probe.
//!
//! Classifies a record as new or existing with one lookup call keyed by the
//! natural identifier.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use syncmark_connector::traits::SyncTarget;
use syncmark_connector::types::RemoteResponse;
use tracing::{debug, instrument, warn};

use crate::context::SyncContext;
use crate::error::TransportError;
use crate::outcome::{ExistenceClassification, StepStatus, SyncStep};

/// What to do with a lookup answer that is neither 2xx nor 404.
///
/// A failed transport (no HTTP answer at all) is always an error,
/// whatever the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeFailureMode {
    /// Fail the record with a transport error.
    #[default]
    Fail,
    /// Log a warning and treat the entity as new.
    AssumeNew,
}

impl ProbeFailureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeFailureMode::Fail => "fail",
            ProbeFailureMode::AssumeNew => "assume_new",
        }
    }
}

impl fmt::Display for ProbeFailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProbeFailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fail" => Ok(ProbeFailureMode::Fail),
            "assume_new" | "new" => Ok(ProbeFailureMode::AssumeNew),
            _ => Err(format!(
                "invalid probe failure mode '{s}', expected one of: fail, assume_new"
            )),
        }
    }
}

/// Result of a probe: the classification plus the observed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub classification: ExistenceClassification,
    pub step: StepStatus,
}

/// Runs lookups against the target and classifies the answer.
#[derive(Clone)]
pub struct ExistenceProbe {
    target: Arc<dyn SyncTarget>,
}

impl ExistenceProbe {
    pub fn new(target: Arc<dyn SyncTarget>) -> Self {
        Self { target }
    }

    /// Classify an HTTP answer of the lookup.
    pub fn classify(
        response: &RemoteResponse,
        marker: &str,
        mode: ProbeFailureMode,
    ) -> Result<ExistenceClassification, TransportError> {
        if response.is_not_found() {
            return Ok(ExistenceClassification::New);
        }
        if response.is_success() {
            if !response.is_blank() && response.body.contains(marker) {
                return Ok(ExistenceClassification::Existing);
            }
            return Ok(ExistenceClassification::New);
        }

        match mode {
            ProbeFailureMode::Fail => Err(TransportError::unexpected_status(
                SyncStep::Probe,
                response.status,
                response.body.clone(),
            )),
            ProbeFailureMode::AssumeNew => {
                warn!(
                    status = response.status,
                    "Lookup answered with an unexpected status, assuming the entity is new"
                );
                Ok(ExistenceClassification::New)
            }
        }
    }

    /// Look the identifier up and classify it.
    ///
    /// On failure the returned error carries the probe step so the caller
    /// can record it.
    #[instrument(skip(self, ctx), fields(entity = %ctx.entity.name))]
    pub async fn probe(
        &self,
        identifier: &str,
        ctx: &SyncContext,
    ) -> Result<ProbeResult, TransportError> {
        let entity = &ctx.entity;
        let response = self
            .target
            .lookup(&entity.endpoint, identifier)
            .await
            .map_err(|e| TransportError::from_connector(SyncStep::Probe, e))?;

        let classification = Self::classify(&response, &entity.marker, entity.probe_failure)?;
        debug!(
            status = response.status,
            classification = %classification,
            "Existence probe finished"
        );

        Ok(ProbeResult {
            classification,
            step: StepStatus::new(SyncStep::Probe, Some(response.status)),
        })
    }
}
