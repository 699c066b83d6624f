//! Write calls against the target system.
//!
//! Upsert state machine:
//!
//! ```text
//! New      -> create -> activate -> Active
//! Existing -> update -> activate -> Active
//! ```
//!
//! Any failed step is terminal. Activation is never skipped after a
//! successful write and never attempted after a failed one. Nothing is
//! retried here.

use std::sync::Arc;
use syncmark_connector::config::{ActivationBody, EndpointTemplate};
use syncmark_connector::error::ConnectorResult;
use syncmark_connector::traits::SyncTarget;
use syncmark_connector::types::RemoteResponse;
use tracing::{info, instrument};

use crate::error::TransportError;
use crate::mapping::TargetDocument;
use crate::outcome::{ExistenceClassification, StepStatus, SyncStep};

/// Steps performed so far plus the error that stopped the sequence, if any.
#[derive(Debug)]
pub struct SyncReport {
    pub steps: Vec<StepStatus>,
    pub error: Option<TransportError>,
}

impl SyncReport {
    fn new() -> Self {
        Self {
            steps: Vec::new(),
            error: None,
        }
    }

    /// Record the result of one call; returns whether the sequence goes on.
    fn record(&mut self, step: SyncStep, result: ConnectorResult<RemoteResponse>) -> bool {
        match result {
            Ok(response) => {
                self.steps.push(StepStatus::new(step, Some(response.status)));
                true
            }
            Err(e) => {
                let error = TransportError::from_connector(step, e);
                self.steps.push(StepStatus::new(step, error.status));
                self.error = Some(error);
                false
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Performs create, update, activate and submit calls.
#[derive(Clone)]
pub struct SyncClient {
    target: Arc<dyn SyncTarget>,
}

impl SyncClient {
    pub fn new(target: Arc<dyn SyncTarget>) -> Self {
        Self { target }
    }

    /// Write the document according to its classification, then activate.
    #[instrument(skip(self, endpoint, document), fields(id = %document.identifier))]
    pub async fn upsert(
        &self,
        endpoint: &EndpointTemplate,
        classification: ExistenceClassification,
        document: &TargetDocument,
    ) -> SyncReport {
        let mut report = SyncReport::new();

        let written = match classification {
            ExistenceClassification::New => {
                let result = self.target.create(endpoint, &document.payload).await;
                report.record(SyncStep::Create, result)
            }
            ExistenceClassification::Existing => {
                let result = self.target.update(endpoint, &document.payload).await;
                report.record(SyncStep::Update, result)
            }
        };
        if !written {
            return report;
        }

        let body = match endpoint.activation_body {
            ActivationBody::Empty => None,
            ActivationBody::Document => Some(&document.payload),
        };
        let result = self
            .target
            .activate(endpoint, &document.identifier, body)
            .await;
        if report.record(SyncStep::Activate, result) {
            info!(classification = %classification, "Entity activated");
        }
        report
    }

    /// Single submission call, no probe and no activation.
    #[instrument(skip(self, endpoint, document), fields(id = %document.identifier))]
    pub async fn submit(
        &self,
        endpoint: &EndpointTemplate,
        document: &TargetDocument,
    ) -> SyncReport {
        let mut report = SyncReport::new();
        let result = self.target.submit(endpoint, &document.payload).await;
        if report.record(SyncStep::Submit, result) {
            info!("Document submitted");
        }
        report
    }
}
