//! Per-record pipeline.
//!
//! validate -> map -> (mark) -> (persist) -> probe -> write -> activate
//!
//! Cancellation is checked before persisting and again before the write.
//!
//! Every error is caught here and turned into a failed [`SyncOutcome`];
//! nothing propagates to sibling records.

use std::sync::Arc;
use syncmark_connector::traits::SyncTarget;
use syncmark_connector::types::Payload;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{SyncClient, SyncReport};
use crate::context::SyncContext;
use crate::digest::IntegrityMark;
use crate::entity::SyncFlow;
use crate::error::RecordError;
use crate::mapping::TargetDocument;
use crate::outcome::{ErrorDetail, ExistenceClassification, StepStatus, SyncOutcome};
use crate::probe::ExistenceProbe;
use crate::record::SourceRecord;
use crate::sink::{DiagnosticsSink, PersistenceSink, TracingDiagnostics};

/// State accumulated while a record moves through the stages.
#[derive(Debug, Default)]
struct RecordRun {
    classification: Option<ExistenceClassification>,
    steps: Vec<StepStatus>,
    mark: Option<IntegrityMark>,
    /// Last payload produced, attached to diagnostics on failure.
    payload: Option<Payload>,
}

impl RecordRun {
    fn absorb(&mut self, report: SyncReport) -> Result<(), RecordError> {
        self.steps.extend(report.steps);
        match report.error {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

/// Runs single records against one target.
#[derive(Clone)]
pub struct RecordPipeline {
    probe: ExistenceProbe,
    client: SyncClient,
    diagnostics: Arc<dyn DiagnosticsSink>,
    persistence: Option<Arc<dyn PersistenceSink>>,
}

impl RecordPipeline {
    /// Pipeline logging diagnostics through `tracing` and without a store.
    pub fn new(target: Arc<dyn SyncTarget>) -> Self {
        Self {
            probe: ExistenceProbe::new(Arc::clone(&target)),
            client: SyncClient::new(target),
            diagnostics: Arc::new(TracingDiagnostics),
            persistence: None,
        }
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[must_use]
    pub fn with_persistence(mut self, persistence: Arc<dyn PersistenceSink>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Process one record.
    pub async fn process(
        &self,
        index: usize,
        record: &SourceRecord,
        ctx: &SyncContext,
    ) -> SyncOutcome {
        self.process_cancellable(index, record, ctx, &CancellationToken::new())
            .await
    }

    /// Process one record, giving up before the next remote call once
    /// `cancel` fires.
    #[instrument(skip(self, record, ctx, cancel), fields(entity = %ctx.entity.name))]
    pub async fn process_cancellable(
        &self,
        index: usize,
        record: &SourceRecord,
        ctx: &SyncContext,
        cancel: &CancellationToken,
    ) -> SyncOutcome {
        let entity = &ctx.entity;
        let record_id = record.get(&entity.id_field).map(str::to_string);

        let verdict = entity.validator.validate(record);
        if !verdict.eligible {
            debug!(
                record_id = record_id.as_deref().unwrap_or(""),
                reasons = %verdict.summary(),
                "Record rejected"
            );
            return SyncOutcome::rejected(index, record_id, verdict);
        }

        let label = format!("{index}-{}", record_id.as_deref().unwrap_or("unknown"));
        let source = record.to_json().to_string();
        self.checkpoint(&format!("{label}-source"), source.as_bytes(), "application/json")
            .await;

        let mut run = RecordRun::default();
        let result = self.run(record, ctx, cancel, &label, &mut run).await;

        let outcome = match result {
            Ok(()) => {
                info!(record_id = record_id.as_deref().unwrap_or(""), "Record synchronized");
                SyncOutcome::succeeded(index, record_id)
            }
            Err(e) => {
                error!(
                    record_id = record_id.as_deref().unwrap_or(""),
                    kind = e.kind(),
                    error = %e,
                    "Record failed"
                );
                let (content, mime) = match &run.payload {
                    Some(payload) => (payload.as_bytes(), payload.content_type.mime()),
                    None => (source.as_bytes(), "application/json"),
                };
                self.checkpoint(&format!("{label}-error"), content, mime)
                    .await;
                SyncOutcome::failed(index, record_id, ErrorDetail::from(&e))
            }
        };

        outcome
            .with_classification(run.classification)
            .with_steps(run.steps)
            .with_integrity_mark(run.mark)
    }

    async fn run(
        &self,
        record: &SourceRecord,
        ctx: &SyncContext,
        cancel: &CancellationToken,
        label: &str,
        run: &mut RecordRun,
    ) -> Result<(), RecordError> {
        let entity = &ctx.entity;

        let mut document = entity.mapper.map(record, ctx)?;
        run.payload = Some(document.payload.clone());
        self.checkpoint_payload(&format!("{label}-mapped"), &document.payload)
            .await;

        if let Some(marker) = &entity.digest {
            let (payload, mark) = marker.mark_payload(&document.payload)?;
            debug!(digest = %mark.hex_digest, "Integrity mark inserted");
            run.payload = Some(payload.clone());
            run.mark = Some(mark);
            document.payload = payload;
            self.checkpoint_payload(&format!("{label}-marked"), &document.payload)
                .await;
        }

        if cancel.is_cancelled() {
            return Err(RecordError::Cancelled);
        }

        // Only documents that go on to a remote call are stored
        if let Some(store) = &entity.persistence_store {
            self.persist(store, &document).await;
        }

        match entity.flow {
            SyncFlow::Upsert => {
                let probed = match self.probe.probe(&document.identifier, ctx).await {
                    Ok(probed) => probed,
                    Err(e) => {
                        run.steps.push(StepStatus::new(e.step, e.status));
                        return Err(e.into());
                    }
                };
                run.steps.push(probed.step);
                run.classification = Some(probed.classification);

                if cancel.is_cancelled() {
                    return Err(RecordError::Cancelled);
                }
                let report = self
                    .client
                    .upsert(&entity.endpoint, probed.classification, &document)
                    .await;
                run.absorb(report)
            }
            SyncFlow::Submit => {
                let report = self.client.submit(&entity.endpoint, &document).await;
                run.absorb(report)
            }
        }
    }

    async fn persist(&self, store: &str, document: &TargetDocument) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(e) = persistence
            .put(store, &document.identifier, document.payload.as_bytes(), true)
            .await
        {
            warn!(store, key = %document.identifier, error = %e, "Failed to persist document");
        }
    }

    async fn checkpoint_payload(&self, name: &str, payload: &Payload) {
        self.checkpoint(name, payload.as_bytes(), payload.content_type.mime())
            .await;
    }

    async fn checkpoint(&self, name: &str, content: &[u8], mime: &str) {
        if let Err(e) = self.diagnostics.record(name, content, mime).await {
            warn!(name, error = %e, "Failed to record diagnostic");
        }
    }
}
