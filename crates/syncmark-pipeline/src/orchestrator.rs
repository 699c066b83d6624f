//! Batch orchestration.
//!
//! Records run on a bounded pool of tasks. Results are slotted by input
//! index, so the [`BatchResult`] keeps input order whatever the completion
//! order was.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::batch::InboundBatch;
use crate::context::SyncContext;
use crate::outcome::{ErrorDetail, SyncOutcome};
use crate::pipeline::RecordPipeline;
use crate::record::SourceRecord;
use crate::result::{BatchResult, Rejection, SkippedRecord};

/// How a batch reacts to record failures and how wide it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// When false, the first failed record aborts the rest of the batch.
    /// Validation rejections never abort.
    pub continue_on_record_error: bool,
    /// Records processed at the same time. 1 runs the batch sequentially.
    pub max_concurrency: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            continue_on_record_error: true,
            max_concurrency: 1,
        }
    }
}

impl BatchPolicy {
    /// Sequential, aborting on the first failure.
    pub fn fail_fast() -> Self {
        Self {
            continue_on_record_error: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }
}

/// Runs a [`RecordPipeline`] over every record of a batch.
#[derive(Clone)]
pub struct BatchOrchestrator {
    pipeline: Arc<RecordPipeline>,
}

impl BatchOrchestrator {
    pub fn new(pipeline: RecordPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &RecordPipeline {
        &self.pipeline
    }

    /// Process the batch and aggregate the results in input order.
    #[instrument(skip_all, fields(entity = %ctx.entity.name, records = batch.len()))]
    pub async fn run(
        &self,
        batch: InboundBatch,
        ctx: Arc<SyncContext>,
        policy: &BatchPolicy,
    ) -> BatchResult {
        let total = batch.len();
        let cancel = CancellationToken::new();
        let semaphore = Arc::new(Semaphore::new(policy.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        let mut records = batch.into_records().into_iter().enumerate();
        let mut unstarted: Vec<(usize, SourceRecord)> = Vec::new();
        let mut started = 0;

        for (index, record) in records.by_ref() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit.filter(|_| !cancel.is_cancelled()) else {
                unstarted.push((index, record));
                break;
            };

            let pipeline = Arc::clone(&self.pipeline);
            let ctx = Arc::clone(&ctx);
            let cancel = cancel.clone();
            let continue_on_record_error = policy.continue_on_record_error;

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = pipeline
                    .process_cancellable(index, &record, &ctx, &cancel)
                    .await;
                let aborts = !outcome.is_success()
                    && !outcome.is_rejection()
                    && !outcome.is_cancelled();
                if aborts && !continue_on_record_error {
                    warn!(index, "Record failed, aborting remaining batch");
                    cancel.cancel();
                }
                (index, outcome)
            });
            started += 1;
        }
        unstarted.extend(records);

        let mut slots: Vec<Option<SyncOutcome>> = vec![None; started];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!(error = %e, "Record task failed"),
            }
        }

        let mut result = BatchResult {
            aborted: cancel.is_cancelled(),
            ..BatchResult::default()
        };

        for (index, slot) in slots.into_iter().enumerate() {
            let outcome = slot.unwrap_or_else(|| {
                SyncOutcome::failed(index, None, ErrorDetail::new("internal", "record task failed"))
            });
            if let Some(verdict) = outcome.verdict.clone() {
                result.rejections.push(Rejection {
                    index,
                    record_id: outcome.record_id,
                    verdict,
                });
            } else if outcome.is_cancelled() {
                result.skipped.push(SkippedRecord {
                    index,
                    record_id: outcome.record_id,
                });
            } else {
                result.outcomes.push(outcome);
            }
        }

        // Records never started are still screened so rejections are reported
        let entity = &ctx.entity;
        for (index, record) in unstarted {
            let record_id = record.get(&entity.id_field).map(str::to_string);
            let verdict = entity.validator.validate(&record);
            if verdict.eligible {
                result.skipped.push(SkippedRecord { index, record_id });
            } else {
                result.rejections.push(Rejection {
                    index,
                    record_id,
                    verdict,
                });
            }
        }

        let summary = result.summary();
        if result.aborted {
            error!(
                total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                rejected = summary.rejected,
                skipped = summary.skipped,
                "Batch aborted"
            );
        } else {
            info!(
                total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                rejected = summary.rejected,
                "Batch finished"
            );
        }
        result
    }
}
