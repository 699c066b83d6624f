//! Batch results, summary counters and the CSV report.

use serde::Serialize;
use std::io::Write;

use crate::outcome::SyncOutcome;
use crate::validator::ValidationVerdict;

/// A record stopped by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub index: usize,
    pub record_id: Option<String>,
    pub verdict: ValidationVerdict,
}

/// An eligible record that was not processed because the batch aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub record_id: Option<String>,
}

/// Everything a batch run produced, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    /// Outcomes of records that entered the pipeline past validation.
    pub outcomes: Vec<SyncOutcome>,
    pub rejections: Vec<Rejection>,
    pub skipped: Vec<SkippedRecord>,
    /// Whether a record failure stopped the batch.
    pub aborted: bool,
}

/// Counters for the end-of-run log line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rejected: usize,
    pub skipped: usize,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome.
    pub fn add(&mut self, outcome: &SyncOutcome) {
        self.total += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.rejected == 0 && self.skipped == 0
    }
}

/// One report line.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    index: usize,
    record_id: &'a str,
    status: &'static str,
    classification: &'static str,
    steps: String,
    detail: String,
}

impl BatchResult {
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::new();
        for outcome in &self.outcomes {
            summary.add(outcome);
        }
        summary.rejected = self.rejections.len();
        summary.skipped = self.skipped.len();
        summary.total += summary.rejected + summary.skipped;
        summary
    }

    /// Outcome of the record at `index`, if it was processed.
    pub fn outcome(&self, index: usize) -> Option<&SyncOutcome> {
        self.outcomes.iter().find(|o| o.index == index)
    }

    fn rows(&self) -> Vec<ReportRow<'_>> {
        let mut rows: Vec<ReportRow<'_>> = Vec::with_capacity(
            self.outcomes.len() + self.rejections.len() + self.skipped.len(),
        );

        for outcome in &self.outcomes {
            rows.push(ReportRow {
                index: outcome.index,
                record_id: outcome.record_id.as_deref().unwrap_or(""),
                status: if outcome.is_success() {
                    "succeeded"
                } else {
                    "failed"
                },
                classification: outcome.classification.map_or("", |c| c.as_str()),
                steps: outcome.steps_summary(),
                detail: outcome
                    .error
                    .as_ref()
                    .map(|e| e.message.clone())
                    .unwrap_or_default(),
            });
        }
        for rejection in &self.rejections {
            rows.push(ReportRow {
                index: rejection.index,
                record_id: rejection.record_id.as_deref().unwrap_or(""),
                status: "rejected",
                classification: "",
                steps: String::new(),
                detail: rejection.verdict.summary(),
            });
        }
        for skipped in &self.skipped {
            rows.push(ReportRow {
                index: skipped.index,
                record_id: skipped.record_id.as_deref().unwrap_or(""),
                status: "skipped",
                classification: "",
                steps: String::new(),
                detail: "batch aborted".to_string(),
            });
        }

        rows.sort_by_key(|row| row.index);
        rows
    }

    /// Write one CSV row per input record, in input order.
    pub fn write_csv_report<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in self.rows() {
            csv.serialize(row)?;
        }
        csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{ErrorDetail, ExistenceClassification, StepStatus, SyncStep};

    fn result() -> BatchResult {
        BatchResult {
            outcomes: vec![
                SyncOutcome::succeeded(0, Some("BP1500".into()))
                    .with_classification(Some(ExistenceClassification::New))
                    .with_steps(vec![
                        StepStatus::new(SyncStep::Probe, Some(404)),
                        StepStatus::new(SyncStep::Create, Some(201)),
                        StepStatus::new(SyncStep::Activate, Some(200)),
                    ]),
                SyncOutcome::failed(
                    2,
                    Some("BP1700".into()),
                    ErrorDetail::new("transport", "update call failed: unexpected HTTP status 500"),
                ),
            ],
            rejections: vec![Rejection {
                index: 1,
                record_id: Some("BP0500".into()),
                verdict: ValidationVerdict::from_reasons(vec![
                    "identifier below threshold".into(),
                ]),
            }],
            skipped: vec![SkippedRecord {
                index: 3,
                record_id: Some("BP1800".into()),
            }],
            aborted: true,
        }
    }

    #[test]
    fn test_summary() {
        let summary = result().summary();
        assert_eq!(
            summary,
            BatchSummary {
                total: 4,
                succeeded: 1,
                failed: 1,
                rejected: 1,
                skipped: 1,
            }
        );
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn test_csv_report_in_input_order() {
        let mut out = Vec::new();
        result().write_csv_report(&mut out).unwrap();
        let report = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "index,record_id,status,classification,steps,detail");
        assert_eq!(lines[1], "0,BP1500,succeeded,new,probe:404;create:201;activate:200,");
        assert_eq!(lines[2], "1,BP0500,rejected,,,identifier below threshold");
        assert_eq!(
            lines[3],
            "2,BP1700,failed,,,update call failed: unexpected HTTP status 500"
        );
        assert_eq!(lines[4], "3,BP1800,skipped,,,batch aborted");
        assert_eq!(lines.len(), 5);
    }
}
