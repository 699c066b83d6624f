//! Per-record outcome types.

use serde::Serialize;
use std::fmt;

use crate::digest::IntegrityMark;
use crate::error::RecordError;
use crate::validator::ValidationVerdict;

/// Whether the target entity already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceClassification {
    New,
    Existing,
}

impl ExistenceClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExistenceClassification::New => "new",
            ExistenceClassification::Existing => "existing",
        }
    }
}

impl fmt::Display for ExistenceClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One remote call of the synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStep {
    Probe,
    Create,
    Update,
    Activate,
    Submit,
}

impl SyncStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStep::Probe => "probe",
            SyncStep::Create => "create",
            SyncStep::Update => "update",
            SyncStep::Activate => "activate",
            SyncStep::Submit => "submit",
        }
    }
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP status observed for one step, `None` when no response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub step: SyncStep,
    pub status: Option<u16>,
}

impl StepStatus {
    pub fn new(step: SyncStep, status: Option<u16>) -> Self {
        Self { step, status }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}:{}", self.step, status),
            None => write!(f, "{}:-", self.step),
        }
    }
}

/// Terminal state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalState {
    Succeeded,
    Failed,
}

/// Why a record failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    /// `mapping`, `digest`, `transport`, `cancelled` or `validation`.
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ErrorDetail {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            status: None,
            body: None,
        }
    }
}

impl From<&RecordError> for ErrorDetail {
    fn from(error: &RecordError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
            status: error.status(),
            body: error.body().map(str::to_string),
        }
    }
}

/// Result of running one record through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// Position of the record in the inbound batch.
    pub index: usize,
    /// Natural identifier, if it could be determined.
    pub record_id: Option<String>,
    pub classification: Option<ExistenceClassification>,
    /// Remote calls in the order they were made.
    pub steps: Vec<StepStatus>,
    pub final_state: FinalState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity_mark: Option<IntegrityMark>,
    /// Set when the record was rejected by the validator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<ValidationVerdict>,
}

impl SyncOutcome {
    /// Create a succeeded outcome with no steps yet.
    pub fn succeeded(index: usize, record_id: Option<String>) -> Self {
        Self {
            index,
            record_id,
            classification: None,
            steps: Vec::new(),
            final_state: FinalState::Succeeded,
            error: None,
            integrity_mark: None,
            verdict: None,
        }
    }

    /// Create a failed outcome.
    pub fn failed(index: usize, record_id: Option<String>, error: ErrorDetail) -> Self {
        Self {
            final_state: FinalState::Failed,
            error: Some(error),
            ..Self::succeeded(index, record_id)
        }
    }

    /// Failed outcome of an ineligible record.
    pub fn rejected(index: usize, record_id: Option<String>, verdict: ValidationVerdict) -> Self {
        let error = ErrorDetail::new("validation", verdict.summary());
        Self {
            verdict: Some(verdict),
            ..Self::failed(index, record_id, error)
        }
    }

    #[must_use]
    pub fn with_classification(mut self, classification: Option<ExistenceClassification>) -> Self {
        self.classification = classification;
        self
    }

    #[must_use]
    pub fn with_steps(mut self, steps: Vec<StepStatus>) -> Self {
        self.steps = steps;
        self
    }

    #[must_use]
    pub fn with_integrity_mark(mut self, mark: Option<IntegrityMark>) -> Self {
        self.integrity_mark = mark;
        self
    }

    pub fn is_success(&self) -> bool {
        self.final_state == FinalState::Succeeded
    }

    /// Whether the record was stopped by the validator.
    pub fn is_rejection(&self) -> bool {
        self.verdict.is_some()
    }

    /// Whether the record was cancelled by a batch abort.
    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(|e| e.kind == "cancelled")
    }

    /// Steps called, in order.
    pub fn step_names(&self) -> Vec<SyncStep> {
        self.steps.iter().map(|s| s.step).collect()
    }

    /// Steps joined for reports, e.g. `probe:200;create:201`.
    pub fn steps_summary(&self) -> String {
        self.steps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    #[test]
    fn test_steps_summary() {
        let outcome = SyncOutcome::succeeded(0, Some("BP1500".into())).with_steps(vec![
            StepStatus::new(SyncStep::Probe, Some(404)),
            StepStatus::new(SyncStep::Create, Some(201)),
            StepStatus::new(SyncStep::Activate, None),
        ]);
        assert_eq!(outcome.steps_summary(), "probe:404;create:201;activate:-");
        assert_eq!(
            outcome.step_names(),
            vec![SyncStep::Probe, SyncStep::Create, SyncStep::Activate]
        );
    }

    #[test]
    fn test_rejected_outcome() {
        let verdict = ValidationVerdict::from_reasons(vec!["identifier below threshold".into()]);
        let outcome = SyncOutcome::rejected(3, Some("BP0500".into()), verdict);

        assert!(!outcome.is_success());
        assert!(outcome.is_rejection());
        assert_eq!(outcome.error.as_ref().map(|e| e.kind.as_str()), Some("validation"));
    }

    #[test]
    fn test_error_detail_from_record_error() {
        let error: RecordError =
            TransportError::unexpected_status(SyncStep::Update, 500, "boom").into();
        let detail = ErrorDetail::from(&error);

        assert_eq!(detail.kind, "transport");
        assert_eq!(detail.status, Some(500));
        assert_eq!(detail.body.as_deref(), Some("boom"));
        assert_eq!(detail.message, "update call failed: unexpected HTTP status 500");
    }

    #[test]
    fn test_cancelled_flag() {
        let outcome = SyncOutcome::failed(1, None, ErrorDetail::from(&RecordError::Cancelled));
        assert!(outcome.is_cancelled());
        assert!(!outcome.is_rejection());
    }
}
