//! Record eligibility rules.
//!
//! Every rule runs; the reasons of all failing rules are accumulated in
//! rule order. A record is eligible iff no reason was produced.

use serde::Serialize;

use crate::record::SourceRecord;

/// Reason text of [`ValidationRule::IdentifierThreshold`].
pub const IDENTIFIER_BELOW_THRESHOLD: &str = "identifier below threshold";

/// A single eligibility rule.
///
/// Format, threshold and exclusion rules only look at fields that are
/// present; absence is the business of [`ValidationRule::Required`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// Numeric part of the identifier must be at least `minimum`.
    IdentifierThreshold { field: String, minimum: u64 },
    /// Field must be present and non-blank.
    Required { field: String },
    /// Field must consist of ASCII digits only.
    NumericOnly { field: String },
    /// Field must not exceed `max` characters.
    MaxLength { field: String, max: usize },
    /// Field must not carry one of the excluded codes.
    ExcludeCodes { field: String, codes: Vec<String> },
}

impl ValidationRule {
    pub fn identifier_threshold(field: impl Into<String>, minimum: u64) -> Self {
        Self::IdentifierThreshold {
            field: field.into(),
            minimum,
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::Required {
            field: field.into(),
        }
    }

    pub fn numeric_only(field: impl Into<String>) -> Self {
        Self::NumericOnly {
            field: field.into(),
        }
    }

    pub fn max_length(field: impl Into<String>, max: usize) -> Self {
        Self::MaxLength {
            field: field.into(),
            max,
        }
    }

    pub fn exclude_codes<I, S>(field: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ExcludeCodes {
            field: field.into(),
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Evaluate the rule, returning the rejection reason if it fails.
    pub fn check(&self, record: &SourceRecord) -> Option<String> {
        match self {
            ValidationRule::IdentifierThreshold { field, minimum } => {
                let value = record.get(field)?;
                let digits: String = value.chars().filter(char::is_ascii_digit).collect();
                match digits.parse::<u64>() {
                    Ok(n) if n >= *minimum => None,
                    // Too many digits for u64 is far above any threshold
                    Err(_) if digits.len() > 19 => None,
                    _ => Some(IDENTIFIER_BELOW_THRESHOLD.to_string()),
                }
            }
            ValidationRule::Required { field } => match record.get(field) {
                Some(_) => None,
                None => Some(format!("missing required field '{field}'")),
            },
            ValidationRule::NumericOnly { field } => {
                let value = record.get(field)?;
                if value.chars().all(|c| c.is_ascii_digit()) {
                    None
                } else {
                    Some(format!("field '{field}' must be numeric"))
                }
            }
            ValidationRule::MaxLength { field, max } => {
                let value = record.get(field)?;
                if value.chars().count() <= *max {
                    None
                } else {
                    Some(format!("field '{field}' exceeds {max} characters"))
                }
            }
            ValidationRule::ExcludeCodes { field, codes } => {
                let value = record.get(field)?;
                if codes.iter().any(|code| code == value) {
                    Some(format!("excluded {field} '{value}'"))
                } else {
                    None
                }
            }
        }
    }
}

/// Result of screening one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    pub eligible: bool,
    pub reasons: Vec<String>,
}

impl ValidationVerdict {
    /// Build a verdict from accumulated reasons.
    #[must_use]
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            eligible: reasons.is_empty(),
            reasons,
        }
    }

    /// Reasons joined for reports.
    pub fn summary(&self) -> String {
        self.reasons.join("; ")
    }
}

/// Ordered set of rules for one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    rules: Vec<ValidationRule>,
}

impl Validator {
    #[must_use]
    pub fn new(rules: Vec<ValidationRule>) -> Self {
        Self { rules }
    }

    /// Add a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// Screen a record against all rules.
    pub fn validate(&self, record: &SourceRecord) -> ValidationVerdict {
        let reasons = self
            .rules
            .iter()
            .filter_map(|rule| rule.check(record))
            .collect();
        ValidationVerdict::from_reasons(reasons)
    }
}
