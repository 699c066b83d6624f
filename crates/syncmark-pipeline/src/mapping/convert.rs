//! Field conversions shared by the entity mappers.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

use crate::error::MappingError;

/// Normalize a date to `YYYY-MM-DD`.
///
/// Accepts `YYYY-MM-DD`, `YYYYMMDD` and `DD.MM.YYYY`.
pub fn normalize_date(field: &str, value: &str) -> Result<String, MappingError> {
    let value = value.trim();
    let parsed = if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let dashed = format!("{}-{}-{}", &value[0..4], &value[4..6], &value[6..8]);
        NaiveDate::parse_from_str(&dashed, "%Y-%m-%d")
    } else if value.contains('.') {
        NaiveDate::parse_from_str(value, "%d.%m.%Y")
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
    };

    parsed
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|e| MappingError::invalid(field, value, format!("not a date: {e}")))
}

/// Parse a decimal that may use a comma as decimal separator.
pub fn parse_decimal(field: &str, value: &str) -> Result<Decimal, MappingError> {
    let cleaned = value.trim().replace(',', ".");
    Decimal::from_str(&cleaned)
        .map(|d| d.normalize())
        .map_err(|e| MappingError::invalid(field, value, format!("not a number: {e}")))
}

/// Convert a percentage string (`"19"`, `"19%"`, `"7,5 %"`) to a fraction.
pub fn percent_to_decimal(field: &str, value: &str) -> Result<Decimal, MappingError> {
    let stripped = value.trim().trim_end_matches('%').trim_end();
    let percent = parse_decimal(field, stripped)?;
    Ok((percent / Decimal::ONE_HUNDRED).normalize())
}

/// Left-pad a value with `fill` to `width` characters.
pub fn left_pad(value: &str, width: usize, fill: char) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let mut padded: String = std::iter::repeat(fill).take(width - len).collect();
    padded.push_str(value);
    padded
}

/// Pad a purely numeric identifier with zeros; leave other values alone.
pub fn pad_numeric(value: &str, width: usize) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        left_pad(value, width, '0')
    } else {
        value.to_string()
    }
}

/// How a quote item's rank is derived from its source position.
///
/// Source integrations disagree on whether the rounded position is used as
/// is or shifted down by one. There is no default; callers must pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankRounding {
    /// Round half away from zero.
    Plain,
    /// Round half away from zero, then subtract one (never below zero).
    Decrement,
}

impl RankRounding {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankRounding::Plain => "plain",
            RankRounding::Decrement => "decrement",
        }
    }

    /// Derive the rank from a numeric position string.
    pub fn apply(&self, field: &str, value: &str) -> Result<u32, MappingError> {
        let position = parse_decimal(field, value)?;
        let rounded = position
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .filter(|n| *n >= 0)
            .ok_or_else(|| MappingError::invalid(field, value, "rank must be non-negative"))?;

        let rank = match self {
            RankRounding::Plain => rounded,
            RankRounding::Decrement => (rounded - 1).max(0),
        };
        u32::try_from(rank).map_err(|_| MappingError::invalid(field, value, "rank out of range"))
    }
}

impl fmt::Display for RankRounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RankRounding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(RankRounding::Plain),
            "decrement" => Ok(RankRounding::Decrement),
            _ => Err(format!(
                "invalid rank rounding '{s}', expected one of: plain, decrement"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("d", "2024-03-01").unwrap(), "2024-03-01");
        assert_eq!(normalize_date("d", "20240301").unwrap(), "2024-03-01");
        assert_eq!(normalize_date("d", "01.03.2024").unwrap(), "2024-03-01");
        assert_eq!(normalize_date("d", " 2024-12-31 ").unwrap(), "2024-12-31");
    }

    #[test]
    fn test_normalize_date_rejects_garbage() {
        for value in ["2024-02-30", "20241301", "1.3.24x", "yesterday", ""] {
            let err = normalize_date("StartDate", value).unwrap_err();
            assert!(matches!(err, MappingError::InvalidValue { ref field, .. } if field == "StartDate"));
        }
    }

    #[test]
    fn test_percent_to_decimal() {
        assert_eq!(percent_to_decimal("t", "19").unwrap().to_string(), "0.19");
        assert_eq!(percent_to_decimal("t", "19%").unwrap().to_string(), "0.19");
        assert_eq!(percent_to_decimal("t", "7,5 %").unwrap().to_string(), "0.075");
        assert_eq!(percent_to_decimal("t", "19.00").unwrap().to_string(), "0.19");
        assert!(percent_to_decimal("t", "nineteen").is_err());
    }

    #[test]
    fn test_left_pad() {
        assert_eq!(left_pad("4711", 8, '0'), "00004711");
        assert_eq!(left_pad("123456789", 8, '0'), "123456789");
        assert_eq!(pad_numeric("4711", 18), "000000000000004711");
        assert_eq!(pad_numeric("MAT-1", 18), "MAT-1");
    }

    #[test]
    fn test_rank_rounding() {
        assert_eq!(RankRounding::Plain.apply("p", "10").unwrap(), 10);
        assert_eq!(RankRounding::Plain.apply("p", "2.5").unwrap(), 3);
        assert_eq!(RankRounding::Plain.apply("p", "2.4").unwrap(), 2);
        assert_eq!(RankRounding::Decrement.apply("p", "10").unwrap(), 9);
        assert_eq!(RankRounding::Decrement.apply("p", "2.5").unwrap(), 2);
        assert_eq!(RankRounding::Decrement.apply("p", "0").unwrap(), 0);
        assert!(RankRounding::Plain.apply("p", "-3").is_err());
    }

    #[test]
    fn test_rank_rounding_parse() {
        assert_eq!("Plain".parse::<RankRounding>().unwrap(), RankRounding::Plain);
        assert_eq!(
            "decrement".parse::<RankRounding>().unwrap(),
            RankRounding::Decrement
        );
        assert!("ceil".parse::<RankRounding>().is_err());
    }
}
