//! Per-column value coercion.
//!
//! Every raw value is text by the time it reaches the coercer. Each declared
//! column turns that text into its semantic type:
//!
//! - text is truncated to its maximum length
//! - integers go through the repair table and stray-marker stripping
//! - decimals strip currency symbols, unit-bearing decimals convert to kg
//! - dates and timestamps go through the temporal parser
//!
//! A value that cannot be coerced either becomes the missing marker (decimal
//! and temporal columns) or fails its row (text, integer, categorical).

use crate::error::Result;
use crate::normalizers::{TemporalNormalizer, UnitNormalizer};
use crate::schema::{ColumnSpec, SemanticType};
use crate::utils::{date_series, datetime_series, text_values, truncate_chars};
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

/// Whole numbers rendered as floats ("78.0"). No exponents, no letters.
static INTEGRAL_FLOAT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(\.0+)?$").expect("Invalid regex: integral float"));

/// A successfully coerced value.
#[derive(Debug, Clone, PartialEq)]
pub enum CoercedValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
}

/// Outcome of coercing one raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Value(CoercedValue),
    Missing,
}

impl Coerced {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl From<Option<CoercedValue>> for Coerced {
    fn from(value: Option<CoercedValue>) -> Self {
        value.map_or(Self::Missing, Self::Value)
    }
}

/// A coerced column plus the per-row outcomes the cleaner needs for counting.
#[derive(Debug)]
pub struct CoercedColumn {
    pub series: Series,
    /// Rows where a gating column could not be coerced.
    pub failed: Vec<bool>,
    /// Rows where a present raw value became the missing marker.
    pub coerced_to_missing: Vec<bool>,
}

/// Coerces raw text into declared semantic types.
pub struct FieldCoercer;

impl FieldCoercer {
    /// Coerce a single raw value. Null input is always `Missing`.
    pub fn coerce(raw: Option<&str>, spec: &ColumnSpec) -> Coerced {
        let Some(raw) = raw else {
            return Coerced::Missing;
        };

        let value = match spec.semantic_type {
            SemanticType::Text => Some(CoercedValue::Text(Self::coerce_text(raw, spec))),
            SemanticType::Categorical => Some(CoercedValue::Text(raw.to_string())),
            SemanticType::Integer => Self::coerce_integer(raw, spec).map(CoercedValue::Integer),
            SemanticType::Decimal => Self::coerce_decimal(raw, spec).map(CoercedValue::Decimal),
            SemanticType::Date => TemporalNormalizer::parse_date(raw).map(CoercedValue::Date),
            SemanticType::Datetime => {
                TemporalNormalizer::parse_datetime(raw).map(CoercedValue::Datetime)
            }
        };
        value.into()
    }

    /// Strip configured characters, then truncate to the column's limit.
    pub fn coerce_text(raw: &str, spec: &ColumnSpec) -> String {
        let stripped = strip_chars(raw, spec.strip_chars);
        match spec.max_len {
            Some(max_len) => truncate_chars(&stripped, max_len),
            None => stripped,
        }
    }

    /// Repair, strip, parse and bound-check an integer.
    pub fn coerce_integer(raw: &str, spec: &ColumnSpec) -> Option<i64> {
        let token = raw.trim();
        let repaired = spec
            .repairs
            .iter()
            .find(|(from, _)| *from == token)
            .map_or(token, |(_, to)| *to);
        let cleaned = strip_chars(repaired, spec.strip_chars);

        let value = cleaned
            .parse::<i64>()
            .ok()
            .or_else(|| integral_float(&cleaned))?;

        match spec.bounds {
            Some((min, max)) if !(min..=max).contains(&value) => None,
            _ => Some(value),
        }
    }

    /// Parse a decimal, converting to kilograms for unit-bearing columns.
    pub fn coerce_decimal(raw: &str, spec: &ColumnSpec) -> Option<f64> {
        let cleaned = strip_chars(raw, spec.strip_chars);
        let value = if spec.unit_bearing {
            UnitNormalizer::normalize_weight(&cleaned)?
        } else {
            cleaned.parse::<f64>().ok()?
        };
        value.is_finite().then_some(value)
    }

    /// Coerce a whole source column of `df` into the column declared by `spec`.
    pub fn coerce_column(df: &DataFrame, spec: &ColumnSpec) -> Result<CoercedColumn> {
        let raw = text_values(df, spec.source)?;
        let outcomes: Vec<Coerced> = raw
            .iter()
            .map(|v| Self::coerce(v.as_deref(), spec))
            .collect();

        let gate = spec.is_row_gate();
        let failed = outcomes.iter().map(|c| gate && c.is_missing()).collect();
        let coerced_to_missing = raw
            .iter()
            .zip(&outcomes)
            .map(|(r, c)| !gate && r.is_some() && c.is_missing())
            .collect();

        Ok(CoercedColumn {
            series: build_series(spec, &outcomes)?,
            failed,
            coerced_to_missing,
        })
    }
}

fn strip_chars(raw: &str, chars: &[char]) -> String {
    if chars.is_empty() {
        return raw.trim().to_string();
    }
    raw.chars()
        .filter(|c| !chars.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Accept float renderings of whole numbers ("78.0") produced by upstream readers.
fn integral_float(value: &str) -> Option<i64> {
    if !INTEGRAL_FLOAT_PATTERN.is_match(value) {
        return None;
    }
    let parsed: f64 = value.parse().ok()?;
    (parsed.is_finite() && parsed.fract() == 0.0 && parsed.abs() < 9.0e15).then_some(parsed as i64)
}

fn build_series(spec: &ColumnSpec, outcomes: &[Coerced]) -> PolarsResult<Series> {
    let name = spec.name;
    match spec.semantic_type {
        SemanticType::Text | SemanticType::Categorical => {
            let values: Vec<Option<String>> = outcomes
                .iter()
                .map(|c| match c {
                    Coerced::Value(CoercedValue::Text(s)) => Some(s.clone()),
                    _ => None,
                })
                .collect();
            Ok(Series::new(name.into(), values))
        }
        SemanticType::Integer => {
            let values: Vec<Option<i64>> = outcomes
                .iter()
                .map(|c| match c {
                    Coerced::Value(CoercedValue::Integer(v)) => Some(*v),
                    _ => None,
                })
                .collect();
            Ok(Series::new(name.into(), values))
        }
        SemanticType::Decimal => {
            let values: Vec<Option<f64>> = outcomes
                .iter()
                .map(|c| match c {
                    Coerced::Value(CoercedValue::Decimal(v)) => Some(*v),
                    _ => None,
                })
                .collect();
            Ok(Series::new(name.into(), values))
        }
        SemanticType::Date => {
            let values: Vec<Option<NaiveDate>> = outcomes
                .iter()
                .map(|c| match c {
                    Coerced::Value(CoercedValue::Date(d)) => Some(*d),
                    _ => None,
                })
                .collect();
            date_series(name, &values)
        }
        SemanticType::Datetime => {
            let values: Vec<Option<NaiveDateTime>> = outcomes
                .iter()
                .map(|c| match c {
                    Coerced::Value(CoercedValue::Datetime(dt)) => Some(*dt),
                    _ => None,
                })
                .collect();
            datetime_series(name, &values)
        }
    }
}
