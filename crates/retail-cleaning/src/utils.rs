//! Shared utilities for the cleaning pipeline.
//!
//! Helpers for reading raw batches as text, building typed polars columns
//! from chrono values, and shaping JSON row payloads into a `DataFrame`.

use crate::error::{CleaningError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashSet;

// =============================================================================
// Text Rendering
// =============================================================================

/// Cast every column to text. Nulls stay null.
///
/// Raw feeds arrive with whatever dtype the reader guessed; the cleaner works
/// from the textual form so that every value goes through the same parsers.
pub fn render_as_text(df: &DataFrame) -> PolarsResult<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|col| {
            if col.dtype() == &DataType::String {
                Ok(col.clone())
            } else {
                col.cast(&DataType::String)
            }
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    DataFrame::new(columns)
}

/// Text values of a column, one entry per row.
pub fn text_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series();
    let ca = series.str()?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Truncate to at most `max_len` characters (not bytes).
pub fn truncate_chars(value: &str, max_len: usize) -> String {
    match value.char_indices().nth(max_len) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// Build the row filter mask used with `DataFrame::filter`.
pub fn keep_mask(keep: &[bool]) -> BooleanChunked {
    BooleanChunked::from_slice("keep".into(), keep)
}

// =============================================================================
// Temporal Columns
// =============================================================================

/// Build a `Date` column from chrono dates.
pub fn date_series(name: &str, values: &[Option<NaiveDate>]) -> PolarsResult<Series> {
    let epoch = NaiveDate::default();
    let days: Vec<Option<i32>> = values
        .iter()
        .map(|v| v.map(|d| (d - epoch).num_days() as i32))
        .collect();
    Series::new(name.into(), days).cast(&DataType::Date)
}

/// Build a millisecond `Datetime` column from chrono timestamps.
pub fn datetime_series(name: &str, values: &[Option<NaiveDateTime>]) -> PolarsResult<Series> {
    let millis: Vec<Option<i64>> = values
        .iter()
        .map(|v| v.map(|dt| dt.and_utc().timestamp_millis()))
        .collect();
    Series::new(name.into(), millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

// =============================================================================
// JSON Ingestion
// =============================================================================

/// Build a text batch from a sequence of row maps.
///
/// Columns are the union of all keys, in first-seen order. A key absent from
/// a row, or holding JSON `null`, is a null cell.
pub fn frame_from_rows(rows: &[Map<String, Value>]) -> PolarsResult<DataFrame> {
    let mut seen = HashSet::new();
    let mut names: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                names.push(key.as_str());
            }
        }
    }

    let columns = names
        .iter()
        .map(|name| {
            let values: Vec<Option<String>> = rows
                .iter()
                .map(|row| row.get(*name).and_then(scalar_text))
                .collect();
            Series::new((*name).into(), values).into()
        })
        .collect::<Vec<Column>>();

    DataFrame::new(columns)
}

/// Build a text batch from a parsed JSON document.
///
/// Accepts either an array of row objects or a column-oriented object of the
/// form `{"column": {"0": value, "1": value}}`, which is how the date events
/// feed is published.
pub fn frame_from_json(document: &Value) -> Result<DataFrame> {
    match document {
        Value::Array(items) => {
            let rows = items
                .iter()
                .map(|item| match item {
                    Value::Object(map) => Ok(map.clone()),
                    other => Err(CleaningError::UnsupportedInput(format!(
                        "expected a row object, found {}",
                        json_kind(other)
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(frame_from_rows(&rows)?)
        }
        Value::Object(columns) if columns.values().all(Value::is_object) => {
            Ok(frame_from_columns(columns)?)
        }
        other => Err(CleaningError::UnsupportedInput(format!(
            "expected an array of rows or an object of columns, found {}",
            json_kind(other)
        ))),
    }
}

fn frame_from_columns(columns: &Map<String, Value>) -> PolarsResult<DataFrame> {
    let mut index: Vec<&str> = columns
        .values()
        .filter_map(Value::as_object)
        .flat_map(|cells| cells.keys().map(String::as_str))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    // Row keys are stringified integers; order them numerically.
    index.sort_by_key(|key| (key.parse::<u64>().ok(), key.to_string()));

    let series = columns
        .iter()
        .map(|(name, cells)| {
            let values: Vec<Option<String>> = index
                .iter()
                .map(|row| cells.get(*row).and_then(scalar_text))
                .collect();
            Series::new(name.as_str().into(), values).into()
        })
        .collect::<Vec<Column>>();

    DataFrame::new(series)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
