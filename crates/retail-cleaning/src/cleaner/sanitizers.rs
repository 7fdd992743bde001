//! Structural clean-up applied before any value is coerced.

use crate::error::Result;
use crate::schema::SentinelRow;
use crate::utils::{keep_mask, text_values};
use polars::prelude::*;
use tracing::debug;

/// Drop the named columns that are present. Absent names are ignored.
///
/// Returns the frame and the names actually removed.
pub(crate) fn drop_named_columns(df: DataFrame, names: &[&str]) -> (DataFrame, Vec<String>) {
    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|name| names.contains(&name.as_str()))
        .map(|name| name.to_string())
        .collect();

    if present.is_empty() {
        return (df, present);
    }

    let cols_ref: Vec<PlSmallStr> = present.iter().map(|s| s.as_str().into()).collect();
    debug!("Dropping columns {:?}", present);
    (df.drop_many(cols_ref), present)
}

/// Drop columns whose content is identical to an earlier column.
///
/// Columns named in `protected` are never dropped.
pub(crate) fn drop_duplicate_columns(df: DataFrame, protected: &[&str]) -> (DataFrame, Vec<String>) {
    let columns = df.get_columns();
    let mut duplicates = Vec::new();

    for (i, col) in columns.iter().enumerate() {
        let name = col.name().as_str();
        if protected.contains(&name) {
            continue;
        }
        let series = col.as_materialized_series();
        let is_duplicate = columns[..i]
            .iter()
            .any(|earlier| earlier.as_materialized_series().equals_missing(series));
        if is_duplicate {
            duplicates.push(name.to_string());
        }
    }

    if duplicates.is_empty() {
        return (df, duplicates);
    }

    debug!("Dropping duplicate columns {:?}", duplicates);
    let cols_ref: Vec<PlSmallStr> = duplicates.iter().map(|s| s.as_str().into()).collect();
    (df.drop_many(cols_ref), duplicates)
}

/// Remove rows that hold a null in any column.
pub(crate) fn drop_rows_with_nulls(df: DataFrame) -> Result<(DataFrame, usize)> {
    if df.width() == 0 || df.height() == 0 {
        return Ok((df, 0));
    }

    let mut keep = vec![true; df.height()];
    for col in df.get_columns() {
        let nulls = col.as_materialized_series().is_null();
        for (slot, is_null) in keep.iter_mut().zip(&nulls) {
            if is_null == Some(true) {
                *slot = false;
            }
        }
    }

    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return Ok((df, 0));
    }
    Ok((df.filter(&keep_mask(&keep))?, removed))
}

/// Remove rows whose sentinel column holds the sentinel value.
pub(crate) fn drop_sentinel_rows(df: DataFrame, sentinel: &SentinelRow) -> Result<(DataFrame, usize)> {
    let keep: Vec<bool> = text_values(&df, sentinel.column)?
        .iter()
        .map(|v| v.as_deref().map(str::trim) != Some(sentinel.value))
        .collect();

    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return Ok((df, 0));
    }
    Ok((df.filter(&keep_mask(&keep))?, removed))
}

/// Uppercase the named text columns in place.
pub(crate) fn uppercase_columns(mut df: DataFrame, names: &[&str]) -> Result<DataFrame> {
    for name in names {
        let values: Vec<Option<String>> = text_values(&df, name)?
            .into_iter()
            .map(|v| v.map(|s| s.to_uppercase()))
            .collect();
        df.replace(name, Series::new((*name).into(), values))?;
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_named_columns_ignores_absent() {
        let df = df! {
            "lat" => &["1"],
            "latitude" => &["2"],
        }
        .unwrap();

        let (df, dropped) = drop_named_columns(df, &["lat", "level_0"]);
        assert_eq!(dropped, vec!["lat".to_string()]);
        assert_eq!(df.width(), 1);
        assert!(df.column("latitude").is_ok());
    }

    #[test]
    fn test_drop_duplicate_columns_keeps_first() {
        let df = df! {
            "index" => &["0", "1"],
            "copy" => &["0", "1"],
            "other" => &["0", "2"],
        }
        .unwrap();

        let (df, dropped) = drop_duplicate_columns(df, &[]);
        assert_eq!(dropped, vec!["copy".to_string()]);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_drop_duplicate_columns_respects_protected() {
        let df = df! {
            "a" => &["x"],
            "b" => &["x"],
        }
        .unwrap();

        let (df, dropped) = drop_duplicate_columns(df, &["b"]);
        assert!(dropped.is_empty());
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_drop_rows_with_nulls() {
        let df = df! {
            "a" => &[Some("x"), None, Some("z")],
            "b" => &[Some("w"), None, None],
        }
        .unwrap();

        let (df, removed) = drop_rows_with_nulls(df).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_drop_sentinel_rows() {
        let df = df! {
            "index" => &["0", "1", "10"],
        }
        .unwrap();

        let sentinel = SentinelRow { column: "index", value: "0" };
        let (df, removed) = drop_sentinel_rows(df, &sentinel).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_uppercase_columns() {
        let df = df! {
            "product_code" => &[Some("r7-3126933h"), None],
        }
        .unwrap();

        let df = uppercase_columns(df, &["product_code"]).unwrap();
        assert_eq!(
            text_values(&df, "product_code").unwrap(),
            vec![Some("R7-3126933H".to_string()), None]
        );
    }
}
