//! Closed-set validation for categorical columns.
//!
//! Upstream feeds carry a small number of corrupt rows whose categorical
//! fields hold random tokens. Those rows are discarded wholesale: a row is
//! kept only if its value is an exact, case-sensitive member of the column's
//! allow-list.

use crate::error::Result;
use crate::schema::LexicalCorrection;
use crate::utils::{keep_mask, text_values};
use polars::prelude::*;
use tracing::debug;

/// Filters rows by categorical allow-lists and applies lexical corrections.
pub struct CategoryValidator;

impl CategoryValidator {
    /// Whether `value` is a member of `allow_list`. Null is never a member.
    pub fn is_allowed(value: Option<&str>, allow_list: &[&str]) -> bool {
        value.is_some_and(|v| allow_list.contains(&v))
    }

    /// Keep only rows whose `column` value is on the allow-list.
    ///
    /// Returns the kept rows and the number of rows rejected.
    pub fn filter(df: &DataFrame, column: &str, allow_list: &[&str]) -> Result<(DataFrame, usize)> {
        let keep: Vec<bool> = text_values(df, column)?
            .iter()
            .map(|v| Self::is_allowed(v.as_deref(), allow_list))
            .collect();

        let rejected = keep.iter().filter(|k| !**k).count();
        if rejected == 0 {
            return Ok((df.clone(), 0));
        }

        debug!("'{}': rejected {} rows outside the allow-list", column, rejected);
        Ok((df.filter(&keep_mask(&keep))?, rejected))
    }

    /// Rewrite known misspellings to their canonical form.
    ///
    /// Matching is on the whole (trimmed) value. Corrections naming a column
    /// that is absent are skipped. Returns the frame and the number of values
    /// rewritten.
    pub fn apply_corrections(
        mut df: DataFrame,
        corrections: &[LexicalCorrection],
    ) -> Result<(DataFrame, usize)> {
        let mut total = 0;

        for column in unique_columns(corrections) {
            if df.column(column).is_err() {
                continue;
            }

            let mut corrected = 0;
            let values: Vec<Option<String>> = text_values(&df, column)?
                .into_iter()
                .map(|value| {
                    value.map(|v| {
                        match corrections
                            .iter()
                            .find(|c| c.column == column && c.from == v.trim())
                        {
                            Some(c) => {
                                corrected += 1;
                                c.to.to_string()
                            }
                            None => v,
                        }
                    })
                })
                .collect();

            if corrected > 0 {
                debug!("'{}': corrected {} values", column, corrected);
                df.replace(column, Series::new(column.into(), values))?;
                total += corrected;
            }
        }

        Ok((df, total))
    }
}

fn unique_columns(corrections: &[LexicalCorrection]) -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = Vec::new();
    for correction in corrections {
        if !columns.contains(&correction.column) {
            columns.push(correction.column);
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORE_TYPES: &[&str] = &["Local", "Mall Kiosk", "Super Store", "Outlet", "Web Portal"];

    #[test]
    fn test_membership_is_exact() {
        assert!(CategoryValidator::is_allowed(Some("Local"), STORE_TYPES));
        assert!(!CategoryValidator::is_allowed(Some("local"), STORE_TYPES));
        assert!(!CategoryValidator::is_allowed(Some("Local "), STORE_TYPES));
        assert!(!CategoryValidator::is_allowed(None, STORE_TYPES));
    }

    #[test]
    fn test_filter_drops_nulls_and_unknown_tokens() {
        let df = df! {
            "store_type" => &[Some("Local"), Some("QP74AHEQT0"), None, Some("Outlet")],
        }
        .unwrap();

        let (kept, rejected) = CategoryValidator::filter(&df, "store_type", STORE_TYPES).unwrap();
        assert_eq!(rejected, 2);
        assert_eq!(
            text_values(&kept, "store_type").unwrap(),
            vec![Some("Local".to_string()), Some("Outlet".to_string())]
        );
    }

    #[test]
    fn test_filter_missing_column_is_error() {
        let df = df! { "other" => &["x"] }.unwrap();
        assert!(CategoryValidator::filter(&df, "store_type", STORE_TYPES).is_err());
    }

    #[test]
    fn test_corrections_rescue_misspelled_tokens() {
        const FIXES: &[LexicalCorrection] = &[
            LexicalCorrection { column: "continent", from: "eeEurope", to: "Europe" },
            LexicalCorrection { column: "continent", from: "eeAmerica", to: "America" },
            LexicalCorrection { column: "absent", from: "a", to: "b" },
        ];
        let df = df! {
            "continent" => &[Some("eeEurope"), Some("Europe"), None, Some("eeAmerica")],
        }
        .unwrap();

        let (df, corrected) = CategoryValidator::apply_corrections(df, FIXES).unwrap();
        assert_eq!(corrected, 2);
        assert_eq!(
            text_values(&df, "continent").unwrap(),
            vec![
                Some("Europe".to_string()),
                Some("Europe".to_string()),
                None,
                Some("America".to_string()),
            ]
        );
    }
}
