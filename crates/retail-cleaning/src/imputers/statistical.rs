//! Mean and fixed-value imputation for decimal columns.

use crate::config::WeightImputation;
use crate::error::Result;
use polars::prelude::*;
use tracing::{debug, warn};

/// Result of imputing one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImputationOutcome {
    /// Number of missing values filled.
    pub filled: usize,
    /// Value used to fill, if any fill happened.
    pub value: Option<f64>,
}

impl ImputationOutcome {
    fn none() -> Self {
        Self { filled: 0, value: None }
    }
}

/// Statistical imputation for decimal columns.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill missing values in `col_name` according to `strategy`.
    ///
    /// `BatchMean` uses the mean of the non-missing values in this batch. If
    /// there are none, nothing is filled and a warning is logged.
    pub fn impute(
        df: &mut DataFrame,
        col_name: &str,
        strategy: WeightImputation,
    ) -> Result<ImputationOutcome> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();
        if missing == 0 {
            return Ok(ImputationOutcome::none());
        }

        let fill_value = match strategy {
            WeightImputation::Leave => return Ok(ImputationOutcome::none()),
            WeightImputation::Fixed(value) => value,
            WeightImputation::BatchMean => match series.mean() {
                Some(mean) => mean,
                None => {
                    warn!(
                        "'{}': no values to average, leaving {} missing",
                        col_name, missing
                    );
                    return Ok(ImputationOutcome::none());
                }
            },
        };

        let filled = Self::fill_with_value(df, col_name, fill_value, &series)?;
        debug!("'{}': filled {} values with {:.4}", col_name, filled, fill_value);

        Ok(ImputationOutcome {
            filled,
            value: Some(fill_value),
        })
    }

    /// Mean of the non-missing values, if there are any.
    pub fn batch_mean(series: &Series) -> Option<f64> {
        series.mean()
    }

    fn fill_with_value(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        series: &Series,
    ) -> Result<usize> {
        let values = series.f64()?;
        let mut filled = 0;
        let result: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| {
                v.or_else(|| {
                    filled += 1;
                    Some(fill_value)
                })
            })
            .collect();

        df.replace(col_name, Series::new(col_name.into(), result))?;
        Ok(filled)
    }
}
