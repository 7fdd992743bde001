//! Schema-driven cleaning of one entity batch.
//!
//! [`EntityCleaner`] interprets an [`EntitySchema`] in a fixed stage order:
//!
//! 1. render raw columns to text and check required columns
//! 2. drop named and duplicate columns
//! 3. apply lexical corrections
//! 4. filter every categorical column against its allow-list
//! 5. drop null rows and sentinel rows
//! 6. coerce declared columns, compose timestamps, drop failed rows
//! 7. impute missing unit-bearing values
//! 8. uppercase identifiers and project the declared columns

mod category;
mod coercer;
mod sanitizers;

pub use category::CategoryValidator;
pub use coercer::{Coerced, CoercedColumn, CoercedValue, FieldCoercer};

use crate::config::CleaningConfig;
use crate::entities;
use crate::error::{CleaningError, Result};
use crate::imputers::StatisticalImputer;
use crate::normalizers::TemporalNormalizer;
use crate::pipeline::{CleaningStage, ProgressReporter, ProgressUpdate};
use crate::schema::{CompositeTimestamp, Entity, EntitySchema};
use crate::types::{ActionType, CleanedBatch, CleaningAction, CleaningManifest};
use crate::utils::{date_series, datetime_series, keep_mask, render_as_text, text_values};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Cleans raw batches of one entity.
#[derive(Debug, Clone)]
pub struct EntityCleaner {
    schema: EntitySchema,
}

impl EntityCleaner {
    /// Create a cleaner for a schema, validating the schema first.
    pub fn new(schema: EntitySchema) -> Result<Self> {
        schema.validate()?;
        Ok(Self { schema })
    }

    /// Create a cleaner for one of the six declared entities.
    pub fn for_entity(entity: Entity) -> Result<Self> {
        Self::new(entities::schema_for(entity))
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Clean `raw` without progress reporting.
    pub fn clean(&self, raw: &DataFrame, config: &CleaningConfig) -> Result<CleanedBatch> {
        self.clean_with_progress(raw, config, None)
    }

    /// Clean `raw`, reporting each stage to `reporter`.
    ///
    /// The raw batch is never modified. Row-level problems are recorded in the
    /// manifest; only a missing required column is an error.
    pub fn clean_with_progress(
        &self,
        raw: &DataFrame,
        config: &CleaningConfig,
        reporter: Option<&dyn ProgressReporter>,
    ) -> Result<CleanedBatch> {
        let start = Instant::now();
        let entity = self.schema.entity;
        let report = |stage: CleaningStage, message: String| {
            if let Some(reporter) = reporter {
                reporter.report(ProgressUpdate::new(entity, stage, message));
            }
        };

        info!("Cleaning {} batch ({} rows)", entity, raw.height());
        let mut manifest = CleaningManifest::new(entity, raw.height());

        // 1. Text rendering and required columns
        report(CleaningStage::Validating, "Checking required columns".to_string());
        let df = render_as_text(raw)?;
        self.check_required_columns(&df)?;

        // 2-3. Structural drops and lexical corrections
        report(CleaningStage::Structuring, "Dropping columns".to_string());
        let df = self.restructure(df, &mut manifest)?;

        // 4. Categorical allow-lists
        report(CleaningStage::CategoryFiltering, "Validating categories".to_string());
        let df = self.filter_categories(df, &mut manifest)?;

        // 5. Null and sentinel rows
        report(CleaningStage::RowFiltering, "Dropping null and sentinel rows".to_string());
        let df = self.drop_rows(df, &mut manifest)?;

        // 6. Coercion and composite timestamps
        report(CleaningStage::Coercion, "Coercing values".to_string());
        let mut df = self.coerce(df, &mut manifest)?;

        // 7. Imputation
        report(CleaningStage::Imputation, "Imputing missing weights".to_string());
        self.impute(&mut df, config, &mut manifest)?;

        // 8. Identifiers and projection
        report(CleaningStage::Finalizing, "Projecting declared columns".to_string());
        let df = self.finalize(df)?;

        manifest.rows_out = df.height();
        manifest.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Cleaned {}: {} rows in, {} rows out, {} rejected",
            entity,
            manifest.rows_in,
            manifest.rows_out,
            manifest.rows_rejected()
        );

        Ok(CleanedBatch { data: df, manifest })
    }

    fn check_required_columns(&self, df: &DataFrame) -> Result<()> {
        for column in self.schema.required_columns() {
            if df.column(column).is_err() {
                return Err(CleaningError::BatchMalformed {
                    entity: self.schema.entity,
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    fn restructure(&self, df: DataFrame, manifest: &mut CleaningManifest) -> Result<DataFrame> {
        let (df, dropped) = sanitizers::drop_named_columns(df, self.schema.drop_columns);
        for column in &dropped {
            manifest.add_action(CleaningAction::new(
                ActionType::ColumnRemoved,
                column,
                "Dropped non-informative column",
            ));
        }
        manifest.columns_dropped.extend(dropped);

        let df = if self.schema.drop_duplicate_columns {
            let required = self.schema.required_columns();
            let (df, duplicates) = sanitizers::drop_duplicate_columns(df, &required);
            for column in &duplicates {
                manifest.add_action(CleaningAction::new(
                    ActionType::ColumnRemoved,
                    column,
                    "Dropped column duplicating an earlier column",
                ));
            }
            manifest.columns_dropped.extend(duplicates);
            df
        } else {
            df
        };

        let (df, corrected) = CategoryValidator::apply_corrections(df, self.schema.corrections)?;
        if corrected > 0 {
            manifest.values_corrected = corrected;
            manifest.add_action(CleaningAction::new(
                ActionType::ValueCorrected,
                "batch",
                format!("Corrected {} misspelled values", corrected),
            ));
        }

        Ok(df)
    }

    fn filter_categories(&self, mut df: DataFrame, manifest: &mut CleaningManifest) -> Result<DataFrame> {
        for spec in self.schema.categorical_columns() {
            let Some(allow_list) = spec.allow_list else {
                continue;
            };
            let (kept, rejected) = CategoryValidator::filter(&df, spec.source, allow_list)?;
            df = kept;

            manifest.rows_rejected_by_category += rejected;
            manifest
                .category_rejections_by_column
                .insert(spec.name.to_string(), rejected);
            if rejected > 0 {
                manifest.add_action(CleaningAction::new(
                    ActionType::CategoryRejected,
                    spec.name,
                    format!("Rejected {} rows outside the allow-list", rejected),
                ));
            }
        }
        Ok(df)
    }

    fn drop_rows(&self, df: DataFrame, manifest: &mut CleaningManifest) -> Result<DataFrame> {
        let df = if self.schema.drop_null_rows {
            let (df, removed) = sanitizers::drop_rows_with_nulls(df)?;
            manifest.rows_dropped_null = removed;
            if removed > 0 {
                manifest.add_action(CleaningAction::new(
                    ActionType::RowsRemoved,
                    "batch",
                    format!("Dropped {} rows containing nulls", removed),
                ));
            }
            df
        } else {
            df
        };

        let df = match &self.schema.sentinel {
            Some(sentinel) => {
                let (df, removed) = sanitizers::drop_sentinel_rows(df, sentinel)?;
                manifest.rows_dropped_sentinel = removed;
                if removed > 0 {
                    manifest.add_action(CleaningAction::new(
                        ActionType::RowsRemoved,
                        sentinel.column,
                        format!("Dropped {} known-bad rows where {} = {}", removed, sentinel.column, sentinel.value),
                    ));
                }
                df
            }
            None => df,
        };

        Ok(df)
    }

    /// Replace every declared column with its coerced form, then drop the rows
    /// where a gating column failed.
    fn coerce(&self, df: DataFrame, manifest: &mut CleaningManifest) -> Result<DataFrame> {
        let height = df.height();
        let mut failed = vec![false; height];
        let mut coerced = Vec::with_capacity(self.schema.columns.len());
        let mut missing_by_column = Vec::new();

        for spec in self.schema.columns.iter().filter(|c| !c.derived) {
            let column = FieldCoercer::coerce_column(&df, spec)?;
            for (row, bad) in failed.iter_mut().zip(&column.failed) {
                *row |= *bad;
            }
            missing_by_column.push((spec.name, column.coerced_to_missing));
            coerced.push(column.series);
        }

        if let Some(composite) = &self.schema.composite {
            let (dates, datetimes) = compose_timestamps(&df, composite)?;
            missing_by_column.push((composite.date_column, dates.1));
            missing_by_column.push((composite.datetime_column, datetimes.1));
            coerced.push(dates.0);
            coerced.push(datetimes.0);
            manifest.add_action(CleaningAction::new(
                ActionType::TimestampComposed,
                composite.datetime_column,
                format!(
                    "Composed {} and {} from {}, {}, {} and {}",
                    composite.date_column,
                    composite.datetime_column,
                    composite.year,
                    composite.month,
                    composite.day,
                    composite.time
                ),
            ));
        }

        let mut df = df;
        for series in coerced {
            df.with_column(series)?;
        }

        let keep: Vec<bool> = failed.iter().map(|f| !f).collect();
        let failed_rows = height - keep.iter().filter(|k| **k).count();
        manifest.rows_failed_coercion = failed_rows;
        if failed_rows > 0 {
            debug!("{}: {} rows failed coercion", self.schema.entity, failed_rows);
            manifest.add_action(CleaningAction::new(
                ActionType::RowsRemoved,
                "batch",
                format!("Dropped {} rows with unparsable required values", failed_rows),
            ));
            df = df.filter(&keep_mask(&keep))?;
        }

        // Only rows that survive count towards coerced-to-missing.
        for (name, flags) in missing_by_column {
            let count = flags
                .iter()
                .zip(&keep)
                .filter(|(missing, kept)| **missing && **kept)
                .count();
            if count > 0 {
                manifest.values_coerced_to_missing += count;
                manifest.missing_by_column.insert(name.to_string(), count);
                manifest.add_action(CleaningAction::new(
                    ActionType::CoercedToMissing,
                    name,
                    format!("{} unparsable values marked missing", count),
                ));
            }
        }

        Ok(df)
    }

    fn impute(&self, df: &mut DataFrame, config: &CleaningConfig, manifest: &mut CleaningManifest) -> Result<()> {
        for spec in self.schema.columns.iter().filter(|c| c.unit_bearing) {
            let outcome = StatisticalImputer::impute(df, spec.name, config.weight_imputation)?;
            if outcome.filled > 0 {
                manifest.values_imputed += outcome.filled;
                manifest.imputed_value = outcome.value;
                manifest.add_action(CleaningAction::new(
                    ActionType::ValueImputed,
                    spec.name,
                    format!(
                        "Filled {} missing values with {:.4}",
                        outcome.filled,
                        outcome.value.unwrap_or_default()
                    ),
                ));
            }
        }
        Ok(())
    }

    fn finalize(&self, df: DataFrame) -> Result<DataFrame> {
        let uppercase: Vec<&str> = self
            .schema
            .columns
            .iter()
            .filter(|c| c.uppercase)
            .map(|c| c.name)
            .collect();
        let df = sanitizers::uppercase_columns(df, &uppercase)?;
        Ok(df.select(self.schema.output_names())?)
    }
}

/// A composed column and the rows where present inputs failed to compose.
type Composed = (Series, Vec<bool>);

/// Build the composite date and timestamp columns from the raw text fields.
fn compose_timestamps(df: &DataFrame, composite: &CompositeTimestamp) -> Result<(Composed, Composed)> {
    let years = text_values(df, composite.year)?;
    let months = text_values(df, composite.month)?;
    let days = text_values(df, composite.day)?;
    let times = text_values(df, composite.time)?;

    let mut dates = Vec::with_capacity(df.height());
    let mut datetimes = Vec::with_capacity(df.height());
    let mut date_missing = Vec::with_capacity(df.height());
    let mut datetime_missing = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let date = match (&years[i], &months[i], &days[i]) {
            (Some(y), Some(m), Some(d)) => TemporalNormalizer::compose_date(y, m, d),
            _ => None,
        };
        let datetime = match (date, &times[i]) {
            (Some(date), Some(time)) => TemporalNormalizer::compose_datetime(date, time),
            _ => None,
        };

        date_missing.push(date.is_none());
        datetime_missing.push(datetime.is_none());
        dates.push(date);
        datetimes.push(datetime);
    }

    Ok((
        (date_series(composite.date_column, &dates)?, date_missing),
        (datetime_series(composite.datetime_column, &datetimes)?, datetime_missing),
    ))
}
