//! The cleaning pipeline and its builder.

use crate::cleaner::EntityCleaner;
use crate::config::{CleaningConfig, ConfigValidationError};
use crate::error::{CleaningError, Result};
use crate::pipeline::progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate};
use crate::schema::Entity;
use crate::types::CleanedBatch;
use polars::prelude::DataFrame;
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

/// Runs entity cleaners over raw batches.
///
/// Use [`CleaningPipeline::builder()`] to create a pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use retail_cleaning::{CleaningConfig, CleaningPipeline, Entity, WeightImputation};
///
/// let pipeline = CleaningPipeline::builder()
///     .config(
///         CleaningConfig::builder()
///             .weight_imputation(WeightImputation::BatchMean)
///             .build()?,
///     )
///     .on_progress(|update| println!("{}: {}", update.entity, update.message))
///     .build()?;
///
/// let stores = pipeline.run(Entity::Stores, &raw_stores)?;
/// println!("{} rows rejected", stores.manifest.rows_rejected());
/// ```
pub struct CleaningPipeline {
    config: CleaningConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// run_many shares the pipeline across scoped worker threads
static_assertions::assert_impl_all!(CleaningPipeline: Send, Sync);

impl CleaningPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> CleaningPipelineBuilder {
        CleaningPipelineBuilder::default()
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Clean one raw batch of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`CleaningError::BatchMalformed`] if a required raw column is
    /// absent. Dirty rows and values are never errors; they are recorded in
    /// the returned manifest.
    pub fn run(&self, entity: Entity, raw: &DataFrame) -> Result<CleanedBatch> {
        let result = EntityCleaner::for_entity(entity).and_then(|cleaner| {
            cleaner.clean_with_progress(raw, &self.config, self.progress_reporter.as_deref())
        });

        match result {
            Ok(batch) => {
                self.report_progress(ProgressUpdate::complete(
                    entity,
                    format!("{} rows cleaned", batch.manifest.rows_out),
                ));
                Ok(batch)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(entity, e.to_string()));
                error!("Cleaning {} failed: {}", entity, e);
                Err(e.with_context(format!("Cleaning {entity}")))
            }
        }
    }

    /// Clean several independent batches in parallel.
    ///
    /// Each batch runs on its own scoped thread. Results are returned in input
    /// order, one per batch; a failing batch does not affect the others.
    pub fn run_many(&self, batches: &[(Entity, DataFrame)]) -> Vec<Result<CleanedBatch>> {
        info!("Cleaning {} batches in parallel", batches.len());

        thread::scope(|scope| {
            let handles: Vec<_> = batches
                .iter()
                .map(|(entity, raw)| (*entity, scope.spawn(move || self.run(*entity, raw))))
                .collect();

            handles
                .into_iter()
                .map(|(entity, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(CleaningError::Internal(format!("worker cleaning {entity} panicked")))
                    })
                })
                .collect()
        })
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }
}

/// Builder for [`CleaningPipeline`].
#[derive(Default)]
pub struct CleaningPipelineBuilder {
    config: Option<CleaningConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(CleaningPipelineBuilder: Send);

impl CleaningPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during cleaning.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// With `run_many` the callback is invoked from several threads.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<CleaningPipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(CleaningPipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}
