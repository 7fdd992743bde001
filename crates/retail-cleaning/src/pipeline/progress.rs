//! Progress reporting for the cleaning pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use retail_cleaning::{CleaningPipeline, Entity};
//!
//! let batch = CleaningPipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{}] {:?}: {}", update.entity, update.stage, update.message);
//!     })
//!     .build()?
//!     .run(Entity::Stores, &raw)?;
//! ```

use crate::schema::Entity;
use serde::{Deserialize, Serialize};

/// Stages of cleaning one entity batch, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStage {
    /// Rendering raw columns and checking that required columns exist
    Validating,
    /// Dropping columns and applying lexical corrections
    Structuring,
    /// Filtering rows against categorical allow-lists
    CategoryFiltering,
    /// Dropping null and sentinel rows
    RowFiltering,
    /// Coercing values to their semantic types
    Coercion,
    /// Imputing missing weights
    Imputation,
    /// Uppercasing identifiers and projecting declared columns
    Finalizing,
    /// Batch cleaned successfully
    Complete,
    /// Batch failed with an error
    Failed,
}

impl CleaningStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Validating => "Validating Batch",
            Self::Structuring => "Restructuring Columns",
            Self::CategoryFiltering => "Filtering Categories",
            Self::RowFiltering => "Filtering Rows",
            Self::Coercion => "Coercing Values",
            Self::Imputation => "Imputing Values",
            Self::Finalizing => "Finalizing",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Cumulative progress at the start of this stage (0.0 - 1.0).
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Validating => 0.0,
            Self::Structuring => 0.05,
            Self::CategoryFiltering => 0.15,
            Self::RowFiltering => 0.25,
            Self::Coercion => 0.35,
            Self::Imputation => 0.80,
            Self::Finalizing => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A progress event for one entity batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub entity: Entity,
    pub stage: CleaningStage,
    /// Overall progress (0.0 - 1.0)
    pub progress: f32,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(entity: Entity, stage: CleaningStage, message: impl Into<String>) -> Self {
        Self {
            entity,
            stage,
            progress: stage.base_progress(),
            message: message.into(),
        }
    }

    pub fn complete(entity: Entity, message: impl Into<String>) -> Self {
        Self::new(entity, CleaningStage::Complete, message)
    }

    pub fn failed(entity: Entity, message: impl Into<String>) -> Self {
        Self::new(entity, CleaningStage::Failed, message)
    }
}

/// Receives progress updates while batches are cleaned.
///
/// Implementations must be `Send + Sync`: `run_many` cleans entities on
/// separate threads and reports from each of them.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_stage_progress_is_monotonic() {
        let stages = [
            CleaningStage::Validating,
            CleaningStage::Structuring,
            CleaningStage::CategoryFiltering,
            CleaningStage::RowFiltering,
            CleaningStage::Coercion,
            CleaningStage::Imputation,
            CleaningStage::Finalizing,
            CleaningStage::Complete,
        ];
        for pair in stages.windows(2) {
            assert!(pair[0].base_progress() < pair[1].base_progress());
        }
    }

    #[test]
    fn test_closure_reporter_forwards_updates() {
        let seen = Mutex::new(Vec::new());
        let reporter = ClosureProgressReporter::new(|update: ProgressUpdate| {
            seen.lock().unwrap().push(update.stage);
        });

        reporter.report(ProgressUpdate::new(Entity::Cards, CleaningStage::Coercion, "coercing"));
        reporter.report(ProgressUpdate::complete(Entity::Cards, "done"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![CleaningStage::Coercion, CleaningStage::Complete]
        );
    }

    #[test]
    fn test_update_serializes_snake_case() {
        let update = ProgressUpdate::failed(Entity::DateEvents, "boom");
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"failed\""));
        assert!(json.contains("\"date_events\""));
        assert_eq!(update.progress, 0.0);
    }
}
