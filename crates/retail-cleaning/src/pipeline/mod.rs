//! Pipeline module.
//!
//! This module provides the cleaning pipeline that runs entity cleaners over
//! raw batches, together with progress reporting.

mod builder;
pub mod progress;

pub use builder::{CleaningPipeline, CleaningPipelineBuilder};
pub use progress::{ClosureProgressReporter, CleaningStage, ProgressReporter, ProgressUpdate};
