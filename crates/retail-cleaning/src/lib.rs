//! Retail Record Cleaning Library
//!
//! A normalization engine that turns raw, heterogeneous retail feeds into
//! typed, validated tables ready for a central warehouse. Built with Rust and
//! Polars.
//!
//! # Overview
//!
//! Each of the six retail entities has a declarative [`EntitySchema`]:
//!
//! - **Users**: customer identity and contact details
//! - **Cards**: payment card records
//! - **Stores**: physical and web store details
//! - **Products**: the product catalogue, with weights normalized to kilograms
//! - **Orders**: the central fact table linking the other entities
//! - **Date events**: purchase timestamps split into parts
//!
//! Cleaning a batch restructures columns, rejects rows with out-of-vocabulary
//! categories, drops null and sentinel rows, coerces every value to its
//! semantic type, imputes unconvertible weights and projects the declared
//! columns. Every dropped row and every value turned into a missing marker is
//! counted in a [`CleaningManifest`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use retail_cleaning::{CleaningPipeline, Entity};
//! use polars::prelude::*;
//!
//! let raw = CsvReadOptions::default()
//!     .with_infer_schema_length(Some(0))
//!     .try_into_reader_with_file_path(Some("stores.csv".into()))?
//!     .finish()?;
//!
//! let batch = CleaningPipeline::builder().build()?.run(Entity::Stores, &raw)?;
//!
//! println!("{} rows kept", batch.manifest.rows_out);
//! println!("{} rows rejected by category", batch.manifest.rows_rejected_by_category);
//! ```
//!
//! # Configuration
//!
//! Use [`CleaningConfig`] to choose how unconvertible product weights are
//! filled:
//!
//! ```rust,ignore
//! use retail_cleaning::{CleaningConfig, WeightImputation, HISTORICAL_MEAN_WEIGHT_KG};
//!
//! let config = CleaningConfig::builder()
//!     .weight_imputation(WeightImputation::Fixed(HISTORICAL_MEAN_WEIGHT_KG))
//!     .output_dir("cleaned")
//!     .build()?;
//! ```
//!
//! # Progress Reporting
//!
//! ```rust,ignore
//! use retail_cleaning::{CleaningPipeline, Entity};
//!
//! let pipeline = CleaningPipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{}] {:?}: {}", update.entity, update.stage, update.message);
//!     })
//!     .build()?;
//!
//! // Entities are independent; clean them concurrently.
//! let results = pipeline.run_many(&[
//!     (Entity::Stores, raw_stores),
//!     (Entity::Products, raw_products),
//! ]);
//! ```

pub mod cleaner;
pub mod config;
pub mod entities;
pub mod error;
pub mod imputers;
pub mod normalizers;
pub mod pipeline;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{CategoryValidator, EntityCleaner, FieldCoercer};
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, HISTORICAL_MEAN_WEIGHT_KG,
    WeightImputation,
};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use imputers::{ImputationOutcome, StatisticalImputer};
pub use normalizers::{TemporalNormalizer, UnitNormalizer};
pub use pipeline::{
    CleaningPipeline, CleaningPipelineBuilder, CleaningStage, ClosureProgressReporter,
    ProgressReporter, ProgressUpdate,
};
pub use reporting::{OutputPaths, write_manifest, write_outputs};
pub use schema::{ColumnSpec, Entity, EntitySchema, SemanticType};
pub use types::{ActionType, CleanedBatch, CleaningAction, CleaningManifest};
pub use utils::{frame_from_json, frame_from_rows};
