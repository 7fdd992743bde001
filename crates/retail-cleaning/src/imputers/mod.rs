//! Imputation of missing values.
//!
//! Only unit-bearing decimals (product weights) are ever imputed. Every other
//! missing marker is left for the consumer to see.

mod statistical;

pub use statistical::{ImputationOutcome, StatisticalImputer};
