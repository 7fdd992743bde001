//! Configuration types for the cleaning pipeline.
//!
//! The cleaning rules themselves live in the entity schemas and are not
//! configurable. What is configurable is the policy for missing product
//! weights and where cleaned batches are written.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Historical mean product weight in kilograms, for callers that want a
/// stable fill value across batches instead of the batch-local mean.
pub const HISTORICAL_MEAN_WEIGHT_KG: f64 = 3.15;

/// Policy for filling missing unit-bearing decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightImputation {
    /// Use the mean of the non-missing values in the same batch
    #[default]
    BatchMean,
    /// Use a fixed value in kilograms
    Fixed(f64),
    /// Leave missing values missing
    Leave,
}

/// Configuration for the cleaning pipeline.
///
/// Use [`CleaningConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use retail_cleaning::config::{CleaningConfig, WeightImputation};
///
/// let config = CleaningConfig::builder()
///     .weight_imputation(WeightImputation::Fixed(3.15))
///     .output_dir("./cleaned")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Fill policy for missing weights.
    pub weight_imputation: WeightImputation,

    /// Directory cleaned batches and manifests are written to.
    pub output_dir: PathBuf,

    /// Whether the CLI persists results. The library never writes on its own.
    pub save_to_disk: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            weight_imputation: WeightImputation::default(),
            output_dir: PathBuf::from("outputs"),
            save_to_disk: true,
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let WeightImputation::Fixed(value) = self.weight_imputation
            && (!value.is_finite() || value < 0.0)
        {
            return Err(ConfigValidationError::InvalidFixedWeight(value));
        }

        if self.save_to_disk && self.output_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyOutputDir);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid fixed weight: {0} (must be a finite, non-negative number of kilograms)")]
    InvalidFixedWeight(f64),

    #[error("Output directory must not be empty when saving to disk")]
    EmptyOutputDir,
}

impl From<ConfigValidationError> for crate::error::CleaningError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::CleaningError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    weight_imputation: Option<WeightImputation>,
    output_dir: Option<PathBuf>,
    save_to_disk: Option<bool>,
}

impl CleaningConfigBuilder {
    /// Set the policy for missing weights.
    pub fn weight_imputation(mut self, strategy: WeightImputation) -> Self {
        self.weight_imputation = Some(strategy);
        self
    }

    /// Set the output directory for cleaned batches and manifests.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Enable or disable saving cleaned batches to disk.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let config = CleaningConfig {
            weight_imputation: self.weight_imputation.unwrap_or_default(),
            output_dir: self.output_dir.unwrap_or_else(|| PathBuf::from("outputs")),
            save_to_disk: self.save_to_disk.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}
