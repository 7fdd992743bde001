use crate::schema::Entity;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Cleaning Manifest
// ============================================================================

/// What the cleaner did to one batch.
///
/// Every row removed is attributed to exactly one cause, so
/// `rows_in == rows_out + rows_rejected()` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningManifest {
    pub entity: Entity,

    /// Rows in the raw batch.
    pub rows_in: usize,
    /// Rows in the cleaned batch.
    pub rows_out: usize,

    /// Rows removed because a categorical value was not on its allow-list.
    pub rows_rejected_by_category: usize,
    /// Category rejections broken down by column.
    pub category_rejections_by_column: BTreeMap<String, usize>,
    /// Rows removed because they held a null in any column.
    pub rows_dropped_null: usize,
    /// Rows removed because they matched the entity's sentinel value.
    pub rows_dropped_sentinel: usize,
    /// Rows removed because a text or integer value could not be coerced.
    pub rows_failed_coercion: usize,

    /// Present values that became the missing marker.
    pub values_coerced_to_missing: usize,
    /// Coerced-to-missing counts broken down by column.
    pub missing_by_column: BTreeMap<String, usize>,
    /// Lexical corrections applied.
    pub values_corrected: usize,
    /// Missing values filled by imputation.
    pub values_imputed: usize,
    /// The value used for imputation, if any was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imputed_value: Option<f64>,

    /// Raw columns removed before cleaning.
    pub columns_dropped: Vec<String>,

    /// Wall-clock cleaning time in milliseconds.
    pub duration_ms: u64,

    /// Audit trail of cleaning steps, in execution order.
    pub actions: Vec<CleaningAction>,
}

impl CleaningManifest {
    pub fn new(entity: Entity, rows_in: usize) -> Self {
        Self {
            entity,
            rows_in,
            rows_out: 0,
            rows_rejected_by_category: 0,
            category_rejections_by_column: BTreeMap::new(),
            rows_dropped_null: 0,
            rows_dropped_sentinel: 0,
            rows_failed_coercion: 0,
            values_coerced_to_missing: 0,
            missing_by_column: BTreeMap::new(),
            values_corrected: 0,
            values_imputed: 0,
            imputed_value: None,
            columns_dropped: Vec::new(),
            duration_ms: 0,
            actions: Vec::new(),
        }
    }

    /// Total rows removed for any reason.
    pub fn rows_rejected(&self) -> usize {
        self.rows_rejected_by_category
            + self.rows_dropped_null
            + self.rows_dropped_sentinel
            + self.rows_failed_coercion
    }

    /// Add an action to the audit trail.
    pub fn add_action(&mut self, action: CleaningAction) {
        self.actions.push(action);
    }

    /// Percentage of input rows that survived cleaning.
    pub fn retention_percentage(&self) -> f32 {
        if self.rows_in == 0 {
            100.0
        } else {
            (self.rows_out as f32 / self.rows_in as f32) * 100.0
        }
    }
}

/// A single step taken while cleaning a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningAction {
    pub action_type: ActionType,
    /// Column name, or "batch" for row-level actions.
    pub target: String,
    pub description: String,
}

impl CleaningAction {
    pub fn new(action_type: ActionType, target: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
        }
    }
}

/// Kinds of cleaning steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A raw column was removed.
    ColumnRemoved,
    /// Known-bad tokens were rewritten.
    ValueCorrected,
    /// Rows failed a categorical allow-list.
    CategoryRejected,
    /// Rows were removed (nulls, sentinels, failed coercion).
    RowsRemoved,
    /// Values became the missing marker during coercion.
    CoercedToMissing,
    /// A date and timestamp were composed from separate fields.
    TimestampComposed,
    /// Missing values were imputed.
    ValueImputed,
}

impl ActionType {
    /// Get a human-readable display name for the action type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ColumnRemoved => "Column Removed",
            Self::ValueCorrected => "Value Corrected",
            Self::CategoryRejected => "Category Rejected",
            Self::RowsRemoved => "Rows Removed",
            Self::CoercedToMissing => "Coerced To Missing",
            Self::TimestampComposed => "Timestamp Composed",
            Self::ValueImputed => "Value Imputed",
        }
    }
}

/// A cleaned batch together with its manifest.
#[derive(Debug, Clone)]
pub struct CleanedBatch {
    pub data: DataFrame,
    pub manifest: CleaningManifest,
}
