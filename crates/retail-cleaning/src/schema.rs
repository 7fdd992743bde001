//! Declarative column schemas.
//!
//! Each entity is described by an [`EntitySchema`]: the ordered output
//! columns with their semantic types, plus the handful of structural rules
//! (columns to drop, lexical corrections, sentinel rows) that make that
//! entity's feed loadable. The cleaner interprets these tables; there is no
//! per-entity procedural code.

use crate::error::{CleaningError, Result};
use polars::prelude::{DataType, TimeUnit};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// The six business entities fed into the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Users,
    Cards,
    Stores,
    Products,
    Orders,
    DateEvents,
}

impl Entity {
    /// All entities, in load order.
    pub const ALL: [Entity; 6] = [
        Entity::Users,
        Entity::Cards,
        Entity::Stores,
        Entity::Products,
        Entity::Orders,
        Entity::DateEvents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Cards => "cards",
            Self::Stores => "stores",
            Self::Products => "products",
            Self::Orders => "orders",
            Self::DateEvents => "date_events",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Entity {
    type Err = CleaningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "users" | "user" => Ok(Self::Users),
            "cards" | "card" => Ok(Self::Cards),
            "stores" | "store" => Ok(Self::Stores),
            "products" | "product" => Ok(Self::Products),
            "orders" | "order" => Ok(Self::Orders),
            "date_events" | "dates" | "date_times" => Ok(Self::DateEvents),
            _ => Err(CleaningError::UnknownEntity(s.to_string())),
        }
    }
}

/// Semantic type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Text,
    Integer,
    Decimal,
    Date,
    Datetime,
    Categorical,
}

impl SemanticType {
    /// Whether a cleaned value of this type may be the missing marker (null).
    pub fn allows_missing(&self) -> bool {
        matches!(self, Self::Decimal | Self::Date | Self::Datetime)
    }

    /// Polars dtype of a cleaned column of this type.
    pub fn dtype(&self) -> DataType {
        match self {
            Self::Text | Self::Categorical => DataType::String,
            Self::Integer => DataType::Int64,
            Self::Decimal => DataType::Float64,
            Self::Date => DataType::Date,
            Self::Datetime => DataType::Datetime(TimeUnit::Milliseconds, None),
        }
    }
}

/// Declaration of one output column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Output column name.
    pub name: &'static str,
    /// Raw column the value is read from (equals `name` unless renamed).
    pub source: &'static str,
    pub semantic_type: SemanticType,
    /// Maximum text length in characters; longer values are truncated.
    pub max_len: Option<usize>,
    /// Closed set of legal values (categorical columns only).
    pub allow_list: Option<&'static [&'static str]>,
    /// Value carries a unit suffix and is normalized to kilograms.
    pub unit_bearing: bool,
    /// Closed table of raw token -> corrected token, applied before integer parsing.
    pub repairs: &'static [(&'static str, &'static str)],
    /// Stray characters removed before parsing (markers, currency symbols).
    pub strip_chars: &'static [char],
    /// Uppercase the value once it has been coerced.
    pub uppercase: bool,
    /// Inclusive bounds for integer columns.
    pub bounds: Option<(i64, i64)>,
    /// Computed by the cleaner rather than read from the raw batch.
    pub derived: bool,
}

impl ColumnSpec {
    fn new(name: &'static str, semantic_type: SemanticType) -> Self {
        Self {
            name,
            source: name,
            semantic_type,
            max_len: None,
            allow_list: None,
            unit_bearing: false,
            repairs: &[],
            strip_chars: &[],
            uppercase: false,
            bounds: None,
            derived: false,
        }
    }

    pub fn text(name: &'static str, max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::new(name, SemanticType::Text)
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, SemanticType::Integer)
    }

    pub fn decimal(name: &'static str) -> Self {
        Self::new(name, SemanticType::Decimal)
    }

    pub fn date(name: &'static str) -> Self {
        Self::new(name, SemanticType::Date)
    }

    pub fn datetime(name: &'static str) -> Self {
        Self::new(name, SemanticType::Datetime)
    }

    pub fn categorical(name: &'static str, allow_list: &'static [&'static str]) -> Self {
        Self {
            allow_list: Some(allow_list),
            ..Self::new(name, SemanticType::Categorical)
        }
    }

    /// Read the value from a differently named raw column.
    pub fn from_source(mut self, source: &'static str) -> Self {
        self.source = source;
        self
    }

    pub fn unit_bearing(mut self) -> Self {
        self.unit_bearing = true;
        self
    }

    pub fn with_repairs(mut self, repairs: &'static [(&'static str, &'static str)]) -> Self {
        self.repairs = repairs;
        self
    }

    pub fn strip(mut self, chars: &'static [char]) -> Self {
        self.strip_chars = chars;
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn bounded(mut self, min: i64, max: i64) -> Self {
        self.bounds = Some((min, max));
        self
    }

    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    /// Whether a null or unparsable value in this column removes the row.
    pub fn is_row_gate(&self) -> bool {
        !self.semantic_type.allows_missing()
    }
}

/// Exact token replacement applied to one raw column before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalCorrection {
    pub column: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

/// A known-bad row identified by the value of one raw column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelRow {
    pub column: &'static str,
    pub value: &'static str,
}

/// Separate year/month/day/time columns combined into a date and a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeTimestamp {
    pub year: &'static str,
    pub month: &'static str,
    pub day: &'static str,
    pub time: &'static str,
    pub date_column: &'static str,
    pub datetime_column: &'static str,
}

/// Full cleaning declaration for one entity.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub entity: Entity,
    pub columns: Vec<ColumnSpec>,
    pub drop_columns: &'static [&'static str],
    pub drop_duplicate_columns: bool,
    pub corrections: &'static [LexicalCorrection],
    pub drop_null_rows: bool,
    pub sentinel: Option<SentinelRow>,
    pub composite: Option<CompositeTimestamp>,
}

impl EntitySchema {
    pub fn new(entity: Entity, columns: Vec<ColumnSpec>) -> Self {
        Self {
            entity,
            columns,
            drop_columns: &[],
            drop_duplicate_columns: false,
            corrections: &[],
            drop_null_rows: false,
            sentinel: None,
            composite: None,
        }
    }

    pub fn dropping(mut self, columns: &'static [&'static str]) -> Self {
        self.drop_columns = columns;
        self
    }

    pub fn dropping_duplicate_columns(mut self) -> Self {
        self.drop_duplicate_columns = true;
        self
    }

    pub fn with_corrections(mut self, corrections: &'static [LexicalCorrection]) -> Self {
        self.corrections = corrections;
        self
    }

    pub fn dropping_null_rows(mut self) -> Self {
        self.drop_null_rows = true;
        self
    }

    pub fn with_sentinel(mut self, column: &'static str, value: &'static str) -> Self {
        self.sentinel = Some(SentinelRow { column, value });
        self
    }

    pub fn with_composite(mut self, composite: CompositeTimestamp) -> Self {
        self.composite = Some(composite);
        self
    }

    /// Look up a declared column by output name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Categorical columns in declaration order.
    pub fn categorical_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns
            .iter()
            .filter(|c| c.semantic_type == SemanticType::Categorical)
    }

    /// Output column names in declaration order.
    pub fn output_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Raw columns that must be present for the batch to be cleanable.
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        let mut required = Vec::new();

        let declared = self.columns.iter().filter(|c| !c.derived).map(|c| c.source);
        let composite = self
            .composite
            .iter()
            .flat_map(|c| [c.year, c.month, c.day, c.time]);
        let sentinel = self.sentinel.iter().map(|s| s.column);

        for name in declared.chain(composite).chain(sentinel) {
            if seen.insert(name) {
                required.push(name);
            }
        }
        required
    }

    /// Check the schema's own invariants.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for spec in &self.columns {
            if !names.insert(spec.name) {
                return Err(self.invalid(format!("duplicate output column '{}'", spec.name)));
            }

            let is_categorical = spec.semantic_type == SemanticType::Categorical;
            match spec.allow_list {
                Some(list) if list.is_empty() => {
                    return Err(self.invalid(format!("'{}' has an empty allow-list", spec.name)));
                }
                None if is_categorical => {
                    return Err(self.invalid(format!("'{}' is categorical without an allow-list", spec.name)));
                }
                Some(_) if !is_categorical => {
                    return Err(self.invalid(format!("'{}' has an allow-list but is not categorical", spec.name)));
                }
                _ => {}
            }

            if spec.unit_bearing && spec.semantic_type != SemanticType::Decimal {
                return Err(self.invalid(format!("unit-bearing column '{}' must be decimal", spec.name)));
            }
            if (spec.bounds.is_some() || !spec.repairs.is_empty())
                && spec.semantic_type != SemanticType::Integer
            {
                return Err(self.invalid(format!("'{}' has integer rules but is not an integer", spec.name)));
            }
            if let Some((min, max)) = spec.bounds
                && min > max
            {
                return Err(self.invalid(format!("'{}' has inverted bounds {min}..={max}", spec.name)));
            }
            if spec.derived {
                let produced = self.composite.is_some_and(|c| {
                    spec.name == c.date_column || spec.name == c.datetime_column
                });
                if !produced {
                    return Err(self.invalid(format!("derived column '{}' has no producer", spec.name)));
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, message: String) -> CleaningError {
        CleaningError::InvalidSchema(format!("{}: {}", self.entity, message))
    }
}
