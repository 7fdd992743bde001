//! Store details.

use crate::schema::{ColumnSpec, Entity, EntitySchema, LexicalCorrection};

pub const STORE_TYPES: &[&str] = &["Local", "Mall Kiosk", "Super Store", "Outlet", "Web Portal"];

/// Known corrupt staff counts and their intended values. Any other token that
/// fails to parse fails its row.
pub const STAFF_NUMBER_REPAIRS: &[(&str, &str)] = &[
    ("J78", "78"),
    ("30e", "30"),
    ("80R", "80"),
    ("A97", "97"),
    ("3n9", "39"),
];

pub const CORRECTIONS: &[LexicalCorrection] = &[
    LexicalCorrection { column: "continent", from: "eeEurope", to: "Europe" },
    LexicalCorrection { column: "continent", from: "eeAmerica", to: "America" },
];

/// The feed carries an all-null `lat` next to the real `latitude`.
const DROPPED: &[&str] = &["lat"];

pub fn schema() -> EntitySchema {
    EntitySchema::new(
        Entity::Stores,
        vec![
            ColumnSpec::text("address", 255),
            ColumnSpec::decimal("longitude"),
            ColumnSpec::text("locality", 255),
            ColumnSpec::text("store_code", 12),
            ColumnSpec::integer("staff_numbers").with_repairs(STAFF_NUMBER_REPAIRS),
            ColumnSpec::date("opening_date"),
            ColumnSpec::categorical("store_type", STORE_TYPES),
            ColumnSpec::decimal("latitude"),
            ColumnSpec::text("country_code", 2),
            ColumnSpec::text("continent", 255),
        ],
    )
    .dropping(DROPPED)
    .with_corrections(CORRECTIONS)
    // The web portal row has N/A coordinates and is re-entered by hand downstream.
    .with_sentinel("index", "0")
}
