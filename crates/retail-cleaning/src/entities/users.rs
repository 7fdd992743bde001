//! Registered users.

use crate::schema::{ColumnSpec, Entity, EntitySchema, LexicalCorrection};

/// Countries the business trades in. Rows from anywhere else are corrupt.
pub const COUNTRIES: &[&str] = &["Germany", "United Kingdom", "United States"];

pub const CORRECTIONS: &[LexicalCorrection] = &[LexicalCorrection {
    column: "country_code",
    from: "GGB",
    to: "GB",
}];

pub fn schema() -> EntitySchema {
    EntitySchema::new(
        Entity::Users,
        vec![
            ColumnSpec::text("first_name", 255),
            ColumnSpec::text("last_name", 255),
            ColumnSpec::date("date_of_birth"),
            ColumnSpec::text("company", 255),
            ColumnSpec::text("email_address", 255),
            ColumnSpec::text("address", 255),
            ColumnSpec::categorical("country", COUNTRIES),
            ColumnSpec::text("country_code", 2),
            ColumnSpec::text("phone_number", 255),
            ColumnSpec::date("join_date"),
            ColumnSpec::text("user_uuid", 36),
        ],
    )
    .dropping_duplicate_columns()
    .with_corrections(CORRECTIONS)
    .dropping_null_rows()
}
