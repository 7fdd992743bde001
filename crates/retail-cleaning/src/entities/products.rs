//! Product catalogue.

use crate::schema::{ColumnSpec, Entity, EntitySchema, LexicalCorrection};

pub const AVAILABILITY: &[&str] = &["Still_available", "Removed"];

pub const CORRECTIONS: &[LexicalCorrection] = &[LexicalCorrection {
    column: "removed",
    from: "Still_avaliable",
    to: "Still_available",
}];

pub const CURRENCY_SYMBOLS: &[char] = &['£'];

pub fn schema() -> EntitySchema {
    EntitySchema::new(
        Entity::Products,
        vec![
            ColumnSpec::text("product_name", 255),
            ColumnSpec::decimal("product_price_sterling")
                .from_source("product_price")
                .strip(CURRENCY_SYMBOLS),
            ColumnSpec::decimal("weight_kg").from_source("weight").unit_bearing(),
            ColumnSpec::text("category", 255),
            ColumnSpec::text("EAN", 17),
            ColumnSpec::date("date_added"),
            ColumnSpec::text("uuid", 36),
            ColumnSpec::categorical("removed", AVAILABILITY),
            ColumnSpec::text("product_code", 11).uppercase(),
        ],
    )
    .with_corrections(CORRECTIONS)
}
