//! Orders, the fact table linking every other entity.

use crate::schema::{ColumnSpec, Entity, EntitySchema};

/// Personal names do not belong in the fact table; "1" is a stray index.
const DROPPED: &[&str] = &["first_name", "last_name", "1"];

pub fn schema() -> EntitySchema {
    EntitySchema::new(
        Entity::Orders,
        vec![
            ColumnSpec::text("date_uuid", 36),
            ColumnSpec::text("user_uuid", 36),
            ColumnSpec::text("card_number", 19),
            ColumnSpec::text("store_code", 12),
            ColumnSpec::text("product_code", 11).uppercase(),
            ColumnSpec::integer("product_quantity"),
        ],
    )
    .dropping(DROPPED)
}
