//! Purchase date events.
//!
//! The feed splits each purchase time into separate year, month, day and
//! time-of-day strings. Those are kept as bounded integers and also
//! recombined into a calendar date and a full timestamp.

use crate::schema::{ColumnSpec, CompositeTimestamp, Entity, EntitySchema};

pub const TIME_PERIODS: &[&str] = &["Evening", "Morning", "Late_Hours", "Midday"];

pub const PURCHASE_TIMESTAMP: CompositeTimestamp = CompositeTimestamp {
    year: "year",
    month: "month",
    day: "day",
    time: "timestamp",
    date_column: "purchase_date",
    datetime_column: "purchase_datetime",
};

pub fn schema() -> EntitySchema {
    EntitySchema::new(
        Entity::DateEvents,
        vec![
            ColumnSpec::text("timestamp", 8),
            ColumnSpec::integer("month").bounded(1, 12),
            ColumnSpec::integer("year").bounded(1900, 2100),
            ColumnSpec::integer("day").bounded(1, 31),
            ColumnSpec::categorical("time_period", TIME_PERIODS),
            ColumnSpec::text("date_uuid", 36),
            ColumnSpec::date("purchase_date").derived(),
            ColumnSpec::datetime("purchase_datetime").derived(),
        ],
    )
    .with_composite(PURCHASE_TIMESTAMP)
}
