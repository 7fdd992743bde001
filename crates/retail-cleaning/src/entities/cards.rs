//! Payment card details.

use crate::schema::{ColumnSpec, Entity, EntitySchema};

/// The ten card schemes accepted by the payment processor.
pub const CARD_PROVIDERS: &[&str] = &[
    "American Express",
    "Diners Club / Carte Blanche",
    "Discover",
    "JCB 15 digit",
    "JCB 16 digit",
    "Maestro",
    "Mastercard",
    "VISA 13 digit",
    "VISA 16 digit",
    "VISA 19 digit",
];

/// Stray markers the PDF extraction leaves inside card numbers.
pub const CARD_NUMBER_MARKERS: &[char] = &['?'];

pub fn schema() -> EntitySchema {
    EntitySchema::new(
        Entity::Cards,
        vec![
            ColumnSpec::integer("card_number").strip(CARD_NUMBER_MARKERS),
            ColumnSpec::text("expiry_date", 5),
            ColumnSpec::categorical("card_provider", CARD_PROVIDERS),
            ColumnSpec::date("date_payment_confirmed"),
        ],
    )
}
