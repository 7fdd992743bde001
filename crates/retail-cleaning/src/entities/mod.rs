//! Declared schemas for the six source feeds.
//!
//! Each submodule exposes the allow-lists and rule tables for one entity and
//! a `schema()` constructor. The tables encode the known shape of each feed
//! and are deliberately not runtime-configurable.

pub mod cards;
pub mod date_events;
pub mod orders;
pub mod products;
pub mod stores;
pub mod users;

use crate::schema::{Entity, EntitySchema};

/// The declared schema for `entity`.
pub fn schema_for(entity: Entity) -> EntitySchema {
    match entity {
        Entity::Users => users::schema(),
        Entity::Cards => cards::schema(),
        Entity::Stores => stores::schema(),
        Entity::Products => products::schema(),
        Entity::Orders => orders::schema(),
        Entity::DateEvents => date_events::schema(),
    }
}
