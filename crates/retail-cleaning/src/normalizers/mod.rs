//! Value normalizers for measurements and calendar fields.
//!
//! - Unit normalization of mixed-unit weights to kilograms
//! - Temporal normalization of free-form date/time strings

mod temporal;
mod units;

pub use temporal::{Temporal, TemporalKind, TemporalNormalizer};
pub use units::{KG_CONVERSION, UnitNormalizer};
