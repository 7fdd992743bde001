//! Mixed-unit weight normalization.
//!
//! Product weights arrive as `<number><unit>` strings in grams, millilitres
//! and kilograms. Everything is rewritten to kilograms with a fixed
//! multiplicative table so that ordering and sums stay meaningful.

use once_cell::sync::Lazy;
use regex::Regex;

/// Leading decimal-or-integer token, then an optional alphabetic unit.
static WEIGHT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+\.\d+|\d+)\s*([A-Za-z]*)").expect("Invalid regex: weight")
});

/// Unit token -> factor to kilograms. Millilitres are taken at water density.
pub const KG_CONVERSION: [(&str, f64); 4] = [("ml", 0.001), ("g", 0.001), ("kg", 1.0), ("k", 1.0)];

/// Converts compound weight strings to the canonical kilogram scale.
pub struct UnitNormalizer;

impl UnitNormalizer {
    /// Parse `raw` and convert it to kilograms.
    ///
    /// A value without a unit is taken as already being in kilograms.
    /// Returns `None` (the missing marker) when there is no numeric prefix
    /// or the unit is not in [`KG_CONVERSION`].
    pub fn normalize_weight(raw: &str) -> Option<f64> {
        let caps = WEIGHT_PATTERN.captures(raw)?;
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2).map_or("", |m| m.as_str());

        let factor = if unit.is_empty() {
            1.0
        } else {
            Self::factor(unit)?
        };
        Some(value * factor)
    }

    /// Conversion factor for a unit token, if known.
    pub fn factor(unit: &str) -> Option<f64> {
        KG_CONVERSION
            .iter()
            .find(|(token, _)| *token == unit)
            .map(|(_, factor)| *factor)
    }
}
