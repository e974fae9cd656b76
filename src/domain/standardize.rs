//! Feature standardization.
//!
//! Applies `(x - mean) / std` per feature using constants computed offline.
//! This is a linear transform, not a projection: callers must apply it
//! exactly once per request.

use std::collections::BTreeMap;

use super::features::StandardizationTable;

/// Standardize every value that has constants in the table.
///
/// `std == 0` degenerates to mean-subtraction (never a division error);
/// names absent from the table pass through unchanged. The caller handles
/// the no-table bypass explicitly.
#[must_use]
pub fn standardize(
    values: &BTreeMap<String, f64>,
    table: &StandardizationTable,
) -> BTreeMap<String, f64> {
    values
        .iter()
        .map(|(name, &value)| {
            let standardized = match table.get(name) {
                Some(stats) if stats.std > 0.0 => (value - stats.mean) / stats.std,
                Some(stats) => value - stats.mean,
                None => value,
            };
            (name.clone(), standardized)
        })
        .collect()
}
