//! Feature naming and standardization statistics.
//!
//! The six continuous indices travel under the canonical column names the
//! classifier was trained against, not the short request keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Request key → canonical training-time column name for the six
/// continuous indices. The canonical names key the standardization table
/// and appear in the model feature list.
pub const CONTINUOUS_FEATURES: [(&str, &str); 6] = [
    ("e1", "In_Engagement"),
    ("b1", "In_History"),
    ("p1", "In_Popularity"),
    ("e2", "Ex_Engagement"),
    ("b2", "Ex_History"),
    ("p2", "Ex_Popularity"),
];

/// Per-feature standardization constants computed offline from
/// historical data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub mean: f64,
    pub std: f64,
}

/// Mapping from canonical feature name to its standardization constants.
///
/// Loaded once per process and treated as immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardizationTable {
    entries: BTreeMap<String, FeatureStats>,
}

impl StandardizationTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, stats: FeatureStats) {
        self.entries.insert(name.into(), stats);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FeatureStats> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the table carries constants for all six continuous indices.
    #[must_use]
    pub fn covers_all_indices(&self) -> bool {
        CONTINUOUS_FEATURES
            .iter()
            .all(|(_, canonical)| self.entries.contains_key(*canonical))
    }

    /// Check the table invariants: every std must be finite and >= 0,
    /// every mean finite.
    ///
    /// # Errors
    /// Returns a description of the first violated entry.
    pub fn validate(&self) -> Result<(), String> {
        for (name, stats) in &self.entries {
            if !stats.mean.is_finite() {
                return Err(format!("{name}: mean {} is not finite", stats.mean));
            }
            if !stats.std.is_finite() || stats.std < 0.0 {
                return Err(format!("{name}: std {} must be finite and >= 0", stats.std));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, FeatureStats)> for StandardizationTable {
    fn from_iter<T: IntoIterator<Item = (String, FeatureStats)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Named feature map produced by the categorical encoder: standardized
/// continuous features plus dummy indicator columns.
pub type EncodedVector = BTreeMap<String, f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_all_indices() {
        let mut table = StandardizationTable::new();
        assert!(!table.covers_all_indices());

        for (_, canonical) in CONTINUOUS_FEATURES {
            table.insert(canonical, FeatureStats { mean: 0.0, std: 1.0 });
        }
        assert!(table.covers_all_indices());
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_validate_rejects_negative_std() {
        let mut table = StandardizationTable::new();
        table.insert("In_Engagement", FeatureStats { mean: 1.0, std: -0.5 });

        let err = table.validate().expect_err("Should reject negative std");
        assert!(err.contains("In_Engagement"));
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut table = StandardizationTable::new();
        table.insert("In_History", FeatureStats { mean: 42.5, std: 7.25 });

        let json = serde_json::to_string(&table).expect("Should serialize");
        assert!(json.contains("\"In_History\""));

        let parsed: StandardizationTable =
            serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(parsed, table);
    }
}
