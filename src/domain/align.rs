//! Feature alignment against the model schema.
//!
//! The trained model's feature list is authoritative: the aligned vector
//! matches it column for column. Feature identity is carried all the way
//! to the scoring boundary; flattening to a positional array happens only
//! inside the model, immediately before the dot product.

use super::features::EncodedVector;

/// Bias/intercept column name used by the intercept model family. It is
/// never part of the aligned vector; the scorer injects it.
pub const BIAS_COLUMN: &str = "const";

/// Encoded features reordered and reconciled to the model feature list
/// (minus the bias column). Name/value pairs stay together so a schema
/// mix-up surfaces as an error instead of a silently wrong score.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedVector {
    features: Vec<(String, f64)>,
}

impl AlignedVector {
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.features.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Flatten to the positional array the model consumes. Order is the
    /// model feature list order, nothing else.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.features.iter().map(|(_, v)| *v).collect()
    }
}

/// Reconcile an encoded feature map against the model feature list.
///
/// - Features the model expects but the encoding lacks are inserted as 0
///   (reference category / absent signal).
/// - Features the encoding produced but the model never saw are dropped.
/// - Output order is exactly the feature list order.
/// - The bias column, if present in the list, is skipped here; the scorer
///   re-inserts it at its trained position.
#[must_use]
pub fn align(encoded: &EncodedVector, feature_list: &[String]) -> AlignedVector {
    let features = feature_list
        .iter()
        .filter(|name| name.as_str() != BIAS_COLUMN)
        .map(|name| (name.clone(), encoded.get(name).copied().unwrap_or(0.0)))
        .collect();

    AlignedVector { features }
}
