//! Prediction result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::features::CONTINUOUS_FEATURES;

/// Binary decision derived from the positive-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Up,
    Down,
}

impl Outcome {
    /// The boundary is closed on the "up" side: exactly 0.5 resolves to
    /// [`Outcome::Up`].
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.5 {
            Self::Up
        } else {
            Self::Down
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Round to a fixed number of decimal digits, half away from zero.
#[must_use]
pub(crate) fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// The six standardized index values echoed back for audit visibility,
/// rounded to 4 decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardizedIndices {
    pub e1: f64,
    pub b1: f64,
    pub p1: f64,
    pub e2: f64,
    pub b2: f64,
    pub p2: f64,
}

impl StandardizedIndices {
    /// Build the echo from the standardized canonical-name map.
    #[must_use]
    pub fn from_named(values: &BTreeMap<String, f64>) -> Self {
        let rounded = |canonical: &str| round_to(values.get(canonical).copied().unwrap_or(0.0), 4);
        let by_key: BTreeMap<&str, f64> = CONTINUOUS_FEATURES
            .iter()
            .map(|(key, canonical)| (*key, rounded(canonical)))
            .collect();

        Self {
            e1: by_key["e1"],
            b1: by_key["b1"],
            p1: by_key["p1"],
            e2: by_key["e2"],
            b2: by_key["b2"],
            p2: by_key["p2"],
        }
    }
}

/// Complete prediction record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Unique identifier
    pub id: String,

    /// Binary decision
    pub result: Outcome,

    /// Raw positive-class probability (0.0 to 1.0)
    pub probability: f64,

    /// Probability as a percentage, rounded to 2 decimal digits
    pub percentage: f64,

    /// Standardized index values echoed for auditability
    pub indices: StandardizedIndices,

    /// Timestamp of prediction
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Prediction {
    /// Create a prediction from a probability and the standardized echo.
    #[must_use]
    pub fn new(probability: f64, indices: StandardizedIndices) -> Self {
        Self {
            id: uuid_v4(),
            result: Outcome::from_probability(probability),
            probability,
            percentage: round_to(probability * 100.0, 2),
            indices,
            created_at: chrono::Utc::now(),
        }
    }

    /// Detailed breakdown of the prediction.
    #[must_use]
    pub fn details(&self) -> PredictionDetails {
        let prob_up = self.probability;
        let prob_down = 1.0 - prob_up;

        PredictionDetails {
            probability_up: round_to(prob_up * 100.0, 2),
            probability_down: round_to(prob_down * 100.0, 2),
            // Distance from the 0.5 decision boundary on a 0-100 scale.
            confidence: round_to((prob_up - 0.5).abs() * 2.0 * 100.0, 2),
        }
    }
}

/// Detailed prediction breakdown, all on a 0-100 scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PredictionDetails {
    pub probability_up: f64,
    pub probability_down: f64,
    pub confidence: f64,
}

/// Generate a simple UUID v4 (random) using CSPRNG.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
