//! Classifier port: Trait for the trained binary classifier.
//!
//! This trait abstracts the loaded model artifact from the application
//! logic. The model is the sole authority on its feature schema.

use crate::domain::AlignedVector;

/// Error type for scoring operations.
///
/// Scoring is a pure computation over an aligned vector; any failure here
/// means the vector and the model schema disagree, which is an internal
/// fault, never a caller problem.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScoreError {
    #[error("Feature mismatch at position {position}: model expects {expected:?}, got {actual:?}")]
    FeatureMismatch {
        position: usize,
        expected: String,
        actual: String,
    },

    #[error("Aligned vector has {actual} features, model expects {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Model produced a non-finite probability")]
    NonFinite,
}

/// Trait for trained binary classifiers.
pub trait Classifier: Send + Sync {
    /// The ordered feature list the model was fit against. May include a
    /// bias column for the intercept family.
    fn feature_list(&self) -> &[String];

    /// Positive-class probability for an aligned vector, in `[0, 1]`.
    ///
    /// # Errors
    /// Returns [`ScoreError`] if the vector does not match the trained
    /// schema.
    fn positive_probability(&self, aligned: &AlignedVector) -> Result<f64, ScoreError>;
}
