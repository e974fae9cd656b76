//! Domain layer: Core business types and the prediction pipeline stages.
//!
//! This module contains pure Rust types with no external dependencies.
//! The pipeline stages (validation, standardization, dummy encoding,
//! feature alignment) live here as total functions over value types.

mod align;
mod encode;
mod features;
mod listing;
mod prediction;
mod standardize;

pub use align::{align, AlignedVector, BIAS_COLUMN};
pub use encode::{encode, CategoricalField, CHANNEL_FIELD, GENRE_FIELD, TYPE_FIELD};
pub use features::{EncodedVector, FeatureStats, StandardizationTable, CONTINUOUS_FEATURES};
pub use listing::{EncodingVariant, ListingRecord, RawListing, ValidationErrors};
pub use prediction::{Outcome, Prediction, PredictionDetails, StandardizedIndices};
pub use standardize::standardize;
