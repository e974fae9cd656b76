//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (model artifacts, the
//! statistics store).

mod classifier;
mod stats;

pub use classifier::{Classifier, ScoreError};
pub use stats::{ColumnStatistics, StatisticsSource};
