//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external artifacts:
//! - `artifact`: trained model JSON exports and scoring
//! - `mean_std`: standardization table resolution and caching
//! - `sqlite`: SQLite-backed statistics source

pub mod artifact;
pub mod mean_std;
pub mod sqlite;

// Re-export layer errors for lib.rs
pub use artifact::ArtifactError;
pub use mean_std::MeanStdError;
pub use sqlite::StatsError;
