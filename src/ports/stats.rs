//! Statistics source port: per-column statistics over a relational table.
//!
//! Backs the offline utility that produces the standardization table. How
//! the store is reached (tunnels, sockets, files) is the adapter's
//! business; the core only cares about the resulting shape.

use serde::Serialize;

/// Summary statistics for one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub mean: f64,
    pub std: f64,
    pub count: u64,
    pub min: f64,
    pub max: f64,
}

/// Trait for relational statistics sources.
pub trait StatisticsSource {
    /// Error type for source operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Compute statistics for a column, ignoring NULL rows.
    ///
    /// # Errors
    /// Returns error if the query fails or the identifiers are invalid.
    fn column_statistics(&self, table: &str, column: &str)
        -> Result<ColumnStatistics, Self::Error>;
}
