//! SQLite adapter: statistics source over a relational table.
//!
//! Backs the offline `compute_stats` utility. How the operator reaches
//! the store (local file, mounted volume, tunneled copy) is outside this
//! adapter; it only runs aggregate queries.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from
//! panic in another thread) will cause panic. This fail-fast behavior is
//! intentional: half-computed statistics must never reach a deployment.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::ports::{ColumnStatistics, StatisticsSource};

/// Error type for statistics-source operations.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// SQLite statistics source.
pub struct SqliteStatisticsSource {
    conn: Mutex<Connection>,
}

impl SqliteStatisticsSource {
    /// Open a statistics source over the given database file.
    ///
    /// # Errors
    /// Returns error if the database cannot be opened.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StatsError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory source (for testing).
    ///
    /// # Errors
    /// Returns error if the database cannot be created.
    pub fn in_memory() -> Result<Self, StatsError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a batch of SQL statements (fixture setup in tests).
    ///
    /// # Errors
    /// Returns error if execution fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), StatsError> {
        let conn = self.conn.lock().expect("Lock failed");
        conn.execute_batch(sql)?;
        Ok(())
    }
}

/// Table and column names cannot be bound as SQL parameters, so they are
/// restricted to plain identifiers before interpolation.
fn check_identifier(name: &str) -> Result<(), StatsError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StatsError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

impl StatisticsSource for SqliteStatisticsSource {
    type Error = StatsError;

    fn column_statistics(
        &self,
        table: &str,
        column: &str,
    ) -> Result<ColumnStatistics, StatsError> {
        check_identifier(table)?;
        check_identifier(column)?;

        let conn = self.conn.lock().expect("Lock failed");

        let summary_sql = format!(
            "SELECT COUNT({column}), AVG({column}), MIN({column}), MAX({column}) \
             FROM {table} WHERE {column} IS NOT NULL"
        );
        let (count, mean, min, max) = conn.query_row(&summary_sql, [], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
            ))
        })?;

        if count == 0 {
            return Ok(ColumnStatistics {
                mean: 0.0,
                std: 0.0,
                count: 0,
                min: 0.0,
                max: 0.0,
            });
        }

        let mean = mean.unwrap_or(0.0);

        // SQLite has no STDDEV aggregate; second pass for the population
        // variance around the computed mean.
        let variance_sql = format!(
            "SELECT AVG(({column} - ?1) * ({column} - ?1)) \
             FROM {table} WHERE {column} IS NOT NULL"
        );
        let variance: Option<f64> = conn.query_row(&variance_sql, [mean], |row| row.get(0))?;
        let std = variance.unwrap_or(0.0).max(0.0).sqrt();

        Ok(ColumnStatistics {
            mean,
            std,
            count: count as u64,
            min: min.unwrap_or(0.0),
            max: max.unwrap_or(0.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> SqliteStatisticsSource {
        let source = SqliteStatisticsSource::in_memory().expect("Should create db");
        source
            .execute_batch(
                r"
                CREATE TABLE listings (e1 REAL, b1 REAL);
                INSERT INTO listings (e1, b1) VALUES (2.0, 10.0);
                INSERT INTO listings (e1, b1) VALUES (4.0, NULL);
                INSERT INTO listings (e1, b1) VALUES (6.0, 30.0);
                ",
            )
            .expect("Should create fixture");
        source
    }

    #[test]
    fn test_column_statistics() {
        let source = fixture();
        let stats = source
            .column_statistics("listings", "e1")
            .expect("Should compute");

        assert_eq!(stats.count, 3);
        assert!((stats.mean - 4.0).abs() < 1e-12);
        // Population std of {2, 4, 6} around mean 4.
        assert!((stats.std - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((stats.min - 2.0).abs() < 1e-12);
        assert!((stats.max - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_null_rows_ignored() {
        let source = fixture();
        let stats = source
            .column_statistics("listings", "b1")
            .expect("Should compute");

        assert_eq!(stats.count, 2);
        assert!((stats.mean - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table_yields_zero_count() {
        let source = SqliteStatisticsSource::in_memory().expect("Should create db");
        source
            .execute_batch("CREATE TABLE listings (e1 REAL);")
            .expect("Should create table");

        let stats = source
            .column_statistics("listings", "e1")
            .expect("Should compute");
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, 0.0);
    }

    #[test]
    fn test_identifiers_are_checked() {
        let source = fixture();

        let err = source
            .column_statistics("listings; DROP TABLE listings", "e1")
            .expect_err("Must reject");
        assert!(matches!(err, StatsError::InvalidIdentifier(_)));

        let err = source
            .column_statistics("listings", "e1 --")
            .expect_err("Must reject");
        assert!(matches!(err, StatsError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_missing_column_is_a_database_error() {
        let source = fixture();
        let err = source
            .column_statistics("listings", "nope")
            .expect_err("Must fail");
        assert!(matches!(err, StatsError::Database(_)));
    }
}
