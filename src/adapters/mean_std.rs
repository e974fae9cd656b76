//! Standardization table resolution.
//!
//! Resolution order:
//! 1. Inline constants (`INLINE_MEAN_STD`), only when they cover all six
//!    continuous indices
//! 2. JSON file at `BIDCAST_MEAN_STD_PATH` (default `models/mean_std.json`)
//! 3. Absent: standardization is bypassed and predictions run against
//!    un-normalized indices, which is flagged to operators
//!
//! A malformed or invariant-violating file is an error, never a silent
//! bypass. The resolved result (including an error) is cached for the
//! process lifetime.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::domain::{FeatureStats, StandardizationTable};

/// Environment variable overriding the statistics file path.
pub const MEAN_STD_PATH_ENV: &str = "BIDCAST_MEAN_STD_PATH";

const DEFAULT_MEAN_STD_PATH: &str = "models/mean_std.json";

/// Inline standardization constants. Fill these from the `compute_stats`
/// utility output to run without an external file.
const INLINE_MEAN_STD: &[(&str, f64, f64)] = &[
    // ("In_Engagement", 0.0, 1.0),
    // ("In_History", 0.0, 1.0),
    // ("In_Popularity", 0.0, 1.0),
    // ("Ex_Engagement", 0.0, 1.0),
    // ("Ex_History", 0.0, 1.0),
    // ("Ex_Popularity", 0.0, 1.0),
];

/// Error type for standardization table loading.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeanStdError {
    #[error("Malformed statistics table {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Resolve the standardization table from the inline constants or the
/// configured file path.
///
/// # Errors
/// Returns [`MeanStdError`] if a file is present but unusable.
pub fn resolve() -> Result<Option<StandardizationTable>, MeanStdError> {
    let inline: StandardizationTable = INLINE_MEAN_STD
        .iter()
        .map(|(name, mean, std)| ((*name).to_string(), FeatureStats { mean: *mean, std: *std }))
        .collect();
    if inline.covers_all_indices() {
        tracing::info!("Using inline standardization constants");
        return Ok(Some(inline));
    }

    let path = std::env::var(MEAN_STD_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_MEAN_STD_PATH));
    resolve_from(&path)
}

/// Load and validate the table from a file, or report the bypass.
///
/// # Errors
/// Returns [`MeanStdError`] if the file exists but is unusable.
pub fn resolve_from(path: &Path) -> Result<Option<StandardizationTable>, MeanStdError> {
    if !path.exists() {
        tracing::warn!(
            "No standardization table resolved ({:?} missing); indices will be scored un-normalized",
            path
        );
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| MeanStdError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let table: StandardizationTable =
        serde_json::from_str(&content).map_err(|e| MeanStdError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    table.validate().map_err(|reason| MeanStdError::Malformed {
        path: path.to_path_buf(),
        reason,
    })?;

    tracing::info!("Loaded standardization table from {:?} ({} entries)", path, table.len());
    Ok(Some(table))
}

static TABLE_CACHE: OnceLock<Result<Option<Arc<StandardizationTable>>, MeanStdError>> =
    OnceLock::new();

/// Process-wide cached table accessor.
///
/// # Errors
/// Returns the cached [`MeanStdError`] for this process incarnation.
pub fn global() -> Result<Option<Arc<StandardizationTable>>, MeanStdError> {
    TABLE_CACHE
        .get_or_init(|| resolve().map(|table| table.map(Arc::new)))
        .clone()
}
