//! Model artifact adapter: loading and scoring the trained classifier.
//!
//! The artifact is a JSON export of the training pipeline. Two model
//! families exist and are represented as a tagged variant, selected at
//! load time:
//!
//! - `intercept`: self-describing. Bundles its own feature list, which
//!   includes a `const` bias column; the scorer substitutes constant 1 at
//!   that position.
//! - `margin`: coefficients plus a separately stored intercept. The
//!   feature list is supplied by a companion file and must match the
//!   coefficient order implicitly.
//!
//! # Caching
//!
//! The artifact is loaded lazily on first use and cached for the process
//! lifetime, including a failed load: a process incarnation never retries
//! a broken artifact, a new deployment is the only refresh path. The
//! `OnceLock` accessor is race-tolerant by construction (double
//! construction is harmless, partial construction is impossible).

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::domain::{AlignedVector, BIAS_COLUMN};
use crate::ports::{Classifier, ScoreError};

/// Environment variable overriding the model artifact path.
pub const MODEL_PATH_ENV: &str = "BIDCAST_MODEL_PATH";

/// Environment variable overriding the companion feature-list path
/// (margin family only).
pub const FEATURE_LIST_PATH_ENV: &str = "BIDCAST_FEATURE_LIST_PATH";

const DEFAULT_MODEL_PATH: &str = "models/model.json";
const DEFAULT_FEATURE_LIST_PATH: &str = "models/feature_names.json";

/// Upper bound on the feature count, used for sanity checks.
const MAX_FEATURES: usize = 64;

/// Error type for artifact operations.
///
/// `NotFound` is the only operational "service unavailable" condition;
/// everything else indicates a broken export and is handled as an
/// unexpected failure upstream.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("Malformed artifact {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Invalid artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// Self-describing logistic model with an explicit bias column.
    Intercept {
        feature_names: Vec<String>,
        coefficients: Vec<f64>,
    },
    /// Margin classifier; feature list may be bundled or supplied by a
    /// companion file.
    Margin {
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
}

#[derive(Debug, Clone)]
enum ModelFamily {
    /// Coefficients parallel to the full feature list, bias included.
    Intercept { coefficients: Vec<f64> },
    /// Coefficients parallel to the feature list, intercept separate.
    Margin { coefficients: Vec<f64>, intercept: f64 },
}

/// A validated, immutable trained model.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    feature_list: Vec<String>,
    family: ModelFamily,
}

impl LoadedModel {
    /// Load and validate a model artifact.
    ///
    /// For the margin family without bundled feature names, the companion
    /// list at `feature_list_path` is required; its absence is the same
    /// unavailable condition as a missing model.
    ///
    /// # Errors
    /// Returns [`ArtifactError`] if either file is missing, unparsable,
    /// or fails the sanity checks.
    pub fn load(model_path: &Path, feature_list_path: &Path) -> Result<Self, ArtifactError> {
        if !model_path.exists() {
            return Err(ArtifactError::NotFound(model_path.to_path_buf()));
        }

        let content = std::fs::read_to_string(model_path).map_err(|e| ArtifactError::Malformed {
            path: model_path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let artifact: ModelArtifact =
            serde_json::from_str(&content).map_err(|e| ArtifactError::Malformed {
                path: model_path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let invalid = |reason: String| ArtifactError::Invalid {
            path: model_path.to_path_buf(),
            reason,
        };

        let model = match artifact {
            ModelArtifact::Intercept {
                feature_names,
                coefficients,
            } => {
                check_schema(&feature_names, &coefficients).map_err(invalid)?;
                if feature_names.iter().filter(|n| *n == BIAS_COLUMN).count() > 1 {
                    return Err(invalid(format!(
                        "feature list contains more than one {BIAS_COLUMN:?} column"
                    )));
                }
                Self {
                    feature_list: feature_names,
                    family: ModelFamily::Intercept { coefficients },
                }
            }
            ModelArtifact::Margin {
                feature_names,
                coefficients,
                intercept,
            } => {
                let feature_names = match feature_names {
                    Some(names) => names,
                    None => load_feature_list(feature_list_path)?,
                };
                check_schema(&feature_names, &coefficients).map_err(invalid)?;
                if !intercept.is_finite() {
                    return Err(invalid(format!("intercept {intercept} is not finite")));
                }
                if feature_names.iter().any(|n| n == BIAS_COLUMN) {
                    return Err(invalid(format!(
                        "margin family must not carry a {BIAS_COLUMN:?} column"
                    )));
                }
                Self {
                    feature_list: feature_names,
                    family: ModelFamily::Margin {
                        coefficients,
                        intercept,
                    },
                }
            }
        };

        tracing::info!(
            "Loaded {} model from {:?} (n_features={})",
            model.family_name(),
            model_path,
            model.feature_list.len()
        );

        Ok(model)
    }

    #[must_use]
    pub fn family_name(&self) -> &'static str {
        match self.family {
            ModelFamily::Intercept { .. } => "intercept",
            ModelFamily::Margin { .. } => "margin",
        }
    }

    fn non_bias_len(&self) -> usize {
        self.feature_list
            .iter()
            .filter(|n| n.as_str() != BIAS_COLUMN)
            .count()
    }
}

fn check_schema(feature_names: &[String], coefficients: &[f64]) -> Result<(), String> {
    let n = feature_names.len();
    if n == 0 || n > MAX_FEATURES {
        return Err(format!("invalid feature count: got {n}, max {MAX_FEATURES}"));
    }
    if coefficients.len() != n {
        return Err(format!(
            "coefficient count {} does not match feature_names length {n}",
            coefficients.len()
        ));
    }
    if let Some(bad) = coefficients.iter().find(|c| !c.is_finite()) {
        return Err(format!("coefficient {bad} is not finite"));
    }
    Ok(())
}

fn load_feature_list(path: &Path) -> Result<Vec<String>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| ArtifactError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(|e| ArtifactError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Classifier for LoadedModel {
    fn feature_list(&self) -> &[String] {
        &self.feature_list
    }

    fn positive_probability(&self, aligned: &AlignedVector) -> Result<f64, ScoreError> {
        let logit = match &self.family {
            ModelFamily::Intercept { coefficients } => {
                let expected = self.non_bias_len();
                if aligned.len() != expected {
                    return Err(ScoreError::LengthMismatch {
                        expected,
                        actual: aligned.len(),
                    });
                }

                let mut aligned_iter = aligned.iter();
                let mut acc = 0.0;
                for (position, (name, coefficient)) in
                    self.feature_list.iter().zip(coefficients).enumerate()
                {
                    let x = if name == BIAS_COLUMN {
                        1.0
                    } else {
                        // Length was checked above, so the iterator cannot
                        // run dry before the list does.
                        let (actual, value) =
                            aligned_iter.next().ok_or(ScoreError::LengthMismatch {
                                expected,
                                actual: aligned.len(),
                            })?;
                        if actual != name {
                            return Err(ScoreError::FeatureMismatch {
                                position,
                                expected: name.clone(),
                                actual: actual.to_string(),
                            });
                        }
                        value
                    };
                    acc += coefficient * x;
                }
                acc
            }
            ModelFamily::Margin {
                coefficients,
                intercept,
            } => {
                if aligned.len() != coefficients.len() {
                    return Err(ScoreError::LengthMismatch {
                        expected: coefficients.len(),
                        actual: aligned.len(),
                    });
                }

                let mut acc = *intercept;
                for (position, ((actual, value), (name, coefficient))) in aligned
                    .iter()
                    .zip(self.feature_list.iter().zip(coefficients))
                    .enumerate()
                {
                    if actual != name {
                        return Err(ScoreError::FeatureMismatch {
                            position,
                            expected: name.clone(),
                            actual: actual.to_string(),
                        });
                    }
                    acc += coefficient * value;
                }
                acc
            }
        };

        let probability = sigmoid(logit);
        if !probability.is_finite() {
            return Err(ScoreError::NonFinite);
        }
        Ok(probability)
    }
}

static MODEL_CACHE: OnceLock<Result<Arc<LoadedModel>, ArtifactError>> = OnceLock::new();

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

/// Process-wide cached model accessor.
///
/// The first caller loads the artifact from `BIDCAST_MODEL_PATH` (and
/// `BIDCAST_FEATURE_LIST_PATH` for the margin family); every later caller
/// reuses the result, success or failure.
///
/// # Errors
/// Returns the cached [`ArtifactError`] for this process incarnation.
pub fn global() -> Result<Arc<LoadedModel>, ArtifactError> {
    MODEL_CACHE
        .get_or_init(|| {
            let model_path = env_path(MODEL_PATH_ENV, DEFAULT_MODEL_PATH);
            let feature_list_path = env_path(FEATURE_LIST_PATH_ENV, DEFAULT_FEATURE_LIST_PATH);
            match LoadedModel::load(&model_path, &feature_list_path) {
                Ok(model) => Ok(Arc::new(model)),
                Err(e) => {
                    tracing::error!(
                        "Model artifact failed to load, caching failure for this process: {e}"
                    );
                    Err(e)
                }
            }
        })
        .clone()
}
