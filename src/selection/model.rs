//! Logistic scoring model: turns a feature vector into the probability that
//! the learner answers the candidate question correctly.
//!
//! The model is loaded lazily from a JSON artifact. A missing or unreadable
//! artifact is replaced by a fixed-coefficient fallback, which is written back
//! to disk so every later process start loads the same model. An artifact whose
//! coefficient count disagrees with [`FEATURE_DIM`] is a configuration error and
//! is never papered over.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::types::{FeatureVector, FEATURE_DIM};

pub const MODEL_ARTIFACT_VERSION: u32 = 1;

/// Preset weights: the three accuracy features dominate, slower domains and
/// harder questions pull the probability down.
pub const FALLBACK_COEFFICIENTS: [f64; FEATURE_DIM] = [2.0, 1.5, 1.0, -0.01, -0.5, 0.0];
pub const FALLBACK_INTERCEPT: f64 = 0.0;
pub const CLASS_LABELS: [i32; 2] = [0, 1];

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model artifact corrupt: {0}")]
    Corrupt(String),
    #[error("feature dimension mismatch: encoder produces {expected} features, model has {actual} coefficients")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// On-disk layout of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelArtifact {
    pub version: u32,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub class_labels: [i32; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticModel {
    coefficients: [f64; FEATURE_DIM],
    intercept: f64,
    class_labels: [i32; 2],
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticModel {
    pub fn new(coefficients: [f64; FEATURE_DIM], intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            class_labels: CLASS_LABELS,
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_COEFFICIENTS, FALLBACK_INTERCEPT)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        let coefficients: [f64; FEATURE_DIM] =
            artifact
                .coefficients
                .as_slice()
                .try_into()
                .map_err(|_| ModelError::DimensionMismatch {
                    expected: FEATURE_DIM,
                    actual: artifact.coefficients.len(),
                })?;

        let mut labels = artifact.class_labels;
        labels.sort_unstable();
        if labels != CLASS_LABELS {
            return Err(ModelError::Corrupt(format!(
                "class labels must be a permutation of {:?}, got {:?}",
                CLASS_LABELS, artifact.class_labels
            )));
        }
        if coefficients.iter().any(|c| !c.is_finite()) || !artifact.intercept.is_finite() {
            return Err(ModelError::Corrupt("non-finite model weights".to_string()));
        }

        Ok(Self {
            coefficients,
            intercept: artifact.intercept,
            class_labels: artifact.class_labels,
        })
    }

    pub fn to_artifact(&self) -> ModelArtifact {
        ModelArtifact {
            version: MODEL_ARTIFACT_VERSION,
            coefficients: self.coefficients.to_vec(),
            intercept: self.intercept,
            class_labels: self.class_labels,
        }
    }

    pub fn coefficients(&self) -> &[f64; FEATURE_DIM] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn logit(&self, features: &FeatureVector) -> f64 {
        self.coefficients
            .iter()
            .zip(features.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    /// Probability of the "correct" class (label `1`).
    pub fn predict_probability(&self, features: &FeatureVector) -> f64 {
        let p = sigmoid(self.logit(features));
        if self.class_labels[1] == 1 {
            p
        } else {
            1.0 - p
        }
    }

    /// One probability per row, in input order.
    pub fn predict_batch(&self, rows: &[FeatureVector]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_probability(row)).collect()
    }
}

pub fn load_artifact(path: &Path) -> Result<LogisticModel, ModelError> {
    let bytes = std::fs::read(path)?;
    let artifact: ModelArtifact =
        serde_json::from_slice(&bytes).map_err(|e| ModelError::Corrupt(e.to_string()))?;
    LogisticModel::from_artifact(artifact)
}

/// Writes to a sibling temp file and renames it into place, so a crash never
/// leaves a half-written artifact behind.
pub fn save_artifact(path: &Path, model: &LogisticModel) -> Result<(), ModelError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec_pretty(&model.to_artifact())
        .map_err(|e| ModelError::Corrupt(e.to_string()))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads the artifact at `path`, regenerating the fallback when it is absent
/// or unreadable. Only a dimension mismatch is returned as an error.
pub fn load_or_create(path: &Path) -> Result<LogisticModel, ModelError> {
    match load_artifact(path) {
        Ok(model) => {
            tracing::info!(path = %path.display(), "Loaded scoring model artifact");
            return Ok(model);
        }
        Err(e @ ModelError::DimensionMismatch { .. }) => return Err(e),
        Err(ModelError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No scoring model artifact, creating fallback");
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Scoring model artifact unreadable, regenerating fallback"
            );
        }
    }

    let model = LogisticModel::fallback();
    if let Err(e) = save_artifact(path, &model) {
        tracing::error!(
            path = %path.display(),
            error = %e,
            "Failed to persist fallback scoring model, continuing in memory"
        );
    }
    Ok(model)
}

/// Process-wide handle to the scoring model. The first successful `get()`
/// performs the load; concurrent first callers wait on the same initialization.
#[derive(Debug)]
pub struct ModelHandle {
    path: PathBuf,
    cell: OnceCell<LogisticModel>,
}

impl ModelHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// A handle that never touches disk.
    pub fn preloaded(model: LogisticModel) -> Self {
        Self {
            path: PathBuf::new(),
            cell: OnceCell::with_value(model),
        }
    }

    pub fn get(&self) -> Result<&LogisticModel, ModelError> {
        self.cell.get_or_try_init(|| load_or_create(&self.path))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn zero_logit_gives_one_half() {
        let model = LogisticModel::new([2.0, 1.5, 1.0, -0.01, -0.5, 0.0], 0.0);
        let features = [0.0, 0.0, 0.0, 0.0, 0.0, 37.0];
        assert_eq!(model.logit(&features), 0.0);
        assert_eq!(model.predict_probability(&features), 0.5);
    }

    #[test]
    fn probabilities_are_bounded_and_ordered() {
        let model = LogisticModel::fallback();
        let rows = [
            [1.0, 1.0, 1.0, 10.0, 0.0, 5.0],
            [0.0, 0.0, 0.0, 500.0, 2.0, 5.0],
            [0.5, 0.5, 0.5, 30.0, 1.0, 5.0],
        ];
        let probs = model.predict_batch(&rows);
        assert_eq!(probs.len(), 3);
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(probs[0] > probs[2]);
        assert!(probs[2] > probs[1]);
        assert_eq!(probs[2], model.predict_probability(&rows[2]));
    }

    #[test]
    fn swapped_labels_return_complement() {
        let artifact = ModelArtifact {
            version: MODEL_ARTIFACT_VERSION,
            coefficients: vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            intercept: 0.0,
            class_labels: [1, 0],
        };
        let model = LogisticModel::from_artifact(artifact).unwrap();
        let p = model.predict_probability(&[2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!((p - (1.0 - sigmoid(2.0))).abs() < 1e-12);
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let artifact = ModelArtifact {
            version: MODEL_ARTIFACT_VERSION,
            coefficients: vec![1.0; 5],
            intercept: 0.0,
            class_labels: CLASS_LABELS,
        };
        let err = LogisticModel::from_artifact(artifact).unwrap_err();
        assert!(matches!(
            err,
            ModelError::DimensionMismatch {
                expected: 6,
                actual: 5
            }
        ));
    }

    #[test]
    fn missing_artifact_creates_and_persists_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("models").join("scoring.json");

        let handle = ModelHandle::new(&path);
        assert!(!handle.is_loaded());
        let model = handle.get().unwrap();
        assert_eq!(model, &LogisticModel::fallback());
        assert!(handle.is_loaded());
        assert!(path.exists());
        assert_eq!(load_artifact(&path).unwrap(), LogisticModel::fallback());
    }

    #[test]
    fn corrupt_artifact_is_regenerated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scoring.json");
        std::fs::write(&path, b"{not json").unwrap();

        let model = load_or_create(&path).unwrap();
        assert_eq!(model, LogisticModel::fallback());
        assert_eq!(load_artifact(&path).unwrap(), LogisticModel::fallback());
    }

    #[test]
    fn mismatched_artifact_is_fatal_and_left_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scoring.json");
        let original = serde_json::json!({
            "version": 1,
            "coefficients": [1.0, 2.0, 3.0],
            "intercept": 0.0,
            "classLabels": [0, 1]
        })
        .to_string();
        std::fs::write(&path, &original).unwrap();

        let handle = ModelHandle::new(&path);
        assert!(matches!(
            handle.get(),
            Err(ModelError::DimensionMismatch { actual: 3, .. })
        ));
        assert!(!handle.is_loaded());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn save_and_reload_is_byte_stable() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");

        save_artifact(&first, &LogisticModel::fallback()).unwrap();
        let reloaded = load_artifact(&first).unwrap();
        save_artifact(&second, &reloaded).unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
        let x = [0.75, 0.667, 1.0, 25.0, 1.0, 9.0];
        assert_eq!(
            LogisticModel::fallback().predict_probability(&x),
            reloaded.predict_probability(&x)
        );
    }

    #[test]
    fn concurrent_first_load_initializes_once() {
        let dir = tempdir().unwrap();
        let handle = Arc::new(ModelHandle::new(dir.path().join("scoring.json")));

        let addrs: Vec<usize> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let handle = handle.clone();
                    scope.spawn(move || handle.get().unwrap() as *const LogisticModel as usize)
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }
}
