//! Pre-trained binary classifiers loaded from JSON artifacts.
//!
//! Two formats are understood: XGBoost's own JSON model dump and a plain
//! logistic regression document. Both are opaque to the rest of the crate
//! behind [`Classifier`].

mod boosted;
mod logistic;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{ChurnError, ClassifierError};

pub use boosted::BoostedTrees;
pub use logistic::LogisticRegression;

/// Decision threshold on `P(churn)` for artifacts that do not carry one.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// A trained binary classifier over a fixed, named feature row.
pub trait Classifier: Send + Sync {
    /// Column names learned at training time, or `None` when the artifact
    /// was trained without names.
    fn feature_names(&self) -> Option<&[String]>;

    /// `[P(stay), P(churn)]` for one row.
    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ClassifierError>;

    /// Churn is predicted when `P(churn)` is strictly above this.
    fn threshold(&self) -> f64 {
        DEFAULT_THRESHOLD
    }

    /// Class label: 0 = stay, 1 = churn.
    fn predict(&self, row: &[f64]) -> Result<u8, ClassifierError> {
        let [_, churn] = self.predict_proba(row)?;
        Ok(u8::from(churn > self.threshold()))
    }

    fn kind(&self) -> ModelKind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    GradientBoostedTrees,
    LogisticRegression,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::GradientBoostedTrees => f.write_str("gradient boosted trees"),
            ModelKind::LogisticRegression => f.write_str("logistic regression"),
        }
    }
}

/// Logistic function, clamped where `exp` stops mattering.
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x > 20.0 {
        1.0
    } else if x < -20.0 {
        0.0
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

/// A loaded artifact plus where it came from.
pub struct ModelHandle {
    classifier: Box<dyn Classifier>,
    path: PathBuf,
    fingerprint: String,
}

impl ModelHandle {
    /// Read and parse an artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChurnError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| ChurnError::unavailable(path, e))?;
        let handle = Self::from_bytes(path, &bytes)?;
        info!(
            path = %path.display(),
            kind = %handle.kind(),
            fingerprint = %handle.fingerprint,
            "classifier artifact loaded"
        );
        Ok(handle)
    }

    /// Parse an artifact already in memory. `path` is only used for error
    /// reporting.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self, ChurnError> {
        let path = path.into();
        let fingerprint = fingerprint(bytes);

        let document: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| ChurnError::unavailable(&path, e))?;

        let classifier: Box<dyn Classifier> = if document.get("learner").is_some() {
            Box::new(BoostedTrees::from_json(document).map_err(|e| ChurnError::unavailable(&path, e))?)
        } else if document.get("format").and_then(|v| v.as_str()) == Some(logistic::FORMAT) {
            Box::new(
                LogisticRegression::from_json(document)
                    .map_err(|e| ChurnError::unavailable(&path, e))?,
            )
        } else {
            return Err(ChurnError::unavailable(
                &path,
                "unrecognised artifact: expected an XGBoost JSON model or a logistic_regression document",
            ));
        };

        Ok(Self {
            classifier,
            path,
            fingerprint,
        })
    }

    /// Wrap a classifier that did not come from a file.
    pub fn from_classifier(classifier: Box<dyn Classifier>, label: &str) -> Self {
        Self {
            classifier,
            path: PathBuf::from(label),
            fingerprint: fingerprint(label.as_bytes()),
        }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn kind(&self) -> ModelKind {
        self.classifier.kind()
    }

    pub fn threshold(&self) -> f64 {
        self.classifier.threshold()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hex SHA-256 of the artifact bytes.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("kind", &self.kind())
            .field("threshold", &self.threshold())
            .field("path", &self.path)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
