use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a prediction. A request either yields a complete
/// result or one of these.
#[derive(Debug, Error)]
pub enum ChurnError {
    /// The artifact could not be read or parsed. Fatal for the session.
    #[error("model unavailable: {path}: {reason}")]
    ModelUnavailable { path: PathBuf, reason: String },

    /// The artifact loaded but cannot report a usable feature schema.
    /// Fatal for the current request only.
    #[error("prediction unavailable: {0}")]
    SchemaMismatch(String),
}

impl ChurnError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ChurnError::ModelUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised while evaluating an artifact.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {actual}")]
    RowWidth { expected: usize, actual: usize },

    #[error("tree {tree}: {reason}")]
    MalformedTree { tree: usize, reason: String },
}

impl From<ClassifierError> for ChurnError {
    fn from(err: ClassifierError) -> Self {
        // The artifact disagrees with its own schema
        ChurnError::SchemaMismatch(err.to_string())
    }
}

/// An artifact that parsed as JSON but is not a usable model.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported objective '{0}', expected binary:logistic or binary:logitraw")]
    Objective(String),

    #[error("{0}")]
    Invalid(String),
}
