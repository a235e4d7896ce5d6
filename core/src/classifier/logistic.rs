// Logistic regression over named features.
//
// Artifact layout:
// {
//   "format": "logistic_regression",
//   "feature_names": ["SeniorCitizen", "MonthlyCharges", ...],
//   "coefficients": [0.25, 0.012, ...],
//   "intercept": -1.4,
//   "threshold": 0.5
// }
//
// `threshold` is optional and must lie strictly inside (0, 1).
use serde::Deserialize;

use super::{sigmoid, Classifier, ModelKind, DEFAULT_THRESHOLD};
use crate::error::{ArtifactError, ClassifierError};

pub(crate) const FORMAT: &str = "logistic_regression";

#[derive(Debug, Clone, Deserialize)]
struct LogisticDocument {
    #[serde(default)]
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    #[serde(default)]
    intercept: f64,
    #[serde(default)]
    threshold: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    feature_names: Option<Vec<String>>,
    coefficients: Vec<f64>,
    intercept: f64,
    threshold: f64,
}

impl LogisticRegression {
    pub fn new(feature_names: Option<Vec<String>>, coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            feature_names,
            coefficients,
            intercept,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Replace the decision threshold. Values outside (0, 1) are rejected.
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ArtifactError> {
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(ArtifactError::Invalid(format!(
                "threshold {threshold} is outside (0, 1)"
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub(crate) fn from_json(document: serde_json::Value) -> Result<Self, ArtifactError> {
        let doc: LogisticDocument = serde_json::from_value(document)?;

        if !doc.feature_names.is_empty() && doc.feature_names.len() != doc.coefficients.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} feature names but {} coefficients",
                doc.feature_names.len(),
                doc.coefficients.len()
            )));
        }

        // Trained on an unnamed matrix
        let feature_names = Some(doc.feature_names).filter(|names| !names.is_empty());

        let model = Self::new(feature_names, doc.coefficients, doc.intercept);
        match doc.threshold {
            Some(threshold) => model.with_threshold(threshold),
            None => Ok(model),
        }
    }

    // Linear combination: w1*x1 + w2*x2 + ... + b
    fn margin(&self, row: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(row)
            .fold(self.intercept, |acc, (w, x)| acc + w * x)
    }
}

impl Classifier for LogisticRegression {
    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<[f64; 2], ClassifierError> {
        if row.len() != self.coefficients.len() {
            return Err(ClassifierError::RowWidth {
                expected: self.coefficients.len(),
                actual: row.len(),
            });
        }

        let churn = sigmoid(self.margin(row));
        Ok([1.0 - churn, churn])
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn kind(&self) -> ModelKind {
        ModelKind::LogisticRegression
    }
}
