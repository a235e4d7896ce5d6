//! Predictor adapter: record -> encoded row -> classifier -> result.
//!
//! A [`ChurnPredictor`] is built once at process start from a single
//! artifact and shared read-only afterwards. There is no reload path; a new
//! artifact means a new process.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::audit::SchemaAudit;
use crate::classifier::{Classifier, ModelHandle};
use crate::encoding::{encode, reconcile, FeatureSchema};
use crate::error::ChurnError;
use crate::form::{AttributeRecord, ChargeWarning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnLabel {
    Stay,
    Churn,
}

impl ChurnLabel {
    fn from_class(class: u8) -> Self {
        if class == 1 {
            ChurnLabel::Churn
        } else {
            ChurnLabel::Stay
        }
    }
}

impl fmt::Display for ChurnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChurnLabel::Stay => f.write_str("stay"),
            ChurnLabel::Churn => f.write_str("churn"),
        }
    }
}

/// The sole output of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: ChurnLabel,
    /// Raw `P(churn)` in `[0, 1]`.
    pub churn_probability: f64,
}

impl PredictionResult {
    /// Percentage rounded to one decimal, for display only.
    pub fn churn_percent(&self) -> f64 {
        (self.churn_probability * 1000.0).round() / 10.0
    }
}

/// A result plus what happened on the way to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionReport {
    #[serde(flatten)]
    pub result: PredictionResult,
    /// Encoded columns the trained schema did not know.
    pub dropped_features: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct ChurnPredictor {
    model: ModelHandle,
    schema: Option<FeatureSchema>,
    audit: Option<SchemaAudit>,
}

impl ChurnPredictor {
    /// Load the artifact at `path`. Failure here is fatal for the session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChurnError> {
        Ok(Self::new(ModelHandle::load(path)?))
    }

    /// Wrap an already loaded artifact. A missing or unusable schema does
    /// not fail here; every prediction reports it instead.
    pub fn new(model: ModelHandle) -> Self {
        let schema = match model.classifier().feature_names() {
            Some(names) => match FeatureSchema::new(names.to_vec()) {
                Ok(schema) => Some(schema),
                Err(e) => {
                    warn!(error = %e, "classifier schema unusable, predictions will be refused");
                    None
                }
            },
            None => {
                warn!("classifier artifact does not report feature names, predictions will be refused");
                None
            }
        };

        let audit = schema.as_ref().map(SchemaAudit::inspect);
        if let Some(audit) = &audit {
            for column in &audit.missing_sentinels {
                warn!(
                    column = %column,
                    "trained schema lacks sentinel column, its signal is dropped from every prediction"
                );
            }
            for column in &audit.missing_numeric {
                warn!(column = %column, "trained schema lacks numeric column");
            }
        }

        Self {
            model,
            schema,
            audit,
        }
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn schema(&self) -> Result<&FeatureSchema, ChurnError> {
        self.schema.as_ref().ok_or_else(|| {
            ChurnError::SchemaMismatch(format!(
                "{} does not report a usable feature schema",
                self.model.path().display()
            ))
        })
    }

    /// Coverage of the trained schema, when there is one.
    pub fn audit(&self) -> Option<&SchemaAudit> {
        self.audit.as_ref()
    }

    /// Score one customer. Either a complete report or an error; never a
    /// partial result.
    pub fn predict(&self, record: &AttributeRecord) -> Result<PredictionReport, ChurnError> {
        let schema = self.schema()?;
        let classifier: &dyn Classifier = self.model.classifier();

        let reconciled = reconcile(&encode(record), schema);
        let row = reconciled.vector.values();

        let class = classifier.predict(row)?;
        let [_, churn_probability] = classifier.predict_proba(row)?;

        debug!(
            class,
            churn_probability,
            filled = reconciled.filled,
            dropped = reconciled.dropped.len(),
            "prediction computed"
        );

        let warnings = record
            .charge_consistency()
            .iter()
            .map(ChargeWarning::to_string)
            .collect();

        Ok(PredictionReport {
            result: PredictionResult {
                label: ChurnLabel::from_class(class),
                churn_probability,
            },
            dropped_features: reconciled.dropped,
            warnings,
        })
    }
}

impl fmt::Debug for ChurnPredictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChurnPredictor")
            .field("model", &self.model)
            .field("features", &self.schema.as_ref().map(FeatureSchema::len))
            .finish()
    }
}
