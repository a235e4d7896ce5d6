//! Churn scoring for telco customers.
//!
//! One request is one synchronous pass:
//!
//! ```text
//! FormSelections --resolve--> AttributeRecord --encode--> SparseFeatures
//!     --reconcile(schema)--> EncodedFeatureVector --classifier--> PredictionResult
//! ```
//!
//! The classifier is loaded once from a JSON artifact and shared read-only
//! through [`ChurnPredictor`].

pub mod attributes;
pub mod audit;
pub mod classifier;
pub mod encoding;
pub mod error;
pub mod form;
pub mod insights;
pub mod predictor;

pub use attributes::RangeError;
pub use audit::SchemaAudit;
pub use classifier::{Classifier, ModelHandle, ModelKind};
pub use encoding::{encode, reconcile, EncodedFeatureVector, FeatureSchema, SparseFeatures};
pub use error::{ChurnError, ClassifierError};
pub use form::{AttributeRecord, FormSelections, Gates};
pub use insights::{RiskBand, Summary};
pub use predictor::{ChurnLabel, ChurnPredictor, PredictionReport, PredictionResult};
