//! One-hot encoding and schema reconciliation.
//!
//! Encoding is a pure function from a record to a sparse `column -> value`
//! map holding only the hot indicator of each categorical field plus the
//! numeric pass-throughs. The classifier needs a dense row in its training
//! column order, so the sparse map is then reconciled against the trained
//! [`FeatureSchema`]: missing columns become `0.0`, unknown columns are
//! dropped, and values are laid out in schema order.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::attributes::{columns, one_hot_name, Categorical};
use crate::error::ChurnError;
use crate::form::AttributeRecord;

/// Encoded columns of a single record, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseFeatures(BTreeMap<String, f64>);

impl SparseFeatures {
    fn numeric(&mut self, column: &str, value: f64) {
        self.0.insert(column.to_string(), value);
    }

    fn one_hot<T: Categorical>(&mut self, field: &str, value: T) {
        self.0.insert(one_hot_name(field, value.label()), 1.0);
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.0.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Encode one record. Numeric columns keep their own names; each categorical
/// field contributes exactly one `<field>_<label>` column set to `1.0`.
pub fn encode(record: &AttributeRecord) -> SparseFeatures {
    use columns::*;

    let mut features = SparseFeatures::default();

    features.numeric(SENIOR_CITIZEN, record.senior_citizen().senior_flag());
    features.numeric(MONTHLY_CHARGES, record.monthly_charges().value());
    features.numeric(TOTAL_CHARGES, record.total_charges().value());

    features.one_hot(PARTNER, record.partner());
    features.one_hot(DEPENDENTS, record.dependents());
    features.one_hot(PHONE_SERVICE, record.phone_service());
    features.one_hot(MULTIPLE_LINES, record.multiple_lines());
    features.one_hot(INTERNET_SERVICE, record.internet_service());
    for (field, value) in INTERNET_ADDONS.iter().zip(record.internet_addons()) {
        features.one_hot(field, value);
    }
    features.one_hot(CONTRACT, record.contract());
    features.one_hot(PAPERLESS_BILLING, record.paperless_billing());
    features.one_hot(PAYMENT_METHOD, record.payment_method());
    features.one_hot(TENURE_GROUP, record.tenure_group());

    features
}

/// Ordered column names the classifier was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl FeatureSchema {
    pub fn new(names: Vec<String>) -> Result<Self, ChurnError> {
        if names.is_empty() {
            return Err(ChurnError::SchemaMismatch(
                "trained feature schema is empty".to_string(),
            ));
        }

        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), i).is_some() {
                return Err(ChurnError::SchemaMismatch(format!(
                    "duplicate feature name '{name}' in trained schema"
                )));
            }
        }

        Ok(Self { names, positions })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }
}

/// Dense row aligned to a schema. Column `i` is `schema.names()[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatureVector<'s> {
    schema: &'s FeatureSchema,
    values: Vec<f64>,
}

impl<'s> EncodedFeatureVector<'s> {
    pub fn columns(&self) -> &'s [String] {
        self.schema.names()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.schema.position(column).map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of aligning sparse features to a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled<'s> {
    pub vector: EncodedFeatureVector<'s>,
    /// Encoded columns the schema does not know, in column-name order.
    pub dropped: Vec<String>,
    /// Schema columns the record did not produce and that were zero-filled.
    pub filled: usize,
}

/// Align `features` to `schema`.
pub fn reconcile<'s>(features: &SparseFeatures, schema: &'s FeatureSchema) -> Reconciled<'s> {
    let mut values = vec![0.0; schema.len()];
    let mut seen = 0;
    let mut dropped = Vec::new();

    for (column, value) in features.iter() {
        match schema.position(column) {
            Some(i) => {
                values[i] = value;
                seen += 1;
            }
            None => {
                debug!(column, "dropping encoded column absent from trained schema");
                dropped.push(column.to_string());
            }
        }
    }

    Reconciled {
        vector: EncodedFeatureVector { schema, values },
        dropped,
        filled: schema.len() - seen,
    }
}
