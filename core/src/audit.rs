//! Coverage of a trained schema against the attribute domains.
//!
//! A schema trained on data where some label never occurred has no column
//! for it, and reconciliation silently drops that indicator. Sentinel
//! columns are the common case: a training set without phone-less customers
//! has no `MultipleLines_No phone service`. The audit makes those gaps
//! visible before any prediction runs.

use std::collections::HashSet;

use serde::Serialize;

use crate::attributes::{columns, field_domains};
use crate::encoding::FeatureSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaAudit {
    /// Schema width.
    pub features: usize,
    /// One-hot columns a record can produce that the schema lacks.
    pub unknown_columns: Vec<String>,
    /// The subset of `unknown_columns` that are gate sentinels.
    pub missing_sentinels: Vec<String>,
    /// Pass-through numeric columns the schema lacks.
    pub missing_numeric: Vec<String>,
    /// Schema columns no record can ever produce; always zero at scoring.
    pub unreachable_columns: Vec<String>,
}

impl SchemaAudit {
    pub fn inspect(schema: &FeatureSchema) -> Self {
        let mut audit = SchemaAudit {
            features: schema.len(),
            ..Default::default()
        };
        let mut producible: HashSet<String> =
            columns::NUMERIC.iter().map(|c| c.to_string()).collect();

        for column in columns::NUMERIC {
            if !schema.contains(column) {
                audit.missing_numeric.push(column.to_string());
            }
        }

        for domain in field_domains() {
            let sentinel = domain.sentinel_column();
            for column in domain.column_names() {
                if !schema.contains(&column) {
                    if sentinel.as_deref() == Some(column.as_str()) {
                        audit.missing_sentinels.push(column.clone());
                    }
                    audit.unknown_columns.push(column.clone());
                }
                producible.insert(column);
            }
        }

        audit.unreachable_columns = schema
            .names()
            .iter()
            .filter(|name| !producible.contains(name.as_str()))
            .cloned()
            .collect();

        audit
    }

    /// No producible column is dropped and no schema column is dead.
    pub fn is_complete(&self) -> bool {
        self.unknown_columns.is_empty()
            && self.missing_numeric.is_empty()
            && self.unreachable_columns.is_empty()
    }
}
