//! Filter expressions for backing store queries
//!
//! The backing store only needs two operators: equality and membership in a
//! small set of values. Membership filters are capped at
//! [`MAX_IN_VALUES`], which is the hard limit of the document store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::record::{fields, Document};

/// Largest value list accepted by an `in` filter.
pub const MAX_IN_VALUES: usize = 10;

/// Filter operator for field comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal to
    Eq,
    /// In list of values
    In,
}

/// A single field filter. Queries AND their filters together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Field to filter on
    pub field: String,
    /// Operator to apply
    pub operator: FilterOperator,
    /// Value to compare against; an array for `In`
    pub value: Value,
}

impl FilterExpr {
    /// Create a new filter expression.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Eq, value.into())
    }

    /// Create a membership filter over string values.
    pub fn in_list<S: AsRef<str>>(field: impl Into<String>, values: &[S]) -> Self {
        let values = values
            .iter()
            .map(|v| Value::String(v.as_ref().to_string()))
            .collect();
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Create a membership filter over decoded primary keys.
    pub fn primary_key_in<S: AsRef<str>>(ids: &[S]) -> Self {
        Self::in_list(fields::PRIMARY_KEY, ids)
    }

    /// Check the filter against the store's limits.
    pub fn validate(&self) -> Result<(), StoreError> {
        match (self.operator, &self.value) {
            (FilterOperator::Eq, _) => Ok(()),
            (FilterOperator::In, Value::Array(values)) if values.len() > MAX_IN_VALUES => {
                Err(StoreError::InvalidQuery {
                    reason: format!(
                        "'in' filter on {} has {} values, limit is {}",
                        self.field,
                        values.len(),
                        MAX_IN_VALUES
                    ),
                })
            }
            (FilterOperator::In, Value::Array(_)) => Ok(()),
            (FilterOperator::In, _) => Err(StoreError::InvalidQuery {
                reason: format!("'in' filter on {} needs an array value", self.field),
            }),
        }
    }

    /// Evaluate the filter against a document.
    ///
    /// Missing fields never match. String and numeric representations of
    /// the same value are not considered equal, except on
    /// [`fields::PRIMARY_KEY`], which compares the decoded key.
    pub fn matches(&self, doc: &Document) -> bool {
        let key;
        let actual = if self.field == fields::PRIMARY_KEY {
            key = Value::String(doc.primary_key());
            &key
        } else {
            match doc.get(&self.field) {
                Some(value) => value,
                None => return false,
            }
        };
        match self.operator {
            FilterOperator::Eq => actual == &self.value,
            FilterOperator::In => self
                .value
                .as_array()
                .is_some_and(|values| values.iter().any(|v| v == actual)),
        }
    }
}
