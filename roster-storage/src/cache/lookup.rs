//! Lookup and batch result values.
//!
//! "Not found" and per-item failures are data, never errors. Every batch
//! result accounts for each input id in exactly one of its lists.

use std::sync::Arc;

use roster_core::Record;
use serde::{Deserialize, Serialize};

/// Result of a point lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub found: bool,
    pub record: Option<Record>,
    /// Answered from the indices without a backing store read.
    pub from_cache: bool,
    pub error: Option<String>,
}

impl LookupResult {
    /// Hit answered from the indices.
    pub fn from_cache(record: &Record) -> Self {
        Self {
            found: true,
            record: Some(record.clone()),
            from_cache: true,
            error: None,
        }
    }

    /// Hit that needed a backing store read first.
    pub fn from_storage(record: &Record) -> Self {
        Self {
            found: true,
            record: Some(record.clone()),
            from_cache: false,
            error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            record: None,
            from_cache: false,
            error: None,
        }
    }

    /// Lookup that could not be completed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            found: false,
            record: None,
            from_cache: false,
            error: Some(error.into()),
        }
    }
}

/// One id resolved inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundRecord {
    /// The id as requested.
    pub id: String,
    pub record: Record,
}

/// An isolated failure to resolve one id inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemError {
    pub id: String,
    pub message: String,
}

impl BatchItemError {
    pub fn new(id: impl Into<String>, message: impl ToString) -> Self {
        Self {
            id: id.into(),
            message: message.to_string(),
        }
    }
}

/// Found / not found / failed partition of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub found: Vec<FoundRecord>,
    pub not_found: Vec<String>,
    pub errors: Vec<BatchItemError>,
}

impl BatchOutcome {
    /// Number of ids accounted for.
    pub fn total(&self) -> usize {
        self.found.len() + self.not_found.len() + self.errors.len()
    }

    pub fn push_found(&mut self, id: impl Into<String>, record: &Arc<Record>) {
        self.found.push(FoundRecord {
            id: id.into(),
            record: Record::clone(record),
        });
    }

    /// Append another outcome's lists.
    pub fn merge(&mut self, other: BatchOutcome) {
        self.found.extend(other.found);
        self.not_found.extend(other.not_found);
        self.errors.extend(other.errors);
    }
}

/// What a smart load did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartLoadReport {
    /// Distinct partitions the ids routed to.
    pub requested_partitions: Vec<String>,
    /// Partitions read from the backing store by this call.
    pub loaded: Vec<String>,
    /// Partitions that were already in the cache.
    pub already_loaded: Vec<String>,
    /// Partitions whose read failed, with the reason.
    pub failed: Vec<(String, String)>,
    /// Ids that did not route to any partition.
    pub unroutable: Vec<String>,
}

impl SmartLoadReport {
    /// Failure reason for `partition`, if its load failed.
    pub fn failure_for(&self, partition: &str) -> Option<&str> {
        self.failed
            .iter()
            .find(|(name, _)| name == partition)
            .map(|(_, reason)| reason.as_str())
    }
}

/// Result of a full load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub total_records: usize,
    pub partitions_loaded: usize,
    /// Partitions whose read failed and contributed nothing.
    pub failed_partitions: Vec<String>,
}

/// Cached batch lookup result with the smart load that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedBatch {
    pub outcome: BatchOutcome,
    pub load_report: SmartLoadReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_constructors() {
        assert!(!LookupResult::not_found().found);
        assert!(LookupResult::not_found().error.is_none());
        let failed = LookupResult::failed("registry down");
        assert!(!failed.found);
        assert_eq!(failed.error.as_deref(), Some("registry down"));
    }

    #[test]
    fn test_outcome_merge_and_total() {
        let mut a = BatchOutcome {
            not_found: vec!["x".to_string()],
            ..Default::default()
        };
        let b = BatchOutcome {
            not_found: vec!["y".to_string()],
            errors: vec![BatchItemError::new("z", "boom")],
            ..Default::default()
        };
        a.merge(b);
        assert_eq!(a.total(), 3);
        assert_eq!(a.errors[0].message, "boom");
    }

    #[test]
    fn test_failure_for() {
        let report = SmartLoadReport {
            failed: vec![("students_cse_1".to_string(), "timeout".to_string())],
            ..Default::default()
        };
        assert_eq!(report.failure_for("students_cse_1"), Some("timeout"));
        assert_eq!(report.failure_for("students_it_1"), None);
    }
}
