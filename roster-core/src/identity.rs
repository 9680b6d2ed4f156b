//! Identity types for roster entities

use chrono::{DateTime, Utc};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Admission number. Structured, routable to exactly one partition.
pub type PrimaryKey = String;

/// Roll number. Unstructured, cannot be routed without a full load.
pub type SecondaryKey = String;

/// Name of a backing collection holding one section's records.
pub type PartitionName = String;

/// Normalize a raw identifier as received from callers.
///
/// Surrounding whitespace is dropped; the identifier is otherwise kept as is.
pub fn normalize_identifier(raw: &str) -> &str {
    raw.trim()
}
