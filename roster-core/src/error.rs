//! Error types for roster operations

use thiserror::Error;

/// Identifier routing errors.
///
/// These never abort a search. An identifier that fails to route is sent to
/// the fallback scan instead of a targeted partition query.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Identifier {id:?} is too short: {len} characters, need at least {min}")]
    TooShort { id: String, len: usize, min: usize },

    #[error("Identifier {id:?} does not match the admission number grammar")]
    Malformed { id: String },

    #[error("Identifier {id:?} carries no known section code")]
    UnknownSection { id: String },
}

/// Backing store and partition registry errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Query on partition {partition} failed: {reason}")]
    QueryFailed { partition: String, reason: String },

    #[error("Partition {partition} is unavailable: {reason}")]
    Unavailable { partition: String, reason: String },

    #[error("Partition registry unavailable: {reason}")]
    RegistryUnavailable { reason: String },

    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },
}

impl StoreError {
    /// Partition the error refers to, if it is partition scoped.
    pub fn partition(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { partition, .. } | Self::Unavailable { partition, .. } => {
                Some(partition)
            }
            Self::RegistryUnavailable { .. } | Self::InvalidQuery { .. } => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all roster errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RosterError {
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load partition {partition}: {reason}")]
    PartitionLoad { partition: String, reason: String },

    #[error("Both search strategies failed: {primary}; fallback: {fallback}")]
    AllStrategiesFailed { primary: String, fallback: String },

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl RosterError {
    /// Build a partition load error from any displayable cause.
    pub fn partition_load(partition: impl Into<String>, reason: impl ToString) -> Self {
        Self::PartitionLoad {
            partition: partition.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;

/// Result type alias for backing store calls.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// TESTS
// =============================================================================
