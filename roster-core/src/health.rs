//! Health reporting for the directory

use serde::{Deserialize, Serialize};

/// Health status for the directory or one of its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Cache is fresh and the last full refresh succeeded
    Healthy,
    /// Lookups work but will go to the backing store (cold or stale cache)
    Degraded,
    /// The last full refresh failed
    Unhealthy,
}

/// Health check result for a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub component: String,
    pub message: Option<String>,
    /// Records currently held by the cache
    pub cached_records: usize,
    /// Age of the last full refresh, if any
    pub cache_age_ms: Option<i64>,
}

impl HealthCheck {
    /// Create a healthy check result.
    pub fn healthy(component: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Healthy, component, None)
    }

    /// Create a degraded check result.
    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Degraded, component, Some(message.into()))
    }

    /// Create an unhealthy check result.
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Unhealthy, component, Some(message.into()))
    }

    fn with_status(status: HealthStatus, component: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status,
            component: component.into(),
            message,
            cached_records: 0,
            cache_age_ms: None,
        }
    }

    /// Attach cache figures.
    pub fn with_cache(mut self, cached_records: usize, cache_age_ms: Option<i64>) -> Self {
        self.cached_records = cached_records;
        self.cache_age_ms = cache_age_ms;
        self
    }

    /// Whether lookups can still be served.
    pub fn is_operational(&self) -> bool {
        self.status != HealthStatus::Unhealthy
    }
}
