//! Freshness tracking for full refreshes.
//!
//! Only a completed full load stamps the refresh time. Smart loads fill the
//! cache without making it fresh, so a partially warmed cache still reports
//! that it needs a refresh.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// When the cache was last fully refreshed, and how long that stays valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshState {
    last_full_refresh: Option<DateTime<Utc>>,
    interval: Duration,
}

impl RefreshState {
    /// A state that has never been refreshed.
    pub fn new(interval: Duration) -> Self {
        Self {
            last_full_refresh: None,
            interval,
        }
    }

    /// Time of the last completed full refresh.
    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_full_refresh
    }

    /// Validity window of a full refresh.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Record a completed full refresh.
    pub fn mark_refreshed(&mut self, at: DateTime<Utc>) {
        self.last_full_refresh = Some(at);
    }

    /// Forget the last refresh.
    pub fn reset(&mut self) {
        self.last_full_refresh = None;
    }

    /// Age of the last refresh as of `now`. Clock skew counts as zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_full_refresh
            .map(|at| (now - at).to_std().unwrap_or(Duration::ZERO))
    }

    /// Whether a full refresh is due as of `now`.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.age_at(now) {
            None => true,
            Some(age) => age > self.interval,
        }
    }

    /// Whether a full refresh is due now.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now())
    }
}
