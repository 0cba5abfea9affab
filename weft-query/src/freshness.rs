//! Staleness windows and the read-side view of a cached key.
//!
//! Every read belongs to a [`StaleClass`]; [`Staleness`] maps the class to
//! the window a cached result stays `Fresh` for. [`QuerySnapshot`] is what a
//! screen renders, including the last good data while a refetch fails.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use weft_core::{StaleClass, WeftError};

/// Freshness windows per staleness class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Staleness {
    pub live: Duration,
    pub analytical: Duration,
    pub reference: Duration,
}

impl Default for Staleness {
    fn default() -> Self {
        Self {
            live: Duration::from_secs(30),
            analytical: Duration::from_secs(60),
            reference: Duration::from_secs(300),
        }
    }
}

impl Staleness {
    /// Window a result of `class` stays fresh for.
    pub fn window(&self, class: StaleClass) -> Duration {
        match class {
            StaleClass::Live => self.live,
            StaleClass::Analytical => self.analytical,
            StaleClass::Reference => self.reference,
        }
    }

    /// Replace the window of one class.
    pub fn with_window(mut self, class: StaleClass, window: Duration) -> Self {
        match class {
            StaleClass::Live => self.live = window,
            StaleClass::Analytical => self.analytical = window,
            StaleClass::Reference => self.reference = window,
        }
        self
    }
}

/// Lifecycle of one query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// Known key, nothing fetched yet.
    Idle,
    /// A fetch is in flight. Earlier data, if any, is still available.
    Fetching,
    /// Data within its staleness window.
    Fresh,
    /// Window elapsed or an invalidation targeted the key.
    Stale,
    /// The most recent fetch failed. Earlier data is kept.
    Error,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Fetching => "fetching",
            QueryStatus::Fresh => "fresh",
            QueryStatus::Stale => "stale",
            QueryStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a cached key.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    /// Last successfully fetched payload.
    pub data: Option<Value>,
    /// Failure of the most recent fetch, cleared by the next success.
    pub error: Option<WeftError>,
    /// When `data` was stored.
    pub cached_at: Option<DateTime<Utc>>,
}

impl Default for QuerySnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

impl QuerySnapshot {
    pub fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            cached_at: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// True when the screen should show data alongside an error banner.
    pub fn is_stale_while_error(&self) -> bool {
        self.status == QueryStatus::Error && self.data.is_some()
    }
}

/// Result of a read, carrying where it came from.
///
/// Returned by typed fetches so callers can tell a cache hit from a
/// round-trip and see how old the data is.
#[derive(Debug, Clone)]
pub struct QueryRead<T> {
    value: T,
    cached_at: DateTime<Utc>,
    was_cache_hit: bool,
}

impl<T> QueryRead<T> {
    /// A read answered from the cache.
    pub fn from_cache(value: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            value,
            cached_at,
            was_cache_hit: true,
        }
    }

    /// A read answered by the transport.
    pub fn from_transport(value: T) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            was_cache_hit: false,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    /// Age of the data relative to now.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.cached_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Convert the value, keeping the metadata.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<QueryRead<U>, E> {
        Ok(QueryRead {
            value: f(self.value)?,
            cached_at: self.cached_at,
            was_cache_hit: self.was_cache_hit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_windows() {
        let staleness = Staleness::default();
        assert_eq!(staleness.window(StaleClass::Live), Duration::from_secs(30));
        assert_eq!(staleness.window(StaleClass::Analytical), Duration::from_secs(60));
        assert_eq!(staleness.window(StaleClass::Reference), Duration::from_secs(300));
    }

    #[test]
    fn test_with_window_replaces_one_class() {
        let staleness =
            Staleness::default().with_window(StaleClass::Live, Duration::from_secs(5));
        assert_eq!(staleness.live, Duration::from_secs(5));
        assert_eq!(staleness.reference, Duration::from_secs(300));
    }

    #[test]
    fn test_stale_while_error() {
        let snapshot = QuerySnapshot {
            status: QueryStatus::Error,
            data: Some(json!([1])),
            error: None,
            cached_at: Some(Utc::now()),
        };
        assert!(snapshot.is_stale_while_error());
        assert!(!QuerySnapshot::idle().is_stale_while_error());
    }

    #[test]
    fn test_query_read_map_keeps_metadata() {
        let cached_at = Utc::now();
        let read = QueryRead::from_cache(json!(3), cached_at);
        let mapped: QueryRead<i64> = read
            .try_map(|v| v.as_i64().ok_or("not a number"))
            .unwrap();
        assert_eq!(*mapped.value(), 3);
        assert!(mapped.was_cache_hit());
        assert_eq!(mapped.cached_at(), cached_at);
        assert!(!QueryRead::from_transport(()).was_cache_hit());
    }
}
