//! The query cache store.
//!
//! One entry per [`QueryKey`]. The store is an explicit object shared by
//! `Arc`, guarded by a short-held mutex that is never held across an
//! `.await`: the client asks the store what to do, awaits the transport
//! outside the lock, then reports the result back with [`QueryCache::settle`].
//!
//! Ordering within a key is by fetch sequence. A result is applied only if
//! its sequence is newer than the last applied one, so a slow older fetch
//! can never overwrite a newer answer.

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};
use weft_core::{CacheError, KeyScope, QueryKey, StaleClass, WeftResult};

use crate::freshness::{QueryRead, QuerySnapshot, QueryStatus, Staleness};

/// Entries kept before the least-recently-used idle entry is evicted.
pub const DEFAULT_MAX_ENTRIES: usize = 2_000;

pub(crate) type SharedFetch = Shared<BoxFuture<'static, WeftResult<Value>>>;

/// Configuration for the query cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Upper bound on cached keys.
    pub max_entries: usize,
    /// Freshness windows per staleness class.
    pub staleness: Staleness,
    /// Refetch watched keys in the background after they are invalidated.
    pub refetch_active_on_invalidate: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            staleness: Staleness::default(),
            refetch_active_on_invalidate: true,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entry bound.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Replace all staleness windows.
    pub fn with_staleness(mut self, staleness: Staleness) -> Self {
        self.staleness = staleness;
        self
    }

    /// Replace the window of one class.
    pub fn with_window(mut self, class: StaleClass, window: Duration) -> Self {
        self.staleness = self.staleness.with_window(class, window);
        self
    }

    /// Enable or disable background refetch of watched keys.
    pub fn with_refetch_active(mut self, enabled: bool) -> Self {
        self.refetch_active_on_invalidate = enabled;
        self
    }
}

/// Counters for cache behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered from a fresh entry.
    pub hits: u64,
    /// Reads that started a transport call.
    pub misses: u64,
    /// Reads that joined a fetch already in flight.
    pub shared: u64,
    /// Entries marked stale by invalidation.
    pub invalidations: u64,
    /// Entries dropped to stay within the bound.
    pub evictions: u64,
    /// Entries currently cached.
    pub entries: u64,
}

impl CacheStats {
    /// Fraction of reads answered without a new transport call.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.shared + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits + self.shared) as f64 / total as f64
        }
    }
}

struct InFlight {
    seq: u64,
    fetch: SharedFetch,
    /// Reads currently awaiting `fetch`.
    waiters: usize,
}

struct CacheEntry {
    data: Option<Value>,
    cached_at: Option<DateTime<Utc>>,
    fresh_until: Option<Instant>,
    invalidated: bool,
    error: Option<weft_core::WeftError>,
    in_flight: Option<InFlight>,
    applied_seq: u64,
    /// Newest sequence issued when the entry was last invalidated.
    invalidated_seq: u64,
    last_used: u64,
    watchers: watch::Sender<QuerySnapshot>,
}

impl CacheEntry {
    fn new(tick: u64) -> Self {
        let (watchers, _) = watch::channel(QuerySnapshot::idle());
        Self {
            data: None,
            cached_at: None,
            fresh_until: None,
            invalidated: false,
            error: None,
            in_flight: None,
            applied_seq: 0,
            invalidated_seq: 0,
            last_used: tick,
            watchers,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        !self.invalidated
            && self.error.is_none()
            && self.data.is_some()
            && self.fresh_until.is_some_and(|until| now < until)
    }

    fn fresh_read(&self, now: Instant) -> Option<QueryRead<Value>> {
        if !self.is_fresh(now) {
            return None;
        }
        let data = self.data.clone()?;
        let cached_at = self.cached_at?;
        Some(QueryRead::from_cache(data, cached_at))
    }

    fn status(&self, now: Instant) -> QueryStatus {
        if self.in_flight.is_some() {
            QueryStatus::Fetching
        } else if self.error.is_some() {
            QueryStatus::Error
        } else if self.data.is_none() {
            QueryStatus::Idle
        } else if self.is_fresh(now) {
            QueryStatus::Fresh
        } else {
            QueryStatus::Stale
        }
    }

    fn snapshot(&self, now: Instant) -> QuerySnapshot {
        QuerySnapshot {
            status: self.status(now),
            data: self.data.clone(),
            error: self.error.clone(),
            cached_at: self.cached_at,
        }
    }

    fn publish(&self, now: Instant) {
        self.watchers.send_replace(self.snapshot(now));
    }

    fn is_watched(&self) -> bool {
        self.watchers.receiver_count() > 0
    }

    /// Watched and previously loaded, so a screen is showing it.
    fn is_active(&self) -> bool {
        self.is_watched() && (self.data.is_some() || self.error.is_some())
    }

    fn is_evictable(&self) -> bool {
        self.in_flight.is_none() && !self.is_watched()
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    next_seq: u64,
    tick: u64,
    stats: CacheStats,
}

impl CacheState {
    fn touch(&mut self, key: &QueryKey, max_entries: usize) -> &mut CacheEntry {
        self.tick += 1;
        let tick = self.tick;
        if !self.entries.contains_key(key) {
            evict_lru(&mut self.entries, &mut self.stats, max_entries);
        }
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(tick));
        entry.last_used = tick;
        entry
    }
}

fn evict_lru(
    entries: &mut HashMap<QueryKey, CacheEntry>,
    stats: &mut CacheStats,
    max_entries: usize,
) {
    while entries.len() >= max_entries {
        let victim = entries
            .iter()
            .filter(|(_, entry)| entry.is_evictable())
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        // Every entry is busy or watched: allow the bound to be exceeded.
        let Some(victim) = victim else { break };
        entries.remove(&victim);
        stats.evictions += 1;
        debug!(key = %victim, "evicted");
    }
}

/// What a read should do next.
pub(crate) enum Lookup {
    /// A fresh entry answered it.
    Hit(QueryRead<Value>),
    /// Await `fetch`, then report it with `seq`.
    Pending { seq: u64, fetch: SharedFetch },
}

/// Keyed cache of read results.
pub struct QueryCache {
    config: CacheConfig,
    state: Mutex<CacheState>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheState>, CacheError> {
        self.state.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn window(&self, key: &QueryKey) -> Duration {
        key.operation()
            .stale_class()
            .map(|class| self.config.staleness.window(class))
            .unwrap_or(Duration::ZERO)
    }

    /// Decide how to answer a read of `key`.
    ///
    /// Returns a fresh hit, joins the fetch in flight, or registers a new
    /// fetch built by `start`. `force` skips both the hit and the join.
    pub(crate) fn begin<F>(&self, key: &QueryKey, force: bool, start: F) -> Result<Lookup, CacheError>
    where
        F: FnOnce() -> BoxFuture<'static, WeftResult<Value>>,
    {
        let now = Instant::now();
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let max_entries = self.config.max_entries;
        let entry = state.touch(key, max_entries);

        if !force {
            if let Some(read) = entry.fresh_read(now) {
                state.stats.hits += 1;
                debug!(key = %key, "cache hit");
                return Ok(Lookup::Hit(read));
            }
            if let Some(in_flight) = &mut entry.in_flight {
                in_flight.waiters += 1;
                let (seq, fetch) = (in_flight.seq, in_flight.fetch.clone());
                state.stats.shared += 1;
                debug!(key = %key, seq, "joined in-flight fetch");
                return Ok(Lookup::Pending { seq, fetch });
            }
        }

        state.next_seq += 1;
        let seq = state.next_seq;
        let fetch = start().shared();
        let entry = state.touch(key, max_entries);
        entry.in_flight = Some(InFlight {
            seq,
            fetch: fetch.clone(),
            waiters: 1,
        });
        entry.publish(now);
        state.stats.misses += 1;
        debug!(key = %key, seq, force, "fetch started");
        Ok(Lookup::Pending { seq, fetch })
    }

    /// Record the outcome of fetch `seq` for `key`.
    ///
    /// Results older than the newest applied one are dropped. A fetch that
    /// started before the last invalidation still stores its value, but the
    /// entry stays stale.
    pub(crate) fn settle(
        &self,
        key: &QueryKey,
        seq: u64,
        result: &WeftResult<Value>,
    ) -> Result<(), CacheError> {
        let now = Instant::now();
        let window = self.window(key);
        let mut guard = self.lock()?;
        let Some(entry) = guard.entries.get_mut(key) else {
            return Ok(());
        };
        if entry.in_flight.as_ref().is_some_and(|f| f.seq == seq) {
            entry.in_flight = None;
        }
        if seq <= entry.applied_seq {
            debug!(key = %key, seq, applied = entry.applied_seq, "superseded result dropped");
            entry.publish(now);
            return Ok(());
        }
        entry.applied_seq = seq;
        match result {
            Ok(value) => {
                entry.data = Some(value.clone());
                entry.cached_at = Some(Utc::now());
                entry.fresh_until = Some(now + window);
                entry.invalidated = seq <= entry.invalidated_seq;
                entry.error = None;
            }
            Err(err) => {
                warn!(key = %key, error = %err, "fetch failed, keeping last good data");
                entry.error = Some(err.clone());
            }
        }
        entry.publish(now);
        Ok(())
    }

    /// A read of fetch `seq` stopped waiting.
    ///
    /// When the last waiter of a still-pending fetch goes away, the fetch is
    /// dropped and its late result ignored. The entry falls back to its
    /// previous status and becomes evictable again.
    pub(crate) fn release(&self, key: &QueryKey, seq: u64) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut guard = self.lock()?;
        let Some(entry) = guard.entries.get_mut(key) else {
            return Ok(());
        };
        let remaining = match entry.in_flight.as_mut() {
            Some(in_flight) if in_flight.seq == seq => {
                in_flight.waiters = in_flight.waiters.saturating_sub(1);
                in_flight.waiters
            }
            _ => return Ok(()),
        };
        if remaining == 0 {
            entry.in_flight = None;
            entry.publish(now);
            debug!(key = %key, seq, "fetch abandoned");
        }
        Ok(())
    }

    /// Mark every entry within `scope` stale and drop its in-flight fetch.
    ///
    /// Returns the affected keys, flagged with whether a screen is watching.
    pub(crate) fn invalidate(&self, scope: &KeyScope) -> Result<Vec<(QueryKey, bool)>, CacheError> {
        let now = Instant::now();
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let marker = state.next_seq;
        let mut touched = Vec::new();
        for (key, entry) in state.entries.iter_mut().filter(|(key, _)| scope.contains(key)) {
            entry.invalidated = true;
            entry.invalidated_seq = marker;
            entry.in_flight = None;
            entry.publish(now);
            touched.push((key.clone(), entry.is_active()));
        }
        state.stats.invalidations += touched.len() as u64;
        debug!(scope = %scope, count = touched.len(), "invalidated");
        Ok(touched)
    }

    /// Current view of `key`. Unknown keys are idle.
    pub fn snapshot(&self, key: &QueryKey) -> Result<QuerySnapshot, CacheError> {
        let now = Instant::now();
        let guard = self.lock()?;
        Ok(guard
            .entries
            .get(key)
            .map(|entry| entry.snapshot(now))
            .unwrap_or_default())
    }

    /// Subscribe to snapshots of `key`. Holding the receiver keeps the key
    /// active and exempt from eviction.
    pub fn watch(&self, key: &QueryKey) -> Result<watch::Receiver<QuerySnapshot>, CacheError> {
        let now = Instant::now();
        let mut guard = self.lock()?;
        let entry = guard.touch(key, self.config.max_entries);
        entry.publish(now);
        Ok(entry.watchers.subscribe())
    }

    pub fn contains(&self, key: &QueryKey) -> Result<bool, CacheError> {
        Ok(self.lock()?.entries.contains_key(key))
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.lock()?.entries.is_empty())
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let guard = self.lock()?;
        Ok(CacheStats {
            entries: guard.entries.len() as u64,
            ..guard.stats
        })
    }

    /// Drop every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let mut guard = self.lock()?;
        let count = guard.entries.len();
        guard.entries.clear();
        debug!(count, "cache cleared");
        Ok(count)
    }
}
