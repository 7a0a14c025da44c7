//! TTL cache with per-key request coalescing and failure cooldown.
//!
//! Each key owns a slot behind its own mutex. A caller that misses holds the
//! slot lock while it runs the producer, so concurrent callers for the same
//! key queue on that slot and read the fresh result instead of fetching again.
//! The map lock is held only to look up or create a slot, never during a
//! fetch, so unrelated instruments never wait on each other.
//!
//! Successful results live for the cache TTL. Remote failures are cached for
//! the shorter failure cooldown, during which the key resolves to `NoSignal`
//! without touching the network.

use super::key::CacheKey;
use crate::client::SignalError;
use crate::domain::CalcResponse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Map size at which expired slots are swept before a new one is added.
const PURGE_THRESHOLD: usize = 256;

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Last outcome for a key and when it was obtained.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub outcome: Result<CalcResponse, SignalError>,
    pub obtained_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, cooldown: Duration) -> bool {
        let lifetime = if self.outcome.is_ok() { ttl } else { cooldown };
        self.obtained_at.elapsed() < lifetime
    }
}

/// Counters for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Resolved from a fresh success entry.
    pub hits: u64,
    /// Resolved from a fresh failure entry (cooldown).
    pub suppressed: u64,
    /// Producer invocations.
    pub fetches: u64,
    /// Producer invocations that failed.
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    suppressed: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
}

/// Process-lifetime signal cache. Never persisted.
#[derive(Debug)]
pub struct SignalCache {
    ttl: Duration,
    cooldown: Duration,
    slots: Mutex<HashMap<CacheKey, Slot>>,
    counters: Counters,
}

impl SignalCache {
    pub fn new(ttl: Duration, cooldown: Duration) -> Self {
        Self {
            ttl,
            cooldown,
            slots: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Resolve `key`, running `producer` only on a miss or expiry.
    ///
    /// Every failure comes back as `NoSignal`.
    pub fn get_or_fetch<F>(&self, key: CacheKey, producer: F) -> CalcResponse
    where
        F: FnOnce() -> Result<CalcResponse, SignalError>,
    {
        self.resolve(key, producer).unwrap_or(CalcResponse::NoSignal)
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch) but reports the failure that
    /// produced a `NoSignal`, whether fresh or cached.
    pub fn resolve<F>(&self, key: CacheKey, producer: F) -> Result<CalcResponse, SignalError>
    where
        F: FnOnce() -> Result<CalcResponse, SignalError>,
    {
        let arrived = Instant::now();
        let slot = self.slot(&key);
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);

        // An outcome stored after we arrived came from the fetch we queued
        // behind, and is shared whatever the lifetimes are.
        if let Some(cached) = entry.as_ref() {
            if cached.obtained_at >= arrived || cached.is_fresh(self.ttl, self.cooldown) {
                let counter = if cached.outcome.is_ok() {
                    &self.counters.hits
                } else {
                    &self.counters.suppressed
                };
                counter.fetch_add(1, Ordering::Relaxed);
                return cached.outcome.clone();
            }
        }

        self.counters.fetches.fetch_add(1, Ordering::Relaxed);
        let outcome = producer();

        if let Err(err) = &outcome {
            self.counters.failures.fetch_add(1, Ordering::Relaxed);
            if !err.throttles() {
                return outcome;
            }
            debug!(
                instrument = %key.instrument,
                error = %err,
                cooldown_ms = self.cooldown.as_millis() as u64,
                "caching failure"
            );
        }

        *entry = Some(CacheEntry {
            outcome: outcome.clone(),
            obtained_at: Instant::now(),
        });
        outcome
    }

    /// Current entry for `key`, fresh or not, without fetching.
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        let slot = self.lock_slots().get(key).cloned()?;
        let entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        entry.clone()
    }

    /// Drop every slot that is idle and no longer fresh.
    pub fn purge_expired(&self) {
        let mut slots = self.lock_slots();
        self.sweep(&mut slots);
    }

    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            suppressed: self.counters.suppressed.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &CacheKey) -> Slot {
        let mut slots = self.lock_slots();
        if let Some(slot) = slots.get(key) {
            return Arc::clone(slot);
        }
        if slots.len() >= PURGE_THRESHOLD {
            self.sweep(&mut slots);
        }
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    fn sweep(&self, slots: &mut HashMap<CacheKey, Slot>) {
        let before = slots.len();
        slots.retain(|_, slot| {
            // Someone outside the map holds it: in use, keep.
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            let entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
            entry
                .as_ref()
                .is_some_and(|e| e.is_fresh(self.ttl, self.cooldown))
        });
        if slots.len() < before {
            debug!(
                removed = before - slots.len(),
                remaining = slots.len(),
                "purged expired cache slots"
            );
        }
    }
}
