//! In-memory calendar cache keyed by postal code.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::{Duration, Instant},
};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::calendar::CalendarDocument;

/// Source of the current instant, replaceable in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    document: CalendarDocument,
    /// `None` if the TTL is too large to be represented.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Calendars by postal code, each valid for a time-to-live.
///
/// An expired entry is never returned. It is dropped on the next access to its key or by
/// [`ScheduleCache::purge_expired`]. Concurrent misses for the same key are not coalesced.
#[derive(Debug)]
pub struct ScheduleCache<C = SystemClock> {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: C,
}

impl ScheduleCache<SystemClock> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C: Clock> ScheduleCache<C> {
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<CalendarDocument> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.document.clone()),
                Some(_) => {}
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have replaced the entry in between.
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            debug!(key, "evicted expired calendar");
        }
        None
    }

    /// Store `document` under `key` for `ttl`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, document: CalendarDocument, ttl: Duration) {
        let entry = CacheEntry {
            document,
            expires_at: self.clock.now().checked_add(ttl),
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    /// Store `document` under `key` for the cache's default TTL.
    pub fn insert(&self, key: impl Into<String>, document: CalendarDocument) {
        self.set(key, document, self.ttl);
    }

    /// Remove every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Clock + 'static> ScheduleCache<C> {
    /// Purge expired entries every `period` until the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    info!(purged, remaining = cache.len(), "swept expired calendars");
                }
            }
        })
    }
}
