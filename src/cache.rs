//! In-memory cache-and-revalidate store for per-user query results.
//!
//! Entries are keyed by `(user id, key string)`. A fresh entry is served as a
//! shared `Arc`; a missing or stale one is reloaded. Loads for the same key
//! are serialised through a per-key slot so concurrent callers share a
//! single store round trip. Failed loads leave the slot empty.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::AppResult;

pub const CATEGORIES: &str = "categories";
pub const PAYMENT_METHODS: &str = "payment_methods";
pub const FIXED_EXPENSES: &str = "fixed_expenses";
const TRANSACTIONS_PREFIX: &str = "transactions-";

/// `transactions-{year}-{month}` with a 1-based month.
pub fn transactions_key(year: i32, month: u32) -> String {
    format!("{TRANSACTIONS_PREFIX}{year}-{month}")
}

type CacheKey = (i64, String);
type Value = Arc<dyn Any + Send + Sync>;

struct Entry {
    value: Value,
    loaded_at: Instant,
}

#[derive(Default)]
struct Slot {
    entry: Mutex<Option<Entry>>,
}

impl Slot {
    /// Nobody else holds the slot and it has nothing fresh to serve. A slot
    /// whose load is in flight is locked, so it is kept.
    fn is_idle_and_stale(slot: &Arc<Slot>, ttl: Duration) -> bool {
        if Arc::strong_count(slot) > 1 {
            return false;
        }
        match slot.entry.try_lock() {
            Ok(entry) => entry
                .as_ref()
                .is_none_or(|current| current.loaded_at.elapsed() >= ttl),
            Err(_) => false,
        }
    }
}

pub struct QueryCache {
    ttl: Duration,
    slots: Mutex<HashMap<CacheKey, Arc<Slot>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // poisoned slots still hold consistent data
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Looks up the slot for `key`. Creating a new one first sweeps out
    /// expired slots, so the map only holds keys still being read.
    fn slot(&self, user_id: i64, key: &str) -> Arc<Slot> {
        let mut slots = lock(&self.slots);
        let cache_key = (user_id, key.to_string());
        if let Some(slot) = slots.get(&cache_key) {
            return Arc::clone(slot);
        }
        let before = slots.len();
        slots.retain(|_, slot| !Slot::is_idle_and_stale(slot, self.ttl));
        if slots.len() < before {
            tracing::debug!(evicted = before - slots.len(), "expired cache slots evicted");
        }
        Arc::clone(slots.entry(cache_key).or_default())
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        lock(&self.slots).len()
    }

    /// Returns the cached value for `key`, running `loader` when the entry is
    /// missing or older than the TTL.
    pub fn fetch<T, F>(&self, user_id: i64, key: &str, loader: F) -> AppResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> AppResult<T>,
    {
        let slot = self.slot(user_id, key);
        let mut entry = lock(&slot.entry);

        if let Some(current) = entry.as_ref() {
            if current.loaded_at.elapsed() < self.ttl {
                if let Ok(value) = Arc::clone(&current.value).downcast::<T>() {
                    return Ok(value);
                }
            }
        }

        tracing::debug!(user_id, key, "cache miss");
        let value = Arc::new(loader()?);
        *entry = Some(Entry {
            value: value.clone(),
            loaded_at: Instant::now(),
        });
        Ok(value)
    }

    pub fn invalidate(&self, user_id: i64, key: &str) {
        let removed = lock(&self.slots).remove(&(user_id, key.to_string()));
        if removed.is_some() {
            tracing::debug!(user_id, key, "cache invalidated");
        }
    }

    /// Drops every `transactions-*` entry of the user.
    pub fn invalidate_transactions(&self, user_id: i64) {
        let mut slots = lock(&self.slots);
        let before = slots.len();
        slots.retain(|(owner, key), _| !(*owner == user_id && key.starts_with(TRANSACTIONS_PREFIX)));
        tracing::debug!(user_id, dropped = before - slots.len(), "transaction months invalidated");
    }

    pub fn contains(&self, user_id: i64, key: &str) -> bool {
        let Some(slot) = lock(&self.slots).get(&(user_id, key.to_string())).cloned() else {
            return false;
        };
        lock(&slot.entry).is_some()
    }
}
