//! In-memory memoization cache with pluggable eviction.
//!
//! Shared between the UI thread and the worker, so the map sits behind a
//! `Mutex`. Values are cloned out; store `Arc`s for anything large.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// How the cache makes room for new entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eviction {
    /// Keep everything for the life of the cache.
    Unbounded,
    /// Drop the least recently used entry once `capacity` is reached.
    Lru { capacity: usize },
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct MemoInner<K, V> {
    entries: HashMap<K, V>,
    /// Keys from least to most recently used. Only maintained for LRU.
    order: VecDeque<K>,
}

/// Thread-safe memo table keyed by call arguments.
pub struct MemoCache<K, V> {
    inner: Mutex<MemoInner<K, V>>,
    eviction: Eviction,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(eviction: Eviction) -> Self {
        Self {
            inner: Mutex::new(MemoInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            eviction,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(Eviction::Unbounded)
    }

    pub fn lru(capacity: usize) -> Self {
        Self::new(Eviction::Lru { capacity })
    }

    pub fn eviction(&self) -> Eviction {
        self.eviction
    }

    fn lock(&self) -> MutexGuard<'_, MemoInner<K, V>> {
        // Entries are only ever inserted whole, so a poisoned map is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, marking it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        match inner.entries.get(key).cloned() {
            Some(value) => {
                if let Eviction::Lru { .. } = self.eviction {
                    touch(&mut inner.order, key);
                }
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or replace `key`, evicting the oldest entries if over capacity.
    pub fn insert(&self, key: K, value: V) {
        let mut inner = self.lock();
        match self.eviction {
            Eviction::Unbounded => {
                inner.entries.insert(key, value);
            }
            Eviction::Lru { capacity } => {
                if capacity == 0 {
                    return;
                }
                if inner.entries.insert(key.clone(), value).is_some() {
                    touch(&mut inner.order, &key);
                } else {
                    inner.order.push_back(key);
                }
                while inner.entries.len() > capacity {
                    match inner.order.pop_front() {
                        Some(oldest) => {
                            inner.entries.remove(&oldest);
                        }
                        None => break,
                    }
                }
            }
        }
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// The lock is not held while `compute` runs. Errors are returned as-is and
    /// nothing is stored for them.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Infallible form of [`get_or_try_insert_with`](Self::get_or_try_insert_with).
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        match self.get_or_try_insert_with(key, || Ok::<V, Infallible>(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

fn touch<K: Eq + Clone>(order: &mut VecDeque<K>, key: &K) {
    if let Some(pos) = order.iter().position(|k| k == key) {
        if let Some(k) = order.remove(pos) {
            order.push_back(k);
        }
    }
}
