//! Keyed collection of pools for one instance type.

use std::collections::BTreeMap;
use std::fmt;

use super::pool::{PoolStats, Pooled, Recycler};
use crate::error::CoreResult;

/// Pools of `T` addressed by key (one pool per recyclable kind).
///
/// Unknown keys are lookup misses: logged, never fatal.
pub struct PoolRegistry<T> {
    pools: BTreeMap<String, Box<dyn Recycler<T>>>,
}

impl<T> PoolRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { pools: BTreeMap::new() }
    }

    /// Registers a pool. An existing pool under `key` is kept.
    pub fn insert(&mut self, key: &str, pool: Box<dyn Recycler<T>>) -> bool {
        if self.pools.contains_key(key) {
            tracing::warn!("pool `{}` already registered; keeping original", key);
            return false;
        }
        self.pools.insert(key.to_owned(), pool);
        true
    }

    /// Returns true if a pool is registered under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.pools.contains_key(key)
    }

    /// Hands out an instance from the pool under `key`.
    ///
    /// Returns `Ok(None)` (and warns) when no such pool exists.
    ///
    /// # Errors
    ///
    /// Propagates the pool's capability failure.
    pub fn get(&mut self, key: &str) -> CoreResult<Option<Pooled<T>>> {
        match self.pools.get_mut(key) {
            Some(pool) => pool.acquire().map(Some),
            None => {
                tracing::warn!("no pool registered under `{}`", key);
                Ok(None)
            }
        }
    }

    /// Returns an instance to the pool under `key`.
    ///
    /// With no such pool the instance is dropped and `false` is returned.
    pub fn put(&mut self, key: &str, item: Pooled<T>) -> bool {
        match self.pools.get_mut(key) {
            Some(pool) => {
                pool.release(item);
                true
            }
            None => {
                tracing::warn!("no pool registered under `{}`; instance dropped", key);
                false
            }
        }
    }

    /// Counters of the pool under `key`.
    #[must_use]
    pub fn stats(&self, key: &str) -> Option<PoolStats> {
        self.pools.get(key).map(|pool| pool.stats())
    }

    /// Clears every pool.
    pub fn clear_all(&mut self) {
        for (key, pool) in &mut self.pools {
            tracing::debug!("clearing pool `{}` ({:?})", key, pool.stats());
            pool.clear();
        }
    }

    /// Registered keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }
}

impl<T> Default for PoolRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PoolRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.pools.iter().map(|(key, pool)| (key, pool.stats())))
            .finish()
    }
}
