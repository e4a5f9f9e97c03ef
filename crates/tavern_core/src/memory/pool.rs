//! # Object Pool
//!
//! Free-list recycler for instances that are expensive to build and tear
//! down (characters, props).
//!
//! ## Policy
//!
//! - `get`: pop the free-list; on a miss, build a new instance while
//!   `auto_expand` allows and `max_size` is not reached; otherwise hand out an
//!   untracked throwaway instance and warn.
//! - `put`: with `auto_shrink` on and the free-list already at
//!   `shrink_target`, destroy the instance; otherwise reset it and push it.
//!
//! Invariants: `size() <= total_size()`, and `total_size() <= max_size`
//! whenever `max_size > 0`.

use std::convert::Infallible;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::CoreResult;

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

/// Sizing policy of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Instances built up front.
    pub initial_size: usize,
    /// Build new instances on a miss.
    pub auto_expand: bool,
    /// Upper bound on tracked instances. `0` means unbounded.
    pub max_size: usize,
    /// Destroy returned instances once the free-list is large enough.
    pub auto_shrink: bool,
    /// Free-list length at which returned instances are destroyed.
    pub shrink_target: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: 8,
            auto_expand: true,
            max_size: 0,
            auto_shrink: false,
            shrink_target: 0,
        }
    }
}

/// Counters of a pool at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances waiting on the free-list.
    pub free: usize,
    /// Tracked instances (free plus checked out).
    pub total: usize,
    /// Tracked instances currently in use.
    pub checked_out: usize,
    /// Untracked instances handed out because the pool was exhausted.
    pub misses: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Origin {
    pool: u64,
    generation: u64,
}

/// An instance handed out by a pool.
///
/// Dereferences to the instance. Remembers whether the pool tracks it, so
/// returning an untracked or stale instance cannot corrupt the free-list.
pub struct Pooled<T> {
    value: T,
    origin: Option<Origin>,
}

impl<T> Pooled<T> {
    /// Wraps a value no pool tracks.
    pub fn untracked(value: T) -> Self {
        Self { value, origin: None }
    }

    /// Returns true if the issuing pool counts this instance.
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.origin.is_some()
    }

    /// Unwraps the instance. It can no longer be returned to a pool.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for Pooled<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for Pooled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field("tracked", &self.is_tracked())
            .field("value", &self.value)
            .finish()
    }
}

/// Common surface of every pool flavor.
pub trait Recycler<T> {
    /// Hands out an instance. Only capability checks can fail.
    fn acquire(&mut self) -> CoreResult<Pooled<T>>;
    /// Takes an instance back.
    fn release(&mut self, item: Pooled<T>);
    /// Destroys every free instance and resets the counters.
    fn clear(&mut self);
    /// Current counters.
    fn stats(&self) -> PoolStats;
}

/// Free-list, counters and hooks shared by [`ObjectPool`] and
/// [`TypedObjectPool`](super::TypedObjectPool).
pub(crate) struct PoolState<T> {
    name: String,
    id: u64,
    generation: u64,
    config: PoolConfig,
    free: Vec<T>,
    total: usize,
    misses: usize,
    reset: Option<Box<dyn FnMut(&mut T)>>,
    destroy: Option<Box<dyn FnMut(T)>>,
}

impl<T> PoolState<T> {
    pub(crate) fn new(name: String, config: PoolConfig) -> Self {
        Self {
            name,
            id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            generation: 0,
            config,
            free: Vec::with_capacity(config.initial_size),
            total: 0,
            misses: 0,
            reset: None,
            destroy: None,
        }
    }

    fn origin(&self) -> Origin {
        Origin { pool: self.id, generation: self.generation }
    }

    fn tracked(&self, value: T) -> Pooled<T> {
        Pooled { value, origin: Some(self.origin()) }
    }

    fn has_room(&self) -> bool {
        self.config.max_size == 0 || self.total < self.config.max_size
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub(crate) fn set_reset(&mut self, reset: Box<dyn FnMut(&mut T)>) {
        self.reset = Some(reset);
    }

    pub(crate) fn set_destroy(&mut self, destroy: Box<dyn FnMut(T)>) {
        self.destroy = Some(destroy);
    }

    /// Builds the initial instances, capped by `max_size`.
    pub(crate) fn prewarm<E>(&mut self, mut create: impl FnMut() -> Result<T, E>) -> Result<(), E> {
        let wanted = if self.config.max_size > 0 {
            self.config.initial_size.min(self.config.max_size)
        } else {
            self.config.initial_size
        };
        while self.total < wanted {
            let value = create()?;
            self.free.push(value);
            self.total += 1;
        }
        Ok(())
    }

    pub(crate) fn acquire_with<E>(&mut self, create: impl FnOnce() -> Result<T, E>) -> Result<Pooled<T>, E> {
        if let Some(value) = self.free.pop() {
            return Ok(self.tracked(value));
        }
        if self.config.auto_expand && self.has_room() {
            let value = create()?;
            self.total += 1;
            tracing::debug!("pool `{}`: expanded to {} instances", self.name, self.total);
            return Ok(self.tracked(value));
        }
        tracing::warn!(
            "pool `{}` exhausted ({} tracked, max {}); handing out an untracked instance",
            self.name,
            self.total,
            self.config.max_size
        );
        let value = create()?;
        self.misses += 1;
        Ok(Pooled::untracked(value))
    }

    pub(crate) fn release(&mut self, item: Pooled<T>) {
        let Pooled { mut value, origin } = item;
        if origin != Some(self.origin()) {
            tracing::warn!("pool `{}`: destroying an instance it does not track", self.name);
            self.destroy(value);
            return;
        }
        if self.config.auto_shrink && self.free.len() >= self.config.shrink_target {
            self.destroy(value);
            self.total -= 1;
            tracing::debug!("pool `{}`: shrunk to {} instances", self.name, self.total);
            return;
        }
        if let Some(reset) = self.reset.as_mut() {
            reset(&mut value);
        }
        self.free.push(value);
    }

    fn destroy(&mut self, value: T) {
        match self.destroy.as_mut() {
            Some(destroy) => destroy(value),
            None => drop(value),
        }
    }

    pub(crate) fn clear(&mut self) {
        let free: Vec<T> = self.free.drain(..).collect();
        for value in free {
            self.destroy(value);
        }
        self.total = 0;
        self.misses = 0;
        self.generation += 1;
    }

    pub(crate) fn stats(&self) -> PoolStats {
        PoolStats {
            free: self.free.len(),
            total: self.total,
            checked_out: self.total - self.free.len(),
            misses: self.misses,
        }
    }
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// A pool of instances built by a factory closure.
pub struct ObjectPool<T> {
    state: PoolState<T>,
    factory: Box<dyn FnMut() -> T>,
}

impl<T> ObjectPool<T> {
    /// Creates a pool and builds its initial instances.
    pub fn new(name: impl Into<String>, config: PoolConfig, factory: impl FnMut() -> T + 'static) -> Self {
        let mut pool = Self {
            state: PoolState::new(name.into(), config),
            factory: Box::new(factory),
        };
        let factory = &mut pool.factory;
        infallible(pool.state.prewarm(|| Ok(factory())));
        pool
    }

    /// Sets the hook run on every instance pushed back onto the free-list.
    #[must_use]
    pub fn with_reset(mut self, reset: impl FnMut(&mut T) + 'static) -> Self {
        self.state.set_reset(Box::new(reset));
        self
    }

    /// Sets the hook that destroys instances the pool lets go of.
    #[must_use]
    pub fn with_destroy(mut self, destroy: impl FnMut(T) + 'static) -> Self {
        self.state.set_destroy(Box::new(destroy));
        self
    }

    /// Hands out an instance. See the module docs for the miss policy.
    pub fn get(&mut self) -> Pooled<T> {
        let factory = &mut self.factory;
        infallible(self.state.acquire_with(|| Ok(factory())))
    }

    /// Takes an instance back.
    pub fn put(&mut self, item: Pooled<T>) {
        self.state.release(item);
    }

    /// Destroys every free instance and resets the counters.
    ///
    /// Instances checked out before the call become stale: returning them
    /// destroys them.
    pub fn clear(&mut self) {
        self.state.clear();
    }

    /// Free-list length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.state.stats().free
    }

    /// Free plus checked-out tracked instances.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.state.stats().total
    }

    /// Tracked instances currently in use.
    #[must_use]
    pub fn checked_out(&self) -> usize {
        self.state.stats().checked_out
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.state.stats()
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Sizing policy.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        self.state.config()
    }
}

impl<T> Recycler<T> for ObjectPool<T> {
    fn acquire(&mut self) -> CoreResult<Pooled<T>> {
        Ok(self.get())
    }

    fn release(&mut self, item: Pooled<T>) {
        self.put(item);
    }

    fn clear(&mut self) {
        ObjectPool::clear(self);
    }

    fn stats(&self) -> PoolStats {
        self.state.stats()
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("name", &self.state.name())
            .field("config", self.state.config())
            .field("stats", &self.state.stats())
            .finish_non_exhaustive()
    }
}
