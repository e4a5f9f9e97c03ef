//! # Typed Object Pool
//!
//! A pool whose instances are guaranteed to carry a required capability.
//!
//! Every freshly built instance is checked; a missing capability is attached
//! through [`Capable::attach_capability`]. If it is still missing afterwards
//! the build fails with [`CoreError::MissingCapability`] and the instance is
//! discarded. Callers never receive a broken instance.

use std::fmt;
use std::marker::PhantomData;

use super::pool::{PoolConfig, PoolState, PoolStats, Pooled, Recycler};
use crate::error::{CoreError, CoreResult};

/// An instance that may carry an auxiliary capability `C`.
pub trait Capable<C: ?Sized> {
    /// The capability, if present.
    fn capability(&self) -> Option<&C>;

    /// Attaches a default capability. Returns `false` if that is impossible.
    fn attach_capability(&mut self) -> bool;
}

struct Missing;

fn build<T, C, F>(factory: &mut F) -> Result<T, Missing>
where
    T: Capable<C>,
    C: ?Sized,
    F: FnMut() -> T + ?Sized,
{
    let mut value = factory();
    if value.capability().is_none() && !value.attach_capability() {
        return Err(Missing);
    }
    if value.capability().is_none() {
        return Err(Missing);
    }
    Ok(value)
}

/// A pool of `T` where every instance carries a `C`.
pub struct TypedObjectPool<T, C: ?Sized> {
    state: PoolState<T>,
    factory: Box<dyn FnMut() -> T>,
    _capability: PhantomData<fn(&C)>,
}

impl<T, C> TypedObjectPool<T, C>
where
    T: Capable<C>,
    C: ?Sized,
{
    /// Creates a pool and builds its initial instances.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingCapability`] if a prewarmed instance lacks
    /// the capability and it cannot be attached.
    pub fn new(
        name: impl Into<String>,
        config: PoolConfig,
        factory: impl FnMut() -> T + 'static,
    ) -> CoreResult<Self> {
        let mut pool = Self {
            state: PoolState::new(name.into(), config),
            factory: Box::new(factory),
            _capability: PhantomData,
        };
        let factory = &mut pool.factory;
        let prewarmed = pool.state.prewarm(|| build::<T, C, _>(factory));
        if prewarmed.is_err() {
            return Err(pool.missing());
        }
        Ok(pool)
    }

    fn missing(&self) -> CoreError {
        let error = CoreError::MissingCapability {
            pool: self.state.name().to_owned(),
            capability: std::any::type_name::<C>(),
        };
        tracing::error!("{}", error);
        error
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

    /// Hands out an instance carrying the capability.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingCapability`] when a newly built instance
    /// cannot be given the capability.
    pub fn get(&mut self) -> CoreResult<Pooled<T>> {
        let factory = &mut self.factory;
        match self.state.acquire_with(|| build::<T, C, _>(factory)) {
            Ok(item) => Ok(item),
            Err(Missing) => Err(self.missing()),
        }
    }

    /// Takes an instance back.
    pub fn put(&mut self, item: Pooled<T>) {
        self.state.release(item);
    }

    /// Destroys every free instance and resets the counters.
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

impl<T, C> Recycler<T> for TypedObjectPool<T, C>
where
    T: Capable<C>,
    C: ?Sized,
{
    fn acquire(&mut self) -> CoreResult<Pooled<T>> {
        self.get()
    }

    fn release(&mut self, item: Pooled<T>) {
        self.put(item);
    }

    fn clear(&mut self) {
        TypedObjectPool::clear(self);
    }

    fn stats(&self) -> PoolStats {
        self.state.stats()
    }
}

impl<T, C: ?Sized> fmt::Debug for TypedObjectPool<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedObjectPool")
            .field("name", &self.state.name())
            .field("capability", &std::any::type_name::<C>())
            .field("stats", &self.state.stats())
            .finish_non_exhaustive()
    }
}
