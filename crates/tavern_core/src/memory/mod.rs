//! # Memory Management
//!
//! Reusable-instance pools.
//!
//! ## Design Philosophy
//!
//! Building a character or prop is expensive compared to resetting one.
//! Pools keep returned instances on a free-list and hand them out again:
//! - Lazy growth up to an optional bound
//! - Optional shrink-on-return towards a target size
//! - Typed pools that guarantee a required capability on every instance

mod pool;
mod registry;
mod typed;

pub use pool::{ObjectPool, PoolConfig, PoolStats, Pooled, Recycler};
pub use registry::PoolRegistry;
pub use typed::{Capable, TypedObjectPool};
