//! # TAVERN Core
//!
//! Engine-agnostic behavior kernel for the tavern simulation:
//! - Finite state machines with owner-gated, queued transitions
//! - Priority-ordered event channels and the channel bus
//! - Object pools with growth/shrink policy
//!
//! ## Architecture Rules
//!
//! 1. **Single logical thread** - everything runs on the frame thread; shared
//!    pieces use `Rc`/`RefCell`, never locks
//! 2. **No globals** - every manager is built by the application's
//!    composition root and passed by reference
//! 3. **Log, don't fail** - lookup misses, duplicates and exhaustion are
//!    warnings with a safe fallback; only broken preconditions are errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use tavern_core::fsm::StateMachine;
//!
//! let mut fsm = StateMachine::new();
//! fsm.initialize(owner);
//! fsm.register_state("idle", Box::new(Idle::default()));
//! fsm.change_state("idle");
//! fsm.update(dt);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod event;
pub mod fsm;
pub mod memory;

pub use error::{CoreError, CoreResult};
pub use event::{EventBus, EventChannel, Listener, Priority, ScopedListeners, TargetId};
pub use fsm::{Phase, State, StateMachine, StateRequester};
pub use memory::{Capable, ObjectPool, PoolConfig, PoolRegistry, PoolStats, Pooled, Recycler, TypedObjectPool};
