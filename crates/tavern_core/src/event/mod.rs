//! # Event System
//!
//! Synchronous, priority-ordered publish/subscribe for a single logical
//! thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  emit(name, &payload)  ┌──────────────┐
//! │   State /   │───────────────────────>│ EventChannel │──> listeners, by priority
//! │   Session   │                        └──────────────┘
//! └─────────────┘                               ▲
//!        │        on/once (target, priority)    │
//!        └──────── ScopedListeners ─────────────┘ (released on exit / drop)
//! ```
//!
//! Emission is synchronous: every listener has run when `emit` returns.

mod bus;
mod channel;
mod scoped;

pub use bus::{EventBus, GLOBAL_CHANNEL};
pub use channel::{EventChannel, Listener, Priority, TargetId};
pub use scoped::ScopedListeners;
