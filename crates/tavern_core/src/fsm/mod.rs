//! # Finite State Machine
//!
//! Per-owner behavior containers with gate-and-queue transitions.
//!
//! ## Transition Policy
//!
//! - The first requested state is entered immediately.
//! - Later requests are queued (one slot, last request wins).
//! - A queued request is consumed only when the current state's
//!   [`State::can_transition`] gate is open, after its per-frame `update`.
//!
//! Completion callbacks (animation finished, timer elapsed) hold a
//! [`StateRequester`] and only ever queue; the actual switch happens on the
//! owner's next tick.

mod machine;
mod requester;
mod state;

pub use machine::{Phase, StateMachine};
pub use requester::StateRequester;
pub use state::State;
