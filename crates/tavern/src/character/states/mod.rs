//! # Character Behavior States
//!
//! ```text
//!            ┌────────┐ last frame ┌────────┐ seat free  ┌────────┐ arrived ┌────────┐
//!   spawn ──▶│ spawn  │───────────▶│  idle  │───────────▶│  move  │────────▶│ order  │
//!            └────────┘            └────────┘ (customer) └────────┘         └────────┘
//!                                   ▲  │  ▲                                     │
//!                      served/gave up  │  └──────────── served / gave up ────────┘
//!                                   │  │ order posted (staff)
//!                                   │  ▼
//!                                  ┌────────┐
//!                                  │ staff  │  timer elapsed
//!                                  └────────┘
//!
//!   any ── hit ──▶ be_hit ── last frame ──▶ idle
//!   any ── command ──▶ attack ── last frame ──▶ idle
//! ```
//!
//! Every subscription made in `on_enter` is held in a scoped set and released
//! in `on_exit`, whichever way the state is left. Shared slots (placement
//! area, order) are given back exactly once.

mod attack;
mod be_hit;
mod idle;
mod moving;
mod ordering;
mod spawn;
mod staff;

use std::cell::Cell;
use std::rc::Rc;

use tavern_core::{Listener, Priority, ScopedListeners, StateMachine};

pub use attack::AttackState;
pub use be_hit::BeHitState;
pub use idle::IdleState;
pub use moving::MoveState;
pub use ordering::OrderState;
pub use spawn::SpawnState;
pub use staff::StaffState;

use super::CharacterBody;
use crate::animation::{ClipEvent, LAST_FRAME};

/// Entering the scene.
pub const SPAWN: &str = "spawn";
/// Resting and deciding what to do next.
pub const IDLE: &str = "idle";
/// Walking to a destination.
pub const MOVE: &str = "move";
/// Customer waiting for an order.
pub const ORDER: &str = "order";
/// Staff preparing an order.
pub const STAFF: &str = "staff";
/// Reacting to a hit.
pub const BE_HIT: &str = "be_hit";
/// Striking a target.
pub const ATTACK: &str = "attack";

/// Registers every behavior state on a character's machine.
pub fn register_all(machine: &mut StateMachine<CharacterBody>) {
    machine.register_state(SPAWN, Box::<SpawnState>::default());
    machine.register_state(IDLE, Box::<IdleState>::default());
    machine.register_state(MOVE, Box::<MoveState>::default());
    machine.register_state(ORDER, Box::<OrderState>::default());
    machine.register_state(STAFF, Box::<StaffState>::default());
    machine.register_state(BE_HIT, Box::<BeHitState>::default());
    machine.register_state(ATTACK, Box::<AttackState>::default());
}

/// Waits for the clip just started on `owner` to reach its last frame, then
/// runs `finish`, marks `done` and requests `next` unless another transition
/// is already queued.
///
/// Without an animator the clip counts as finished immediately.
fn on_last_frame(
    owner: &CharacterBody,
    listeners: &mut ScopedListeners<ClipEvent>,
    done: &Rc<Cell<bool>>,
    next: &'static str,
    finish: impl Fn() + 'static,
) {
    let requester = owner.requester.clone();
    let complete = {
        let done = Rc::clone(done);
        move || {
            finish();
            done.set(true);
            requester.request_if_vacant(next);
        }
    };
    match owner.notifications() {
        Some(channel) => {
            listeners.once(&channel, LAST_FRAME, Listener::new(move |_: &ClipEvent| complete()), Priority::Normal);
        }
        None => complete(),
    }
}
