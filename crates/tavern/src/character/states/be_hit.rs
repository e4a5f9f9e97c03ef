//! Reacting to a hit.

use std::cell::Cell;
use std::rc::Rc;

use tavern_core::{ScopedListeners, State};

use super::{on_last_frame, IDLE, MOVE};
use crate::animation::{ClipEvent, CLIP_HIT};
use crate::character::{listener_target, CharacterBody};

/// Applies pending damage and plays the hit clip to its end, then resumes
/// what the hit interrupted: an unfinished walk, else `follow_up`, else idle.
/// A downed character always idles.
#[derive(Default)]
pub struct BeHitState {
    listeners: ScopedListeners<ClipEvent>,
    done: Rc<Cell<bool>>,
}

impl State<CharacterBody> for BeHitState {
    fn on_enter(&mut self, owner: &mut CharacterBody, _prev: Option<&str>) {
        self.listeners = ScopedListeners::with_target(listener_target(owner.id));
        self.done.set(false);
        let damage = owner.take_damage();
        tracing::debug!("{} takes {} damage ({} left)", owner.id, damage, owner.hit_points);
        let next = if owner.is_down() {
            owner.follow_up = None;
            IDLE
        } else if owner.destination.is_some() {
            MOVE
        } else {
            owner.follow_up.take().unwrap_or(IDLE)
        };
        owner.play(CLIP_HIT);
        on_last_frame(owner, &mut self.listeners, &self.done, next, || {});
    }

    fn on_exit(&mut self, owner: &mut CharacterBody, _next: Option<&str>) {
        self.listeners.release();
        owner.stop_clip();
    }

    fn update(&mut self, _owner: &mut CharacterBody, _dt: f32) {}

    fn can_transition(&self, _owner: &CharacterBody) -> bool {
        self.done.get()
    }
}
