//! Entering the scene: play the spawn clip, then rest.

use std::cell::Cell;
use std::rc::Rc;

use tavern_core::{ScopedListeners, State};

use super::{on_last_frame, IDLE};
use crate::animation::{ClipEvent, CLIP_SPAWN};
use crate::character::{listener_target, CharacterBody};

/// Plays the spawn clip; leaves once it has finished.
#[derive(Default)]
pub struct SpawnState {
    listeners: ScopedListeners<ClipEvent>,
    done: Rc<Cell<bool>>,
}

impl State<CharacterBody> for SpawnState {
    fn on_enter(&mut self, owner: &mut CharacterBody, _prev: Option<&str>) {
        self.listeners = ScopedListeners::with_target(listener_target(owner.id));
        self.done.set(false);
        owner.play(CLIP_SPAWN);
        on_last_frame(owner, &mut self.listeners, &self.done, IDLE, || {});
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
