//! Walking to a destination.

use tavern_core::State;

use super::IDLE;
use crate::animation::CLIP_WALK;
use crate::character::CharacterBody;

/// Moves the character towards `destination` at the configured speed and
/// requests `follow_up` (or idle) on arrival. Cannot be left mid-walk.
///
/// A transition queued during the walk (a hit) runs first; `follow_up` is
/// then kept for whoever picks it up next. A forced exit mid-walk gives up
/// the seat the walk was heading for.
#[derive(Default)]
pub struct MoveState {
    arrived: bool,
}

impl MoveState {
    fn arrive(&mut self, owner: &mut CharacterBody) {
        self.arrived = true;
        owner.destination = None;
        let next = owner.follow_up.unwrap_or(IDLE);
        if owner.request_unless_pending(next) {
            owner.follow_up = None;
        }
    }
}

impl State<CharacterBody> for MoveState {
    fn on_enter(&mut self, owner: &mut CharacterBody, _prev: Option<&str>) {
        self.arrived = false;
        owner.play(CLIP_WALK);
    }

    fn on_exit(&mut self, owner: &mut CharacterBody, _next: Option<&str>) {
        owner.stop_clip();
        if owner.destination.take().is_some() {
            owner.follow_up = None;
            owner.release_area();
        }
    }

    fn update(&mut self, owner: &mut CharacterBody, dt: f32) {
        if self.arrived {
            return;
        }
        let Some(destination) = owner.destination else {
            self.arrive(owner);
            return;
        };
        let step = owner.context.timing.move_speed * dt;
        owner.position = owner.position.move_towards(destination, step);
        if owner.position == destination {
            self.arrive(owner);
        }
    }

    fn can_transition(&self, owner: &CharacterBody) -> bool {
        owner.destination.is_none()
    }
}
