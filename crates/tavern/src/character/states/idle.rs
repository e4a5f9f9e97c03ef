//! Resting between activities.

use tavern_core::State;

use super::{MOVE, ORDER, STAFF};
use crate::animation::CLIP_IDLE;
use crate::character::{CharacterBody, CharacterRole};

/// Loops the idle clip and, after a random pause, picks the next activity
/// for the character's role.
///
/// - customers take a free seat and walk there to order
/// - staff claim the oldest waiting order
/// - bouncers wait to be told whom to attack
///
/// A character whose visit is over, or with a transition already queued,
/// decides nothing.
#[derive(Default)]
pub struct IdleState {
    timer: f32,
}

impl IdleState {
    fn decide(owner: &mut CharacterBody) {
        match owner.role {
            CharacterRole::Customer => {
                let seat = owner.context.areas.borrow_mut().occupy_free(owner.id);
                if let Some((area, position)) = seat {
                    owner.area = Some(area);
                    owner.destination = Some(position);
                    owner.follow_up = Some(ORDER);
                    owner.request(MOVE);
                }
            }
            CharacterRole::Staff => {
                let claimed = owner.context.orders.borrow_mut().claim_next(owner.id);
                if let Some(recept) = claimed {
                    owner.order = Some(recept);
                    owner.request(STAFF);
                }
            }
            CharacterRole::Bouncer => {}
        }
    }
}

impl State<CharacterBody> for IdleState {
    fn on_enter(&mut self, owner: &mut CharacterBody, _prev: Option<&str>) {
        owner.play(CLIP_IDLE);
        self.timer = owner.idle_duration();
    }

    fn on_exit(&mut self, owner: &mut CharacterBody, _next: Option<&str>) {
        owner.stop_clip();
    }

    fn update(&mut self, owner: &mut CharacterBody, dt: f32) {
        if owner.leaving || owner.requester.is_pending() {
            return;
        }
        self.timer -= dt;
        if self.timer > 0.0 {
            return;
        }
        self.timer = owner.idle_duration();
        Self::decide(owner);
    }
}
