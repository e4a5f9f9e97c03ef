//! Striking another character.
//!
//! The hit lands on the attack clip's last frame and travels over the bus as
//! [`GameEvent::CharacterHit`]; the victim reacts on its own machine.

use std::cell::Cell;
use std::rc::Rc;

use tavern_core::{ScopedListeners, State};
use tavern_shared::events::CHARACTER_HIT;
use tavern_shared::GameEvent;

use super::{on_last_frame, IDLE};
use crate::animation::{ClipEvent, CLIP_ATTACK};
use crate::character::{listener_target, CharacterBody};

/// Plays the attack clip at `attack_target` and lands the hit at its end.
#[derive(Default)]
pub struct AttackState {
    listeners: ScopedListeners<ClipEvent>,
    done: Rc<Cell<bool>>,
}

impl State<CharacterBody> for AttackState {
    fn on_enter(&mut self, owner: &mut CharacterBody, _prev: Option<&str>) {
        self.listeners = ScopedListeners::with_target(listener_target(owner.id));
        self.done.set(false);

        let Some(target) = owner.attack_target else {
            tracing::warn!("{} entered attack without a target", owner.id);
            self.done.set(true);
            owner.request(IDLE);
            return;
        };

        owner.play(CLIP_ATTACK);
        let events = Rc::clone(&owner.context.events);
        let hit = GameEvent::CharacterHit {
            target,
            attacker: owner.id,
            damage: owner.context.timing.attack_damage,
        };
        on_last_frame(owner, &mut self.listeners, &self.done, IDLE, move || {
            events.emit(CHARACTER_HIT, &hit);
        });
    }

    fn on_exit(&mut self, owner: &mut CharacterBody, _next: Option<&str>) {
        self.listeners.release();
        owner.stop_clip();
        owner.attack_target = None;
    }

    fn update(&mut self, _owner: &mut CharacterBody, _dt: f32) {}

    fn can_transition(&self, _owner: &CharacterBody) -> bool {
        self.done.get()
    }
}
