//! # Characters
//!
//! A [`Character`] is a state machine over its [`CharacterBody`] plus the
//! listeners that live exactly as long as one spawn of the character.
//!
//! Characters are pooled. A pooled character keeps its machine and states
//! between lives; [`Character::activate`] gives it a fresh identity and
//! [`Character::deactivate`] makes it release everything it held.

mod body;
pub mod states;

use std::fmt;
use std::rc::Rc;

use tavern_core::{Capable, Listener, Priority, ScopedListeners, StateMachine, TargetId};
use tavern_shared::events::CHARACTER_HIT;
use tavern_shared::{CharacterId, GameEvent, Vec3};

pub use body::{CharacterBody, CharacterRole, Context};

use crate::animation::Animator;

/// Listener target for everything subscribed on behalf of `id`.
#[must_use]
pub fn listener_target(id: CharacterId) -> TargetId {
    TargetId(u64::from(id.0))
}

/// One pooled character.
pub struct Character {
    id: CharacterId,
    role: CharacterRole,
    machine: StateMachine<CharacterBody>,
    listeners: ScopedListeners<GameEvent>,
}

impl Character {
    /// Builds a character without an animator.
    #[must_use]
    pub fn new(role: CharacterRole, context: Context) -> Self {
        let mut machine = StateMachine::new();
        let body = CharacterBody::new(role, context, machine.requester());
        machine.initialize(body);
        states::register_all(&mut machine);
        Self {
            id: CharacterId(0),
            role,
            machine,
            listeners: ScopedListeners::new(),
        }
    }

    /// Builds a character driven by the given animator.
    #[must_use]
    pub fn with_animator(role: CharacterRole, context: Context, animator: Box<dyn Animator>) -> Self {
        let mut character = Self::new(role, context);
        if let Some(body) = character.machine.owner_mut() {
            body.set_animator(animator);
        }
        character
    }

    /// Identity of the current life.
    #[must_use]
    pub fn id(&self) -> CharacterId {
        self.id
    }

    /// Role, fixed at construction.
    #[must_use]
    pub fn role(&self) -> CharacterRole {
        self.role
    }

    /// Per-character data.
    #[must_use]
    pub fn body(&self) -> Option<&CharacterBody> {
        self.machine.owner()
    }

    /// Per-character data, mutably.
    pub fn body_mut(&mut self) -> Option<&mut CharacterBody> {
        self.machine.owner_mut()
    }

    /// The behavior machine.
    #[must_use]
    pub fn machine(&self) -> &StateMachine<CharacterBody> {
        &self.machine
    }

    /// Name of the running state.
    #[must_use]
    pub fn current_state(&self) -> Option<&str> {
        self.machine.current_name()
    }

    /// Starts a new life: identity, position, hit points, and the hit
    /// subscription. Enters the spawn state immediately.
    pub fn activate(&mut self, id: CharacterId, position: Vec3, seed: u64) -> bool {
        let Some(body) = self.machine.owner_mut() else {
            tracing::warn!("{} has no body to activate", id);
            return false;
        };
        body.activate(id, position, seed);
        let events = Rc::clone(&body.context.events);
        let pending = Rc::clone(&body.pending_damage);
        let requester = body.requester.clone();

        self.id = id;
        self.listeners = ScopedListeners::with_target(listener_target(id));
        self.listeners.on(
            events.global(),
            CHARACTER_HIT,
            Listener::new(move |event: &GameEvent| {
                if let GameEvent::CharacterHit { target, damage, .. } = event {
                    if *target == id {
                        pending.set(pending.get().saturating_add(*damage));
                        requester.request(states::BE_HIT);
                    }
                }
            }),
            Priority::High,
        );
        tracing::debug!("{} ({}) activated at {:?}", id, self.role, position);
        self.machine.change_state(states::SPAWN)
    }

    /// Ends the current life. The running state exits, entity listeners are
    /// removed, and any seat or order still held is given back.
    pub fn deactivate(&mut self) {
        self.machine.halt();
        self.listeners.release();
        if let Some(body) = self.machine.owner_mut() {
            body.release_area();
            body.abandon_order();
            body.stop_clip();
        }
        tracing::debug!("{} deactivated", self.id);
    }

    /// Clears per-life data before the character goes back on a free-list.
    pub fn reset(&mut self) {
        if let Some(body) = self.machine.owner_mut() {
            body.reset();
        }
    }

    /// Advances the animator, then drives the machine once.
    pub fn update(&mut self, dt: f32) {
        if let Some(animator) = self.machine.owner_mut().and_then(CharacterBody::animator_mut) {
            animator.tick(dt);
        }
        self.machine.update(dt);
    }

    /// Queues a transition by name.
    pub fn request(&mut self, state: &str) -> bool {
        self.machine.change_state(state)
    }

    /// Queues an attack on `target`.
    pub fn command_attack(&mut self, target: CharacterId) -> bool {
        if target == self.id {
            tracing::warn!("{} cannot attack itself", self.id);
            return false;
        }
        let Some(body) = self.machine.owner_mut() else {
            return false;
        };
        body.attack_target = Some(target);
        self.machine.change_state(states::ATTACK)
    }

    /// True once the character should be despawned: back at rest and either
    /// out of hit points or a customer whose visit is over.
    #[must_use]
    pub fn should_leave(&self) -> bool {
        if self.current_state() != Some(states::IDLE) || self.machine.pending_name().is_some() {
            return false;
        }
        self.body().is_some_and(|body| {
            body.is_down() || (body.role == CharacterRole::Customer && body.leaving)
        })
    }
}

impl Capable<dyn Animator> for Character {
    fn capability(&self) -> Option<&(dyn Animator + 'static)> {
        self.body().and_then(CharacterBody::animator)
    }

    fn attach_capability(&mut self) -> bool {
        match self.machine.owner_mut() {
            Some(body) => {
                body.attach_default_animator();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Character")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("state", &self.current_state())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn test_listener_target_follows_character_id() {
        assert_eq!(listener_target(CharacterId(7)), TargetId(7));
        assert_ne!(listener_target(CharacterId(7)), listener_target(CharacterId(8)));
    }

    fn character(role: CharacterRole) -> (Character, Context) {
        let context = Context::new(&GameConfig::default());
        let mut character = Character::new(role, context.clone());
        assert!(character.capability().is_none());
        assert!(character.attach_capability());
        (character, context)
    }

    #[test]
    fn test_spawn_then_idle() {
        let (mut character, _) = character(CharacterRole::Bouncer);
        assert!(character.activate(CharacterId(4), Vec3::ZERO, 1));
        assert_eq!(character.current_state(), Some(states::SPAWN));

        character.update(0.25);
        assert_eq!(character.current_state(), Some(states::SPAWN));
        character.update(0.25);
        assert_eq!(character.current_state(), Some(states::IDLE));
    }

    #[test]
    fn test_hit_over_the_bus() {
        let (mut character, context) = character(CharacterRole::Bouncer);
        character.activate(CharacterId(4), Vec3::ZERO, 1);
        character.update(0.5);
        assert_eq!(character.current_state(), Some(states::IDLE));

        context.events.emit(
            CHARACTER_HIT,
            &GameEvent::CharacterHit { target: CharacterId(5), attacker: CharacterId(1), damage: 7 },
        );
        assert_eq!(character.machine().pending_name(), None);

        context.events.emit(
            CHARACTER_HIT,
            &GameEvent::CharacterHit { target: CharacterId(4), attacker: CharacterId(1), damage: 7 },
        );
        character.update(0.0);
        assert_eq!(character.current_state(), Some(states::BE_HIT));
        assert_eq!(character.body().unwrap().hit_points, GameConfig::default().timing.hit_points - 7);
    }

    #[test]
    fn test_deactivate_removes_entity_listeners() {
        let (mut character, context) = character(CharacterRole::Staff);
        character.activate(CharacterId(2), Vec3::ZERO, 1);
        assert!(context.events.has_event_listener(CHARACTER_HIT));
        character.deactivate();
        assert!(!context.events.has_event_listener(CHARACTER_HIT));
        assert_eq!(character.current_state(), None);
    }

    #[test]
    fn test_cannot_attack_self() {
        let (mut character, _) = character(CharacterRole::Bouncer);
        character.activate(CharacterId(3), Vec3::ZERO, 1);
        assert!(!character.command_attack(CharacterId(3)));
        assert!(character.command_attack(CharacterId(8)));
        assert_eq!(character.machine().pending_name().as_deref(), Some(states::ATTACK));
    }

    #[test]
    fn test_host_animator_is_used() {
        use crate::animation::{ClipPlayer, ClipTable, CLIP_SPAWN};

        let context = Context::new(&GameConfig::default());
        let animator = ClipPlayer::new(Rc::new(ClipTable::default()));
        let mut character = Character::with_animator(CharacterRole::Staff, context, Box::new(animator));
        assert!(character.capability().is_some());
        character.activate(CharacterId(6), Vec3::ZERO, 1);
        assert_eq!(character.capability().and_then(|animator| animator.playing()), Some(CLIP_SPAWN));
    }
}
