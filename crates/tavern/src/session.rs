//! # Session
//!
//! The composition root. Builds every shared piece once and drives the
//! characters frame by frame:
//!
//! ```text
//! Session::new(config)
//!   ├─ EventBus<GameEvent>        (one per session, no globals)
//!   ├─ AreaBoard / OrderBoard     (shared with every character)
//!   ├─ PoolRegistry<Character>    (one typed pool per role)
//!   └─ SettingsStore
//!
//! tick(dt):
//!   1. every live character, in id order:
//!        ├─ advance its animator (last-frame notifications)
//!        └─ drive its state machine once
//!   2. despawn characters that are done (served customers, downed fighters)
//! ```

use std::cell::Ref;
use std::collections::BTreeMap;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tavern_core::{EventBus, PoolRegistry, PoolStats, Pooled, TypedObjectPool};
use tavern_shared::events::{CHARACTER_DESPAWNED, CHARACTER_SPAWNED};
use tavern_shared::{CharacterId, GameEvent, Vec3};

use crate::animation::Animator;
use crate::area::AreaBoard;
use crate::character::{listener_target, Character, CharacterRole, Context};
use crate::config::GameConfig;
use crate::error::{GameError, GameResult};
use crate::order::OrderBoard;
use crate::settings::SettingsStore;

/// Everything one running tavern needs.
pub struct Session {
    config: GameConfig,
    context: Context,
    pools: PoolRegistry<Character>,
    live: BTreeMap<CharacterId, Pooled<Character>>,
    settings: SettingsStore,
    rng: ChaCha8Rng,
    next_id: u32,
    running: bool,
}

impl Session {
    /// Builds the shared pieces. Nothing is allocated for characters until
    /// [`init`](Self::init).
    #[must_use]
    pub fn new(config: GameConfig) -> Self {
        let context = Context::new(&config);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            context,
            pools: PoolRegistry::new(),
            live: BTreeMap::new(),
            settings: SettingsStore::in_memory(),
            rng,
            next_id: 0,
            running: false,
        }
    }

    /// Prewarms the character pools, lays out the placement areas and loads
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Core`] if a prewarmed character cannot be given
    /// an animator.
    pub fn init(&mut self) -> GameResult<()> {
        if self.running {
            tracing::warn!("session already initialized");
            return Ok(());
        }

        for role in CharacterRole::ALL {
            if self.pools.contains(role.key()) {
                continue;
            }
            let context = self.context.clone();
            let pool: TypedObjectPool<Character, dyn Animator> =
                TypedObjectPool::new(role.key(), self.config.pool(role.key()), move || {
                    Character::new(role, context.clone())
                })?;
            let pool = pool
                .with_reset(Character::reset)
                .with_destroy(|character| tracing::debug!("destroying pooled {}", character.role()));
            tracing::debug!("pool `{}` ready: {:?}", role, pool.stats());
            self.pools.insert(role.key(), Box::new(pool));
        }

        *self.context.areas.borrow_mut() = AreaBoard::with_positions(&self.config.areas);
        self.settings = match self.config.settings_path.as_deref() {
            Some(path) => SettingsStore::open(path),
            None => SettingsStore::in_memory(),
        };

        self.running = true;
        tracing::info!(
            "session started: {} area(s), {} menu item(s)",
            self.context.areas.borrow().len(),
            self.context.menu.len()
        );
        Ok(())
    }

    /// Despawns every character, empties the pools, boards and channels.
    pub fn shutdown(&mut self) {
        let ids: Vec<CharacterId> = self.live.keys().copied().collect();
        for id in ids {
            if let Err(e) = self.despawn(id) {
                tracing::warn!("shutdown: {}", e);
            }
        }
        self.pools.clear_all();
        self.context.orders.borrow_mut().clear();
        self.context.areas.borrow_mut().clear();
        self.context.events.clear();
        self.running = false;
        tracing::info!("session stopped");
    }

    /// Draws a character of `role` from its pool and places it at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownPool`] before [`init`](Self::init), and
    /// [`GameError::Core`] if a new character cannot be given an animator.
    pub fn spawn(&mut self, role: CharacterRole, position: Vec3) -> GameResult<CharacterId> {
        let Some(mut character) = self.pools.get(role.key())? else {
            return Err(GameError::UnknownPool(role.key()));
        };
        if !character.is_tracked() {
            tracing::warn!("pool `{}` exhausted; spawning an unpooled {}", role, role);
        }

        self.next_id += 1;
        let id = CharacterId(self.next_id);
        let seed = self.rng.gen::<u64>();
        character.activate(id, position, seed);
        self.live.insert(id, character);

        self.context.events.emit(CHARACTER_SPAWNED, &GameEvent::CharacterSpawned { id, position });
        tracing::debug!("spawned {} as {}", role, id);
        Ok(id)
    }

    /// Removes a character from play and returns it to its pool.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownCharacter`] if `id` is not live.
    pub fn despawn(&mut self, id: CharacterId) -> GameResult<()> {
        let mut character = self.live.remove(&id).ok_or(GameError::UnknownCharacter(id))?;
        character.deactivate();
        let removed = self.context.events.target_off(listener_target(id));
        if removed > 0 {
            tracing::debug!("{}: {} stray listener(s) removed", id, removed);
        }
        self.context.events.emit(CHARACTER_DESPAWNED, &GameEvent::CharacterDespawned { id });

        let role = character.role();
        self.pools.put(role.key(), character);
        tracing::debug!("despawned {}", id);
        Ok(())
    }

    /// Advances the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if !self.running {
            tracing::warn!("tick before init");
            return;
        }
        for character in self.live.values_mut() {
            character.update(dt);
        }

        let done: Vec<CharacterId> = self
            .live
            .iter()
            .filter(|(_, character)| character.should_leave())
            .map(|(id, _)| *id)
            .collect();
        for id in done {
            if let Err(e) = self.despawn(id) {
                tracing::warn!("{}", e);
            }
        }
    }

    /// Tells `attacker` to strike `target`. The attack starts once the
    /// attacker's current state allows it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownCharacter`] if either side is not live.
    pub fn command_attack(&mut self, attacker: CharacterId, target: CharacterId) -> GameResult<bool> {
        if !self.live.contains_key(&target) {
            return Err(GameError::UnknownCharacter(target));
        }
        let character = self.live.get_mut(&attacker).ok_or(GameError::UnknownCharacter(attacker))?;
        Ok(character.command_attack(target))
    }

    /// A live character.
    #[must_use]
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.live.get(&id).map(|character| &**character)
    }

    /// A live character, mutably.
    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.live.get_mut(&id).map(|character| &mut **character)
    }

    /// Ids of live characters in order.
    pub fn live_ids(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.live.keys().copied()
    }

    /// Number of live characters.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Placement slots.
    #[must_use]
    pub fn areas(&self) -> Ref<'_, AreaBoard> {
        self.context.areas.borrow()
    }

    /// Posted and claimed orders.
    #[must_use]
    pub fn orders(&self) -> Ref<'_, OrderBoard> {
        self.context.orders.borrow()
    }

    /// Gameplay event bus.
    #[must_use]
    pub fn events(&self) -> &Rc<EventBus<GameEvent>> {
        &self.context.events
    }

    /// Persisted settings.
    #[must_use]
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Persisted settings, mutably.
    pub fn settings_mut(&mut self) -> &mut SettingsStore {
        &mut self.settings
    }

    /// Counters of a role's pool.
    #[must_use]
    pub fn pool_stats(&self, role: CharacterRole) -> Option<PoolStats> {
        self.pools.stats(role.key())
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Between `init` and `shutdown`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("running", &self.running)
            .field("live", &self.live.len())
            .field("pools", &self.pools)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let mut session = Session::new(GameConfig::default());
        session.init().unwrap();
        session
    }

    #[test]
    fn test_spawn_before_init_fails() {
        let mut session = Session::new(GameConfig::default());
        let err = session.spawn(CharacterRole::Customer, Vec3::ZERO).unwrap_err();
        assert!(matches!(err, GameError::UnknownPool("customer")));
    }

    #[test]
    fn test_spawn_and_despawn_round_trip_pool() {
        let mut session = session();
        let before = session.pool_stats(CharacterRole::Staff).unwrap();
        let id = session.spawn(CharacterRole::Staff, Vec3::ZERO).unwrap();
        assert_eq!(session.pool_stats(CharacterRole::Staff).unwrap().checked_out, 1);
        assert_eq!(session.character(id).unwrap().role(), CharacterRole::Staff);

        session.despawn(id).unwrap();
        assert_eq!(session.pool_stats(CharacterRole::Staff).unwrap(), before);
        assert!(matches!(session.despawn(id), Err(GameError::UnknownCharacter(_))));
    }

    #[test]
    fn test_command_attack_unknown_target() {
        let mut session = session();
        let bouncer = session.spawn(CharacterRole::Bouncer, Vec3::ZERO).unwrap();
        let err = session.command_attack(bouncer, CharacterId(999)).unwrap_err();
        assert!(matches!(err, GameError::UnknownCharacter(CharacterId(999))));
    }

    #[test]
    fn test_shutdown_empties_everything() {
        let mut session = session();
        session.spawn(CharacterRole::Customer, Vec3::ZERO).unwrap();
        session.shutdown();
        assert_eq!(session.live_count(), 0);
        assert!(!session.is_running());
        assert_eq!(session.pool_stats(CharacterRole::Customer).unwrap().total, 0);
        assert!(!session.events().has_event_listener(tavern_shared::events::CHARACTER_HIT));
    }
}
