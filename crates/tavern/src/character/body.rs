//! Per-character data shared by every behavior state.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tavern_core::{EventBus, EventChannel, StateRequester};
use tavern_shared::events::ORDER_CANCELLED;
use tavern_shared::{AreaId, CharacterId, GameEvent, Vec3};

use crate::animation::{Animator, ClipEvent, ClipPlayer, ClipTable};
use crate::area::AreaBoard;
use crate::config::{GameConfig, MenuItem, TimingConfig};
use crate::order::{OrderBoard, OrderRecept};

/// What a character does in the tavern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharacterRole {
    /// Takes a seat, orders, waits, leaves.
    Customer,
    /// Prepares posted orders.
    Staff,
    /// Stands around until told to attack.
    Bouncer,
}

impl CharacterRole {
    /// Every role.
    pub const ALL: [Self; 3] = [Self::Customer, Self::Staff, Self::Bouncer];

    /// Key used for the role's pool and config section.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Bouncer => "bouncer",
        }
    }
}

impl fmt::Display for CharacterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Handles to the scene-wide pieces every character acts upon.
///
/// Built once by the session; cloning shares the same bus and boards.
#[derive(Clone)]
pub struct Context {
    /// Gameplay event bus.
    pub events: Rc<EventBus<GameEvent>>,
    /// Placement slots.
    pub areas: Rc<RefCell<AreaBoard>>,
    /// Posted and claimed orders.
    pub orders: Rc<RefCell<OrderBoard>>,
    /// Orderable dishes.
    pub menu: Rc<[MenuItem]>,
    /// Behavior timings.
    pub timing: TimingConfig,
    /// Clip lengths for attached clip players.
    pub clips: Rc<ClipTable>,
}

impl Context {
    /// Creates fresh shared pieces from configuration.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            events: Rc::new(EventBus::new()),
            areas: Rc::new(RefCell::new(AreaBoard::new())),
            orders: Rc::new(RefCell::new(OrderBoard::new())),
            menu: config.menu.clone().into(),
            timing: config.timing,
            clips: Rc::new(config.clips.clone()),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("menu", &self.menu.len())
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

/// Mutable per-character data. Owned by the character's state machine and
/// lent to whichever state is running.
pub struct CharacterBody {
    /// Current identity. Reassigned every time the character is spawned.
    pub id: CharacterId,
    /// Fixed at construction.
    pub role: CharacterRole,
    /// Where the character stands.
    pub position: Vec3,
    /// Where the move state is walking to.
    pub destination: Option<Vec3>,
    /// State to request once the destination is reached.
    pub follow_up: Option<&'static str>,
    /// Remaining hit points.
    pub hit_points: u32,
    /// Who the attack state strikes.
    pub attack_target: Option<CharacterId>,
    /// Order placed (customer) or being prepared (staff).
    pub order: Option<OrderRecept>,
    /// Occupied placement slot.
    pub area: Option<AreaId>,
    /// Received what was ordered.
    pub satisfied: bool,
    /// Visit over; waiting to be despawned.
    pub leaving: bool,
    pub(crate) pending_damage: Rc<Cell<u32>>,
    pub(crate) requester: StateRequester,
    pub(crate) context: Context,
    rng: ChaCha8Rng,
    animator: Option<Box<dyn Animator>>,
}

impl CharacterBody {
    pub(crate) fn new(role: CharacterRole, context: Context, requester: StateRequester) -> Self {
        Self {
            id: CharacterId(0),
            role,
            position: Vec3::ZERO,
            destination: None,
            follow_up: None,
            hit_points: 0,
            attack_target: None,
            order: None,
            area: None,
            satisfied: false,
            leaving: false,
            pending_damage: Rc::new(Cell::new(0)),
            requester,
            context,
            rng: ChaCha8Rng::seed_from_u64(0),
            animator: None,
        }
    }

    pub(crate) fn activate(&mut self, id: CharacterId, position: Vec3, seed: u64) {
        self.reset();
        self.id = id;
        self.position = position;
        self.hit_points = self.context.timing.hit_points;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Clears everything tied to one life of the character.
    pub(crate) fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.destination = None;
        self.follow_up = None;
        self.hit_points = 0;
        self.attack_target = None;
        self.order = None;
        self.area = None;
        self.satisfied = false;
        self.leaving = false;
        self.pending_damage.set(0);
        self.requester.clear();
        self.stop_clip();
    }

    /// Shared scene handles.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Queues a transition on this character's machine.
    pub fn request(&self, state: &str) {
        self.requester.request(state);
    }

    /// Queues a transition unless another one (a hit, an order) is already
    /// waiting. Returns true if `state` was queued.
    pub fn request_unless_pending(&self, state: &str) -> bool {
        self.requester.request_if_vacant(state)
    }

    /// Damage received but not yet applied.
    #[must_use]
    pub fn pending_damage(&self) -> u32 {
        self.pending_damage.get()
    }

    /// Applies pending damage. Returns the amount applied.
    pub fn take_damage(&mut self) -> u32 {
        let damage = self.pending_damage.replace(0);
        self.hit_points = self.hit_points.saturating_sub(damage);
        damage
    }

    /// Out of hit points.
    #[must_use]
    pub fn is_down(&self) -> bool {
        self.hit_points == 0
    }

    /// Draws an idle pause from the configured range.
    pub fn idle_duration(&mut self) -> f32 {
        let TimingConfig { idle_min, idle_max, .. } = self.context.timing;
        if idle_max <= idle_min {
            return idle_min.max(0.0);
        }
        self.rng.gen_range(idle_min..=idle_max)
    }

    /// Picks a dish from the menu.
    pub fn pick_menu(&mut self) -> Option<MenuItem> {
        self.context.menu.choose(&mut self.rng).cloned()
    }

    /// Frees the occupied placement slot, if any. Safe to call repeatedly.
    pub fn release_area(&mut self) {
        if let Some(area) = self.area.take() {
            self.context.areas.borrow_mut().release(area);
        }
    }

    /// Gives up whatever order is still held: customers cancel it, staff put
    /// it back on the board.
    pub fn abandon_order(&mut self) {
        let Some(recept) = self.order.take() else {
            return;
        };
        match self.role {
            CharacterRole::Customer => {
                let cancelled = self.context.orders.borrow_mut().cancel(recept.id);
                if cancelled {
                    self.context.events.emit(
                        ORDER_CANCELLED,
                        &GameEvent::OrderCancelled { order: recept.id, customer: self.id },
                    );
                }
            }
            CharacterRole::Staff | CharacterRole::Bouncer => {
                self.context.orders.borrow_mut().requeue(recept);
            }
        }
    }

    /// The animation capability.
    #[must_use]
    pub fn animator(&self) -> Option<&(dyn Animator + 'static)> {
        self.animator.as_deref()
    }

    /// The animation capability, mutably.
    pub fn animator_mut(&mut self) -> Option<&mut (dyn Animator + 'static)> {
        self.animator.as_deref_mut()
    }

    /// Installs an animation capability.
    pub fn set_animator(&mut self, animator: Box<dyn Animator>) {
        self.animator = Some(animator);
    }

    pub(crate) fn attach_default_animator(&mut self) {
        self.animator = Some(Box::new(ClipPlayer::new(Rc::clone(&self.context.clips))));
    }

    /// Plays a clip; without an animator this only warns.
    pub fn play(&mut self, clip: &str) {
        match self.animator.as_mut() {
            Some(animator) => {
                animator.play(clip);
            }
            None => tracing::warn!("{} has no animator; cannot play `{}`", self.id, clip),
        }
    }

    /// Stops the current clip.
    pub fn stop_clip(&mut self) {
        if let Some(animator) = self.animator.as_mut() {
            animator.stop();
        }
    }

    /// Last-frame notification channel of the animator.
    #[must_use]
    pub fn notifications(&self) -> Option<Rc<EventChannel<ClipEvent>>> {
        self.animator.as_ref().map(|animator| animator.notifications())
    }
}

impl fmt::Debug for CharacterBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterBody")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("position", &self.position)
            .field("hit_points", &self.hit_points)
            .field("order", &self.order.as_ref().map(|recept| recept.id))
            .field("area", &self.area)
            .field("satisfied", &self.satisfied)
            .finish_non_exhaustive()
    }
}
