//! Gameplay events carried by the bus.
//!
//! Every payload has one event name; [`GameEvent::name`] maps a payload onto
//! it so publishers cannot emit a payload under the wrong name.

use serde::{Deserialize, Serialize};

use crate::ids::{CharacterId, OrderId};
use crate::math::Vec3;

/// A customer posted an order.
pub const ORDER_PLACED: &str = "order-placed";
/// Staff finished preparing an order.
pub const ORDER_COMPLETED: &str = "order-completed";
/// A customer gave up waiting.
pub const ORDER_CANCELLED: &str = "order-cancelled";
/// A character was struck.
pub const CHARACTER_HIT: &str = "character-hit";
/// A character entered the scene.
pub const CHARACTER_SPAWNED: &str = "character-spawned";
/// A character left the scene.
pub const CHARACTER_DESPAWNED: &str = "character-despawned";

/// Payloads published on the gameplay bus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Order posted and waiting for staff.
    OrderPlaced {
        /// The order.
        order: OrderId,
        /// Who asked for it.
        customer: CharacterId,
    },

    /// Order prepared and handed over.
    OrderCompleted {
        /// The order.
        order: OrderId,
        /// Who asked for it.
        customer: CharacterId,
        /// Who prepared it.
        server: CharacterId,
    },

    /// Order withdrawn before completion.
    OrderCancelled {
        /// The order.
        order: OrderId,
        /// Who asked for it.
        customer: CharacterId,
    },

    /// Damage dealt to a character.
    CharacterHit {
        /// Victim.
        target: CharacterId,
        /// Striker.
        attacker: CharacterId,
        /// Hit points removed.
        damage: u32,
    },

    /// Character drawn from its pool.
    CharacterSpawned {
        /// The character.
        id: CharacterId,
        /// Where it appeared.
        position: Vec3,
    },

    /// Character returned to its pool.
    CharacterDespawned {
        /// The character.
        id: CharacterId,
    },
}

impl GameEvent {
    /// Event name this payload is published under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => ORDER_PLACED,
            Self::OrderCompleted { .. } => ORDER_COMPLETED,
            Self::OrderCancelled { .. } => ORDER_CANCELLED,
            Self::CharacterHit { .. } => CHARACTER_HIT,
            Self::CharacterSpawned { .. } => CHARACTER_SPAWNED,
            Self::CharacterDespawned { .. } => CHARACTER_DESPAWNED,
        }
    }

    /// The order this event concerns, if any.
    #[must_use]
    pub fn order(&self) -> Option<OrderId> {
        match self {
            Self::OrderPlaced { order, .. }
            | Self::OrderCompleted { order, .. }
            | Self::OrderCancelled { order, .. } => Some(*order),
            _ => None,
        }
    }
}
