//! # TAVERN Shared Types
//!
//! Plain data shared by the kernel consumers:
//! - Identifiers (characters, orders, placement areas)
//! - Math (positions and linear movement)
//! - Gameplay event payloads and their event names
//!
//! RULE: No behavior beyond small value helpers lives here.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod events;
pub mod ids;
pub mod math;

pub use events::GameEvent;
pub use ids::{AreaId, CharacterId, OrderId};
pub use math::Vec3;
