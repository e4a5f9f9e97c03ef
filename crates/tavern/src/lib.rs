//! # TAVERN
//!
//! Character behavior for a small tavern simulation, built on the
//! `tavern_core` kernel:
//!
//! - Customers take a seat, order from the menu, wait, and leave
//! - Staff claim posted orders and prepare them
//! - Anyone can be told to attack; victims react through the event bus
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────── Session ────────────────────────────┐
//! │  GameConfig ── SettingsStore                                    │
//! │                                                                 │
//! │  PoolRegistry<Character> ──spawn──▶ live characters ──tick──┐   │
//! │        ▲                                                    │   │
//! │        └──────────────────despawn───────────────────────────┘   │
//! │                                                                 │
//! │  Context (shared by every character)                            │
//! │    EventBus<GameEvent> · AreaBoard · OrderBoard · menu · clips  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The host engine supplies animation through [`animation::Animator`]; the
//! built-in [`animation::ClipPlayer`] stands in for it when running headless.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod animation;
pub mod area;
pub mod character;
pub mod config;
pub mod error;
pub mod order;
pub mod session;
pub mod settings;

pub use character::{Character, CharacterBody, CharacterRole, Context};
pub use config::GameConfig;
pub use error::{GameError, GameResult};
pub use session::Session;
pub use settings::{AudioSettings, SettingsStore};
