//! # Event Bus
//!
//! One global channel plus lazily created named channels.
//!
//! ```text
//! ┌──────────────────────────── EventBus ────────────────────────────┐
//! │  global ──────────── on / once / emit / off (convenience API)    │
//! │  "orders"  ─┐                                                    │
//! │  "combat"  ─┼── channel(name), created on first access           │
//! │  ...       ─┘                                                    │
//! │                                                                  │
//! │  target_off(t): sweeps global AND every named channel            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::channel::{EventChannel, Listener, Priority, TargetId};

/// Name of the default channel.
pub const GLOBAL_CHANNEL: &str = "global";

/// Routes subscriptions and emissions to channels.
///
/// Constructed once by the application's composition root and shared by
/// reference; there is no process-wide instance.
pub struct EventBus<E> {
    global: Rc<EventChannel<E>>,
    channels: RefCell<HashMap<String, Rc<EventChannel<E>>>>,
}

impl<E> EventBus<E> {
    /// Creates a bus with an empty global channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: Rc::new(EventChannel::new(GLOBAL_CHANNEL)),
            channels: RefCell::new(HashMap::new()),
        }
    }

    /// The default channel.
    #[must_use]
    pub fn global(&self) -> &Rc<EventChannel<E>> {
        &self.global
    }

    /// Returns the named channel, creating it on first access.
    pub fn channel(&self, name: &str) -> Rc<EventChannel<E>> {
        let mut channels = self.channels.borrow_mut();
        let channel = channels.entry(name.to_owned()).or_insert_with(|| {
            tracing::debug!("event bus: created channel `{}`", name);
            Rc::new(EventChannel::new(name))
        });
        Rc::clone(channel)
    }

    /// Returns true if the named channel exists.
    #[must_use]
    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.borrow().contains_key(name)
    }

    /// Detaches a named channel from the bus.
    pub fn remove_channel(&self, name: &str) -> Option<Rc<EventChannel<E>>> {
        let removed = self.channels.borrow_mut().remove(name);
        if removed.is_none() {
            tracing::warn!("event bus: no channel named `{}`", name);
        }
        removed
    }

    /// Registers a persistent listener on the global channel.
    pub fn on(&self, event: &str, listener: Listener<E>, target: Option<TargetId>, priority: Priority) -> bool {
        self.global.on(event, listener, target, priority)
    }

    /// Registers a one-shot listener on the global channel.
    pub fn once(&self, event: &str, listener: Listener<E>, target: Option<TargetId>, priority: Priority) -> bool {
        self.global.once(event, listener, target, priority)
    }

    /// Emits on the global channel.
    pub fn emit(&self, event: &str, payload: &E) -> usize {
        self.global.emit(event, payload)
    }

    /// Removes listeners from the global channel.
    ///
    /// See [`EventChannel::off`].
    pub fn off(&self, event: &str, listener: Option<&Listener<E>>, target: Option<TargetId>) -> usize {
        self.global.off(event, listener, target)
    }

    /// Returns true if the global channel has a listener for `event`.
    #[must_use]
    pub fn has_event_listener(&self, event: &str) -> bool {
        self.global.has_event_listener(event)
    }

    /// Removes every listener registered with `target` from the global
    /// channel and from every named channel.
    pub fn target_off(&self, target: TargetId) -> usize {
        let named: Vec<Rc<EventChannel<E>>> = self.channels.borrow().values().cloned().collect();
        let removed = self.global.target_off(target)
            + named.iter().map(|channel| channel.target_off(target)).sum::<usize>();
        tracing::trace!("event bus: target {:?} unsubscribed from {} listeners", target, removed);
        removed
    }

    /// Empties every channel and forgets the named ones.
    pub fn clear(&self) {
        self.global.remove_all();
        let named: Vec<Rc<EventChannel<E>>> = self.channels.borrow_mut().drain().map(|(_, c)| c).collect();
        for channel in named {
            channel.remove_all();
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.channels.borrow().keys().cloned().collect();
        names.sort_unstable();
        f.debug_struct("EventBus")
            .field("global", &self.global)
            .field("channels", &names)
            .finish()
    }
}
