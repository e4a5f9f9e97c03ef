//! # Event Channel
//!
//! One isolated namespace of listeners, keyed by event name.
//!
//! Listeners for an event are kept sorted by descending [`Priority`]; ties
//! keep registration order. All methods take `&self`, so a listener may
//! subscribe or unsubscribe on the channel that is currently emitting.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Delivery priority. Higher priorities run first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Runs after everything else.
    Low,
    /// Default priority.
    #[default]
    Normal,
    /// Runs before normal listeners.
    High,
    /// Runs first.
    Critical,
}

/// Identity a listener is registered for, used for bulk cleanup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(pub u64);

/// Shared event callback.
///
/// Identity is the identity of the shared callback: clones of one
/// `Listener` are the same listener, two `Listener::new` calls never are.
pub struct Listener<E>(Rc<dyn Fn(&E)>);

impl<E> Listener<E> {
    /// Wraps a callback.
    pub fn new(callback: impl Fn(&E) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Returns true if both handles refer to the same callback.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Invokes the callback.
    #[inline]
    pub fn call(&self, payload: &E) {
        (self.0)(payload);
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<E> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

struct Entry<E> {
    listener: Listener<E>,
    target: Option<TargetId>,
    once: bool,
    priority: Priority,
}

impl<E> Entry<E> {
    fn matches(&self, listener: &Listener<E>, target: Option<TargetId>) -> bool {
        self.listener.same_as(listener) && self.target == target
    }
}

/// A priority-ordered publish/subscribe registry.
pub struct EventChannel<E> {
    name: String,
    listeners: RefCell<HashMap<String, Vec<Entry<E>>>>,
}

impl<E> EventChannel<E> {
    /// Creates an empty channel.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listeners: RefCell::new(HashMap::new()),
        }
    }

    /// Channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a persistent listener.
    ///
    /// An identical (listener, target) pair already registered for `event`
    /// is rejected with a warning and `false` is returned.
    pub fn on(
        &self,
        event: &str,
        listener: Listener<E>,
        target: Option<TargetId>,
        priority: Priority,
    ) -> bool {
        self.add(event, listener, target, priority, false)
    }

    /// Registers a listener that is removed before its first invocation runs.
    pub fn once(
        &self,
        event: &str,
        listener: Listener<E>,
        target: Option<TargetId>,
        priority: Priority,
    ) -> bool {
        self.add(event, listener, target, priority, true)
    }

    fn add(
        &self,
        event: &str,
        listener: Listener<E>,
        target: Option<TargetId>,
        priority: Priority,
        once: bool,
    ) -> bool {
        let mut map = self.listeners.borrow_mut();
        let entries = map.entry(event.to_owned()).or_default();
        if entries.iter().any(|entry| entry.matches(&listener, target)) {
            tracing::warn!(
                "channel `{}`: duplicate listener for `{}` (target {:?}) ignored",
                self.name,
                event,
                target
            );
            return false;
        }
        entries.push(Entry { listener, target, once, priority });
        // Stable: equal priorities keep registration order.
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        true
    }

    /// Invokes every listener of `event` in priority order.
    ///
    /// The listener list is snapshotted first and one-shot listeners are
    /// removed before any callback runs. A panicking listener unwinds to the
    /// caller; later listeners of this emission are not invoked.
    ///
    /// Returns the number of listeners invoked.
    pub fn emit(&self, event: &str, payload: &E) -> usize {
        let snapshot: Vec<Listener<E>> = {
            let mut map = self.listeners.borrow_mut();
            let Some(entries) = map.get_mut(event) else {
                return 0;
            };
            let snapshot = entries.iter().map(|entry| entry.listener.clone()).collect();
            entries.retain(|entry| !entry.once);
            if entries.is_empty() {
                map.remove(event);
            }
            snapshot
        };

        for listener in &snapshot {
            listener.call(payload);
        }
        snapshot.len()
    }

    /// Removes listeners of `event`.
    ///
    /// - `listener` given: removes that listener, restricted to `target` if
    ///   one is given.
    /// - no `listener`: removes every listener registered with `target`, or
    ///   every listener of the event when `target` is `None`.
    ///
    /// Returns the number of listeners removed.
    pub fn off(&self, event: &str, listener: Option<&Listener<E>>, target: Option<TargetId>) -> usize {
        let mut map = self.listeners.borrow_mut();
        let Some(entries) = map.get_mut(event) else {
            return 0;
        };
        let before = entries.len();
        match (listener, target) {
            (Some(listener), Some(_)) => entries.retain(|entry| !entry.matches(listener, target)),
            (Some(listener), None) => entries.retain(|entry| !entry.listener.same_as(listener)),
            (None, Some(_)) => entries.retain(|entry| entry.target != target),
            (None, None) => entries.clear(),
        }
        let removed = before - entries.len();
        if entries.is_empty() {
            map.remove(event);
        }
        removed
    }

    /// Removes every listener registered with `target`, across all events.
    pub fn target_off(&self, target: TargetId) -> usize {
        let mut map = self.listeners.borrow_mut();
        let mut removed = 0;
        map.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|entry| entry.target != Some(target));
            removed += before - entries.len();
            !entries.is_empty()
        });
        removed
    }

    /// Returns true if `event` has at least one listener.
    #[must_use]
    pub fn has_event_listener(&self, event: &str) -> bool {
        self.listeners.borrow().contains_key(event)
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().get(event).map_or(0, Vec::len)
    }

    /// Removes every listener of every event.
    pub fn remove_all(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.listeners.borrow();
        let mut events: Vec<(&str, usize)> =
            map.iter().map(|(name, entries)| (name.as_str(), entries.len())).collect();
        events.sort_unstable();
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("events", &events)
            .finish()
    }
}
