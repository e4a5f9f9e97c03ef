//! Subscriptions tied to the lifetime of their owner.

use std::rc::{Rc, Weak};

use super::channel::{EventChannel, Listener, Priority, TargetId};

struct Held<E> {
    channel: Weak<EventChannel<E>>,
    event: String,
    listener: Listener<E>,
    target: Option<TargetId>,
}

/// Records subscriptions and removes all of them on [`release`](Self::release)
/// or drop.
///
/// An entity keeps one of these for listeners that must die with it; a
/// state keeps one for listeners registered in `on_enter` and releases it in
/// `on_exit`, whichever path triggered the exit.
///
/// Channels are held weakly: a channel dropped first is simply skipped.
pub struct ScopedListeners<E> {
    target: Option<TargetId>,
    held: Vec<Held<E>>,
}

impl<E> ScopedListeners<E> {
    /// Creates an empty scope whose listeners carry no target identity.
    #[must_use]
    pub fn new() -> Self {
        Self { target: None, held: Vec::new() }
    }

    /// Creates an empty scope whose listeners are registered for `target`.
    #[must_use]
    pub fn with_target(target: TargetId) -> Self {
        Self { target: Some(target), held: Vec::new() }
    }

    /// Target identity used for every registration.
    #[must_use]
    pub fn target(&self) -> Option<TargetId> {
        self.target
    }

    /// Registers a persistent listener on `channel` and records it.
    pub fn on(
        &mut self,
        channel: &Rc<EventChannel<E>>,
        event: &str,
        listener: Listener<E>,
        priority: Priority,
    ) -> bool {
        let added = channel.on(event, listener.clone(), self.target, priority);
        if added {
            self.record(channel, event, listener);
        }
        added
    }

    /// Registers a one-shot listener on `channel` and records it.
    pub fn once(
        &mut self,
        channel: &Rc<EventChannel<E>>,
        event: &str,
        listener: Listener<E>,
        priority: Priority,
    ) -> bool {
        let added = channel.once(event, listener.clone(), self.target, priority);
        if added {
            self.record(channel, event, listener);
        }
        added
    }

    fn record(&mut self, channel: &Rc<EventChannel<E>>, event: &str, listener: Listener<E>) {
        self.held.push(Held {
            channel: Rc::downgrade(channel),
            event: event.to_owned(),
            listener,
            target: self.target,
        });
    }

    /// Removes every recorded subscription that is still registered.
    ///
    /// Returns the number of listeners actually removed. One-shot listeners
    /// that already fired count as zero.
    pub fn release(&mut self) -> usize {
        let mut removed = 0;
        for held in self.held.drain(..) {
            if let Some(channel) = held.channel.upgrade() {
                removed += channel.off(&held.event, Some(&held.listener), held.target);
            }
        }
        removed
    }

    /// Number of recorded subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl<E> Default for ScopedListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Drop for ScopedListeners<E> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<E> std::fmt::Debug for ScopedListeners<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedListeners")
            .field("target", &self.target)
            .field("held", &self.held.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn channel() -> Rc<EventChannel<u8>> {
        Rc::new(EventChannel::new("scoped"))
    }

    #[test]
    fn test_release_removes_recorded() {
        let channel = channel();
        let mut scope = ScopedListeners::with_target(TargetId(3));
        scope.on(&channel, "a", Listener::new(|_: &u8| {}), Priority::Normal);
        scope.on(&channel, "b", Listener::new(|_: &u8| {}), Priority::Normal);
        channel.on("a", Listener::new(|_: &u8| {}), None, Priority::Normal);

        assert_eq!(scope.release(), 2);
        assert!(scope.is_empty());
        assert_eq!(channel.listener_count("a"), 1);
        assert!(!channel.has_event_listener("b"));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let channel = channel();
        let hits = Rc::new(Cell::new(0));
        {
            let mut scope = ScopedListeners::new();
            let hits = Rc::clone(&hits);
            scope.on(&channel, "a", Listener::new(move |_: &u8| hits.set(hits.get() + 1)), Priority::Normal);
            channel.emit("a", &0);
        }
        channel.emit("a", &0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_fired_once_releases_nothing() {
        let channel = channel();
        let mut scope = ScopedListeners::new();
        scope.once(&channel, "done", Listener::new(|_: &u8| {}), Priority::Normal);
        channel.emit("done", &0);
        assert_eq!(scope.release(), 0);
    }

    #[test]
    fn test_rejected_duplicate_not_recorded() {
        let channel = channel();
        let listener = Listener::new(|_: &u8| {});
        let mut scope = ScopedListeners::new();
        assert!(scope.on(&channel, "a", listener.clone(), Priority::Normal));
        assert!(!scope.on(&channel, "a", listener, Priority::High));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_dropped_channel_is_skipped() {
        let channel = channel();
        let mut scope = ScopedListeners::new();
        scope.on(&channel, "a", Listener::new(|_: &u8| {}), Priority::Normal);
        drop(channel);
        assert_eq!(scope.release(), 0);
    }
}
