//! Shared handle for queueing transitions.

use std::cell::RefCell;
use std::rc::Rc;

/// Cloneable handle onto a machine's pending-state slot.
///
/// States and one-shot completion callbacks keep a requester instead of a
/// reference to the machine. A request only fills the slot; the machine
/// consumes it on its next [`update`](super::StateMachine::update) once the
/// current state's gate opens.
///
/// The slot holds at most one target: a newer request replaces an unconsumed
/// older one.
#[derive(Clone, Debug, Default)]
pub struct StateRequester {
    slot: Rc<RefCell<Option<String>>>,
}

impl StateRequester {
    /// Creates a requester with an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `name` as the next state, replacing any earlier request.
    pub fn request(&self, name: &str) {
        let mut slot = self.slot.borrow_mut();
        if let Some(previous) = slot.as_deref() {
            if previous != name {
                tracing::trace!("pending state `{}` replaced by `{}`", previous, name);
            }
        }
        *slot = Some(name.to_owned());
    }

    /// Queues `name` only when nothing else is queued.
    ///
    /// Returns false, leaving the earlier request in place, otherwise.
    pub fn request_if_vacant(&self, name: &str) -> bool {
        let mut slot = self.slot.borrow_mut();
        if let Some(previous) = slot.as_deref() {
            tracing::trace!("`{}` not queued; `{}` already pending", name, previous);
            return false;
        }
        *slot = Some(name.to_owned());
        true
    }

    /// Returns the queued state name, if any.
    #[must_use]
    pub fn pending(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    /// Returns true if a request is queued.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Drops any queued request.
    pub fn clear(&self) {
        self.slot.borrow_mut().take();
    }

    pub(crate) fn take(&self) -> Option<String> {
        self.slot.borrow_mut().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_request_wins() {
        let requester = StateRequester::new();
        requester.request("a");
        requester.request("b");
        assert_eq!(requester.pending().as_deref(), Some("b"));
    }

    #[test]
    fn test_request_if_vacant_keeps_earlier_request() {
        let requester = StateRequester::new();
        assert!(requester.request_if_vacant("be_hit"));
        assert!(!requester.request_if_vacant("idle"));
        assert_eq!(requester.pending().as_deref(), Some("be_hit"));

        requester.clear();
        assert!(requester.request_if_vacant("idle"));
        assert_eq!(requester.pending().as_deref(), Some("idle"));
    }

    #[test]
    fn test_clones_share_slot() {
        let requester = StateRequester::new();
        let callback_side = requester.clone();
        callback_side.request("idle");
        assert!(requester.is_pending());
        assert_eq!(requester.take().as_deref(), Some("idle"));
        assert!(!callback_side.is_pending());
    }
}
