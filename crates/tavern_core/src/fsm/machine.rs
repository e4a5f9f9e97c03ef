//! # State Machine
//!
//! Owner-gated finite state machine with a single queued transition.
//!
//! ```text
//!  Uninitialized ──initialize──> Idle ──change_state──> Running
//!                                                      │    ▲
//!                               change_state/request   │    │ update: gate open,
//!                                                      ▼    │ exit old, enter new
//!                                                     Pending
//! ```
//!
//! The first `change_state` enters immediately. After that, requests are only
//! queued; the running state decides when it is safe to leave through
//! [`State::can_transition`].

use std::collections::HashMap;

use super::requester::StateRequester;
use super::state::State;

/// Lifecycle phase of a [`StateMachine`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No owner bound yet.
    Uninitialized,
    /// Owner bound, no state entered.
    Idle,
    /// A state is current and nothing is queued.
    Running,
    /// A state is current and a transition is queued.
    Pending,
}

/// Per-owner state container.
///
/// Owns the owner value, the registered states, the current state name and
/// the pending-state slot.
pub struct StateMachine<T> {
    /// Owner bound by [`initialize`](Self::initialize).
    owner: Option<T>,
    /// Registered states by name.
    states: HashMap<String, Box<dyn State<T>>>,
    /// Name of the current state.
    current: Option<String>,
    /// Pending-state slot, shared with every requester.
    pending: StateRequester,
}

impl<T> StateMachine<T> {
    /// Creates an uninitialized machine with no states.
    #[must_use]
    pub fn new() -> Self {
        Self {
            owner: None,
            states: HashMap::new(),
            current: None,
            pending: StateRequester::new(),
        }
    }

    /// Binds the owner. Only the first call has an effect.
    ///
    /// Returns `false` (and keeps the original owner) if already bound.
    pub fn initialize(&mut self, owner: T) -> bool {
        if self.owner.is_some() {
            tracing::warn!("state machine already initialized; owner not replaced");
            return false;
        }
        self.owner = Some(owner);
        true
    }

    /// Registers a state under `name`.
    ///
    /// Duplicate names are rejected: the original registration wins and
    /// `false` is returned.
    pub fn register_state(&mut self, name: &str, state: Box<dyn State<T>>) -> bool {
        if self.states.contains_key(name) {
            tracing::warn!("state `{}` already registered; keeping original", name);
            return false;
        }
        self.states.insert(name.to_owned(), state);
        true
    }

    /// Removes a registered state. The current state cannot be removed.
    pub fn unregister_state(&mut self, name: &str) -> Option<Box<dyn State<T>>> {
        if self.current.as_deref() == Some(name) {
            tracing::warn!("cannot unregister current state `{}`", name);
            return None;
        }
        self.states.remove(name)
    }

    /// Requests a transition to `name`.
    ///
    /// With no current state the named state is entered immediately.
    /// Otherwise the request is queued and replaces any earlier unconsumed
    /// request. Unknown names are ignored with a warning.
    pub fn change_state(&mut self, name: &str) -> bool {
        if !self.states.contains_key(name) {
            tracing::warn!("change_state: unknown state `{}`", name);
            return false;
        }
        if self.current.is_some() {
            self.pending.request(name);
            return true;
        }
        let Some(owner) = self.owner.as_mut() else {
            tracing::warn!("change_state(`{}`) before initialize", name);
            return false;
        };
        self.pending.clear();
        self.current = Some(name.to_owned());
        if let Some(state) = self.states.get_mut(name) {
            state.on_enter(owner, None);
        }
        true
    }

    /// Drives the current state for one frame.
    ///
    /// Runs `update`, then consults the gate. When the gate is open and a
    /// transition is queued, the old state's `on_exit` runs before the new
    /// state's `on_enter`.
    pub fn update(&mut self, dt: f32) {
        let (Some(owner), Some(current)) = (self.owner.as_mut(), self.current.as_deref()) else {
            return;
        };
        let next = {
            let Some(state) = self.states.get_mut(current) else {
                return;
            };
            state.update(owner, dt);
            if !state.can_transition(owner) {
                return;
            }
            let Some(next) = self.pending.take() else {
                return;
            };
            next
        };
        if !self.states.contains_key(&next) {
            tracing::warn!("dropping queued transition to unknown state `{}`", next);
            return;
        }

        let prev = self.current.replace(next);
        let (Some(prev), Some(entered)) = (prev, self.current.as_deref()) else {
            return;
        };
        if let Some(state) = self.states.get_mut(&prev) {
            state.on_exit(owner, Some(entered));
        }
        if let Some(state) = self.states.get_mut(entered) {
            state.on_enter(owner, Some(&prev));
        }
    }

    /// Exits the current state (with no successor) and clears any request.
    ///
    /// Registered states and the owner are kept, so the machine can be
    /// started again with [`change_state`](Self::change_state).
    pub fn halt(&mut self) {
        self.pending.clear();
        let (Some(owner), Some(current)) = (self.owner.as_mut(), self.current.take()) else {
            return;
        };
        if let Some(state) = self.states.get_mut(&current) {
            state.on_exit(owner, None);
        }
        self.pending.clear();
    }

    /// Returns a handle that queues transitions on this machine.
    #[must_use]
    pub fn requester(&self) -> StateRequester {
        self.pending.clone()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match (&self.owner, &self.current) {
            (None, _) => Phase::Uninitialized,
            (Some(_), None) => Phase::Idle,
            (Some(_), Some(_)) if self.pending.is_pending() => Phase::Pending,
            (Some(_), Some(_)) => Phase::Running,
        }
    }

    /// Looks up a registered state.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<&(dyn State<T> + 'static)> {
        self.states.get(name).map(|state| &**state)
    }

    /// Returns the current state.
    #[must_use]
    pub fn current_state(&self) -> Option<&(dyn State<T> + 'static)> {
        self.current.as_deref().and_then(|name| self.state(name))
    }

    /// Name of the current state.
    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Name of the queued state, if any.
    #[must_use]
    pub fn pending_name(&self) -> Option<String> {
        self.pending.pending()
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// The bound owner.
    #[must_use]
    pub fn owner(&self) -> Option<&T> {
        self.owner.as_ref()
    }

    /// The bound owner, mutably.
    pub fn owner_mut(&mut self) -> Option<&mut T> {
        self.owner.as_mut()
    }
}

impl<T> Default for StateMachine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for StateMachine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("StateMachine")
            .field("phase", &self.phase())
            .field("current", &self.current)
            .field("pending", &self.pending.pending())
            .field("states", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Host {
        log: Vec<String>,
        gate_open: bool,
        updates: u32,
    }

    struct Recording(&'static str);

    impl State<Host> for Recording {
        fn on_enter(&mut self, owner: &mut Host, prev: Option<&str>) {
            owner.log.push(format!("enter:{}<-{}", self.0, prev.unwrap_or("-")));
        }

        fn on_exit(&mut self, owner: &mut Host, next: Option<&str>) {
            owner.log.push(format!("exit:{}->{}", self.0, next.unwrap_or("-")));
        }

        fn update(&mut self, owner: &mut Host, _dt: f32) {
            owner.updates += 1;
        }

        fn can_transition(&self, owner: &Host) -> bool {
            owner.gate_open
        }
    }

    fn machine() -> StateMachine<Host> {
        let mut fsm = StateMachine::new();
        fsm.initialize(Host { gate_open: true, ..Host::default() });
        for name in ["a", "b", "c"] {
            fsm.register_state(name, Box::new(Recording(name)));
        }
        fsm
    }

    fn log(fsm: &StateMachine<Host>) -> Vec<&str> {
        fsm.owner().unwrap().log.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_first_change_enters_immediately() {
        let mut fsm = machine();
        assert_eq!(fsm.phase(), Phase::Idle);
        assert!(fsm.change_state("a"));
        assert_eq!(fsm.current_name(), Some("a"));
        assert_eq!(log(&fsm), ["enter:a<--"]);
        assert_eq!(fsm.phase(), Phase::Running);
    }

    #[test]
    fn test_change_while_running_is_queued() {
        let mut fsm = machine();
        fsm.change_state("a");
        fsm.change_state("b");
        assert_eq!(fsm.current_name(), Some("a"));
        assert_eq!(fsm.phase(), Phase::Pending);

        fsm.update(0.016);
        assert_eq!(fsm.current_name(), Some("b"));
        assert_eq!(log(&fsm), ["enter:a<--", "exit:a->b", "enter:b<-a"]);
        assert_eq!(fsm.phase(), Phase::Running);
    }

    #[test]
    fn test_closed_gate_keeps_request_queued() {
        let mut fsm = machine();
        fsm.change_state("a");
        fsm.owner_mut().unwrap().gate_open = false;
        fsm.change_state("b");

        for _ in 0..3 {
            fsm.update(0.016);
        }
        assert_eq!(fsm.current_name(), Some("a"));
        assert_eq!(fsm.pending_name().as_deref(), Some("b"));
        assert_eq!(fsm.owner().unwrap().updates, 3);

        fsm.owner_mut().unwrap().gate_open = true;
        fsm.update(0.016);
        assert_eq!(fsm.current_name(), Some("b"));
    }

    #[test]
    fn test_last_request_wins() {
        let mut fsm = machine();
        fsm.change_state("a");
        fsm.change_state("b");
        fsm.change_state("c");
        fsm.update(0.016);

        assert_eq!(fsm.current_name(), Some("c"));
        assert!(!log(&fsm).iter().any(|entry| entry.starts_with("enter:b")));
    }

    #[test]
    fn test_reentering_same_state_waits_for_gate() {
        let mut fsm = machine();
        fsm.change_state("a");
        fsm.owner_mut().unwrap().gate_open = false;
        fsm.change_state("a");
        fsm.update(0.016);
        assert_eq!(log(&fsm), ["enter:a<--"]);

        fsm.owner_mut().unwrap().gate_open = true;
        fsm.update(0.016);
        assert_eq!(log(&fsm), ["enter:a<--", "exit:a->a", "enter:a<-a"]);
    }

    #[test]
    fn test_update_without_request_keeps_state() {
        let mut fsm = machine();
        fsm.change_state("a");
        fsm.update(0.016);
        fsm.update(0.016);
        assert_eq!(fsm.current_name(), Some("a"));
        assert_eq!(log(&fsm).len(), 1);
    }

    #[test]
    fn test_unknown_state_is_noop() {
        let mut fsm = machine();
        assert!(!fsm.change_state("missing"));
        assert_eq!(fsm.phase(), Phase::Idle);

        fsm.change_state("a");
        fsm.requester().request("missing");
        fsm.update(0.016);
        assert_eq!(fsm.current_name(), Some("a"));
        assert!(fsm.pending_name().is_none());
    }

    #[test]
    fn test_duplicate_registration_keeps_original() {
        let mut fsm = machine();
        assert!(!fsm.register_state("a", Box::new(Recording("impostor"))));
        fsm.change_state("a");
        assert_eq!(log(&fsm), ["enter:a<--"]);
    }

    #[test]
    fn test_uninitialized_machine_ignores_changes() {
        let mut fsm: StateMachine<Host> = StateMachine::new();
        fsm.register_state("a", Box::new(Recording("a")));
        assert_eq!(fsm.phase(), Phase::Uninitialized);
        assert!(!fsm.change_state("a"));
        fsm.update(1.0);
        assert!(fsm.current_state().is_none());

        assert!(fsm.initialize(Host::default()));
        assert!(!fsm.initialize(Host::default()));
    }

    #[test]
    fn test_update_without_current_is_noop() {
        let mut fsm = machine();
        fsm.update(1.0);
        assert_eq!(fsm.owner().unwrap().updates, 0);
    }

    #[test]
    fn test_requester_queues_like_change_state() {
        let mut fsm = machine();
        let requester = fsm.requester();
        fsm.change_state("a");
        requester.request("c");
        assert_eq!(fsm.phase(), Phase::Pending);
        fsm.update(0.016);
        assert_eq!(fsm.current_name(), Some("c"));
    }

    #[test]
    fn test_halt_exits_current() {
        let mut fsm = machine();
        fsm.change_state("a");
        fsm.change_state("b");
        fsm.halt();

        assert_eq!(fsm.phase(), Phase::Idle);
        assert!(fsm.pending_name().is_none());
        assert_eq!(log(&fsm), ["enter:a<--", "exit:a->-"]);

        fsm.change_state("c");
        assert_eq!(fsm.current_name(), Some("c"));
    }

    #[test]
    fn test_exit_always_precedes_enter() {
        let mut fsm = machine();
        fsm.change_state("a");
        for next in ["b", "c", "a", "b"] {
            fsm.change_state(next);
            fsm.update(0.016);
        }
        let entries = log(&fsm);
        for pair in entries[1..].chunks(2) {
            assert!(pair[0].starts_with("exit:"));
            assert!(pair[1].starts_with("enter:"));
        }
    }

    #[test]
    fn test_current_state_cannot_be_unregistered() {
        let mut fsm = machine();
        fsm.change_state("a");
        assert!(fsm.unregister_state("a").is_none());
        assert!(fsm.unregister_state("b").is_some());
        assert!(!fsm.has_state("b"));
        assert!(fsm.current_state().is_some());
    }
}
