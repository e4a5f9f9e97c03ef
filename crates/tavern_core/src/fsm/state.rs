//! The unit of behavior driven by a [`StateMachine`](super::StateMachine).

/// A named behavior acting on behalf of an owner of type `T`.
///
/// States never store their owner. The machine hands the owner to every
/// hook, so a state cannot outlive or control the entity it acts for.
///
/// Hook order for one transition is always `on_exit(old)` followed by
/// `on_enter(new)`.
pub trait State<T> {
    /// Called when this state becomes current.
    ///
    /// `prev` is the name of the state that was left, or `None` for the
    /// first state a machine enters.
    fn on_enter(&mut self, owner: &mut T, prev: Option<&str>);

    /// Called when this state stops being current.
    ///
    /// `next` is the state about to be entered, or `None` when the machine
    /// is halted. Anything acquired in [`on_enter`](Self::on_enter) must be
    /// released here if it is still held.
    fn on_exit(&mut self, owner: &mut T, next: Option<&str>);

    /// Per-frame logic while current.
    fn update(&mut self, owner: &mut T, dt: f32);

    /// Gate predicate: may a queued transition leave this state now?
    ///
    /// Returning `false` keeps any pending request queued for a later frame.
    fn can_transition(&self, owner: &T) -> bool {
        let _ = owner;
        true
    }
}
