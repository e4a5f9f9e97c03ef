//! Staff preparing a claimed order.

use tavern_core::State;
use tavern_shared::events::ORDER_COMPLETED;
use tavern_shared::GameEvent;

use super::IDLE;
use crate::animation::CLIP_PREPARE;
use crate::character::CharacterBody;

/// Counts down the claimed order's duration, then hands it over with
/// [`GameEvent::OrderCompleted`]. Closed while the countdown runs.
///
/// An order cancelled mid-preparation is dropped. Leaving by force before the
/// countdown ends puts the order back on the board.
#[derive(Default)]
pub struct StaffState {
    timer: f32,
    finished: bool,
}

impl StaffState {
    /// Seconds of preparation left.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        self.timer
    }

    fn finish(&mut self, owner: &mut CharacterBody) {
        self.timer = 0.0;
        self.finished = true;
        owner.request_unless_pending(IDLE);
    }
}

impl State<CharacterBody> for StaffState {
    fn on_enter(&mut self, owner: &mut CharacterBody, _prev: Option<&str>) {
        self.finished = false;
        owner.play(CLIP_PREPARE);
        match owner.order.as_ref() {
            Some(recept) => {
                self.timer = recept.duration.max(0.0);
                tracing::debug!("{} preparing {} ({}s)", owner.id, recept.id, self.timer);
            }
            None => {
                tracing::warn!("{} entered staff without an order", owner.id);
                self.finish(owner);
            }
        }
    }

    fn on_exit(&mut self, owner: &mut CharacterBody, _next: Option<&str>) {
        owner.stop_clip();
        owner.abandon_order();
    }

    fn update(&mut self, owner: &mut CharacterBody, dt: f32) {
        if self.finished {
            return;
        }
        let Some(order) = owner.order.as_ref().map(|recept| recept.id) else {
            self.finish(owner);
            return;
        };

        let cancelled = owner.context.orders.borrow().is_cancelled(order);
        if cancelled {
            tracing::debug!("{} dropped cancelled {}", owner.id, order);
            owner.context.orders.borrow_mut().finish(order);
            owner.order = None;
            self.finish(owner);
            return;
        }

        self.timer = (self.timer - dt).max(0.0);
        if self.timer > 0.0 {
            return;
        }

        let completed = owner.context.orders.borrow_mut().finish(order);
        if let Some(recept) = owner.order.take() {
            if completed {
                let event = GameEvent::OrderCompleted { order, customer: recept.customer, server: owner.id };
                owner.context.events.emit(ORDER_COMPLETED, &event);
            }
        }
        self.finish(owner);
    }

    fn can_transition(&self, _owner: &CharacterBody) -> bool {
        self.timer <= 0.0
    }
}
