//! Customer waiting at a seat for an order.

use std::cell::Cell;
use std::rc::Rc;

use tavern_core::{Listener, Priority, ScopedListeners, State};
use tavern_shared::events::{ORDER_COMPLETED, ORDER_PLACED};
use tavern_shared::GameEvent;

use super::IDLE;
use crate::animation::CLIP_ORDER;
use crate::character::{listener_target, CharacterBody};

/// Posts an order from the menu, then waits until it is served or patience
/// runs out. Cannot be left while still waiting.
///
/// Leaving gives the seat back. Leaving by force (despawn) while still
/// waiting cancels the order.
#[derive(Default)]
pub struct OrderState {
    listeners: ScopedListeners<GameEvent>,
    served: Rc<Cell<bool>>,
    patience: f32,
    gave_up: bool,
}

impl OrderState {
    fn resolved(&self) -> bool {
        self.served.get() || self.gave_up
    }

    fn give_up(&mut self, owner: &mut CharacterBody) {
        self.gave_up = true;
        if let Some(recept) = owner.order.as_ref() {
            tracing::debug!("{} gave up waiting for {}", owner.id, recept.id);
        }
        owner.abandon_order();
        owner.request_unless_pending(IDLE);
    }
}

impl State<CharacterBody> for OrderState {
    fn on_enter(&mut self, owner: &mut CharacterBody, _prev: Option<&str>) {
        self.listeners = ScopedListeners::with_target(listener_target(owner.id));
        self.served.set(false);
        self.gave_up = false;
        self.patience = owner.context.timing.customer_patience;
        owner.play(CLIP_ORDER);

        let Some(item) = owner.pick_menu() else {
            tracing::warn!("{} found an empty menu", owner.id);
            self.give_up(owner);
            return;
        };
        let recept = owner.context.orders.borrow_mut().post(&item.name, item.duration, owner.id);
        let order = recept.id;
        owner.order = Some(recept);

        let served = Rc::clone(&self.served);
        let requester = owner.requester.clone();
        let events = Rc::clone(&owner.context.events);
        self.listeners.on(
            events.global(),
            ORDER_COMPLETED,
            Listener::new(move |event: &GameEvent| {
                if event.order() == Some(order) {
                    served.set(true);
                    requester.request_if_vacant(IDLE);
                }
            }),
            Priority::Normal,
        );
        events.emit(ORDER_PLACED, &GameEvent::OrderPlaced { order, customer: owner.id });
    }

    fn on_exit(&mut self, owner: &mut CharacterBody, _next: Option<&str>) {
        self.listeners.release();
        owner.stop_clip();
        if self.served.get() {
            owner.order = None;
            owner.satisfied = true;
        } else {
            owner.abandon_order();
        }
        owner.leaving = true;
        owner.release_area();
    }

    fn update(&mut self, owner: &mut CharacterBody, dt: f32) {
        if self.resolved() {
            return;
        }
        self.patience -= dt;
        if self.patience <= 0.0 {
            self.give_up(owner);
        }
    }

    fn can_transition(&self, _owner: &CharacterBody) -> bool {
        self.resolved()
    }
}
