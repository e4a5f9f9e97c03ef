//! # Orders
//!
//! ```text
//!   customer            board                 staff
//!   ────────            ─────                 ─────
//!   post() ─────────▶ waiting ──claim_next()──▶ preparing
//!                        ▲                        │
//!                        └────── requeue() ───────┤  (forced exit)
//!   cancel() ──▶ removed, or flagged if claimed   │
//!                                                 ▼
//!                                              finish()
//! ```
//!
//! Records refer to characters by id only, so either side may disappear
//! mid-order without leaving dangling references.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tavern_shared::{CharacterId, OrderId};

/// One order from placement to completion.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderRecept {
    /// Order identity.
    pub id: OrderId,
    /// Dish name.
    pub name: String,
    /// Preparation time in seconds.
    pub duration: f32,
    /// Who asked for it.
    pub customer: CharacterId,
}

/// Waiting and claimed orders.
#[derive(Debug, Default)]
pub struct OrderBoard {
    next_id: u64,
    waiting: VecDeque<OrderRecept>,
    claimed: BTreeMap<OrderId, CharacterId>,
    cancelled: BTreeSet<OrderId>,
}

impl OrderBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts a new order and returns its record.
    pub fn post(&mut self, name: &str, duration: f32, customer: CharacterId) -> OrderRecept {
        self.next_id += 1;
        let recept = OrderRecept {
            id: OrderId(self.next_id),
            name: name.to_owned(),
            duration,
            customer,
        };
        tracing::debug!("{} `{}` posted by {}", recept.id, recept.name, customer);
        self.waiting.push_back(recept.clone());
        recept
    }

    /// Hands the oldest waiting order to `server`.
    pub fn claim_next(&mut self, server: CharacterId) -> Option<OrderRecept> {
        let recept = self.waiting.pop_front()?;
        self.claimed.insert(recept.id, server);
        tracing::debug!("{} claimed by {}", recept.id, server);
        Some(recept)
    }

    /// Puts an unfinished claimed order back at the front of the queue.
    ///
    /// Orders cancelled while claimed are dropped instead; returns false then.
    pub fn requeue(&mut self, recept: OrderRecept) -> bool {
        self.claimed.remove(&recept.id);
        if self.cancelled.remove(&recept.id) {
            tracing::debug!("{} was cancelled; not requeued", recept.id);
            return false;
        }
        tracing::debug!("{} requeued", recept.id);
        self.waiting.push_front(recept);
        true
    }

    /// Withdraws an order.
    ///
    /// A waiting order is removed; a claimed one is flagged so its server
    /// aborts. Returns false for unknown or already finished orders.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        if let Some(index) = self.waiting.iter().position(|recept| recept.id == id) {
            self.waiting.remove(index);
            tracing::debug!("{} cancelled while waiting", id);
            return true;
        }
        if self.claimed.contains_key(&id) {
            self.cancelled.insert(id);
            tracing::debug!("{} cancelled while being prepared", id);
            return true;
        }
        tracing::warn!("cannot cancel unknown {}", id);
        false
    }

    /// Returns true if a claimed order has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self, id: OrderId) -> bool {
        self.cancelled.contains(&id)
    }

    /// Retires a claimed order. Returns true if it completed normally, false
    /// if it had been cancelled or was never claimed.
    pub fn finish(&mut self, id: OrderId) -> bool {
        let claimed = self.claimed.remove(&id).is_some();
        let cancelled = self.cancelled.remove(&id);
        claimed && !cancelled
    }

    /// Returns true if the order is still waiting for a server.
    #[must_use]
    pub fn is_waiting(&self, id: OrderId) -> bool {
        self.waiting.iter().any(|recept| recept.id == id)
    }

    /// Server preparing the order, if claimed.
    #[must_use]
    pub fn server_of(&self, id: OrderId) -> Option<CharacterId> {
        self.claimed.get(&id).copied()
    }

    /// Orders waiting for a server.
    #[must_use]
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Orders being prepared.
    #[must_use]
    pub fn claimed_len(&self) -> usize {
        self.claimed.len()
    }

    /// Drops every order.
    pub fn clear(&mut self) {
        self.waiting.clear();
        self.claimed.clear();
        self.cancelled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: CharacterId = CharacterId(1);
    const BOB: CharacterId = CharacterId(2);

    #[test]
    fn test_fifo_claim() {
        let mut board = OrderBoard::new();
        let first = board.post("ale", 2.0, ALICE);
        let second = board.post("pie", 3.0, ALICE);
        assert_ne!(first.id, second.id);

        assert_eq!(board.claim_next(BOB), Some(first.clone()));
        assert_eq!(board.server_of(first.id), Some(BOB));
        assert_eq!(board.waiting_len(), 1);
        assert!(board.finish(first.id));
        assert_eq!(board.claimed_len(), 0);
    }

    #[test]
    fn test_cancel_waiting_removes() {
        let mut board = OrderBoard::new();
        let recept = board.post("ale", 2.0, ALICE);
        assert!(board.cancel(recept.id));
        assert!(!board.is_waiting(recept.id));
        assert!(board.claim_next(BOB).is_none());
        assert!(!board.cancel(recept.id));
    }

    #[test]
    fn test_cancel_claimed_flags() {
        let mut board = OrderBoard::new();
        let recept = board.post("stew", 4.0, ALICE);
        let claimed = board.claim_next(BOB).unwrap();
        assert!(board.cancel(recept.id));
        assert!(board.is_cancelled(recept.id));
        assert!(!board.finish(claimed.id));
        assert!(!board.is_cancelled(recept.id));
    }

    #[test]
    fn test_requeue_goes_to_front() {
        let mut board = OrderBoard::new();
        let first = board.post("ale", 2.0, ALICE);
        board.post("pie", 3.0, ALICE);
        let claimed = board.claim_next(BOB).unwrap();
        assert!(board.requeue(claimed));
        assert_eq!(board.claim_next(BOB).map(|recept| recept.id), Some(first.id));
    }

    #[test]
    fn test_requeue_cancelled_is_dropped() {
        let mut board = OrderBoard::new();
        board.post("ale", 2.0, ALICE);
        let claimed = board.claim_next(BOB).unwrap();
        board.cancel(claimed.id);
        assert!(!board.requeue(claimed));
        assert_eq!(board.waiting_len(), 0);
        assert_eq!(board.claimed_len(), 0);
    }
}
