//! # Placement Areas
//!
//! Slots characters walk to and occupy (seats at the bar). A slot records
//! who occupies it but never owns the character.
//!
//! Whoever occupies a slot releases it exactly once; releasing a free slot
//! is a logged no-op.

use tavern_shared::{AreaId, CharacterId, Vec3};

/// One placement slot.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeArea {
    /// Slot identity.
    pub id: AreaId,
    /// Where an occupant stands.
    pub position: Vec3,
    /// Current occupant.
    pub occupant: Option<CharacterId>,
}

impl NodeArea {
    /// Returns true while someone occupies the slot.
    #[must_use]
    pub fn used(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Every placement slot in the scene.
#[derive(Debug, Default)]
pub struct AreaBoard {
    areas: Vec<NodeArea>,
}

impl AreaBoard {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates one slot per position.
    #[must_use]
    pub fn with_positions(positions: &[Vec3]) -> Self {
        let mut board = Self::new();
        for &position in positions {
            board.add(position);
        }
        board
    }

    /// Adds a free slot.
    pub fn add(&mut self, position: Vec3) -> AreaId {
        let id = AreaId(u32::try_from(self.areas.len()).unwrap_or(u32::MAX));
        self.areas.push(NodeArea { id, position, occupant: None });
        id
    }

    /// Occupies the first free slot. Returns its id and position.
    pub fn occupy_free(&mut self, by: CharacterId) -> Option<(AreaId, Vec3)> {
        let area = self.areas.iter_mut().find(|area| !area.used())?;
        area.occupant = Some(by);
        tracing::trace!("{} occupied by {}", area.id, by);
        Some((area.id, area.position))
    }

    /// Occupies a specific slot if it is free.
    pub fn occupy(&mut self, id: AreaId, by: CharacterId) -> bool {
        match self.area_mut(id) {
            Some(area) if !area.used() => {
                area.occupant = Some(by);
                true
            }
            Some(area) => {
                tracing::warn!("{} already occupied by {:?}", id, area.occupant);
                false
            }
            None => false,
        }
    }

    /// Frees a slot. Returns false if it was already free or does not exist.
    pub fn release(&mut self, id: AreaId) -> bool {
        match self.area_mut(id) {
            Some(area) if area.used() => {
                tracing::trace!("{} released by {:?}", id, area.occupant);
                area.occupant = None;
                true
            }
            Some(_) => {
                tracing::warn!("{} released twice", id);
                false
            }
            None => false,
        }
    }

    /// Frees every slot held by `by`. Returns how many were freed.
    pub fn release_all_of(&mut self, by: CharacterId) -> usize {
        let mut freed = 0;
        for area in self.areas.iter_mut().filter(|area| area.occupant == Some(by)) {
            area.occupant = None;
            freed += 1;
        }
        freed
    }

    fn area_mut(&mut self, id: AreaId) -> Option<&mut NodeArea> {
        let area = usize::try_from(id.0).ok().and_then(|index| self.areas.get_mut(index));
        if area.is_none() {
            tracing::warn!("unknown {}", id);
        }
        area
    }

    /// Looks up a slot.
    #[must_use]
    pub fn get(&self, id: AreaId) -> Option<&NodeArea> {
        self.areas.get(usize::try_from(id.0).ok()?)
    }

    /// Number of unoccupied slots.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.areas.iter().filter(|area| !area.used()).count()
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// Returns true if the board has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// All slots in id order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeArea> {
        self.areas.iter()
    }

    /// Removes every slot.
    pub fn clear(&mut self) {
        self.areas.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> AreaBoard {
        AreaBoard::with_positions(&[Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)])
    }

    #[test]
    fn test_occupy_free_fills_in_order() {
        let mut board = board();
        assert_eq!(board.occupy_free(CharacterId(1)), Some((AreaId(0), Vec3::new(1.0, 0.0, 0.0))));
        assert_eq!(board.occupy_free(CharacterId(2)), Some((AreaId(1), Vec3::new(2.0, 0.0, 0.0))));
        assert_eq!(board.occupy_free(CharacterId(3)), None);
        assert_eq!(board.free_count(), 0);
    }

    #[test]
    fn test_release_once() {
        let mut board = board();
        let (area, _) = board.occupy_free(CharacterId(1)).unwrap();
        assert!(board.release(area));
        assert!(!board.release(area));
        assert_eq!(board.free_count(), 2);
    }

    #[test]
    fn test_occupy_specific() {
        let mut board = board();
        assert!(board.occupy(AreaId(1), CharacterId(5)));
        assert!(!board.occupy(AreaId(1), CharacterId(6)));
        assert!(!board.occupy(AreaId(9), CharacterId(6)));
        assert_eq!(board.get(AreaId(1)).unwrap().occupant, Some(CharacterId(5)));
    }

    #[test]
    fn test_release_all_of() {
        let mut board = board();
        board.occupy(AreaId(0), CharacterId(4));
        board.occupy(AreaId(1), CharacterId(4));
        assert_eq!(board.release_all_of(CharacterId(4)), 2);
        assert!(board.iter().all(|area| !area.used()));
    }
}
