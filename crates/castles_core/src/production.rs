//! Per-side production scheduler.
//!
//! Each side owns an ordered board of at most `max_active_slots`
//! producer slots. A slot manufactures one archetype on a timer; no
//! archetype may occupy two slots on the same side (cross-side
//! duplication is fine). Rejections return `false` with no mutation.

use crate::catalog::{ArchetypeId, UnitCatalog};
use crate::entities::Side;
use crate::math::TimeMs;

/// One production line: an archetype and its next spawn timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProducerSlot {
    /// Archetype being manufactured.
    pub archetype: ArchetypeId,
    /// Timestamp of the next spawn event.
    pub next_spawn: TimeMs,
}

/// The ordered producer slots of one side.
#[derive(Debug, Clone)]
pub struct ProducerBoard {
    side: Side,
    slots: Vec<ProducerSlot>,
    max_slots: usize,
}

impl ProducerBoard {
    /// Create an empty board for a side.
    #[must_use]
    pub fn new(side: Side, max_slots: usize) -> Self {
        Self {
            side,
            slots: Vec::with_capacity(max_slots),
            max_slots,
        }
    }

    /// Which side this board belongs to.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Current slots, in order.
    #[must_use]
    pub fn slots(&self) -> &[ProducerSlot] {
        &self.slots
    }

    /// Number of active slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the board has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check if the board is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.max_slots
    }

    /// Check if an archetype is already active on this board.
    #[must_use]
    pub fn contains(&self, archetype: ArchetypeId) -> bool {
        self.slots.iter().any(|s| s.archetype == archetype)
    }

    /// Index of the slot holding `archetype`, if any.
    #[must_use]
    pub fn position_of(&self, archetype: ArchetypeId) -> Option<usize> {
        self.slots.iter().position(|s| s.archetype == archetype)
    }

    /// Append a new producer slot.
    ///
    /// Fails (no mutation) if the archetype is already active on this
    /// side or the board is at capacity. The first spawn fires after the
    /// short grace delay rather than immediately.
    pub fn add_producer(&mut self, archetype: ArchetypeId, now: TimeMs, grace: TimeMs) -> bool {
        if self.contains(archetype) || self.is_full() {
            return false;
        }
        self.slots.push(ProducerSlot {
            archetype,
            next_spawn: now + grace,
        });
        true
    }

    /// Overwrite the slot at `index` with a fresh producer.
    ///
    /// Fails if the index is out of bounds, or if the archetype already
    /// occupies a *different* slot on this side. Replacing a slot with
    /// its own archetype is allowed and just resets the timer.
    pub fn replace_slot(
        &mut self,
        index: usize,
        archetype: ArchetypeId,
        now: TimeMs,
        grace: TimeMs,
    ) -> bool {
        if index >= self.slots.len() {
            return false;
        }
        if let Some(existing) = self.position_of(archetype) {
            if existing != index {
                return false;
            }
        }
        self.slots[index] = ProducerSlot {
            archetype,
            next_spawn: now + grace,
        };
        true
    }

    /// Collect archetypes whose spawn timers have elapsed, rescheduling
    /// each from its previous scheduled time (not from `now`, so one
    /// slow frame does not shift the whole cadence).
    ///
    /// At most one spawn per slot per call; a backlog drains across
    /// subsequent ticks.
    pub fn due_spawns(&mut self, now: TimeMs, catalog: &UnitCatalog) -> Vec<ArchetypeId> {
        let mut spawned = Vec::new();
        for slot in &mut self.slots {
            if now >= slot.next_spawn {
                let Some(archetype) = catalog.get(slot.archetype) else {
                    continue;
                };
                spawned.push(slot.archetype);
                slot.next_spawn += archetype.scaled.production_interval;
            }
        }
        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UnitCatalog;
    use crate::math::Fixed;

    const GRACE: Fixed = Fixed::from_bits(50 << 32);

    fn catalog() -> UnitCatalog {
        UnitCatalog::standard(Fixed::from_num(1)).unwrap()
    }

    fn ms(v: i64) -> TimeMs {
        Fixed::from_num(v)
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let catalog = catalog();
        let ant = catalog.id_by_key("ant").unwrap();
        let mut board = ProducerBoard::new(Side::Left, 6);

        assert!(board.add_producer(ant, ms(0), GRACE));
        assert!(!board.add_producer(ant, ms(0), GRACE));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_add_rejects_at_capacity() {
        let catalog = catalog();
        let mut board = ProducerBoard::new(Side::Left, 3);
        for key in ["ant", "bee", "rex"] {
            assert!(board.add_producer(catalog.id_by_key(key).unwrap(), ms(0), GRACE));
        }
        assert!(!board.add_producer(catalog.id_by_key("horse").unwrap(), ms(0), GRACE));
        assert_eq!(board.len(), 3);
    }

    #[test]
    fn test_replace_rejects_bad_index() {
        let catalog = catalog();
        let mut board = ProducerBoard::new(Side::Left, 6);
        board.add_producer(catalog.id_by_key("ant").unwrap(), ms(0), GRACE);

        assert!(!board.replace_slot(5, catalog.id_by_key("bee").unwrap(), ms(0), GRACE));
    }

    #[test]
    fn test_replace_rejects_cross_slot_duplicate() {
        let catalog = catalog();
        let ant = catalog.id_by_key("ant").unwrap();
        let bee = catalog.id_by_key("bee").unwrap();
        let mut board = ProducerBoard::new(Side::Left, 6);
        board.add_producer(ant, ms(0), GRACE);
        board.add_producer(bee, ms(0), GRACE);

        // Would put "ant" into two slots.
        assert!(!board.replace_slot(1, ant, ms(0), GRACE));
        // Same slot just resets the timer.
        assert!(board.replace_slot(0, ant, ms(100), GRACE));
        assert_eq!(board.slots()[0].next_spawn, ms(100) + GRACE);
    }

    #[test]
    fn test_cross_side_duplication_allowed() {
        let catalog = catalog();
        let ant = catalog.id_by_key("ant").unwrap();
        let mut left = ProducerBoard::new(Side::Left, 6);
        let mut right = ProducerBoard::new(Side::Right, 6);

        assert!(left.add_producer(ant, ms(0), GRACE));
        assert!(right.add_producer(ant, ms(0), GRACE));
    }

    #[test]
    fn test_due_spawns_reschedule_from_scheduled_time() {
        let catalog = catalog();
        let ant = catalog.id_by_key("ant").unwrap();
        let interval = catalog.get(ant).unwrap().scaled.production_interval;
        let mut board = ProducerBoard::new(Side::Left, 6);
        board.add_producer(ant, ms(0), GRACE);

        // Nothing due before the grace delay.
        assert!(board.due_spawns(ms(10), &catalog).is_empty());

        // Late tick: spawn fires, but the next one is measured from the
        // scheduled time (grace), not from the late observation point.
        let spawned = board.due_spawns(ms(400), &catalog);
        assert_eq!(spawned, vec![ant]);
        assert_eq!(board.slots()[0].next_spawn, GRACE + interval);
    }

    #[test]
    fn test_due_spawns_one_per_slot_per_tick() {
        let catalog = catalog();
        let ant = catalog.id_by_key("ant").unwrap();
        let mut board = ProducerBoard::new(Side::Left, 6);
        board.add_producer(ant, ms(0), GRACE);

        // Far in the future: still only one spawn per call.
        let spawned = board.due_spawns(ms(100_000), &catalog);
        assert_eq!(spawned.len(), 1);
    }

    #[test]
    fn test_uniqueness_invariant_held() {
        let catalog = catalog();
        let mut board = ProducerBoard::new(Side::Left, 6);
        for key in ["ant", "bee", "rex", "horse"] {
            board.add_producer(catalog.id_by_key(key).unwrap(), ms(0), GRACE);
        }
        board.replace_slot(2, catalog.id_by_key("tiger").unwrap(), ms(0), GRACE);

        let mut seen = std::collections::HashSet::new();
        for slot in board.slots() {
            assert!(seen.insert(slot.archetype), "duplicate archetype on side");
        }
    }
}
