//! Scripted draft strategies for the controlled side.
//!
//! Headless runs have no player, so something must answer the draft
//! turns. A strategy gets asked once when a turn opens and once per tick
//! while a replacement slot is awaited; returning `None` lets the turn
//! deadline resolve the pick instead.

use castles_core::catalog::ArchetypeId;
use castles_core::entities::Side;
use castles_core::simulation::Simulation;

/// Decides the controlled side's draft inputs during a headless match.
pub trait PickStrategy: Send {
    /// Strategy name for logs and batch records.
    fn name(&self) -> &'static str;

    /// Called when a draft turn opens. Return an index into the offered
    /// pair, or `None` to sit the turn out.
    fn pick_offer(&mut self, offered: &[ArchetypeId; 2], sim: &Simulation) -> Option<usize>;

    /// Called while a replacement slot is awaited. Return the board slot
    /// to overwrite, or `None` to let the deadline choose.
    fn pick_replacement(&mut self, sim: &Simulation) -> Option<usize>;
}

/// Always takes the first offer and recycles the oldest board slot.
#[derive(Debug, Default)]
pub struct FirstOffer;

impl PickStrategy for FirstOffer {
    fn name(&self) -> &'static str {
        "first"
    }

    fn pick_offer(&mut self, _offered: &[ArchetypeId; 2], _sim: &Simulation) -> Option<usize> {
        Some(0)
    }

    fn pick_replacement(&mut self, _sim: &Simulation) -> Option<usize> {
        Some(0)
    }
}

/// Never acts; every turn resolves through its deadline.
#[derive(Debug, Default)]
pub struct Idle;

impl PickStrategy for Idle {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn pick_offer(&mut self, _offered: &[ArchetypeId; 2], _sim: &Simulation) -> Option<usize> {
        None
    }

    fn pick_replacement(&mut self, _sim: &Simulation) -> Option<usize> {
        None
    }
}

/// Alternates between the two offers and rotates the replacement slot,
/// churning through as much of the roster as the draws allow.
#[derive(Debug, Default)]
pub struct RoundRobin {
    turn: usize,
}

impl PickStrategy for RoundRobin {
    fn name(&self) -> &'static str {
        "round-robin"
    }

    fn pick_offer(&mut self, _offered: &[ArchetypeId; 2], _sim: &Simulation) -> Option<usize> {
        let index = self.turn % 2;
        self.turn += 1;
        Some(index)
    }

    fn pick_replacement(&mut self, sim: &Simulation) -> Option<usize> {
        let len = sim.board(Side::Left).len();
        if len == 0 {
            return None;
        }
        Some(self.turn % len)
    }
}

/// Look up a strategy by its CLI name.
#[must_use]
pub fn by_name(name: &str) -> Option<Box<dyn PickStrategy>> {
    match name {
        "first" => Some(Box::<FirstOffer>::default()),
        "idle" => Some(Box::<Idle>::default()),
        "round-robin" => Some(Box::<RoundRobin>::default()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castles_test_utils::fixtures::duel_sim;

    #[test]
    fn test_by_name_covers_all_strategies() {
        for name in ["first", "idle", "round-robin"] {
            let strategy = by_name(name).unwrap();
            assert_eq!(strategy.name(), name);
        }
        assert!(by_name("greedy").is_none());
    }

    #[test]
    fn test_round_robin_alternates_offers() {
        let sim = duel_sim();
        let mut strategy = RoundRobin::default();
        let offered = [ArchetypeId(0), ArchetypeId(1)];
        assert_eq!(strategy.pick_offer(&offered, &sim), Some(0));
        assert_eq!(strategy.pick_offer(&offered, &sim), Some(1));
        assert_eq!(strategy.pick_offer(&offered, &sim), Some(0));
    }
}
