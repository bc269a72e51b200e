//! Balance testing utilities for headless simulation.
//!
//! This module provides tools for running many simulated battles to
//! check matchup balance across the roster.

use castles_core::entities::Side;
use castles_core::math::Fixed;
use castles_core::simulation::Simulation;

use crate::fixtures::stage_duel;

/// Result of one simulated battle.
#[derive(Debug, Clone)]
pub struct BattleResult {
    /// The winning side (None if the tick budget ran out first).
    pub winner: Option<Side>,
    /// Simulation ticks elapsed.
    pub ticks: u64,
    /// Surviving left-side units at the end.
    pub left_units: usize,
    /// Surviving right-side units at the end.
    pub right_units: usize,
}

/// Statistics over a set of battles.
#[derive(Debug, Clone, Default)]
pub struct BattleStats {
    /// Total battles run.
    pub total_battles: u32,
    /// Wins for the left side.
    pub wins_left: u32,
    /// Wins for the right side.
    pub wins_right: u32,
    /// Draws (tick budget exhausted).
    pub draws: u32,
    /// Average ticks to resolution.
    pub avg_ticks: f64,
}

impl BattleStats {
    /// Win rate for the left side (0.0 to 1.0).
    #[must_use]
    pub fn win_rate_left(&self) -> f64 {
        if self.total_battles == 0 {
            return 0.5;
        }
        f64::from(self.wins_left) / f64::from(self.total_battles)
    }

    /// Check if the matchup is balanced (left win rate inside the range).
    #[must_use]
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.win_rate_left();
        rate >= min_rate && rate <= max_rate
    }

    fn record(&mut self, result: &BattleResult) {
        let n = f64::from(self.total_battles);
        self.avg_ticks = (self.avg_ticks * n + result.ticks as f64) / (n + 1.0);
        self.total_battles += 1;
        match result.winner {
            Some(Side::Left) => self.wins_left += 1,
            Some(Side::Right) => self.wins_right += 1,
            None => self.draws += 1,
        }
    }
}

/// Run a prepared simulation until a winner emerges or the tick budget
/// runs out.
pub fn run_battle(sim: &mut Simulation, max_ticks: u64) -> BattleResult {
    let dt = Fixed::from_num(crate::determinism::TICK_MS);
    let mut ticks = 0;
    while ticks < max_ticks && !sim.is_over() {
        sim.update(dt);
        ticks += 1;
    }

    let (left_units, right_units) = sim
        .store()
        .units()
        .iter()
        .fold((0, 0), |(l, r), u| match u.side {
            Side::Left => (l + 1, r),
            Side::Right => (l, r + 1),
        });

    BattleResult {
        winner: sim.outcome(),
        ticks,
        left_units,
        right_units,
    }
}

/// Run a 1v1 archetype matchup across several seeds and tally outcomes.
///
/// Each round stages one unit of each archetype mid-arena. Castles get
/// a single hit point so the duel survivor's breach decides the round
/// instead of stalling into a draw.
pub fn duel_matchup(left_key: &str, right_key: &str, rounds: u32, max_ticks: u64) -> BattleStats {
    let mut stats = BattleStats::default();
    for seed in 0..u64::from(rounds) {
        let config = castles_core::config::SimConfig {
            rng_seed: seed,
            castle_base_hp: 1,
            ..crate::fixtures::duel_config()
        };
        let mut sim =
            Simulation::new(config).expect("stock catalog loads under duel config");
        stage_duel(&mut sim, left_key, right_key, 60);
        let result = run_battle(&mut sim, max_ticks);
        stats.record(&result);
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::duel_sim_seeded;

    #[test]
    fn test_run_battle_respects_budget() {
        let mut sim = duel_sim_seeded(0);
        // Two tanks trading 1 damage take a long time; a tiny budget
        // must stop early with no winner.
        stage_duel(&mut sim, "sauropod", "sauropod", 40);
        let result = run_battle(&mut sim, 10);
        assert_eq!(result.ticks, 10);
        assert!(result.winner.is_none());
    }

    #[test]
    fn test_mirror_matchup_resolves() {
        // With 1 HP castles a mirror duel always ends: the survivor
        // breaches and wins. Store order favors the left unit, so the
        // left side sweeps a same-speed mirror.
        let stats = duel_matchup("ant", "ant", 4, 50_000);
        assert_eq!(stats.total_battles, 4);
        assert_eq!(stats.draws, 0);
        assert_eq!(stats.wins_left + stats.wins_right, 4);
    }

    #[test]
    fn test_predator_beats_prey() {
        // Rex (13 damage) one-shots horses (3 HP) in melee.
        let stats = duel_matchup("rex", "horse", 3, 50_000);
        assert_eq!(stats.wins_left, 3);
        assert!(stats.is_balanced(1.0, 1.0));
    }
}
