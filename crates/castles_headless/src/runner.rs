//! Single-match driver: ticks a simulation to completion while a
//! strategy answers the draft.

use castles_core::config::SimConfig;
use castles_core::draft::DraftPhase;
use castles_core::entities::Side;
use castles_core::error::SimError;
use castles_core::events::SimEvent;
use castles_core::math::Fixed;
use castles_core::simulation::Simulation;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::strategies::PickStrategy;

/// Milliseconds simulated per headless tick (60 Hz frame budget).
pub const TICK_MS: i64 = 16;

/// Outcome summary of one headless match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Seed the match ran under.
    pub seed: u64,
    /// Winning side, or `None` if the tick budget ran out.
    pub winner: Option<Side>,
    /// Ticks executed.
    pub ticks: u64,
    /// Simulation clock at the end, in milliseconds.
    pub sim_time_ms: i64,
    /// Units spawned by the left side.
    pub spawned_left: u32,
    /// Units spawned by the right side.
    pub spawned_right: u32,
    /// Draft turns resolved (both sides counted).
    pub turns_resolved: u32,
    /// Final state hash, for determinism comparisons.
    pub state_hash: u64,
}

/// Run one match to completion, forwarding every event to `observer`.
///
/// The observer sees events in tick order and can be a no-op closure;
/// the CLI uses it for `--events` tracing.
pub fn run_match_observed(
    config: SimConfig,
    strategy: &mut dyn PickStrategy,
    max_ticks: u64,
    mut observer: impl FnMut(&SimEvent),
) -> Result<MatchSummary, SimError> {
    let seed = config.rng_seed;
    let mut sim = Simulation::new(config)?;
    let dt = Fixed::from_num(TICK_MS);

    let mut spawned = [0u32; 2];
    let mut turns_resolved = 0u32;
    let mut ticks = 0u64;

    while ticks < max_ticks && !sim.is_over() {
        let events = sim.update(dt);
        ticks += 1;

        let mut pick = None;
        for event in &events {
            observer(event);
            match event {
                SimEvent::UnitSpawned { side, .. } => match side {
                    Side::Left => spawned[0] += 1,
                    Side::Right => spawned[1] += 1,
                },
                SimEvent::TurnResolved { .. } => turns_resolved += 1,
                SimEvent::TurnOpened { offered } => {
                    pick = strategy.pick_offer(offered, &sim);
                }
                _ => {}
            }
        }

        if let Some(index) = pick {
            if !sim.choose_offered(index) {
                debug!(index, "offered pick rejected");
            }
        }
        if sim.draft().phase() == DraftPhase::AwaitingReplacement {
            if let Some(slot) = strategy.pick_replacement(&sim) {
                apply_replacement(&mut sim, slot);
            }
        }
    }

    Ok(MatchSummary {
        seed,
        winner: sim.outcome(),
        ticks,
        sim_time_ms: sim.clock().to_num(),
        spawned_left: spawned[0],
        spawned_right: spawned[1],
        turns_resolved,
        state_hash: sim.state_hash(),
    })
}

/// Run one match to completion without observing events.
pub fn run_match(
    config: SimConfig,
    strategy: &mut dyn PickStrategy,
    max_ticks: u64,
) -> Result<MatchSummary, SimError> {
    run_match_observed(config, strategy, max_ticks, |_| {})
}

/// Commit a replacement, rotating past the one slot the controller may
/// refuse (the slot already holding the pending archetype).
fn apply_replacement(sim: &mut Simulation, preferred: usize) {
    let len = sim.board(Side::Left).len();
    for offset in 0..len {
        let slot = (preferred + offset) % len;
        if sim.choose_replacement(slot) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::{FirstOffer, Idle};

    #[test]
    fn test_match_runs_to_victory() {
        // One-hit castles: the first unit to cross the arena decides it.
        let config = SimConfig {
            rng_seed: 7,
            castle_base_hp: 1,
            ..SimConfig::default()
        };
        let mut strategy = FirstOffer;
        let summary = run_match(config, &mut strategy, 500_000).unwrap();

        assert!(summary.winner.is_some());
        assert!(summary.ticks < 500_000);
        assert!(summary.spawned_left > 0);
        assert!(summary.spawned_right > 0);
        assert!(summary.turns_resolved > 0);
    }

    #[test]
    fn test_budget_exhaustion_reports_draw() {
        let mut strategy = Idle;
        let summary = run_match(SimConfig::default(), &mut strategy, 5).unwrap();
        assert_eq!(summary.ticks, 5);
        assert!(summary.winner.is_none());
        assert_eq!(summary.sim_time_ms, 5 * TICK_MS);
    }

    #[test]
    fn test_same_seed_same_summary() {
        let config = || SimConfig {
            rng_seed: 42,
            ..SimConfig::default()
        };
        let a = run_match(config(), &mut FirstOffer, 20_000).unwrap();
        let b = run_match(config(), &mut FirstOffer, 20_000).unwrap();
        assert_eq!(a.state_hash, b.state_hash);
        assert_eq!(a.ticks, b.ticks);
        assert_eq!(a.winner, b.winner);
    }

    #[test]
    fn test_observer_sees_spawns() {
        let mut strategy = Idle;
        let mut spawns = 0;
        run_match_observed(SimConfig::default(), &mut strategy, 100, |event| {
            if matches!(event, SimEvent::UnitSpawned { .. }) {
                spawns += 1;
            }
        })
        .unwrap();
        assert!(spawns > 0);
    }
}
