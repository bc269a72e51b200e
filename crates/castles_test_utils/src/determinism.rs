//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A battle must replay identically from its seed. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different
//!   results. All simulation arithmetic uses fixed-point via
//!   [`castles_core::math::Fixed`].
//!
//! - **System randomness**: Tie-breaks, quartet draws, and auto-picks
//!   all draw from one `ChaCha8Rng` seeded from the config; nothing
//!   touches entropy at runtime.
//!
//! - **Iteration order**: Units and projectiles live in insertion-order
//!   vectors, never hash maps, so processing order is stable.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual module determinism (combat, draft, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full match scenarios are reproducible
//! 4. **Parallel tests**: Running N simulations in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use castles_core::math::Fixed;
use castles_core::simulation::Simulation;

/// The tick size the harness drives simulations with, in milliseconds.
pub const TICK_MS: i64 = 16;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Advance a simulation by one harness tick.
pub fn tick(sim: &mut Simulation) {
    sim.update(Fixed::from_num(TICK_MS));
}

/// Simplified determinism verification for [`Simulation`].
///
/// Runs the simulation twice with identical setup and verifies the final
/// state hashes match exactly.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(2, num_ticks, &setup_fn, tick, Simulation::state_hash);
    result.is_deterministic
}

/// Run N simulations in parallel using scoped threads and collect final
/// hashes.
///
/// This is useful for catching non-determinism that only manifests
/// under thread scheduling variations, memory layout differences, etc.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        tick(&mut sim);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// Useful for debugging non-determinism by finding exactly when
/// simulations start to differ.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    // Check initial state
    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick_no in 1..=num_ticks {
        tick(&mut sim1);
        tick(&mut sim2);

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick_no);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of simulation determinism.
pub mod strategies {
    use proptest::prelude::*;

    use castles_core::math::Fixed;

    /// Generate a lane position between the two castle faces.
    pub fn arb_lane_position() -> impl Strategy<Value = Fixed> {
        (100i32..1100i32).prop_map(Fixed::from_num)
    }

    /// Generate a per-tick delta time in milliseconds (1 to the default
    /// frame clamp).
    pub fn arb_dt_ms() -> impl Strategy<Value = Fixed> {
        (1i32..=50i32).prop_map(Fixed::from_num)
    }

    /// Generate a sequence of delta times for a variable-framerate run.
    pub fn arb_dt_sequence(max_len: usize) -> impl Strategy<Value = Vec<Fixed>> {
        proptest::collection::vec(arb_dt_ms(), 1..max_len)
    }

    /// Generate an RNG seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Generate health values (1-50, the catalog's working range).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..50u32
    }

    /// Generate damage values (1-20).
    pub fn arb_damage() -> impl Strategy<Value = u32> {
        1u32..20u32
    }

    /// Generate an index into the stock 19-archetype roster.
    pub fn arb_roster_index() -> impl Strategy<Value = usize> {
        0usize..19usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{duel_sim_seeded, stage_duel};
    use castles_core::config::SimConfig;
    use proptest::prelude::*;

    fn default_sim_with_seed(seed: u64) -> Simulation {
        let config = SimConfig {
            rng_seed: seed,
            ..SimConfig::default()
        };
        Simulation::new(config).unwrap()
    }

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_full_match_determinism() {
        // Full default match: production, drafting via auto-pick, and
        // combat over roughly 48 simulated seconds.
        let result = verify_determinism(
            3,
            3_000,
            || default_sim_with_seed(7),
            tick,
            Simulation::state_hash,
        );
        result.assert_deterministic();
    }

    #[test]
    fn test_staged_duel_determinism() {
        assert!(verify_simulation_determinism(
            || {
                let mut sim = duel_sim_seeded(11);
                stage_duel(&mut sim, "tiger", "rex", 200);
                stage_duel(&mut sim, "ghost", "mermaid", 600);
                sim
            },
            1_000,
        ));
    }

    #[test]
    fn test_find_divergence_on_deterministic_sim() {
        let divergence = find_first_divergence(|| default_sim_with_seed(3), 500);
        assert!(divergence.is_none(), "Expected no divergence");
    }

    #[test]
    fn test_parallel_full_matches() {
        let result = run_parallel_simulations_scoped(|| default_sim_with_seed(21), 4, 1_000);
        result.assert_deterministic();
    }

    proptest! {
        /// Any seed must produce a reproducible match.
        #[test]
        fn prop_random_seeds_are_deterministic(seed in strategies::arb_seed()) {
            let result = verify_determinism(
                2,
                300,
                move || default_sim_with_seed(seed),
                tick,
                Simulation::state_hash,
            );
            prop_assert!(result.is_deterministic);
        }

        /// A variable-framerate run must replay identically: dt is data,
        /// not entropy.
        #[test]
        fn prop_dt_sequences_replay_identically(
            dts in strategies::arb_dt_sequence(200),
        ) {
            let run = |dts: &[castles_core::math::Fixed]| {
                let mut sim = default_sim_with_seed(5);
                for &dt in dts {
                    sim.update(dt);
                }
                sim.state_hash()
            };
            prop_assert_eq!(run(&dts), run(&dts));
        }

        /// Random staged positions must not introduce divergence.
        #[test]
        fn prop_staged_positions_are_deterministic(
            left_x in 100i32..550,
            right_x in 650i32..1100,
        ) {
            let setup = move || {
                let mut sim = duel_sim_seeded(9);
                sim.spawn_unit_at(
                    castles_core::entities::Side::Left,
                    "ant",
                    Fixed::from_num(left_x),
                ).unwrap();
                sim.spawn_unit_at(
                    castles_core::entities::Side::Right,
                    "fencer",
                    Fixed::from_num(right_x),
                ).unwrap();
                sim
            };
            prop_assert!(verify_simulation_determinism(setup, 400));
        }
    }
}
