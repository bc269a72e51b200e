//! Test fixtures and helpers.
//!
//! Pre-built configs and staging helpers for consistent testing.

use castles_core::config::SimConfig;
use castles_core::entities::{Side, UnitId};
use castles_core::math::Fixed;
use castles_core::simulation::Simulation;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Config for staged duels: no global scaling, and drafting plus
/// production pushed far beyond any test horizon so staged units see
/// raw archetype numbers and no background spawns.
#[must_use]
pub fn duel_config() -> SimConfig {
    SimConfig {
        global_scale: Fixed::ONE,
        producer_grace_ms: fixed(1_000_000_000),
        turn_ms: fixed(1_000_000_000),
        inter_turn_ms: fixed(1_000_000_000),
        ..SimConfig::default()
    }
}

/// A quiet simulation ready for hand-placed units.
///
/// # Panics
///
/// Panics if the stock catalog fails to load, which only happens on a
/// broken roster definition.
#[must_use]
pub fn duel_sim() -> Simulation {
    Simulation::new(duel_config()).expect("stock catalog loads under duel config")
}

/// A quiet simulation with a chosen RNG seed.
///
/// # Panics
///
/// Panics if the stock catalog fails to load.
#[must_use]
pub fn duel_sim_seeded(seed: u64) -> Simulation {
    let config = SimConfig {
        rng_seed: seed,
        ..duel_config()
    };
    Simulation::new(config).expect("stock catalog loads under duel config")
}

/// Stage two archetypes facing each other at mid-arena, `gap` pixels
/// apart. Returns (left unit, right unit).
///
/// # Panics
///
/// Panics if either key names no archetype.
pub fn stage_duel(
    sim: &mut Simulation,
    left_key: &str,
    right_key: &str,
    gap: i32,
) -> (UnitId, UnitId) {
    let mid = sim.config().arena_width / fixed(2);
    let half = fixed(gap) / fixed(2);
    let left = sim
        .spawn_unit_at(Side::Left, left_key, mid - half)
        .expect("left archetype exists");
    let right = sim
        .spawn_unit_at(Side::Right, right_key, mid + half)
        .expect("right archetype exists");
    (left, right)
}
