//! Combat and targeting: eligibility, range, candidate selection, damage
//! application, and projectile flight.
//!
//! Targeting rules in brief: castles are always eligible; melee engages
//! only within its own locomotion layer; grounded ranged hits either
//! layer; airborne ranged hits only air. A target must also lie in the
//! attacker's forward direction and within effective range.
//!
//! Damage application is defensive throughout: a blast can destroy units
//! that the current tick has not visited yet, so every helper re-checks
//! liveness through the store before touching a unit.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::catalog::Layer;
use crate::config::{HopTuning, SimConfig};
use crate::entities::{EntityStore, Side, Unit, UnitId};
use crate::events::SimEvent;
use crate::math::{dist_x, fixed_sin01, Fixed};

/// One enemy unit that passed eligibility and range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// The eligible enemy.
    pub id: UnitId,
    /// Horizontal distance from the attacker.
    pub distance: Fixed,
}

/// Pluggable target-choice rule over an eligibility-sorted candidate
/// list.
///
/// The random two-way tie-break is a deliberate, observable balance rule
/// rather than an implementation artifact, so it lives behind a trait:
/// tests can swap in [`NearestSelector`] for full determinism without a
/// seeded RNG.
pub trait TargetSelector: std::fmt::Debug + Send {
    /// Pick an index into `candidates` (sorted by ascending distance),
    /// or `None` to decline.
    fn select(&mut self, candidates: &[Candidate], rng: &mut ChaCha8Rng) -> Option<usize>;
}

/// The standard rule: with exactly two candidates pick uniformly at
/// random between them, otherwise take the nearest.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSelector;

impl TargetSelector for StandardSelector {
    fn select(&mut self, candidates: &[Candidate], rng: &mut ChaCha8Rng) -> Option<usize> {
        match candidates.len() {
            0 => None,
            2 => Some(rng.gen_range(0..2)),
            _ => Some(0),
        }
    }
}

/// Always the nearest candidate. Deterministic drop-in for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestSelector;

impl TargetSelector for NearestSelector {
    fn select(&mut self, candidates: &[Candidate], _rng: &mut ChaCha8Rng) -> Option<usize> {
        if candidates.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

/// Layer-eligibility rule between an attacker and a candidate unit.
#[must_use]
pub fn can_target(attacker: &Unit, candidate: &Unit) -> bool {
    if attacker.stats.ranged {
        match attacker.layer {
            // Grounded ranged threatens both layers.
            Layer::Ground => true,
            // Airborne ranged only duels other flyers.
            Layer::Air => candidate.layer == Layer::Air,
        }
    } else {
        // Melee never crosses layers.
        attacker.layer == candidate.layer
    }
}

/// Check the forward-direction rule: left-side units only engage targets
/// at equal-or-greater x, right-side units at equal-or-lesser x.
#[must_use]
pub fn facing_ok(side: Side, from_x: Fixed, target_x: Fixed) -> bool {
    match side {
        Side::Left => target_x >= from_x,
        Side::Right => target_x <= from_x,
    }
}

/// Facing plus distance against an explicit range.
#[must_use]
pub fn in_range(attacker: &Unit, target_x: Fixed, range: Fixed) -> bool {
    facing_ok(attacker.side, attacker.x, target_x) && dist_x(attacker.x, target_x) <= range
}

/// Check if any live enemy unit satisfies eligibility and range against
/// this unit. Engaged units hold position for the tick, whatever target
/// the selection rule then lands on.
#[must_use]
pub fn is_engaged(attacker: &Unit, store: &EntityStore) -> bool {
    store
        .enemies_of(attacker.side)
        .any(|enemy| can_target(attacker, enemy) && in_range(attacker, enemy.x, attacker.stats.range))
}

/// Gather all eligible in-range enemy units, sorted by ascending
/// horizontal distance (store order breaks exact ties).
#[must_use]
pub fn candidates(attacker: &Unit, store: &EntityStore) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = store
        .enemies_of(attacker.side)
        .filter(|enemy| can_target(attacker, enemy) && in_range(attacker, enemy.x, attacker.stats.range))
        .map(|enemy| Candidate {
            id: enemy.id,
            distance: dist_x(attacker.x, enemy.x),
        })
        .collect();
    out.sort_by(|a, b| a.distance.cmp(&b.distance));
    out
}

/// Per-tick displacement multiplier for the hop gait.
///
/// Samples the normalized sine of `phase * frequency` against the duty
/// threshold: below it the slow factor applies, at or above it the fast
/// factor, both under the overall gain.
#[must_use]
pub fn hop_multiplier(phase: Fixed, hop: &HopTuning) -> Fixed {
    let wave = fixed_sin01(phase * hop.frequency);
    let burst = if wave < hop.duty {
        hop.slow_factor
    } else {
        hop.fast_factor
    };
    burst * hop.gain
}

/// Apply damage to one unit, removing it if it dies. No-op when the
/// unit is already gone (idempotent destruction).
pub fn apply_unit_damage(
    store: &mut EntityStore,
    id: UnitId,
    amount: u32,
    events: &mut Vec<SimEvent>,
) {
    let Some(unit) = store.unit_mut(id) else {
        return;
    };
    let (x, layer) = (unit.x, unit.layer);
    unit.apply_damage(amount);
    let dead = unit.is_dead();

    events.push(SimEvent::UnitDamaged {
        id,
        x,
        layer,
        amount,
    });
    if dead {
        store.remove_unit(id);
        events.push(SimEvent::UnitDestroyed { id });
    }
}

/// Apply area damage around an impact point: every enemy of `side`
/// sharing `layer` within `blast` of `center_x` takes the full amount.
/// The blast never crosses locomotion layers.
pub fn apply_splash(
    store: &mut EntityStore,
    side: Side,
    center_x: Fixed,
    layer: Layer,
    blast: Fixed,
    damage: u32,
    events: &mut Vec<SimEvent>,
) {
    // Snapshot victims first: applying damage mutates the store and may
    // remove units before we reach them.
    let victims: Vec<UnitId> = store
        .enemies_of(side)
        .filter(|e| e.layer == layer && dist_x(e.x, center_x) <= blast)
        .map(|e| e.id)
        .collect();

    for id in victims {
        apply_unit_damage(store, id, damage, events);
    }
}

/// Apply damage to a castle, clamping at zero. Returns `true` if the
/// castle fell.
pub fn damage_castle(
    store: &mut EntityStore,
    side: Side,
    amount: u32,
    events: &mut Vec<SimEvent>,
) -> bool {
    let castle = store.castle_mut(side);
    let hp = castle.apply_damage(amount);
    events.push(SimEvent::CastleDamaged { side, hp, amount });
    hp == 0
}

/// Advance every projectile by `dt` and resolve impacts.
///
/// Returns the winning side if a castle-seeking projectile ended the
/// match; remaining projectiles are left untouched in that case.
pub fn advance_projectiles(
    store: &mut EntityStore,
    dt_seconds: Fixed,
    config: &SimConfig,
    events: &mut Vec<SimEvent>,
) -> Option<Side> {
    for id in store.projectile_ids() {
        let Some(projectile) = store.projectile_mut(id) else {
            continue;
        };
        projectile.x += projectile.velocity * dt_seconds;
        let (x, side, damage, blast, target_layer, castle_target) = (
            projectile.x,
            projectile.side,
            projectile.damage,
            projectile.blast,
            projectile.target_layer,
            projectile.castle_target,
        );
        events.push(SimEvent::ProjectileMoved { id, x });

        // Leaving the arena destroys the projectile with no effect.
        if x < Fixed::ZERO || x > config.arena_width {
            store.remove_projectile(id);
            events.push(SimEvent::ProjectileRemoved { id });
            continue;
        }

        if let Some(target_side) = castle_target {
            let face = config.castle_face_x(target_side);
            let crossed = match side {
                Side::Left => x >= face,
                Side::Right => x <= face,
            };
            if crossed {
                store.remove_projectile(id);
                events.push(SimEvent::ProjectileRemoved { id });
                let amount = damage * config.castle_contact_multiplier;
                if damage_castle(store, target_side, amount, events) {
                    return Some(target_side.opponent());
                }
            }
            continue;
        }

        // Unit-seeking: detonate on the first tick some matching live
        // enemy sits within the hit radius.
        let hit = store
            .enemies_of(side)
            .filter(|e| {
                target_layer.map_or(true, |layer| e.layer == layer)
                    && dist_x(e.x, x) < config.projectile_hit_radius
            })
            .min_by(|a, b| dist_x(a.x, x).cmp(&dist_x(b.x, x)))
            .map(|e| e.id);

        if let Some(victim) = hit {
            store.remove_projectile(id);
            events.push(SimEvent::ProjectileRemoved { id });
            if blast > Fixed::ZERO {
                if let Some(layer) = target_layer {
                    apply_splash(store, side, x, layer, blast, damage, events);
                }
            } else {
                apply_unit_damage(store, victim, damage, events);
            }
        }
    }

    None
}
