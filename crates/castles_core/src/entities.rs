//! Live mutable battle state: units, projectiles, and the two castles.
//!
//! Units snapshot their combat stats from the catalog at spawn time, so
//! a catalog swap mid-match (not that the API allows one) could never
//! retroactively change live units. Removal is idempotent: destroying an
//! already-removed unit is a no-op, which damage cascades rely on.

use serde::{Deserialize, Serialize};

use crate::catalog::{ArchetypeId, Layer, MovementPattern, UnitArchetype};
use crate::config::SimConfig;
use crate::math::{Fixed, TimeMs};

/// Unique identifier for live units.
pub type UnitId = u64;

/// Unique identifier for live projectiles.
pub type ProjectileId = u64;

/// One of the two battling sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Attacks toward increasing x.
    Left,
    /// Attacks toward decreasing x.
    Right,
}

impl Side {
    /// The opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Forward direction along the arena: +1 for left, -1 for right.
    #[must_use]
    pub fn direction(self) -> Fixed {
        match self {
            Self::Left => Fixed::ONE,
            Self::Right => -Fixed::ONE,
        }
    }

    /// Both sides, in processing order.
    pub const BOTH: [Self; 2] = [Self::Left, Self::Right];

    const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// Combat stats snapshotted from an archetype at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    /// Damage per hit.
    pub damage: u32,
    /// Effective attack range: the archetype's ranged range, or the
    /// shared melee constant for non-ranged units.
    pub range: Fixed,
    /// Blast radius (0 = single-target).
    pub blast: Fixed,
    /// Scaled move speed in pixels per second.
    pub speed: Fixed,
    /// Scaled attack interval.
    pub attack_interval: TimeMs,
    /// Whether attacks are delivered via projectile.
    pub ranged: bool,
    /// Movement pattern class.
    pub pattern: MovementPattern,
}

impl UnitStats {
    /// Snapshot stats from an archetype under the given config.
    #[must_use]
    pub fn snapshot(archetype: &UnitArchetype, config: &SimConfig) -> Self {
        Self {
            damage: archetype.data.damage,
            range: if archetype.is_ranged() {
                archetype.scaled.range
            } else {
                config.melee_range
            },
            blast: archetype.scaled.blast,
            speed: archetype.scaled.speed,
            attack_interval: archetype.scaled.attack_interval,
            ranged: archetype.is_ranged(),
            pattern: archetype.data.pattern,
        }
    }
}

/// A live unit advancing along the lane.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Unique identity.
    pub id: UnitId,
    /// Owning side.
    pub side: Side,
    /// Horizontal position.
    pub x: Fixed,
    /// Locomotion layer.
    pub layer: Layer,
    /// Current hit points.
    pub hp: u32,
    /// Archetype this unit spawned from.
    pub archetype: ArchetypeId,
    /// Stats snapshotted at spawn.
    pub stats: UnitStats,
    /// Timestamp of the next eligible attack.
    pub next_attack_at: TimeMs,
    /// Movement-pattern phase accumulator.
    pub hop_phase: Fixed,
    /// Remaining "skip the first engagement" budget (hop pattern).
    pub skips_remaining: u8,
    /// Attack-lockout expiry (legacy variant; unused when the config
    /// leaves `attack_lock_ms` unset).
    pub lock_until: TimeMs,
}

impl Unit {
    /// Check if the unit is dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.hp == 0
    }

    /// Apply damage, returning the amount actually absorbed.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.hp);
        self.hp -= actual;
        actual
    }
}

/// A projectile in flight.
#[derive(Debug, Clone)]
pub struct Projectile {
    /// Unique identity.
    pub id: ProjectileId,
    /// Side that fired it.
    pub side: Side,
    /// Horizontal position.
    pub x: Fixed,
    /// Visual lane height in pixels; no gameplay effect.
    pub lane_y: Fixed,
    /// Signed horizontal velocity in pixels per second.
    pub velocity: Fixed,
    /// Damage carried (attacker's snapshot at fire time).
    pub damage: u32,
    /// Blast radius carried (0 = single-target).
    pub blast: Fixed,
    /// Layer this projectile can strike. `None` means castle-only.
    pub target_layer: Option<Layer>,
    /// Set when the projectile seeks the named side's castle.
    pub castle_target: Option<Side>,
}

/// One castle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Castle {
    /// Which side owns this castle.
    pub side: Side,
    /// Current hit points.
    pub hp: u32,
    /// Starting hit points; `hp` never exceeds this.
    pub base_hp: u32,
}

impl Castle {
    /// Create a castle at full health.
    #[must_use]
    pub const fn new(side: Side, base_hp: u32) -> Self {
        Self {
            side,
            hp: base_hp,
            base_hp,
        }
    }

    /// Apply damage, clamping at zero. Returns the new hit points.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        self.hp
    }

    /// Check if this castle has fallen.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.hp == 0
    }
}

/// Storage for all live battle entities.
///
/// Units and projectiles keep insertion order; each tick processes them
/// in that order. Lookups go through IDs so that iteration snapshots
/// stay valid across mid-tick removals.
#[derive(Debug, Clone)]
pub struct EntityStore {
    units: Vec<Unit>,
    projectiles: Vec<Projectile>,
    castles: [Castle; 2],
    next_unit_id: UnitId,
    next_projectile_id: ProjectileId,
}

impl EntityStore {
    /// Create a store with both castles at the given base health.
    #[must_use]
    pub fn new(castle_base_hp: u32) -> Self {
        Self {
            units: Vec::new(),
            projectiles: Vec::new(),
            castles: [
                Castle::new(Side::Left, castle_base_hp),
                Castle::new(Side::Right, castle_base_hp),
            ],
            next_unit_id: 1,
            next_projectile_id: 1,
        }
    }

    /// Spawn a unit from an archetype at the side's spawn position.
    pub fn spawn_unit(
        &mut self,
        side: Side,
        archetype: &UnitArchetype,
        config: &SimConfig,
    ) -> UnitId {
        let id = self.next_unit_id;
        self.next_unit_id += 1;

        let skips = match archetype.data.pattern {
            MovementPattern::Hop => 1,
            MovementPattern::Advance => 0,
        };

        self.units.push(Unit {
            id,
            side,
            x: config.spawn_x(side),
            layer: archetype.data.layer,
            hp: archetype.data.hp,
            archetype: archetype.id,
            stats: UnitStats::snapshot(archetype, config),
            next_attack_at: Fixed::ZERO,
            hop_phase: Fixed::ZERO,
            skips_remaining: skips,
            lock_until: Fixed::ZERO,
        });

        id
    }

    /// Insert a projectile, assigning it an ID.
    pub fn spawn_projectile(&mut self, mut projectile: Projectile) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        projectile.id = id;
        self.projectiles.push(projectile);
        id
    }

    /// Get a unit by ID.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Get a mutable unit by ID.
    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Remove a unit. Idempotent: returns false if already gone.
    pub fn remove_unit(&mut self, id: UnitId) -> bool {
        let before = self.units.len();
        self.units.retain(|u| u.id != id);
        self.units.len() != before
    }

    /// Remove a projectile. Idempotent.
    pub fn remove_projectile(&mut self, id: ProjectileId) -> bool {
        let before = self.projectiles.len();
        self.projectiles.retain(|p| p.id != id);
        self.projectiles.len() != before
    }

    /// All live units in store order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// All live projectiles in store order.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Get a projectile by ID.
    #[must_use]
    pub fn projectile(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    /// Get a mutable projectile by ID.
    pub fn projectile_mut(&mut self, id: ProjectileId) -> Option<&mut Projectile> {
        self.projectiles.iter_mut().find(|p| p.id == id)
    }

    /// Snapshot of live unit IDs in store order.
    #[must_use]
    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|u| u.id).collect()
    }

    /// Snapshot of live projectile IDs in store order.
    #[must_use]
    pub fn projectile_ids(&self) -> Vec<ProjectileId> {
        self.projectiles.iter().map(|p| p.id).collect()
    }

    /// Units on the side opposing `side`.
    pub fn enemies_of(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |u| u.side != side)
    }

    /// The castle belonging to `side`.
    #[must_use]
    pub fn castle(&self, side: Side) -> &Castle {
        &self.castles[side.index()]
    }

    /// Mutable access to the castle belonging to `side`.
    pub fn castle_mut(&mut self, side: Side) -> &mut Castle {
        &mut self.castles[side.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::UnitCatalog;

    fn setup() -> (EntityStore, UnitCatalog, SimConfig) {
        let config = SimConfig::default();
        let catalog = UnitCatalog::standard(config.global_scale).unwrap();
        let store = EntityStore::new(config.castle_base_hp);
        (store, catalog, config)
    }

    #[test]
    fn test_spawn_positions() {
        let (mut store, catalog, config) = setup();
        let ant = catalog.id_by_key("ant").unwrap();

        let left = store.spawn_unit(Side::Left, catalog.get(ant).unwrap(), &config);
        let right = store.spawn_unit(Side::Right, catalog.get(ant).unwrap(), &config);

        assert_eq!(store.unit(left).unwrap().x, config.spawn_x(Side::Left));
        assert_eq!(store.unit(right).unwrap().x, config.spawn_x(Side::Right));
    }

    #[test]
    fn test_stats_snapshot_melee_range() {
        let (mut store, catalog, config) = setup();
        let tiger = catalog.get(catalog.id_by_key("tiger").unwrap()).unwrap();
        let ghost = catalog.get(catalog.id_by_key("ghost").unwrap()).unwrap();

        let t = store.spawn_unit(Side::Left, tiger, &config);
        let g = store.spawn_unit(Side::Left, ghost, &config);

        assert_eq!(store.unit(t).unwrap().stats.range, config.melee_range);
        assert_eq!(store.unit(g).unwrap().stats.range, Fixed::from_num(170));
    }

    #[test]
    fn test_hop_units_get_skip_budget() {
        let (mut store, catalog, config) = setup();
        let eagle = catalog.get(catalog.id_by_key("eagle").unwrap()).unwrap();
        let ant = catalog.get(catalog.id_by_key("ant").unwrap()).unwrap();

        let e = store.spawn_unit(Side::Left, eagle, &config);
        let a = store.spawn_unit(Side::Left, ant, &config);

        assert_eq!(store.unit(e).unwrap().skips_remaining, 1);
        assert_eq!(store.unit(a).unwrap().skips_remaining, 0);
    }

    #[test]
    fn test_remove_unit_idempotent() {
        let (mut store, catalog, config) = setup();
        let ant = catalog.get(catalog.id_by_key("ant").unwrap()).unwrap();
        let id = store.spawn_unit(Side::Left, ant, &config);

        assert!(store.remove_unit(id));
        assert!(!store.remove_unit(id));
        assert!(store.unit(id).is_none());
    }

    #[test]
    fn test_castle_damage_clamps_at_zero() {
        let (mut store, _, _) = setup();
        let castle = store.castle_mut(Side::Right);
        assert_eq!(castle.apply_damage(5), 13);
        assert_eq!(castle.apply_damage(100), 0);
        assert!(castle.is_destroyed());
    }

    #[test]
    fn test_unit_damage_saturates() {
        let (mut store, catalog, config) = setup();
        let ghost = catalog.get(catalog.id_by_key("ghost").unwrap()).unwrap();
        let id = store.spawn_unit(Side::Left, ghost, &config);

        let unit = store.unit_mut(id).unwrap();
        assert_eq!(unit.apply_damage(99), 1);
        assert!(unit.is_dead());
    }
}
