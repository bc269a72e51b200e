//! Simulation events emitted toward rendering and UI collaborators.
//!
//! Events are fire-and-forget notifications: the simulation never waits
//! on, nor accepts anything back from, their consumers. Each call to
//! [`crate::simulation::Simulation::update`] returns the events raised
//! during that tick, in the order they occurred.

use crate::catalog::{ArchetypeId, Layer};
use crate::entities::{ProjectileId, Side, UnitId};
use crate::math::Fixed;

/// How a resolved draft pick was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickApplication {
    /// Appended as a fresh producer slot.
    Added,
    /// Overwrote the producer slot at this index.
    Replaced(usize),
}

/// One notification raised during a simulation tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// A producer slot spawned a unit.
    UnitSpawned {
        /// Spawned unit.
        id: UnitId,
        /// Owning side.
        side: Side,
        /// Archetype spawned.
        archetype: ArchetypeId,
        /// Spawn position.
        x: Fixed,
        /// Locomotion layer.
        layer: Layer,
    },
    /// A unit's position changed this tick.
    UnitMoved {
        /// Moved unit.
        id: UnitId,
        /// New position.
        x: Fixed,
    },
    /// A unit took damage.
    UnitDamaged {
        /// Damaged unit.
        id: UnitId,
        /// Position at the moment of damage.
        x: Fixed,
        /// Layer, for effect placement.
        layer: Layer,
        /// Damage applied.
        amount: u32,
    },
    /// A unit was removed (death or castle breach).
    UnitDestroyed {
        /// Removed unit.
        id: UnitId,
    },
    /// A ranged attack launched a projectile.
    ProjectileSpawned {
        /// New projectile.
        id: ProjectileId,
        /// Firing side.
        side: Side,
        /// Launch position.
        x: Fixed,
        /// Visual lane height.
        lane_y: Fixed,
        /// Glyph of the firing archetype's projectile, if any.
        glyph: Option<String>,
    },
    /// A projectile advanced this tick.
    ProjectileMoved {
        /// Projectile in flight.
        id: ProjectileId,
        /// New position.
        x: Fixed,
    },
    /// A projectile impacted or left the arena.
    ProjectileRemoved {
        /// Removed projectile.
        id: ProjectileId,
    },
    /// A castle's health changed.
    CastleDamaged {
        /// Castle owner.
        side: Side,
        /// Health after the hit.
        hp: u32,
        /// Damage applied.
        amount: u32,
    },
    /// The match ended.
    MatchEnded {
        /// Winning side.
        winner: Side,
    },
    /// A draft turn opened for the controlled side.
    TurnOpened {
        /// The two archetypes offered to the controlled side.
        offered: [ArchetypeId; 2],
    },
    /// One side committed its draft pick.
    TurnResolved {
        /// Side that committed.
        side: Side,
        /// Archetype chosen.
        archetype: ArchetypeId,
        /// Whether it was added or replaced into a slot.
        application: PickApplication,
    },
}
