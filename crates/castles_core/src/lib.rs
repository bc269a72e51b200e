//! # Castles Core
//!
//! Deterministic lane-battle simulation core for Castles Clash.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness (one seeded RNG per simulation)
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs and balance sweeps
//! - Determinism testing (seed in, identical state hashes out)
//! - Multiple independent simulations in one process
//!
//! ## Crate Structure
//!
//! - [`catalog`] - Static unit archetype table and global-scale derivation
//! - [`config`] - Static per-match settings
//! - [`entities`] - Live units, projectiles, and castles
//! - [`production`] - Per-side producer slots and spawn scheduling
//! - [`combat`] - Targeting, damage, and projectile flight
//! - [`draft`] - Turn-based drafting state machine
//! - [`simulation`] - The match context and per-tick driver
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod combat;
pub mod config;
pub mod draft;
pub mod entities;
pub mod error;
pub mod events;
pub mod math;
pub mod production;
pub mod simulation;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{ArchetypeData, ArchetypeId, Layer, MovementPattern, UnitCatalog};
    pub use crate::combat::{NearestSelector, StandardSelector, TargetSelector};
    pub use crate::config::{HopTuning, SimConfig};
    pub use crate::draft::{DraftController, DraftPhase};
    pub use crate::entities::{Castle, EntityStore, Projectile, Side, Unit, UnitId};
    pub use crate::error::{Result, SimError};
    pub use crate::events::{PickApplication, SimEvent};
    pub use crate::math::{Fixed, TimeMs};
    pub use crate::production::{ProducerBoard, ProducerSlot};
    pub use crate::simulation::Simulation;
}
