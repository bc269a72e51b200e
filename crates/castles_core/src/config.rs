//! Static simulation settings, read once at initialization.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::math::{fixed_serde, option_fixed_serde, Fixed, TimeMs};

/// Hop-gait modulation constants.
///
/// The hop pattern samples a normalized sine of the unit's phase
/// accumulator against `duty`: below it the displacement is multiplied
/// by `slow_factor`, above it by `fast_factor`, and the whole thing by
/// `gain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopTuning {
    /// Phase frequency multiplier applied to the accumulated phase.
    #[serde(with = "fixed_serde")]
    pub frequency: Fixed,
    /// Duty-cycle threshold on the normalized sine in [0, 1].
    #[serde(with = "fixed_serde")]
    pub duty: Fixed,
    /// Displacement multiplier below the duty threshold.
    #[serde(with = "fixed_serde")]
    pub slow_factor: Fixed,
    /// Displacement multiplier at or above the duty threshold.
    #[serde(with = "fixed_serde")]
    pub fast_factor: Fixed,
    /// Overall pattern multiplier.
    #[serde(with = "fixed_serde")]
    pub gain: Fixed,
}

impl Default for HopTuning {
    fn default() -> Self {
        Self {
            frequency: Fixed::from_num(8),
            duty: Fixed::unwrapped_from_str("0.8"),
            slow_factor: Fixed::unwrapped_from_str("0.5"),
            fast_factor: Fixed::from_num(2),
            gain: Fixed::ONE,
        }
    }
}

/// Static settings structure for one simulation.
///
/// Everything here is fixed for the lifetime of a match. The global
/// scale is applied exactly once, when the catalog derives its scaled
/// stats; nothing else may consult it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Global scale: <1 slows everything down, >1 speeds everything up.
    #[serde(with = "fixed_serde")]
    pub global_scale: Fixed,

    /// Arena width in pixels.
    #[serde(with = "fixed_serde")]
    pub arena_width: Fixed,
    /// Width of each castle's footprint; a unit crossing the opposing
    /// face boundary breaches.
    #[serde(with = "fixed_serde")]
    pub castle_width: Fixed,
    /// Castle starting hit points.
    pub castle_base_hp: u32,
    /// Multiplier applied to a unit's damage when it hits a castle
    /// (breach, melee, or projectile).
    pub castle_contact_multiplier: u32,

    /// Shared melee engagement range in pixels.
    #[serde(with = "fixed_serde")]
    pub melee_range: Fixed,
    /// Projectile base speed in pixels per second (pre-scale).
    #[serde(with = "fixed_serde")]
    pub projectile_base_speed: Fixed,
    /// Radius within which a unit-seeking projectile detonates.
    #[serde(with = "fixed_serde")]
    pub projectile_hit_radius: Fixed,

    /// Horizontal inset from a castle face where that side's units spawn.
    #[serde(with = "fixed_serde")]
    pub spawn_margin: Fixed,
    /// Grace delay before a freshly assigned producer slot's first spawn.
    #[serde(with = "fixed_serde")]
    pub producer_grace_ms: TimeMs,
    /// Maximum concurrent producer slots per side.
    pub max_active_slots: usize,

    /// Duration of one draft turn before auto-pick.
    #[serde(with = "fixed_serde")]
    pub turn_ms: TimeMs,
    /// Delay between a resolved turn and the next turn opening.
    #[serde(with = "fixed_serde")]
    pub inter_turn_ms: TimeMs,
    /// Percent chance (0-100) that a timed-out turn auto-picks the first
    /// of the two offered archetypes.
    pub auto_pick_first_percent: u8,

    /// Per-call dt clamp: bounds catch-up bursts after a stall.
    #[serde(with = "fixed_serde")]
    pub max_frame_ms: TimeMs,

    /// Optional legacy variant: immobilize a unit for this long after it
    /// attacks. `None` (the default) uses pure range-gated holding.
    #[serde(default, with = "option_fixed_serde")]
    pub attack_lock_ms: Option<TimeMs>,

    /// Hop-gait modulation constants.
    pub hop: HopTuning,

    /// Seed for the simulation's PRNG.
    pub rng_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            global_scale: Fixed::unwrapped_from_str("0.2"),
            arena_width: Fixed::from_num(1200),
            castle_width: Fixed::from_num(80),
            castle_base_hp: 18,
            castle_contact_multiplier: 1,
            melee_range: Fixed::from_num(28),
            projectile_base_speed: Fixed::from_num(320),
            projectile_hit_radius: Fixed::from_num(10),
            spawn_margin: Fixed::from_num(14),
            producer_grace_ms: Fixed::from_num(50),
            max_active_slots: 6,
            turn_ms: Fixed::from_num(10_000),
            inter_turn_ms: Fixed::from_num(10_000),
            auto_pick_first_percent: 50,
            max_frame_ms: Fixed::from_num(50),
            attack_lock_ms: None,
            hop: HopTuning::default(),
            rng_seed: 0,
        }
    }
}

impl SimConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for values that would make the
    /// simulation degenerate.
    pub fn validate(&self) -> Result<()> {
        if self.global_scale <= Fixed::ZERO {
            return Err(SimError::InvalidConfig(
                "global_scale must be positive".to_string(),
            ));
        }
        if self.arena_width <= self.castle_width * 2 {
            return Err(SimError::InvalidConfig(
                "arena_width must exceed both castle footprints".to_string(),
            ));
        }
        if self.castle_base_hp == 0 {
            return Err(SimError::InvalidConfig(
                "castle_base_hp must be nonzero".to_string(),
            ));
        }
        if self.max_active_slots == 0 {
            return Err(SimError::InvalidConfig(
                "max_active_slots must be nonzero".to_string(),
            ));
        }
        if self.auto_pick_first_percent > 100 {
            return Err(SimError::InvalidConfig(
                "auto_pick_first_percent must be 0-100".to_string(),
            ));
        }
        if self.max_frame_ms <= Fixed::ZERO {
            return Err(SimError::InvalidConfig(
                "max_frame_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Scaled projectile speed in pixels per second, signed positive.
    #[must_use]
    pub fn scaled_projectile_speed(&self) -> Fixed {
        self.projectile_base_speed * self.global_scale
    }

    /// Spawn x position for a side's units.
    #[must_use]
    pub fn spawn_x(&self, side: crate::entities::Side) -> Fixed {
        match side {
            crate::entities::Side::Left => self.castle_width + self.spawn_margin,
            crate::entities::Side::Right => {
                self.arena_width - self.castle_width - self.spawn_margin
            }
        }
    }

    /// Center x of a side's own castle (synthetic ranged target point).
    #[must_use]
    pub fn castle_center_x(&self, side: crate::entities::Side) -> Fixed {
        match side {
            crate::entities::Side::Left => self.castle_width / Fixed::from_num(2),
            crate::entities::Side::Right => {
                self.arena_width - self.castle_width / Fixed::from_num(2)
            }
        }
    }

    /// Face boundary of a side's own castle: crossing it from the arena
    /// side counts as contact.
    #[must_use]
    pub fn castle_face_x(&self, side: crate::entities::Side) -> Fixed {
        match side {
            crate::entities::Side::Left => self.castle_width,
            crate::entities::Side::Right => self.arena_width - self.castle_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Side;

    #[test]
    fn test_default_config_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn test_bad_scale_rejected() {
        let cfg = SimConfig {
            global_scale: Fixed::ZERO,
            ..SimConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_narrow_arena_rejected() {
        let cfg = SimConfig {
            arena_width: Fixed::from_num(100),
            ..SimConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_geometry_helpers() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.spawn_x(Side::Left), Fixed::from_num(94));
        assert_eq!(cfg.spawn_x(Side::Right), Fixed::from_num(1106));
        assert_eq!(cfg.castle_face_x(Side::Left), Fixed::from_num(80));
        assert_eq!(cfg.castle_face_x(Side::Right), Fixed::from_num(1120));
        assert_eq!(cfg.castle_center_x(Side::Left), Fixed::from_num(40));
    }

    #[test]
    fn test_projectile_speed_scaled() {
        let cfg = SimConfig::default();
        // 320 * 0.2 = 64 px/s.
        assert_eq!(cfg.scaled_projectile_speed(), Fixed::from_num(64));
    }
}
