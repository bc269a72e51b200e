//! Static unit catalog: archetype definitions and global-scale derivation.
//!
//! The catalog is immutable after load. Raw archetype data carries plain
//! integer stats (milliseconds, pixels, pixels per second); the catalog
//! derives the scaled fixed-point values exactly once by applying the
//! global scale (times divided by scale, speeds multiplied by scale).
//! Every other module reads only the derived [`ScaledStats`], which is
//! what makes the single global knob stretch movement, attack cadence,
//! projectile travel, and production uniformly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::math::{Fixed, TimeMs};

/// Unique identifier for unit archetypes (index into the catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArchetypeId(pub u32);

impl ArchetypeId {
    /// Create a new archetype ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// Coarse vertical classification governing which attacks can hit which
/// units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Walking units and everything castle-bound.
    Ground,
    /// Flying units; only threatened by other flyers or grounded ranged.
    Air,
}

/// Forward-motion behavior class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementPattern {
    /// Constant forward motion.
    Advance,
    /// Periodic slow/fast burst modulation, plus a one-time "skip the
    /// first engagement" combat rule.
    Hop,
}

/// Raw, data-driven archetype definition.
///
/// All stats are pre-scale values exactly as they appear in roster data:
/// times in milliseconds, distances in pixels, speeds in pixels per
/// second. Cosmetic fields (glyphs, size hint, mounted flag) are carried
/// for rendering collaborators and have no gameplay effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeData {
    /// Unique string identifier for this archetype.
    pub key: String,
    /// Display glyph for renderers.
    pub glyph: String,
    /// Rendered size hint in pixels (cosmetic).
    pub size: u32,
    /// Base hit points.
    pub hp: u32,
    /// Damage per hit.
    pub damage: u32,
    /// Attack interval in milliseconds (pre-scale).
    pub attack_ms: u32,
    /// Attack range in pixels. Only meaningful for ranged archetypes;
    /// melee archetypes use the shared melee-range constant instead.
    pub range: u32,
    /// Projectile glyph. Presence implies the archetype is ranged.
    pub projectile: Option<String>,
    /// Blast radius in pixels (0 = single-target).
    pub blast: u32,
    /// Base move speed in pixels per second (pre-scale).
    pub move_speed: u32,
    /// Movement pattern class.
    pub pattern: MovementPattern,
    /// Locomotion layer.
    pub layer: Layer,
    /// Production interval in milliseconds (pre-scale).
    pub production_ms: u32,
    /// Whether renderers should draw a mounted rider (cosmetic).
    pub mounted: bool,
}

impl ArchetypeData {
    /// Check if this archetype delivers attacks via projectiles.
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        self.projectile.is_some()
    }
}

/// Scaled stats derived from an archetype at catalog load.
///
/// Consumers must read these, never the raw [`ArchetypeData`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledStats {
    /// Attack interval (raw ms divided by global scale).
    pub attack_interval: TimeMs,
    /// Production interval (raw ms divided by global scale).
    pub production_interval: TimeMs,
    /// Move speed in pixels per second (raw speed times global scale).
    pub speed: Fixed,
    /// Ranged attack range in pixels (distances are not scaled).
    pub range: Fixed,
    /// Blast radius in pixels (distances are not scaled).
    pub blast: Fixed,
}

/// One loaded archetype: raw data plus its derived scaled stats.
#[derive(Debug, Clone)]
pub struct UnitArchetype {
    /// Catalog identifier.
    pub id: ArchetypeId,
    /// Raw roster data.
    pub data: ArchetypeData,
    /// Scale-derived values.
    pub scaled: ScaledStats,
}

impl UnitArchetype {
    /// Check if this archetype delivers attacks via projectiles.
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        self.data.is_ranged()
    }
}

/// Static, load-time-fixed table of unit archetypes.
#[derive(Debug, Clone)]
pub struct UnitCatalog {
    archetypes: Vec<UnitArchetype>,
    by_key: HashMap<String, ArchetypeId>,
}

impl UnitCatalog {
    /// Build a catalog from raw roster data, deriving scaled stats with
    /// the given global scale.
    ///
    /// # Errors
    ///
    /// Fails on an empty roster, duplicate keys, or a non-positive scale.
    pub fn new(roster: Vec<ArchetypeData>, global_scale: Fixed) -> Result<Self> {
        if roster.is_empty() {
            return Err(SimError::EmptyCatalog);
        }
        if global_scale <= Fixed::ZERO {
            return Err(SimError::InvalidConfig(format!(
                "global scale must be positive, got {global_scale}"
            )));
        }

        let mut archetypes = Vec::with_capacity(roster.len());
        let mut by_key = HashMap::with_capacity(roster.len());

        for (index, data) in roster.into_iter().enumerate() {
            let id = ArchetypeId::new(index as u32);
            if by_key.insert(data.key.clone(), id).is_some() {
                return Err(SimError::DuplicateArchetype(data.key));
            }

            let scaled = ScaledStats {
                attack_interval: Fixed::from_num(data.attack_ms) / global_scale,
                production_interval: Fixed::from_num(data.production_ms) / global_scale,
                speed: Fixed::from_num(data.move_speed) * global_scale,
                range: Fixed::from_num(data.range),
                blast: Fixed::from_num(data.blast),
            };

            archetypes.push(UnitArchetype { id, data, scaled });
        }

        Ok(Self { archetypes, by_key })
    }

    /// Build a catalog from a RON roster string.
    pub fn from_ron_str(ron: &str, global_scale: Fixed) -> Result<Self> {
        let roster: Vec<ArchetypeData> = ron::from_str(ron)?;
        Self::new(roster, global_scale)
    }

    /// Build the default catalog from the stock roster.
    pub fn standard(global_scale: Fixed) -> Result<Self> {
        Self::new(default_roster(), global_scale)
    }

    /// Number of archetypes in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Check if the catalog is empty (never true after construction).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Look up an archetype by ID.
    #[must_use]
    pub fn get(&self, id: ArchetypeId) -> Option<&UnitArchetype> {
        self.archetypes.get(id.0 as usize)
    }

    /// Resolve a string key to its archetype ID.
    #[must_use]
    pub fn id_by_key(&self, key: &str) -> Option<ArchetypeId> {
        self.by_key.get(key).copied()
    }

    /// Resolve a string key, failing with [`SimError::UnknownArchetype`].
    pub fn require(&self, key: &str) -> Result<ArchetypeId> {
        self.id_by_key(key)
            .ok_or_else(|| SimError::UnknownArchetype(key.to_string()))
    }

    /// Iterate over all archetypes in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitArchetype> {
        self.archetypes.iter()
    }

    /// All archetype IDs in catalog order.
    #[must_use]
    pub fn ids(&self) -> Vec<ArchetypeId> {
        self.archetypes.iter().map(|a| a.id).collect()
    }
}

/// Shared melee engagement range in pixels (pre-config default).
pub const MELEE_RANGE: u32 = 28;

#[allow(clippy::too_many_arguments)]
fn arch(
    key: &str,
    glyph: &str,
    size: u32,
    hp: u32,
    damage: u32,
    attack_ms: u32,
    range: u32,
    projectile: Option<&str>,
    blast: u32,
    move_speed: u32,
    pattern: MovementPattern,
    layer: Layer,
    production_ms: u32,
    mounted: bool,
) -> ArchetypeData {
    ArchetypeData {
        key: key.to_string(),
        glyph: glyph.to_string(),
        size,
        hp,
        damage,
        attack_ms,
        range,
        projectile: projectile.map(str::to_string),
        blast,
        move_speed,
        pattern,
        layer,
        production_ms,
        mounted,
    }
}

/// The stock roster: tanks, rushers, mid-line melee, blasters, snipers,
/// and the dragon ultimate. Stats mirror the original balance table.
#[must_use]
#[rustfmt::skip]
pub fn default_roster() -> Vec<ArchetypeData> {
    use Layer::{Air, Ground};
    use MovementPattern::{Advance, Hop};

    vec![
        // Tanks: melee, very low damage, castle-sized HP pools.
        arch("sauropod", "🦕", 45, 18, 1, 1100, MELEE_RANGE, None, 0, 60, Advance, Ground, 6500, false),
        arch("phoenix", "🐦‍🔥", 38, 18, 1, 950, MELEE_RANGE, None, 0, 95, Advance, Air, 5500, false),
        // Heavy melee attacker.
        arch("rex", "🦖", 40, 5, 13, 800, MELEE_RANGE, None, 0, 85, Advance, Ground, 5200, true),
        // Rushers: very fast move and production, low HP.
        arch("horse", "🏇", 30, 3, 3, 380, MELEE_RANGE, None, 0, 260, Advance, Ground, 800, true),
        arch("eagle", "🦅", 26, 2, 3, 500, MELEE_RANGE, None, 0, 200, Hop, Air, 1200, false),
        // Swarm melee.
        arch("merman", "🧜‍♂️", 28, 5, 5, 650, MELEE_RANGE, None, 0, 140, Advance, Ground, 500, false),
        arch("bee", "🐝", 22, 5, 5, 520, MELEE_RANGE, None, 0, 140, Advance, Air, 500, true),
        // Medium melee.
        arch("ant", "🐜", 22, 5, 3, 360, MELEE_RANGE, None, 0, 160, Advance, Ground, 1200, true),
        arch("cricket", "🦗", 22, 5, 3, 420, MELEE_RANGE, None, 0, 165, Hop, Ground, 1400, true),
        // Balanced melee.
        arch("tiger", "🐅", 40, 8, 8, 700, MELEE_RANGE, None, 0, 120, Advance, Ground, 3200, false),
        arch("fencer", "🤺", 26, 4, 5, 330, MELEE_RANGE, None, 0, 135, Advance, Ground, 2200, false),
        // Blasters (area damage).
        arch("agent", "🐙", 26, 4, 5, 480, 180, Some("•"), 100, 120, Advance, Air, 2200, false),
        arch("mammoth", "🦣", 36, 5, 5, 800, MELEE_RANGE, None, 100, 80, Advance, Ground, 2400, true),
        // Ranged nukes: one hit point, castle-cracking damage.
        arch("ghost", "👻", 28, 1, 18, 650, 170, Some("⭐"), 0, 220, Advance, Ground, 9000, false),
        arch("alien", "👾", 28, 1, 18, 700, 140, Some("🌀"), 0, 250, Advance, Air, 9000, false),
        // Short-range medium.
        arch("penguin", "🐧", 22, 5, 3, 600, 100, Some("❄️"), 0, 90, Advance, Ground, 2000, false),
        // Long-range snipers: slow attack, slow walk.
        arch("fairy", "🧚", 24, 3, 5, 1200, 500, Some("⚡"), 0, 25, Advance, Air, 3000, false),
        arch("mermaid", "🧜‍♀️", 28, 4, 5, 1200, 500, Some("💧"), 0, 25, Advance, Ground, 3200, false),
        // Ultimate.
        arch("dragon", "🐉", 45, 13, 13, 1400, 260, Some("🔥"), 50, 60, Advance, Ground, 12000, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(v: f64) -> Fixed {
        Fixed::from_num(v)
    }

    #[test]
    fn test_standard_catalog_loads() {
        let catalog = UnitCatalog::standard(scale(0.2)).unwrap();
        assert_eq!(catalog.len(), 19);
        assert!(catalog.id_by_key("ant").is_some());
        assert!(catalog.id_by_key("dragon").is_some());
        assert!(catalog.id_by_key("nonexistent").is_none());
    }

    #[test]
    fn test_scaled_stats_derivation() {
        let catalog = UnitCatalog::standard(scale(0.2)).unwrap();
        let ant = catalog.get(catalog.id_by_key("ant").unwrap()).unwrap();

        // 360 ms / 0.2 = 1800 ms between attacks.
        assert_eq!(ant.scaled.attack_interval, Fixed::from_num(1800));
        // 1200 ms / 0.2 = 6000 ms per spawn.
        assert_eq!(ant.scaled.production_interval, Fixed::from_num(6000));
        // 160 px/s * 0.2 = 32 px/s.
        assert_eq!(ant.scaled.speed, Fixed::from_num(32));
    }

    #[test]
    fn test_scaling_linearity() {
        // Doubling the scale halves every interval and doubles every
        // speed, independently per archetype.
        let base = UnitCatalog::standard(scale(0.25)).unwrap();
        let doubled = UnitCatalog::standard(scale(0.5)).unwrap();

        for (a, b) in base.iter().zip(doubled.iter()) {
            assert_eq!(a.scaled.attack_interval, b.scaled.attack_interval * 2);
            assert_eq!(a.scaled.production_interval, b.scaled.production_interval * 2);
            assert_eq!(a.scaled.speed * 2, b.scaled.speed);
        }
    }

    #[test]
    fn test_ranged_flag_follows_projectile() {
        let catalog = UnitCatalog::standard(scale(1.0)).unwrap();
        let ghost = catalog.get(catalog.id_by_key("ghost").unwrap()).unwrap();
        let tiger = catalog.get(catalog.id_by_key("tiger").unwrap()).unwrap();
        assert!(ghost.is_ranged());
        assert!(!tiger.is_ranged());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let roster = vec![default_roster()[0].clone(), default_roster()[0].clone()];
        let err = UnitCatalog::new(roster, scale(1.0)).unwrap_err();
        assert!(matches!(err, SimError::DuplicateArchetype(_)));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let err = UnitCatalog::standard(Fixed::ZERO).unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
    }

    #[test]
    fn test_ron_roundtrip() {
        let roster = default_roster();
        let ron = ron::to_string(&roster).unwrap();
        let catalog = UnitCatalog::from_ron_str(&ron, scale(0.2)).unwrap();
        assert_eq!(catalog.len(), roster.len());
    }
}
