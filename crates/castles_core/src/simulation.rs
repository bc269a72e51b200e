//! The simulation context and per-tick driver.
//!
//! [`Simulation`] owns the whole battle: entity store, producer boards,
//! draft controller, clock, RNG, catalog, and config. There are no
//! ambient singletons, so any number of simulations can run side by
//! side (the test suites do exactly that).
//!
//! Tick order is fixed: draft deadlines, then producer slots, then
//! every unit (breach check, movement, attack attempt, in store order),
//! then projectiles. All mutation happens synchronously inside
//! [`Simulation::update`]; the match-over condition is the sole hard
//! stop, after which `update` is a no-op.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::hash::{Hash, Hasher};
use tracing::{debug, info, trace};

use crate::catalog::{MovementPattern, UnitCatalog};
use crate::combat::{self, StandardSelector, TargetSelector};
use crate::config::SimConfig;
use crate::draft::{DraftController, DraftPhase};
use crate::entities::{EntityStore, Projectile, Side, Unit, UnitId};
use crate::error::Result;
use crate::events::SimEvent;
use crate::math::{Fixed, TimeMs};
use crate::production::ProducerBoard;

/// Visual lane height for air-bound projectiles. No gameplay effect.
const AIR_LANE_Y: i64 = 52;
/// Visual lane height for ground-bound projectiles.
const GROUND_LANE_Y: i64 = 140;

/// Archetype both sides open the match producing.
const OPENING_ARCHETYPE: &str = "ant";

const fn side_index(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

/// One running match.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    catalog: UnitCatalog,
    store: EntityStore,
    boards: [ProducerBoard; 2],
    draft: DraftController,
    selector: Box<dyn TargetSelector>,
    rng: ChaCha8Rng,
    clock: TimeMs,
    outcome: Option<Side>,
    pending: Vec<SimEvent>,
}

impl Simulation {
    /// Create a match with the stock catalog.
    ///
    /// # Errors
    ///
    /// Fails on an invalid config or if the stock roster is missing the
    /// opening archetype.
    pub fn new(config: SimConfig) -> Result<Self> {
        let catalog = UnitCatalog::standard(config.global_scale)?;
        Self::with_catalog(config, catalog)
    }

    /// Create a match with a custom catalog.
    ///
    /// Both sides open producing the stock opening archetype when the
    /// catalog has it; a custom catalog without it starts with empty
    /// boards.
    ///
    /// # Errors
    ///
    /// Fails on an invalid config.
    pub fn with_catalog(config: SimConfig, catalog: UnitCatalog) -> Result<Self> {
        config.validate()?;

        let mut boards = [
            ProducerBoard::new(Side::Left, config.max_active_slots),
            ProducerBoard::new(Side::Right, config.max_active_slots),
        ];
        if let Some(opening) = catalog.id_by_key(OPENING_ARCHETYPE) {
            for board in &mut boards {
                board.add_producer(opening, Fixed::ZERO, config.producer_grace_ms);
            }
        }

        Ok(Self {
            store: EntityStore::new(config.castle_base_hp),
            boards,
            // First draft turn opens on the first tick.
            draft: DraftController::new(Side::Left, Fixed::ZERO),
            selector: Box::new(StandardSelector),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            clock: Fixed::ZERO,
            outcome: None,
            pending: Vec::new(),
            catalog,
            config,
        })
    }

    /// Swap the target-selection rule. Tests use this to make the
    /// two-candidate tie-break deterministic.
    pub fn set_target_selector(&mut self, selector: Box<dyn TargetSelector>) {
        self.selector = selector;
    }

    /// Spawn a unit directly at a position, bypassing production.
    /// Headless scenarios and test fixtures stage battles with this.
    ///
    /// # Errors
    ///
    /// Fails if `key` names no archetype in the catalog.
    pub fn spawn_unit_at(&mut self, side: Side, key: &str, x: Fixed) -> Result<UnitId> {
        let archetype_id = self.catalog.require(key)?;
        let Some(archetype) = self.catalog.get(archetype_id) else {
            return Err(crate::error::SimError::UnknownArchetype(key.to_string()));
        };
        let archetype = archetype.clone();
        let id = self.store.spawn_unit(side, &archetype, &self.config);
        if let Some(unit) = self.store.unit_mut(id) {
            unit.x = x;
        }
        Ok(id)
    }

    /// Advance the match by `dt` milliseconds, clamped to the configured
    /// per-tick maximum. Returns the events raised, in order.
    ///
    /// Once the match has ended this is a no-op returning no events.
    pub fn update(&mut self, dt: TimeMs) -> Vec<SimEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if self.outcome.is_some() {
            return events;
        }

        let dt = dt.clamp(Fixed::ZERO, self.config.max_frame_ms);
        self.clock += dt;
        let now = self.clock;
        let dt_seconds = dt / Fixed::from_num(1000);
        trace!(now = %now, units = self.store.units().len(), "tick");

        self.draft.tick(
            now,
            &mut self.boards,
            &self.catalog,
            &self.config,
            &mut self.rng,
            &mut events,
        );

        self.run_production(now, &mut events);

        if self.run_units(now, dt_seconds, &mut events) {
            return events;
        }

        if let Some(winner) =
            combat::advance_projectiles(&mut self.store, dt_seconds, &self.config, &mut events)
        {
            self.end_match(winner, &mut events);
        }

        events
    }

    /// The controlled side picks offered archetype 0 or 1. The resolution
    /// events surface from the next `update` call.
    pub fn choose_offered(&mut self, index: usize) -> bool {
        let now = self.clock;
        let (config, boards, rng, pending) = (
            &self.config,
            &mut self.boards,
            &mut self.rng,
            &mut self.pending,
        );
        self.draft
            .choose_offered(index, now, boards, config, rng, pending)
    }

    /// The controlled side chooses a producer slot to overwrite.
    pub fn choose_replacement(&mut self, slot: usize) -> bool {
        let now = self.clock;
        let (config, boards, rng, pending) = (
            &self.config,
            &mut self.boards,
            &mut self.rng,
            &mut self.pending,
        );
        self.draft
            .choose_replacement(slot, now, boards, config, rng, pending)
    }

    /// Simulation clock in milliseconds.
    #[must_use]
    pub const fn clock(&self) -> TimeMs {
        self.clock
    }

    /// The winner, once the match has ended.
    #[must_use]
    pub const fn outcome(&self) -> Option<Side> {
        self.outcome
    }

    /// Check if the match has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Live battle state.
    #[must_use]
    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    /// A side's producer board.
    #[must_use]
    pub fn board(&self, side: Side) -> &ProducerBoard {
        &self.boards[side_index(side)]
    }

    /// Draft controller state.
    #[must_use]
    pub const fn draft(&self) -> &DraftController {
        &self.draft
    }

    /// The loaded catalog.
    #[must_use]
    pub const fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    /// The match configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Order-sensitive hash over the full mutable state, for determinism
    /// checks: two matches fed identical seeds and inputs must hash
    /// identically at every tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.clock.to_bits().hash(&mut hasher);

        for unit in self.store.units() {
            unit.id.hash(&mut hasher);
            side_index(unit.side).hash(&mut hasher);
            unit.x.to_bits().hash(&mut hasher);
            unit.hp.hash(&mut hasher);
            unit.next_attack_at.to_bits().hash(&mut hasher);
            unit.hop_phase.to_bits().hash(&mut hasher);
            unit.skips_remaining.hash(&mut hasher);
        }
        for projectile in self.store.projectiles() {
            projectile.id.hash(&mut hasher);
            projectile.x.to_bits().hash(&mut hasher);
            projectile.velocity.to_bits().hash(&mut hasher);
            projectile.damage.hash(&mut hasher);
        }
        for side in Side::BOTH {
            self.store.castle(side).hp.hash(&mut hasher);
            for slot in self.boards[side_index(side)].slots() {
                slot.archetype.hash(&mut hasher);
                slot.next_spawn.to_bits().hash(&mut hasher);
            }
        }
        self.draft.generation().hash(&mut hasher);
        (self.draft.phase() == DraftPhase::TurnOpen).hash(&mut hasher);

        hasher.finish()
    }

    fn run_production(&mut self, now: TimeMs, events: &mut Vec<SimEvent>) {
        for side in Side::BOTH {
            let due = self.boards[side_index(side)].due_spawns(now, &self.catalog);
            for archetype_id in due {
                let Some(archetype) = self.catalog.get(archetype_id) else {
                    continue;
                };
                let id = self.store.spawn_unit(side, archetype, &self.config);
                debug!(?side, key = %archetype.data.key, "unit spawned");
                events.push(SimEvent::UnitSpawned {
                    id,
                    side,
                    archetype: archetype_id,
                    x: self.config.spawn_x(side),
                    layer: archetype.data.layer,
                });
            }
        }
    }

    /// Breach, movement, and attack for every unit, in store order.
    /// Returns `true` if a breach ended the match.
    fn run_units(&mut self, now: TimeMs, dt_seconds: Fixed, events: &mut Vec<SimEvent>) -> bool {
        for id in self.store.unit_ids() {
            // Blast damage earlier in this loop may have removed it.
            let Some(unit) = self.store.unit(id) else {
                continue;
            };

            let side = unit.side;
            let enemy = side.opponent();
            let face = self.config.castle_face_x(enemy);
            let crossed = match side {
                Side::Left => unit.x >= face,
                Side::Right => unit.x <= face,
            };
            if crossed {
                // A breaching unit trades itself for castle damage and
                // never moves or attacks this tick.
                let amount = unit.stats.damage * self.config.castle_contact_multiplier;
                self.store.remove_unit(id);
                events.push(SimEvent::UnitDestroyed { id });
                if combat::damage_castle(&mut self.store, enemy, amount, events) {
                    self.end_match(side, events);
                    return true;
                }
                continue;
            }

            self.move_unit(id, now, dt_seconds, events);
            self.try_attack(id, now, events);
        }
        false
    }

    fn move_unit(&mut self, id: UnitId, now: TimeMs, dt_seconds: Fixed, events: &mut Vec<SimEvent>) {
        let Some(unit) = self.store.unit(id) else {
            return;
        };

        // Hold position while any enemy satisfies eligibility and range,
        // whatever this tick's target selection then does.
        if combat::is_engaged(unit, &self.store) {
            return;
        }
        // Legacy variant: frozen for a window after each attack.
        if self.config.attack_lock_ms.is_some() && now < unit.lock_until {
            return;
        }

        let mut dx = unit.stats.speed * dt_seconds;
        let mut phase = unit.hop_phase;
        if unit.stats.pattern == MovementPattern::Hop {
            phase += dt_seconds * self.config.global_scale;
            dx *= combat::hop_multiplier(phase, &self.config.hop);
        }
        let x = unit.x + dx * unit.side.direction();

        let Some(unit) = self.store.unit_mut(id) else {
            return;
        };
        unit.x = x;
        unit.hop_phase = phase;
        events.push(SimEvent::UnitMoved { id, x });
    }

    fn try_attack(&mut self, id: UnitId, now: TimeMs, events: &mut Vec<SimEvent>) {
        let Some(unit) = self.store.unit(id) else {
            return;
        };
        if now < unit.next_attack_at {
            return;
        }
        let attacker = unit.clone();

        let candidates = combat::candidates(&attacker, &self.store);

        // Hop units leap over their first qualifying engagement.
        if attacker.skips_remaining > 0 && !candidates.is_empty() {
            if let Some(unit) = self.store.unit_mut(id) {
                unit.skips_remaining -= 1;
            }
            return;
        }

        if let Some(index) = self.selector.select(&candidates, &mut self.rng) {
            let target_id = candidates[index].id;
            if attacker.stats.ranged {
                self.fire_at_unit(&attacker, target_id, events);
            } else if attacker.stats.blast > Fixed::ZERO {
                if let Some(target) = self.store.unit(target_id) {
                    let (target_x, target_layer) = (target.x, target.layer);
                    combat::apply_splash(
                        &mut self.store,
                        attacker.side,
                        target_x,
                        target_layer,
                        attacker.stats.blast,
                        attacker.stats.damage,
                        events,
                    );
                }
            } else {
                combat::apply_unit_damage(&mut self.store, target_id, attacker.stats.damage, events);
            }
            self.arm_cooldown(id, now);
        } else if attacker.stats.ranged {
            // No unit in reach: the enemy castle stands in as a
            // synthetic, always-eligible target.
            let castle_x = self.config.castle_center_x(attacker.side.opponent());
            if combat::in_range(&attacker, castle_x, attacker.stats.range) {
                self.fire_at_castle(&attacker, events);
                self.arm_cooldown(id, now);
            }
        }
    }

    fn fire_at_unit(&mut self, attacker: &Unit, target_id: UnitId, events: &mut Vec<SimEvent>) {
        let Some(target) = self.store.unit(target_id) else {
            return;
        };
        let target_layer = target.layer;
        let lane_y = match target_layer {
            crate::catalog::Layer::Air => Fixed::from_num(AIR_LANE_Y),
            crate::catalog::Layer::Ground => Fixed::from_num(GROUND_LANE_Y),
        };
        self.spawn_projectile(attacker, lane_y, Some(target_layer), None, events);
    }

    fn fire_at_castle(&mut self, attacker: &Unit, events: &mut Vec<SimEvent>) {
        let lane_y = Fixed::from_num(GROUND_LANE_Y);
        let castle = attacker.side.opponent();
        self.spawn_projectile(attacker, lane_y, None, Some(castle), events);
    }

    fn spawn_projectile(
        &mut self,
        attacker: &Unit,
        lane_y: Fixed,
        target_layer: Option<crate::catalog::Layer>,
        castle_target: Option<Side>,
        events: &mut Vec<SimEvent>,
    ) {
        let glyph = self
            .catalog
            .get(attacker.archetype)
            .and_then(|a| a.data.projectile.clone());
        let velocity = self.config.scaled_projectile_speed() * attacker.side.direction();
        let id = self.store.spawn_projectile(Projectile {
            id: 0,
            side: attacker.side,
            x: attacker.x,
            lane_y,
            velocity,
            damage: attacker.stats.damage,
            blast: attacker.stats.blast,
            target_layer,
            castle_target,
        });
        events.push(SimEvent::ProjectileSpawned {
            id,
            side: attacker.side,
            x: attacker.x,
            lane_y,
            glyph,
        });
    }

    fn arm_cooldown(&mut self, id: UnitId, now: TimeMs) {
        let lock = self.config.attack_lock_ms;
        if let Some(unit) = self.store.unit_mut(id) {
            unit.next_attack_at = now + unit.stats.attack_interval;
            if let Some(lock_ms) = lock {
                unit.lock_until = now + lock_ms;
            }
        }
    }

    fn end_match(&mut self, winner: Side, events: &mut Vec<SimEvent>) {
        if self.outcome.is_none() {
            self.outcome = Some(winner);
            info!(?winner, clock = %self.clock, "match ended");
            events.push(SimEvent::MatchEnded { winner });
        }
    }
}
