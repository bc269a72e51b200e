//! Draft controller: the turn-based protocol that changes which
//! archetypes each side produces.
//!
//! Each turn draws a quartet of candidate archetypes not active on
//! either side. Two are offered to the controlled side, two are held
//! back for the automated opponent. The controlled side picks (or the
//! turn timer auto-picks for it), a full producer board routes through
//! a replacement phase, and the automated side then mirrors the same
//! add-or-replace logic on its own reserved pair.
//!
//! Deadlines are phase-scoped: a deadline lives inside the phase value
//! it belongs to, so a timer from an earlier turn cannot fire against a
//! later one. The generation counter is the externally visible
//! freshness token, bumped on every turn opening.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::catalog::{ArchetypeId, UnitCatalog};
use crate::config::SimConfig;
use crate::entities::Side;
use crate::events::{PickApplication, SimEvent};
use crate::math::TimeMs;
use crate::production::ProducerBoard;

/// Which phase the controller is in, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    /// No turn open; the next one is scheduled.
    Idle,
    /// A quartet is drawn and the controlled side may pick.
    TurnOpen,
    /// The controlled side picked with a full board and must choose a
    /// slot to overwrite.
    AwaitingReplacement,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle {
        next_turn_at: TimeMs,
    },
    TurnOpen {
        offered: [ArchetypeId; 2],
        reserved: [ArchetypeId; 2],
        deadline: TimeMs,
    },
    AwaitingReplacement {
        archetype: ArchetypeId,
        reserved: [ArchetypeId; 2],
        deadline: TimeMs,
    },
}

/// Turn-based drafting state machine for one match.
///
/// The controller never owns the producer boards or the RNG; the
/// simulation passes them in so that drafting, production, and combat
/// all draw from the single simulation clock and random stream.
#[derive(Debug, Clone)]
pub struct DraftController {
    controlled: Side,
    phase: Phase,
    generation: u64,
}

fn board(boards: &[ProducerBoard; 2], side: Side) -> &ProducerBoard {
    match side {
        Side::Left => &boards[0],
        Side::Right => &boards[1],
    }
}

fn board_mut(boards: &mut [ProducerBoard; 2], side: Side) -> &mut ProducerBoard {
    match side {
        Side::Left => &mut boards[0],
        Side::Right => &mut boards[1],
    }
}

impl DraftController {
    /// Create a controller with the first turn scheduled at
    /// `first_turn_at`.
    #[must_use]
    pub fn new(controlled: Side, first_turn_at: TimeMs) -> Self {
        Self {
            controlled,
            phase: Phase::Idle {
                next_turn_at: first_turn_at,
            },
            generation: 0,
        }
    }

    /// Side the human (or scripted) input collaborator controls.
    #[must_use]
    pub const fn controlled_side(&self) -> Side {
        self.controlled
    }

    /// Current phase discriminant.
    #[must_use]
    pub fn phase(&self) -> DraftPhase {
        match self.phase {
            Phase::Idle { .. } => DraftPhase::Idle,
            Phase::TurnOpen { .. } => DraftPhase::TurnOpen,
            Phase::AwaitingReplacement { .. } => DraftPhase::AwaitingReplacement,
        }
    }

    /// The two archetypes currently offered to the controlled side.
    #[must_use]
    pub fn offered(&self) -> Option<[ArchetypeId; 2]> {
        match self.phase {
            Phase::TurnOpen { offered, .. } => Some(offered),
            _ => None,
        }
    }

    /// Freshness token: increments every time a turn opens.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Drive scheduled deadlines: open a due turn, auto-pick a timed-out
    /// one, and auto-resolve a timed-out replacement phase.
    pub fn tick(
        &mut self,
        now: TimeMs,
        boards: &mut [ProducerBoard; 2],
        catalog: &UnitCatalog,
        config: &SimConfig,
        rng: &mut ChaCha8Rng,
        events: &mut Vec<SimEvent>,
    ) {
        match self.phase {
            Phase::Idle { next_turn_at } if now >= next_turn_at => {
                self.open_turn(now, boards, catalog, config, rng, events);
            }
            Phase::TurnOpen {
                offered, deadline, ..
            } if now >= deadline => {
                // Auto-pick between exactly the two offered archetypes
                // with the configured weighting.
                let index = if rng.gen_range(0..100_u32) < u32::from(config.auto_pick_first_percent)
                {
                    0
                } else {
                    1
                };
                debug!(generation = self.generation, index, "draft turn timed out, auto-picking");
                self.resolve_controlled(offered[index], now, boards, config, rng, events);
            }
            Phase::AwaitingReplacement {
                archetype,
                reserved,
                deadline,
            } if now >= deadline => {
                // The turn deadline covers the replacement phase too, so
                // a turn can never wedge open: overwrite a random
                // eligible slot.
                let slots = board(boards, self.controlled).len();
                let eligible: Vec<usize> = (0..slots)
                    .filter(|&i| {
                        board(boards, self.controlled).slots()[i].archetype != archetype
                    })
                    .collect();
                let index = if eligible.is_empty() {
                    // Only reachable when the degraded draw re-offered an
                    // active archetype; its own slot is the legal target.
                    board(boards, self.controlled)
                        .position_of(archetype)
                        .unwrap_or(0)
                } else {
                    eligible[rng.gen_range(0..eligible.len())]
                };
                debug!(generation = self.generation, index, "replacement timed out, auto-replacing");
                self.apply_replacement(archetype, reserved, index, now, boards, config, rng, events);
            }
            _ => {}
        }
    }

    /// The controlled side picks offered archetype 0 or 1.
    ///
    /// Returns `false` with no mutation unless a turn is open and the
    /// index names one of the two offers.
    pub fn choose_offered(
        &mut self,
        index: usize,
        now: TimeMs,
        boards: &mut [ProducerBoard; 2],
        config: &SimConfig,
        rng: &mut ChaCha8Rng,
        events: &mut Vec<SimEvent>,
    ) -> bool {
        let Phase::TurnOpen { offered, .. } = self.phase else {
            return false;
        };
        if index >= 2 {
            return false;
        }
        self.resolve_controlled(offered[index], now, boards, config, rng, events);
        true
    }

    /// The controlled side chooses which producer slot to overwrite.
    ///
    /// Returns `false` with no mutation unless the replacement phase is
    /// active and the slot is a legal target (in bounds and not holding
    /// the same archetype in a different slot).
    pub fn choose_replacement(
        &mut self,
        slot: usize,
        now: TimeMs,
        boards: &mut [ProducerBoard; 2],
        config: &SimConfig,
        rng: &mut ChaCha8Rng,
        events: &mut Vec<SimEvent>,
    ) -> bool {
        let Phase::AwaitingReplacement {
            archetype, reserved, ..
        } = self.phase
        else {
            return false;
        };
        // Probe legality without committing the turn on failure.
        {
            let b = board(boards, self.controlled);
            if slot >= b.len() {
                return false;
            }
            if b.position_of(archetype).is_some_and(|i| i != slot) {
                return false;
            }
        }
        self.apply_replacement(archetype, reserved, slot, now, boards, config, rng, events);
        true
    }

    fn open_turn(
        &mut self,
        now: TimeMs,
        boards: &[ProducerBoard; 2],
        catalog: &UnitCatalog,
        config: &SimConfig,
        rng: &mut ChaCha8Rng,
        events: &mut Vec<SimEvent>,
    ) {
        let quartet = draw_quartet(boards, catalog, rng);
        let offered = [quartet[0], quartet[1]];
        let reserved = [quartet[2], quartet[3]];
        self.generation += 1;
        self.phase = Phase::TurnOpen {
            offered,
            reserved,
            deadline: now + config.turn_ms,
        };
        debug!(generation = self.generation, "draft turn opened");
        events.push(SimEvent::TurnOpened { offered });
    }

    /// Apply the controlled side's committed archetype: add it if the
    /// board has room, enter the replacement phase if not.
    fn resolve_controlled(
        &mut self,
        archetype: ArchetypeId,
        now: TimeMs,
        boards: &mut [ProducerBoard; 2],
        config: &SimConfig,
        rng: &mut ChaCha8Rng,
        events: &mut Vec<SimEvent>,
    ) {
        let reserved = match self.phase {
            Phase::TurnOpen { reserved, .. } => reserved,
            // Callers only reach this from TurnOpen.
            _ => return,
        };
        let b = board_mut(boards, self.controlled);
        if b.add_producer(archetype, now, config.producer_grace_ms) {
            events.push(SimEvent::TurnResolved {
                side: self.controlled,
                archetype,
                application: PickApplication::Added,
            });
            self.finish_turn(reserved, now, boards, config, rng, events);
        } else if let Some(slot) = b.position_of(archetype) {
            // Degraded draw handed back an already-active archetype; the
            // pick collapses to a timer reset on its own slot.
            b.replace_slot(slot, archetype, now, config.producer_grace_ms);
            events.push(SimEvent::TurnResolved {
                side: self.controlled,
                archetype,
                application: PickApplication::Replaced(slot),
            });
            self.finish_turn(reserved, now, boards, config, rng, events);
        } else {
            // Board at capacity: the controlled side must choose a slot.
            self.phase = Phase::AwaitingReplacement {
                archetype,
                reserved,
                deadline: now + config.turn_ms,
            };
        }
    }

    fn apply_replacement(
        &mut self,
        archetype: ArchetypeId,
        reserved: [ArchetypeId; 2],
        slot: usize,
        now: TimeMs,
        boards: &mut [ProducerBoard; 2],
        config: &SimConfig,
        rng: &mut ChaCha8Rng,
        events: &mut Vec<SimEvent>,
    ) {
        let b = board_mut(boards, self.controlled);
        if b.replace_slot(slot, archetype, now, config.producer_grace_ms) {
            events.push(SimEvent::TurnResolved {
                side: self.controlled,
                archetype,
                application: PickApplication::Replaced(slot),
            });
        }
        self.finish_turn(reserved, now, boards, config, rng, events);
    }

    /// Mirror the automated side's pick and return to idle.
    fn finish_turn(
        &mut self,
        reserved: [ArchetypeId; 2],
        now: TimeMs,
        boards: &mut [ProducerBoard; 2],
        config: &SimConfig,
        rng: &mut ChaCha8Rng,
        events: &mut Vec<SimEvent>,
    ) {
        let automated = self.controlled.opponent();
        let archetype = reserved[rng.gen_range(0..2_usize)];
        let b = board_mut(boards, automated);

        if b.add_producer(archetype, now, config.producer_grace_ms) {
            events.push(SimEvent::TurnResolved {
                side: automated,
                archetype,
                application: PickApplication::Added,
            });
        } else if let Some(slot) = b.position_of(archetype) {
            b.replace_slot(slot, archetype, now, config.producer_grace_ms);
            events.push(SimEvent::TurnResolved {
                side: automated,
                archetype,
                application: PickApplication::Replaced(slot),
            });
        } else {
            // Full board: prefer a slot that does not hold the chosen
            // archetype. Under per-side uniqueness every slot qualifies
            // here, but the filter keeps the fallback a safe no-op.
            let eligible: Vec<usize> = (0..b.len())
                .filter(|&i| b.slots()[i].archetype != archetype)
                .collect();
            if !eligible.is_empty() {
                let slot = eligible[rng.gen_range(0..eligible.len())];
                b.replace_slot(slot, archetype, now, config.producer_grace_ms);
                events.push(SimEvent::TurnResolved {
                    side: automated,
                    archetype,
                    application: PickApplication::Replaced(slot),
                });
            }
        }

        self.phase = Phase::Idle {
            next_turn_at: now + config.inter_turn_ms,
        };
    }
}

/// Draw four pairwise-distinct archetypes not active on either side.
///
/// If fewer than four eligible archetypes remain, the draw degrades to
/// sampling with replacement from the full catalog rather than failing.
fn draw_quartet(
    boards: &[ProducerBoard; 2],
    catalog: &UnitCatalog,
    rng: &mut ChaCha8Rng,
) -> [ArchetypeId; 4] {
    let mut pool: Vec<ArchetypeId> = catalog
        .ids()
        .into_iter()
        .filter(|&id| !boards[0].contains(id) && !boards[1].contains(id))
        .collect();

    if pool.len() >= 4 {
        let mut out = [ArchetypeId(0); 4];
        for slot in &mut out {
            *slot = pool.swap_remove(rng.gen_range(0..pool.len()));
        }
        out
    } else {
        let all = catalog.ids();
        let mut out = [ArchetypeId(0); 4];
        for slot in &mut out {
            *slot = all[rng.gen_range(0..all.len())];
        }
        out
    }
}
