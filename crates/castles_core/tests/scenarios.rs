//! End-to-end match scenarios exercising combat, drafting, and victory
//! through the public API only.

use castles_core::config::SimConfig;
use castles_core::draft::DraftPhase;
use castles_core::entities::Side;
use castles_core::events::SimEvent;
use castles_core::math::Fixed;
use castles_core::simulation::Simulation;
use castles_test_utils::fixtures::{duel_config, duel_sim, fixed, stage_duel};
use castles_test_utils::proptest::prelude::*;

fn ms(v: i64) -> Fixed {
    Fixed::from_num(v)
}

/// Config where drafting runs normally but producer slots never fire,
/// so draft scenarios see no background combat.
fn draft_only_config() -> SimConfig {
    SimConfig {
        producer_grace_ms: ms(1_000_000_000),
        ..SimConfig::default()
    }
}

/// Advance until the draft offers a turn, with a generous tick budget.
fn advance_to_turn(sim: &mut Simulation) -> [castles_core::catalog::ArchetypeId; 2] {
    for _ in 0..1_000 {
        let events = sim.update(ms(50));
        for event in events {
            if let SimEvent::TurnOpened { offered } = event {
                return offered;
            }
        }
    }
    panic!("no draft turn opened within budget");
}

#[test]
fn melee_exchange_is_lethal_on_schedule() {
    // Mirror ants: 5 HP, 3 damage, 360 ms cadence at scale 1.
    let mut sim = duel_sim();
    let (left, right) = stage_duel(&mut sim, "ant", "ant", 20);

    // First exchange lands on the first tick; both drop to 2 HP.
    sim.update(ms(16));
    assert_eq!(sim.store().unit(left).unwrap().hp, 2);
    assert_eq!(sim.store().unit(right).unwrap().hp, 2);

    // Nothing more happens until the 360 ms cooldown elapses.
    for _ in 0..30 {
        sim.update(ms(16));
    }
    assert!(sim.store().unit(right).is_none());
    assert_eq!(sim.store().unit(left).unwrap().hp, 2);
}

#[test]
fn ranged_unit_cracks_castle_from_range() {
    // Ghost: 170 range, 18 damage, exactly a castle's health.
    let mut sim = duel_sim();
    sim.spawn_unit_at(Side::Left, "ghost", fixed(1000)).unwrap();

    let mut saw_projectile = false;
    let mut castle_hit = None;
    for _ in 0..100 {
        for event in sim.update(ms(16)) {
            match event {
                SimEvent::ProjectileSpawned { side, .. } => {
                    assert_eq!(side, Side::Left);
                    saw_projectile = true;
                }
                SimEvent::CastleDamaged { side, hp, amount } => {
                    castle_hit = Some((side, hp, amount));
                }
                _ => {}
            }
        }
        if sim.is_over() {
            break;
        }
    }

    assert!(saw_projectile);
    assert_eq!(castle_hit, Some((Side::Right, 0, 18)));
    assert_eq!(sim.outcome(), Some(Side::Left));
}

#[test]
fn full_board_routes_through_replacement() {
    let mut sim = Simulation::new(draft_only_config()).unwrap();

    // The board opens with one producer; five more picks fill it.
    for _ in 0..5 {
        advance_to_turn(&mut sim);
        assert!(sim.choose_offered(0));
    }
    assert_eq!(sim.board(Side::Left).len(), 6);

    // At capacity the next pick cannot add; the controller asks for a
    // slot instead, presenting exactly the six current slots.
    advance_to_turn(&mut sim);
    assert!(sim.choose_offered(0));
    sim.update(ms(16));
    assert_eq!(sim.draft().phase(), DraftPhase::AwaitingReplacement);

    let before: Vec<_> = sim
        .board(Side::Left)
        .slots()
        .iter()
        .map(|s| s.archetype)
        .collect();
    assert!(sim.choose_replacement(2));
    sim.update(ms(16));

    assert_eq!(sim.board(Side::Left).len(), 6);
    let after: Vec<_> = sim
        .board(Side::Left)
        .slots()
        .iter()
        .map(|s| s.archetype)
        .collect();
    // Only slot 2 changed.
    for (i, (b, a)) in before.iter().zip(&after).enumerate() {
        if i == 2 {
            assert_ne!(b, a);
        } else {
            assert_eq!(b, a);
        }
    }
}

#[test]
fn timed_out_turn_auto_picks_for_both_sides() {
    let mut sim = Simulation::new(draft_only_config()).unwrap();
    let offered = advance_to_turn(&mut sim);

    let left_before = sim.board(Side::Left).len();
    let right_before = sim.board(Side::Right).len();

    // Sit through the whole turn without input.
    let turn_ticks = 10_000 / 50 + 2;
    let mut resolutions = Vec::new();
    for _ in 0..turn_ticks {
        for event in sim.update(ms(50)) {
            if let SimEvent::TurnResolved {
                side, archetype, ..
            } = event
            {
                resolutions.push((side, archetype));
            }
        }
    }

    // Both sides committed independently.
    assert_eq!(resolutions.len(), 2);
    assert_eq!(resolutions[0].0, Side::Left);
    assert_eq!(resolutions[1].0, Side::Right);
    // The controlled side's auto-pick came from exactly the two offers.
    assert!(offered.contains(&resolutions[0].1));
    assert_eq!(sim.board(Side::Left).len(), left_before + 1);
    assert_eq!(sim.board(Side::Right).len(), right_before + 1);
}

#[test]
fn hop_unit_skips_first_engagement_only() {
    // Cricket (hop) against a sauropod tank.
    let mut sim = duel_sim();
    let (cricket, tank) = stage_duel(&mut sim, "cricket", "sauropod", 20);

    // Tick one: the cricket leaps over its first engagement and takes a
    // hit instead of dealing one.
    sim.update(ms(16));
    assert_eq!(sim.store().unit(tank).unwrap().hp, 18);
    assert_eq!(sim.store().unit(cricket).unwrap().hp, 4);

    // Tick two: the skip is spent and it fights normally.
    sim.update(ms(16));
    assert_eq!(sim.store().unit(tank).unwrap().hp, 15);
}

#[test]
fn match_halts_permanently_after_victory() {
    let mut sim = duel_sim();
    sim.spawn_unit_at(Side::Left, "ghost", fixed(1000)).unwrap();

    for _ in 0..200 {
        sim.update(ms(16));
        if sim.is_over() {
            break;
        }
    }
    assert!(sim.is_over());

    let clock = sim.clock();
    let hash = sim.state_hash();
    for _ in 0..10 {
        assert!(sim.update(ms(50)).is_empty());
    }
    assert_eq!(sim.clock(), clock);
    assert_eq!(sim.state_hash(), hash);
}

#[test]
fn grace_delay_prevents_instant_spawn() {
    let mut sim = Simulation::new(SimConfig::default()).unwrap();

    // Before the 50 ms grace no producer has fired.
    let events = sim.update(ms(30));
    assert!(!events
        .iter()
        .any(|e| matches!(e, SimEvent::UnitSpawned { .. })));

    let events = sim.update(ms(30));
    let spawns = events
        .iter()
        .filter(|e| matches!(e, SimEvent::UnitSpawned { .. }))
        .count();
    assert_eq!(spawns, 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Castle health stays within bounds and producer invariants hold
    /// through entire seeded matches.
    #[test]
    fn prop_match_invariants_hold(seed in 0u64..1_000) {
        let config = SimConfig { rng_seed: seed, ..SimConfig::default() };
        let mut sim = Simulation::new(config).unwrap();

        for tick in 0..2_000u32 {
            sim.update(ms(16));
            if tick % 100 != 0 {
                continue;
            }
            for side in Side::BOTH {
                let castle = sim.store().castle(side);
                prop_assert!(castle.hp <= castle.base_hp);

                let board = sim.board(side);
                prop_assert!(board.len() <= sim.config().max_active_slots);
                let mut seen = std::collections::HashSet::new();
                for slot in board.slots() {
                    prop_assert!(seen.insert(slot.archetype));
                }
            }
            if sim.is_over() {
                break;
            }
        }
    }

    /// Staged duels between random roster entries never wedge: units die,
    /// breach, or keep fighting, but the store never corrupts.
    #[test]
    fn prop_random_duels_stay_sane(
        left in 0usize..19,
        right in 0usize..19,
    ) {
        let mut sim = duel_sim();
        let keys: Vec<String> = sim
            .catalog()
            .iter()
            .map(|a| a.data.key.clone())
            .collect();
        stage_duel(&mut sim, &keys[left], &keys[right], 80);

        for _ in 0..500 {
            sim.update(ms(16));
            prop_assert!(sim.store().units().len() <= 2);
            for unit in sim.store().units() {
                prop_assert!(unit.hp > 0);
                prop_assert!(unit.x >= Fixed::ZERO);
                prop_assert!(unit.x <= duel_config().arena_width);
            }
        }
    }
}
