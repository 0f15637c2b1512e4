//! Behavioural properties of a full simulation tick.
//!
//! Each test drives a [`Simulation`] through its public API only and checks
//! one observable rule: integration order, grounding, stamina gating, damage,
//! removal timing, boss phase monotonicity and particle expiry.

use ashfall_engine::prelude::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sim_with(gravity: f64, friction: f64) -> Simulation {
    Simulation::new(SimConfig {
        gravity,
        friction,
        ..Default::default()
    })
    .unwrap()
}

fn floor_grid() -> TileGrid {
    let mut grid = TileGrid::new(20, 10, 32.0);
    grid.fill_row(5);
    grid
}

fn attacker(stamina: f64) -> Entity {
    Entity::player(0.0, 0.0)
        .with_health(100)
        .with_attack(12)
        .with_stamina(stamina, 0.0)
}

// ---------------------------------------------------------------------------
// Integration order
// ---------------------------------------------------------------------------

#[test]
fn one_tick_of_gravity_moves_by_new_velocity() {
    let mut sim = sim_with(10.0, 0.9);
    let id = sim.spawn(Entity::enemy(0.0, 0.0).with_physics(1.0));

    sim.step();

    let body = &sim.registry().get(id).unwrap().body;
    assert_eq!(body.vy, 10.0);
    assert_eq!(body.y, 10.0);
    assert_eq!(body.vx, 0.0);
}

#[test]
fn friction_only_slows_the_horizontal_axis() {
    let mut sim = sim_with(0.0, 0.9);
    let id = sim.spawn(Entity::enemy(0.0, 0.0).with_physics(1.0).with_velocity(10.0, 10.0));

    sim.step();

    let body = &sim.registry().get(id).unwrap().body;
    assert_eq!((body.x, body.y), (10.0, 10.0));
    assert_eq!(body.vx, 9.0);
    assert_eq!(body.vy, 10.0);
}

// ---------------------------------------------------------------------------
// Grounding
// ---------------------------------------------------------------------------

#[test]
fn resting_entity_stays_grounded() {
    let mut sim = sim_with(0.4, 0.85);
    sim.set_map(floor_grid());
    let id = sim.spawn(Entity::enemy(64.0, 160.0 - 18.0).with_physics(1.0));

    for _ in 0..240 {
        sim.step();
        let e = sim.registry().get(id).unwrap();
        assert!(e.physics.as_ref().unwrap().grounded);
        assert_eq!(e.body.vy, 0.0);
        assert_eq!(e.body.y, 142.0);
    }
}

#[test]
fn without_a_map_nothing_is_grounded() {
    let mut sim = sim_with(0.4, 0.85);
    let id = sim.spawn(Entity::enemy(64.0, 142.0).with_physics(1.0));
    sim.step();
    let e = sim.registry().get(id).unwrap();
    assert!(!e.physics.as_ref().unwrap().grounded);
    assert!(e.body.y > 142.0, "free fall continues");
}

// ---------------------------------------------------------------------------
// Resource gating and damage
// ---------------------------------------------------------------------------

#[test]
fn insufficient_stamina_is_a_silent_no_op() {
    let mut sim = sim_with(0.4, 0.85);
    let p = sim.spawn(attacker(5.0));
    let e = sim.spawn(Entity::enemy(30.0, 0.0).with_health(20));

    let report = sim.attack(p);

    assert_eq!(report.outcome, AttackOutcome::Exhausted);
    assert_eq!(sim.registry().get(p).unwrap().stamina.as_ref().unwrap().current, 5.0);
    assert_eq!(sim.registry().get(e).unwrap().hp(), Some(20));
    assert!(sim.particles().is_empty());
}

#[test]
fn hit_inside_hitbox_only() {
    let mut sim = sim_with(0.4, 0.85);
    let p = sim.spawn(attacker(30.0));
    let near = sim.spawn(Entity::enemy(30.0, 0.0).with_health(20));
    let far = sim.spawn(Entity::enemy(200.0, 0.0).with_health(20));

    sim.attack(p);

    assert_eq!(sim.registry().get(near).unwrap().hp(), Some(8));
    assert_eq!(sim.registry().get(far).unwrap().hp(), Some(20));
}

// ---------------------------------------------------------------------------
// Removal timing
// ---------------------------------------------------------------------------

#[test]
fn killed_target_stays_until_end_of_tick() {
    let mut sim = sim_with(0.0, 1.0);
    let a = sim.spawn(attacker(30.0));
    let b = sim.spawn(attacker(30.0).with_health(100));
    let victim = sim.spawn(Entity::enemy(30.0, 0.0).with_health(10));
    sim.queue_attack(a);
    sim.queue_attack(b);

    let report = sim.step();

    // The second swing still found and referenced the dead target.
    let hits: Vec<_> = report
        .combat_events
        .iter()
        .filter(|ev| ev.target == victim)
        .map(|ev| ev.attacker)
        .collect();
    assert_eq!(hits, vec![a, b]);
    assert_eq!(report.removed, vec![victim]);
    assert!(sim.registry().get(victim).is_none());

    sim.step();
    assert!(sim.registry().get(victim).is_none());
}

// ---------------------------------------------------------------------------
// Boss phases
// ---------------------------------------------------------------------------

#[test]
fn boss_phase_never_reverts_and_bursts_once() {
    let mut sim = sim_with(0.0, 1.0);
    let boss = sim.spawn(Entity::boss(400.0, 0.0, 300, 10, 1.0));
    let set_hp = |sim: &mut Simulation, hp: i32| {
        sim.registry_mut().get_mut(boss).unwrap().health.as_mut().unwrap().hp = hp;
    };
    let phase = |sim: &Simulation| sim.registry().get(boss).unwrap().boss.as_ref().unwrap().current_phase;

    set_hp(&mut sim, 140);
    let transitions = sim.step().phase_transitions.len();
    assert_eq!(transitions, 1);
    assert_eq!(phase(&sim), 2);
    let burst = sim.particles().len();
    assert_eq!(burst, 24);

    set_hp(&mut sim, 250);
    assert!(sim.step().phase_transitions.is_empty());
    assert_eq!(phase(&sim), 2);

    set_hp(&mut sim, 140);
    assert!(sim.step().phase_transitions.is_empty());
    assert_eq!(phase(&sim), 2);
    assert!(sim.particles().len() <= burst, "no second burst");
}

#[test]
fn killing_blow_fires_phases_in_and_out_of_tick_alike() {
    let setup = || {
        let mut sim = sim_with(0.0, 1.0);
        let p = sim.spawn(attacker(30.0).with_attack(500));
        let boss = sim.spawn(Entity::boss(30.0, 0.0, 300, 10, 1.0));
        (sim, p, boss)
    };
    let to_phases =
        |ts: &[PhaseTransition]| ts.iter().map(|t| (t.from_phase, t.to_phase)).collect::<Vec<_>>();

    let (mut direct, p, boss) = setup();
    let swing = direct.attack(p);

    let (mut queued, q, _) = setup();
    queued.queue_attack(q);
    let report = queued.step();

    assert_eq!(to_phases(&swing.phase_transitions), vec![(1, 2), (2, 3)]);
    assert_eq!(to_phases(&swing.phase_transitions), to_phases(&report.phase_transitions));
    assert_eq!(swing.removed, vec![boss]);
    assert_eq!(report.removed, vec![boss]);
    assert_eq!(direct.particles().len(), 8 + 48);
}

// ---------------------------------------------------------------------------
// Particles
// ---------------------------------------------------------------------------

#[test]
fn hit_particles_expire_by_tick_fifty_one() {
    let mut sim = sim_with(0.0, 1.0);
    let p = sim.spawn(attacker(30.0));
    sim.spawn(Entity::enemy(30.0, 0.0).with_health(100));
    sim.attack(p);
    assert_eq!(sim.particles().len(), 8);

    sim.run_ticks(49);
    assert_eq!(sim.particles().len(), 8);
    sim.run_ticks(2);
    assert!(sim.particles().is_empty());
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn hp_never_negative_under_random_attacks(
        enemy_hp in 1i32..200,
        attack in 0i32..80,
        swings in 1usize..12,
    ) {
        let mut sim = sim_with(0.0, 1.0);
        let mut config_free = SimConfig::default();
        config_free.combat.stamina_cost = 0.0;
        let mut sim_free = Simulation::new(config_free).unwrap();

        for s in [&mut sim, &mut sim_free] {
            let p = s.spawn(Entity::player(0.0, 0.0).with_attack(attack).with_stamina(1000.0, 0.0));
            let e = s.spawn(Entity::enemy(30.0, 0.0).with_health(enemy_hp));
            for _ in 0..swings {
                s.queue_attack(p);
            }
            let report = s.step();
            match s.registry().get(e) {
                Some(enemy) => prop_assert!(enemy.hp().unwrap() > 0),
                None => prop_assert!(report.removed.contains(&e)),
            }
            for ent in s.registry().iter() {
                if let Some(hp) = ent.hp() {
                    prop_assert!(hp > 0, "no entity survives a tick at zero hp");
                }
            }
        }
    }

    #[test]
    fn identical_runs_produce_identical_hashes(
        seed in any::<u64>(),
        ticks in 1u64..60,
        moves in prop::collection::vec(0u8..4, 1..60),
    ) {
        let build = || {
            let mut config = SimConfig::default();
            config.tick.rng_seed = seed;
            let mut sim = Simulation::new(config).unwrap();
            sim.set_map(floor_grid());
            let p = sim.spawn(
                Entity::player(100.0, 100.0)
                    .with_health(100)
                    .with_attack(7)
                    .with_stamina(100.0, 30.0)
                    .with_physics(1.0)
                    .with_speed(2.5),
            );
            sim.set_player(p);
            sim.spawn(Entity::enemy(160.0, 100.0).with_health(50).with_ai(1.0).with_physics(1.0));
            sim.spawn(Entity::boss(260.0, 80.0, 120, 9, 0.8).with_physics(3.0));
            sim
        };
        let mut a = build();
        let mut b = build();
        for t in 0..ticks {
            let action = match moves[(t as usize) % moves.len()] {
                0 => InputFrame::new().with(Action::MoveLeft),
                1 => InputFrame::new().with(Action::MoveRight).with(Action::Attack),
                2 => InputFrame::new().with(Action::Dodge),
                _ => InputFrame::new(),
            };
            a.set_input(action.clone());
            b.set_input(action);
            a.step();
            b.step();
        }
        prop_assert_eq!(a.state_hash(), b.state_hash());
    }
}
