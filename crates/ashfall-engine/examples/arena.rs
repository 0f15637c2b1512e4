//! Headless arena fight: a scripted player against a grunt and a boss.
//!
//! Run with:
//!   cargo run --example arena -p ashfall-engine [-- path/to/config.json]
//!
//! Set `RUST_LOG=ashfall_engine=debug` to see hits, phase changes and removals.
//! Pass a config with `"weather": { "enabled": true }` for rain.
//! The final persistence snapshot is printed as JSON on stdout.

use anyhow::Context;
use ashfall_engine::prelude::*;
use tracing::info;

const MAX_TICKS: u64 = 60 * 60;

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

fn load_config() -> Result<SimConfig, anyhow::Error> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config from {path}"))?;
            SimConfig::from_json_str(&text).with_context(|| format!("parsing config {path}"))
        }
        None => Ok(SimConfig::default()),
    }
}

fn build_arena(config: SimConfig) -> Result<(Simulation, EntityId, EntityId), anyhow::Error> {
    let mut sim = Simulation::new(config)?;

    // 40 x 12 tiles with a floor at row 10 (y = 320).
    let mut grid = TileGrid::new(40, 12, 32.0);
    grid.fill_row(10);
    sim.set_map(grid);

    let player = sim.spawn(
        Entity::player(100.0, 280.0)
            .with_health(100)
            .with_attack(12)
            .with_stamina(100.0, 30.0)
            .with_physics(1.0)
            .with_speed(2.0),
    );
    sim.set_player(player);

    sim.spawn(
        Entity::enemy(300.0, 302.0)
            .with_health(20)
            .with_ai(1.2)
            .with_physics(1.0),
    );
    let boss = sim.spawn(Entity::boss(600.0, 272.0, 300, 15, 0.8).with_physics(4.0));

    Ok((sim, player, boss))
}

/// Walk right until something is within reach, then swing.
fn scripted_input(sim: &Simulation, player: EntityId) -> InputFrame {
    let Some(me) = sim.registry().get(player) else {
        return InputFrame::new();
    };
    let (px, _) = me.body.center();
    let target_near = sim
        .registry()
        .iter()
        .filter(|e| e.id != player && e.health.is_some())
        .any(|e| (e.body.center().0 - px).abs() < 45.0);

    if target_near {
        InputFrame::new().with(Action::Attack)
    } else {
        InputFrame::new().with(Action::MoveRight)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let (mut sim, player, boss) = build_arena(config)?;
    info!(entities = sim.registry().len(), "arena ready");

    let mut hits = 0usize;
    while sim.tick_count() < MAX_TICKS && sim.registry().contains(boss) {
        sim.set_input(scripted_input(&sim, player));
        let report = sim.step();
        hits += report.combat_events.len();

        for t in &report.phase_transitions {
            info!(tick = report.tick, boss = %t.boss, phase = t.to_phase, "boss enraged");
        }
        if let Some(kind) = report.weather_change {
            info!(tick = report.tick, weather = ?kind, "weather changed");
        }
        for id in &report.removed {
            info!(tick = report.tick, entity = %id, "removed");
        }
    }

    let diag = sim.last_diagnostics();
    info!(
        ticks = sim.tick_count(),
        sim_seconds = sim.sim_time(),
        hits,
        boss_alive = sim.registry().contains(boss),
        last_tick_us = diag.total_time.as_micros() as u64,
        "fight over"
    );

    let save = sim.capture_save().to_json()?;
    println!("{save}");
    Ok(())
}
