//! The simulation context and its fixed-order tick.
//!
//! [`Simulation`] owns every piece of mutable state: the registry, the
//! particle emitter, the command buffer, the current input frame and the
//! optional world map. [`Simulation::tick`] is the only entry point that
//! advances time, and each tick runs the same passes in the same order:
//!
//! 0. stamina regeneration and player intent,
//! 1. AI pursuit,
//! 2. physics integration (plus straight-line projectile flight),
//! 3. world collision,
//! 4. entity overlap detection,
//! 5. combat (queued melee swings, then projectile contacts),
//! 6. boss phase evaluation,
//! 7. weather (when enabled) and particle update,
//! 8. end of tick: apply the command buffer, then prune every entity at zero hp.
//!
//! With the same initial state, config and inputs, two simulations produce
//! identical state; the particle RNG is seeded from the config.
//!
//! # Example
//!
//! ```
//! use ashfall_engine::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! let player = sim.spawn(Entity::player(0.0, 0.0).with_health(100).with_stamina(30.0, 0.0).with_attack(12));
//! let enemy = sim.spawn(Entity::enemy(30.0, 0.0).with_health(20));
//! sim.set_player(player);
//!
//! sim.set_input(InputFrame::new().with(Action::Attack));
//! let report = sim.step();
//! assert_eq!(report.combat_events.len(), 1);
//! assert_eq!(sim.registry().get(enemy).unwrap().hp(), Some(8));
//! ```

use std::mem;
use std::time::{Duration, Instant};

use ashfall_registry::command::{CausalReason, CommandBuffer, SystemId};
use ashfall_registry::components::{Entity, Facing};
use ashfall_registry::entity::EntityId;
use ashfall_registry::registry::Registry;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ai::{self, AI_SYSTEM_NAME};
use crate::boss::{self, PhaseTransition, BOSS_SYSTEM_NAME};
use crate::collision::{self, CollisionPair, SolidQuery};
use crate::combat::{self, AttackOutcome, CombatEvent, COMBAT_SYSTEM_NAME};
use crate::config::{ConfigError, SimConfig};
use crate::input::{Action, InputFrame};
use crate::particles::{Particle, ParticleEmitter, PARTICLES_SYSTEM_NAME};
use crate::physics::{self, PHYSICS_SYSTEM_NAME};
use crate::weather::{Weather, WeatherKind, WEATHER_SYSTEM_NAME};

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Wall-clock timing of the last tick. Never part of simulation state.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Time per pass, in execution order.
    pub system_times: Vec<(&'static str, Duration)>,
    pub total_time: Duration,
    /// Applying commands plus the dead-entity prune.
    pub command_apply_time: Duration,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Everything observable that happened during one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickReport {
    /// Index of the tick that just ran (0 for the first).
    pub tick: u64,
    pub combat_events: Vec<CombatEvent>,
    pub phase_transitions: Vec<PhaseTransition>,
    pub overlaps: Vec<CollisionPair>,
    /// Entities removed at the end of the tick.
    pub removed: Vec<EntityId>,
    /// Set when the weather rolled this tick.
    #[serde(default)]
    pub weather_change: Option<WeatherKind>,
}

/// Result of an out-of-tick [`Simulation::attack`].
#[derive(Debug, Clone)]
pub struct AttackReport {
    pub outcome: AttackOutcome,
    pub combat_events: Vec<CombatEvent>,
    /// Boss phases crossed by the swing, killing blows included.
    pub phase_transitions: Vec<PhaseTransition>,
    /// Entities the swing killed, already pruned.
    pub removed: Vec<EntityId>,
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

pub struct Simulation {
    pub(crate) registry: Registry,
    pub(crate) config: SimConfig,
    map: Option<Box<dyn SolidQuery>>,
    pub(crate) emitter: ParticleEmitter,
    pub(crate) weather: Weather,
    pub(crate) commands: CommandBuffer,
    pub(crate) current_input: InputFrame,
    pub(crate) player: Option<EntityId>,
    /// Melee swings requested since the last combat pass.
    pub(crate) pending_attacks: Vec<EntityId>,
    pub(crate) tick_counter: u64,
    pub(crate) sim_time: f64,
    last_diagnostics: TickDiagnostics,
}

impl Simulation {
    /// An empty simulation with no map and no player.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if `config` fails validation.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_registry(config, Registry::new())
    }

    /// Wrap an existing registry.
    pub fn with_registry(config: SimConfig, registry: Registry) -> Result<Self, ConfigError> {
        config.validate()?;
        let emitter = ParticleEmitter::new(config.tick.rng_seed, &config.particles);
        let weather = Weather::new(config.tick.rng_seed);
        Ok(Self {
            registry,
            config,
            map: None,
            emitter,
            weather,
            commands: CommandBuffer::new(),
            current_input: InputFrame::default(),
            player: None,
            pending_attacks: Vec::new(),
            tick_counter: 0,
            sim_time: 0.0,
            last_diagnostics: TickDiagnostics::default(),
        })
    }

    // -- setup --------------------------------------------------------------

    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        self.registry.spawn(entity)
    }

    /// Mark `id` as the entity driven by input and pursued by AI.
    pub fn set_player(&mut self, id: EntityId) {
        self.player = Some(id);
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub fn set_map(&mut self, map: impl SolidQuery + 'static) {
        self.map = Some(Box::new(map));
    }

    pub fn clear_map(&mut self) {
        self.map = None;
    }

    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }

    /// Input consumed by the next tick. It stays in effect until replaced.
    pub fn set_input(&mut self, input: InputFrame) {
        self.current_input = input;
    }

    pub fn current_input(&self) -> &InputFrame {
        &self.current_input
    }

    // -- driving ------------------------------------------------------------

    /// Advance by one fixed step.
    pub fn step(&mut self) -> TickReport {
        self.tick(self.config.tick.fixed_dt)
    }

    /// Run `count` fixed steps. Returns the new tick count.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        for _ in 0..count {
            self.step();
        }
        self.tick_counter
    }

    /// Advance the simulation by one tick of `dt` seconds.
    ///
    /// Non-finite or negative `dt` is treated as zero; it only affects stamina
    /// regeneration and the simulation clock.
    pub fn tick(&mut self, dt: f64) -> TickReport {
        let tick_start = Instant::now();
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            trace!(dt, "invalid tick delta clamped to zero");
            0.0
        };
        let mut system_times = Vec::with_capacity(8);
        let mut report = TickReport {
            tick: self.tick_counter,
            ..Default::default()
        };

        let t = Instant::now();
        self.apply_player_intent(dt);
        system_times.push(("player", t.elapsed()));

        let t = Instant::now();
        ai::pursue(&mut self.registry, self.player);
        system_times.push((AI_SYSTEM_NAME, t.elapsed()));

        let t = Instant::now();
        physics::integrate(&mut self.registry, &self.config);
        physics::advance_projectiles(&mut self.registry);
        system_times.push((PHYSICS_SYSTEM_NAME, t.elapsed()));

        let t = Instant::now();
        collision::resolve_world(&mut self.registry, self.map.as_deref());
        report.overlaps = collision::detect_overlaps(&self.registry);
        system_times.push(("collision", t.elapsed()));

        let t = Instant::now();
        for attacker in mem::take(&mut self.pending_attacks) {
            combat::attack(
                &mut self.registry,
                attacker,
                &self.config,
                &mut self.emitter,
                &mut report.combat_events,
            );
        }
        combat::resolve_projectiles(
            &mut self.registry,
            &report.overlaps,
            &self.config,
            &mut self.emitter,
            &mut self.commands,
            &mut report.combat_events,
        );
        system_times.push((COMBAT_SYSTEM_NAME, t.elapsed()));

        let t = Instant::now();
        boss::evaluate(
            &mut self.registry,
            &self.config,
            &mut self.emitter,
            &mut report.phase_transitions,
        );
        system_times.push((BOSS_SYSTEM_NAME, t.elapsed()));

        if self.config.weather.enabled {
            let t = Instant::now();
            report.weather_change = self.weather.update(dt, &self.config.weather, &mut self.emitter);
            system_times.push((WEATHER_SYSTEM_NAME, t.elapsed()));
        }

        let t = Instant::now();
        self.emitter.update();
        system_times.push((PARTICLES_SYSTEM_NAME, t.elapsed()));

        let apply_start = Instant::now();
        report.removed = self.end_of_batch();
        let command_apply_time = apply_start.elapsed();

        self.tick_counter += 1;
        self.sim_time += dt;

        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
            command_apply_time,
        };
        trace!(
            tick = report.tick,
            hits = report.combat_events.len(),
            removed = report.removed.len(),
            "tick complete"
        );
        report
    }

    /// Resolve a melee swing right now, outside the tick.
    ///
    /// The swing is its own batch: combat, boss phases, then the prune.
    /// Anything it kills is removed before this returns, and a boss it kills
    /// still fires the phases its hp fell through.
    pub fn attack(&mut self, attacker: EntityId) -> AttackReport {
        let mut combat_events = Vec::new();
        let outcome = combat::attack(
            &mut self.registry,
            attacker,
            &self.config,
            &mut self.emitter,
            &mut combat_events,
        );
        let mut phase_transitions = Vec::new();
        boss::evaluate(
            &mut self.registry,
            &self.config,
            &mut self.emitter,
            &mut phase_transitions,
        );
        let removed = self.end_of_batch();
        AttackReport {
            outcome,
            combat_events,
            phase_transitions,
            removed,
        }
    }

    /// Request a particle burst from outside the tick, e.g. for an
    /// environment effect the host owns. Particles never touch entities.
    pub fn emit(&mut self, x: f64, y: f64, visual: &str, count: usize) {
        self.emitter.spawn(x, y, visual, count);
    }

    /// Force the weather for one full period.
    pub fn set_weather(&mut self, kind: WeatherKind) {
        self.weather.set(kind, &self.config.weather);
    }

    pub fn weather(&self) -> &Weather {
        &self.weather
    }

    /// Resolve a melee swing during the next tick's combat pass.
    pub fn queue_attack(&mut self, attacker: EntityId) {
        self.pending_attacks.push(attacker);
    }

    /// Remove `id` at the end of the next tick.
    pub fn queue_despawn(&mut self, id: EntityId, reason: &str) {
        if !self.commands.despawn_pending(id) {
            self.commands
                .despawn(id, SystemId::HOST, CausalReason::GameRule(reason.to_owned()));
        }
    }

    /// Stage 0: stamina regeneration, then the player's movement and actions.
    fn apply_player_intent(&mut self, dt: f64) {
        for entity in self.registry.iter_mut() {
            if let Some(pool) = entity.stamina.as_mut() {
                pool.regenerate(dt);
            }
        }

        let Some(player_id) = self.player else {
            return;
        };
        let Some(player) = self.registry.get_mut(player_id) else {
            trace!(player = %player_id, "player missing, input ignored");
            return;
        };
        let input = &self.current_input;

        match input.horizontal() {
            0 => player.body.vx = 0.0,
            dir => {
                player.facing = if dir < 0 { Facing::Left } else { Facing::Right };
                player.body.vx = f64::from(dir) * player.speed;
            }
        }

        if input.contains(Action::Dodge) {
            let cost = self.config.player.dodge_cost;
            let paid = cost <= 0.0
                || player.stamina.as_mut().is_some_and(|pool| pool.try_spend(cost));
            if paid {
                player.body.vx = player.facing.sign() * self.config.player.dodge_speed;
            } else {
                trace!(player = %player_id, "dodge refused, not enough stamina");
            }
        }

        if input.contains(Action::Attack) {
            self.pending_attacks.push(player_id);
        }
    }

    /// Apply queued commands, then remove every entity at zero hp.
    fn end_of_batch(&mut self) -> Vec<EntityId> {
        let applied = self.commands.apply(&mut self.registry);
        let mut removed: Vec<EntityId> = applied
            .iter()
            .filter(|c| c.applied_successfully)
            .map(|c| c.target)
            .collect();
        removed.extend(self.registry.prune_dead());

        if let Some(player) = self.player {
            if removed.contains(&player) {
                debug!(player = %player, "player removed");
            }
        }
        removed
    }

    // -- accessors ----------------------------------------------------------

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Direct registry access for hosts and tests. Removal should still go
    /// through the tick.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn particles(&self) -> &[Particle] {
        self.emitter.particles()
    }

    pub fn emitter(&self) -> &ParticleEmitter {
        &self.emitter
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Seconds of simulated time (sum of tick deltas).
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn fixed_dt(&self) -> f64 {
        self.config.tick.fixed_dt
    }

    pub fn pending_attacks(&self) -> &[EntityId] {
        &self.pending_attacks
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
