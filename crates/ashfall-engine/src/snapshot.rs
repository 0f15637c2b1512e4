//! Whole-simulation snapshots with BLAKE3 state hashing.
//!
//! A [`SimulationSnapshot`] captures everything that affects future ticks:
//! the registry (including its id allocator), the particle emitter and its RNG,
//! the weather and its RNG, the config, the clock, the current input, the
//! player id, queued melee swings and queued despawns. Restoring it onto any [`Simulation`] continues exactly where
//! the original left off.
//!
//! ```
//! use ashfall_engine::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! sim.spawn(Entity::enemy(0.0, 0.0).with_physics(1.0));
//! sim.run_ticks(10);
//!
//! let snapshot = sim.capture_snapshot();
//! assert_eq!(snapshot.tick_counter, 10);
//! assert_eq!(snapshot.hash.len(), 64);
//!
//! sim.run_ticks(10);
//! let after_twenty = sim.state_hash();
//!
//! sim.restore_snapshot(&snapshot).unwrap();
//! sim.run_ticks(10);
//! assert_eq!(sim.state_hash(), after_twenty);
//! ```
//!
//! Not captured: the world map (the host re-attaches it) and tick diagnostics.
//!
//! The lighter [`SaveSnapshot`] used for persistence lives in the registry
//! crate; [`Simulation::capture_save`] and [`Simulation::restore_save`] forward
//! to it.

use ashfall_registry::command::CommandBuffer;
use ashfall_registry::entity::EntityId;
use ashfall_registry::registry::Registry;
use ashfall_registry::snapshot::{RestoreReport, SaveSnapshot};
use ashfall_registry::SnapshotError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ConfigError, SimConfig};
use crate::input::InputFrame;
use crate::particles::ParticleEmitter;
use crate::tick::Simulation;
use crate::weather::Weather;

/// Why a [`SimulationSnapshot`] was refused.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    /// The recorded hash does not match the contents.
    #[error("snapshot hash mismatch: recorded {recorded}, recomputed {recomputed}")]
    HashMismatch { recorded: String, recomputed: String },

    /// The contents are intact but the config fails validation.
    #[error("snapshot carries an invalid config: {0}")]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// SimulationSnapshot
// ---------------------------------------------------------------------------

/// Full simulation state at a tick boundary, plus its hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub registry: Registry,
    pub emitter: ParticleEmitter,
    pub weather: Weather,
    pub config: SimConfig,
    pub tick_counter: u64,
    pub sim_time: f64,
    pub current_input: InputFrame,
    pub player: Option<EntityId>,
    pub pending_attacks: Vec<EntityId>,
    /// Despawns queued by the host for the next tick.
    pub commands: CommandBuffer,
    /// BLAKE3 hex digest of every other field.
    pub hash: String,
}

impl SimulationSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Serialize)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(SnapshotError::Deserialize)
    }

    fn recompute_hash(&self) -> String {
        compute_hash(&HashableState {
            registry: &self.registry,
            emitter: &self.emitter,
            weather: &self.weather,
            config: &self.config,
            tick_counter: self.tick_counter,
            sim_time: self.sim_time,
            current_input: &self.current_input,
            player: self.player,
            pending_attacks: &self.pending_attacks,
            commands: &self.commands,
        })
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct HashableState<'a> {
    registry: &'a Registry,
    emitter: &'a ParticleEmitter,
    weather: &'a Weather,
    config: &'a SimConfig,
    tick_counter: u64,
    sim_time: f64,
    current_input: &'a InputFrame,
    player: Option<EntityId>,
    pending_attacks: &'a [EntityId],
    commands: &'a CommandBuffer,
}

fn compute_hash(state: &HashableState<'_>) -> String {
    // serde_json writes non-finite floats as null, so this cannot fail for
    // these types.
    let json_bytes =
        serde_json::to_vec(state).expect("simulation state is always JSON-serializable");
    blake3::hash(&json_bytes).to_hex().to_string()
}

// ---------------------------------------------------------------------------
// Simulation snapshot/restore methods
// ---------------------------------------------------------------------------

impl Simulation {
    fn hashable(&self) -> HashableState<'_> {
        HashableState {
            registry: &self.registry,
            emitter: &self.emitter,
            weather: &self.weather,
            config: &self.config,
            tick_counter: self.tick_counter,
            sim_time: self.sim_time,
            current_input: &self.current_input,
            player: self.player,
            pending_attacks: &self.pending_attacks,
            commands: &self.commands,
        }
    }

    pub fn capture_snapshot(&self) -> SimulationSnapshot {
        let hash = compute_hash(&self.hashable());
        SimulationSnapshot {
            registry: self.registry.clone(),
            emitter: self.emitter.clone(),
            weather: self.weather.clone(),
            config: self.config.clone(),
            tick_counter: self.tick_counter,
            sim_time: self.sim_time,
            current_input: self.current_input.clone(),
            player: self.player,
            pending_attacks: self.pending_attacks.clone(),
            commands: self.commands.clone(),
            hash,
        }
    }

    /// Replace all simulation state with `snapshot`. The map is kept.
    ///
    /// # Errors
    ///
    /// The snapshot is verified before anything is touched: a hash mismatch
    /// or invalid config leaves the simulation unchanged.
    pub fn restore_snapshot(&mut self, snapshot: &SimulationSnapshot) -> Result<(), RestoreError> {
        let recomputed = snapshot.recompute_hash();
        if recomputed != snapshot.hash {
            return Err(RestoreError::HashMismatch {
                recorded: snapshot.hash.clone(),
                recomputed,
            });
        }
        snapshot.config.validate()?;

        self.registry = snapshot.registry.clone();
        self.emitter = snapshot.emitter.clone();
        self.weather = snapshot.weather.clone();
        self.config = snapshot.config.clone();
        self.tick_counter = snapshot.tick_counter;
        self.sim_time = snapshot.sim_time;
        self.current_input = snapshot.current_input.clone();
        self.player = snapshot.player;
        self.pending_attacks = snapshot.pending_attacks.clone();
        self.commands = snapshot.commands.clone();

        debug!(tick = self.tick_counter, entities = self.registry.len(), "snapshot restored");
        Ok(())
    }

    /// Hash of the current state, equal to `capture_snapshot().hash`.
    pub fn state_hash(&self) -> String {
        compute_hash(&self.hashable())
    }

    /// Alias of [`capture_snapshot`](Self::capture_snapshot) for branching
    /// workflows.
    pub fn fork_snapshot(&self) -> SimulationSnapshot {
        self.capture_snapshot()
    }

    /// Persistence view of every entity.
    pub fn capture_save(&self) -> SaveSnapshot {
        self.registry.capture_save()
    }

    /// Apply a persistence snapshot; values are clamped to entity limits.
    pub fn restore_save(&mut self, save: &SaveSnapshot) -> RestoreReport {
        self.registry.restore_save(save)
    }
}
