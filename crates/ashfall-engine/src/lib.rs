//! Ashfall Engine -- the per-tick simulation core.
//!
//! Builds on [`ashfall_registry`] and adds everything that runs each tick:
//!
//! - [`physics`]: semi-implicit Euler integration with gravity and friction
//! - [`collision`]: tile-map grounding and advisory AABB overlap pairs
//! - [`ai`]: reactive pursuit of the player
//! - [`combat`]: stamina-gated melee swings and projectile contacts
//! - [`boss`]: monotonic health-threshold phase machine
//! - [`particles`]: seeded cosmetic bursts
//! - [`weather`]: ambient weather rolls and rain particles
//! - [`tick`]: the [`Simulation`](tick::Simulation) context and its fixed pass order
//! - [`snapshot`] / [`replay`]: hashed state capture and deterministic replay
//!
//! Rendering, audio, UI and raw device polling stay outside: hosts feed an
//! [`InputFrame`](input::InputFrame), optionally a [`SolidQuery`](collision::SolidQuery)
//! map, and read the registry and particles back after each tick.

#![deny(unsafe_code)]

pub mod ai;
pub mod boss;
pub mod collision;
pub mod combat;
pub mod config;
pub mod input;
pub mod particles;
pub mod physics;
pub mod replay;
pub mod snapshot;
pub mod tick;
pub mod weather;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::ai::{DirectPursuit, Steering, SteeringOutput};
    pub use crate::boss::PhaseTransition;
    pub use crate::collision::{CollisionPair, SolidQuery, TileGrid};
    pub use crate::combat::{AttackOutcome, CombatEvent};
    pub use crate::config::{
        CombatConfig, ConfigError, ParticleConfig, PlayerConfig, SimConfig, TickConfig,
        WeatherConfig,
    };
    pub use crate::input::{Action, InputFrame, InputSource};
    pub use crate::particles::{Particle, ParticleEmitter};
    pub use crate::snapshot::{RestoreError, SimulationSnapshot};
    pub use crate::tick::{AttackReport, Simulation, TickDiagnostics, TickReport};
    pub use crate::weather::{Weather, WeatherKind};
    pub use ashfall_registry::prelude::*;
}
