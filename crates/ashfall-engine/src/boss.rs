//! Health-threshold phase escalation for bosses.
//!
//! Phases only move forward. Each threshold fires at most once, tracked by the
//! `visited` flags in [`BossPhaseState`], so healing back above a threshold and
//! dropping below it again does nothing.

use ashfall_registry::components::{BossPhaseState, EnemyBehavior, Entity, EntityKind};
use ashfall_registry::entity::EntityId;
use ashfall_registry::registry::Registry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{validate_boss_thresholds, ConfigError, SimConfig};
use crate::particles::ParticleEmitter;

/// System name used in tick diagnostics.
pub const BOSS_SYSTEM_NAME: &str = "boss";

/// A boss crossed one of its hp thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub boss: EntityId,
    pub from_phase: u8,
    /// Phase after the transition; never lower than `from_phase`.
    pub to_phase: u8,
    /// Fraction of max hp that was crossed.
    pub threshold: f64,
}

/// Turn `entity` into a boss with the given phase table.
///
/// Base stats are taken from the entity's current attack power and speed.
pub fn attach_phases(
    entity: &mut Entity,
    thresholds: Vec<f64>,
    stat_multipliers: Vec<f64>,
) -> Result<(), ConfigError> {
    validate_boss_thresholds(&thresholds)?;
    if let Some(&bad) = stat_multipliers.iter().find(|m| !(m.is_finite() && **m > 0.0)) {
        return Err(ConfigError::NotPositive {
            field: "boss.stat_multipliers",
            value: bad,
        });
    }
    let base_speed = entity.speed;
    entity.kind = EntityKind::Enemy(EnemyBehavior::Boss);
    entity.boss = Some(BossPhaseState::new(
        thresholds,
        stat_multipliers,
        entity.attack_power,
        base_speed,
    ));
    Ok(())
}

/// Check every boss against its thresholds and fire newly crossed phases.
pub fn evaluate(
    registry: &mut Registry,
    config: &SimConfig,
    emitter: &mut ParticleEmitter,
    transitions: &mut Vec<PhaseTransition>,
) {
    for entity in registry.iter_mut() {
        let Some(health) = entity.health.as_ref() else {
            continue;
        };
        let (hp, max_hp) = (f64::from(health.hp), f64::from(health.max_hp));
        let Some(state) = entity.boss.as_mut() else {
            continue;
        };

        let mut fired = false;
        for i in 0..state.thresholds.len() {
            if state.visited.get(i).copied().unwrap_or(true) {
                continue;
            }
            let threshold = state.thresholds[i];
            if hp >= threshold * max_hp {
                continue;
            }

            state.visited[i] = true;
            let from_phase = state.current_phase;
            let candidate = u8::try_from(i + 2).unwrap_or(u8::MAX);
            state.current_phase = state.current_phase.max(candidate);

            transitions.push(PhaseTransition {
                boss: entity.id,
                from_phase,
                to_phase: state.current_phase,
                threshold,
            });
            let (cx, cy) = entity.body.center();
            emitter.spawn(
                cx,
                cy,
                &config.particles.phase_visual,
                config.particles.phase_burst,
            );
            debug!(boss = %entity.id, from_phase, to_phase = state.current_phase, "boss phase transition");
            fired = true;
        }

        if fired {
            let mult = state.multiplier(state.current_phase);
            entity.attack_power = (f64::from(state.base_attack_power) * mult).round() as i32;
            entity.speed = state.base_speed * mult;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
