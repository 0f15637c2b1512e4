//! Reactive pursuit for AI-controlled entities.
//!
//! Every entity carrying an [`AiIntent`] heads straight for the player's
//! centre at its [`Entity::speed`]. The rule is reactive and stateless: it
//! reads the current positions and writes velocity and facing, nothing else.
//! Grid path search would slot in as another [`Steering`] implementation.

use ashfall_registry::components::{AiIntent, Entity, Facing};
use ashfall_registry::entity::EntityId;
use ashfall_registry::registry::Registry;
use tracing::trace;

/// System name used in tick diagnostics.
pub const AI_SYSTEM_NAME: &str = "ai";

/// Velocity chosen by a steering rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    /// Replaces the entity's horizontal velocity.
    pub vx: f64,
    /// `None` leaves the vertical axis to physics.
    pub vy: Option<f64>,
}

/// Chooses a velocity for one AI entity given a target point.
pub trait Steering {
    /// Velocity for `entity` heading to `target`, a world-space point.
    fn steer(&self, entity: &Entity, intent: &AiIntent, target: (f64, f64)) -> SteeringOutput;
}

/// Move at full speed toward the target along each pursued axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectPursuit;

fn signum_or_zero(delta: f64) -> f64 {
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl Steering for DirectPursuit {
    fn steer(&self, entity: &Entity, intent: &AiIntent, target: (f64, f64)) -> SteeringOutput {
        let (cx, cy) = entity.body.center();
        let (dx, dy) = (target.0 - cx, target.1 - cy);
        SteeringOutput {
            vx: signum_or_zero(dx) * entity.speed,
            vy: intent
                .pursue_vertical
                .then(|| signum_or_zero(dy) * entity.speed),
        }
    }
}

/// Steer every AI entity toward `player` with [`DirectPursuit`].
pub fn pursue(registry: &mut Registry, player: Option<EntityId>) {
    pursue_with(registry, player, &DirectPursuit);
}

/// Steer every AI entity toward `player` with a custom rule.
///
/// With no live player nothing changes. The player itself is never steered,
/// even if it carries an [`AiIntent`].
pub fn pursue_with(registry: &mut Registry, player: Option<EntityId>, steering: &dyn Steering) {
    let Some(player_id) = player else {
        return;
    };
    let Some(target) = registry.get(player_id).map(|p| p.body.center()) else {
        trace!(player = %player_id, "no live player, AI idle");
        return;
    };

    for entity in registry.iter_mut() {
        if entity.id == player_id {
            continue;
        }
        let Some(intent) = entity.ai.as_ref() else {
            continue;
        };
        let out = steering.steer(entity, intent, target);
        entity.body.vx = out.vx;
        if let Some(vy) = out.vy {
            entity.body.vy = vy;
        }
        let (cx, _) = entity.body.center();
        if let Some(facing) = Facing::from_delta(target.0 - cx) {
            entity.facing = facing;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
