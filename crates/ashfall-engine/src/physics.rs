//! Semi-implicit Euler integration for physics-bodied entities.
//!
//! Each tick, for every entity with a [`PhysicsBody`](ashfall_registry::components::PhysicsBody):
//!
//! 1. gravity is added to the pending vertical acceleration,
//! 2. acceleration is added to velocity,
//! 3. the *new* velocity is added to position,
//! 4. horizontal velocity is multiplied by the friction factor,
//! 5. the acceleration accumulator is cleared.
//!
//! Velocity is updated before position within the same step; swapping the two
//! gives explicit Euler, which drifts. There is exactly one pass per tick.

use ashfall_registry::components::Entity;
use ashfall_registry::registry::Registry;
use tracing::trace;

use crate::config::SimConfig;

/// System name used in tick diagnostics.
pub const PHYSICS_SYSTEM_NAME: &str = "physics";

/// Advance every physics body by one tick.
pub fn integrate(registry: &mut Registry, config: &SimConfig) {
    for entity in registry.iter_mut() {
        if entity.physics.is_none() {
            continue;
        }
        let body = &mut entity.body;

        body.ay += config.gravity;

        body.vx += body.ax;
        body.vy += body.ay;

        body.x += body.vx;
        body.y += body.vy;

        body.vx *= config.friction;

        body.ax = 0.0;
        body.ay = 0.0;
    }
}

/// Move projectiles that have no physics body in a straight line.
pub fn advance_projectiles(registry: &mut Registry) {
    for entity in registry.iter_mut() {
        if entity.projectile.is_none() || entity.physics.is_some() {
            continue;
        }
        entity.body.x += entity.body.vx;
        entity.body.y += entity.body.vy;
    }
}

/// Add an external impulse to a body's velocity, scaled by inverse mass.
///
/// Entities without a physics body are left alone. Non-finite impulses are
/// dropped so a degenerate caller cannot poison the body with NaN.
pub fn apply_impulse(entity: &mut Entity, ix: f64, iy: f64) {
    let Some(physics) = entity.physics.as_ref() else {
        return;
    };
    if !(ix.is_finite() && iy.is_finite()) {
        trace!(entity = %entity.id, ix, iy, "non-finite impulse dropped");
        return;
    }
    let mass = physics.mass();
    entity.body.vx += ix / mass;
    entity.body.vy += iy / mass;
}

/// Queue acceleration for the next integration step.
pub fn apply_force(entity: &mut Entity, ax: f64, ay: f64) {
    if entity.physics.is_none() {
        return;
    }
    entity.body.ax += ax;
    entity.body.ay += ay;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
