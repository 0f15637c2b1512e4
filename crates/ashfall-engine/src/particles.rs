//! Cosmetic particle bursts.
//!
//! Particles live outside the registry: they never collide, never take or
//! deal damage and never touch entity resources. Velocities are drawn from a
//! seeded [`Pcg32`] so identical runs produce identical bursts, and the RNG is
//! part of the emitter's serialized state.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::ParticleConfig;

/// System name used in tick diagnostics.
pub const PARTICLES_SYSTEM_NAME: &str = "particles";

/// One cosmetic particle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    /// Per-update displacement.
    pub vx: f64,
    pub vy: f64,
    /// Remaining life; the particle is pruned once this reaches zero.
    pub life: f64,
    /// Render tag copied from the burst request.
    pub visual: String,
}

/// Owns the live particles and the RNG their velocities are drawn from.
///
/// Bursts are requested by combat hits, boss phase changes, weather and the
/// host; [`update`](Self::update) runs once per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleEmitter {
    particles: Vec<Particle>,
    rng: Pcg32,
    initial_life: f64,
    decay: f64,
    max_speed: f64,
}

impl ParticleEmitter {
    /// An empty emitter with its RNG seeded from `seed`.
    pub fn new(seed: u64, config: &ParticleConfig) -> Self {
        Self {
            particles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            initial_life: config.initial_life,
            decay: config.decay,
            max_speed: config.max_speed.abs(),
        }
    }

    /// Emit `count` particles at `(x, y)`, each with velocity components
    /// drawn uniformly from `[-max_speed, max_speed]`.
    pub fn spawn(&mut self, x: f64, y: f64, visual: &str, count: usize) {
        self.particles.reserve(count);
        for _ in 0..count {
            let vx = self.random_speed();
            let vy = self.random_speed();
            self.particles.push(Particle {
                x,
                y,
                vx,
                vy,
                life: self.initial_life,
                visual: visual.to_owned(),
            });
        }
    }

    fn random_speed(&mut self) -> f64 {
        if self.max_speed > 0.0 {
            self.rng.gen_range(-self.max_speed..=self.max_speed)
        } else {
            0.0
        }
    }

    /// Move, age, then drop expired particles.
    pub fn update(&mut self) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= self.decay;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Live particles in emission order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Drop every live particle. The RNG keeps its position.
    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
