//! Simulation constants and tuning.
//!
//! Kinematic values are per tick: gravity is added to `vy` once per tick,
//! friction multiplies `vx` once per tick, particle decay is subtracted once
//! per update. Only stamina regeneration and the simulation clock use the
//! tick delta in seconds.
//!
//! ```
//! use ashfall_engine::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{ "gravity": 10.0, "friction": 0.9 }"#).unwrap();
//! assert_eq!(config.gravity, 10.0);
//! assert_eq!(config.combat.stamina_cost, 10.0); // unspecified sections use defaults
//! ```

use serde::{Deserialize, Serialize};

/// A config value outside its allowed range.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Friction outside `(0, 1]`.
    #[error("friction must be in (0, 1], got {0}")]
    Friction(f64),

    /// NaN or infinite.
    #[error("`{field}` must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    /// Below the field's lower bound (zero for sizes, periods and areas).
    #[error("`{field}` is out of range, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    /// Thresholds not strictly descending inside `(0, 1)`.
    #[error("boss thresholds must be strictly descending fractions in (0, 1): {0:?}")]
    BossThresholds(Vec<f64>),

    /// Unparseable JSON.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Fixed-step timing and the simulation seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds per tick used by [`Simulation::step`](crate::tick::Simulation::step).
    pub fixed_dt: f64,
    /// Seed for the particle and weather RNGs.
    pub rng_seed: u64,
}

impl Default for TickConfig {
    /// 60 Hz.
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            rng_seed: 0x5eed_a5f4,
        }
    }
}

// ---------------------------------------------------------------------------
// CombatConfig
// ---------------------------------------------------------------------------

/// Melee tuning shared by every attacker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Stamina spent per swing. Zero disables gating.
    pub stamina_cost: f64,
    /// Horizontal offset of the hitbox centre from the attacker's centre.
    pub reach: f64,
    /// Hitbox width.
    pub hitbox_w: f64,
    /// Hitbox height.
    pub hitbox_h: f64,
    /// Impulse applied to physics-bodied targets, x scaled by attacker facing.
    pub knockback_x: f64,
    /// Vertical knockback impulse; negative lifts the target.
    pub knockback_y: f64,
    /// Visual tag of the hit burst.
    pub hit_visual: String,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            stamina_cost: 10.0,
            reach: 20.0,
            hitbox_w: 30.0,
            hitbox_h: 30.0,
            knockback_x: 4.0,
            knockback_y: -2.0,
            hit_visual: "#ff0".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerConfig
// ---------------------------------------------------------------------------

/// Player-only actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Stamina spent per dodge. Zero makes dodges free.
    pub dodge_cost: f64,
    /// Horizontal velocity set by a dodge, in the facing direction.
    pub dodge_speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            dodge_cost: 30.0,
            dodge_speed: 10.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ParticleConfig
// ---------------------------------------------------------------------------

/// Particle lifetime, motion and burst sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Life of a fresh particle.
    pub initial_life: f64,
    /// Life removed per update.
    pub decay: f64,
    /// Bound on each velocity component of a fresh particle.
    pub max_speed: f64,
    /// Particles per melee or projectile hit.
    pub hit_burst: usize,
    /// Particles per boss phase transition.
    pub phase_burst: usize,
    /// Visual tag of the phase burst.
    pub phase_visual: String,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            initial_life: 1.0,
            decay: 0.02,
            max_speed: 0.8,
            hit_burst: 8,
            phase_burst: 24,
            phase_visual: "#f50".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// WeatherConfig
// ---------------------------------------------------------------------------

/// Ambient weather. Off by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Run the weather pass each tick.
    pub enabled: bool,
    /// Seconds between weather rolls.
    pub period: f64,
    /// Width of the area rain falls on, from x = 0.
    pub area_w: f64,
    /// Height of the area rain falls on, from y = 0.
    pub area_h: f64,
    /// Rain particles per tick.
    pub rain_burst: usize,
    pub rain_visual: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 20.0,
            area_w: 1500.0,
            area_h: 1000.0,
            rain_burst: 8,
            rain_visual: "#6af".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Every tunable of a [`Simulation`](crate::tick::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Added to `vy` of every physics body each tick.
    pub gravity: f64,
    /// Horizontal velocity decay per tick, in `(0, 1]`.
    pub friction: f64,
    pub tick: TickConfig,
    pub combat: CombatConfig,
    pub player: PlayerConfig,
    pub particles: ParticleConfig,
    pub weather: WeatherConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: 0.4,
            friction: 0.85,
            tick: TickConfig::default(),
            combat: CombatConfig::default(),
            player: PlayerConfig::default(),
            particles: ParticleConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges: finite values, friction in `(0, 1]`, positive sizes
    /// and periods, non-negative weather area.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("gravity", self.gravity),
            ("friction", self.friction),
            ("tick.fixed_dt", self.tick.fixed_dt),
            ("combat.stamina_cost", self.combat.stamina_cost),
            ("combat.reach", self.combat.reach),
            ("combat.knockback_x", self.combat.knockback_x),
            ("combat.knockback_y", self.combat.knockback_y),
            ("player.dodge_cost", self.player.dodge_cost),
            ("player.dodge_speed", self.player.dodge_speed),
            ("particles.max_speed", self.particles.max_speed),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }

        if !(self.friction > 0.0 && self.friction <= 1.0) {
            return Err(ConfigError::Friction(self.friction));
        }

        let positive = [
            ("tick.fixed_dt", self.tick.fixed_dt),
            ("combat.hitbox_w", self.combat.hitbox_w),
            ("combat.hitbox_h", self.combat.hitbox_h),
            ("particles.initial_life", self.particles.initial_life),
            ("particles.decay", self.particles.decay),
            ("weather.period", self.weather.period),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        for (field, value) in [
            ("weather.area_w", self.weather.area_w),
            ("weather.area_h", self.weather.area_h),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
            if value < 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        Ok(())
    }
}

/// Check boss thresholds: strictly descending, each inside `(0, 1)`.
pub fn validate_boss_thresholds(thresholds: &[f64]) -> Result<(), ConfigError> {
    let in_range = thresholds.iter().all(|t| t.is_finite() && *t > 0.0 && *t < 1.0);
    let descending = thresholds.windows(2).all(|w| w[0] > w[1]);
    if in_range && descending {
        Ok(())
    } else {
        Err(ConfigError::BossThresholds(thresholds.to_vec()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
