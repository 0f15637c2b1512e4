//! Ambient weather.
//!
//! Weather is an environment event source for the particle emitter. Every
//! `period` seconds of simulated time it rolls a new [`WeatherKind`]; while it
//! rains, each tick drops one burst of rain particles at a random point of the
//! configured area. It never touches entities.
//!
//! The roll uses its own seeded [`Pcg32`], separate from the emitter's, so
//! turning weather on does not change combat bursts.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WeatherConfig;
use crate::particles::ParticleEmitter;

/// System name used in tick diagnostics.
pub const WEATHER_SYSTEM_NAME: &str = "weather";

/// Mixed into the simulation seed so the weather stream differs from the
/// particle stream.
const WEATHER_SEED_SALT: u64 = 0x7765_6174_6865_72;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeatherKind {
    #[default]
    Clear,
    /// Emits rain particles every tick.
    Rain,
    /// Purely visual; the renderer decides what fog looks like.
    Fog,
}

impl WeatherKind {
    pub const ALL: [WeatherKind; 3] = [WeatherKind::Clear, WeatherKind::Rain, WeatherKind::Fog];
}

/// Current weather, the countdown to the next roll and the roll RNG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weather {
    kind: WeatherKind,
    /// Seconds until the next roll. Starts at zero, so the first update rolls.
    timer: f64,
    rng: Pcg32,
}

impl Weather {
    pub fn new(seed: u64) -> Self {
        Self {
            kind: WeatherKind::Clear,
            timer: 0.0,
            rng: Pcg32::seed_from_u64(seed ^ WEATHER_SEED_SALT),
        }
    }

    pub fn kind(&self) -> WeatherKind {
        self.kind
    }

    /// Seconds left before the next roll.
    pub fn remaining(&self) -> f64 {
        self.timer
    }

    /// Force `kind` for one full period.
    pub fn set(&mut self, kind: WeatherKind, config: &WeatherConfig) {
        self.kind = kind;
        self.timer = config.period;
    }

    /// Advance by `dt` seconds and emit this tick's rain.
    ///
    /// Returns the new kind when the timer ran out and a roll happened.
    pub fn update(
        &mut self,
        dt: f64,
        config: &WeatherConfig,
        emitter: &mut ParticleEmitter,
    ) -> Option<WeatherKind> {
        self.timer -= dt;
        let mut rolled = None;
        if self.timer <= 0.0 {
            self.timer = config.period;
            let from = self.kind;
            self.kind = WeatherKind::ALL[self.rng.gen_range(0..WeatherKind::ALL.len())];
            debug!(?from, to = ?self.kind, "weather rolled");
            rolled = Some(self.kind);
        }

        if self.kind == WeatherKind::Rain {
            let x = self.rng.gen_range(0.0..=config.area_w);
            let y = self.rng.gen_range(0.0..=config.area_h);
            emitter.spawn(x, y, &config.rain_visual, config.rain_burst);
        }
        rolled
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
