//! Values substituted when the forecast service leaves a field out.
//!
//! None of these numbers are measurements. [`RandomFallback`] draws plausible
//! values so the report reads naturally, [`FixedFallback`] returns the same
//! placeholder every time. Both come from [`FallbackConfig`].

use crate::config::{FallbackConfig, FallbackMode, Range};
use crate::models::Coordinates;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait FallbackStrategy {
    /// Relative humidity in percent
    fn humidity(&mut self) -> f64;

    /// Sea-level pressure in hPa
    fn pressure(&mut self) -> f64;

    /// Wind speed in m/s, never negative
    fn wind_speed(&mut self) -> f64;

    /// Wind bearing in degrees, within `[0, 360)`
    fn wind_direction(&mut self) -> f64;

    /// Position reported next to an hourly sample
    fn jitter(&mut self, origin: Coordinates) -> Coordinates;
}

/// Build the strategy selected by `config.mode`
pub fn from_config(config: &FallbackConfig) -> Box<dyn FallbackStrategy> {
    match config.mode {
        FallbackMode::Random => match config.seed {
            Some(seed) => {
                tracing::debug!("Using seeded random fallback (seed {})", seed);
                Box::new(RandomFallback::seeded(config, seed))
            }
            None => Box::new(RandomFallback::new(config)),
        },
        FallbackMode::Fixed => Box::new(FixedFallback::new(config)),
    }
}

pub struct RandomFallback {
    rng: StdRng,
    humidity: Range,
    pressure: Range,
    wind_speed: Range,
    jitter: f64,
}

impl RandomFallback {
    pub fn new(config: &FallbackConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn seeded(config: &FallbackConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &FallbackConfig, rng: StdRng) -> Self {
        Self {
            rng,
            humidity: config.humidity,
            pressure: config.pressure,
            wind_speed: config.wind_speed_range(),
            jitter: config.coordinate_jitter,
        }
    }

    fn draw(&mut self, range: Range) -> f64 {
        if range.min >= range.max {
            return range.min;
        }
        self.rng.random_range(range.min..=range.max)
    }
}

impl FallbackStrategy for RandomFallback {
    fn humidity(&mut self) -> f64 {
        // Whole percentages, like a real sensor readout
        self.draw(self.humidity).round().clamp(self.humidity.min, self.humidity.max)
    }

    fn pressure(&mut self) -> f64 {
        self.draw(self.pressure).round().clamp(self.pressure.min, self.pressure.max)
    }

    fn wind_speed(&mut self) -> f64 {
        self.draw(self.wind_speed).max(0.0)
    }

    fn wind_direction(&mut self) -> f64 {
        self.rng.random_range(0.0..360.0)
    }

    fn jitter(&mut self, origin: Coordinates) -> Coordinates {
        if self.jitter <= 0.0 {
            return origin;
        }
        let spread = Range {
            min: -self.jitter,
            max: self.jitter,
        };
        let d_lat = self.draw(spread);
        let d_lon = self.draw(spread);
        origin.offset(d_lat, d_lon)
    }
}

/// Deterministic placeholders: range midpoints, the base wind speed, a
/// northerly bearing and no positional jitter.
pub struct FixedFallback {
    humidity: f64,
    pressure: f64,
    wind_speed: f64,
}

impl FixedFallback {
    pub fn new(config: &FallbackConfig) -> Self {
        Self {
            humidity: config.humidity.midpoint().round(),
            pressure: config.pressure.midpoint().round(),
            wind_speed: config.base_wind_speed.max(0.0),
        }
    }
}

impl FallbackStrategy for FixedFallback {
    fn humidity(&mut self) -> f64 {
        self.humidity
    }

    fn pressure(&mut self) -> f64 {
        self.pressure
    }

    fn wind_speed(&mut self) -> f64 {
        self.wind_speed
    }

    fn wind_direction(&mut self) -> f64 {
        0.0
    }

    fn jitter(&mut self, origin: Coordinates) -> Coordinates {
        origin
    }
}
