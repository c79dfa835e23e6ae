use crate::error::{AppError, Result};
use crate::fallback::FallbackStrategy;
use chrono::{DateTime, Local, NaiveDate};
use serde::Deserialize;

/// Latest hour a day's series can be requested up to
pub const MAX_END_HOUR: u8 = 23;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AppError::InvalidData(format!(
                "Latitude {} is outside -90..=90",
                latitude
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::InvalidData(format!(
                "Longitude {} is outside -180..=180",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Shift by the given offsets, clamped to valid bounds
    pub fn offset(&self, d_lat: f64, d_lon: f64) -> Self {
        Self {
            latitude: (self.latitude + d_lat).clamp(-90.0, 90.0),
            longitude: (self.longitude + d_lon).clamp(-180.0, 180.0),
        }
    }
}

/// A value that either came from the forecast service or was filled in locally
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub estimated: bool,
}

impl Estimate {
    pub fn upstream(value: f64) -> Self {
        Self {
            value,
            estimated: false,
        }
    }

    pub fn fallback(value: f64) -> Self {
        Self {
            value,
            estimated: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurrentWeatherReading {
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub humidity: Estimate,
    pub pressure: Estimate,
    /// Local time the reading was taken, not the service's timestamp
    pub captured_at: DateTime<Local>,
}

impl CurrentWeatherReading {
    pub fn assemble(
        payload: CurrentWeatherPayload,
        fallback: &mut dyn FallbackStrategy,
        captured_at: DateTime<Local>,
    ) -> Self {
        let current = payload.current_weather.unwrap_or_default();

        let humidity = match current.relative_humidity {
            Some(h) => Estimate::upstream(h),
            None => Estimate::fallback(fallback.humidity()),
        };
        let pressure = match current.pressure_msl {
            Some(p) => Estimate::upstream(p),
            None => Estimate::fallback(fallback.pressure()),
        };

        Self {
            temperature: current.temperature,
            wind_speed: current.windspeed,
            wind_direction: current.winddirection,
            humidity,
            pressure,
            captured_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyWindSample {
    pub hour: u8,
    pub time: String,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub position: Coordinates,
    pub synthesized: bool,
}

/// Build samples for hours `0..=end_hour` of `date`.
///
/// The number of samples is `min(end_hour + 1, available)` where `available`
/// is the length of the longest series in the payload.
pub fn assemble_hourly(
    payload: HourlyWindPayload,
    origin: Coordinates,
    date: NaiveDate,
    end_hour: u8,
    fallback: &mut dyn FallbackStrategy,
) -> Result<Vec<HourlyWindSample>> {
    if end_hour > MAX_END_HOUR {
        return Err(AppError::InvalidData(format!(
            "End hour {} is outside 0..={}",
            end_hour, MAX_END_HOUR
        )));
    }

    let hourly = payload.hourly.unwrap_or_default();
    let available = hourly
        .time
        .len()
        .max(hourly.windspeed_10m.len())
        .max(hourly.winddirection_10m.len());
    let count = (end_hour as usize + 1).min(available);

    let mut samples = Vec::with_capacity(count);
    for i in 0..count {
        let speed = hourly.windspeed_10m.get(i).copied().flatten();
        let direction = hourly.winddirection_10m.get(i).copied().flatten();
        let synthesized = speed.is_none() || direction.is_none();

        let wind_speed = speed.unwrap_or_else(|| fallback.wind_speed()).max(0.0);
        let wind_direction = normalize_direction(
            direction.unwrap_or_else(|| fallback.wind_direction()),
        );

        let time = match hourly.time.get(i) {
            Some(t) => t.clone(),
            None => format!("{}T{:02}:00", date.format("%Y-%m-%d"), i),
        };

        samples.push(HourlyWindSample {
            hour: i as u8,
            time,
            wind_speed,
            wind_direction,
            position: fallback.jitter(origin),
            synthesized,
        });
    }

    Ok(samples)
}

/// Map any bearing into `[0, 360)`
pub fn normalize_direction(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

// Upstream payloads

#[derive(Debug, Deserialize)]
pub struct GeocodeMatch {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CurrentWeatherPayload {
    #[serde(default)]
    pub current_weather: Option<CurrentWeatherBlock>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CurrentWeatherBlock {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub windspeed: Option<f64>,
    #[serde(default)]
    pub winddirection: Option<f64>,
    #[serde(default)]
    pub relative_humidity: Option<f64>,
    #[serde(default)]
    pub pressure_msl: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct HourlyWindPayload {
    #[serde(default)]
    pub hourly: Option<HourlyWindSeries>,
}

#[derive(Debug, Deserialize, Default)]
pub struct HourlyWindSeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub windspeed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub winddirection_10m: Vec<Option<f64>>,
}
