use crate::config::ForecastConfig;
use crate::error::Result;
use crate::fallback::FallbackStrategy;
use crate::models::{
    assemble_hourly, Coordinates, CurrentWeatherPayload, CurrentWeatherReading,
    HourlyWindPayload, HourlyWindSample,
};
use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

const HOURLY_WIND_FIELDS: &str = "windspeed_10m,winddirection_10m";
const WIND_SPEED_UNIT: &str = "ms";

/// Client for the Open-Meteo `/forecast` endpoint
pub struct ForecastClient {
    client: Client,
    base_url: String,
    timezone: String,
}

impl ForecastClient {
    pub fn new(config: &ForecastConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("city-weather/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timezone: config.timezone.clone(),
        })
    }

    /// Current conditions at `coords`, captured at local time now.
    ///
    /// Humidity and pressure are filled from `fallback` when the service omits them.
    pub async fn current_weather(
        &self,
        coords: Coordinates,
        fallback: &mut dyn FallbackStrategy,
    ) -> Result<CurrentWeatherReading> {
        let payload = self.fetch_current(coords).await?;
        Ok(CurrentWeatherReading::assemble(payload, fallback, Local::now()))
    }

    /// Hourly wind for `date` from midnight up to and including `end_hour`.
    pub async fn hourly_wind(
        &self,
        coords: Coordinates,
        date: NaiveDate,
        end_hour: u8,
        fallback: &mut dyn FallbackStrategy,
    ) -> Result<Vec<HourlyWindSample>> {
        let payload = self.fetch_hourly(coords, date).await?;
        assemble_hourly(payload, coords, date, end_hour, fallback)
    }

    pub async fn fetch_current(&self, coords: Coordinates) -> Result<CurrentWeatherPayload> {
        let latitude = coords.latitude.to_string();
        let longitude = coords.longitude.to_string();

        self.get_json(&[
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("current_weather", "true"),
            ("wind_speed_unit", WIND_SPEED_UNIT),
            ("timezone", self.timezone.as_str()),
        ])
        .await
    }

    pub async fn fetch_hourly(
        &self,
        coords: Coordinates,
        date: NaiveDate,
    ) -> Result<HourlyWindPayload> {
        let latitude = coords.latitude.to_string();
        let longitude = coords.longitude.to_string();
        let day = date.format("%Y-%m-%d").to_string();

        self.get_json(&[
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("hourly", HOURLY_WIND_FIELDS),
            ("wind_speed_unit", WIND_SPEED_UNIT),
            ("timezone", self.timezone.as_str()),
            ("start_date", day.as_str()),
            ("end_date", day.as_str()),
        ])
        .await
    }

    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let url = Url::parse_with_params(&format!("{}/forecast", self.base_url), params)?;
        debug!("Requesting forecast from {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        Ok(serde_json::from_str(&body)?)
    }
}
