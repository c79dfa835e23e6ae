use crate::config::Config;
use crate::error::Result;
use crate::fallback::{self, FallbackStrategy};
use crate::forecast::ForecastClient;
use crate::geocoder::Geocoder;
use crate::models::{Coordinates, CurrentWeatherReading, HourlyWindSample, MAX_END_HOUR};
use crate::report;
use chrono::{Local, NaiveDate};
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::{info, warn};

pub const CITY_PROMPT: &str = "Enter city name: ";
pub const HOUR_PROMPT: &str =
    "Enter the hour (in 24-hour format) up to which you want hourly wind data (e.g., 13 for 1 PM): ";

/// One interactive run: ask for a city, print its current weather, ask for an
/// hour, print hourly wind up to that hour.
///
/// Lookup failures are printed to `output` and end that step with an empty
/// result. Only I/O errors on `input`/`output` are returned.
pub struct Session<R, W> {
    input: R,
    output: W,
    geocoder: Geocoder,
    forecast: ForecastClient,
    fallback: Box<dyn FallbackStrategy>,
    date: Option<NaiveDate>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(config: &Config, input: R, output: W) -> Result<Self> {
        let timeout = Duration::from_secs(config.http.timeout_seconds);

        Ok(Self {
            input,
            output,
            geocoder: Geocoder::new(&config.geocoding, timeout)?,
            forecast: ForecastClient::new(&config.forecast, timeout)?,
            fallback: fallback::from_config(&config.fallback),
            date: None,
        })
    }

    /// Pin the calendar day used for the hourly series instead of today
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub async fn run(&mut self) -> Result<()> {
        let Some(city) = self.prompt_line(CITY_PROMPT)? else {
            info!("No city entered, exiting");
            return Ok(());
        };

        let Some(coords) = self.locate(&city).await? else {
            return Ok(());
        };

        self.show_current(coords).await?;

        let Some(end_hour) = self.prompt_hour()? else {
            info!("No hour entered, exiting");
            return Ok(());
        };

        self.show_hourly(&city, coords, end_hour).await?;
        Ok(())
    }

    pub async fn locate(&mut self, city: &str) -> Result<Option<Coordinates>> {
        match self.geocoder.geocode(city).await {
            Ok(Some(coords)) => Ok(Some(coords)),
            Ok(None) => {
                writeln!(self.output, "City not found. Please enter a valid city name.")?;
                Ok(None)
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", city, e);
                writeln!(self.output, "Error fetching coordinates: {}", e)?;
                Ok(None)
            }
        }
    }

    pub async fn show_current(
        &mut self,
        coords: Coordinates,
    ) -> Result<Option<CurrentWeatherReading>> {
        match self
            .forecast
            .current_weather(coords, self.fallback.as_mut())
            .await
        {
            Ok(reading) => {
                write!(self.output, "{}", report::format_current(&reading))?;
                Ok(Some(reading))
            }
            Err(e) => {
                warn!("Current weather request failed: {}", e);
                writeln!(self.output, "Error fetching weather data: {}", e)?;
                Ok(None)
            }
        }
    }

    pub async fn show_hourly(
        &mut self,
        city: &str,
        coords: Coordinates,
        end_hour: u8,
    ) -> Result<Option<Vec<HourlyWindSample>>> {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());

        match self
            .forecast
            .hourly_wind(coords, date, end_hour, self.fallback.as_mut())
            .await
        {
            Ok(samples) => {
                write!(self.output, "{}", report::format_hourly(city, end_hour, &samples))?;
                Ok(Some(samples))
            }
            Err(e) => {
                warn!("Hourly wind request failed: {}", e);
                writeln!(self.output, "Error fetching hourly weather data: {}", e)?;
                Ok(None)
            }
        }
    }

    /// Ask until a valid hour is given; `None` on end of input
    fn prompt_hour(&mut self) -> Result<Option<u8>> {
        loop {
            let Some(answer) = self.prompt_line(HOUR_PROMPT)? else {
                return Ok(None);
            };

            match parse_hour(&answer) {
                Some(hour) => return Ok(Some(hour)),
                None => {
                    writeln!(
                        self.output,
                        "Please enter a whole number from 0 to {}.",
                        MAX_END_HOUR
                    )?;
                }
            }
        }
    }

    fn prompt_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

fn parse_hour(answer: &str) -> Option<u8> {
    answer
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|hour| *hour <= MAX_END_HOUR)
}
