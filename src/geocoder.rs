use crate::config::GeocodingConfig;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, GeocodeMatch};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Forward geocoding against a Nominatim-compatible `/search` endpoint.
pub struct Geocoder {
    client: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(config: &GeocodingConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look up the first match for `city`.
    ///
    /// `Ok(None)` means the service answered but knows no such place.
    pub async fn geocode(&self, city: &str) -> Result<Option<Coordinates>> {
        let city = city.trim();
        if city.is_empty() {
            return Err(AppError::InvalidData("City name cannot be empty".to_string()));
        }

        let url = Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[("q", city), ("format", "json"), ("limit", "1")],
        )?;
        debug!("Geocoding '{}' via {}", city, url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        let matches: Vec<GeocodeMatch> = serde_json::from_str(&body)?;
        let Some(first) = matches.into_iter().next() else {
            info!("No geocoding match for '{}'", city);
            return Ok(None);
        };

        let coordinates = parse_match(&first)?;
        info!(
            "Geocoded '{}' to {} ({:.4}, {:.4})",
            city,
            first.display_name.as_deref().unwrap_or("unnamed place"),
            coordinates.latitude,
            coordinates.longitude
        );
        Ok(Some(coordinates))
    }
}

fn parse_match(m: &GeocodeMatch) -> Result<Coordinates> {
    let latitude = m
        .lat
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::Parse(format!("Invalid latitude '{}'", m.lat)))?;
    let longitude = m
        .lon
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::Parse(format!("Invalid longitude '{}'", m.lon)))?;

    Coordinates::new(latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocode_match(lat: &str, lon: &str) -> GeocodeMatch {
        GeocodeMatch {
            lat: lat.to_string(),
            lon: lon.to_string(),
            display_name: None,
        }
    }

    #[test]
    fn test_parse_match() {
        let coords = parse_match(&geocode_match("48.8588897", "2.3200410")).unwrap();
        assert_eq!(coords.latitude, 48.8588897);
        assert_eq!(coords.longitude, 2.3200410);
    }

    #[test]
    fn test_parse_match_rejects_garbage() {
        assert!(matches!(
            parse_match(&geocode_match("north", "2.0")),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_match_rejects_out_of_bounds() {
        assert!(matches!(
            parse_match(&geocode_match("91.0", "2.0")),
            Err(AppError::InvalidData(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_city_rejected_without_request() {
        let config = GeocodingConfig {
            // Unroutable on purpose: the call must fail before any request
            base_url: "https://invalid.invalid".to_string(),
            user_agent: "weather_app".to_string(),
        };
        let geocoder = Geocoder::new(&config, Duration::from_secs(1)).unwrap();
        let result = geocoder.geocode("   ").await;
        assert!(matches!(result, Err(AppError::InvalidData(_))));
    }
}
