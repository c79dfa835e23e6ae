use crate::error::{AppError, Result};
use serde::{Deserialize, Deserializer};
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geocoding_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "weather_app".to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_url")]
    pub base_url: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_timezone() -> String {
    "auto".to_string()
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: default_forecast_url(),
            timezone: default_timezone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(
        default = "default_timeout_seconds",
        deserialize_with = "deserialize_seconds"
    )]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Custom deserializer that handles a duration as both number and string
///
/// Accepts:
/// - `timeout_seconds: 30` (number)
/// - `timeout_seconds: "30"` (string that parses to number)
/// - `timeout_seconds: ${HTTP_TIMEOUT}` (env var substituted to either)
fn deserialize_seconds<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SecondsValue {
        Number(u64),
        String(String),
    }

    match SecondsValue::deserialize(deserializer)? {
        SecondsValue::Number(n) => Ok(n),
        SecondsValue::String(s) => s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("Invalid number of seconds: '{}'", s))),
    }
}

/// Which source fills in values the forecast service leaves out
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    #[default]
    Random,
    Fixed,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    #[serde(default)]
    pub mode: FallbackMode,
    /// Seed for the random strategy; unseeded runs draw from the OS
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_humidity")]
    pub humidity: Range,
    #[serde(default = "default_pressure")]
    pub pressure: Range,
    #[serde(default = "default_base_wind_speed")]
    pub base_wind_speed: f64,
    #[serde(default = "default_wind_speed_below")]
    pub wind_speed_below: f64,
    #[serde(default = "default_wind_speed_above")]
    pub wind_speed_above: f64,
    #[serde(default = "default_coordinate_jitter")]
    pub coordinate_jitter: f64,
}

fn default_humidity() -> Range {
    Range {
        min: 30.0,
        max: 90.0,
    }
}

fn default_pressure() -> Range {
    Range {
        min: 980.0,
        max: 1050.0,
    }
}

fn default_base_wind_speed() -> f64 {
    5.0 // m/s
}

fn default_wind_speed_below() -> f64 {
    2.0
}

fn default_wind_speed_above() -> f64 {
    3.0
}

fn default_coordinate_jitter() -> f64 {
    0.015 // degrees
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            mode: FallbackMode::default(),
            seed: None,
            humidity: default_humidity(),
            pressure: default_pressure(),
            base_wind_speed: default_base_wind_speed(),
            wind_speed_below: default_wind_speed_below(),
            wind_speed_above: default_wind_speed_above(),
            coordinate_jitter: default_coordinate_jitter(),
        }
    }
}

impl FallbackConfig {
    /// Range synthesized wind speeds are drawn from, never below zero
    pub fn wind_speed_range(&self) -> Range {
        Range {
            min: (self.base_wind_speed - self.wind_speed_below).max(0.0),
            max: (self.base_wind_speed + self.wind_speed_above).max(0.0),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml(&content)
    }

    /// Load the file if it exists, otherwise run on built-in defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                path.as_ref().display()
            );
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // Substitute environment variables
        let expanded = expand_env_vars(content)?;

        // An empty document means "all defaults"
        let config: Config = if expanded.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&expanded)
                .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    ///
    /// Checks for:
    /// - Unexpanded environment variables
    /// - Valid HTTPS service URLs
    /// - Non-empty user agent
    /// - Positive timeout
    /// - Ordered fallback ranges and non-negative spreads
    pub fn validate(&self) -> Result<()> {
        let fields_to_check = [
            ("geocoding.base_url", &self.geocoding.base_url),
            ("geocoding.user_agent", &self.geocoding.user_agent),
            ("forecast.base_url", &self.forecast.base_url),
            ("forecast.timezone", &self.forecast.timezone),
        ];

        for (field_name, value) in &fields_to_check {
            if value.contains("${") {
                return Err(AppError::Config(format!(
                    "{} references an environment variable that is not set",
                    field_name
                )));
            }
        }

        validate_service_url("geocoding.base_url", &self.geocoding.base_url)?;
        validate_service_url("forecast.base_url", &self.forecast.base_url)?;

        if self.geocoding.user_agent.trim().is_empty() {
            return Err(AppError::Config(
                "Geocoding user_agent cannot be empty".to_string(),
            ));
        }

        if self.forecast.timezone.trim().is_empty() {
            return Err(AppError::Config(
                "Forecast timezone cannot be empty".to_string(),
            ));
        }

        if self.http.timeout_seconds == 0 {
            return Err(AppError::Config(
                "HTTP timeout_seconds must be greater than 0".to_string(),
            ));
        }

        let fallback = &self.fallback;
        for (name, range) in [("humidity", fallback.humidity), ("pressure", fallback.pressure)] {
            if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
                return Err(AppError::Config(format!(
                    "Fallback {} range is invalid: min {} must not exceed max {}",
                    name, range.min, range.max
                )));
            }
        }

        if !(0.0..=100.0).contains(&fallback.humidity.min)
            || !(0.0..=100.0).contains(&fallback.humidity.max)
        {
            return Err(AppError::Config(
                "Fallback humidity range must stay within 0-100%".to_string(),
            ));
        }

        for (name, value) in [
            ("base_wind_speed", fallback.base_wind_speed),
            ("wind_speed_below", fallback.wind_speed_below),
            ("wind_speed_above", fallback.wind_speed_above),
            ("coordinate_jitter", fallback.coordinate_jitter),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::Config(format!(
                    "Fallback {} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if fallback.coordinate_jitter > 1.0 {
            tracing::warn!(
                "Coordinate jitter of {}° is large, samples may land far from the city",
                fallback.coordinate_jitter
            );
        }

        Ok(())
    }
}

fn validate_service_url(field_name: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value).map_err(|e| {
        AppError::Config(format!("Invalid {} '{}': {}", field_name, value, e))
    })?;

    if parsed.scheme() != "https" {
        return Err(AppError::Config(format!(
            "{} must use HTTPS, got: {}",
            field_name,
            parsed.scheme()
        )));
    }

    Ok(())
}

fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| AppError::Config(format!("Invalid placeholder pattern: {}", e)))?;

    let mut missing_vars = Vec::new();

    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => {
                result = result.replace(&cap[0], &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    if !missing_vars.is_empty() {
        return Err(AppError::Config(format!(
            "Missing required environment variable{}: {}\n\n\
             To fix this:\n\
             1. Create a .env file in the project root\n\
             2. Set the missing variable{}: export {}=<value>\n\
             3. Or remove the placeholder from config/config.yaml",
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars.join(", "),
            if missing_vars.len() > 1 { "s" } else { "" },
            missing_vars[0],
        )));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.geocoding.user_agent, "weather_app");
        assert_eq!(config.forecast.timezone, "auto");
        assert_eq!(config.fallback.mode, FallbackMode::Random);
        assert_eq!(config.fallback.humidity, Range { min: 30.0, max: 90.0 });
        assert_eq!(config.fallback.pressure, Range { min: 980.0, max: 1050.0 });
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.forecast.base_url, "https://api.open-meteo.com/v1");
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let yaml = r#"
fallback:
  mode: fixed
  seed: 42
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.fallback.mode, FallbackMode::Fixed);
        assert_eq!(config.fallback.seed, Some(42));
        assert_eq!(config.fallback.coordinate_jitter, 0.015);
        assert_eq!(config.geocoding.base_url, "https://nominatim.openstreetmap.org");
    }

    #[test]
    fn test_wind_speed_range_from_base() {
        let fallback = FallbackConfig::default();
        assert_eq!(fallback.wind_speed_range(), Range { min: 3.0, max: 8.0 });
    }

    #[test]
    fn test_wind_speed_range_never_negative() {
        let fallback = FallbackConfig {
            base_wind_speed: 1.0,
            wind_speed_below: 4.0,
            ..FallbackConfig::default()
        };
        assert_eq!(fallback.wind_speed_range().min, 0.0);
    }

    #[test]
    fn test_timeout_deserialize_from_string() {
        let yaml = r#"timeout_seconds: "15""#;
        let config: HttpConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timeout_seconds, 15);
    }

    #[test]
    fn test_timeout_deserialize_invalid_string() {
        let yaml = r#"timeout_seconds: "soon""#;
        let result: std::result::Result<HttpConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Invalid number of seconds") || err_msg.contains("soon"));
    }

    #[test]
    fn test_rejects_http_scheme() {
        let yaml = r#"
forecast:
  base_url: http://api.open-meteo.com/v1
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("must use HTTPS"));
    }

    #[test]
    fn test_rejects_inverted_range() {
        let yaml = r#"
fallback:
  pressure:
    min: 1050
    max: 980
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("pressure range is invalid"));
    }

    #[test]
    fn test_rejects_negative_jitter() {
        let mut config = Config::default();
        config.fallback.coordinate_jitter = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = Config::default();
        config.http.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expands_env_vars() {
        std::env::set_var("CITY_WEATHER_TEST_AGENT", "weather_app (ops@example.com)");
        let yaml = r#"
geocoding:
  user_agent: "${CITY_WEATHER_TEST_AGENT}"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.geocoding.user_agent, "weather_app (ops@example.com)");
    }

    #[test]
    fn test_missing_env_var_is_reported() {
        let yaml = r#"
geocoding:
  user_agent: "${CITY_WEATHER_TEST_DEFINITELY_UNSET}"
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(err
            .to_string()
            .contains("CITY_WEATHER_TEST_DEFINITELY_UNSET"));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config.http.timeout_seconds, 30);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "http:\n  timeout_seconds: 5\n").unwrap();

        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.http.timeout_seconds, 5);
    }
}
