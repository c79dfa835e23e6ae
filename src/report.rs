use crate::models::{CurrentWeatherReading, Estimate, HourlyWindSample};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_current(reading: &CurrentWeatherReading) -> String {
    let mut lines = vec![
        String::new(),
        format!(
            "Current Weather Information as of {}:",
            reading.captured_at.format(TIMESTAMP_FORMAT)
        ),
        format!("Temperature: {} °C", or_na(reading.temperature)),
        format!("Wind Speed: {} m/s", or_na(reading.wind_speed)),
        format!("Wind Direction: {}°", or_na(reading.wind_direction)),
        format!("Humidity: {}%{}", reading.humidity.value.round(), marker(&reading.humidity)),
        format!("Pressure: {} hPa{}", reading.pressure.value.round(), marker(&reading.pressure)),
    ];
    lines.push(String::new());
    lines.join("\n")
}

pub fn format_hourly(city: &str, end_hour: u8, samples: &[HourlyWindSample]) -> String {
    let mut out = format!(
        "\nHourly Wind Data up to {}:00 for {}\n",
        end_hour,
        capitalize(city.trim())
    );

    if samples.is_empty() {
        out.push_str("No hourly data available for today.\n");
        return out;
    }

    for sample in samples {
        out.push_str(&format!(
            "{} - Wind Speed: {:.1} m/s, Wind Direction: {:.1}°, Latitude: {:.4}, Longitude: {:.4}{}\n",
            sample.time,
            sample.wind_speed,
            sample.wind_direction,
            sample.position.latitude,
            sample.position.longitude,
            if sample.synthesized { " (estimated)" } else { "" }
        ));
    }
    out
}

/// Upper-case the first character and lower-case the rest
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| v.to_string())
}

fn marker(estimate: &Estimate) -> &'static str {
    if estimate.estimated {
        " (estimated)"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;
    use chrono::{Local, TimeZone};

    fn reading() -> CurrentWeatherReading {
        CurrentWeatherReading {
            temperature: Some(18.3),
            wind_speed: None,
            wind_direction: Some(270.0),
            humidity: Estimate::fallback(47.0),
            pressure: Estimate::upstream(1012.4),
            captured_at: Local.with_ymd_and_hms(2024, 7, 15, 9, 5, 0).unwrap(),
        }
    }

    #[test]
    fn test_format_current() {
        let text = format_current(&reading());
        assert!(text.contains("Current Weather Information as of 2024-07-15 09:05:00:"));
        assert!(text.contains("Temperature: 18.3 °C"));
        assert!(text.contains("Wind Speed: N/A m/s"));
        assert!(text.contains("Wind Direction: 270°"));
        assert!(text.contains("Humidity: 47% (estimated)"));
        assert!(text.contains("Pressure: 1012 hPa\n"));
    }

    #[test]
    fn test_format_hourly_lines() {
        let samples = vec![HourlyWindSample {
            hour: 0,
            time: "2024-07-15T00:00".to_string(),
            wind_speed: 3.26,
            wind_direction: 181.04,
            position: Coordinates::new(51.50741, -0.12779).unwrap(),
            synthesized: false,
        }];
        let text = format_hourly("lONDON", 0, &samples);
        assert!(text.starts_with("\nHourly Wind Data up to 0:00 for London\n"));
        assert!(text.contains(
            "2024-07-15T00:00 - Wind Speed: 3.3 m/s, Wind Direction: 181.0°, Latitude: 51.5074, Longitude: -0.1278\n"
        ));
    }

    #[test]
    fn test_format_hourly_empty() {
        let text = format_hourly("oslo", 5, &[]);
        assert!(text.contains("No hourly data available"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("new york"), "New york");
        assert_eq!(capitalize("ÉCOLE"), "École");
        assert_eq!(capitalize(""), "");
    }
}
