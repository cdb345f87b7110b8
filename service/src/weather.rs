//! OpenWeatherMap client and payload shaping.
//!
//! The published payload for a store is a pretty-printed JSON array of
//! `{datetime, temp}` points: the 5-day/3-hour forecast with the current
//! observation appended at the end. Downstream dashboards consume this
//! array as-is, so its shape is stable.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// One point of the published payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// `YYYY-MM-DD HH:MM:SS` in UTC, matching the provider's `dt_txt`
    pub datetime: String,
    /// Temperature in degrees Celsius
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    main: MainReadings,
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    dt: i64,
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

/// Errors from the weather provider.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payload serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client for the OpenWeatherMap HTTP API.
pub struct WeatherClient {
    http: reqwest::Client,
    api_key: String,
}

impl WeatherClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Current weather at the given coordinates, as a single point.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<ForecastPoint, WeatherError> {
        let url = format!(
            "{BASE_URL}/weather?lat={lat}&lon={lon}&appid={key}&units=metric",
            key = self.api_key
        );
        let resp: CurrentResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(ForecastPoint {
            datetime: format_unix(resp.dt),
            temp: resp.main.temp,
        })
    }

    /// 3-hourly forecast for the next 5 days at the given coordinates.
    pub async fn five_day_forecast(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<ForecastPoint>, WeatherError> {
        let url = format!(
            "{BASE_URL}/forecast?lat={lat}&lon={lon}&appid={key}&units=metric",
            key = self.api_key
        );
        let resp: ForecastResponse = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp
            .list
            .into_iter()
            .map(|item| ForecastPoint {
                datetime: item.dt_txt,
                temp: item.main.temp,
            })
            .collect())
    }

    /// Full serialized payload for one store: forecast plus current
    /// observation, pretty-printed.
    pub async fn forecast_payload(&self, lat: f64, lon: f64) -> Result<Vec<u8>, WeatherError> {
        let mut points = self.five_day_forecast(lat, lon).await?;
        points.push(self.current(lat, lon).await?);
        Ok(serde_json::to_vec_pretty(&points)?)
    }
}

fn format_unix(dt: i64) -> String {
    DateTime::from_timestamp(dt, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_forecast_response() {
        let body = r#"{
            "cod": "200",
            "cnt": 2,
            "list": [
                {
                    "dt": 1724666400,
                    "main": {"temp": 21.4, "feels_like": 21.0, "humidity": 60},
                    "weather": [{"id": 800, "main": "Clear"}],
                    "dt_txt": "2024-08-26 10:00:00"
                },
                {
                    "dt": 1724677200,
                    "main": {"temp": 23.9, "feels_like": 23.5, "humidity": 55},
                    "weather": [{"id": 801, "main": "Clouds"}],
                    "dt_txt": "2024-08-26 13:00:00"
                }
            ]
        }"#;

        let resp: ForecastResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.list.len(), 2);
        assert_eq!(resp.list[0].dt_txt, "2024-08-26 10:00:00");
        assert_eq!(resp.list[1].main.temp, 23.9);
    }

    #[test]
    fn parses_current_response() {
        let body = r#"{
            "coord": {"lon": 13.405, "lat": 52.52},
            "dt": 1724666400,
            "main": {"temp": 19.7, "humidity": 70},
            "name": "Berlin"
        }"#;

        let resp: CurrentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.dt, 1724666400);
        assert_eq!(resp.main.temp, 19.7);
    }

    #[test]
    fn formats_unix_timestamp_like_dt_txt() {
        assert_eq!(format_unix(1724666400), "2024-08-26 10:00:00");
        assert_eq!(format_unix(0), "1970-01-01 00:00:00");
    }

    #[test]
    fn payload_shape_is_a_pretty_array() {
        let points = vec![
            ForecastPoint {
                datetime: "2024-08-26 10:00:00".into(),
                temp: 21.4,
            },
            ForecastPoint {
                datetime: "2024-08-26 13:00:00".into(),
                temp: 23.9,
            },
        ];
        let payload = serde_json::to_vec_pretty(&points).unwrap();
        let text = String::from_utf8(payload).unwrap();

        assert!(text.starts_with("[\n"));
        assert!(text.contains(r#""datetime": "2024-08-26 10:00:00""#));

        let parsed: Vec<ForecastPoint> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, points);
    }
}
