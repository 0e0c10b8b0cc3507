use crate::config::Config;
use crate::errors::AppError;
use crate::models::{LocationRequest, WeatherResponse};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TEMPERATURE: f64 = 25.0;
pub const DEFAULT_HUMIDITY: f64 = 65.0;
pub const DEFAULT_RAINFALL: f64 = 100.0;

const WEATHER_TIMEOUT: Duration = Duration::from_secs(30);

/// Current-weather client for OpenWeatherMap (metric units).
pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(config: &Config) -> Self {
        Self::with_endpoint(
            config.openweather_base_url.clone(),
            config.openweather_api_key.clone(),
        )
    }

    pub fn with_endpoint(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(WEATHER_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Current weather at a location. Any failure yields the default reading.
    pub async fn current(&self, location: &LocationRequest) -> WeatherResponse {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::info!("No OpenWeather API key configured, using default weather data");
            return default_weather("Clear sky");
        };

        match self.fetch(api_key, location).await {
            Ok(body) => match parse_weather(&body) {
                Some(weather) => {
                    tracing::info!(
                        "Weather for {} - Temp: {}°C, Humidity: {}%, Rainfall: {}mm",
                        weather.location,
                        weather.temperature,
                        weather.humidity,
                        weather.rainfall
                    );
                    weather
                }
                None => {
                    tracing::warn!("Invalid OpenWeather response structure, using defaults");
                    default_weather("Clear sky (data incomplete)")
                }
            },
            Err(e) => {
                tracing::warn!("Weather lookup failed, using defaults: {}", e);
                default_weather("Clear sky (API unavailable)")
            }
        }
    }

    async fn fetch(&self, api_key: &str, location: &LocationRequest) -> Result<Value, AppError> {
        let lat = location.lat.to_string();
        let lon = location.lon.to_string();
        let url = reqwest::Url::parse_with_params(
            &format!("{}/data/2.5/weather", self.base_url),
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", "metric"),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::debug!(
            "OpenWeather URL: {}/data/2.5/weather?lat={}&lon={}&appid=[REDACTED]",
            self.base_url,
            lat,
            lon
        );

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "OpenWeather returned status {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

/// Extracts a reading from an OpenWeather body. `None` when `main` is missing.
pub fn parse_weather(body: &Value) -> Option<WeatherResponse> {
    let main = body.get("main")?;

    let temperature = main
        .get("temp")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_TEMPERATURE);
    let humidity = main
        .get("humidity")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_HUMIDITY);

    let weather_description = body
        .get("weather")
        .and_then(Value::as_array)
        .and_then(|w| w.first())
        .and_then(|w| w.get("description"))
        .and_then(Value::as_str)
        .unwrap_or("Clear sky")
        .to_string();

    let location = body
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or("Unknown location")
        .to_string();

    // Rain volume for the last 1h, else 3h.
    let rain = body.get("rain");
    let rainfall = rain
        .and_then(|r| r.get("1h"))
        .and_then(Value::as_f64)
        .or_else(|| rain.and_then(|r| r.get("3h")).and_then(Value::as_f64))
        .unwrap_or(DEFAULT_RAINFALL);

    Some(WeatherResponse {
        temperature,
        humidity,
        rainfall,
        weather_description,
        location,
    })
}

pub fn default_weather(description: &str) -> WeatherResponse {
    WeatherResponse {
        temperature: DEFAULT_TEMPERATURE,
        humidity: DEFAULT_HUMIDITY,
        rainfall: DEFAULT_RAINFALL,
        weather_description: description.to_string(),
        location: "Unknown location".to_string(),
    }
}
