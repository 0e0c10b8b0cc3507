use crate::config::Config;
use crate::errors::AppError;
use crate::models::{LocationRequest, SoilDetectionResponse};
use crate::soil::{classify_texture, SoilTexture, SoilType};
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;

const SOIL_TIMEOUT: Duration = Duration::from_secs(30);
const SOIL_PROPERTIES: [&str; 4] = ["clay", "sand", "silt", "phh2o"];
const SOIL_DEPTHS: [&str; 2] = ["0-5cm", "5-15cm"];

/// Client for the ISRIC SoilGrids properties query.
pub struct SoilGridsClient {
    client: Client,
    base_url: String,
}

impl SoilGridsClient {
    pub fn new(config: &Config) -> Self {
        Self::with_base_url(config.soilgrids_base_url.clone())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(SOIL_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.into(),
        }
    }

    /// Detects the soil type at a location.
    ///
    /// Never fails: when SoilGrids is unreachable or answers with something
    /// unusable the default `Loam` reading is returned instead.
    pub async fn detect(&self, location: &LocationRequest) -> SoilDetectionResponse {
        match self.query(location).await {
            Ok(properties) => {
                let texture = SoilTexture {
                    clay: properties.get("clay").and_then(Value::as_f64),
                    sand: properties.get("sand").and_then(Value::as_f64),
                    silt: properties.get("silt").and_then(Value::as_f64),
                };
                let soil_type = classify_texture(&texture);
                tracing::info!(
                    "Detected soil type {} at ({}, {})",
                    soil_type,
                    location.lat,
                    location.lon
                );

                let properties = if properties.is_empty() {
                    zero_texture()
                } else {
                    properties
                };

                SoilDetectionResponse {
                    soil_type: soil_type.to_string(),
                    properties,
                    message: format!(
                        "Soil type detected successfully at coordinates ({}, {})",
                        location.lat, location.lon
                    ),
                }
            }
            Err(e) => {
                tracing::warn!("Soil detection failed, using default soil: {}", e);
                default_soil(location)
            }
        }
    }

    /// Mean value of each property at the shallowest reported depth.
    async fn query(&self, location: &LocationRequest) -> Result<Map<String, Value>, AppError> {
        let lat = location.lat.to_string();
        let lon = location.lon.to_string();
        let mut params: Vec<(&str, &str)> = vec![("lon", lon.as_str()), ("lat", lat.as_str())];
        params.extend(SOIL_PROPERTIES.iter().map(|p| ("property", *p)));
        params.extend(SOIL_DEPTHS.iter().map(|d| ("depth", *d)));
        params.push(("value", "mean"));

        let url = reqwest::Url::parse_with_params(
            &format!("{}/soilgrids/v2.0/properties/query", self.base_url),
            &params,
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::debug!("Requesting soil data for lat={}, lon={}", lat, lon);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "SoilGrids returned status {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let layers = body
            .get("properties")
            .and_then(|p| p.get("layers"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AppError::ExternalApiError("Invalid SoilGrids response structure".to_string())
            })?;

        let mut properties = Map::new();
        for layer in layers {
            let Some(name) = layer.get("name").and_then(Value::as_str) else {
                continue;
            };
            let mean = layer
                .get("depths")
                .and_then(Value::as_array)
                .and_then(|depths| depths.first())
                .and_then(|depth| depth.get("values"))
                .and_then(|values| values.get("mean"))
                .filter(|mean| !mean.is_null());

            if let Some(mean) = mean {
                properties.insert(name.to_string(), mean.clone());
            }
        }

        tracing::debug!("Extracted soil properties: {:?}", properties);
        Ok(properties)
    }
}

fn zero_texture() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("clay".to_string(), json!(0));
    map.insert("sand".to_string(), json!(0));
    map.insert("silt".to_string(), json!(0));
    map
}

/// Fallback reading used whenever SoilGrids cannot be used.
pub fn default_soil(location: &LocationRequest) -> SoilDetectionResponse {
    let mut properties = Map::new();
    properties.insert("clay".to_string(), json!(250));
    properties.insert("sand".to_string(), json!(400));
    properties.insert("silt".to_string(), json!(350));

    SoilDetectionResponse {
        soil_type: SoilType::Loam.to_string(),
        properties,
        message: format!(
            "Using default soil type (API unavailable). Location: ({}, {})",
            location.lat, location.lon
        ),
    }
}
