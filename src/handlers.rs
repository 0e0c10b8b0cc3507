use crate::classifier::Classifier;
use crate::config::Config;
use crate::db_storage::CommunityStore;
use crate::errors::{AppError, ResultExt};
use crate::market_price::{MarketPriceService, PriceLookup};
use crate::models::*;
use crate::services::RecommendationService;
use crate::soil_client::SoilGridsClient;
use crate::translation::TranslationClient;
use crate::weather_client::WeatherClient;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Classifier-backed recommendation pipeline.
    pub recommender: RecommendationService,
    pub soil: Arc<SoilGridsClient>,
    pub weather: Arc<WeatherClient>,
    pub translator: Arc<TranslationClient>,
    /// Feedback, community posts and farmer profiles.
    pub store: Arc<dyn CommunityStore>,
}

impl AppState {
    /// Builds the state with the data.gov.in price service.
    pub fn new(
        config: Config,
        classifier: Option<Arc<dyn Classifier>>,
        store: Arc<dyn CommunityStore>,
    ) -> Self {
        let prices: Arc<dyn PriceLookup> = Arc::new(MarketPriceService::new(&config));
        Self::with_prices(config, classifier, prices, store)
    }

    pub fn with_prices(
        config: Config,
        classifier: Option<Arc<dyn Classifier>>,
        prices: Arc<dyn PriceLookup>,
        store: Arc<dyn CommunityStore>,
    ) -> Self {
        Self {
            recommender: RecommendationService::new(
                classifier,
                prices,
                config.recommendation_top_n,
            ),
            soil: Arc::new(SoilGridsClient::new(&config)),
            weather: Arc::new(WeatherClient::new(&config)),
            translator: Arc::new(TranslationClient::new(&config)),
            store,
            config,
        }
    }
}

/// Health check endpoint, also served at `/`.
///
/// Returns the service status and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "crop-advisor-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// GET /api/model-info
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    match state.recommender.classifier() {
        Some(classifier) => Json(json!(classifier.info())),
        None => Json(json!({ "status": "Model not loaded" })),
    }
}

/// POST /api/detect-soil
///
/// Always answers with a soil reading; SoilGrids failures fall back to a
/// default `Loam` reading.
pub async fn detect_soil(
    State(state): State<Arc<AppState>>,
    Json(location): Json<LocationRequest>,
) -> Result<Json<SoilDetectionResponse>, AppError> {
    location.validate().map_err(AppError::BadRequest)?;
    tracing::info!("POST /detect-soil - ({}, {})", location.lat, location.lon);

    Ok(Json(state.soil.detect(&location).await))
}

/// POST /api/weather
pub async fn weather(
    State(state): State<Arc<AppState>>,
    Json(location): Json<LocationRequest>,
) -> Result<Json<WeatherResponse>, AppError> {
    location.validate().map_err(AppError::BadRequest)?;
    tracing::info!("POST /weather - ({}, {})", location.lat, location.lon);

    Ok(Json(state.weather.current(&location).await))
}

/// POST /api/recommend
///
/// Soil-keyed recommendation: the top candidates, whatever their score.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, AppError> {
    tracing::info!("POST /recommend - soil_type: {}", request.soil_type);

    let response = state.recommender.recommend_for_soil(&request).await?;
    Ok(Json(response))
}

/// POST /api/recommend-manual
///
/// Recommendation from explicit soil-test values, filtered by minimum score.
pub async fn recommend_manual(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ManualRecommendationRequest>,
) -> Result<Json<RecommendationResponse>, AppError> {
    tracing::info!("POST /recommend-manual");

    let response = state.recommender.recommend_manual(&request).await?;
    Ok(Json(response))
}

/// POST /api/recommend-from-location
///
/// Detects soil and fetches weather concurrently, then recommends for the
/// detected soil type under the current weather.
pub async fn recommend_from_location(
    State(state): State<Arc<AppState>>,
    Json(location): Json<LocationRequest>,
) -> Result<Json<CombinedRecommendationResponse>, AppError> {
    location.validate().map_err(AppError::BadRequest)?;
    tracing::info!(
        "POST /recommend-from-location - ({}, {})",
        location.lat,
        location.lon
    );

    let (detected_soil, current_weather) = tokio::join!(
        state.soil.detect(&location),
        state.weather.current(&location)
    );

    let request = RecommendationRequest {
        soil_type: detected_soil.soil_type.clone(),
        temperature: current_weather.temperature,
        rainfall: current_weather.rainfall,
        humidity: Some(current_weather.humidity),
        n: None,
        p: None,
        k: None,
        ph: None,
    };

    let recommendation = state
        .recommender
        .recommend_for_soil(&request)
        .await
        .context("Error generating combined recommendations")?;

    Ok(Json(CombinedRecommendationResponse {
        location_info: LocationInfo {
            latitude: location.lat,
            longitude: location.lon,
            name: current_weather.location.clone(),
        },
        detected_soil,
        current_weather,
        recommendations: recommendation.recommendations,
        input_parameters: recommendation.input_parameters,
    }))
}
