use crate::classifier::FeatureVector;
use crate::recommendation::Recommendation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

// ============ Crop Recommendation Models ============

/// Geographic point supplied by the caller.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct LocationRequest {
    pub lat: f64,
    pub lon: f64,
}

impl LocationRequest {
    /// Latitude must be within [-90, 90] and longitude within [-180, 180].
    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("Latitude {} must be between -90 and 90", self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(format!("Longitude {} must be between -180 and 180", self.lon));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SoilDetectionResponse {
    pub soil_type: String,
    /// Raw SoilGrids readings (g/kg for texture, pH x10).
    pub properties: Map<String, Value>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherResponse {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub weather_description: String,
    pub location: String,
}

/// Recommendation keyed by soil type; missing soil-test values fall back to
/// the soil defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecommendationRequest {
    pub soil_type: String,
    pub temperature: f64,
    pub rainfall: f64,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default, rename = "N")]
    pub n: Option<f64>,
    #[serde(default, rename = "P")]
    pub p: Option<f64>,
    #[serde(default, rename = "K")]
    pub k: Option<f64>,
    #[serde(default)]
    pub ph: Option<f64>,
}

/// Recommendation from explicit soil-test and weather values.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ManualRecommendationRequest {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl From<&ManualRecommendationRequest> for FeatureVector {
    fn from(req: &ManualRecommendationRequest) -> Self {
        FeatureVector {
            n: req.n,
            p: req.p,
            k: req.k,
            temperature: req.temperature,
            humidity: req.humidity,
            ph: req.ph,
            rainfall: req.rainfall,
        }
    }
}

/// Inputs actually fed to the classifier, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InputParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(flatten)]
    pub features: FeatureVector,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub input_parameters: InputParameters,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationInfo {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CombinedRecommendationResponse {
    pub location_info: LocationInfo,
    pub detected_soil: SoilDetectionResponse,
    pub current_weather: WeatherResponse,
    pub recommendations: Vec<Recommendation>,
    pub input_parameters: InputParameters,
}

// ============ Translation Models ============

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranslationRequest {
    pub text: String,
    pub target_language: String,
    #[serde(default = "auto_language")]
    pub source_language: String,
}

fn auto_language() -> String {
    "auto".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TranslationResponse {
    pub success: bool,
    pub translated_text: Option<String>,
    pub source_language: Option<String>,
    pub target_language: String,
    pub error: Option<String>,
}

// ============ Community Models ============

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackRequest {
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Deserialize, Serialize)]
pub struct Feedback {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub language: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
    pub feedback_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedbackStats {
    pub total_feedbacks: i64,
    pub pending_feedbacks: i64,
    pub reviewed_feedbacks: i64,
    pub total_posts: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommunityPostRequest {
    pub author: String,
    pub title: String,
    pub content: String,
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Deserialize, Serialize)]
pub struct CommunityPost {
    pub id: Uuid,
    pub author: String,
    pub title: String,
    pub content: String,
    pub language: String,
    pub likes: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommunityPostResponse {
    pub success: bool,
    pub message: String,
    pub post_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommunityPostsResponse {
    pub success: bool,
    pub count: usize,
    pub posts: Vec<CommunityPost>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentPostsQuery {
    pub limit: Option<usize>,
}

// ============ Profile Models ============

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileRequest {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub farm_size: String,
    #[serde(default)]
    pub farm_type: String,
    #[serde(default = "default_language")]
    pub preferred_language: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Deserialize, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub farm_size: String,
    pub farm_type: String,
    pub preferred_language: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub profile: Option<UserProfile>,
}
