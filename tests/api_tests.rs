/// HTTP-level tests driving the router with `tower::ServiceExt::oneshot`
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use crop_advisor_api::classifier::{
    Classifier, ClassifierError, FeatureVector, ModelInfo, ProfileClassifier,
};
use crop_advisor_api::config::Config;
use crop_advisor_api::db_storage::MemoryCommunityStore;
use crop_advisor_api::handlers::AppState;
use crop_advisor_api::market_price::PriceLookup;
use crop_advisor_api::recommendation::PriceTable;
use crop_advisor_api::routes::build_router;
use crop_advisor_api::scoring::PredictionCandidate;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // for oneshot
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Classifier returning a fixed distribution regardless of input.
struct StubClassifier(Vec<(&'static str, f64)>);

impl Classifier for StubClassifier {
    fn predict(&self, _: &FeatureVector) -> Result<Vec<PredictionCandidate>, ClassifierError> {
        Ok(self
            .0
            .iter()
            .map(|(name, p)| PredictionCandidate::new(*name, *p))
            .collect())
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            model_type: "Stub".into(),
            model_path: "memory".into(),
            feature_names: vec![],
            num_classes: self.0.len(),
            classes: self.0.iter().map(|(n, _)| n.to_string()).collect(),
        }
    }
}

struct StaticPrices;

#[async_trait]
impl PriceLookup for StaticPrices {
    async fn resolve(&self, crop_names: &[String]) -> PriceTable {
        crop_names
            .iter()
            .map(|name| {
                let price = match name.as_str() {
                    "Rice" => Some(2150.0),
                    "Cotton" => Some(6620.0),
                    _ => None,
                };
                (name.clone(), price)
            })
            .collect()
    }
}

fn test_config() -> Config {
    Config {
        // Unroutable endpoints: every external lookup falls back.
        openweather_base_url: "http://127.0.0.1:9".into(),
        soilgrids_base_url: "http://127.0.0.1:9".into(),
        data_gov_base_url: "http://127.0.0.1:9".into(),
        libretranslate_url: "http://127.0.0.1:9/translate".into(),
        ..Config::default()
    }
}

fn app_with(config: Config, classifier: Option<Arc<dyn Classifier>>) -> Router {
    let state = AppState::with_prices(
        config,
        classifier,
        Arc::new(StaticPrices),
        Arc::new(MemoryCommunityStore::new()),
    );
    build_router(Arc::new(state)).expect("router builds")
}

fn stub_app() -> Router {
    app_with(
        test_config(),
        Some(Arc::new(StubClassifier(vec![
            ("rice", 0.62),
            ("cotton", 0.21),
            ("maize", 0.09),
            ("jute", 0.04),
            ("coffee", 0.02),
            ("apple", 0.01),
            ("banana", 0.01),
        ]))),
    )
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    for uri in ["/", "/health"] {
        let (status, body) = send(stub_app(), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}

#[tokio::test]
async fn test_recommend_returns_top_five_with_prices() {
    let (status, body) = send(
        stub_app(),
        post_json(
            "/api/recommend",
            json!({"soil_type": "Clay", "temperature": 28.0, "rainfall": 150.0}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 5);

    assert_eq!(recommendations[0]["crop_name"], "Rice");
    assert_eq!(recommendations[0]["suitability_score"], 62.0);
    assert_eq!(recommendations[0]["market_price"], 2150.0);
    assert_eq!(recommendations[1]["crop_name"], "Cotton");
    assert_eq!(recommendations[2]["market_price"], Value::Null);
    // Top-N keeps low scorers on the soil path.
    assert_eq!(recommendations[4]["crop_name"], "Coffee");

    assert_eq!(
        recommendations[0]["reason"],
        "Suitable based on ML model prediction (confidence: 62.00%). \
         Soil: Clay, Temp: 28.0°C, Rainfall: 150.0mm, Humidity: 70.0%"
    );

    let params = &body["input_parameters"];
    assert_eq!(params["soil_type"], "Clay");
    assert_eq!(params["N"], 70.0);
    assert_eq!(params["P"], 45.0);
    assert_eq!(params["K"], 40.0);
    assert_eq!(params["ph"], 6.5);
    assert_eq!(params["humidity"], 70.0);
}

#[tokio::test]
async fn test_recommend_manual_applies_threshold() {
    let (status, body) = send(
        stub_app(),
        post_json(
            "/api/recommend-manual",
            json!({"N": 90, "P": 42, "K": 43, "temperature": 20.8,
                   "humidity": 82.0, "ph": 6.5, "rainfall": 202.9}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["crop_name"].as_str().unwrap().to_string())
        .collect();
    // jute scores 4.0 and drops out, as does everything below it.
    assert_eq!(names, vec!["Rice", "Cotton", "Maize"]);
    assert!(body["input_parameters"].get("soil_type").is_none());
    assert!(body["recommendations"][0]["reason"]
        .as_str()
        .unwrap()
        .ends_with("N: 90.0, P: 42.0, K: 43.0, Temp: 20.8°C, Humidity: 82.0%, pH: 6.5, Rainfall: 202.9mm"));
}

#[tokio::test]
async fn test_recommend_without_model_is_unavailable() {
    let app = app_with(test_config(), None);
    let (status, body) = send(
        app,
        post_json(
            "/api/recommend",
            json!({"soil_type": "Loam", "temperature": 25.0, "rainfall": 100.0}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("ML model not available"));

    let (_, info) = send(app_with(test_config(), None), get("/api/model-info")).await;
    assert_eq!(info["status"], "Model not loaded");
}

#[tokio::test]
async fn test_empty_classifier_output_yields_sentinel() {
    let app = app_with(test_config(), Some(Arc::new(StubClassifier(vec![]))));
    let (status, body) = send(
        app,
        post_json(
            "/api/recommend",
            json!({"soil_type": "Sandy", "temperature": 30.0, "rainfall": 40.0}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0]["crop_name"], "No suitable crops found");
    assert_eq!(recommendations[0]["suitability_score"], 0.0);
    assert_eq!(recommendations[0]["market_price"], Value::Null);
}

#[tokio::test]
async fn test_profile_classifier_artifact_recommends_rice() {
    let classifier = ProfileClassifier::load("models/crop_profiles.json").unwrap();
    let app = app_with(test_config(), Some(Arc::new(classifier)));

    let (status, body) = send(
        app,
        post_json(
            "/api/recommend-manual",
            json!({"N": 80, "P": 48, "K": 40, "temperature": 23.7,
                   "humidity": 82.3, "ph": 6.4, "rainfall": 236.0}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendations"][0]["crop_name"], "Rice");
    assert_eq!(body["recommendations"][0]["market_price"], 2150.0);
}

#[tokio::test]
async fn test_location_endpoints_validate_coordinates() {
    for uri in ["/api/detect-soil", "/api/weather", "/api/recommend-from-location"] {
        let (status, _) = send(stub_app(), post_json(uri, json!({"lat": 95.0, "lon": 10.0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn test_recommend_from_location_combines_soil_and_weather() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/soilgrids/v2.0/properties/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {"layers": [
                {"name": "clay", "depths": [{"values": {"mean": 120}}]},
                {"name": "sand", "depths": [{"values": {"mean": 640}}]},
                {"name": "silt", "depths": [{"values": {"mean": 240}}]}
            ]}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "main": {"temp": 33.0, "humidity": 40},
            "weather": [{"description": "haze"}],
            "name": "Jodhpur"
        })))
        .mount(&mock_server)
        .await;

    let config = Config {
        soilgrids_base_url: mock_server.uri(),
        openweather_base_url: mock_server.uri(),
        openweather_api_key: Some("weather_key".into()),
        ..test_config()
    };
    let app = app_with(config, Some(Arc::new(StubClassifier(vec![("mothbeans", 0.7)]))));

    let (status, body) = send(
        app,
        post_json("/api/recommend-from-location", json!({"lat": 26.24, "lon": 73.02})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["location_info"]["name"], "Jodhpur");
    assert_eq!(body["detected_soil"]["soil_type"], "Sandy");
    assert_eq!(body["current_weather"]["rainfall"], 100.0);
    assert_eq!(body["input_parameters"]["soil_type"], "Sandy");
    assert_eq!(body["input_parameters"]["N"], 50.0);
    assert_eq!(body["input_parameters"]["humidity"], 40.0);
    assert_eq!(body["recommendations"][0]["crop_name"], "Mothbeans");
}

#[tokio::test]
async fn test_feedback_and_stats() {
    let app = stub_app();

    let (status, body) = send(
        app.clone(),
        post_json(
            "/api/feedback",
            json!({"name": " Lakshmi ", "email": "lakshmi@example.com",
                   "message": "The cotton price looked right for Guntur."}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["feedback_id"].is_string());

    let (status, _) = send(
        app.clone(),
        post_json(
            "/api/feedback",
            json!({"name": "X", "email": "not-an-email", "message": "Too short"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stats) = send(app, get("/api/feedback/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_feedbacks"], 1);
    assert_eq!(stats["pending_feedbacks"], 1);
    assert_eq!(stats["reviewed_feedbacks"], 0);
    assert_eq!(stats["total_posts"], 0);
}

#[tokio::test]
async fn test_community_posts() {
    let app = stub_app();

    for title in ["Drip irrigation tips", "Pest alert for cotton"] {
        let (status, _) = send(
            app.clone(),
            post_json(
                "/api/community-post",
                json!({"author": "Ravi", "title": title,
                       "content": "Sharing what worked on our farm this season."}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = send(
        app.clone(),
        post_json(
            "/api/community-post",
            json!({"author": "Ravi", "title": "Hey", "content": "short"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, all) = send(app.clone(), get("/api/community-posts")).await;
    assert_eq!(all["count"], 2);
    assert_eq!(all["posts"][0]["title"], "Pest alert for cotton");

    let (_, recent) = send(app.clone(), get("/api/community-posts/recent?limit=1")).await;
    assert_eq!(recent["count"], 1);

    let (status, _) = send(app, get("/api/community-posts/recent?limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profiles() {
    let app = stub_app();

    let (status, saved) = send(
        app.clone(),
        post_json(
            "/api/profile/save",
            json!({"user_id": "farmer-7", "name": "Anita", "email": "anita@example.com",
                   "phone": "98765 43210", "location": "Nashik", "preferred_language": "MR"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["profile"]["phone"], "+919876543210");
    assert_eq!(saved["profile"]["preferred_language"], "mr");

    let (_, found) = send(app.clone(), get("/api/profile/farmer-7")).await;
    assert_eq!(found["success"], true);
    assert_eq!(found["profile"]["location"], "Nashik");

    let (status, missing) = send(app, get("/api/profile/nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missing["success"], false);
    assert_eq!(missing["message"], "Profile not found");
    assert_eq!(missing["profile"], Value::Null);
}

#[tokio::test]
async fn test_translation_endpoints() {
    let (status, body) = send(stub_app(), get("/api/translate/languages")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["languages"]
        .as_array()
        .unwrap()
        .contains(&json!("te")));

    // Unreachable translator: still 200, failure reported in the body.
    let (status, body) = send(
        stub_app(),
        post_json("/api/translate", json!({"text": "Water the seedlings", "target_language": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["target_language"], "hi");

    let (status, _) = send(
        stub_app(),
        post_json("/api/translate", json!({"text": "   ", "target_language": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
