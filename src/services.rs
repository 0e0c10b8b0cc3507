use crate::classifier::{Classifier, FeatureVector};
use crate::errors::AppError;
use crate::market_price::PriceLookup;
use crate::models::{
    InputParameters, ManualRecommendationRequest, RecommendationRequest, RecommendationResponse,
};
use crate::ranking::{rank, RankingPolicy};
use crate::recommendation::{assemble, display_names, ReasonContext, Recommendation};
use crate::scoring::score_candidates;
use crate::soil::soil_defaults;
use std::sync::Arc;

/// Humidity assumed when a soil-keyed request omits it.
pub const DEFAULT_REQUEST_HUMIDITY: f64 = 70.0;

pub const MODEL_UNAVAILABLE: &str =
    "ML model not available. Please provide a valid model artifact (MODEL_PATH) and restart the service";

/// Runs the recommendation pipeline:
/// classify -> normalize -> rank -> resolve prices -> assemble.
#[derive(Clone)]
pub struct RecommendationService {
    classifier: Option<Arc<dyn Classifier>>,
    prices: Arc<dyn PriceLookup>,
    top_n: usize,
}

impl RecommendationService {
    pub fn new(
        classifier: Option<Arc<dyn Classifier>>,
        prices: Arc<dyn PriceLookup>,
        top_n: usize,
    ) -> Self {
        Self {
            classifier,
            prices,
            top_n,
        }
    }

    pub fn classifier(&self) -> Option<&Arc<dyn Classifier>> {
        self.classifier.as_ref()
    }

    /// Recommendation keyed by soil type. Missing N/P/K/ph come from the
    /// soil defaults and the top candidates are returned unconditionally.
    pub async fn recommend_for_soil(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse, AppError> {
        let soil_type = request.soil_type.trim().to_string();
        let defaults = soil_defaults(&soil_type);
        let humidity = request.humidity.unwrap_or(DEFAULT_REQUEST_HUMIDITY);

        let features = FeatureVector {
            n: request.n.unwrap_or(defaults.n),
            p: request.p.unwrap_or(defaults.p),
            k: request.k.unwrap_or(defaults.k),
            temperature: request.temperature,
            humidity,
            ph: request.ph.unwrap_or(defaults.ph),
            rainfall: request.rainfall,
        };

        tracing::info!(
            "Recommending crops for soil {} (temp {}°C, rainfall {}mm, humidity {}%)",
            soil_type,
            request.temperature,
            request.rainfall,
            humidity
        );

        let context = ReasonContext::Soil {
            soil_type: soil_type.clone(),
            temperature: request.temperature,
            rainfall: request.rainfall,
            humidity,
        };

        let recommendations = self
            .run(&features, RankingPolicy::TopN, &context)
            .await?;

        Ok(RecommendationResponse {
            recommendations,
            input_parameters: InputParameters {
                soil_type: Some(soil_type),
                features,
            },
        })
    }

    /// Recommendation from explicit soil-test values. Candidates at or below
    /// the minimum score are dropped unless nothing would remain.
    pub async fn recommend_manual(
        &self,
        request: &ManualRecommendationRequest,
    ) -> Result<RecommendationResponse, AppError> {
        let features = FeatureVector::from(request);
        tracing::info!("Recommending crops for manual input: {:?}", features);

        let context = ReasonContext::Manual {
            n: request.n,
            p: request.p,
            k: request.k,
            temperature: request.temperature,
            humidity: request.humidity,
            ph: request.ph,
            rainfall: request.rainfall,
        };

        let recommendations = self
            .run(&features, RankingPolicy::threshold(), &context)
            .await?;

        Ok(RecommendationResponse {
            recommendations,
            input_parameters: InputParameters {
                soil_type: None,
                features,
            },
        })
    }

    async fn run(
        &self,
        features: &FeatureVector,
        policy: RankingPolicy,
        context: &ReasonContext,
    ) -> Result<Vec<Recommendation>, AppError> {
        let classifier = self.classifier.as_ref().ok_or_else(|| {
            tracing::error!("Recommendation requested but no classifier is loaded");
            AppError::ServiceUnavailable(MODEL_UNAVAILABLE.to_string())
        })?;

        let predictions = classifier.predict(features)?;
        let scored = score_candidates(predictions);
        let ranking = rank(scored, policy, self.top_n);

        // One batch lookup per ranking.
        let names = display_names(&ranking);
        let prices = if names.is_empty() {
            Default::default()
        } else {
            self.prices.resolve(&names).await
        };

        let recommendations = assemble(&ranking, context, &prices);
        tracing::info!("Generated {} recommendations", recommendations.len());
        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, ModelInfo};
    use crate::recommendation::{PriceTable, NO_CROPS_FOUND};
    use crate::scoring::PredictionCandidate;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedClassifier {
        output: Vec<(&'static str, f64)>,
        seen: Mutex<Vec<FeatureVector>>,
    }

    impl FixedClassifier {
        fn new(output: Vec<(&'static str, f64)>) -> Self {
            Self {
                output,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn predict(
            &self,
            features: &FeatureVector,
        ) -> Result<Vec<PredictionCandidate>, ClassifierError> {
            self.seen.lock().unwrap().push(*features);
            Ok(self
                .output
                .iter()
                .map(|(name, p)| PredictionCandidate::new(*name, *p))
                .collect())
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                model_type: "Fixed".into(),
                model_path: "memory".into(),
                feature_names: vec![],
                num_classes: self.output.len(),
                classes: self.output.iter().map(|(n, _)| n.to_string()).collect(),
            }
        }
    }

    struct FixedPrices;

    #[async_trait]
    impl PriceLookup for FixedPrices {
        async fn resolve(&self, crop_names: &[String]) -> PriceTable {
            crop_names
                .iter()
                .map(|name| {
                    let price = (name == "Rice").then_some(2150.0);
                    (name.clone(), price)
                })
                .collect()
        }
    }

    fn service(classifier: Option<Arc<dyn Classifier>>) -> RecommendationService {
        RecommendationService::new(classifier, Arc::new(FixedPrices), 5)
    }

    fn soil_request(soil_type: &str) -> RecommendationRequest {
        RecommendationRequest {
            soil_type: soil_type.into(),
            temperature: 25.5,
            rainfall: 120.0,
            humidity: None,
            n: None,
            p: None,
            k: None,
            ph: None,
        }
    }

    #[tokio::test]
    async fn test_soil_request_uses_defaults() {
        let classifier = Arc::new(FixedClassifier::new(vec![("rice", 0.8734), ("maize", 0.1)]));
        let svc = service(Some(classifier.clone()));

        let response = svc.recommend_for_soil(&soil_request("Loam")).await.unwrap();

        let seen = classifier.seen.lock().unwrap()[0];
        assert_eq!((seen.n, seen.p, seen.k, seen.ph), (75.0, 50.0, 45.0, 7.0));
        assert_eq!(seen.humidity, 70.0);

        assert_eq!(response.recommendations[0].crop_name, "Rice");
        assert_eq!(response.recommendations[0].suitability_score, 87.34);
        assert_eq!(response.recommendations[0].market_price, Some(2150.0));
        assert_eq!(response.recommendations[1].market_price, None);
        assert_eq!(
            response.recommendations[0].reason,
            "Highly suitable based on ML model prediction (confidence: 87.34%). \
             Soil: Loam, Temp: 25.5°C, Rainfall: 120.0mm, Humidity: 70.0%"
        );
        assert_eq!(response.input_parameters.soil_type.as_deref(), Some("Loam"));
    }

    #[tokio::test]
    async fn test_unknown_soil_gets_generic_defaults() {
        let classifier = Arc::new(FixedClassifier::new(vec![("rice", 0.5)]));
        let svc = service(Some(classifier.clone()));

        svc.recommend_for_soil(&soil_request("Swamp")).await.unwrap();

        let seen = classifier.seen.lock().unwrap()[0];
        assert_eq!((seen.n, seen.p, seen.k, seen.ph), (65.0, 40.0, 40.0, 6.5));
    }

    #[tokio::test]
    async fn test_manual_threshold_falls_back_to_top_candidates() {
        let classifier = Arc::new(FixedClassifier::new(vec![("rice", 0.03), ("wheat", 0.02)]));
        let svc = service(Some(classifier));
        let request = ManualRecommendationRequest {
            n: 90.0,
            p: 42.0,
            k: 43.0,
            temperature: 20.8,
            humidity: 82.0,
            ph: 6.5,
            rainfall: 202.9,
        };

        let response = svc.recommend_manual(&request).await.unwrap();

        let names: Vec<_> = response
            .recommendations
            .iter()
            .map(|r| r.crop_name.as_str())
            .collect();
        assert_eq!(names, vec!["Rice", "Wheat"]);
        assert!(response.input_parameters.soil_type.is_none());
    }

    #[tokio::test]
    async fn test_empty_prediction_yields_sentinel() {
        let svc = service(Some(Arc::new(FixedClassifier::new(vec![]))));

        let response = svc.recommend_for_soil(&soil_request("Clay")).await.unwrap();

        assert_eq!(response.recommendations.len(), 1);
        assert_eq!(response.recommendations[0].crop_name, NO_CROPS_FOUND);
        assert_eq!(response.recommendations[0].suitability_score, 0.0);
        assert_eq!(response.recommendations[0].market_price, None);
    }

    #[tokio::test]
    async fn test_missing_classifier_is_service_unavailable() {
        let err = service(None)
            .recommend_for_soil(&soil_request("Clay"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }
}
