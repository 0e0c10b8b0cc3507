//! Market price lookups against the data.gov.in commodity price resource.
//!
//! Prices are a best-effort enrichment: every failure (missing key, HTTP
//! error, 429, timeout, malformed body, open breaker) resolves to `None`
//! for that crop and never fails the batch.

use crate::circuit_breaker::{create_price_circuit_breaker, PriceCircuitBreaker};
use crate::config::Config;
use crate::recommendation::{display_crop_name, PriceTable};
use async_trait::async_trait;
use failsafe::futures::CircuitBreaker;
use futures::future::join_all;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// data.gov.in "Current daily price of various commodities" resource.
pub const PRICE_RESOURCE_ID: &str = "9ef84268-d588-465a-a308-a864a43d0070";

/// Record fields that may carry the modal price, in lookup order.
pub const PRICE_FIELDS: [&str; 4] = ["modal_price", "modal", "price", "modal_price_rs_quintal"];

const PRICE_CACHE_TTL: Duration = Duration::from_secs(3600);
const PRICE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves market prices for a batch of display crop names.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    /// Returns one entry per distinct input name.
    async fn resolve(&self, crop_names: &[String]) -> PriceTable;
}

/// Maps a model crop name to the commodity name used by the price API.
pub fn commodity_name(crop_name: &str) -> String {
    let normalized = crop_name.trim().to_lowercase();
    match normalized.as_str() {
        "chickpea" => "Gram".to_string(),
        "kidneybeans" => "Rajma".to_string(),
        "pigeonpeas" => "Arhar (Tur/Red Gram)".to_string(),
        "mothbeans" => "Moth".to_string(),
        "mungbean" => "Moong".to_string(),
        "blackgram" => "Urad".to_string(),
        "lentil" => "Masur".to_string(),
        _ => display_crop_name(crop_name),
    }
}

/// Reads the modal price of the first record. Numbers and numeric strings
/// are both accepted; the first parseable field in [`PRICE_FIELDS`] wins.
pub fn parse_modal_price(body: &Value) -> Option<f64> {
    let record = body.get("records")?.as_array()?.first()?;

    PRICE_FIELDS.iter().find_map(|field| match record.get(*field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Why a single lookup produced no price. Only transient failures count
/// against the circuit breaker.
#[derive(Debug)]
enum PriceFetchError {
    RateLimited,
    Http(StatusCode),
    Transport(String),
    Malformed(String),
}

impl std::fmt::Display for PriceFetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceFetchError::RateLimited => write!(f, "rate limit exceeded"),
            PriceFetchError::Http(status) => write!(f, "HTTP {}", status),
            PriceFetchError::Transport(e) => write!(f, "request failed: {}", e),
            PriceFetchError::Malformed(e) => write!(f, "malformed response: {}", e),
        }
    }
}

/// data.gov.in backed [`PriceLookup`] with a 1 hour cache and a circuit breaker.
pub struct MarketPriceService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    /// Commodity name -> price. Only definitive answers are cached.
    cache: Cache<String, Option<f64>>,
    breaker: PriceCircuitBreaker,
}

impl MarketPriceService {
    pub fn new(config: &Config) -> Self {
        Self::with_endpoint(config.data_gov_base_url.clone(), config.data_gov_api_key.clone())
    }

    pub fn with_endpoint(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(PRICE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            api_key,
            cache: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(PRICE_CACHE_TTL)
                .build(),
            breaker: create_price_circuit_breaker(),
        }
    }

    /// Price for one crop; `None` when unavailable for any reason.
    pub async fn price_for(&self, crop_name: &str) -> Option<f64> {
        let api_key = self.api_key.as_deref()?;
        let commodity = commodity_name(crop_name);

        if let Some(cached) = self.cache.get(&commodity).await {
            tracing::debug!("Cache hit for market price of {}", commodity);
            return cached;
        }

        match self.breaker.call(self.fetch(api_key, &commodity)).await {
            Ok(price) => {
                self.cache.insert(commodity, price).await;
                price
            }
            Err(failsafe::Error::Rejected) => {
                tracing::warn!(
                    "Price circuit breaker open, skipping lookup for {}",
                    commodity
                );
                None
            }
            Err(failsafe::Error::Inner(e)) => {
                tracing::error!("Error fetching market price for {}: {}", commodity, e);
                None
            }
        }
    }

    async fn fetch(&self, api_key: &str, commodity: &str) -> Result<Option<f64>, PriceFetchError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/resource/{}", self.base_url, PRICE_RESOURCE_ID),
            &[
                ("api-key", api_key),
                ("format", "json"),
                ("limit", "10"),
                ("filters[commodity]", commodity),
            ],
        )
        .map_err(|e| PriceFetchError::Transport(format!("Failed to build URL: {}", e)))?;

        tracing::debug!(
            "Price API URL: {}/resource/{}?api-key=[REDACTED]&filters[commodity]={}",
            self.base_url,
            PRICE_RESOURCE_ID,
            commodity
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PriceFetchError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceFetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(PriceFetchError::Http(status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| PriceFetchError::Malformed(e.without_url().to_string()))?;

        let price = parse_modal_price(&body);
        match price {
            Some(p) => tracing::info!("Found market price for {}: ₹{}/quintal", commodity, p),
            None => tracing::info!("No market price data found for {}", commodity),
        }
        Ok(price)
    }
}

#[async_trait]
impl PriceLookup for MarketPriceService {
    async fn resolve(&self, crop_names: &[String]) -> PriceTable {
        let mut unique: Vec<&String> = Vec::with_capacity(crop_names.len());
        for name in crop_names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }

        if self.api_key.is_none() {
            tracing::warn!("DATA_GOV_API_KEY not configured, market prices unavailable");
            return unique.into_iter().map(|name| (name.clone(), None)).collect();
        }

        let lookups = unique.iter().map(|name| async move {
            let price = self.price_for(name).await;
            ((*name).clone(), price)
        });

        let table: PriceTable = join_all(lookups).await.into_iter().collect();
        tracing::debug!(
            "Resolved {} market prices ({} found)",
            table.len(),
            table.values().filter(|p| p.is_some()).count()
        );
        table
    }
}
