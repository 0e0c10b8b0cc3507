//! Turns ranked candidates into the recommendations returned to callers.
//!
//! Assembly is pure: market prices are resolved by the caller beforehand
//! (once for the whole ranking, see [`display_names`]) and passed in as a
//! [`PriceTable`]. The same ranking and price table always assemble to the
//! same output.

use crate::ranking::Ranking;
use crate::scoring::ScoredCandidate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Crop name used for the single sentinel recommendation.
pub const NO_CROPS_FOUND: &str = "No suitable crops found";

const NO_CROPS_REASON: &str =
    "The ML model could not generate recommendations. Please check input parameters.";

/// Display crop name -> modal price (INR per quintal), if one was found.
pub type PriceTable = HashMap<String, Option<f64>>;

/// Final output unit of the recommendation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub crop_name: String,
    pub suitability_score: f64,
    pub reason: String,
    /// Market price in INR per quintal.
    pub market_price: Option<f64>,
}

impl Recommendation {
    pub fn no_suitable_crops() -> Self {
        Self {
            crop_name: NO_CROPS_FOUND.to_string(),
            suitability_score: 0.0,
            reason: NO_CROPS_REASON.to_string(),
            market_price: None,
        }
    }
}

/// Descriptive tier derived from a suitability score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    HighlySuitable,
    Suitable,
    ModeratelySuitable,
    LessSuitable,
}

impl ConfidenceTier {
    /// Lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            ConfidenceTier::HighlySuitable
        } else if score >= 60.0 {
            ConfidenceTier::Suitable
        } else if score >= 40.0 {
            ConfidenceTier::ModeratelySuitable
        } else {
            ConfidenceTier::LessSuitable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceTier::HighlySuitable => "Highly suitable",
            ConfidenceTier::Suitable => "Suitable",
            ConfidenceTier::ModeratelySuitable => "Moderately suitable",
            ConfidenceTier::LessSuitable => "Less suitable",
        }
    }
}

/// Input parameters echoed back in every reason string.
#[derive(Debug, Clone, PartialEq)]
pub enum ReasonContext {
    /// Request keyed by soil type (direct or detected from a location).
    Soil {
        soil_type: String,
        temperature: f64,
        rainfall: f64,
        humidity: f64,
    },
    /// Request with explicit soil-test values.
    Manual {
        n: f64,
        p: f64,
        k: f64,
        temperature: f64,
        humidity: f64,
        ph: f64,
        rainfall: f64,
    },
}

impl ReasonContext {
    fn describe(&self) -> String {
        match self {
            ReasonContext::Soil {
                soil_type,
                temperature,
                rainfall,
                humidity,
            } => format!(
                "Soil: {}, Temp: {:?}°C, Rainfall: {:?}mm, Humidity: {:?}%",
                soil_type, temperature, rainfall, humidity
            ),
            ReasonContext::Manual {
                n,
                p,
                k,
                temperature,
                humidity,
                ph,
                rainfall,
            } => format!(
                "N: {:?}, P: {:?}, K: {:?}, Temp: {:?}°C, Humidity: {:?}%, pH: {:?}, Rainfall: {:?}mm",
                n, p, k, temperature, humidity, ph, rainfall
            ),
        }
    }
}

/// Trims and title-cases a crop name: the first letter of every alphabetic
/// run is upper-cased, the rest lower-cased.
pub fn display_crop_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_is_letter = false;

    for ch in raw.trim().chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }

    out
}

/// Display names of every ranked candidate, in ranking order, without duplicates.
pub fn display_names(ranking: &Ranking) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(ranking.len());
    for candidate in ranking.candidates() {
        let name = display_crop_name(&candidate.crop_name);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn compose_reason(candidate: &ScoredCandidate, context: &ReasonContext) -> String {
    let tier = ConfidenceTier::from_score(candidate.suitability_score);
    format!(
        "{} based on ML model prediction (confidence: {:.2}%). {}",
        tier.label(),
        candidate.confidence * 100.0,
        context.describe()
    )
}

/// Builds the final recommendation list.
///
/// The output has one entry per ranked candidate, or exactly the sentinel
/// from [`Recommendation::no_suitable_crops`] when the ranking is empty.
pub fn assemble(
    ranking: &Ranking,
    context: &ReasonContext,
    prices: &PriceTable,
) -> Vec<Recommendation> {
    let candidates = match ranking {
        Ranking::Empty => return vec![Recommendation::no_suitable_crops()],
        Ranking::Ranked(candidates) if candidates.is_empty() => {
            return vec![Recommendation::no_suitable_crops()]
        }
        Ranking::Ranked(candidates) => candidates,
    };

    candidates
        .iter()
        .map(|candidate| {
            let crop_name = display_crop_name(&candidate.crop_name);
            let market_price = prices.get(&crop_name).copied().flatten();

            Recommendation {
                reason: compose_reason(candidate, context),
                suitability_score: candidate.suitability_score,
                market_price,
                crop_name,
            }
        })
        .collect()
}
