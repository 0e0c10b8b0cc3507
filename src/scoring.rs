use serde::{Deserialize, Serialize};

/// Score forced onto a candidate when clamping still yields an invalid value.
pub const FALLBACK_SCORE: f64 = 50.0;

/// Confidence paired with [`FALLBACK_SCORE`].
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// One raw classifier output. The probability is untrusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCandidate {
    pub crop_name: String,
    pub probability: f64,
}

impl PredictionCandidate {
    pub fn new(crop_name: impl Into<String>, probability: f64) -> Self {
        Self {
            crop_name: crop_name.into(),
            probability,
        }
    }
}

/// Data-quality events detected while normalizing a probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreAnomaly {
    /// Raw value above 1.0, read as an already-scaled percentage.
    PercentageInput { raw: f64 },
    /// Scaled score fell outside [0, 100] and was clamped.
    Clamped { raw_score: f64, clamped: f64 },
    /// Score was NaN after clamping and got replaced by the fallback.
    Invalid,
}

/// A candidate whose score and confidence are guaranteed to be in range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub crop_name: String,
    pub probability: f64,
    /// Always within [0, 100], never NaN.
    pub suitability_score: f64,
    /// Always within [0, 1], never NaN.
    pub confidence: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<ScoreAnomaly>,
}

impl ScoredCandidate {
    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

/// Bounded values produced by [`normalize_probability`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedScore {
    pub suitability_score: f64,
    pub confidence: f64,
    pub anomalies: Vec<ScoreAnomaly>,
}

/// Converts a raw classifier probability into a bounded suitability score
/// and confidence.
///
/// The rules, in order:
///
/// 1. A raw value above 1.0 is read as a percentage; anything else is scaled by 100.
/// 2. The scaled value is clamped into [0, 100].
/// 3. If the result is still out of range or NaN it is forced to [`FALLBACK_SCORE`].
/// 4. Confidence is the raw value clamped into [0, 1], after dividing by 100
///    when the raw value is above 1.0.
///
/// Raw values above 1.0 are handled asymmetrically: `1.45` scores `1.45`
/// (already a percentage) while its confidence is `0.0145`.
pub fn normalize_probability(raw: f64) -> NormalizedScore {
    let mut anomalies = Vec::new();

    let raw_score = if raw > 1.0 {
        anomalies.push(ScoreAnomaly::PercentageInput { raw });
        raw
    } else {
        raw * 100.0
    };

    let mut score = raw_score.clamp(0.0, 100.0);
    if score != raw_score && !raw_score.is_nan() {
        anomalies.push(ScoreAnomaly::Clamped {
            raw_score,
            clamped: score,
        });
    }

    if score.is_nan() || !(0.0..=100.0).contains(&score) {
        anomalies.push(ScoreAnomaly::Invalid);
        score = FALLBACK_SCORE;
    }

    let confidence = if raw.is_nan() {
        FALLBACK_CONFIDENCE
    } else if raw > 1.0 {
        (raw / 100.0).clamp(0.0, 1.0)
    } else {
        raw.clamp(0.0, 1.0)
    };

    NormalizedScore {
        suitability_score: round_to(score, 2),
        confidence: round_to(confidence, 4),
        anomalies,
    }
}

/// Normalizes a single candidate and reports any anomaly through `tracing`.
pub fn score_candidate(candidate: PredictionCandidate) -> ScoredCandidate {
    let crop_name = candidate.crop_name.trim().to_string();
    let normalized = normalize_probability(candidate.probability);

    for anomaly in &normalized.anomalies {
        match anomaly {
            ScoreAnomaly::PercentageInput { raw } => {
                tracing::warn!("Probability > 1.0 detected for {}: {}", crop_name, raw);
            }
            ScoreAnomaly::Clamped { raw_score, clamped } => {
                tracing::warn!(
                    "Score clamped for {}: {:.2}% -> {:.2}%",
                    crop_name,
                    raw_score,
                    clamped
                );
            }
            ScoreAnomaly::Invalid => {
                tracing::error!(
                    "Invalid score for {} (raw probability {}), forcing to {}",
                    crop_name,
                    candidate.probability,
                    FALLBACK_SCORE
                );
            }
        }
    }

    ScoredCandidate {
        crop_name,
        probability: candidate.probability,
        suitability_score: normalized.suitability_score,
        confidence: normalized.confidence,
        anomalies: normalized.anomalies,
    }
}

/// Normalizes every candidate, preserving input order.
pub fn score_candidates(candidates: Vec<PredictionCandidate>) -> Vec<ScoredCandidate> {
    let scored: Vec<ScoredCandidate> = candidates.into_iter().map(score_candidate).collect();

    let anomalous = scored.iter().filter(|c| c.has_anomalies()).count();
    if anomalous > 0 {
        tracing::warn!(
            "{} of {} classifier outputs needed score correction",
            anomalous,
            scored.len()
        );
    }

    scored
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_probability_is_scaled() {
        let n = normalize_probability(0.8734);
        assert_eq!(n.suitability_score, 87.34);
        assert_eq!(n.confidence, 0.8734);
        assert!(n.anomalies.is_empty());
    }

    #[test]
    fn test_bounds_are_exact() {
        let one = normalize_probability(1.0);
        assert_eq!(one.suitability_score, 100.0);
        assert_eq!(one.confidence, 1.0);
        assert!(one.anomalies.is_empty());

        let zero = normalize_probability(0.0);
        assert_eq!(zero.suitability_score, 0.0);
        assert_eq!(zero.confidence, 0.0);
        assert!(zero.anomalies.is_empty());
    }

    #[test]
    fn test_percentage_input_keeps_scale() {
        // 1.45 is read as 1.45%, and confidence divides it by 100
        let n = normalize_probability(1.45);
        assert_eq!(n.suitability_score, 1.45);
        assert_eq!(n.confidence, 0.0145);
        assert_eq!(n.anomalies, vec![ScoreAnomaly::PercentageInput { raw: 1.45 }]);
    }

    #[test]
    fn test_large_percentage_is_clamped() {
        let n = normalize_probability(150.0);
        assert_eq!(n.suitability_score, 100.0);
        assert_eq!(n.confidence, 1.0);
        assert!(n.anomalies.contains(&ScoreAnomaly::Clamped {
            raw_score: 150.0,
            clamped: 100.0
        }));
    }

    #[test]
    fn test_negative_is_clamped_to_zero() {
        let n = normalize_probability(-5.0);
        assert_eq!(n.suitability_score, 0.0);
        assert_eq!(n.confidence, 0.0);
        assert_eq!(
            n.anomalies,
            vec![ScoreAnomaly::Clamped {
                raw_score: -500.0,
                clamped: 0.0
            }]
        );
    }

    #[test]
    fn test_nan_falls_back() {
        let n = normalize_probability(f64::NAN);
        assert_eq!(n.suitability_score, FALLBACK_SCORE);
        assert_eq!(n.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(n.anomalies, vec![ScoreAnomaly::Invalid]);
    }

    #[test]
    fn test_infinities_are_bounded() {
        let pos = normalize_probability(f64::INFINITY);
        assert_eq!(pos.suitability_score, 100.0);
        assert_eq!(pos.confidence, 1.0);

        let neg = normalize_probability(f64::NEG_INFINITY);
        assert_eq!(neg.suitability_score, 0.0);
        assert_eq!(neg.confidence, 0.0);
    }

    #[test]
    fn test_score_candidate_trims_name() {
        let scored = score_candidate(PredictionCandidate::new("  rice ", 0.5));
        assert_eq!(scored.crop_name, "rice");
        assert_eq!(scored.suitability_score, 50.0);
        assert!(!scored.has_anomalies());
    }
}
