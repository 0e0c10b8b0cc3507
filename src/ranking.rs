use crate::scoring::ScoredCandidate;

/// Number of recommendations returned when the caller does not ask otherwise.
pub const DEFAULT_TOP_N: usize = 5;

/// Minimum suitability score kept by [`RankingPolicy::Threshold`].
pub const DEFAULT_MIN_SCORE: f64 = 5.0;

/// How candidates are selected after ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RankingPolicy {
    /// Always the first N candidates, whatever their score.
    TopN,
    /// Candidates scoring strictly above `min_score`, falling back to
    /// [`RankingPolicy::TopN`] over everything when none qualify.
    Threshold { min_score: f64 },
}

impl RankingPolicy {
    pub fn threshold() -> Self {
        RankingPolicy::Threshold {
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// Result of ranking. `Empty` only when the classifier produced nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Ranking {
    Ranked(Vec<ScoredCandidate>),
    Empty,
}

impl Ranking {
    pub fn len(&self) -> usize {
        match self {
            Ranking::Ranked(c) => c.len(),
            Ranking::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Ranking::Empty)
    }

    pub fn candidates(&self) -> &[ScoredCandidate] {
        match self {
            Ranking::Ranked(c) => c,
            Ranking::Empty => &[],
        }
    }
}

/// Orders candidates by raw probability, highest first.
///
/// The sort is stable, so equal probabilities keep their input order.
/// NaN probabilities sort after every real value.
pub fn sort_by_probability(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| rank_key(b.probability).total_cmp(&rank_key(a.probability)));
}

fn rank_key(probability: f64) -> f64 {
    if probability.is_nan() {
        f64::NEG_INFINITY
    } else {
        probability
    }
}

/// Ranks scored candidates under `policy` and keeps at most `top_n` of them.
pub fn rank(mut candidates: Vec<ScoredCandidate>, policy: RankingPolicy, top_n: usize) -> Ranking {
    if candidates.is_empty() {
        tracing::warn!("Classifier produced no candidates to rank");
        return Ranking::Empty;
    }

    sort_by_probability(&mut candidates);

    let selected = match policy {
        RankingPolicy::TopN => take_top(candidates, top_n),
        RankingPolicy::Threshold { min_score } => {
            let passing = candidates
                .iter()
                .filter(|c| c.suitability_score > min_score)
                .count();

            if passing == 0 {
                tracing::info!(
                    "No candidate scored above {:.1}, falling back to unconditional top {}",
                    min_score,
                    top_n
                );
                take_top(candidates, top_n)
            } else {
                let filtered = candidates
                    .into_iter()
                    .filter(|c| c.suitability_score > min_score)
                    .collect();
                take_top(filtered, top_n)
            }
        }
    };

    Ranking::Ranked(selected)
}

fn take_top(mut candidates: Vec<ScoredCandidate>, top_n: usize) -> Vec<ScoredCandidate> {
    candidates.truncate(top_n);
    candidates
}
