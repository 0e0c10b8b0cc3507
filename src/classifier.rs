use crate::scoring::PredictionCandidate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Feature order expected by every classifier.
pub const FEATURE_NAMES: [&str; 7] = ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// Typical agronomic ranges; values outside are predicted but logged.
static TYPICAL_RANGES: [(&str, f64, f64); 7] = [
    ("Nitrogen (N)", 0.0, 200.0),
    ("Phosphorus (P)", 0.0, 200.0),
    ("Potassium (K)", 0.0, 300.0),
    ("Temperature", -10.0, 60.0),
    ("Humidity", 0.0, 100.0),
    ("pH", 0.0, 14.0),
    ("Rainfall", 0.0, 500.0),
];

/// Agronomic and environmental inputs for one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
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

impl FeatureVector {
    pub fn as_array(&self) -> [f64; 7] {
        [
            self.n,
            self.p,
            self.k,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }

    /// Names of the features that fall outside their typical range.
    pub fn out_of_range(&self) -> Vec<&'static str> {
        self.as_array()
            .iter()
            .zip(TYPICAL_RANGES.iter())
            .filter(|(value, (_, min, max))| !(*min..=*max).contains(*value))
            .map(|(_, (name, _, _))| *name)
            .collect()
    }
}

/// Metadata about a loaded classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub model_path: String,
    pub feature_names: Vec<String>,
    pub num_classes: usize,
    pub classes: Vec<String>,
}

#[derive(Debug)]
pub enum ClassifierError {
    /// Model artifact could not be read.
    Io { path: PathBuf, message: String },
    /// Model artifact is not valid JSON for this format.
    Parse(String),
    /// Model artifact parsed but is unusable.
    InvalidModel(String),
    /// Inputs produced no finite likelihood for any class.
    Prediction(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierError::Io { path, message } => {
                write!(f, "Model file not readable at {}: {}", path.display(), message)
            }
            ClassifierError::Parse(msg) => write!(f, "Model file could not be parsed: {}", msg),
            ClassifierError::InvalidModel(msg) => write!(f, "Invalid model: {}", msg),
            ClassifierError::Prediction(msg) => write!(f, "Prediction failed: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

/// A pre-trained crop classifier.
///
/// Implementations return one candidate per known crop class. Probabilities
/// are not trusted downstream and go through the score normalizer.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Vec<PredictionCandidate>, ClassifierError>;

    fn info(&self) -> ModelInfo;
}

#[derive(Debug, Clone, Deserialize)]
struct ModelArtifact {
    #[serde(default = "default_model_type")]
    model_type: String,
    feature_names: Vec<String>,
    #[serde(default)]
    class_mapping: HashMap<String, String>,
    classes: Vec<ClassProfile>,
}

fn default_model_type() -> String {
    "GaussianProfileClassifier".to_string()
}

#[derive(Debug, Clone, Deserialize)]
struct ClassProfile {
    label: String,
    mean: Vec<f64>,
    std: Vec<f64>,
}

/// Classifier scoring each crop with a diagonal Gaussian over the seven
/// features, normalized across crops with a softmax.
#[derive(Debug, Clone)]
pub struct ProfileClassifier {
    model_type: String,
    model_path: String,
    names: Vec<String>,
    means: Vec<[f64; 7]>,
    stds: Vec<[f64; 7]>,
}

impl ProfileClassifier {
    /// Loads the model artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ClassifierError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let classifier = Self::from_json(&contents, &path.display().to_string())?;
        tracing::info!(
            "✓ Model loaded from {} ({} classes)",
            path.display(),
            classifier.names.len()
        );
        Ok(classifier)
    }

    /// Builds a classifier from the JSON artifact contents.
    pub fn from_json(json: &str, model_path: &str) -> Result<Self, ClassifierError> {
        let artifact: ModelArtifact =
            serde_json::from_str(json).map_err(|e| ClassifierError::Parse(e.to_string()))?;

        if artifact.feature_names != FEATURE_NAMES {
            return Err(ClassifierError::InvalidModel(format!(
                "expected features {:?}, found {:?}",
                FEATURE_NAMES, artifact.feature_names
            )));
        }
        if artifact.classes.is_empty() {
            return Err(ClassifierError::InvalidModel(
                "model defines no classes".to_string(),
            ));
        }

        let mut names = Vec::with_capacity(artifact.classes.len());
        let mut means = Vec::with_capacity(artifact.classes.len());
        let mut stds = Vec::with_capacity(artifact.classes.len());

        for class in &artifact.classes {
            let mean = to_features(&class.mean).ok_or_else(|| {
                ClassifierError::InvalidModel(format!("class '{}' mean must have 7 values", class.label))
            })?;
            let std = to_features(&class.std).ok_or_else(|| {
                ClassifierError::InvalidModel(format!("class '{}' std must have 7 values", class.label))
            })?;
            if std.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
                return Err(ClassifierError::InvalidModel(format!(
                    "class '{}' has a non-positive standard deviation",
                    class.label
                )));
            }

            let name = artifact
                .class_mapping
                .get(&class.label)
                .cloned()
                .unwrap_or_else(|| class.label.clone());

            names.push(name);
            means.push(mean);
            stds.push(std);
        }

        Ok(Self {
            model_type: artifact.model_type,
            model_path: model_path.to_string(),
            names,
            means,
            stds,
        })
    }

    fn log_likelihood(&self, class: usize, x: &[f64; 7]) -> f64 {
        x.iter()
            .zip(self.means[class].iter())
            .zip(self.stds[class].iter())
            .map(|((value, mean), std)| {
                let z = (value - mean) / std;
                -0.5 * z * z - std.ln()
            })
            .sum()
    }
}

fn to_features(values: &[f64]) -> Option<[f64; 7]> {
    values.try_into().ok()
}

impl Classifier for ProfileClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<Vec<PredictionCandidate>, ClassifierError> {
        tracing::info!(
            "Prediction request: N={}, P={}, K={}, Temperature={}°C, Humidity={}%, pH={}, Rainfall={}mm",
            features.n,
            features.p,
            features.k,
            features.temperature,
            features.humidity,
            features.ph,
            features.rainfall
        );

        for name in features.out_of_range() {
            tracing::warn!(
                "{} is outside its typical range. Predictions may be less accurate.",
                name
            );
        }

        let x = features.as_array();
        let scores: Vec<f64> = (0..self.names.len())
            .map(|class| self.log_likelihood(class, &x))
            .collect();

        // softmax, shifted by the max for stability
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(ClassifierError::Prediction(
                "input values are too extreme to score".to_string(),
            ));
        }
        let weights: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = weights.iter().sum();

        let candidates: Vec<PredictionCandidate> = self
            .names
            .iter()
            .zip(weights.iter())
            .map(|(name, w)| PredictionCandidate::new(name.clone(), w / total))
            .collect();

        tracing::debug!(
            "Raw probabilities - min: {:.6}, max: {:.6}, classes: {}",
            candidates
                .iter()
                .map(|c| c.probability)
                .fold(f64::INFINITY, f64::min),
            candidates
                .iter()
                .map(|c| c.probability)
                .fold(f64::NEG_INFINITY, f64::max),
            candidates.len()
        );

        Ok(candidates)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            model_type: self.model_type.clone(),
            model_path: self.model_path.clone(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            num_classes: self.names.len(),
            classes: self.names.clone(),
        }
    }
}
