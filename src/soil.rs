use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse soil classes the service knows reference values for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Clay,
    Sandy,
    Silty,
    Loam,
    Loamy,
    Unknown,
}

impl SoilType {
    pub const RECOGNIZED: [SoilType; 5] = [
        SoilType::Clay,
        SoilType::Sandy,
        SoilType::Silty,
        SoilType::Loam,
        SoilType::Loamy,
    ];

    /// Parses a label exactly as the soil detector emits it. Anything else is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Clay" => SoilType::Clay,
            "Sandy" => SoilType::Sandy,
            "Silty" => SoilType::Silty,
            "Loam" => SoilType::Loam,
            "Loamy" => SoilType::Loamy,
            _ => SoilType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Clay => "Clay",
            SoilType::Sandy => "Sandy",
            SoilType::Silty => "Silty",
            SoilType::Loam => "Loam",
            SoilType::Loamy => "Loamy",
            SoilType::Unknown => "Unknown",
        }
    }

    pub fn defaults(&self) -> SoilDefaults {
        match self {
            SoilType::Clay => SoilDefaults::new(70.0, 45.0, 40.0, 6.5),
            SoilType::Sandy => SoilDefaults::new(50.0, 30.0, 35.0, 6.0),
            SoilType::Silty => SoilDefaults::new(65.0, 40.0, 38.0, 6.8),
            SoilType::Loam | SoilType::Loamy => SoilDefaults::new(75.0, 50.0, 45.0, 7.0),
            SoilType::Unknown => SoilDefaults::new(65.0, 40.0, 40.0, 6.5),
        }
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference nutrient and pH values used when no soil test is available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilDefaults {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
    pub ph: f64,
}

impl SoilDefaults {
    const fn new(n: f64, p: f64, k: f64, ph: f64) -> Self {
        Self { n, p, k, ph }
    }
}

/// Returns the reference values for a soil label. Never fails.
pub fn soil_defaults(label: &str) -> SoilDefaults {
    SoilType::from_label(label).defaults()
}

/// Soil texture readings in g/kg, as reported by SoilGrids.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoilTexture {
    pub clay: Option<f64>,
    pub sand: Option<f64>,
    pub silt: Option<f64>,
}

/// Classifies a soil from its texture. Missing readings count as zero.
pub fn classify_texture(texture: &SoilTexture) -> SoilType {
    // g/kg -> percent
    let clay = texture.clay.unwrap_or(0.0) / 10.0;
    let sand = texture.sand.unwrap_or(0.0) / 10.0;
    let silt = texture.silt.unwrap_or(0.0) / 10.0;

    tracing::debug!(
        "Soil texture - Clay: {}%, Sand: {}%, Silt: {}%",
        clay,
        sand,
        silt
    );

    if clay > 40.0 {
        SoilType::Clay
    } else if sand > 50.0 {
        SoilType::Sandy
    } else if silt > 40.0 {
        SoilType::Silty
    } else if clay > 25.0 && sand > 25.0 {
        SoilType::Loam
    } else {
        SoilType::Loamy
    }
}
