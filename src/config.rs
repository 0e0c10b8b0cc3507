use serde::Deserialize;

pub const DEFAULT_SOILGRIDS_BASE_URL: &str = "https://rest.isric.org";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_DATA_GOV_BASE_URL: &str = "https://api.data.gov.in";
pub const DEFAULT_LIBRETRANSLATE_URL: &str = "https://libretranslate.com/translate";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Community store database; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub model_path: String,
    pub recommendation_top_n: usize,
    pub openweather_api_key: Option<String>,
    pub openweather_base_url: String,
    pub soilgrids_base_url: String,
    pub data_gov_api_key: Option<String>,
    pub data_gov_base_url: String,
    pub libretranslate_url: String,
    pub libretranslate_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            database_url: optional_var("DATABASE_URL")
                .or_else(|| optional_var("DB_URL"))
                .map(|url| {
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })
                .transpose()?,
            model_path: optional_var("MODEL_PATH")
                .unwrap_or_else(|| "models/crop_profiles.json".to_string()),
            recommendation_top_n: std::env::var("RECOMMENDATION_TOP_N")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RECOMMENDATION_TOP_N must be a positive number"))
                .and_then(|n: usize| {
                    if n == 0 {
                        anyhow::bail!("RECOMMENDATION_TOP_N must be at least 1");
                    }
                    Ok(n)
                })?,
            openweather_api_key: optional_var("OPENWEATHER_API_KEY"),
            openweather_base_url: base_url("OPENWEATHER_BASE_URL", DEFAULT_OPENWEATHER_BASE_URL)?,
            soilgrids_base_url: base_url("SOILGRIDS_BASE_URL", DEFAULT_SOILGRIDS_BASE_URL)?,
            data_gov_api_key: optional_var("DATA_GOV_API_KEY"),
            data_gov_base_url: base_url("DATA_GOV_BASE_URL", DEFAULT_DATA_GOV_BASE_URL)?,
            libretranslate_url: base_url("LIBRETRANSLATE_API_URL", DEFAULT_LIBRETRANSLATE_URL)?,
            libretranslate_api_key: optional_var("LIBRETRANSLATE_API_KEY"),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        match config.database_url {
            Some(ref url) => tracing::debug!("Database URL: {}...", &url[..20.min(url.len())]),
            None => tracing::warn!("DATABASE_URL not set, community data will be kept in memory"),
        }
        if config.openweather_api_key.is_none() {
            tracing::warn!("OPENWEATHER_API_KEY not set, weather lookups will use defaults");
        }
        if config.data_gov_api_key.is_none() {
            tracing::warn!("DATA_GOV_API_KEY not set, market prices will be unavailable");
        }
        tracing::debug!("Model path: {}", config.model_path);
        tracing::debug!("LibreTranslate URL: {}", config.libretranslate_url);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            database_url: None,
            model_path: "models/crop_profiles.json".to_string(),
            recommendation_top_n: crate::ranking::DEFAULT_TOP_N,
            openweather_api_key: None,
            openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            soilgrids_base_url: DEFAULT_SOILGRIDS_BASE_URL.to_string(),
            data_gov_api_key: None,
            data_gov_base_url: DEFAULT_DATA_GOV_BASE_URL.to_string(),
            libretranslate_url: DEFAULT_LIBRETRANSLATE_URL.to_string(),
            libretranslate_api_key: None,
        }
    }
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn base_url(key: &str, default: &str) -> anyhow::Result<String> {
    let url = optional_var(key).unwrap_or_else(|| default.to_string());
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", key);
    }
    Ok(url.trim_end_matches('/').to_string())
}
