use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::{BoostSettings, ScoringWeights};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub recommendation: RecommendationSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Redis is optional; without it only the in-process tier is used
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationSettings {
    #[serde(default = "default_limit")]
    pub default_limit: u16,
    #[serde(default = "default_max_limit")]
    pub max_limit: u16,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl RecommendationSettings {
    /// Requested limit, defaulted and capped
    pub fn effective_limit(&self, requested: Option<u16>) -> usize {
        requested.unwrap_or(self.default_limit).min(self.max_limit) as usize
    }
}

fn default_limit() -> u16 { 20 }
fn default_max_limit() -> u16 { 100 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub boosts: BoostsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_service_match_weight")]
    pub service_match: f64,
    #[serde(default = "default_service_mismatch_weight")]
    pub service_mismatch: f64,
    #[serde(default = "default_service_neutral_weight")]
    pub service_neutral: f64,
    #[serde(default = "default_price_weight")]
    pub price: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_rating_weight")]
    pub rating: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            service_match: default_service_match_weight(),
            service_mismatch: default_service_mismatch_weight(),
            service_neutral: default_service_neutral_weight(),
            price: default_price_weight(),
            location: default_location_weight(),
            rating: default_rating_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        Self {
            service_match: config.service_match,
            service_mismatch: config.service_mismatch,
            service_neutral: config.service_neutral,
            price: config.price,
            location: config.location,
            rating: config.rating,
        }
    }
}

fn default_service_match_weight() -> f64 { 40.0 }
fn default_service_mismatch_weight() -> f64 { 10.0 }
fn default_service_neutral_weight() -> f64 { 20.0 }
fn default_price_weight() -> f64 { 25.0 }
fn default_location_weight() -> f64 { 25.0 }
fn default_rating_weight() -> f64 { 10.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct BoostsConfig {
    #[serde(default = "default_subscription_boost")]
    pub subscription: f64,
    #[serde(default = "default_frequent_salon_boost")]
    pub frequent_salon: f64,
}

impl Default for BoostsConfig {
    fn default() -> Self {
        Self {
            subscription: default_subscription_boost(),
            frequent_salon: default_frequent_salon_boost(),
        }
    }
}

impl From<&BoostsConfig> for BoostSettings {
    fn from(config: &BoostsConfig) -> Self {
        Self {
            subscription: config.subscription,
            frequent_salon: config.frequent_salon,
        }
    }
}

fn default_subscription_boost() -> f64 { 50.0 }
fn default_frequent_salon_boost() -> f64 { 10.0 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SALON_MATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SALON_MATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SALON_MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SALON_MATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the conventional `DATABASE_URL` and `REDIS_URL` variables on top of
/// the loaded configuration
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(redis_url) = env::var("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", redis_url)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = ScoringWeights::from(&WeightsConfig::default());
        assert_eq!(weights, ScoringWeights::default());

        let boosts = BoostSettings::from(&BoostsConfig::default());
        assert_eq!(boosts, BoostSettings::default());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_effective_limit() {
        let settings = RecommendationSettings::default();
        assert_eq!(settings.effective_limit(None), 20);
        assert_eq!(settings.effective_limit(Some(5)), 5);
        assert_eq!(settings.effective_limit(Some(500)), 100);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("salon-match-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
            [server]
            host = "127.0.0.1"
            port = 9090

            [database]
            url = "postgres://localhost/test"

            [scoring.boosts]
            subscription = 30.0
            "#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.scoring.boosts.subscription, 30.0);
        assert_eq!(settings.scoring.boosts.frequent_salon, 10.0);
        assert_eq!(settings.scoring.weights.service_match, 40.0);
        assert!(settings.cache.redis_url.is_none());
        assert_eq!(settings.logging.level, "info");
    }
}
