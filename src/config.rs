//! Configuration management for the Alma service

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream Alma API settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AlmaConfig {
    /// Scheme and host, e.g. `https://api-na.hosted.exlibrisgroup.com`
    pub host: String,
    /// Bibs endpoint path, e.g. `/almaws/v1/bibs/`
    pub endpoint: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

/// Catalog conventions used when reading holdings and items
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// Location code marking a course-reserve (Top Textbook) copy
    pub reserve_location_code: String,
    /// `desc` attribute carried by reserve location tags
    pub reserve_location_desc: String,
    /// `desc` attribute of the base status counting items on the shelf
    pub in_place_desc: String,
    /// Resolve due dates for unavailable items concurrently
    pub concurrent_due_dates: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub redact: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub alma: AlmaConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables, e.g. ALMA_SERVICE__ALMA__HOST
            .add_source(
                Environment::with_prefix("ALMA_SERVICE")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("alma.api_key", env::var("ALMA_API_KEY").ok())?
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the gateway cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alma.host.is_empty() || self.alma.endpoint.is_empty() {
            return Err(ConfigError::Message(
                "Gateway configuration not valid: alma.host and alma.endpoint are required".to_string(),
            ));
        }
        if self.alma.api_key.is_empty() {
            return Err(ConfigError::Message(
                "ALMA_API_KEY not set in environment".to_string(),
            ));
        }
        Ok(())
    }

    /// Strings that must never reach the logs
    pub fn secrets(&self) -> Vec<String> {
        if self.logging.redact && !self.alma.api_key.is_empty() {
            vec![self.alma.api_key.clone()]
        } else {
            Vec::new()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for AlmaConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            endpoint: String::new(),
            api_key: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            reserve_location_code: "TPTXB".to_string(),
            reserve_location_desc: "Top Textbook".to_string(),
            in_place_desc: "Item in place".to_string(),
            concurrent_due_dates: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            redact: true,
        }
    }
}
