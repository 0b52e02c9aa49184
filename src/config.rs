use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Json,
    Text,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Text
    }
}

/// Settings for the external text-generation service. The credential is
/// injected here at process start and scoped to the gateway instance; it is
/// never hard-coded and never logged.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f64 {
    0.1
}

fn default_top_k() -> u32 {
    1
}

fn default_top_p() -> f64 {
    0.8
}

fn default_max_output_tokens() -> u32 {
    1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let contents = std::fs::read_to_string(p)
                    .map_err(|e| Error::InvalidRequest(format!("Cannot read config file: {}", e)))?;
                toml::from_str(&contents)
                    .map_err(|e| Error::InvalidRequest(format!("Invalid config file: {}", e)))?
            }
            None => Config::default(),
        };

        if let Ok(key) = std::env::var("CSV_ANALYST_API_KEY") {
            if !key.is_empty() {
                config.gateway.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("CSV_ANALYST_MODEL") {
            config.gateway.model = model;
        }
        if let Ok(val) = std::env::var("CSV_ANALYST_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.gateway.timeout_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("CSV_ANALYST_LOG_FORMAT") {
            config.logging.format = match val.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gateway.api_key.is_none() {
            warn!("No gateway api_key configured - analysis will use the heuristic fallback tier only");
        }
        if self.gateway.timeout_secs == 0 {
            return Err(Error::InvalidRequest(
                "gateway timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
