use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CatalogConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    pub format: Option<String>,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {path}"))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file {path}"))
    }

    pub fn logging_format(&self) -> &str {
        self.logging.format.as_deref().unwrap_or("text")
    }
}

/// Injected credential for the token-paged catalog backend. Sourced from
/// the config file or the `YOUTUBE_API_KEY` environment variable, never
/// compiled in.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    key: String,
}

impl ApiCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Config file first, environment second. `None` when neither is set.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .catalog
            .api_key
            .clone()
            .or_else(|| std::env::var("YOUTUBE_API_KEY").ok())
            .filter(|key| !key.is_empty())
            .map(Self::new)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
