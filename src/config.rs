// config.rs - Gateway configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::connectors::binance::futures::BinanceFuturesConfig;
use crate::types::errors::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub binance: BinanceFuturesConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a file, choosing the format by extension.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file_format = path.extension().and_then(|os| os.to_str()).unwrap_or("");

        let read_err = |source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).await.map_err(read_err)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(read_err)?;

        Self::from_str_with_format(&contents, file_format)
    }

    pub fn from_str_with_format(contents: &str, file_format: &str) -> Result<Self, ConfigError> {
        let config = match file_format {
            "toml" => toml::from_str(contents)?,
            "json" => serde_json::from_str(contents)?,
            "yaml" | "yml" => serde_yaml::from_str(contents)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        Ok(config)
    }

    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds configuration from a variable lookup. Empty values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = BinanceFuturesConfig::builder();

        if let Some(api_key) = var("BINANCE_API_KEY") {
            builder = builder.api_key(api_key);
        }
        if let Some(testnet) = var("BINANCE_TESTNET") {
            builder = builder.testnet(testnet.trim().eq_ignore_ascii_case("true"));
        }
        if let Some(url) = var("BINANCE_FUTURES_WS_API_URL") {
            builder = builder.ws_api_url(url);
        }
        if let Some(url) = var("BINANCE_FUTURES_WS_API_URL_TEST") {
            builder = builder.ws_api_testnet_url(url);
        }
        if let Some(url) = var("BINANCE_FUTURES_URL") {
            builder = builder.rest_url(url);
        }
        if let Some(url) = var("BINANCE_FUTURES_TESTNET_URL") {
            builder = builder.rest_testnet_url(url);
        }
        if let Some(path) = var("ED25519_PRIVATE_KEY_PATH") {
            builder = builder.private_key_path(path);
        }
        if let Some(raw) = var("WS_API_TIMEOUT_MS") {
            let timeout_ms = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "WS_API_TIMEOUT_MS",
                value: raw.clone(),
            })?;
            builder = builder.request_timeout_ms(timeout_ms);
        }

        let general = GeneralConfig {
            log_level: var("LOG_LEVEL").unwrap_or_else(default_log_level),
        };

        Ok(Self {
            general,
            binance: builder.build(),
        })
    }
}
