//! Binance期货 WebSocket API 连接配置
//!
//! 定义 ws-fapi 端点、REST 时间端点和签名密钥路径

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::constants::*;

/// Binance期货 WebSocket API 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinanceFuturesConfig {
    /// API密钥标识，签名请求时作为 `apiKey` 参数发送
    pub api_key: Option<String>,
    /// 是否使用测试网
    pub testnet: bool,
    /// 生产环境 WebSocket API 地址
    pub ws_api_url: String,
    /// 测试网 WebSocket API 地址
    pub ws_api_testnet_url: String,
    /// 生产环境 REST 地址（仅用于获取服务器时间）
    pub rest_url: String,
    /// 测试网 REST 地址
    pub rest_testnet_url: String,
    /// Ed25519 私钥文件路径，未设置时使用 `./ed25519.key`
    pub private_key_path: Option<PathBuf>,
    /// 服务器时间请求超时（毫秒）
    pub server_time_timeout_ms: u64,
    /// 单次调用的默认截止时间（毫秒）
    pub request_timeout_ms: u64,
}

impl Default for BinanceFuturesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            testnet: true,
            ws_api_url: BINANCE_FUTURES_WS_API_URL.to_string(),
            ws_api_testnet_url: BINANCE_FUTURES_TESTNET_WS_API_URL.to_string(),
            rest_url: BINANCE_FUTURES_API_URL.to_string(),
            rest_testnet_url: BINANCE_FUTURES_TESTNET_API_URL.to_string(),
            private_key_path: None,
            server_time_timeout_ms: DEFAULT_SERVER_TIME_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl BinanceFuturesConfig {
    /// 创建配置构建器
    pub fn builder() -> BinanceFuturesConfigBuilder {
        BinanceFuturesConfigBuilder::new()
    }

    /// 按环境选择 WebSocket API 端点
    pub fn ws_api_endpoint(&self) -> &str {
        if self.testnet {
            &self.ws_api_testnet_url
        } else {
            &self.ws_api_url
        }
    }

    /// 按环境选择 REST 基础地址
    pub fn rest_endpoint(&self) -> &str {
        if self.testnet {
            &self.rest_testnet_url
        } else {
            &self.rest_url
        }
    }

    /// 服务器时间端点完整地址
    pub fn server_time_url(&self) -> String {
        format!(
            "{}{}",
            self.rest_endpoint().trim_end_matches('/'),
            FUTURES_SERVER_TIME_PATH
        )
    }

    pub fn server_time_timeout(&self) -> Duration {
        Duration::from_millis(self.server_time_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 非空的API密钥
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// 期货 WebSocket API 配置构建器
pub struct BinanceFuturesConfigBuilder {
    config: BinanceFuturesConfig,
}

impl BinanceFuturesConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: BinanceFuturesConfig::default(),
        }
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    pub fn testnet(mut self, testnet: bool) -> Self {
        self.config.testnet = testnet;
        self
    }

    pub fn ws_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.ws_api_url = url.into();
        self
    }

    pub fn ws_api_testnet_url(mut self, url: impl Into<String>) -> Self {
        self.config.ws_api_testnet_url = url.into();
        self
    }

    pub fn rest_url(mut self, url: impl Into<String>) -> Self {
        self.config.rest_url = url.into();
        self
    }

    pub fn rest_testnet_url(mut self, url: impl Into<String>) -> Self {
        self.config.rest_testnet_url = url.into();
        self
    }

    pub fn private_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.private_key_path = Some(path.into());
        self
    }

    pub fn server_time_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.server_time_timeout_ms = timeout_ms;
        self
    }

    pub fn request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.request_timeout_ms = timeout_ms.max(1);
        self
    }

    pub fn build(self) -> BinanceFuturesConfig {
        self.config
    }
}

impl Default for BinanceFuturesConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_selection() {
        let config = BinanceFuturesConfig::builder().testnet(false).build();
        assert_eq!(config.ws_api_endpoint(), BINANCE_FUTURES_WS_API_URL);
        assert_eq!(config.server_time_url(), "https://fapi.binance.com/fapi/v1/time");

        let config = BinanceFuturesConfig::builder()
            .testnet(true)
            .rest_testnet_url("https://demo-fapi.binance.com/")
            .build();
        assert_eq!(config.ws_api_endpoint(), BINANCE_FUTURES_TESTNET_WS_API_URL);
        assert_eq!(config.server_time_url(), "https://demo-fapi.binance.com/fapi/v1/time");
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let config = BinanceFuturesConfig::builder().api_key("   ").build();
        assert_eq!(config.api_key(), None);

        let config = BinanceFuturesConfig::builder().api_key("abc").build();
        assert_eq!(config.api_key(), Some("abc"));
    }

    #[test]
    fn test_defaults() {
        let config = BinanceFuturesConfig::default();
        assert!(config.testnet);
        assert_eq!(config.server_time_timeout(), Duration::from_secs(2));
        assert!(config.private_key_path.is_none());
    }
}
