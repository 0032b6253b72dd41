//! Binance期货 WebSocket API 连接器模块
//!
//! 提供带 Ed25519 签名的请求/响应通道，以及它依赖的密钥加载和服务器时间校正

pub mod config;
pub mod key_loader;
pub mod server_time;
pub mod signer;
pub mod ws_api;


// 重新导出主要类型
pub use config::{BinanceFuturesConfig, BinanceFuturesConfigBuilder};
pub use key_loader::{load_signing_key, parse_signing_key, DEFAULT_KEY_PATH};
pub use server_time::{truncate_to_second, LocalClock, ServerTimeSource, TimeSource};
pub use signer::{canonical_payload, Ed25519Signer};
pub use ws_api::{CallContext, WsApiClient};

// 期货 WebSocket API 常量
pub mod constants {
    // WebSocket API URLs
    pub const BINANCE_FUTURES_WS_API_URL: &str = "wss://ws-fapi.binance.com/ws-fapi/v1";
    pub const BINANCE_FUTURES_TESTNET_WS_API_URL: &str = "wss://testnet.binancefuture.com/ws-fapi/v1";

    // REST API URLs
    pub const BINANCE_FUTURES_API_URL: &str = "https://fapi.binance.com";
    pub const BINANCE_FUTURES_TESTNET_API_URL: &str = "https://testnet.binancefuture.com";

    pub const FUTURES_SERVER_TIME_PATH: &str = "/fapi/v1/time";

    // 签名请求参数名
    pub const API_KEY_PARAM: &str = "apiKey";
    pub const TIMESTAMP_PARAM: &str = "timestamp";
    pub const SIGNATURE_PARAM: &str = "signature";

    pub const DEFAULT_SERVER_TIME_TIMEOUT_MS: u64 = 2_000;
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
}
