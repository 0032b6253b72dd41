// Define modules
pub mod config;
pub mod connectors;
pub mod services;
pub mod types;

// Re-export key components for easier usage
pub use config::{AppConfig, GeneralConfig};
pub use connectors::binance::futures::{
    BinanceFuturesConfig, CallContext, Ed25519Signer, WsApiClient,
};
pub use services::AccountService;
pub use types::{ConfigError, KeyError, Params, WsApiError, WsApiMethod};
