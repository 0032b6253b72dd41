//! Binance连接器模块
//!
//! 目前只包含期货 WebSocket API 签名请求通道

pub mod futures;

// 重新导出主要类型
pub use futures::{BinanceFuturesConfig, CallContext, Ed25519Signer, WsApiClient};
