// src/types/errors.rs - 错误类型定义

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// 调用阻塞的阶段，用于区分超时发生在写入还是读取
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    Timestamp,
    Write,
    Read,
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CallStage::Timestamp => f.write_str("fetch signing timestamp"),
            CallStage::Write => f.write_str("write request"),
            CallStage::Read => f.write_str("read response"),
        }
    }
}

/// WebSocket API 通道错误
#[derive(Debug, Error)]
pub enum WsApiError {
    // 连接相关错误，通道实例不可再用
    #[error("failed to connect to WebSocket API {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
    #[error("failed to send request: {0}")]
    Write(#[source] Box<tungstenite::Error>),
    #[error("failed to read response: {0}")]
    Read(#[source] Box<tungstenite::Error>),
    #[error("connection closed")]
    ConnectionClosed,

    // 调用方截止时间
    #[error("deadline exceeded while waiting to {stage}")]
    DeadlineExceeded { stage: CallStage },

    // 服务端拒绝了这次调用
    #[error("request failed: {envelope}")]
    Rejected {
        status: u16,
        code: Option<i64>,
        msg: Option<String>,
        envelope: String,
    },

    // 数据相关错误
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("parameter {key} is not a finite number")]
    NonFiniteParam { key: String },

    // 签名/配置错误，禁止退化为未签名请求
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("API key is not configured, refusing to send signed request")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl WsApiError {
    /// 截止时间是直接原因
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, WsApiError::DeadlineExceeded { .. })
    }

    /// 连接已损坏，调用方需要重新建立通道
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            WsApiError::Connect { .. }
                | WsApiError::Write(_)
                | WsApiError::Read(_)
                | WsApiError::ConnectionClosed
        )
    }
}

/// 私钥加载错误
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("no Ed25519 key found at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "invalid Ed25519 key content in {} ({len} bytes): expect raw 32-byte seed, 64-byte key, or PKCS#8 PEM",
        path.display()
    )]
    InvalidContent { path: PathBuf, len: usize },
    #[error("inconsistent Ed25519 keypair in {}: {reason}", path.display())]
    InvalidKeypair { path: PathBuf, reason: String },
}

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported config file format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
