//! Request signing utilities.
//!
//! WebSocket API 签名：把参数按键排序拼成 `key=value&...`，
//! 用 Ed25519 签名后以 base64 文本放入 `signature` 参数

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::constants::SIGNATURE_PARAM;
use super::key_loader::load_signing_key;
use crate::types::errors::KeyError;
use crate::types::ws_api::Params;

/// 构建规范签名载荷
///
/// 跳过 `signature` 字段，其余参数按键的字典序以 `&` 连接
pub fn canonical_payload(params: &Params) -> String {
    params
        .iter()
        .filter(|(key, _)| key.as_str() != SIGNATURE_PARAM)
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Ed25519 请求签名器
///
/// 私钥加载后只读，克隆只增加引用计数，可在多个通道间共享
#[derive(Clone)]
pub struct Ed25519Signer {
    key: Arc<SigningKey>,
}

impl Ed25519Signer {
    pub fn new(key: SigningKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// 从密钥文件创建，`None` 时使用默认路径
    pub fn from_key_file(path: Option<&Path>) -> Result<Self, KeyError> {
        load_signing_key(path).map(Self::new)
    }

    /// 签名载荷，返回 base64 编码的签名
    pub fn sign(&self, payload: &str) -> String {
        let signature = self.key.sign(payload.as_bytes());
        STANDARD.encode(signature.to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("verifying_key", &STANDARD.encode(self.key.verifying_key().as_bytes()))
            .finish()
    }
}
