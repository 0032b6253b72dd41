//! Ed25519 私钥加载
//!
//! 依次尝试：PKCS#8 PEM、32字节原始种子、64字节原始密钥对。
//! 其他内容一律报错，绝不生成或替换密钥

use ed25519_dalek::pkcs8::DecodePrivateKey;
use ed25519_dalek::{SigningKey, KEYPAIR_LENGTH, SECRET_KEY_LENGTH};
use log::debug;
use std::path::{Path, PathBuf};

use crate::types::errors::KeyError;

/// 未配置路径时使用的默认密钥文件
pub const DEFAULT_KEY_PATH: &str = "./ed25519.key";

/// 解析实际使用的密钥路径，空路径视为未配置
pub fn resolve_key_path(path: Option<&Path>) -> PathBuf {
    match path {
        Some(p) if !p.as_os_str().to_string_lossy().trim().is_empty() => p.to_path_buf(),
        _ => PathBuf::from(DEFAULT_KEY_PATH),
    }
}

/// 从文件读取签名私钥
pub fn load_signing_key(path: Option<&Path>) -> Result<SigningKey, KeyError> {
    let path = resolve_key_path(path);
    let data = std::fs::read(&path).map_err(|source| KeyError::Read {
        path: path.clone(),
        source,
    })?;

    parse_signing_key(&data, &path)
}

/// 从原始字节解析签名私钥，`origin` 只用于错误信息
pub fn parse_signing_key(data: &[u8], origin: &Path) -> Result<SigningKey, KeyError> {
    let trimmed = trim_whitespace(data);

    if let Ok(text) = std::str::from_utf8(trimmed) {
        if text.starts_with("-----BEGIN") {
            if let Ok(key) = SigningKey::from_pkcs8_pem(text) {
                debug!("已从PKCS#8 PEM加载Ed25519私钥: {}", origin.display());
                return Ok(key);
            }
        }
    }

    // 先按原始长度判断，再容忍文件末尾的换行
    for candidate in [data, trimmed] {
        match candidate.len() {
            SECRET_KEY_LENGTH => {
                let mut seed = [0u8; SECRET_KEY_LENGTH];
                seed.copy_from_slice(candidate);
                debug!("已从原始种子加载Ed25519私钥: {}", origin.display());
                return Ok(SigningKey::from_bytes(&seed));
            }
            KEYPAIR_LENGTH => {
                let mut keypair = [0u8; KEYPAIR_LENGTH];
                keypair.copy_from_slice(candidate);
                return SigningKey::from_keypair_bytes(&keypair).map_err(|e| {
                    KeyError::InvalidKeypair {
                        path: origin.to_path_buf(),
                        reason: e.to_string(),
                    }
                });
            }
            _ => {}
        }
    }

    Err(KeyError::InvalidContent {
        path: origin.to_path_buf(),
        len: trimmed.len(),
    })
}

fn trim_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &data[start..end]
}
