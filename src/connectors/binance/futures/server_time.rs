//! 服务器时间校正
//!
//! 签名请求的 `timestamp` 优先取交易所服务器时间，避免本地时钟偏差导致请求被拒；
//! 获取失败时静默回退到本地时钟

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::config::BinanceFuturesConfig;

/// 毫秒级时间源
#[async_trait]
pub trait TimeSource: Send + Sync {
    /// 当前 Unix 时间（毫秒）
    async fn now_ms(&self) -> i64;
}

/// 截断到整秒，仍以毫秒表示：`floor(ms / 1000) * 1000`
pub fn truncate_to_second(ms: i64) -> i64 {
    ms.div_euclid(1000) * 1000
}

/// 本地时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

#[async_trait]
impl TimeSource for LocalClock {
    async fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Deserialize)]
struct ServerTimeResponse {
    #[serde(rename = "serverTime", default)]
    server_time: i64,
}

/// 通过 REST `/fapi/v1/time` 获取服务器时间
#[derive(Debug, Clone)]
pub struct ServerTimeSource {
    client: Client,
    url: String,
}

impl ServerTimeSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &BinanceFuturesConfig) -> Result<Self, reqwest::Error> {
        Self::new(config.server_time_url(), config.server_time_timeout())
    }

    /// 获取服务器时间，不做回退
    pub async fn fetch(&self) -> Result<i64, reqwest::Error> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;

        let body: ServerTimeResponse = response.json().await?;
        Ok(body.server_time)
    }
}

#[async_trait]
impl TimeSource for ServerTimeSource {
    async fn now_ms(&self) -> i64 {
        match self.fetch().await {
            Ok(server_time) if server_time > 0 => {
                debug!("服务器时间: {}", server_time);
                server_time
            }
            Ok(server_time) => {
                warn!("服务器时间无效({})，回退到本地时钟", server_time);
                LocalClock.now_ms().await
            }
            Err(e) => {
                warn!("获取服务器时间失败，回退到本地时钟: {}", e);
                LocalClock.now_ms().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 返回固定响应体的一次性HTTP服务
    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/fapi/v1/time", addr)
    }

    #[test]
    fn test_truncate_to_second() {
        assert_eq!(truncate_to_second(0), 0);
        assert_eq!(truncate_to_second(999), 0);
        assert_eq!(truncate_to_second(1000), 1000);
        assert_eq!(truncate_to_second(1999), 1000);
        assert_eq!(truncate_to_second(1_700_000_000_999), 1_700_000_000_000);
    }

    #[tokio::test]
    async fn test_server_time_is_used() {
        let url = serve_once(r#"{"serverTime":1700000000123}"#).await;
        let source = ServerTimeSource::new(url, Duration::from_secs(2)).unwrap();

        assert_eq!(source.now_ms().await, 1_700_000_000_123);
    }

    #[tokio::test]
    async fn test_zero_server_time_falls_back() {
        let url = serve_once(r#"{"serverTime":0}"#).await;
        let source = ServerTimeSource::new(url, Duration::from_secs(2)).unwrap();

        let before = Utc::now().timestamp_millis();
        let now = source.now_ms().await;
        assert!(now >= before);
    }

    #[tokio::test]
    async fn test_unreachable_server_falls_back() {
        // 绑定后立即释放端口，连接会被拒绝
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source =
            ServerTimeSource::new(format!("http://{}/fapi/v1/time", addr), Duration::from_secs(2))
                .unwrap();

        let before = Utc::now().timestamp_millis();
        let now = source.now_ms().await;
        let after = Utc::now().timestamp_millis();
        assert!(now >= before && now <= after);
    }
}
