//! Binance期货 WebSocket API 客户端
//!
//! 在一条持久 WebSocket 连接上提供请求/响应调用原语：
//! 发送带ID的方法调用，可选签名，按ID等待对应响应，写入和读取分别受截止时间约束。
//!
//! 同一时间只允许一个未完成的调用，`send`/`send_signed` 需要 `&mut self`，
//! 需要并发时请为每个逻辑操作建立独立的客户端。

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::config::BinanceFuturesConfig;
use super::constants::{API_KEY_PARAM, SIGNATURE_PARAM, TIMESTAMP_PARAM};
use super::server_time::{truncate_to_second, LocalClock, ServerTimeSource, TimeSource};
use super::signer::{canonical_payload, Ed25519Signer};
use crate::types::errors::{CallStage, WsApiError};
use crate::types::ws_api::{Params, RequestId, WsRequest, WsResponse};

pub type Result<T> = std::result::Result<T, WsApiError>;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 单次调用的上下文，目前只携带截止时间
#[derive(Debug, Clone, Copy, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
}

impl CallContext {
    /// 没有截止时间，调用一直等待直到收到响应或连接出错
    pub fn background() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// 在截止时间内执行一个阶段
async fn bounded<F: Future>(
    deadline: Option<Instant>,
    stage: CallStage,
    fut: F,
) -> Result<F::Output> {
    match deadline {
        Some(deadline) => timeout_at(deadline, fut)
            .await
            .map_err(|_| WsApiError::DeadlineExceeded { stage }),
        None => Ok(fut.await),
    }
}

/// WebSocket API 客户端
pub struct WsApiClient {
    /// WebSocket连接，关闭后为 `None`
    stream: Option<WsStream>,
    /// 连接地址
    endpoint: String,
    /// API密钥标识
    api_key: Option<String>,
    /// 已加载的签名器
    signer: Option<Ed25519Signer>,
    /// 签名器未提供时从这里加载私钥
    key_path: Option<PathBuf>,
    /// 签名时间戳来源
    time_source: Arc<dyn TimeSource>,
}

impl WsApiClient {
    /// 连接到指定端点，不做重试
    pub async fn connect(endpoint: &str) -> Result<Self> {
        info!("正在连接Binance期货WebSocket API: {}", endpoint);

        let (stream, _) = connect_async(endpoint)
            .await
            .map_err(|e| WsApiError::Connect {
                url: endpoint.to_string(),
                source: Box::new(e),
            })?;

        info!("Binance期货WebSocket API连接成功");
        Ok(Self {
            stream: Some(stream),
            endpoint: endpoint.to_string(),
            api_key: None,
            signer: None,
            key_path: None,
            time_source: Arc::new(LocalClock),
        })
    }

    /// 按配置选择生产/测试网端点并连接，签名时间戳取服务器时间
    pub async fn connect_with_config(config: &BinanceFuturesConfig) -> Result<Self> {
        let time_source = ServerTimeSource::from_config(config).map_err(WsApiError::HttpClient)?;
        let mut client = Self::connect(config.ws_api_endpoint())
            .await?
            .with_time_source(Arc::new(time_source));

        client.api_key = config.api_key().map(str::to_string);
        client.key_path = config.private_key_path.clone();
        Ok(client)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_signer(mut self, signer: Ed25519Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// 发送请求并等待对应响应，`result` 解码为 `T`；响应没有 `result` 时返回 `None`
    pub async fn send<T: DeserializeOwned>(
        &mut self,
        ctx: &CallContext,
        id: impl Into<RequestId>,
        method: &str,
        params: Option<Params>,
    ) -> Result<Option<T>> {
        self.send_raw(ctx, id, method, params).await?.into_result()
    }

    /// 发送请求并返回原始响应信封，不检查状态码
    pub async fn send_raw(
        &mut self,
        ctx: &CallContext,
        id: impl Into<RequestId>,
        method: &str,
        params: Option<Params>,
    ) -> Result<WsResponse> {
        if let Some(key) = params.as_ref().and_then(Params::non_finite_key) {
            return Err(WsApiError::NonFiniteParam {
                key: key.to_string(),
            });
        }

        let request = WsRequest::new(id.into(), method, params);
        let text = serde_json::to_string(&request).map_err(WsApiError::Encode)?;
        let stream = self.stream.as_mut().ok_or(WsApiError::ConnectionClosed)?;

        debug!("发送WebSocket API请求: id={} method={}", request.id, request.method);

        bounded(ctx.deadline(), CallStage::Write, stream.send(Message::Text(text)))
            .await?
            .map_err(|e| WsApiError::Write(Box::new(e)))?;

        let response = bounded(
            ctx.deadline(),
            CallStage::Read,
            Self::read_response(stream, &request.id),
        )
        .await??;

        debug!("收到WebSocket API响应: id={} status={}", request.id, response.status);
        Ok(response)
    }

    /// 签名后发送：补齐 `apiKey` 和 `timestamp`，签名后委托给 `send`
    ///
    /// 获取服务器时间也计入 `ctx` 的截止时间
    pub async fn send_signed<T: DeserializeOwned>(
        &mut self,
        ctx: &CallContext,
        id: impl Into<RequestId>,
        method: &str,
        params: Option<Params>,
    ) -> Result<Option<T>> {
        let params = self.sign_params(ctx, params).await?;
        self.send(ctx, id, method, Some(params)).await
    }

    /// 补齐签名所需参数并添加 `signature`
    ///
    /// 私钥缺失或无效时直接返回错误，不会退化为未签名请求
    pub async fn sign_params(
        &mut self,
        ctx: &CallContext,
        params: Option<Params>,
    ) -> Result<Params> {
        let mut params = params.unwrap_or_default();
        if let Some(key) = params.non_finite_key() {
            return Err(WsApiError::NonFiniteParam {
                key: key.to_string(),
            });
        }

        let signer = self.resolve_signer()?;

        if !params.contains_key(API_KEY_PARAM) {
            let api_key = self.api_key.clone().ok_or(WsApiError::MissingApiKey)?;
            params.insert(API_KEY_PARAM, api_key);
        }

        if !params.contains_key(TIMESTAMP_PARAM) {
            let now_ms = bounded(
                ctx.deadline(),
                CallStage::Timestamp,
                self.time_source.now_ms(),
            )
            .await?;
            let timestamp = truncate_to_second(now_ms);
            params.insert(TIMESTAMP_PARAM, timestamp);
        }

        let payload = canonical_payload(&params);
        debug!("签名载荷: {}", payload);

        params.insert(SIGNATURE_PARAM, signer.sign(&payload));
        Ok(params)
    }

    /// 关闭连接，重复调用返回 `Ok(())`
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        match stream.close(None).await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => {
                info!("Binance期货WebSocket API已断开连接: {}", self.endpoint);
                Ok(())
            }
            Err(e) => Err(WsApiError::Write(Box::new(e))),
        }
    }

    fn resolve_signer(&mut self) -> Result<Ed25519Signer> {
        if let Some(signer) = &self.signer {
            return Ok(signer.clone());
        }

        let signer = Ed25519Signer::from_key_file(self.key_path.as_deref())?;
        self.signer = Some(signer.clone());
        Ok(signer)
    }

    /// 读取下一条与请求ID对应的响应
    ///
    /// ID不一致的帧来自之前超时的调用，直接丢弃
    async fn read_response(stream: &mut WsStream, expected: &RequestId) -> Result<WsResponse> {
        loop {
            let frame = match stream.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(tungstenite::Error::ConnectionClosed)) | None => {
                    return Err(WsApiError::ConnectionClosed)
                }
                Some(Err(e)) => return Err(WsApiError::Read(Box::new(e))),
            };

            let response: WsResponse = match frame {
                Message::Text(text) => serde_json::from_str::<WsResponse>(&text),
                Message::Binary(bytes) => serde_json::from_slice::<WsResponse>(&bytes),
                Message::Close(frame) => {
                    debug!("服务端关闭连接: {:?}", frame);
                    return Err(WsApiError::ConnectionClosed);
                }
                // Ping由tungstenite自动回复Pong
                _ => continue,
            }
            .map_err(|source| WsApiError::Decode {
                context: "response envelope",
                source,
            })?;

            if let Some(id) = response.id.as_ref().filter(|id| *id != expected) {
                warn!("丢弃ID不匹配的响应: 期望 {} 收到 {}", expected, id);
                continue;
            }

            return Ok(response);
        }
    }
}
