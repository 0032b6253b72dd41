//! 账户服务
//!
//! 每次调用独立建立一条 WebSocket API 连接，发送一个签名请求后关闭

use chrono::Utc;
use log::{debug, warn};
use serde_json::Value;

use crate::connectors::binance::futures::{
    BinanceFuturesConfig, CallContext, Ed25519Signer, WsApiClient,
};
use crate::types::errors::WsApiError;
use crate::types::ws_api::WsApiMethod;

pub struct AccountService {
    config: BinanceFuturesConfig,
    signer: Option<Ed25519Signer>,
}

impl AccountService {
    pub fn new(config: BinanceFuturesConfig) -> Self {
        Self {
            config,
            signer: None,
        }
    }

    /// 使用已加载的签名器，不再从密钥文件读取
    pub fn with_signer(mut self, signer: Ed25519Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    /// 查询账户信息 (`account.status`)
    pub async fn account_status(&self, ctx: &CallContext) -> Result<Value, WsApiError> {
        self.call_signed(ctx, WsApiMethod::AccountStatus).await
    }

    /// 查询账户余额 (`account.balance`)
    pub async fn account_balance(&self, ctx: &CallContext) -> Result<Value, WsApiError> {
        self.call_signed(ctx, WsApiMethod::AccountBalance).await
    }

    async fn call_signed(
        &self,
        ctx: &CallContext,
        method: WsApiMethod,
    ) -> Result<Value, WsApiError> {
        let mut client = WsApiClient::connect_with_config(&self.config).await?;
        if let Some(signer) = &self.signer {
            client = client.with_signer(signer.clone());
        }

        let id = format!("{}-{}", method.id_prefix(), Utc::now().timestamp_millis());
        debug!("调用 {} (id={})", method, id);

        let result = client
            .send_signed::<Value>(ctx, id, method.as_str(), None)
            .await;

        if let Err(e) = client.close().await {
            warn!("关闭WebSocket API连接失败: {}", e);
        }

        Ok(result?.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::binance::futures::test::{next_request, reply, spawn_server};
    use crate::types::ws_api::Params;
    use ed25519_dalek::SigningKey;
    use serde_json::json;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// 已释放的本地端口，服务器时间请求会立即失败并回退到本地时钟
    async fn unreachable_rest_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    async fn service_for(ws_url: String) -> AccountService {
        let config = BinanceFuturesConfig::builder()
            .api_key("abc")
            .testnet(false)
            .ws_api_url(ws_url)
            .rest_url(unreachable_rest_url().await)
            .build();

        let signer = Ed25519Signer::new(SigningKey::from_bytes(&[9u8; 32]));
        AccountService::new(config).with_signer(signer)
    }

    #[tokio::test]
    async fn test_account_status_sends_signed_request() {
        let _ = env_logger::try_init();

        let url = spawn_server(|mut ws| async move {
            let request = next_request(&mut ws).await.unwrap();
            assert_eq!(request["method"], "account.status");
            assert!(request["id"].as_str().unwrap().starts_with("status-"));

            let params: Params = serde_json::from_value(request["params"].clone()).unwrap();
            assert!(params.contains_key("signature"));
            assert_eq!(request["params"]["apiKey"], "abc");
            assert_eq!(request["params"]["timestamp"].as_i64().unwrap() % 1000, 0);

            let body = json!({"id": request["id"], "status": 200, "result": {"canTrade": true}});
            reply(&mut ws, body).await;
        })
        .await;

        let service = service_for(url).await;
        let result = service
            .account_status(&CallContext::with_timeout(Duration::from_secs(5)))
            .await
            .unwrap();

        assert_eq!(result, json!({"canTrade": true}));
    }

    #[tokio::test]
    async fn test_account_balance_rejection_propagates() {
        let url = spawn_server(|mut ws| async move {
            let request = next_request(&mut ws).await.unwrap();
            assert_eq!(request["method"], "account.balance");
            assert!(request["id"].as_str().unwrap().starts_with("bal-"));

            let error = json!({"code": -2015, "msg": "Invalid API-key"});
            reply(&mut ws, json!({"id": request["id"], "status": 401, "error": error})).await;
        })
        .await;

        let service = service_for(url).await;
        let err = service
            .account_balance(&CallContext::with_timeout(Duration::from_secs(5)))
            .await
            .unwrap_err();

        assert!(matches!(err, WsApiError::Rejected { status: 401, code: Some(-2015), .. }));
    }

    #[tokio::test]
    async fn test_missing_result_is_null() {
        let url = spawn_server(|mut ws| async move {
            let request = next_request(&mut ws).await.unwrap();
            reply(&mut ws, json!({"id": request["id"], "status": 200})).await;
        })
        .await;

        let service = service_for(url).await;
        let result = service.account_status(&CallContext::background()).await.unwrap();
        assert_eq!(result, Value::Null);
    }
}
