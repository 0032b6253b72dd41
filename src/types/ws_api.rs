//! WebSocket API 请求/响应信封类型
//!
//! 对应 Binance 期货 `ws-fapi` 的 JSON 帧格式：
//! 请求 `{"id", "method", "params"}`，响应 `{"id", "status", "result" | "error"}`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use super::errors::WsApiError;

/// 成功响应的状态码
pub const STATUS_OK: u16 = 200;

/// 请求关联ID，由调用方选择，服务端原样回显
///
/// 整数和字符串之外的标量（浮点数、布尔值）落入 `Other`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    Text(String),
    Other(Value),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Text(s) => write!(f, "{}", s),
            RequestId::Other(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl From<i32> for RequestId {
    fn from(id: i32) -> Self {
        RequestId::Number(id.into())
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::Text(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::Text(id)
    }
}

/// 请求参数值：字符串、整数、浮点数或布尔值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// 从命令行文本推断参数类型。
    /// 只识别布尔值和整数，其余保持字符串，避免浮点数改写原始文本
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => ParamValue::Bool(true),
            "false" => ParamValue::Bool(false),
            _ => raw
                .parse::<i64>()
                .map(ParamValue::Int)
                .unwrap_or_else(|_| ParamValue::Str(raw.to_string())),
        }
    }
}

/// 签名载荷中的文本形式
impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            // f64 的 Display 输出最短的非指数十进制文本
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

/// 请求参数映射，键按字典序保存
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入参数，返回被替换的旧值
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<ParamValue>
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.0.insert(key.into(), value.into())
    }

    /// 链式插入
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 第一个值为 NaN 或无穷大的参数名。
    /// 这类值在 JSON 中无法表示，签名文本会与实际发送的内容不一致
    pub fn non_finite_key(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, value)| matches!(value, ParamValue::Float(x) if !x.is_finite()))
            .map(|(key, _)| key.as_str())
    }

    /// 按键的字典序迭代
    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a String, &'a ParamValue);
    type IntoIter = btree_map::Iter<'a, String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn params_absent(params: &Option<Params>) -> bool {
    params.as_ref().map_or(true, Params::is_empty)
}

/// 出站请求信封
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WsRequest {
    pub id: RequestId,
    pub method: String,
    #[serde(skip_serializing_if = "params_absent")]
    pub params: Option<Params>,
}

impl WsRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

/// 响应中的错误对象
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsErrorBody {
    pub code: i64,
    pub msg: String,
}

/// 入站响应信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsResponse {
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WsErrorBody>,
    #[serde(default, rename = "rateLimits", skip_serializing_if = "Option::is_none")]
    pub rate_limits: Option<Value>,
}

impl WsResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// 检查状态码并把 `result` 解码为调用方期望的类型。
    /// 没有 `result` 时返回 `Ok(None)`
    pub fn into_result<T: DeserializeOwned>(self) -> Result<Option<T>, WsApiError> {
        if !self.is_success() {
            let envelope = serde_json::to_string(&self).unwrap_or_else(|_| format!("{:?}", self));
            return Err(WsApiError::Rejected {
                status: self.status,
                code: self.error.as_ref().map(|e| e.code),
                msg: self.error.map(|e| e.msg),
                envelope,
            });
        }

        match self.result {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| WsApiError::Decode {
                    context: "result",
                    source,
                }),
        }
    }
}

/// 已实现的 WebSocket API 方法
///
/// 未实现的操作不出现在这里，调用方无法把占位实现误当作成功
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WsApiMethod {
    /// 账户信息
    AccountStatus,
    /// 账户余额
    AccountBalance,
}

impl WsApiMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WsApiMethod::AccountStatus => "account.status",
            WsApiMethod::AccountBalance => "account.balance",
        }
    }

    /// 生成请求ID时使用的前缀
    pub fn id_prefix(&self) -> &'static str {
        match self {
            WsApiMethod::AccountStatus => "status",
            WsApiMethod::AccountBalance => "bal",
        }
    }
}

impl fmt::Display for WsApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
