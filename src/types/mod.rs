// src/types/mod.rs - 网关类型系统

pub mod errors;
pub mod ws_api;

pub use errors::{CallStage, ConfigError, KeyError, WsApiError};
pub use ws_api::{
    ParamValue, Params, RequestId, WsApiMethod, WsErrorBody, WsRequest, WsResponse, STATUS_OK,
};
