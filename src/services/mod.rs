//! 基于 WebSocket API 的账户服务

pub mod account;

pub use account::AccountService;
