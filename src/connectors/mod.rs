// src/connectors/mod.rs - 连接器模块入口

pub mod binance;
