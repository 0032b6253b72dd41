// main.rs - Command line entry point for the Binance futures WebSocket API gateway

use chrono::Utc;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn, LevelFilter};
use serde_json::{json, Value};
use std::error::Error;
use std::path::PathBuf;

use fapi_gateway::connectors::binance::futures::{
    truncate_to_second, CallContext, ServerTimeSource, WsApiClient,
};
use fapi_gateway::types::ws_api::{ParamValue, Params};
use fapi_gateway::{AccountService, AppConfig};

/// Signed request gateway for the Binance futures WebSocket API
#[derive(Parser)]
#[command(name = "fapi-gateway")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (toml, json or yaml). Environment variables are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Per-call deadline in milliseconds, overrides the configured value
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print account information (account.status)
    Status,

    /// Print account balances (account.balance)
    Balance,

    /// Print server time and the signing timestamp derived from it
    Time,

    /// Send an arbitrary method call
    Call {
        /// WebSocket API method, e.g. order.status
        method: String,

        /// Parameters as key=value pairs
        params: Vec<String>,

        /// Sign the request
        #[arg(long)]
        signed: bool,

        /// Request id, defaults to a timestamp-derived id
        #[arg(long)]
        id: Option<String>,
    },
}

fn parse_params(raw: &[String]) -> Result<Option<Params>, Box<dyn Error>> {
    if raw.is_empty() {
        return Ok(None);
    }

    let mut params = Params::new();
    for pair in raw {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("invalid parameter {:?}, expected key=value", pair))?;
        params.insert(key, ParamValue::infer(value));
    }
    Ok(Some(params))
}

fn build_logger(log_level: &str) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(log_level));
    builder
        .filter_module("tokio_tungstenite", LevelFilter::Warn)
        .filter_module("tungstenite", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .format_timestamp_millis()
        .format_module_path(false);
    builder
}

fn print_json(value: &Value) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path).await?,
        None => AppConfig::from_env()?,
    };
    if let Some(timeout_ms) = cli.timeout_ms {
        config.binance.request_timeout_ms = timeout_ms.max(1);
    }

    build_logger(&config.general.log_level).init();

    let binance = config.binance;
    info!(
        "Binance期货WebSocket API: {} (testnet={})",
        binance.ws_api_endpoint(),
        binance.testnet
    );
    if binance.api_key().is_none() {
        warn!("未配置API密钥 (BINANCE_API_KEY)，签名请求将失败");
    }

    let ctx = CallContext::with_timeout(binance.request_timeout());

    match cli.command {
        Commands::Status => {
            let service = AccountService::new(binance);
            print_json(&service.account_status(&ctx).await?)?;
        }
        Commands::Balance => {
            let service = AccountService::new(binance);
            print_json(&service.account_balance(&ctx).await?)?;
        }
        Commands::Time => {
            let source = ServerTimeSource::from_config(&binance)?;
            let server_time = source.fetch().await?;
            print_json(&json!({
                "serverTime": server_time,
                "signingTimestamp": truncate_to_second(server_time),
                "localTime": Utc::now().timestamp_millis(),
            }))?;
        }
        Commands::Call {
            method,
            params,
            signed,
            id,
        } => {
            let params = parse_params(&params)?;
            let id = id.unwrap_or_else(|| format!("cli-{}", Utc::now().timestamp_millis()));

            let mut client = WsApiClient::connect_with_config(&binance).await?;
            let result = if signed {
                client.send_signed::<Value>(&ctx, id, &method, params).await
            } else {
                client.send::<Value>(&ctx, id, &method, params).await
            };

            if let Err(e) = client.close().await {
                warn!("关闭WebSocket API连接失败: {}", e);
            }
            print_json(&result?.unwrap_or(Value::Null))?;
        }
    }

    Ok(())
}
