use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use coinswitch_rs::{
    http, CoinSwitchClient, Dashboard, ExchangeConfig, MemoryOrderStore, OrderStore,
    SqliteOrderStore,
};

#[derive(Debug, Parser)]
#[command(name = "coinswitch-dashboard", about = "CoinSwitch 交易面板后端")]
struct Cli {
    /// TOML 配置文件；缺省时读取 COINSWITCH_* 环境变量
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "127.0.0.1:8000")]
    listen: String,

    /// SQLite 连接串，或 `memory` 使用内存存储
    #[arg(long, default_value = "sqlite://orders.db?mode=rwc")]
    database: String,

    #[arg(long, default_value = "info")]
    log_level: String,

    /// text | json
    #[arg(long, default_value = "text")]
    log_format: String,
}

fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let filter = std::env::var("COINSWITCH_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter =
        tracing_subscriber::EnvFilter::try_new(filter).context("invalid log filter")?;

    if log_format.trim().eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
    Ok(())
}

async fn open_store(database: &str) -> Result<Arc<dyn OrderStore>> {
    if database == "memory" {
        return Ok(Arc::new(MemoryOrderStore::new()));
    }
    let store = SqliteOrderStore::connect(database)
        .await
        .with_context(|| format!("failed to open order store {database}"))?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, &cli.log_format)?;

    let config = match &cli.config {
        Some(path) => ExchangeConfig::load(path)?,
        None => ExchangeConfig::from_env()?,
    };
    info!(base_url = %config.base_url, username = %config.username, "配置已加载");

    let client = CoinSwitchClient::from_config(&config).context("invalid exchange credentials")?;
    let store = open_store(&cli.database).await?;
    let dashboard = Arc::new(Dashboard::new(Arc::new(client), store, config.username.clone()));

    let listener = tokio::net::TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    info!(listen = %cli.listen, "面板服务已启动");
    axum::serve(listener, http::router(dashboard)).await?;
    Ok(())
}
