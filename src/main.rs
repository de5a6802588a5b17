use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use factdeck::config::AppConfig;

/// factdeck server. Credential keys and lifetimes come from the environment.
#[derive(Parser, Debug)]
#[command(name = "factdeck", version, about)]
struct Args {
    /// HTTP API port; overrides FACTDECK_HTTP_PORT.
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let mut cfg = AppConfig::from_env().context("While loading configuration from the environment")?;
    if let Some(port) = args.http_port {
        cfg.http_port = port;
    }

    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "factdeck", "factdeck starting: RUST_LOG='{}', http_port={}", rust_log, cfg.http_port);

    factdeck::server::run_with_config(cfg).await
}
