use anyhow::Result;
use clap::Parser;
use gtin_sync_metrics::TracingService;
use gtin_sync_models::Config;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};

const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";

#[derive(Parser)]
#[command(name = "gtin-sync-server")]
#[command(about = "GTIN Sync web server")]
struct Args {
    /// TOML configuration file, defaults to configs/default.toml when present
    #[arg(long, env = "GTIN_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind, overrides the configuration
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on, overrides the configuration
    #[arg(long)]
    port: Option<u16>,

    /// Log as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn load_config(args: &Args) -> Result<Config> {
    let path = args
        .config
        .clone()
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|p| p.exists()));
    let mut config = Config::load(path.as_deref())?;

    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.json_logs {
        config.logging.json = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // SHOP_URL, API_VERSION and API_TOKEN usually come from here.
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    let config = load_config(&args)?;

    TracingService::init(config.logging.json).map_err(|e| anyhow::anyhow!(e))?;
    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to read .env: {}", e),
    }

    info!("Starting GTIN Sync server");
    info!("Configuration loaded: {:?}", config);
    if config.shopify.api_token.is_empty() {
        warn!("No Shopify access token configured, uploads need per-request credentials");
    }

    let bind = config.server.bind.clone();
    let port = config.server.port;
    let state = gtin_sync::build_state(config).await?;

    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = gtin_sync_api::start_server(state).await {
            warn!("HTTP server error: {}", e);
        }
    });

    info!("GTIN Sync server started on {}:{}", bind, port);

    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Received shutdown signal"),
            Err(err) => warn!("Unable to listen for shutdown signal: {}", err),
        },
        _ = &mut server_handle => warn!("HTTP server stopped"),
    }

    info!("Shutting down GTIN Sync server...");
    server_handle.abort();
    Ok(())
}

