use clap::Parser;
use silomq::{BrokerConfig, BrokerServer, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "silomq")]
#[command(about = "A single-node append-only message broker")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port
    #[arg(long)]
    port: Option<u16>,

    /// Override the configured data directory
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(parse_log_level(&args.log_level))
        .init();

    let mut config = BrokerConfig::load(&args.config)?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    info!(
        "starting silomq broker on {}:{}",
        config.server.host, config.server.port
    );
    info!("data directory: {}", config.storage.data_dir);
    info!("topic: {}", config.storage.topic);
    info!(
        "segment size: {} bytes, retention: {} ms",
        config.storage.max_segment_size_bytes, config.storage.retention_ms
    );

    let server = Arc::new(BrokerServer::new(config)?);

    let run_server = Arc::clone(&server);
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = run_server.run().await {
            error!("server error: {}", e);
        }
    });

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("received Ctrl+C, shutting down");
            server.shutdown();
            let _ = (&mut server_handle).await;
        }
        _ = &mut server_handle => {}
    }

    info!("silomq shut down");
    Ok(())
}

fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => {
            warn!("invalid log level '{}', defaulting to 'info'", level);
            tracing::Level::INFO
        }
    }
}
