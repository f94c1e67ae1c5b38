/*
feedprobe - main.rs
Starts the Rocket HTTP server for the RSS-to-JSON demo, or fetches a single feed with `--url`.
*/

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use common::Config;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use feedprobe::fetch::FeedClient;
use feedprobe::server::launch_rocket;

#[derive(Parser, Debug)]
#[command(name = "feedprobe", about = "RSS-to-JSON API demo server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serve canned mock feeds instead of calling the conversion services
    #[arg(long)]
    mock: bool,

    /// Fetch this feed once, print the report as JSON and exit
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so `--url` output stays clean JSON
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let mut config = match Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    if args.mock {
        config.demo.mock_mode = true;
    }

    if let Some(url) = args.url {
        return fetch_once(&config, &url).await;
    }

    launch_rocket(Arc::new(config)).await
}

async fn fetch_once(config: &Config, url: &str) -> Result<()> {
    let client = FeedClient::new(&config.services, config.demo.clone())?;
    match client.fetch(url).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(failure) => {
            if let Some(metadata) = failure.metadata() {
                println!("{}", serde_json::to_string_pretty(metadata)?);
            }
            Err(failure.into())
        }
    }
}
