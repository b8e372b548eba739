use std::path::PathBuf;

use clap::Parser;

use aura_face::app::FaceApp;
use aura_face::config::load_config;
use aura_face::gateway::GatewaySettings;
use aura_face::weather::Coordinates;

/// Live animated presence face for conversational agent gateways
#[derive(Debug, Parser)]
#[command(name = "aura-face", version, about)]
struct Args {
    /// Config file (TOML or JSON); defaults to the platform config dir
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gateway WebSocket URL (overrides config)
    #[arg(long)]
    ws: Option<String>,

    /// Gateway auth token (overrides config; env AURA_TOKEN also works)
    #[arg(long)]
    token: Option<String>,

    /// Gateway session name (overrides config)
    #[arg(long)]
    session: Option<String>,

    /// Latitude for the weather sampler
    #[arg(long, requires = "lon")]
    lat: Option<f64>,

    /// Longitude for the weather sampler
    #[arg(long, requires = "lat")]
    lon: Option<f64>,

    /// Seed for reproducible animation (particle phases, flash timing)
    #[arg(long)]
    seed: Option<u64>,

    /// Info-level logging
    #[arg(short, long)]
    verbose: bool,

    /// Debug-level logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else if args.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    // Logs go to stderr; stdout belongs to the face
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("Starting aura-face {}", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_deref())?;

    let gateway = GatewaySettings {
        url: args.ws.or_else(|| config.gateway.url.clone()),
        token: args
            .token
            .or_else(|| std::env::var("AURA_TOKEN").ok())
            .or_else(|| config.gateway.token.clone()),
        session: args
            .session
            .unwrap_or_else(|| config.gateway.session.clone()),
    };

    let location = match (args.lat, args.lon) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let app = FaceApp::new(config, gateway, location, args.seed);
    match app.run().await {
        Ok(()) => {
            tracing::info!("Face shut down normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Face error: {}", e);
            Err(e.into())
        }
    }
}
