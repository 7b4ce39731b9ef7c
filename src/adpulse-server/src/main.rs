//! AdPulse — rule-based scoring and anomaly detection for ad campaigns.
//!
//! Main entry point: loads configuration, builds the engine state, and
//! serves the REST API.

use adpulse_api::{ApiServer, AppState, OpsStore};
use adpulse_core::config::AppConfig;
use adpulse_scoring::{BenchmarkRegistry, CampaignScorer};
use adpulse_tracking::AlertStore;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "adpulse-server")]
#[command(about = "Campaign scoring and UTM anomaly detection service")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "ADPULSE__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Skip demo data seeding (empty store)
    #[arg(long, default_value_t = false)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adpulse=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("AdPulse starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }

    let ops = Arc::new(OpsStore::new());
    if !cli.no_seed {
        ops.seed_demo_data();
    }

    let registry = BenchmarkRegistry::from_config(&config.benchmarks);
    let state = AppState {
        ops,
        alerts: Arc::new(AlertStore::new()),
        scorer: Arc::new(CampaignScorer::new(registry, config.scoring.clone())),
    };

    ApiServer::new(config, state).start().await
}
