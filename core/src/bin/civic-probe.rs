//! Connectivity probe: runs requests through the resilient client and
//! reports which base URL answered.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use civic_client::{
    ApiResponse, BuildMode, CivicApi, ClientConfig, FileTokenStore, NoTokens, Platform,
    ResilientClient, TokenStore,
};

#[derive(Parser)]
#[command(name = "civic-probe")]
#[command(about = "Check which civic API endpoint is reachable", long_about = None)]
struct Cli {
    /// TOML file with primary_url, fallback_urls and timeout_ms
    #[arg(short, long, conflicts_with = "url")]
    config: Option<PathBuf>,

    /// Primary base URL, e.g. http://localhost:8000/api/v1
    #[arg(short, long)]
    url: Option<String>,

    /// Fallback base URL; repeat for several. Appended after any fallbacks
    /// from the config file or environment
    #[arg(short, long = "fallback")]
    fallbacks: Vec<String>,

    /// Per-attempt timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Token storage file (JSON with an "authToken" key)
    #[arg(long)]
    tokens: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call /health and print the endpoint that answered
    Health,
    /// GET an arbitrary path and print the envelope
    Get { path: String },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civic_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let tokens: Arc<dyn TokenStore> = match &cli.tokens {
        Some(path) => Arc::new(FileTokenStore::new(path)),
        None => Arc::new(NoTokens),
    };
    let api = CivicApi::new(ResilientClient::from_config(&config, tokens));

    let ok = match cli.command {
        Commands::Health => {
            let envelope = api.check_health().await?;
            if let ApiResponse::Data(health) = &envelope {
                println!(
                    "{} is {} (v{})",
                    api.client().primary(),
                    health.status,
                    health.version
                );
            }
            print_error(&envelope)
        }
        Commands::Get { path } => {
            let envelope: ApiResponse<Value> = api.client().get(&path).await?;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            envelope.is_data()
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Explicit flags win, then `--config`, then the environment, then the
/// local development profile.
fn resolve_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = if let Some(url) = &cli.url {
        ClientConfig::new(url.clone())
    } else if let Some(path) = &cli.config {
        ClientConfig::load(path)?
    } else if let Some(config) = ClientConfig::from_env()? {
        config
    } else {
        ClientConfig::for_platform(Platform::Web, BuildMode::Development)
    };
    config.fallback_urls.extend(cli.fallbacks.iter().cloned());
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

fn print_error<T>(envelope: &ApiResponse<T>) -> bool {
    match envelope.error() {
        Some(message) => {
            eprintln!("error: {message}");
            false
        }
        None => true,
    }
}
