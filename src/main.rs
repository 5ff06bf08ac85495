//! ai-relay server binary.
//!
//! Loads `.env` and configuration, builds the provider clients once, and
//! serves the four level endpoints until Ctrl-C / SIGTERM.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use ai_relay::config::{Cli, Config};
use ai_relay::providers::gemini::GeminiConnector;
use ai_relay::providers::openai::OpenAiClient;
use ai_relay::server::routes::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The env file path is itself a CLI option, so parse once to find it and
    // again after loading it so `OPENAI_API_KEY` from the file is visible.
    let env_file = Cli::parse().env_file;
    let env_loaded = dotenvy::from_path(&env_file).is_ok();
    let cli = Cli::parse();

    if cli.check_env {
        check_env(&cli);
        return Ok(());
    }

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "ai_relay=debug,tower_http=debug"
    } else {
        "ai_relay=info,tower_http=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("ai-relay v{}", env!("CARGO_PKG_VERSION"));
    info!(path = %env_file.display(), loaded = env_loaded, "Environment file");

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    if let Some(listen) = &cli.listen {
        config.server.listen = listen.clone();
    }
    let config = Arc::new(config);

    info!(
        openai_model = config.openai.model,
        gemini_model = config.gemini.image_model,
        allowed_origin = config.server.allowed_origin,
        "Configuration loaded"
    );

    // Provider clients share one connection pool.
    let http = reqwest::Client::new();
    let openai = cli
        .server_api_key()
        .map(|key| OpenAiClient::new(http.clone(), key, &config.openai));
    if openai.is_none() {
        warn!("No server OpenAI API key configured, Levels 1-3 run in simulation mode");
    }
    let gemini = GeminiConnector::new(http, &config.gemini);

    let state = Arc::new(AppState::new(openai, gemini, config.clone()));
    let app = build_router(state)?;

    // Start the server.
    let listen_addr = config.server.listen.clone();
    info!(addr = listen_addr, "Starting server");

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Report what `--env-file` and `OPENAI_API_KEY` resolved to.
fn check_env(cli: &Cli) {
    println!("Testing .env path: {}", cli.env_file.display());
    println!("File exists?: {}", cli.env_file.exists());
    println!("{}", "-".repeat(20));
    match cli.server_api_key() {
        Some(key) => {
            let prefix: String = key.chars().take(5).collect();
            println!("SUCCESS! API Key found: {prefix}......");
        }
        None => println!("FAILURE. No API Key found."),
    }
    println!("{}", "-".repeat(20));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
