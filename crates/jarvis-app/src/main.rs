//! Jarvis application binary: composition root.
//!
//! 1. Parse CLI flags
//! 2. Load configuration from TOML, then apply environment overrides
//! 3. Initialise tracing to stderr
//! 4. Run an offline console session over stdin

mod cli;
mod console;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use jarvis_chat::ListingIntent;
use jarvis_core::config::JarvisConfig;
use jarvis_core::types::ThreadKey;

use cli::CliArgs;
use console::ConsoleSession;

fn init_tracing(default_directive: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Read before tracing exists, so load errors surface below.
    let config_file = args.resolve_config_path();
    let loaded = JarvisConfig::load(&config_file);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => JarvisConfig::default(),
    };
    config.apply_env_overrides();

    init_tracing(&args.resolve_log_level(&config.general.log_level));
    tracing::info!("Starting Jarvis v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Err(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Configuration unavailable, using defaults"
        ),
    }
    if !config.chat.create_enabled {
        tracing::warn!("Issue creation is disabled");
    }

    let thread = ThreadKey::try_new(&args.channel, &args.thread)?;
    tracing::info!(thread = %thread, "Console session ready");
    let (mut session, tracker) = ConsoleSession::offline(&config, thread);
    tracing::info!(
        query = %session.listing_query(ListingIntent::Default),
        "Listing scope"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(outcome) = session.handle_line(&line).await {
            tracing::debug!(handled = outcome.handled, state = ?outcome.state, "Line processed");
        }
    }

    tracing::info!(created = tracker.keys().len(), "Console session finished");
    Ok(())
}
