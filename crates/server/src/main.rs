//! Chirp server binary.
//!
//! Hosts any subset of the registry, follow, and like services in one
//! process.
//!
//! # Usage
//!
//! ```bash
//! # All three services on their default ports
//! chirpd
//!
//! # Registry alone
//! chirpd --services registry --registry-listen 0.0.0.0:9090
//!
//! # Entity services against a remote registry
//! CHIRP_REGISTRY_ADDR=http://registry.internal:9090 \
//! chirpd --services follow,like
//! ```

use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use chirp_server::bootstrap::{self, BootstrapError};
use chirp_server::config::{Cli, Config, LogFormat};
use chirp_server::shutdown::{ShutdownHandle, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), BootstrapError> {
    let cli = Cli::parse();
    let config = cli.config;

    init_logging(&config);

    tracing::info!(services = ?config.services, "starting chirpd");

    let (shutdown, shutdown_rx) = ShutdownHandle::new();
    let node = bootstrap::bootstrap(&config, shutdown_rx).await?;

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    tracing::info!("server ready, accepting connections");
    node.join().await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Initializes logging.
///
/// `RUST_LOG` controls the filter; the format follows `--log-format`, with
/// `auto` picking JSON whenever stdout is not a TTY.
fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = match config.log_format {
        LogFormat::Json => true,
        LogFormat::Text => false,
        LogFormat::Auto => !std::io::stdout().is_terminal(),
    };

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .init();
    } else {
        tracing_subscriber::registry().with(env_filter).with(fmt::layer()).init();
    }
}
