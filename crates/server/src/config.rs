//! Server configuration.
//!
//! Everything is settable by flag or environment variable; flags win. The
//! default endpoints assume a single-host development layout where all three
//! services run in one process.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};

use chirp_sdk::ClientConfig;

/// Command line for `chirpd`.
#[derive(Debug, Parser)]
#[command(name = "chirpd", version, about = "Chirp registry and social services")]
pub struct Cli {
    /// Server configuration.
    #[command(flatten)]
    pub config: Config,
}

/// Which services to host in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceKind {
    /// The uniqueness registry.
    Registry,
    /// The follow service.
    Follow,
    /// The like service.
    Like,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text.
    Text,
    /// JSON structured logging.
    Json,
    /// JSON when stdout is not a TTY, text otherwise.
    Auto,
}

/// Server configuration.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Services to host in this process.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = [ServiceKind::Registry, ServiceKind::Follow, ServiceKind::Like],
        env = "CHIRP_SERVICES"
    )]
    pub services: Vec<ServiceKind>,

    /// Listen address for the registry service.
    #[arg(long, default_value = "127.0.0.1:9090", env = "CHIRP_REGISTRY_LISTEN")]
    pub registry_listen: SocketAddr,

    /// Listen address for the follow service.
    #[arg(long, default_value = "127.0.0.1:9091", env = "CHIRP_FOLLOW_LISTEN")]
    pub follow_listen: SocketAddr,

    /// Listen address for the like service.
    #[arg(long, default_value = "127.0.0.1:9092", env = "CHIRP_LIKE_LISTEN")]
    pub like_listen: SocketAddr,

    /// Registry endpoint the entity services coordinate against. Ignored
    /// when the registry is hosted in this process.
    #[arg(long, default_value = "http://127.0.0.1:9090", env = "CHIRP_REGISTRY_ADDR")]
    pub registry_addr: String,

    /// Account service endpoint, for identity expansion.
    #[arg(long, default_value = "http://127.0.0.1:9095", env = "CHIRP_ACCOUNT_ADDR")]
    pub account_addr: String,

    /// Post service endpoint, for object expansion.
    #[arg(long, default_value = "http://127.0.0.1:9096", env = "CHIRP_POST_ADDR")]
    pub post_addr: String,

    /// Timeout for downstream calls, in seconds.
    #[arg(long, default_value_t = 10, env = "CHIRP_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Auto, env = "CHIRP_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Config {
    /// Whether this process hosts `kind`.
    pub fn hosts(&self, kind: ServiceKind) -> bool {
        self.services.contains(&kind)
    }

    /// Client configuration for downstream calls.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default().with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}
