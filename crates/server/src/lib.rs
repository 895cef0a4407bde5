//! Server wiring for the Chirp services.
//!
//! One `chirpd` process can host any subset of the registry, follow, and
//! like services, each on its own listener. [`bootstrap`] builds the stores,
//! downstream clients, and gRPC servers; [`shutdown`] handles signals.

#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

pub mod bootstrap;
pub mod config;
pub mod shutdown;

pub use bootstrap::{BootstrapError, Node};
pub use config::{Config, LogFormat, ServiceKind};
