//! Typed clients for the Chirp services.
//!
//! Wraps the generated tonic clients with:
//! - bounded connect and per-call timeouts (fail fast, never block
//!   indefinitely)
//! - `x-request-id` correlation propagation on every call
//! - an error taxonomy that keeps "unknown outcome" distinct: a timed-out or
//!   transport-failed non-idempotent call (registry `add`/`remove`, entity
//!   create/delete) surfaces as [`SdkError::Indeterminate`] and is never
//!   coerced into plain success or failure
//! - bounded-backoff retry for read-only, idempotent operations only

#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

pub mod client;
pub mod config;
pub mod error;
pub mod retry;

pub use client::{AccountClient, FollowClient, LikeClient, PostClient, RegistryClient};
pub use config::ClientConfig;
pub use error::{Result, SdkError};
pub use retry::{RetryPolicy, with_retry};
