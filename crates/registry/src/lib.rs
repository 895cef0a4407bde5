//! The uniqueness registry service.
//!
//! Owns composite-key reservations scoped by a domain label and is the single
//! source of truth for "does this pair already exist". Its atomic `add` is
//! the only mutual-exclusion point in the system: entity services racing to
//! create the same key are serialized here, not by any distributed lock.

#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

pub mod service;
pub mod store;

pub use service::RegistryServiceImpl;
pub use store::PairStore;
