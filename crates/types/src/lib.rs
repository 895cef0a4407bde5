//! Core types for the Chirp services.
//!
//! This crate provides the foundational types shared by every service:
//! - Type-safe identifier newtypes (PairId, AccountId, FollowId, ...)
//! - Record structures for registry pairs and social entities
//! - The shared query/pagination contract
//! - The cross-service error taxonomy using snafu

#![deny(unsafe_code)]

pub mod error;
pub mod ids;
pub mod query;
pub mod types;

pub use error::{RegistryError, Result};
pub use ids::{AccountId, FollowId, LikeId, PairId, PostId};
pub use query::{EntityQuery, Page, PairQuery};
pub use types::{Account, Follow, Like, Post, UniquePair, now_secs};
