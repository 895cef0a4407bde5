//! Follow and like services.
//!
//! Each social service owns a local entity store and coordinates every create
//! and delete with the uniqueness registry. The registry reservation is the
//! source of truth for "does this relationship exist"; the local store carries
//! the entity's own fields. [`coordinator::PairCoordinator`] sequences the two
//! writes and compensates when the second one fails, biasing every failure
//! toward a missing entity rather than a duplicate one.

#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

pub mod coordinator;
pub mod error;
pub mod follow;
pub mod like;
pub mod registry;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::PairCoordinator;
pub use error::{SocialError, social_status};
pub use follow::FollowServiceImpl;
pub use like::LikeServiceImpl;
pub use registry::{GrpcRegistry, Registry, RegistryCallError};
pub use resolver::{GrpcAccountResolver, GrpcPostResolver, Resolver};
pub use store::{EntityRecord, EntityTable, StoreError};
