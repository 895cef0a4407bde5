//! Shared test utilities for the Chirp crates.
//!
//! - [`TestCluster`] - all three services plus stub collaborators, in one
//!   process on ephemeral ports
//! - [`StubDirectory`] - preloadable account/post fixtures served over gRPC
//! - [`assert_eventually`] - poll a condition until it holds or times out

#![deny(unsafe_code)]

mod assertions;
pub use assertions::assert_eventually;

mod harness;
pub use harness::TestCluster;

mod stubs;
pub use stubs::{StubDirectory, serve_stub_directory};
