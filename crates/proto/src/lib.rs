//! Protobuf types and conversions for the Chirp services.
//!
//! This crate provides:
//! - Generated protobuf types and gRPC service traits ([`proto`])
//! - Bidirectional conversions between domain types and proto types
//!   ([`convert`])
//! - Request correlation-id propagation over gRPC metadata ([`context`])
//!
//! # Architecture
//!
//! Kept separate from the service crates so that consumers needing only
//! wire-format types (e.g., the SDK) can avoid pulling in store internals.

#![deny(unsafe_code)]
#![allow(clippy::result_large_err)]

/// Generated protobuf types and service traits.
pub mod proto {
    #![allow(clippy::all)]
    #![allow(missing_docs)]

    tonic::include_proto!("chirp.v1");
}

/// Bidirectional conversions between domain and protobuf types.
pub mod convert;

/// Request correlation-id extraction and injection.
pub mod context;

pub use context::{REQUEST_ID_HEADER, RequestContext};
