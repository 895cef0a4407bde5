//! Social service error types and their gRPC status mapping.

use snafu::{Location, Snafu};
use tonic::{Code, Status};

use chirp_types::PairId;

use crate::store::StoreError;

/// Metadata key carrying the id of the pair that blocked a create.
///
/// Mirrors the key the registry itself uses on `ALREADY_EXISTS`, so clients
/// see the same shape whether the conflict surfaced directly or through an
/// entity service.
pub const CONFLICTING_PAIR_KEY: &str = "conflicting-pair-id";

/// Errors from follow/like operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SocialError {
    /// The composite key is already reserved.
    #[snafu(display("relationship already exists (pair {existing:?})"))]
    AlreadyExists {
        /// The pair blocking the create, when the registry reported it.
        existing: Option<PairId>,
    },

    /// No entity with the requested id.
    #[snafu(display("entity not found"))]
    NotFound,

    /// The requester does not own the entity.
    #[snafu(display("requester {requester} does not own this entity"))]
    Forbidden {
        /// The account that issued the delete.
        requester: i64,
    },

    /// The registry rejected or could not serve the call.
    #[snafu(display("registry error: {message}"))]
    Registry {
        /// Description of the registry failure.
        message: String,
    },

    /// A registry write may or may not have committed.
    #[snafu(display("registry outcome unknown: {message}"))]
    Indeterminate {
        /// Description of the failed call.
        message: String,
    },

    /// The local entity store rejected a write.
    #[snafu(display("entity store error at {location}: {source}"))]
    Store {
        /// Underlying store failure.
        source: StoreError,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },
}

/// Maps a [`SocialError`] onto the wire.
///
/// `ALREADY_EXISTS` carries the conflicting pair id in metadata when known.
/// Indeterminate outcomes map to `UNKNOWN` so callers never mistake them for
/// a clean failure.
pub fn social_status(err: SocialError) -> Status {
    match err {
        SocialError::AlreadyExists { existing } => {
            let mut status = Status::already_exists("relationship already exists");
            if let Some(id) = existing
                && let Ok(value) = id.value().to_string().parse()
            {
                status.metadata_mut().insert(CONFLICTING_PAIR_KEY, value);
            }
            status
        }
        SocialError::NotFound => Status::not_found("entity not found"),
        SocialError::Forbidden { .. } => {
            Status::permission_denied("requester does not own this entity")
        }
        SocialError::Registry { message } => Status::unavailable(message),
        SocialError::Indeterminate { message } => {
            Status::new(Code::Unknown, format!("outcome unknown: {message}"))
        }
        SocialError::Store { .. } => Status::internal("entity store failure"),
    }
}
