//! Error taxonomy for registry operations, using snafu.
//!
//! Two kinds are expected and user-facing: `AlreadyExists` (duplicate key,
//! never retried) and the not-found variants. Everything else a caller can
//! see comes from the transport layer and is classified on the client side
//! (see `chirp-sdk`), where a failed non-idempotent call must surface as
//! indeterminate rather than plain failure.

use snafu::Snafu;

use crate::ids::PairId;

/// Unified result type for registry store operations.
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

/// Errors raised by the registry store.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryError {
    /// A live record already holds this composite key. Carries the
    /// conflicting record's id so callers can report or inspect it.
    #[snafu(display(
        "pair ({domain}, {first_elem}, {second_elem}) already exists as {existing}"
    ))]
    AlreadyExists {
        /// Key-space namespace.
        domain: String,
        /// First component of the composite key.
        first_elem: i64,
        /// Second component of the composite key.
        second_elem: i64,
        /// Identifier of the conflicting live record.
        existing: PairId,
    },

    /// No record with this id. Raised by `get` and by `remove` (removal is
    /// not idempotent; compensating callers treat this as success).
    #[snafu(display("pair {id} not found"))]
    NotFound {
        /// The missing record's id.
        id: PairId,
    },

    /// No live record holds this composite key. Raised by `find`.
    #[snafu(display("no pair ({domain}, {first_elem}, {second_elem})"))]
    KeyNotFound {
        /// Key-space namespace.
        domain: String,
        /// First component of the composite key.
        first_elem: i64,
        /// Second component of the composite key.
        second_elem: i64,
    },
}

impl RegistryError {
    /// The conflicting record's id, if this is a duplicate-key error.
    #[must_use]
    pub fn conflicting_pair(&self) -> Option<PairId> {
        match self {
            Self::AlreadyExists { existing, .. } => Some(*existing),
            _ => None,
        }
    }
}
