//! Type-safe identifier newtypes.
//!
//! Every service passes 64-bit identifiers across process boundaries; the
//! newtypes here keep a follow id from being handed to an API expecting a
//! registry pair id.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `i64` for type-safe identifiers.
///
/// Each generated type provides:
/// - Standard derives: Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord
/// - Serde with `#[serde(transparent)]` for wire format compatibility
/// - `From<i64>` / `Into<i64>` conversions
/// - `Display` with a semantic prefix (e.g., `pair:123`)
/// - `new()` constructor and `value()` accessor
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:expr
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates a new identifier from a raw value.
            #[inline]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw numeric value.
            #[inline]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            #[inline]
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a registry pair record, assigned by the registry on
    /// insert and never reused while the record is live.
    ///
    /// Formats with `pair:` prefix: `pair:42`.
    PairId, "pair"
);

define_id!(
    /// Identifier of an account, owned by the account service.
    ///
    /// Formats with `acct:` prefix: `acct:7`.
    AccountId, "acct"
);

define_id!(
    /// Identifier of a post, owned by the post service.
    ///
    /// Formats with `post:` prefix: `post:19`.
    PostId, "post"
);

define_id!(
    /// Identifier of a follow edge, owned by the follow service's store.
    ///
    /// Formats with `follow:` prefix: `follow:3`.
    FollowId, "follow"
);

define_id!(
    /// Identifier of a like, owned by the like service's store.
    ///
    /// Formats with `like:` prefix: `like:11`.
    LikeId, "like"
);
