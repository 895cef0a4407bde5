//! Record structures for registry pairs and social entities.
//!
//! Timestamps are Unix seconds; within one second the ordering tie is broken
//! by id, so list results stay deterministic.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, FollowId, LikeId, PairId, PostId};

/// Returns the current time as Unix seconds.
pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// A composite-key reservation owned by the registry service.
///
/// Among live records, `(domain, first_elem, second_elem)` is unique. Removal
/// is a hard delete; a removed key is immediately available for reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniquePair {
    /// Registry-assigned identifier, immutable.
    pub id: PairId,
    /// Namespace label partitioning the key space (e.g. `"follow"`).
    pub domain: String,
    /// First component of the composite key.
    pub first_elem: i64,
    /// Second component of the composite key.
    pub second_elem: i64,
    /// Creation time, Unix seconds, immutable.
    pub created_at: i64,
}

/// A follow edge owned by the follow service.
///
/// Each live follow has exactly one registry pair in domain `"follow"` with
/// key `(follower_id, followee_id)`; `pair_id` records it so deletion never
/// needs a second registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    /// Store-assigned identifier.
    pub id: FollowId,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// The account doing the following.
    pub follower_id: AccountId,
    /// The account being followed.
    pub followee_id: AccountId,
    /// The registry reservation backing this edge.
    pub pair_id: PairId,
}

/// A like owned by the like service.
///
/// Backed by a registry pair in domain `"like"` with key
/// `(account_id, post_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    /// Store-assigned identifier.
    pub id: LikeId,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// The account that liked the post.
    pub account_id: AccountId,
    /// The post that was liked.
    pub post_id: PostId,
    /// The registry reservation backing this like.
    pub pair_id: PairId,
}

/// An account, owned by the external account service.
///
/// Only the fields needed for identity expansion are modeled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Unique login name.
    pub username: String,
}

/// A post, owned by the external post service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post identifier.
    pub id: PostId,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Author account.
    pub author_id: AccountId,
    /// Post body.
    pub text: String,
}
