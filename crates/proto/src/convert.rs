//! Bidirectional conversions between domain and protobuf types.
//!
//! Proto messages use raw `i64` identifiers; the domain side uses the
//! newtypes from `chirp-types`. Sub-objects on `Follow`/`Like` stay `None`
//! in standard mode and are filled in by the expansion path.

use chirp_types::{
    Account, AccountId, Follow, Like, Page, PairId, PairQuery, Post, PostId, UniquePair,
};

use crate::proto;

impl From<UniquePair> for proto::UniquePair {
    fn from(pair: UniquePair) -> Self {
        Self {
            id: pair.id.value(),
            domain: pair.domain,
            first_elem: pair.first_elem,
            second_elem: pair.second_elem,
            created_at: pair.created_at,
        }
    }
}

impl From<proto::UniquePair> for UniquePair {
    fn from(pair: proto::UniquePair) -> Self {
        Self {
            id: PairId::new(pair.id),
            domain: pair.domain,
            first_elem: pair.first_elem,
            second_elem: pair.second_elem,
            created_at: pair.created_at,
        }
    }
}

impl From<PairQuery> for proto::PairQuery {
    fn from(query: PairQuery) -> Self {
        Self {
            domain: query.domain,
            first_elem: query.first_elem,
            second_elem: query.second_elem,
        }
    }
}

impl From<proto::PairQuery> for PairQuery {
    fn from(query: proto::PairQuery) -> Self {
        Self {
            domain: query.domain,
            first_elem: query.first_elem,
            second_elem: query.second_elem,
        }
    }
}

impl From<Page> for proto::Page {
    fn from(page: Page) -> Self {
        Self { limit: page.limit, offset: page.offset }
    }
}

impl From<proto::Page> for Page {
    fn from(page: proto::Page) -> Self {
        Self { limit: page.limit, offset: page.offset }
    }
}

/// Converts an optional proto page, defaulting to the unbounded window.
pub fn page_or_all(page: Option<proto::Page>) -> Page {
    page.map(Page::from).unwrap_or(Page::ALL)
}

impl From<Account> for proto::Account {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.value(),
            created_at: account.created_at,
            username: account.username,
        }
    }
}

impl From<proto::Account> for Account {
    fn from(account: proto::Account) -> Self {
        Self {
            id: AccountId::new(account.id),
            created_at: account.created_at,
            username: account.username,
        }
    }
}

impl From<Post> for proto::Post {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.value(),
            created_at: post.created_at,
            author_id: post.author_id.value(),
            text: post.text,
        }
    }
}

impl From<proto::Post> for Post {
    fn from(post: proto::Post) -> Self {
        Self {
            id: PostId::new(post.id),
            created_at: post.created_at,
            author_id: AccountId::new(post.author_id),
            text: post.text,
        }
    }
}

impl From<Follow> for proto::Follow {
    fn from(follow: Follow) -> Self {
        Self {
            id: follow.id.value(),
            created_at: follow.created_at,
            follower_id: follow.follower_id.value(),
            followee_id: follow.followee_id.value(),
            follower: None,
            followee: None,
        }
    }
}

impl From<Like> for proto::Like {
    fn from(like: Like) -> Self {
        Self {
            id: like.id.value(),
            created_at: like.created_at,
            account_id: like.account_id.value(),
            post_id: like.post_id.value(),
            account: None,
            post: None,
        }
    }
}
