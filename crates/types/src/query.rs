//! The query and pagination contract shared by every listing operation.
//!
//! All listing endpoints order by `created_at` descending with ties broken by
//! id descending, then apply the [`Page`] window. Element filters are exact
//! matches where a present zero is a real value, distinct from "unset".

use serde::{Deserialize, Serialize};

use crate::types::UniquePair;

/// Filter over registry records. `domain` is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairQuery {
    /// Key-space namespace to search, always required.
    pub domain: String,
    /// Exact-match filter on the first key component.
    pub first_elem: Option<i64>,
    /// Exact-match filter on the second key component.
    pub second_elem: Option<i64>,
}

impl PairQuery {
    /// Query matching every record in a domain.
    pub fn domain(domain: impl Into<String>) -> Self {
        Self { domain: domain.into(), first_elem: None, second_elem: None }
    }

    /// Restricts the query to records whose first element equals `value`.
    #[must_use]
    pub fn with_first_elem(mut self, value: i64) -> Self {
        self.first_elem = Some(value);
        self
    }

    /// Restricts the query to records whose second element equals `value`.
    #[must_use]
    pub fn with_second_elem(mut self, value: i64) -> Self {
        self.second_elem = Some(value);
        self
    }

    /// Whether `pair` satisfies every present filter.
    pub fn matches(&self, pair: &UniquePair) -> bool {
        pair.domain == self.domain
            && self.first_elem.is_none_or(|v| pair.first_elem == v)
            && self.second_elem.is_none_or(|v| pair.second_elem == v)
    }
}

/// Filter over an entity service's own store, in terms of the two halves of
/// the composite key (e.g. follower/followee for follows).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityQuery {
    /// Exact-match filter on the subject half of the key.
    pub subject: Option<i64>,
    /// Exact-match filter on the object half of the key.
    pub object: Option<i64>,
}

impl EntityQuery {
    /// Query matching every record.
    pub const ALL: Self = Self { subject: None, object: None };

    /// Restricts the query to records with this subject.
    #[must_use]
    pub fn with_subject(mut self, value: i64) -> Self {
        self.subject = Some(value);
        self
    }

    /// Restricts the query to records with this object.
    #[must_use]
    pub fn with_object(mut self, value: i64) -> Self {
        self.object = Some(value);
        self
    }
}

/// Pagination window applied after ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Maximum number of records to return; `-1` means unbounded.
    pub limit: i32,
    /// Number of leading records to skip after ordering.
    pub offset: i32,
}

impl Page {
    /// The unbounded window.
    pub const ALL: Self = Self { limit: -1, offset: 0 };

    /// A window of `limit` records starting at `offset`.
    pub const fn new(limit: i32, offset: i32) -> Self {
        Self { limit, offset }
    }

    /// Applies the window to an already-ordered result set.
    ///
    /// Any negative limit is treated as unbounded; a negative offset as zero.
    pub fn apply<T>(self, items: Vec<T>) -> Vec<T> {
        let offset = self.offset.max(0) as usize;
        let iter = items.into_iter().skip(offset);
        if self.limit < 0 {
            iter.collect()
        } else {
            iter.take(self.limit as usize).collect()
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::ALL
    }
}
