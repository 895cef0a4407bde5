//! In-memory entity tables for the social services.
//!
//! The table only stores an entity's own fields; the uniqueness of the
//! underlying relationship is enforced by the registry, never here. Rows are
//! keyed by a store-assigned id and listed most recent first with id as the
//! tie-break, so pagination over concurrent inserts stays deterministic.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use parking_lot::RwLock;
use snafu::Snafu;

use chirp_types::{EntityQuery, Page, PairId};

/// Failure from an entity table write.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// The table refused the insert.
    #[snafu(display("entity store rejected insert"))]
    InsertRejected,
}

/// A row a social service can store and coordinate.
///
/// `subject` and `object` are the two halves of the composite key the row
/// reserves in the registry (follower/followee for follows, account/post for
/// likes). `subject` is also the owner for authorization purposes.
pub trait EntityRecord: Clone + Send + Sync + 'static {
    /// Store-assigned identifier.
    fn id(&self) -> i64;
    /// Creation time, Unix seconds.
    fn created_at(&self) -> i64;
    /// First half of the composite key; the owning account.
    fn subject(&self) -> i64;
    /// Second half of the composite key.
    fn object(&self) -> i64;
    /// The registry reservation backing this row.
    fn pair_id(&self) -> PairId;
}

/// An in-memory table of entity rows.
///
/// Internally synchronized; handed around as `Arc<EntityTable<R>>`.
pub struct EntityTable<R> {
    rows: RwLock<BTreeMap<i64, R>>,
    next_id: AtomicI64,
    /// Number of upcoming inserts to reject, for fault injection in tests
    /// and harnesses.
    fail_inserts: AtomicUsize,
}

impl<R> Default for EntityTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> EntityTable<R> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            fail_inserts: AtomicUsize::new(0),
        }
    }

    /// Reserves the next row id.
    pub fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Makes the next `n` inserts fail with [`StoreError::InsertRejected`].
    pub fn fail_next_inserts(&self, n: usize) {
        self.fail_inserts.store(n, Ordering::SeqCst);
    }

    fn take_failure_token(&self) -> bool {
        self.fail_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl<R: EntityRecord> EntityTable<R> {
    /// Inserts a row under its own id.
    pub fn insert(&self, row: R) -> Result<(), StoreError> {
        if self.take_failure_token() {
            return InsertRejectedSnafu.fail();
        }
        self.rows.write().insert(row.id(), row);
        Ok(())
    }

    /// Returns the row with this id.
    pub fn get(&self, id: i64) -> Option<R> {
        self.rows.read().get(&id).cloned()
    }

    /// Removes and returns the row with this id.
    pub fn remove(&self, id: i64) -> Option<R> {
        self.rows.write().remove(&id)
    }

    /// Lists matching rows, most recent first, windowed by `page`.
    pub fn fetch(&self, query: EntityQuery, page: Page) -> Vec<R> {
        let rows = self.rows.read();
        let mut matched: Vec<R> = rows
            .values()
            .filter(|r| Self::matches(&query, r))
            .cloned()
            .collect();
        drop(rows);
        matched.sort_by(|a, b| {
            (b.created_at(), b.id()).cmp(&(a.created_at(), a.id()))
        });
        page.apply(matched)
    }

    /// Counts matching rows.
    pub fn count(&self, query: EntityQuery) -> i64 {
        self.rows
            .read()
            .values()
            .filter(|r| Self::matches(&query, r))
            .count() as i64
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn matches(query: &EntityQuery, row: &R) -> bool {
        query.subject.is_none_or(|v| row.subject() == v)
            && query.object.is_none_or(|v| row.object() == v)
    }
}

// ===== Record impls =====

impl EntityRecord for chirp_types::Follow {
    fn id(&self) -> i64 {
        self.id.value()
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn subject(&self) -> i64 {
        self.follower_id.value()
    }

    fn object(&self) -> i64 {
        self.followee_id.value()
    }

    fn pair_id(&self) -> PairId {
        self.pair_id
    }
}

impl EntityRecord for chirp_types::Like {
    fn id(&self) -> i64 {
        self.id.value()
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn subject(&self) -> i64 {
        self.account_id.value()
    }

    fn object(&self) -> i64 {
        self.post_id.value()
    }

    fn pair_id(&self) -> PairId {
        self.pair_id
    }
}
