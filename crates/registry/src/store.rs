//! In-memory composite-key store with a unique index.
//!
//! A single `RwLock` write guard serializes every mutation, so the
//! check-then-insert in [`PairStore::add`] is linearizable with respect to
//! concurrent adds of the same key - the storage-level equivalent of a
//! unique index. Reads take the shared side of the lock.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use chirp_types::error::{AlreadyExistsSnafu, KeyNotFoundSnafu, NotFoundSnafu};
use chirp_types::{Page, PairId, PairQuery, Result, UniquePair, now_secs};

/// Composite key of a live reservation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairKey {
    domain: String,
    first_elem: i64,
    second_elem: i64,
}

/// Mutable store state, guarded by one lock.
struct Inner {
    /// Live records by id.
    pairs: BTreeMap<PairId, UniquePair>,
    /// Unique index over the composite key.
    index: HashMap<PairKey, PairId>,
    /// Next id to assign.
    next_id: i64,
}

/// The registry's record store.
pub struct PairStore {
    inner: RwLock<Inner>,
}

impl PairStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                pairs: BTreeMap::new(),
                index: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Atomically tests for a live record with this key and inserts if absent.
    ///
    /// On conflict fails with `AlreadyExists` carrying the conflicting
    /// record's id; nothing is written in that case.
    pub fn add(&self, domain: &str, first_elem: i64, second_elem: i64) -> Result<UniquePair> {
        let key = PairKey {
            domain: domain.to_owned(),
            first_elem,
            second_elem,
        };

        let mut inner = self.inner.write();
        if let Some(existing) = inner.index.get(&key) {
            return AlreadyExistsSnafu {
                domain: domain.to_owned(),
                first_elem,
                second_elem,
                existing: *existing,
            }
            .fail();
        }

        let id = PairId::new(inner.next_id);
        inner.next_id += 1;

        let pair = UniquePair {
            id,
            domain: domain.to_owned(),
            first_elem,
            second_elem,
            created_at: now_secs(),
        };
        inner.index.insert(key, id);
        inner.pairs.insert(id, pair.clone());
        Ok(pair)
    }

    /// Returns the record with this id.
    pub fn get(&self, id: PairId) -> Result<UniquePair> {
        self.inner
            .read()
            .pairs
            .get(&id)
            .cloned()
            .ok_or_else(|| NotFoundSnafu { id }.build())
    }

    /// Hard-deletes the record with this id, freeing its key for reuse.
    ///
    /// Not idempotent: fails with `NotFound` if the record is already gone.
    /// Compensating callers must treat that as success - the desired
    /// end-state already holds.
    pub fn remove(&self, id: PairId) -> Result<()> {
        let mut inner = self.inner.write();
        let pair = inner.pairs.remove(&id).ok_or_else(|| NotFoundSnafu { id }.build())?;
        inner.index.remove(&PairKey {
            domain: pair.domain,
            first_elem: pair.first_elem,
            second_elem: pair.second_elem,
        });
        Ok(())
    }

    /// Point lookup by composite key, without mutating.
    pub fn find(&self, domain: &str, first_elem: i64, second_elem: i64) -> Result<UniquePair> {
        let key = PairKey {
            domain: domain.to_owned(),
            first_elem,
            second_elem,
        };

        let inner = self.inner.read();
        let id = inner.index.get(&key).ok_or_else(|| {
            KeyNotFoundSnafu { domain: domain.to_owned(), first_elem, second_elem }.build()
        })?;
        // Index entries always point at a live record.
        inner
            .pairs
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundSnafu { id: *id }.build())
    }

    /// Returns the matching records ordered by `created_at` descending, ties
    /// broken by id descending, windowed by `page`.
    pub fn fetch(&self, query: &PairQuery, page: Page) -> Vec<UniquePair> {
        let inner = self.inner.read();
        let mut matching: Vec<UniquePair> =
            inner.pairs.values().filter(|p| query.matches(p)).cloned().collect();
        matching.sort_by(|a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
        });
        page.apply(matching)
    }

    /// Counts the live records matching `query`.
    pub fn count(&self, query: &PairQuery) -> i64 {
        let inner = self.inner.read();
        inner.pairs.values().filter(|p| query.matches(p)).count() as i64
    }

    /// Number of live records, across all domains.
    pub fn len(&self) -> usize {
        self.inner.read().pairs.len()
    }

    /// Whether the store holds no live records.
    pub fn is_empty(&self) -> bool {
        self.inner.read().pairs.is_empty()
    }
}

impl Default for PairStore {
    fn default() -> Self {
        Self::new()
    }
}
