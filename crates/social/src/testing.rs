//! In-process fakes for coordination tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tonic::Code;

use chirp_proto::RequestContext;
use chirp_sdk::SdkError;
use chirp_types::{Account, PairId, Post, UniquePair, now_secs};

use crate::registry::{Registry, RegistryCallError};
use crate::resolver::Resolver;

#[derive(Default)]
struct FakeInner {
    pairs: HashMap<i64, UniquePair>,
    index: HashMap<(String, i64, i64), i64>,
    next_id: i64,
}

/// Registry fake with the same uniqueness semantics as the real service,
/// plus per-call failure injection.
#[derive(Default)]
pub(crate) struct FakeRegistry {
    inner: Mutex<FakeInner>,
    fail_adds: AtomicUsize,
    indeterminate_adds: AtomicUsize,
    fail_removes: AtomicUsize,
}

impl FakeRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The next `n` adds fail as unavailable.
    pub(crate) fn fail_next_adds(&self, n: usize) {
        self.fail_adds.store(n, Ordering::SeqCst);
    }

    /// The next `n` adds fail with an unknown outcome.
    pub(crate) fn indeterminate_next_adds(&self, n: usize) {
        self.indeterminate_adds.store(n, Ordering::SeqCst);
    }

    /// The next `n` removes fail as unavailable.
    pub(crate) fn fail_next_removes(&self, n: usize) {
        self.fail_removes.store(n, Ordering::SeqCst);
    }

    pub(crate) fn contains(&self, id: PairId) -> bool {
        self.inner.lock().pairs.contains_key(&id.value())
    }

    pub(crate) fn get(&self, id: PairId) -> Option<UniquePair> {
        self.inner.lock().pairs.get(&id.value()).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().pairs.len()
    }

    fn take_token(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl Registry for FakeRegistry {
    async fn add(
        &self,
        _ctx: &RequestContext,
        domain: &str,
        first_elem: i64,
        second_elem: i64,
    ) -> Result<UniquePair, RegistryCallError> {
        if Self::take_token(&self.fail_adds) {
            return Err(RegistryCallError::Unavailable { message: "injected".into() });
        }
        if Self::take_token(&self.indeterminate_adds) {
            return Err(RegistryCallError::Indeterminate { message: "injected".into() });
        }

        let mut inner = self.inner.lock();
        let key = (domain.to_owned(), first_elem, second_elem);
        if let Some(existing) = inner.index.get(&key) {
            return Err(RegistryCallError::AlreadyExists {
                existing: Some(PairId::new(*existing)),
            });
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let pair = UniquePair {
            id: PairId::new(id),
            domain: domain.to_owned(),
            first_elem,
            second_elem,
            created_at: now_secs(),
        };
        inner.index.insert(key, id);
        inner.pairs.insert(id, pair.clone());
        Ok(pair)
    }

    async fn remove(&self, _ctx: &RequestContext, id: PairId) -> Result<(), RegistryCallError> {
        if Self::take_token(&self.fail_removes) {
            return Err(RegistryCallError::Unavailable { message: "injected".into() });
        }

        let mut inner = self.inner.lock();
        let Some(pair) = inner.pairs.remove(&id.value()) else {
            return Err(RegistryCallError::NotFound);
        };
        inner
            .index
            .remove(&(pair.domain, pair.first_elem, pair.second_elem));
        Ok(())
    }

    async fn find(
        &self,
        _ctx: &RequestContext,
        domain: &str,
        first_elem: i64,
        second_elem: i64,
    ) -> Result<UniquePair, RegistryCallError> {
        let inner = self.inner.lock();
        inner
            .index
            .get(&(domain.to_owned(), first_elem, second_elem))
            .and_then(|id| inner.pairs.get(id))
            .cloned()
            .ok_or(RegistryCallError::NotFound)
    }
}

/// Resolver backed by a fixed map; ids not in the map fail as not found.
pub(crate) struct FixedResolver<T> {
    items: HashMap<i64, T>,
}

impl<T> FixedResolver<T> {
    pub(crate) fn new(items: impl IntoIterator<Item = (i64, T)>) -> Self {
        Self { items: items.into_iter().collect() }
    }

    pub(crate) fn empty() -> Self {
        Self { items: HashMap::new() }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Resolver<T> for FixedResolver<T> {
    async fn resolve(&self, _ctx: &RequestContext, id: i64) -> Result<T, SdkError> {
        self.items.get(&id).cloned().ok_or_else(|| SdkError::Rpc {
            code: Code::NotFound,
            message: format!("no record {id}"),
            conflicting_pair: None,
        })
    }
}

pub(crate) fn account(id: i64, username: &str) -> Account {
    Account {
        id: chirp_types::AccountId::new(id),
        created_at: 100,
        username: username.to_owned(),
    }
}

pub(crate) fn post(id: i64, author: i64, text: &str) -> Post {
    Post {
        id: chirp_types::PostId::new(id),
        created_at: 100,
        author_id: chirp_types::AccountId::new(author),
        text: text.to_owned(),
    }
}
