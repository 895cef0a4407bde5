//! Two-step create/delete coordination against the registry.
//!
//! Create reserves the composite key first and only then writes the local
//! row; delete removes the local row first and only then releases the key.
//! Both orders bias failures toward "relationship missing" over "relationship
//! duplicated": a key with no row blocks re-creation until cleaned up, but a
//! row with no key could never be deleted safely.
//!
//! Compensation failures leave an orphaned reservation. Those are logged at
//! error level with the pair id so an operator (or a sweep job) can release
//! them; the originating request still reports its own outcome.

use std::sync::Arc;

use snafu::ResultExt;
use tracing::{debug, error, info};

use chirp_proto::RequestContext;

use crate::error::{ForbiddenSnafu, SocialError, StoreSnafu};
use crate::registry::{Registry, RegistryCallError};
use crate::store::{EntityRecord, EntityTable};

/// Sequences entity writes with registry reservations for one key domain.
pub struct PairCoordinator<G> {
    registry: Arc<G>,
    domain: &'static str,
}

impl<G> PairCoordinator<G> {
    /// Creates a coordinator for `domain`.
    pub fn new(registry: Arc<G>, domain: &'static str) -> Self {
        Self { registry, domain }
    }
}

impl<G: Registry> PairCoordinator<G> {
    /// Creates an entity backed by a fresh reservation on
    /// `(domain, subject, object)`.
    ///
    /// `build` receives the allocated row id, the reservation id, and the
    /// reservation's creation time, so the row and the pair share one
    /// timestamp. If the local insert fails the reservation is released
    /// again; if that release also fails the reservation is orphaned and
    /// logged.
    pub async fn create<R, F>(
        &self,
        ctx: &RequestContext,
        table: &EntityTable<R>,
        subject: i64,
        object: i64,
        build: F,
    ) -> Result<R, SocialError>
    where
        R: EntityRecord,
        F: FnOnce(i64, chirp_types::PairId, i64) -> R,
    {
        let pair = match self.registry.add(ctx, self.domain, subject, object).await {
            Ok(pair) => pair,
            Err(RegistryCallError::AlreadyExists { existing }) => {
                debug!(
                    request_id = %ctx,
                    domain = self.domain,
                    subject,
                    object,
                    "create rejected, key already reserved"
                );
                return Err(SocialError::AlreadyExists { existing });
            }
            Err(err) => return Err(registry_error(err)),
        };

        let row = build(table.allocate_id(), pair.id, pair.created_at);
        let row_id = row.id();

        if let Err(source) = table.insert(row.clone()) {
            // Compensate: the reservation must not outlive the failed row.
            match self.registry.remove(ctx, pair.id).await {
                Ok(()) | Err(RegistryCallError::NotFound) => {
                    debug!(
                        request_id = %ctx,
                        pair_id = %pair.id,
                        "released reservation after failed insert"
                    );
                }
                Err(err) => {
                    error!(
                        request_id = %ctx,
                        domain = self.domain,
                        pair_id = %pair.id,
                        subject,
                        object,
                        error = %err,
                        "orphaned reservation: compensating remove failed"
                    );
                }
            }
            return Err(source).context(StoreSnafu);
        }

        info!(
            request_id = %ctx,
            domain = self.domain,
            id = row_id,
            pair_id = %pair.id,
            subject,
            object,
            "created entity"
        );
        Ok(row)
    }

    /// Deletes the entity with `id`, releasing its reservation.
    ///
    /// Only the entity's subject may delete it. The local row is removed
    /// first; a failed registry release orphans the reservation but the
    /// delete itself still succeeds, since the entity is gone.
    pub async fn delete<R>(
        &self,
        ctx: &RequestContext,
        table: &EntityTable<R>,
        requester: i64,
        id: i64,
    ) -> Result<(), SocialError>
    where
        R: EntityRecord,
    {
        let row = table.get(id).ok_or(SocialError::NotFound)?;
        if row.subject() != requester {
            return ForbiddenSnafu { requester }.fail();
        }

        // Row goes first so a crash between the two steps can only leave an
        // extra reservation, never a row without one.
        if table.remove(id).is_none() {
            return Err(SocialError::NotFound);
        }

        match self.registry.remove(ctx, row.pair_id()).await {
            Ok(()) | Err(RegistryCallError::NotFound) => {}
            Err(err) => {
                error!(
                    request_id = %ctx,
                    domain = self.domain,
                    id,
                    pair_id = %row.pair_id(),
                    error = %err,
                    "orphaned reservation: release after delete failed"
                );
            }
        }

        info!(request_id = %ctx, domain = self.domain, id, "deleted entity");
        Ok(())
    }

    /// Whether `(domain, subject, object)` is currently reserved.
    ///
    /// Answers from the registry, the single source of truth for the key.
    /// Absence is a `false`, not an error.
    pub async fn key_reserved(
        &self,
        ctx: &RequestContext,
        subject: i64,
        object: i64,
    ) -> Result<bool, SocialError> {
        match self.registry.find(ctx, self.domain, subject, object).await {
            Ok(_) => Ok(true),
            Err(RegistryCallError::NotFound) => Ok(false),
            Err(err) => Err(registry_error(err)),
        }
    }
}

fn registry_error(err: RegistryCallError) -> SocialError {
    match err {
        RegistryCallError::AlreadyExists { existing } => SocialError::AlreadyExists { existing },
        RegistryCallError::NotFound => SocialError::NotFound,
        RegistryCallError::Unavailable { message } => SocialError::Registry { message },
        RegistryCallError::Indeterminate { message } => SocialError::Indeterminate { message },
    }
}
