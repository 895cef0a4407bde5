//! Identity and object expansion.
//!
//! Expanded retrievals attach the owning account or post to an entity by
//! calling the service that owns it. A sub-fetch that fails does not fail
//! the retrieval; the field is left unset and the failure logged, so one
//! slow collaborator degrades the response instead of breaking it.

use async_trait::async_trait;
use tracing::warn;

use chirp_proto::RequestContext;
use chirp_sdk::{AccountClient, PostClient, SdkError};
use chirp_types::{Account, AccountId, Post, PostId};

/// Resolves an owned record by id from its home service.
#[async_trait]
pub trait Resolver<T>: Send + Sync + 'static {
    /// Fetches the record with this id.
    async fn resolve(&self, ctx: &RequestContext, id: i64) -> Result<T, SdkError>;
}

/// Resolves `id`, degrading to `None` on failure.
pub async fn resolve_or_none<T: 'static>(
    resolver: &dyn Resolver<T>,
    ctx: &RequestContext,
    id: i64,
    what: &str,
) -> Option<T> {
    match resolver.resolve(ctx, id).await {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(request_id = %ctx, id, error = %err, "could not resolve {what}, leaving unset");
            None
        }
    }
}

/// Account resolution over gRPC.
#[derive(Clone)]
pub struct GrpcAccountResolver {
    client: AccountClient,
}

impl GrpcAccountResolver {
    /// Wraps a connected account client.
    pub fn new(client: AccountClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resolver<Account> for GrpcAccountResolver {
    async fn resolve(&self, ctx: &RequestContext, id: i64) -> Result<Account, SdkError> {
        self.client
            .retrieve_standard_account(ctx, AccountId::new(id))
            .await
    }
}

/// Post resolution over gRPC.
#[derive(Clone)]
pub struct GrpcPostResolver {
    client: PostClient,
}

impl GrpcPostResolver {
    /// Wraps a connected post client.
    pub fn new(client: PostClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resolver<Post> for GrpcPostResolver {
    async fn resolve(&self, ctx: &RequestContext, id: i64) -> Result<Post, SdkError> {
        self.client.retrieve_standard_post(ctx, PostId::new(id)).await
    }
}
