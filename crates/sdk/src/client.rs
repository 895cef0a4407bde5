//! Typed client implementations.
//!
//! Each client wraps a generated tonic client over a single channel with
//! bounded connect/call timeouts. Read-only operations go through the
//! configured retry policy; mutating operations never do - their transport
//! failures are classified as indeterminate instead (see
//! [`SdkError::Indeterminate`]).

use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Request};

use chirp_proto::context::{RequestContext, inject_into_metadata};
use chirp_proto::proto;
use chirp_proto::proto::account_service_client::AccountServiceClient;
use chirp_proto::proto::follow_service_client::FollowServiceClient;
use chirp_proto::proto::like_service_client::LikeServiceClient;
use chirp_proto::proto::post_service_client::PostServiceClient;
use chirp_proto::proto::registry_service_client::RegistryServiceClient;
use chirp_types::{
    Account, AccountId, FollowId, LikeId, Page, PairId, PairQuery, Post, PostId, UniquePair,
};

use crate::config::ClientConfig;
use crate::error::{InvalidEndpointSnafu, Result, SdkError};
use crate::retry::{RetryPolicy, with_retry};

/// Opens a channel with the configured timeouts.
async fn connect_channel(endpoint: &str, config: &ClientConfig) -> Result<Channel> {
    let endpoint = Endpoint::from_shared(endpoint.to_owned())
        .map_err(|e| {
            InvalidEndpointSnafu { endpoint: endpoint.to_owned(), message: e.to_string() }.build()
        })?
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout);

    Ok(endpoint.connect().await?)
}

/// Builds a channel that connects on first use.
fn lazy_channel(endpoint: &str, config: &ClientConfig) -> Result<Channel> {
    let endpoint = Endpoint::from_shared(endpoint.to_owned())
        .map_err(|e| {
            InvalidEndpointSnafu { endpoint: endpoint.to_owned(), message: e.to_string() }.build()
        })?
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout);

    Ok(endpoint.connect_lazy())
}

/// Builds a request carrying the correlation id.
fn with_context<T>(message: T, ctx: &RequestContext) -> Request<T> {
    let mut request = Request::new(message);
    inject_into_metadata(request.metadata_mut(), ctx);
    request
}

/// Error for a well-formed status but a response missing a required field.
fn missing_field(what: &str) -> SdkError {
    SdkError::Rpc {
        code: Code::Internal,
        message: format!("server response missing {what}"),
        conflicting_pair: None,
    }
}

// ============================================================================
// Registry client
// ============================================================================

/// Client for the uniqueness registry.
#[derive(Clone)]
pub struct RegistryClient {
    inner: RegistryServiceClient<Channel>,
    retry: RetryPolicy,
}

impl RegistryClient {
    /// Connects to a registry service.
    pub async fn connect(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = connect_channel(endpoint, config).await?;
        Ok(Self {
            inner: RegistryServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Like [`Self::connect`] but defers the connection to first use.
    pub fn connect_lazy(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = lazy_channel(endpoint, config)?;
        Ok(Self {
            inner: RegistryServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Reserves a composite key.
    ///
    /// Not retried: a transport failure here is an unknown outcome and is
    /// returned as [`SdkError::Indeterminate`].
    pub async fn add(
        &self,
        ctx: &RequestContext,
        domain: &str,
        first_elem: i64,
        second_elem: i64,
    ) -> Result<UniquePair> {
        let mut client = self.inner.clone();
        let response = client
            .add(with_context(
                proto::AddPairRequest {
                    domain: domain.to_owned(),
                    first_elem,
                    second_elem,
                },
                ctx,
            ))
            .await
            .map_err(|s| SdkError::from_status_nonidempotent(s, "registry add"))?;

        response
            .into_inner()
            .pair
            .map(Into::into)
            .ok_or_else(|| missing_field("pair"))
    }

    /// Returns the pair with this id.
    pub async fn get(&self, ctx: &RequestContext, id: PairId) -> Result<UniquePair> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .get(with_context(proto::GetPairRequest { id: id.value() }, ctx))
                    .await?;
                response
                    .into_inner()
                    .pair
                    .map(Into::into)
                    .ok_or_else(|| missing_field("pair"))
            }
        })
        .await
    }

    /// Removes the pair with this id.
    ///
    /// Not idempotent and not retried; `NOT_FOUND` is reported as-is so a
    /// compensating caller can decide to treat it as success.
    pub async fn remove(&self, ctx: &RequestContext, id: PairId) -> Result<()> {
        let mut client = self.inner.clone();
        client
            .remove(with_context(proto::RemovePairRequest { id: id.value() }, ctx))
            .await
            .map_err(|s| SdkError::from_status_nonidempotent(s, "registry remove"))?;
        Ok(())
    }

    /// Point lookup by composite key.
    pub async fn find(
        &self,
        ctx: &RequestContext,
        domain: &str,
        first_elem: i64,
        second_elem: i64,
    ) -> Result<UniquePair> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            let domain = domain.to_owned();
            async move {
                let response = client
                    .find(with_context(
                        proto::FindPairRequest { domain, first_elem, second_elem },
                        ctx,
                    ))
                    .await?;
                response
                    .into_inner()
                    .pair
                    .map(Into::into)
                    .ok_or_else(|| missing_field("pair"))
            }
        })
        .await
    }

    /// Lists pairs matching the query, ordered most recent first.
    pub async fn fetch(
        &self,
        ctx: &RequestContext,
        query: PairQuery,
        page: Page,
    ) -> Result<Vec<UniquePair>> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            let query = query.clone();
            async move {
                let response = client
                    .fetch(with_context(
                        proto::FetchPairsRequest {
                            query: Some(query.into()),
                            page: Some(page.into()),
                        },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().pairs.into_iter().map(Into::into).collect())
            }
        })
        .await
    }

    /// Counts pairs matching the query.
    pub async fn count(&self, ctx: &RequestContext, query: PairQuery) -> Result<i64> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            let query = query.clone();
            async move {
                let response = client
                    .count(with_context(
                        proto::CountPairsRequest { query: Some(query.into()) },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().count)
            }
        })
        .await
    }
}

// ============================================================================
// Follow client
// ============================================================================

/// Client for the follow service.
#[derive(Clone)]
pub struct FollowClient {
    inner: FollowServiceClient<Channel>,
    retry: RetryPolicy,
}

impl FollowClient {
    /// Connects to a follow service.
    pub async fn connect(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = connect_channel(endpoint, config).await?;
        Ok(Self {
            inner: FollowServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Like [`Self::connect`] but defers the connection to first use.
    pub fn connect_lazy(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = lazy_channel(endpoint, config)?;
        Ok(Self {
            inner: FollowServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Creates a follow edge from `requester` to `followee`.
    pub async fn follow_account(
        &self,
        ctx: &RequestContext,
        requester: AccountId,
        followee: AccountId,
    ) -> Result<proto::Follow> {
        let mut client = self.inner.clone();
        let response = client
            .follow_account(with_context(
                proto::FollowAccountRequest {
                    requester_id: requester.value(),
                    account_id: followee.value(),
                },
                ctx,
            ))
            .await
            .map_err(|s| SdkError::from_status_nonidempotent(s, "follow create"))?;

        response.into_inner().follow.ok_or_else(|| missing_field("follow"))
    }

    /// Returns a follow's own fields.
    pub async fn retrieve_standard_follow(
        &self,
        ctx: &RequestContext,
        id: FollowId,
    ) -> Result<proto::Follow> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .retrieve_standard_follow(with_context(
                        proto::RetrieveStandardFollowRequest { follow_id: id.value() },
                        ctx,
                    ))
                    .await?;
                response.into_inner().follow.ok_or_else(|| missing_field("follow"))
            }
        })
        .await
    }

    /// Returns a follow with both accounts resolved (where possible).
    pub async fn retrieve_expanded_follow(
        &self,
        ctx: &RequestContext,
        id: FollowId,
    ) -> Result<proto::Follow> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .retrieve_expanded_follow(with_context(
                        proto::RetrieveExpandedFollowRequest { follow_id: id.value() },
                        ctx,
                    ))
                    .await?;
                response.into_inner().follow.ok_or_else(|| missing_field("follow"))
            }
        })
        .await
    }

    /// Deletes a follow edge; `requester` must be its follower.
    pub async fn delete_follow(
        &self,
        ctx: &RequestContext,
        requester: AccountId,
        id: FollowId,
    ) -> Result<()> {
        let mut client = self.inner.clone();
        client
            .delete_follow(with_context(
                proto::DeleteFollowRequest {
                    requester_id: requester.value(),
                    follow_id: id.value(),
                },
                ctx,
            ))
            .await
            .map_err(|s| SdkError::from_status_nonidempotent(s, "follow delete"))?;
        Ok(())
    }

    /// Lists follows matching the query, expanded, most recent first.
    pub async fn list_follows(
        &self,
        ctx: &RequestContext,
        query: proto::FollowQuery,
        page: Page,
    ) -> Result<Vec<proto::Follow>> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            let query = query.clone();
            async move {
                let response = client
                    .list_follows(with_context(
                        proto::ListFollowsRequest {
                            query: Some(query),
                            page: Some(page.into()),
                        },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().follows)
            }
        })
        .await
    }

    /// Whether `follower` follows `followee`.
    pub async fn check_follow(
        &self,
        ctx: &RequestContext,
        follower: AccountId,
        followee: AccountId,
    ) -> Result<bool> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .check_follow(with_context(
                        proto::CheckFollowRequest {
                            follower_id: follower.value(),
                            followee_id: followee.value(),
                        },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().follows)
            }
        })
        .await
    }

    /// Number of accounts following `account`.
    pub async fn count_followers(&self, ctx: &RequestContext, account: AccountId) -> Result<i64> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .count_followers(with_context(
                        proto::CountFollowersRequest { account_id: account.value() },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().count)
            }
        })
        .await
    }

    /// Number of accounts `account` follows.
    pub async fn count_followees(&self, ctx: &RequestContext, account: AccountId) -> Result<i64> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .count_followees(with_context(
                        proto::CountFolloweesRequest { account_id: account.value() },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().count)
            }
        })
        .await
    }
}

// ============================================================================
// Like client
// ============================================================================

/// Client for the like service.
#[derive(Clone)]
pub struct LikeClient {
    inner: LikeServiceClient<Channel>,
    retry: RetryPolicy,
}

impl LikeClient {
    /// Connects to a like service.
    pub async fn connect(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = connect_channel(endpoint, config).await?;
        Ok(Self {
            inner: LikeServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Like [`Self::connect`] but defers the connection to first use.
    pub fn connect_lazy(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = lazy_channel(endpoint, config)?;
        Ok(Self {
            inner: LikeServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Likes a post on behalf of `requester`.
    pub async fn like_post(
        &self,
        ctx: &RequestContext,
        requester: AccountId,
        post: PostId,
    ) -> Result<proto::Like> {
        let mut client = self.inner.clone();
        let response = client
            .like_post(with_context(
                proto::LikePostRequest {
                    requester_id: requester.value(),
                    post_id: post.value(),
                },
                ctx,
            ))
            .await
            .map_err(|s| SdkError::from_status_nonidempotent(s, "like create"))?;

        response.into_inner().like.ok_or_else(|| missing_field("like"))
    }

    /// Returns a like's own fields.
    pub async fn retrieve_standard_like(
        &self,
        ctx: &RequestContext,
        id: LikeId,
    ) -> Result<proto::Like> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .retrieve_standard_like(with_context(
                        proto::RetrieveStandardLikeRequest { like_id: id.value() },
                        ctx,
                    ))
                    .await?;
                response.into_inner().like.ok_or_else(|| missing_field("like"))
            }
        })
        .await
    }

    /// Returns a like with its account and post resolved (where possible).
    pub async fn retrieve_expanded_like(
        &self,
        ctx: &RequestContext,
        id: LikeId,
    ) -> Result<proto::Like> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .retrieve_expanded_like(with_context(
                        proto::RetrieveExpandedLikeRequest { like_id: id.value() },
                        ctx,
                    ))
                    .await?;
                response.into_inner().like.ok_or_else(|| missing_field("like"))
            }
        })
        .await
    }

    /// Deletes a like; `requester` must be the liking account.
    pub async fn delete_like(
        &self,
        ctx: &RequestContext,
        requester: AccountId,
        id: LikeId,
    ) -> Result<()> {
        let mut client = self.inner.clone();
        client
            .delete_like(with_context(
                proto::DeleteLikeRequest {
                    requester_id: requester.value(),
                    like_id: id.value(),
                },
                ctx,
            ))
            .await
            .map_err(|s| SdkError::from_status_nonidempotent(s, "like delete"))?;
        Ok(())
    }

    /// Lists likes matching the query, expanded, most recent first.
    pub async fn list_likes(
        &self,
        ctx: &RequestContext,
        query: proto::LikeQuery,
        page: Page,
    ) -> Result<Vec<proto::Like>> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            let query = query.clone();
            async move {
                let response = client
                    .list_likes(with_context(
                        proto::ListLikesRequest {
                            query: Some(query),
                            page: Some(page.into()),
                        },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().likes)
            }
        })
        .await
    }

    /// Whether `account` has liked `post`.
    pub async fn check_like(
        &self,
        ctx: &RequestContext,
        account: AccountId,
        post: PostId,
    ) -> Result<bool> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .check_like(with_context(
                        proto::CheckLikeRequest {
                            account_id: account.value(),
                            post_id: post.value(),
                        },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().likes)
            }
        })
        .await
    }

    /// Number of likes made by `account`.
    pub async fn count_likes_by_account(
        &self,
        ctx: &RequestContext,
        account: AccountId,
    ) -> Result<i64> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .count_likes_by_account(with_context(
                        proto::CountLikesByAccountRequest { account_id: account.value() },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().count)
            }
        })
        .await
    }

    /// Number of likes on `post`.
    pub async fn count_likes_of_post(&self, ctx: &RequestContext, post: PostId) -> Result<i64> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .count_likes_of_post(with_context(
                        proto::CountLikesOfPostRequest { post_id: post.value() },
                        ctx,
                    ))
                    .await?;
                Ok(response.into_inner().count)
            }
        })
        .await
    }
}

// ============================================================================
// Account / Post clients (expansion collaborators)
// ============================================================================

/// Client for the external account service; used only for identity expansion.
#[derive(Clone)]
pub struct AccountClient {
    inner: AccountServiceClient<Channel>,
    retry: RetryPolicy,
}

impl AccountClient {
    /// Connects to an account service.
    pub async fn connect(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = connect_channel(endpoint, config).await?;
        Ok(Self {
            inner: AccountServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Like [`Self::connect`] but defers the connection to first use.
    pub fn connect_lazy(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = lazy_channel(endpoint, config)?;
        Ok(Self {
            inner: AccountServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Returns an account's own fields.
    pub async fn retrieve_standard_account(
        &self,
        ctx: &RequestContext,
        id: AccountId,
    ) -> Result<Account> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .retrieve_standard_account(with_context(
                        proto::RetrieveStandardAccountRequest { account_id: id.value() },
                        ctx,
                    ))
                    .await?;
                response
                    .into_inner()
                    .account
                    .map(Into::into)
                    .ok_or_else(|| missing_field("account"))
            }
        })
        .await
    }
}

/// Client for the external post service; used only for object expansion.
#[derive(Clone)]
pub struct PostClient {
    inner: PostServiceClient<Channel>,
    retry: RetryPolicy,
}

impl PostClient {
    /// Connects to a post service.
    pub async fn connect(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = connect_channel(endpoint, config).await?;
        Ok(Self {
            inner: PostServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Like [`Self::connect`] but defers the connection to first use.
    pub fn connect_lazy(endpoint: &str, config: &ClientConfig) -> Result<Self> {
        let channel = lazy_channel(endpoint, config)?;
        Ok(Self {
            inner: PostServiceClient::new(channel),
            retry: config.retry.clone(),
        })
    }

    /// Returns a post's own fields.
    pub async fn retrieve_standard_post(&self, ctx: &RequestContext, id: PostId) -> Result<Post> {
        with_retry(&self.retry, || {
            let mut client = self.inner.clone();
            async move {
                let response = client
                    .retrieve_standard_post(with_context(
                        proto::RetrieveStandardPostRequest { post_id: id.value() },
                        ctx,
                    ))
                    .await?;
                response
                    .into_inner()
                    .post
                    .map(Into::into)
                    .ok_or_else(|| missing_field("post"))
            }
        })
        .await
    }
}
