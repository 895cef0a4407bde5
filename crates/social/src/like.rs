//! Like service implementation.
//!
//! Owns likes keyed by `(account, post)` in the `"like"` registry domain.
//! Same coordination shape as the follow service; expansion additionally
//! resolves the liked post through the post service.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::debug;

use chirp_proto::context::{extract_or_generate, inject_into_metadata};
use chirp_proto::proto;
use chirp_proto::proto::like_service_server::LikeService;
use chirp_types::{Account, AccountId, EntityQuery, Like, LikeId, Post, PostId};

use crate::coordinator::PairCoordinator;
use crate::error::social_status;
use crate::registry::Registry;
use crate::resolver::{Resolver, resolve_or_none};
use crate::store::EntityTable;

/// Registry domain for likes.
pub const LIKE_DOMAIN: &str = "like";

/// gRPC like service.
pub struct LikeServiceImpl<G> {
    coordinator: PairCoordinator<G>,
    table: Arc<EntityTable<Like>>,
    accounts: Arc<dyn Resolver<Account>>,
    posts: Arc<dyn Resolver<Post>>,
}

impl<G> LikeServiceImpl<G> {
    /// Builds the service over its registry handle, table, and resolvers.
    pub fn new(
        registry: Arc<G>,
        table: Arc<EntityTable<Like>>,
        accounts: Arc<dyn Resolver<Account>>,
        posts: Arc<dyn Resolver<Post>>,
    ) -> Self {
        Self {
            coordinator: PairCoordinator::new(registry, LIKE_DOMAIN),
            table,
            accounts,
            posts,
        }
    }

    async fn expand(&self, ctx: &chirp_proto::RequestContext, like: Like) -> proto::Like {
        let account_id = like.account_id.value();
        let post_id = like.post_id.value();
        let mut message: proto::Like = like.into();
        message.account = resolve_or_none(self.accounts.as_ref(), ctx, account_id, "liking account")
            .await
            .map(Into::into);
        message.post = resolve_or_none(self.posts.as_ref(), ctx, post_id, "liked post")
            .await
            .map(Into::into);
        message
    }
}

fn entity_query(query: Option<proto::LikeQuery>) -> EntityQuery {
    let Some(query) = query else {
        return EntityQuery::ALL;
    };
    EntityQuery {
        subject: query.account_id,
        object: query.post_id,
    }
}

#[tonic::async_trait]
impl<G: Registry> LikeService for LikeServiceImpl<G> {
    async fn like_post(
        &self,
        request: Request<proto::LikePostRequest>,
    ) -> Result<Response<proto::LikePostResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();

        let like = self
            .coordinator
            .create(&ctx, &self.table, req.requester_id, req.post_id, |id, pair_id, created_at| {
                Like {
                    id: LikeId::new(id),
                    created_at,
                    account_id: AccountId::new(req.requester_id),
                    post_id: PostId::new(req.post_id),
                    pair_id,
                }
            })
            .await
            .map_err(social_status)?;

        let mut response = Response::new(proto::LikePostResponse { like: Some(like.into()) });
        inject_into_metadata(response.metadata_mut(), &ctx);
        Ok(response)
    }

    async fn retrieve_standard_like(
        &self,
        request: Request<proto::RetrieveStandardLikeRequest>,
    ) -> Result<Response<proto::RetrieveStandardLikeResponse>, Status> {
        let req = request.into_inner();
        let like = self
            .table
            .get(req.like_id)
            .ok_or_else(|| Status::not_found("like not found"))?;

        Ok(Response::new(proto::RetrieveStandardLikeResponse {
            like: Some(like.into()),
        }))
    }

    async fn retrieve_expanded_like(
        &self,
        request: Request<proto::RetrieveExpandedLikeRequest>,
    ) -> Result<Response<proto::RetrieveExpandedLikeResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();
        let like = self
            .table
            .get(req.like_id)
            .ok_or_else(|| Status::not_found("like not found"))?;

        Ok(Response::new(proto::RetrieveExpandedLikeResponse {
            like: Some(self.expand(&ctx, like).await),
        }))
    }

    async fn delete_like(
        &self,
        request: Request<proto::DeleteLikeRequest>,
    ) -> Result<Response<proto::DeleteLikeResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();

        self.coordinator
            .delete(&ctx, &self.table, req.requester_id, req.like_id)
            .await
            .map_err(social_status)?;

        let mut response = Response::new(proto::DeleteLikeResponse {});
        inject_into_metadata(response.metadata_mut(), &ctx);
        Ok(response)
    }

    async fn list_likes(
        &self,
        request: Request<proto::ListLikesRequest>,
    ) -> Result<Response<proto::ListLikesResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();
        let query = entity_query(req.query);
        let page = chirp_proto::convert::page_or_all(req.page);

        let rows = self.table.fetch(query, page);
        debug!(request_id = %ctx, results = rows.len(), "listing likes");

        let mut likes = Vec::with_capacity(rows.len());
        for row in rows {
            likes.push(self.expand(&ctx, row).await);
        }

        Ok(Response::new(proto::ListLikesResponse { likes }))
    }

    async fn check_like(
        &self,
        request: Request<proto::CheckLikeRequest>,
    ) -> Result<Response<proto::CheckLikeResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();
        let likes = self
            .coordinator
            .key_reserved(&ctx, req.account_id, req.post_id)
            .await
            .map_err(social_status)?;

        Ok(Response::new(proto::CheckLikeResponse { likes }))
    }

    async fn count_likes_by_account(
        &self,
        request: Request<proto::CountLikesByAccountRequest>,
    ) -> Result<Response<proto::CountLikesByAccountResponse>, Status> {
        let req = request.into_inner();
        let count = self.table.count(EntityQuery::ALL.with_subject(req.account_id));

        Ok(Response::new(proto::CountLikesByAccountResponse { count }))
    }

    async fn count_likes_of_post(
        &self,
        request: Request<proto::CountLikesOfPostRequest>,
    ) -> Result<Response<proto::CountLikesOfPostResponse>, Status> {
        let req = request.into_inner();
        let count = self.table.count(EntityQuery::ALL.with_object(req.post_id));

        Ok(Response::new(proto::CountLikesOfPostResponse { count }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use tonic::Code;

    use crate::testing::{FakeRegistry, FixedResolver, account, post};

    use super::*;

    fn service(
        accounts: FixedResolver<Account>,
        posts: FixedResolver<Post>,
    ) -> LikeServiceImpl<FakeRegistry> {
        LikeServiceImpl::new(
            Arc::new(FakeRegistry::new()),
            Arc::new(EntityTable::new()),
            Arc::new(accounts),
            Arc::new(posts),
        )
    }

    async fn create(svc: &LikeServiceImpl<FakeRegistry>, requester: i64, post_id: i64) -> proto::Like {
        svc.like_post(Request::new(proto::LikePostRequest {
            requester_id: requester,
            post_id,
        }))
        .await
        .unwrap()
        .into_inner()
        .like
        .unwrap()
    }

    #[tokio::test]
    async fn test_like_then_counts() {
        let svc = service(FixedResolver::empty(), FixedResolver::empty());
        create(&svc, 5, 60).await;
        create(&svc, 5, 61).await;
        create(&svc, 7, 60).await;

        let by_account = svc
            .count_likes_by_account(Request::new(proto::CountLikesByAccountRequest {
                account_id: 5,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(by_account.count, 2);

        let of_post = svc
            .count_likes_of_post(Request::new(proto::CountLikesOfPostRequest { post_id: 60 }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(of_post.count, 2);
    }

    #[tokio::test]
    async fn test_double_like_is_already_exists() {
        let svc = service(FixedResolver::empty(), FixedResolver::empty());
        create(&svc, 5, 60).await;

        let status = svc
            .like_post(Request::new(proto::LikePostRequest {
                requester_id: 5,
                post_id: 60,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::AlreadyExists);
    }

    #[tokio::test]
    async fn test_unlike_then_like_again() {
        let svc = service(FixedResolver::empty(), FixedResolver::empty());
        let like = create(&svc, 5, 60).await;

        svc.delete_like(Request::new(proto::DeleteLikeRequest {
            requester_id: 5,
            like_id: like.id,
        }))
        .await
        .unwrap();

        let checked = svc
            .check_like(Request::new(proto::CheckLikeRequest {
                account_id: 5,
                post_id: 60,
            }))
            .await
            .unwrap()
            .into_inner();
        assert!(!checked.likes);

        let again = create(&svc, 5, 60).await;
        assert_ne!(again.id, like.id);
    }

    #[tokio::test]
    async fn test_delete_like_requires_owner() {
        let svc = service(FixedResolver::empty(), FixedResolver::empty());
        let like = create(&svc, 5, 60).await;

        let status = svc
            .delete_like(Request::new(proto::DeleteLikeRequest {
                requester_id: 9,
                like_id: like.id,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::PermissionDenied);
    }

    #[tokio::test]
    async fn test_expanded_like_resolves_account_and_post() {
        let svc = service(
            FixedResolver::new([(5, account(5, "ada"))]),
            FixedResolver::new([(60, post(60, 7, "hello"))]),
        );
        let like = create(&svc, 5, 60).await;

        let expanded = svc
            .retrieve_expanded_like(Request::new(proto::RetrieveExpandedLikeRequest {
                like_id: like.id,
            }))
            .await
            .unwrap()
            .into_inner()
            .like
            .unwrap();

        assert_eq!(expanded.account.unwrap().username, "ada");
        assert_eq!(expanded.post.unwrap().text, "hello");
    }

    #[tokio::test]
    async fn test_expanded_like_degrades_on_missing_post() {
        let svc = service(
            FixedResolver::new([(5, account(5, "ada"))]),
            FixedResolver::empty(),
        );
        let like = create(&svc, 5, 60).await;

        let expanded = svc
            .retrieve_expanded_like(Request::new(proto::RetrieveExpandedLikeRequest {
                like_id: like.id,
            }))
            .await
            .unwrap()
            .into_inner()
            .like
            .unwrap();

        assert!(expanded.account.is_some());
        assert!(expanded.post.is_none());
        assert_eq!(expanded.post_id, 60);
    }

    #[tokio::test]
    async fn test_list_likes_pagination() {
        let svc = service(FixedResolver::empty(), FixedResolver::empty());
        for post_id in 1..=5 {
            create(&svc, 5, post_id).await;
        }

        let listed = svc
            .list_likes(Request::new(proto::ListLikesRequest {
                query: Some(proto::LikeQuery {
                    account_id: Some(5),
                    post_id: None,
                }),
                page: Some(proto::Page { limit: 2, offset: 1 }),
            }))
            .await
            .unwrap()
            .into_inner()
            .likes;

        assert_eq!(listed.len(), 2);
    }
}
