//! Follow service implementation.
//!
//! Owns follow edges keyed by `(follower, followee)` in the `"follow"`
//! registry domain. Creates and deletes run through the coordinator; list
//! and expanded retrievals resolve the accounts on both ends through the
//! account service.

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::debug;

use chirp_proto::context::{extract_or_generate, inject_into_metadata};
use chirp_proto::proto;
use chirp_proto::proto::follow_service_server::FollowService;
use chirp_types::{Account, AccountId, EntityQuery, Follow, FollowId};

use crate::coordinator::PairCoordinator;
use crate::error::social_status;
use crate::registry::Registry;
use crate::resolver::{Resolver, resolve_or_none};
use crate::store::EntityTable;

/// Registry domain for follow edges.
pub const FOLLOW_DOMAIN: &str = "follow";

/// gRPC follow service.
pub struct FollowServiceImpl<G> {
    coordinator: PairCoordinator<G>,
    table: Arc<EntityTable<Follow>>,
    accounts: Arc<dyn Resolver<Account>>,
}

impl<G> FollowServiceImpl<G> {
    /// Builds the service over its registry handle, table, and account
    /// resolver.
    pub fn new(
        registry: Arc<G>,
        table: Arc<EntityTable<Follow>>,
        accounts: Arc<dyn Resolver<Account>>,
    ) -> Self {
        Self {
            coordinator: PairCoordinator::new(registry, FOLLOW_DOMAIN),
            table,
            accounts,
        }
    }

    async fn expand(
        &self,
        ctx: &chirp_proto::RequestContext,
        follow: Follow,
    ) -> proto::Follow {
        let follower_id = follow.follower_id.value();
        let followee_id = follow.followee_id.value();
        let mut message: proto::Follow = follow.into();
        message.follower =
            resolve_or_none(self.accounts.as_ref(), ctx, follower_id, "follower account")
                .await
                .map(Into::into);
        message.followee =
            resolve_or_none(self.accounts.as_ref(), ctx, followee_id, "followee account")
                .await
                .map(Into::into);
        message
    }
}

fn entity_query(query: Option<proto::FollowQuery>) -> EntityQuery {
    let Some(query) = query else {
        return EntityQuery::ALL;
    };
    EntityQuery {
        subject: query.follower_id,
        object: query.followee_id,
    }
}

#[tonic::async_trait]
impl<G: Registry> FollowService for FollowServiceImpl<G> {
    async fn follow_account(
        &self,
        request: Request<proto::FollowAccountRequest>,
    ) -> Result<Response<proto::FollowAccountResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();

        let follow = self
            .coordinator
            .create(&ctx, &self.table, req.requester_id, req.account_id, |id, pair_id, created_at| {
                Follow {
                    id: FollowId::new(id),
                    created_at,
                    follower_id: AccountId::new(req.requester_id),
                    followee_id: AccountId::new(req.account_id),
                    pair_id,
                }
            })
            .await
            .map_err(social_status)?;

        let mut response = Response::new(proto::FollowAccountResponse {
            follow: Some(follow.into()),
        });
        inject_into_metadata(response.metadata_mut(), &ctx);
        Ok(response)
    }

    async fn retrieve_standard_follow(
        &self,
        request: Request<proto::RetrieveStandardFollowRequest>,
    ) -> Result<Response<proto::RetrieveStandardFollowResponse>, Status> {
        let req = request.into_inner();
        let follow = self
            .table
            .get(req.follow_id)
            .ok_or_else(|| Status::not_found("follow not found"))?;

        Ok(Response::new(proto::RetrieveStandardFollowResponse {
            follow: Some(follow.into()),
        }))
    }

    async fn retrieve_expanded_follow(
        &self,
        request: Request<proto::RetrieveExpandedFollowRequest>,
    ) -> Result<Response<proto::RetrieveExpandedFollowResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();
        let follow = self
            .table
            .get(req.follow_id)
            .ok_or_else(|| Status::not_found("follow not found"))?;

        Ok(Response::new(proto::RetrieveExpandedFollowResponse {
            follow: Some(self.expand(&ctx, follow).await),
        }))
    }

    async fn delete_follow(
        &self,
        request: Request<proto::DeleteFollowRequest>,
    ) -> Result<Response<proto::DeleteFollowResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();

        self.coordinator
            .delete(&ctx, &self.table, req.requester_id, req.follow_id)
            .await
            .map_err(social_status)?;

        let mut response = Response::new(proto::DeleteFollowResponse {});
        inject_into_metadata(response.metadata_mut(), &ctx);
        Ok(response)
    }

    async fn list_follows(
        &self,
        request: Request<proto::ListFollowsRequest>,
    ) -> Result<Response<proto::ListFollowsResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();
        let query = entity_query(req.query);
        let page = chirp_proto::convert::page_or_all(req.page);

        let rows = self.table.fetch(query, page);
        debug!(request_id = %ctx, results = rows.len(), "listing follows");

        let mut follows = Vec::with_capacity(rows.len());
        for row in rows {
            follows.push(self.expand(&ctx, row).await);
        }

        Ok(Response::new(proto::ListFollowsResponse { follows }))
    }

    async fn check_follow(
        &self,
        request: Request<proto::CheckFollowRequest>,
    ) -> Result<Response<proto::CheckFollowResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();
        let follows = self
            .coordinator
            .key_reserved(&ctx, req.follower_id, req.followee_id)
            .await
            .map_err(social_status)?;

        Ok(Response::new(proto::CheckFollowResponse { follows }))
    }

    async fn count_followers(
        &self,
        request: Request<proto::CountFollowersRequest>,
    ) -> Result<Response<proto::CountFollowersResponse>, Status> {
        let req = request.into_inner();
        let count = self.table.count(EntityQuery::ALL.with_object(req.account_id));

        Ok(Response::new(proto::CountFollowersResponse { count }))
    }

    async fn count_followees(
        &self,
        request: Request<proto::CountFolloweesRequest>,
    ) -> Result<Response<proto::CountFolloweesResponse>, Status> {
        let req = request.into_inner();
        let count = self.table.count(EntityQuery::ALL.with_subject(req.account_id));

        Ok(Response::new(proto::CountFolloweesResponse { count }))
    }
}
