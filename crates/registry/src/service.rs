//! Registry gRPC service implementation.
//!
//! A thin 1:1 mapping from the RPC surface onto [`PairStore`]. Error mapping
//! is part of the wire contract: duplicate keys surface as `ALREADY_EXISTS`
//! with the conflicting record's id in `conflicting-pair-id` metadata, so
//! callers can report the conflict without a second lookup. Mutation
//! responses echo the request's correlation id back in `x-request-id`
//! metadata.

use std::sync::Arc;

use tonic::{Request, Response, Status};

use chirp_proto::context::{extract_or_generate, inject_into_metadata};
use chirp_proto::proto::registry_service_server::RegistryService;
use chirp_proto::proto::{
    AddPairRequest, AddPairResponse, CountPairsRequest, CountPairsResponse, FetchPairsRequest,
    FetchPairsResponse, FindPairRequest, FindPairResponse, GetPairRequest, GetPairResponse,
    RemovePairRequest, RemovePairResponse,
};
use chirp_proto::convert::page_or_all;
use chirp_types::{PairId, PairQuery, RegistryError};

use crate::store::PairStore;

/// Metadata key carrying the conflicting record's id on `ALREADY_EXISTS`.
pub const CONFLICTING_PAIR_KEY: &str = "conflicting-pair-id";

/// Registry service implementation.
pub struct RegistryServiceImpl {
    /// The record store.
    store: Arc<PairStore>,
}

impl RegistryServiceImpl {
    /// Creates a service over the given store.
    pub fn new(store: Arc<PairStore>) -> Self {
        Self { store }
    }
}

/// Maps a store error onto a gRPC status.
fn registry_status(err: RegistryError) -> Status {
    match &err {
        RegistryError::AlreadyExists { existing, .. } => {
            let mut status = Status::already_exists(err.to_string());
            if let Ok(value) = existing.value().to_string().parse() {
                status.metadata_mut().insert(CONFLICTING_PAIR_KEY, value);
            }
            status
        },
        RegistryError::NotFound { .. } | RegistryError::KeyNotFound { .. } => {
            Status::not_found(err.to_string())
        },
    }
}

#[tonic::async_trait]
impl RegistryService for RegistryServiceImpl {
    async fn add(
        &self,
        request: Request<AddPairRequest>,
    ) -> Result<Response<AddPairResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();

        let pair = self
            .store
            .add(&req.domain, req.first_elem, req.second_elem)
            .map_err(registry_status)?;

        tracing::debug!(
            request_id = %ctx,
            pair_id = %pair.id,
            domain = %pair.domain,
            "pair added"
        );
        let mut response = Response::new(AddPairResponse { pair: Some(pair.into()) });
        inject_into_metadata(response.metadata_mut(), &ctx);
        Ok(response)
    }

    async fn get(
        &self,
        request: Request<GetPairRequest>,
    ) -> Result<Response<GetPairResponse>, Status> {
        let req = request.into_inner();
        let pair = self.store.get(PairId::new(req.id)).map_err(registry_status)?;
        Ok(Response::new(GetPairResponse { pair: Some(pair.into()) }))
    }

    async fn remove(
        &self,
        request: Request<RemovePairRequest>,
    ) -> Result<Response<RemovePairResponse>, Status> {
        let ctx = extract_or_generate(request.metadata());
        let req = request.into_inner();

        self.store.remove(PairId::new(req.id)).map_err(registry_status)?;

        tracing::debug!(request_id = %ctx, pair_id = req.id, "pair removed");
        let mut response = Response::new(RemovePairResponse {});
        inject_into_metadata(response.metadata_mut(), &ctx);
        Ok(response)
    }

    async fn find(
        &self,
        request: Request<FindPairRequest>,
    ) -> Result<Response<FindPairResponse>, Status> {
        let req = request.into_inner();
        let pair = self
            .store
            .find(&req.domain, req.first_elem, req.second_elem)
            .map_err(registry_status)?;
        Ok(Response::new(FindPairResponse { pair: Some(pair.into()) }))
    }

    async fn fetch(
        &self,
        request: Request<FetchPairsRequest>,
    ) -> Result<Response<FetchPairsResponse>, Status> {
        let req = request.into_inner();
        let query: PairQuery = req
            .query
            .ok_or_else(|| Status::invalid_argument("missing query"))?
            .into();
        let page = page_or_all(req.page);

        let pairs = self.store.fetch(&query, page);
        Ok(Response::new(FetchPairsResponse {
            pairs: pairs.into_iter().map(Into::into).collect(),
        }))
    }

    async fn count(
        &self,
        request: Request<CountPairsRequest>,
    ) -> Result<Response<CountPairsResponse>, Status> {
        let req = request.into_inner();
        let query: PairQuery = req
            .query
            .ok_or_else(|| Status::invalid_argument("missing query"))?
            .into();

        let count = self.store.count(&query);
        Ok(Response::new(CountPairsResponse { count }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_status_carries_conflicting_id() {
        let err = RegistryError::AlreadyExists {
            domain: "follow".to_owned(),
            first_elem: 1,
            second_elem: 2,
            existing: PairId::new(42),
        };

        let status = registry_status(err);
        assert_eq!(status.code(), tonic::Code::AlreadyExists);
        assert_eq!(
            status.metadata().get(CONFLICTING_PAIR_KEY).and_then(|v| v.to_str().ok()),
            Some("42")
        );
    }

    #[test]
    fn test_not_found_maps_to_not_found_code() {
        let status = registry_status(RegistryError::NotFound { id: PairId::new(9) });
        assert_eq!(status.code(), tonic::Code::NotFound);

        let status = registry_status(RegistryError::KeyNotFound {
            domain: "like".to_owned(),
            first_elem: 1,
            second_elem: 2,
        });
        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn test_add_and_get_via_service() {
        let service = RegistryServiceImpl::new(Arc::new(PairStore::new()));

        let response = service
            .add(Request::new(AddPairRequest {
                domain: "follow".to_owned(),
                first_elem: 1,
                second_elem: 2,
            }))
            .await
            .unwrap();
        let pair = response.into_inner().pair.unwrap();
        assert_eq!(pair.domain, "follow");

        let got = service
            .get(Request::new(GetPairRequest { id: pair.id }))
            .await
            .unwrap()
            .into_inner()
            .pair
            .unwrap();
        assert_eq!(got, pair);
    }

    #[tokio::test]
    async fn test_duplicate_add_via_service_is_already_exists() {
        let service = RegistryServiceImpl::new(Arc::new(PairStore::new()));
        let req = || {
            Request::new(AddPairRequest {
                domain: "follow".to_owned(),
                first_elem: 1,
                second_elem: 2,
            })
        };

        service.add(req()).await.unwrap();
        let status = service.add(req()).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::AlreadyExists);
        assert!(status.metadata().contains_key(CONFLICTING_PAIR_KEY));
    }

    #[tokio::test]
    async fn test_add_echoes_request_id() {
        use chirp_proto::context::REQUEST_ID_HEADER;

        let service = RegistryServiceImpl::new(Arc::new(PairStore::new()));
        let mut request = Request::new(AddPairRequest {
            domain: "follow".to_owned(),
            first_elem: 1,
            second_elem: 2,
        });
        request
            .metadata_mut()
            .insert(REQUEST_ID_HEADER, "corr-1".parse().unwrap());

        let response = service.add(request).await.unwrap();
        assert_eq!(
            response.metadata().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()),
            Some("corr-1")
        );
    }

    #[tokio::test]
    async fn test_fetch_requires_query() {
        let service = RegistryServiceImpl::new(Arc::new(PairStore::new()));
        let status = service
            .fetch(Request::new(FetchPairsRequest { query: None, page: None }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
