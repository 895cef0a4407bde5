//! Registry access as seen by a social service.
//!
//! The trait narrows the registry surface to the three calls coordination
//! needs and collapses transport detail into four outcomes the coordinator
//! can act on. The production implementation wraps the SDK client; tests
//! substitute an in-process fake.

use async_trait::async_trait;
use snafu::Snafu;
use tonic::Code;

use chirp_proto::RequestContext;
use chirp_sdk::{RegistryClient, SdkError};
use chirp_types::{PairId, UniquePair};

/// Outcome of a registry call, as coordination logic sees it.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RegistryCallError {
    /// The composite key is already reserved.
    #[snafu(display("key already reserved (pair {existing:?})"))]
    AlreadyExists {
        /// The blocking pair, when the registry reported it.
        existing: Option<PairId>,
    },

    /// No pair with the requested id or key.
    #[snafu(display("pair not found"))]
    NotFound,

    /// The call definitely did not take effect.
    #[snafu(display("registry unavailable: {message}"))]
    Unavailable {
        /// Description of the failure.
        message: String,
    },

    /// The call may or may not have taken effect.
    #[snafu(display("registry outcome unknown: {message}"))]
    Indeterminate {
        /// Description of the failure.
        message: String,
    },
}

/// The registry calls a social service coordinates against.
#[async_trait]
pub trait Registry: Send + Sync + 'static {
    /// Reserves `(domain, first_elem, second_elem)`.
    async fn add(
        &self,
        ctx: &RequestContext,
        domain: &str,
        first_elem: i64,
        second_elem: i64,
    ) -> Result<UniquePair, RegistryCallError>;

    /// Releases the reservation with this id.
    async fn remove(&self, ctx: &RequestContext, id: PairId) -> Result<(), RegistryCallError>;

    /// Point lookup by composite key.
    async fn find(
        &self,
        ctx: &RequestContext,
        domain: &str,
        first_elem: i64,
        second_elem: i64,
    ) -> Result<UniquePair, RegistryCallError>;
}

fn classify(err: SdkError) -> RegistryCallError {
    match err {
        SdkError::Rpc { code: Code::AlreadyExists, conflicting_pair, .. } => {
            RegistryCallError::AlreadyExists { existing: conflicting_pair }
        }
        SdkError::Rpc { code: Code::NotFound, .. } => RegistryCallError::NotFound,
        SdkError::Indeterminate { .. } => {
            RegistryCallError::Indeterminate { message: err.to_string() }
        }
        other => RegistryCallError::Unavailable { message: other.to_string() },
    }
}

/// Production registry access over gRPC.
#[derive(Clone)]
pub struct GrpcRegistry {
    client: RegistryClient,
}

impl GrpcRegistry {
    /// Wraps a connected registry client.
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Registry for GrpcRegistry {
    async fn add(
        &self,
        ctx: &RequestContext,
        domain: &str,
        first_elem: i64,
        second_elem: i64,
    ) -> Result<UniquePair, RegistryCallError> {
        self.client
            .add(ctx, domain, first_elem, second_elem)
            .await
            .map_err(classify)
    }

    async fn remove(&self, ctx: &RequestContext, id: PairId) -> Result<(), RegistryCallError> {
        self.client.remove(ctx, id).await.map_err(classify)
    }

    async fn find(
        &self,
        ctx: &RequestContext,
        domain: &str,
        first_elem: i64,
        second_elem: i64,
    ) -> Result<UniquePair, RegistryCallError> {
        self.client
            .find(ctx, domain, first_elem, second_elem)
            .await
            .map_err(classify)
    }
}
