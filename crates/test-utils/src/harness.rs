//! In-process cluster harness.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chirp_registry::PairStore;
use chirp_sdk::{ClientConfig, FollowClient, LikeClient, RegistryClient, Result as SdkResult};
use chirp_server::bootstrap::{self, BindSnafu, BootstrapError, Node};
use chirp_server::config::{Config, LogFormat, ServiceKind};
use chirp_server::shutdown::ShutdownHandle;
use chirp_social::EntityTable;
use chirp_types::{Follow, Like};
use snafu::ResultExt;

use crate::stubs::{StubDirectory, serve_stub_directory};

const EPHEMERAL: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 0);

/// All three Chirp services plus stub collaborators, on ephemeral ports.
///
/// Exposes the underlying stores for inspection and fault injection, and
/// typed SDK clients for driving the services over real gRPC.
pub struct TestCluster {
    directory: Arc<StubDirectory>,
    node: Node,
    shutdown: ShutdownHandle,
    client_config: ClientConfig,
}

impl TestCluster {
    /// Boots the cluster.
    pub async fn start() -> Result<Self, BootstrapError> {
        let (shutdown, shutdown_rx) = ShutdownHandle::new();

        let directory = StubDirectory::new();
        let stub_addr = serve_stub_directory(Arc::clone(&directory), shutdown_rx.clone())
            .await
            .context(BindSnafu { service: "stub directory", addr: EPHEMERAL })?;

        let config = Config {
            services: vec![ServiceKind::Registry, ServiceKind::Follow, ServiceKind::Like],
            registry_listen: EPHEMERAL,
            follow_listen: EPHEMERAL,
            like_listen: EPHEMERAL,
            registry_addr: String::new(),
            account_addr: format!("http://{stub_addr}"),
            post_addr: format!("http://{stub_addr}"),
            request_timeout_secs: 2,
            log_format: LogFormat::Text,
        };

        let node = bootstrap::bootstrap(&config, shutdown_rx).await?;
        let client_config = config
            .client_config()
            .with_connect_timeout(Duration::from_secs(1));

        Ok(Self { directory, node, shutdown, client_config })
    }

    /// The stub account/post fixtures.
    pub fn directory(&self) -> &Arc<StubDirectory> {
        &self.directory
    }

    /// The hosted registry's endpoint URL, for hand-built clients.
    pub fn registry_endpoint(&self) -> String {
        self.endpoint(self.node.registry_addr())
    }

    /// A client for the hosted registry service.
    pub async fn registry_client(&self) -> SdkResult<RegistryClient> {
        RegistryClient::connect(&self.endpoint(self.node.registry_addr()), &self.client_config)
            .await
    }

    /// A client for the hosted follow service.
    pub async fn follow_client(&self) -> SdkResult<FollowClient> {
        FollowClient::connect(&self.endpoint(self.node.follow_addr()), &self.client_config).await
    }

    /// A client for the hosted like service.
    pub async fn like_client(&self) -> SdkResult<LikeClient> {
        LikeClient::connect(&self.endpoint(self.node.like_addr()), &self.client_config).await
    }

    /// The registry's store, for direct inspection.
    pub fn registry_store(&self) -> &Arc<PairStore> {
        self.node.registry_store().unwrap_or_else(|| unreachable!("registry always hosted"))
    }

    /// The follow service's table, for inspection and fault injection.
    pub fn follow_table(&self) -> &Arc<EntityTable<Follow>> {
        self.node.follow_table().unwrap_or_else(|| unreachable!("follow always hosted"))
    }

    /// The like service's table, for inspection and fault injection.
    pub fn like_table(&self) -> &Arc<EntityTable<Like>> {
        self.node.like_table().unwrap_or_else(|| unreachable!("like always hosted"))
    }

    /// Drains the listeners and waits for the servers to exit.
    pub async fn stop(self) -> Result<(), BootstrapError> {
        self.shutdown.trigger();
        self.node.join().await
    }

    fn endpoint(&self, addr: Option<SocketAddr>) -> String {
        match addr {
            Some(addr) => format!("http://{addr}"),
            None => unreachable!("all services hosted by the harness"),
        }
    }
}
