//! Service construction and wiring.
//!
//! Binds each hosted service's listener before spawning its server, so the
//! bound addresses (ephemeral ports included) are known to the caller and to
//! the in-process clients that connect to them.

use std::net::SocketAddr;
use std::sync::Arc;

use snafu::{Location, ResultExt, Snafu};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::info;

use chirp_proto::proto::follow_service_server::FollowServiceServer;
use chirp_proto::proto::like_service_server::LikeServiceServer;
use chirp_proto::proto::registry_service_server::RegistryServiceServer;
use chirp_registry::{PairStore, RegistryServiceImpl};
use chirp_sdk::{AccountClient, PostClient, RegistryClient};
use chirp_social::{
    EntityTable, FollowServiceImpl, GrpcAccountResolver, GrpcPostResolver, GrpcRegistry,
    LikeServiceImpl,
};
use chirp_types::{Follow, Like};

use crate::config::{Config, ServiceKind};

/// Failures while building or running the node.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BootstrapError {
    /// Could not bind a service listener.
    #[snafu(display("failed to bind {service} listener on {addr} at {location}: {source}"))]
    Bind {
        /// The service being bound.
        service: &'static str,
        /// The requested address.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not build a downstream client.
    #[snafu(display("failed to build {target} client at {location}: {source}"))]
    Client {
        /// The downstream service.
        target: &'static str,
        /// Underlying SDK error.
        source: chirp_sdk::SdkError,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// A gRPC server exited with an error.
    #[snafu(display("server error at {location}: {source}"))]
    Serve {
        /// Underlying transport error.
        source: tonic::transport::Error,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// A server task panicked.
    #[snafu(display("server task failed at {location}: {source}"))]
    Task {
        /// Join failure.
        source: tokio::task::JoinError,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },
}

/// A running node: the hosted services plus handles into their stores.
///
/// The store handles are what harnesses use for inspection and fault
/// injection; production callers only join on the server tasks.
pub struct Node {
    registry_addr: Option<SocketAddr>,
    follow_addr: Option<SocketAddr>,
    like_addr: Option<SocketAddr>,
    registry_store: Option<Arc<PairStore>>,
    follow_table: Option<Arc<EntityTable<Follow>>>,
    like_table: Option<Arc<EntityTable<Like>>>,
    tasks: Vec<JoinHandle<Result<(), tonic::transport::Error>>>,
}

impl Node {
    /// Bound address of the hosted registry service.
    pub fn registry_addr(&self) -> Option<SocketAddr> {
        self.registry_addr
    }

    /// Bound address of the hosted follow service.
    pub fn follow_addr(&self) -> Option<SocketAddr> {
        self.follow_addr
    }

    /// Bound address of the hosted like service.
    pub fn like_addr(&self) -> Option<SocketAddr> {
        self.like_addr
    }

    /// The hosted registry's store.
    pub fn registry_store(&self) -> Option<&Arc<PairStore>> {
        self.registry_store.as_ref()
    }

    /// The hosted follow service's table.
    pub fn follow_table(&self) -> Option<&Arc<EntityTable<Follow>>> {
        self.follow_table.as_ref()
    }

    /// The hosted like service's table.
    pub fn like_table(&self) -> Option<&Arc<EntityTable<Like>>> {
        self.like_table.as_ref()
    }

    /// Waits for every hosted service to finish serving.
    pub async fn join(self) -> Result<(), BootstrapError> {
        for task in self.tasks {
            task.await.context(TaskSnafu)?.context(ServeSnafu)?;
        }
        Ok(())
    }
}

async fn bind(
    service: &'static str,
    addr: SocketAddr,
) -> Result<(TcpListener, SocketAddr), BootstrapError> {
    let listener = TcpListener::bind(addr).await.context(BindSnafu { service, addr })?;
    let bound = listener.local_addr().context(BindSnafu { service, addr })?;
    info!(service, addr = %bound, "listening");
    Ok((listener, bound))
}

/// Builds and starts every service this process hosts.
///
/// `shutdown` flipping to `true` drains all listeners. In-process entity
/// services talk to a co-hosted registry through its real bound address, so
/// the coordination path is identical in single- and multi-process layouts.
pub async fn bootstrap(
    config: &Config,
    shutdown: watch::Receiver<bool>,
) -> Result<Node, BootstrapError> {
    let client_config = config.client_config();
    let mut node = Node {
        registry_addr: None,
        follow_addr: None,
        like_addr: None,
        registry_store: None,
        follow_table: None,
        like_table: None,
        tasks: Vec::new(),
    };

    if config.hosts(ServiceKind::Registry) {
        let (listener, addr) = bind("registry", config.registry_listen).await?;
        let store = Arc::new(PairStore::new());
        let service = RegistryServiceImpl::new(Arc::clone(&store));

        let mut rx = shutdown.clone();
        node.tasks.push(tokio::spawn(async move {
            Server::builder()
                .add_service(RegistryServiceServer::new(service))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    let _ = rx.wait_for(|stop| *stop).await;
                })
                .await
        }));

        node.registry_addr = Some(addr);
        node.registry_store = Some(store);
    }

    // Entity services prefer the co-hosted registry's actual bound address.
    let registry_endpoint = match node.registry_addr {
        Some(addr) => format!("http://{addr}"),
        None => config.registry_addr.clone(),
    };
    let registry = |client_config: &chirp_sdk::ClientConfig| {
        RegistryClient::connect_lazy(&registry_endpoint, client_config)
            .context(ClientSnafu { target: "registry" })
            .map(|client| Arc::new(GrpcRegistry::new(client)))
    };

    if config.hosts(ServiceKind::Follow) {
        let (listener, addr) = bind("follow", config.follow_listen).await?;
        let table = Arc::new(EntityTable::new());
        let accounts = AccountClient::connect_lazy(&config.account_addr, &client_config)
            .context(ClientSnafu { target: "account" })?;
        let service = FollowServiceImpl::new(
            registry(&client_config)?,
            Arc::clone(&table),
            Arc::new(GrpcAccountResolver::new(accounts)),
        );

        let mut rx = shutdown.clone();
        node.tasks.push(tokio::spawn(async move {
            Server::builder()
                .add_service(FollowServiceServer::new(service))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    let _ = rx.wait_for(|stop| *stop).await;
                })
                .await
        }));

        node.follow_addr = Some(addr);
        node.follow_table = Some(table);
    }

    if config.hosts(ServiceKind::Like) {
        let (listener, addr) = bind("like", config.like_listen).await?;
        let table = Arc::new(EntityTable::new());
        let accounts = AccountClient::connect_lazy(&config.account_addr, &client_config)
            .context(ClientSnafu { target: "account" })?;
        let posts = PostClient::connect_lazy(&config.post_addr, &client_config)
            .context(ClientSnafu { target: "post" })?;
        let service = LikeServiceImpl::new(
            registry(&client_config)?,
            Arc::clone(&table),
            Arc::new(GrpcAccountResolver::new(accounts)),
            Arc::new(GrpcPostResolver::new(posts)),
        );

        let mut rx = shutdown.clone();
        node.tasks.push(tokio::spawn(async move {
            Server::builder()
                .add_service(LikeServiceServer::new(service))
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                    let _ = rx.wait_for(|stop| *stop).await;
                })
                .await
        }));

        node.like_addr = Some(addr);
        node.like_table = Some(table);
    }

    Ok(node)
}
