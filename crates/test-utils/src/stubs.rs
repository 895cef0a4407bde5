//! Stub account and post services.
//!
//! The social services only ever read from their collaborators, so a
//! preloadable map behind the real gRPC surface is enough to exercise
//! expansion, including the degraded path when a record is missing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use chirp_proto::proto;
use chirp_proto::proto::account_service_server::{AccountService, AccountServiceServer};
use chirp_proto::proto::post_service_server::{PostService, PostServiceServer};

/// Fixture store backing the stub account and post services.
#[derive(Default)]
pub struct StubDirectory {
    accounts: Mutex<HashMap<i64, proto::Account>>,
    posts: Mutex<HashMap<i64, proto::Post>>,
}

impl StubDirectory {
    /// Creates an empty directory.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds or replaces an account fixture.
    pub fn put_account(&self, id: i64, username: &str) {
        self.accounts.lock().insert(
            id,
            proto::Account { id, created_at: 100, username: username.to_owned() },
        );
    }

    /// Adds or replaces a post fixture.
    pub fn put_post(&self, id: i64, author_id: i64, text: &str) {
        self.posts.lock().insert(
            id,
            proto::Post { id, created_at: 100, author_id, text: text.to_owned() },
        );
    }

    /// Drops an account fixture, so later lookups fail.
    pub fn remove_account(&self, id: i64) {
        self.accounts.lock().remove(&id);
    }

    /// Drops a post fixture.
    pub fn remove_post(&self, id: i64) {
        self.posts.lock().remove(&id);
    }
}

struct StubAccountService {
    directory: Arc<StubDirectory>,
}

#[tonic::async_trait]
impl AccountService for StubAccountService {
    async fn retrieve_standard_account(
        &self,
        request: Request<proto::RetrieveStandardAccountRequest>,
    ) -> Result<Response<proto::RetrieveStandardAccountResponse>, Status> {
        let req = request.into_inner();
        let account = self
            .directory
            .accounts
            .lock()
            .get(&req.account_id)
            .cloned()
            .ok_or_else(|| Status::not_found("account not found"))?;

        Ok(Response::new(proto::RetrieveStandardAccountResponse {
            account: Some(account),
        }))
    }
}

struct StubPostService {
    directory: Arc<StubDirectory>,
}

#[tonic::async_trait]
impl PostService for StubPostService {
    async fn retrieve_standard_post(
        &self,
        request: Request<proto::RetrieveStandardPostRequest>,
    ) -> Result<Response<proto::RetrieveStandardPostResponse>, Status> {
        let req = request.into_inner();
        let post = self
            .directory
            .posts
            .lock()
            .get(&req.post_id)
            .cloned()
            .ok_or_else(|| Status::not_found("post not found"))?;

        Ok(Response::new(proto::RetrieveStandardPostResponse { post: Some(post) }))
    }
}

/// Serves both stub services on an ephemeral port.
///
/// Returns the bound address; the server drains when `shutdown` flips true.
pub async fn serve_stub_directory(
    directory: Arc<StubDirectory>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;

    let accounts = StubAccountService { directory: Arc::clone(&directory) };
    let posts = StubPostService { directory };

    tokio::spawn(async move {
        let _ = Server::builder()
            .add_service(AccountServiceServer::new(accounts))
            .add_service(PostServiceServer::new(posts))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await;
    });

    Ok(addr)
}
