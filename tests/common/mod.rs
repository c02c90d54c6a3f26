//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a temporary served directory, a
//! default config and the full [`AppContext`]. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use ff_core::config::Config;
use ff_core::{FileSystem, LocalFs};
use ff_server::context::AppContext;
use ff_server::router::build_router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

/// Test harness serving a fresh temporary directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration. `server.root` is
    /// replaced by the temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        config.server.root = dir.path().to_path_buf();
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFs::new(dir.path()));
        let ctx = AppContext::new(config, fs);
        Self { ctx, dir }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let addr = serve(harness.router()).await;
        (harness, addr)
    }

    pub fn router(&self) -> Router {
        build_router(self.ctx.clone())
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file below the served root, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(path, contents).expect("failed to write fixture");
    }

    pub fn mkdir(&self, rel: &str) {
        std::fs::create_dir_all(self.dir.path().join(rel)).expect("failed to create dir");
    }

    /// Send `GET uri` through the router in-process.
    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router().oneshot(request).await.unwrap()
    }
}

/// Serve `app` on 127.0.0.1 with a random port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind random port");
    let addr = listener.local_addr().expect("failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    addr
}

/// Helper to get response body as string
pub async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
