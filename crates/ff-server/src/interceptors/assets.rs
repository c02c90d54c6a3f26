//! Bundled UI assets (stylesheet and player script) under the reserved
//! assets prefix.
//!
//! Everything below the prefix belongs to this interceptor: a missing asset
//! is a 404 here and never reaches the file server.

use async_trait::async_trait;
use ff_core::{vfs, Error, FileSystem, MemoryFs};

use super::{match_prefix, PrefixMatch};
use crate::context::RequestContext;
use crate::pipeline::{Interceptor, Outcome};
use crate::static_files::serve_file;

const STYLE_CSS: &str = include_str!("../../assets/css/style.css");
const PLAYER_JS: &str = include_str!("../../assets/js/player.js");

/// The assets compiled into the binary.
pub fn bundled_assets() -> MemoryFs {
    MemoryFs::new()
        .with_file("/css/style.css", STYLE_CSS)
        .with_file("/js/player.js", PLAYER_JS)
}

pub struct AssetsInterceptor {
    prefix: String,
    assets: MemoryFs,
}

impl AssetsInterceptor {
    pub fn new(prefix: impl Into<String>, assets: MemoryFs) -> Self {
        Self {
            prefix: prefix.into(),
            assets,
        }
    }

    /// Serve [`bundled_assets`] under `prefix`.
    pub fn bundled(prefix: impl Into<String>) -> Self {
        Self::new(prefix, bundled_assets())
    }
}

#[async_trait]
impl Interceptor for AssetsInterceptor {
    fn name(&self) -> &'static str {
        "assets"
    }

    async fn try_handle(&self, req: &RequestContext) -> ff_core::Result<Outcome> {
        let rest = match match_prefix(&req.path, &self.prefix) {
            PrefixMatch::Outside => return Ok(Outcome::Pass),
            PrefixMatch::Bare => return Ok(Outcome::Handled(req.redirect_with_slash())),
            PrefixMatch::Under(rest) => rest,
        };

        if !req.is_read() {
            return Err(Error::MethodNotAllowed(req.method.to_string()));
        }

        let path = vfs::clean(rest)?;
        let handle = self
            .assets
            .open(&path)
            .await
            .map_err(|_| Error::not_found("asset", &path))?;
        let stat = handle.stat().await?;
        if !stat.kind.is_file() {
            return Err(Error::not_found("asset", &path));
        }

        let mut response = serve_file(req, &path, handle, &stat).await?;
        response.headers_mut().insert(
            axum::http::header::CACHE_CONTROL,
            axum::http::HeaderValue::from_static("public, max-age=3600"),
        );
        Ok(Outcome::Handled(response))
    }
}
