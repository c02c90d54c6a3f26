//! The file server at the end of the pipeline.
//!
//! Directories are answered with their `index.html` when one exists,
//! otherwise with a generated listing; regular files are streamed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::{Html, IntoResponse, Response};
use ff_core::config::Config;
use ff_core::{vfs, Error, FileSystem, Kind};

use crate::context::RequestContext;
use crate::listing::{read_listing, ListingOptions};
use crate::pipeline::Terminal;
use crate::render::{listing_page, Listing, PageAssets};
use crate::static_files::serve_file;

pub struct FileServer {
    fs: Arc<dyn FileSystem>,
    options: ListingOptions,
    assets: PageAssets,
}

impl FileServer {
    pub fn new(config: &Config, fs: Arc<dyn FileSystem>, assets: PageAssets) -> Self {
        Self {
            fs,
            options: ListingOptions::from_config(config),
            assets,
        }
    }

    /// Serve `<dir>/index.html` if it is a regular file.
    ///
    /// `None` when there is no such file; any other failure to open or stat
    /// it is returned as is.
    async fn try_index(&self, req: &RequestContext, dir: &str) -> Option<ff_core::Result<Response>> {
        let index_path = vfs::join(dir, "index.html");
        let handle = match self.fs.open(&index_path).await {
            Ok(handle) => handle,
            Err(Error::NotFound { .. }) => return None,
            Err(e) => return Some(Err(e)),
        };
        let stat = match handle.stat().await {
            Ok(stat) => stat,
            Err(e) => return Some(Err(e)),
        };
        if !stat.kind.is_file() {
            tracing::debug!(path = %index_path, "Index is not a regular file, listing instead");
            return None;
        }
        Some(serve_file(req, &index_path, handle, &stat).await)
    }
}

#[async_trait]
impl Terminal for FileServer {
    async fn serve(&self, req: &RequestContext) -> ff_core::Result<Response> {
        if !req.is_read() {
            return Err(Error::MethodNotAllowed(req.method.to_string()));
        }

        let path = vfs::clean(&req.path)?;
        let mut handle = self.fs.open(&path).await?;
        let stat = handle.stat().await?;

        match stat.kind {
            Kind::Directory => {
                if !req.path.ends_with('/') {
                    return Ok(req.redirect_with_slash());
                }
                if let Some(index) = self.try_index(req, &path).await {
                    return index;
                }

                let listing = read_listing(handle.as_mut(), &path, req.sort(), &self.options).await?;
                if req.is_head() {
                    return Ok(Html("").into_response());
                }
                let page = listing_page(&Listing {
                    path: &path,
                    entries: &listing.entries,
                    sort: &listing.sort,
                    rejected: &listing.rejected,
                    assets: &self.assets,
                });
                Ok(Html(page).into_response())
            }
            Kind::File => serve_file(req, &path, handle, &stat).await,
            Kind::Other => Err(Error::Forbidden(format!("{path} is not a regular file"))),
        }
    }
}
