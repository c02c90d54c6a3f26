//! `*.srt?mode=vtt`: stream a SubRip file to the client as WebVTT.
//!
//! The file is converted while it is copied; the body holds the open
//! reader, so a client that disconnects drops it and closes the file.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use ff_core::{vfs, Error, FileSystem};
use ff_media::subtitle::is_srt;
use ff_media::SrtToVttReader;
use tokio_util::io::ReaderStream;

use crate::context::RequestContext;
use crate::pipeline::{Interceptor, Outcome};

pub const VTT_CONTENT_TYPE: &str = "text/vtt; charset=utf-8";

pub struct SubtitleInterceptor {
    fs: Arc<dyn FileSystem>,
    chunk_size: usize,
}

impl SubtitleInterceptor {
    pub fn new(fs: Arc<dyn FileSystem>, chunk_size: usize) -> Self {
        Self {
            fs,
            chunk_size: chunk_size.max(64),
        }
    }
}

#[async_trait]
impl Interceptor for SubtitleInterceptor {
    fn name(&self) -> &'static str {
        "subtitle"
    }

    async fn try_handle(&self, req: &RequestContext) -> ff_core::Result<Outcome> {
        if req.mode() != Some("vtt") || !req.is_read() || !is_srt(&req.path) {
            return Ok(Outcome::Pass);
        }

        let path = vfs::clean(&req.path)?;
        let handle = self.fs.open(&path).await?;
        let stat = handle.stat().await?;
        if stat.is_dir() {
            return Ok(Outcome::Pass);
        }

        let body = if req.is_head() {
            Body::empty()
        } else {
            let reader = handle.into_reader().await?;
            let vtt = SrtToVttReader::with_chunk_size(reader, self.chunk_size);
            Body::from_stream(ReaderStream::new(vtt))
        };
        tracing::debug!(path = %path, size = stat.size, "Transcoding subtitle to WebVTT");

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, VTT_CONTENT_TYPE)
            .header(header::CACHE_CONTROL, "no-cache")
            .body(body)
            .map_err(|e| Error::Internal(format!("failed to build response: {e}")))?;
        Ok(Outcome::Handled(response))
    }
}
