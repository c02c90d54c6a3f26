//! `?mode=videoplayer`: an HTML5 player page for a video file, with any
//! sibling `.vtt`/`.srt` subtitles attached as tracks.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use ff_core::{vfs, Error, FileSystem};
use ff_media::subtitle::sibling_tracks;
use ff_media::SubtitleTrack;

use crate::context::RequestContext;
use crate::pipeline::{Interceptor, Outcome};
use crate::render::{player_page, PageAssets, Player};

pub struct PlayerInterceptor {
    fs: Arc<dyn FileSystem>,
    assets: PageAssets,
}

impl PlayerInterceptor {
    pub fn new(fs: Arc<dyn FileSystem>, assets: PageAssets) -> Self {
        Self { fs, assets }
    }

    /// Sibling subtitle files that exist. Only a directory of the same
    /// name is excluded.
    async fn tracks(&self, path: &str) -> Vec<SubtitleTrack> {
        let mut found = Vec::new();
        for track in sibling_tracks(path) {
            match vfs::stat(self.fs.as_ref(), &track.path).await {
                Ok(stat) if !stat.is_dir() => found.push(track),
                Ok(_) => {}
                Err(e) => tracing::trace!(path = %track.path, error = %e, "No subtitle track"),
            }
        }
        found
    }
}

#[async_trait]
impl Interceptor for PlayerInterceptor {
    fn name(&self) -> &'static str {
        "player"
    }

    async fn try_handle(&self, req: &RequestContext) -> ff_core::Result<Outcome> {
        if req.mode() != Some("videoplayer") || !req.is_read() {
            return Ok(Outcome::Pass);
        }

        let path = vfs::clean(&req.path)?;
        let stat = vfs::stat(self.fs.as_ref(), &path).await?;
        if !stat.kind.is_file() {
            return Err(Error::Validation(format!(
                "{path} is not a file and cannot be played"
            )));
        }

        let tracks = self.tracks(&path).await;
        let page = player_page(&Player {
            path: &path,
            tracks: &tracks,
            assets: &self.assets,
        });

        let mut response = Html(page).into_response();
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-cache"),
        );
        Ok(Outcome::Handled(response))
    }
}
