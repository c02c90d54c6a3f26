//! The interceptors, in the order the standard pipeline registers them.
//!
//! API and assets own a reserved URL prefix each. WebDAV is selected by
//! HTTP method. The video player and subtitle interceptors are selected by
//! the `mode` query parameter on ordinary paths.

pub mod api;
pub mod assets;
pub mod player;
pub mod subtitle;
pub mod webdav;

use std::sync::Arc;

use ff_core::config::Config;
use ff_core::FileSystem;

use crate::pipeline::{Interceptor, Pipeline};
use crate::render::PageAssets;
use crate::terminal::FileServer;

pub use api::ApiInterceptor;
pub use assets::AssetsInterceptor;
pub use player::PlayerInterceptor;
pub use subtitle::SubtitleInterceptor;
pub use webdav::WebDavInterceptor;

/// Build the pipeline every server runs.
pub fn standard_pipeline(config: &Config, fs: Arc<dyn FileSystem>) -> Pipeline {
    let assets = PageAssets::from_config(config);

    let interceptors: Vec<Box<dyn Interceptor>> = vec![
        Box::new(ApiInterceptor::new(config, fs.clone())),
        Box::new(AssetsInterceptor::bundled(config.routes.assets_prefix())),
        Box::new(WebDavInterceptor::new(fs.clone())),
        Box::new(PlayerInterceptor::new(fs.clone(), assets.clone())),
        Box::new(SubtitleInterceptor::new(fs.clone(), config.transcode.chunk_size)),
    ];

    Pipeline::new(interceptors, Box::new(FileServer::new(config, fs, assets)))
}

/// Where a request path sits relative to a reserved prefix.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PrefixMatch<'a> {
    /// Exactly the prefix, no trailing slash.
    Bare,
    /// Below the prefix; the remainder has no leading slash.
    Under(&'a str),
    Outside,
}

pub(crate) fn match_prefix<'a>(path: &'a str, prefix: &str) -> PrefixMatch<'a> {
    match path.strip_prefix(prefix) {
        Some("") => PrefixMatch::Bare,
        Some(rest) => match rest.strip_prefix('/') {
            Some(rest) => PrefixMatch::Under(rest),
            None => PrefixMatch::Outside,
        },
        None => PrefixMatch::Outside,
    }
}
