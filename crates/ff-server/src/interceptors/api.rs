//! JSON metadata API under the reserved API prefix.
//!
//! - `GET <prefix>/health`
//! - `GET <prefix>/stats/<path>`: one [`FileInfo`]
//! - `GET <prefix>/lists[/<path>]`: a directory's children, sorted by `?sort=`

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::{IntoResponse, Json};
use chrono::{DateTime, Utc};
use ff_core::config::Config;
use ff_core::{vfs, Entry, Error, FileSystem, Kind};
use ff_media::mime;
use serde::Serialize;
use serde_json::json;

use super::{match_prefix, PrefixMatch};
use crate::context::RequestContext;
use crate::listing::{read_listing, ListingOptions};
use crate::pipeline::{Interceptor, Outcome};

/// A HATEOAS hypermedia reference.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Link {
    pub rel: &'static str,
    pub href: String,
}

/// JSON view of a file or directory.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    pub mtime: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl FileInfo {
    fn from_entry(entry: Entry) -> Self {
        let is_file = entry.kind.is_file();
        Self {
            mime: is_file.then(|| mime::content_type(&entry.path)),
            size: is_file.then_some(entry.size),
            name: entry.name,
            path: entry.path,
            kind: entry.kind,
            mtime: entry.mod_time,
            links: Vec::new(),
        }
    }
}

/// One skipped sort token, reported next to the items.
#[derive(Debug, Serialize)]
struct ListError {
    status: &'static str,
    code: u16,
    message: String,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    items: Vec<FileInfo>,
    errors: Vec<ListError>,
}

pub struct ApiInterceptor {
    prefix: String,
    fs: Arc<dyn FileSystem>,
    options: ListingOptions,
}

impl ApiInterceptor {
    pub fn new(config: &Config, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            prefix: config.routes.api_prefix(),
            fs,
            options: ListingOptions::from_config(config),
        }
    }

    async fn stats(&self, path: &str) -> ff_core::Result<FileInfo> {
        let path = vfs::clean(path)?;
        let stat = vfs::stat(self.fs.as_ref(), &path).await?;
        let mut info = FileInfo::from_entry(Entry::from_stat(vfs::parent(&path), stat));
        if path == "/" {
            info.name = "/".into();
            info.path = "/".into();
        }
        Ok(info)
    }

    async fn list(&self, req: &RequestContext, path: &str) -> ff_core::Result<ListResponse> {
        let path = vfs::clean(path)?;
        let mut handle = self.fs.open(&path).await?;
        if !handle.stat().await?.is_dir() {
            return Err(Error::Validation(format!("{path} is not a directory")));
        }

        let listing = read_listing(handle.as_mut(), &path, req.sort(), &self.options).await?;

        let items = listing
            .entries
            .into_iter()
            .map(|entry| {
                let mut links = vec![
                    Link {
                        rel: "self",
                        href: req.absolute_url(&entry.path),
                    },
                    Link {
                        rel: "stat",
                        href: req.absolute_url(&format!("{}/stats{}", self.prefix, entry.path)),
                    },
                ];
                if entry.is_dir() {
                    links.push(Link {
                        rel: "list",
                        href: req.absolute_url(&format!("{}/lists{}", self.prefix, entry.path)),
                    });
                }
                FileInfo {
                    links,
                    ..FileInfo::from_entry(entry)
                }
            })
            .collect();

        let errors = listing
            .rejected
            .into_iter()
            .map(|token| ListError {
                status: "error",
                code: 400,
                message: Error::unsupported_sort(token).to_string(),
            })
            .collect();

        Ok(ListResponse { items, errors })
    }
}

#[async_trait]
impl Interceptor for ApiInterceptor {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn try_handle(&self, req: &RequestContext) -> ff_core::Result<Outcome> {
        let rest = match match_prefix(&req.path, &self.prefix) {
            PrefixMatch::Outside => return Ok(Outcome::Pass),
            PrefixMatch::Bare => return Ok(Outcome::Handled(req.redirect_with_slash())),
            PrefixMatch::Under(rest) => rest.trim_end_matches('/'),
        };

        if !req.is_read() {
            return Err(Error::MethodNotAllowed(req.method.to_string()));
        }

        let (endpoint, path) = rest.split_once('/').unwrap_or((rest, ""));
        let response = match endpoint {
            "health" if path.is_empty() => Json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
            }))
            .into_response(),
            "stats" => Json(self.stats(path).await?).into_response(),
            "lists" => Json(self.list(req, path).await?).into_response(),
            _ => return Err(Error::not_found("API endpoint", &req.path)),
        };
        Ok(Outcome::Handled(response))
    }
}
