//! Shared application state and the per-request context.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use ff_core::config::Config;
use ff_core::FileSystem;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::interceptors;
use crate::middleware::request_id::RequestId;
use crate::pipeline::Pipeline;

/// Shared application state, cloned into every request.
///
/// The pipeline holds everything built from the configuration at startup;
/// requests only read it.
#[derive(Clone)]
pub struct AppContext {
    pub pipeline: Arc<Pipeline>,
}

impl AppContext {
    /// Build the standard interceptor pipeline over `fs`.
    pub fn new(config: Config, fs: Arc<dyn FileSystem>) -> Self {
        Self::with_pipeline(interceptors::standard_pipeline(&config, fs))
    }

    /// Serve a custom pipeline, e.g. one interceptor and a stub terminal.
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Everything an interceptor may look at, extracted once per request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    /// Percent-decoded request path, not yet normalized.
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    /// `host[:port]` the client addressed.
    pub host: String,
    /// `http` unless the URI says otherwise.
    pub scheme: String,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn from_parts(parts: &Parts) -> Self {
        let uri = parts.uri.clone();
        let path = percent_decode_str(uri.path())
            .decode_utf8_lossy()
            .into_owned();
        let query = Query::<HashMap<String, String>>::try_from_uri(&uri)
            .map(|Query(q)| q)
            .unwrap_or_default();

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .or_else(|| uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        let scheme = uri
            .scheme_str()
            .map(String::from)
            .unwrap_or_else(|| "http".to_string());

        Self {
            method: parts.method.clone(),
            path,
            query,
            headers: parts.headers.clone(),
            host,
            scheme,
            request_id: parts.extensions.get::<RequestId>().map(|id| id.0.clone()),
            uri,
        }
    }

    /// Build a context for `GET uri`, mostly for tests.
    pub fn get(uri: &str) -> Self {
        let (parts, ()) = axum::http::Request::get(uri)
            .body(())
            .unwrap_or_default()
            .into_parts();
        Self::from_parts(&parts)
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// The `mode` query parameter (`videoplayer`, `vtt`).
    pub fn mode(&self) -> Option<&str> {
        self.query("mode")
    }

    /// The raw `sort` query parameter.
    pub fn sort(&self) -> Option<&str> {
        self.query("sort")
    }

    pub fn is_read(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Absolute URL for a root-relative path, from the request's scheme
    /// and host.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme, self.host, encode_path(path))
    }

    /// 301 to the same URL with a trailing slash, query preserved.
    pub fn redirect_with_slash(&self) -> Response {
        let mut location = format!("{}/", self.uri.path());
        if let Some(q) = self.uri.query() {
            location.push('?');
            location.push_str(q);
        }
        redirect(&location)
    }
}

/// Permanent redirect to `location`.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Characters escaped inside one path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

/// Percent-encode a single path segment (a file name).
pub fn encode_segment(name: &str) -> String {
    utf8_percent_encode(name, SEGMENT).to_string()
}

/// Percent-encode a slash-separated path, keeping the slashes.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}
