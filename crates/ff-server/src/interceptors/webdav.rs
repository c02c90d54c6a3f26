//! Read-only WebDAV.
//!
//! Selected by HTTP method rather than path. `OPTIONS` and `PROPFIND` are
//! answered from the filesystem; every method that would modify it is
//! refused with 403.

use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use ff_core::{vfs, Error, FileSystem, Kind, Stat};
use ff_media::mime;
use html_escape::encode_text;

use crate::context::{encode_path, RequestContext};
use crate::pipeline::{Interceptor, Outcome};
use crate::static_files::http_date;

/// Methods that modify the tree or take locks.
const WRITE_METHODS: [&str; 8] = [
    "PROPPATCH", "MKCOL", "POST", "DELETE", "COPY", "MOVE", "LOCK", "UNLOCK",
];

const ALLOW: &str = "OPTIONS, GET, HEAD, PROPFIND";

pub struct WebDavInterceptor {
    fs: Arc<dyn FileSystem>,
}

impl WebDavInterceptor {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    async fn propfind(&self, req: &RequestContext) -> ff_core::Result<Response> {
        let depth = parse_depth(
            req.headers
                .get("depth")
                .and_then(|v| v.to_str().ok()),
        )?;

        let path = vfs::clean(&req.path)?;
        let mut handle = self.fs.open(&path).await?;
        let stat = handle.stat().await?;

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<D:multistatus xmlns:D=\"DAV:\">\n",
        );
        write_response(&mut xml, &path, &stat);

        if depth > 0 && stat.is_dir() {
            for child in handle.read_dir(0).await? {
                let child_path = vfs::join(&path, &child.name);
                write_response(&mut xml, &child_path, &child);
            }
        }
        xml.push_str("</D:multistatus>\n");

        Response::builder()
            .status(StatusCode::MULTI_STATUS)
            .header(header::CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(Body::from(xml))
            .map_err(|e| Error::Internal(format!("failed to build response: {e}")))
    }
}

#[async_trait]
impl Interceptor for WebDavInterceptor {
    fn name(&self) -> &'static str {
        "webdav"
    }

    async fn try_handle(&self, req: &RequestContext) -> ff_core::Result<Outcome> {
        let method = req.method.as_str().to_ascii_uppercase();
        match method.as_str() {
            "OPTIONS" => {
                let response = Response::builder()
                    .status(StatusCode::OK)
                    .header("dav", "1")
                    .header(header::ALLOW, ALLOW)
                    .header("ms-author-via", "DAV")
                    .header(header::CONTENT_LENGTH, "0")
                    .body(Body::empty())
                    .map_err(|e| Error::Internal(format!("failed to build response: {e}")))?;
                Ok(Outcome::Handled(response))
            }
            "PROPFIND" => Ok(Outcome::Handled(self.propfind(req).await?)),
            m if WRITE_METHODS.contains(&m) => Err(Error::Forbidden(format!(
                "{m} {}: filesystem is read-only",
                req.path
            ))),
            _ => Ok(Outcome::Pass),
        }
    }
}

/// `0` or `1`; a missing header and `infinity` are treated as `1`.
fn parse_depth(value: Option<&str>) -> ff_core::Result<u8> {
    match value.map(str::trim) {
        None => Ok(1),
        Some("0") => Ok(0),
        Some("1") => Ok(1),
        Some(v) if v.eq_ignore_ascii_case("infinity") => Ok(1),
        Some(v) => Err(Error::Validation(format!("invalid Depth header {v:?}"))),
    }
}

fn write_response(xml: &mut String, path: &str, stat: &Stat) {
    let mut href = encode_path(path);
    if stat.is_dir() && !href.ends_with('/') {
        href.push('/');
    }

    let _ = write!(
        xml,
        "<D:response><D:href>{}</D:href><D:propstat><D:prop>",
        encode_text(&href)
    );
    let _ = write!(
        xml,
        "<D:displayname>{}</D:displayname>",
        encode_text(&stat.name)
    );
    match stat.kind {
        Kind::Directory => xml.push_str("<D:resourcetype><D:collection/></D:resourcetype>"),
        _ => {
            xml.push_str("<D:resourcetype/>");
            let _ = write!(
                xml,
                "<D:getcontentlength>{}</D:getcontentlength><D:getcontenttype>{}</D:getcontenttype>",
                stat.size,
                encode_text(&mime::content_type(path))
            );
        }
    }
    let _ = write!(
        xml,
        "<D:getlastmodified>{}</D:getlastmodified>",
        http_date(stat.mod_time)
    );
    xml.push_str("</D:prop><D:status>HTTP/1.1 200 OK</D:status></D:propstat></D:response>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use ff_core::MemoryFs;
    use http_body_util::BodyExt;

    fn dav() -> WebDavInterceptor {
        let fs = MemoryFs::new()
            .with_file("/docs/a b.txt", "hello")
            .with_file("/docs/inner/c.txt", "x");
        WebDavInterceptor::new(Arc::new(fs))
    }

    fn request(method: &str, uri: &str, depth: Option<&str>) -> RequestContext {
        let mut builder = axum::http::Request::builder()
            .method(Method::from_bytes(method.as_bytes()).unwrap())
            .uri(uri);
        if let Some(depth) = depth {
            builder = builder.header("depth", depth);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        RequestContext::from_parts(&parts)
    }

    async fn body(outcome: Outcome) -> (StatusCode, String) {
        let Outcome::Handled(response) = outcome else {
            panic!("expected a response");
        };
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn options_advertises_dav() {
        let outcome = dav().try_handle(&request("OPTIONS", "/", None)).await.unwrap();
        let Outcome::Handled(response) = outcome else {
            panic!("expected a response");
        };
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["dav"], "1");
        assert_eq!(response.headers()["ms-author-via"], "DAV");
        assert!(response.headers()[header::ALLOW]
            .to_str()
            .unwrap()
            .contains("PROPFIND"));
    }

    #[tokio::test]
    async fn propfind_depth_one_lists_children() {
        let outcome = dav()
            .try_handle(&request("PROPFIND", "/docs", Some("1")))
            .await
            .unwrap();
        let (status, xml) = body(outcome).await;
        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert!(xml.contains("<D:href>/docs/</D:href>"));
        assert!(xml.contains("<D:href>/docs/a%20b.txt</D:href>"));
        assert!(xml.contains("<D:href>/docs/inner/</D:href>"));
        assert!(xml.contains("<D:getcontentlength>5</D:getcontentlength>"));
        assert!(xml.contains("<D:collection/>"));
    }

    #[tokio::test]
    async fn propfind_depth_zero_is_self_only() {
        let outcome = dav()
            .try_handle(&request("PROPFIND", "/docs", Some("0")))
            .await
            .unwrap();
        let (_, xml) = body(outcome).await;
        assert_eq!(xml.matches("<D:response>").count(), 1);
    }

    #[tokio::test]
    async fn propfind_missing_is_not_found() {
        let err = dav()
            .try_handle(&request("PROPFIND", "/nope", None))
            .await
            .err()
            .unwrap();
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn bad_depth_is_rejected() {
        let err = dav()
            .try_handle(&request("PROPFIND", "/docs", Some("2")))
            .await
            .err()
            .unwrap();
        assert_eq!(err.http_status(), 400);
    }

    #[tokio::test]
    async fn writes_are_forbidden() {
        for method in WRITE_METHODS {
            let err = dav()
                .try_handle(&request(method, "/docs/a%20b.txt", None))
                .await
                .err()
                .unwrap();
            assert_eq!(err.http_status(), 403, "{method}");
        }
    }

    #[tokio::test]
    async fn get_passes() {
        let outcome = dav().try_handle(&request("GET", "/docs", None)).await.unwrap();
        assert!(matches!(outcome, Outcome::Pass));
    }

    #[test]
    fn depth_values() {
        assert_eq!(parse_depth(None).unwrap(), 1);
        assert_eq!(parse_depth(Some("infinity")).unwrap(), 1);
        assert_eq!(parse_depth(Some("0")).unwrap(), 0);
        assert!(parse_depth(Some("x")).is_err());
    }
}
