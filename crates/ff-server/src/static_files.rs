//! Static file serving with HTTP range requests.
//!
//! Serves an opened file as a streamed body. A single `Range: bytes=`
//! request yields 206 (or 416 when it cannot be satisfied); anything else
//! gets the whole file.

use std::io::SeekFrom;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};
use ff_core::{Error, Handle, Stat};
use ff_media::mime;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::context::RequestContext;

/// Outcome of interpreting a `Range` header against a file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range; serve everything.
    Full,
    /// Inclusive byte offsets.
    Partial { start: u64, end: u64 },
    /// Syntactically fine but outside the file.
    Unsatisfiable,
}

/// Serve the file behind `handle`. `path` picks the content type.
pub async fn serve_file(
    req: &RequestContext,
    path: &str,
    handle: Box<dyn Handle>,
    stat: &Stat,
) -> ff_core::Result<Response> {
    let file_size = stat.size;

    let range = req
        .headers
        .get(header::RANGE)
        .and_then(|h| h.to_str().ok())
        .map(|s| parse_range_header(s, file_size))
        .unwrap_or(ByteRange::Full);

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, mime::content_type(path))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::LAST_MODIFIED, http_date(stat.mod_time));

    let response = match range {
        ByteRange::Unsatisfiable => builder
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{file_size}"))
            .body(Body::empty()),
        ByteRange::Partial { start, end } => {
            let length = end - start + 1;
            let body = if req.is_head() {
                Body::empty()
            } else {
                let mut reader = handle.into_reader().await?;
                reader
                    .seek(SeekFrom::Start(start))
                    .await
                    .map_err(|e| Error::from_io(path, e))?;
                Body::from_stream(ReaderStream::new(reader.take(length)))
            };

            builder
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_LENGTH, length.to_string())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{file_size}"),
                )
                .body(body)
        }
        ByteRange::Full => {
            let body = if req.is_head() {
                Body::empty()
            } else {
                let reader = handle.into_reader().await?;
                Body::from_stream(ReaderStream::new(reader))
            };

            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, file_size.to_string())
                .body(body)
        }
    };

    response.map_err(|e| Error::Internal(format!("failed to build response: {e}")))
}

/// Format a timestamp as an HTTP date (RFC 7231 IMF-fixdate).
pub fn http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse HTTP Range header.
///
/// Supports formats:
/// - bytes=0-499
/// - bytes=500-
/// - bytes=-500 (last 500 bytes)
///
/// Multi-range and malformed headers are ignored and yield
/// [`ByteRange::Full`].
pub fn parse_range_header(header: &str, file_size: u64) -> ByteRange {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((start, end)) = spec.split_once('-') else {
        return ByteRange::Full;
    };
    let (start, end) = (start.trim(), end.trim());

    match (start.is_empty(), end.is_empty()) {
        // bytes=-500 (last 500 bytes)
        (true, false) => {
            let Ok(suffix_len) = end.parse::<u64>() else {
                return ByteRange::Full;
            };
            if suffix_len == 0 || file_size == 0 {
                return ByteRange::Unsatisfiable;
            }
            ByteRange::Partial {
                start: file_size.saturating_sub(suffix_len),
                end: file_size - 1,
            }
        }
        // bytes=500- (from 500 to end)
        (false, true) => {
            let Ok(start) = start.parse::<u64>() else {
                return ByteRange::Full;
            };
            if start >= file_size {
                return ByteRange::Unsatisfiable;
            }
            ByteRange::Partial {
                start,
                end: file_size - 1,
            }
        }
        // bytes=0-499
        (false, false) => {
            let (Ok(start), Ok(end)) = (start.parse::<u64>(), end.parse::<u64>()) else {
                return ByteRange::Full;
            };
            if start > end {
                return ByteRange::Full;
            }
            if start >= file_size {
                return ByteRange::Unsatisfiable;
            }
            ByteRange::Partial {
                start,
                end: end.min(file_size - 1),
            }
        }
        // bytes=- (invalid)
        (true, true) => ByteRange::Full,
    }
}
