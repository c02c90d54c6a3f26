//! Error-to-HTTP response conversion.
//!
//! Interceptors and the terminal handler return `ff_core::Result`; the
//! pipeline wraps failures in [`AppError`] to produce the response.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
pub struct AppError {
    inner: ff_core::Error,
    request_id: Option<String>,
    allow: Option<&'static str>,
}

impl AppError {
    pub fn new(inner: ff_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
            allow: None,
        }
    }

    pub fn with_request_id(mut self, id: Option<String>) -> Self {
        self.request_id = id;
        self
    }

    /// Methods to advertise in the `Allow` header of a 405.
    pub fn with_allow(mut self, methods: &'static str) -> Self {
        self.allow = Some(methods);
        self
    }
}

impl From<ff_core::Error> for AppError {
    fn from(e: ff_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Server-side detail is logged, never echoed.
        let message = if self.inner.is_internal() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                request_id = self.request_id.as_deref().unwrap_or("-"),
                "Server error while handling request"
            );
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            self.inner.to_string()
        };

        let body = json!({
            "status": "error",
            "code": status.as_u16(),
            "error": self.inner.code(),
            "message": message,
            "request_id": self.request_id,
        });

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            if let Some(allow) = self.allow {
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static(allow));
            }
        }
        response
    }
}
