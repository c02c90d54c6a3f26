//! Unified error type for fileforged.
//!
//! Filesystem failures are translated into [`Error`] once, at the point of
//! contact (see [`Error::from_io`]), and carry enough information for the
//! server to derive an HTTP status via [`Error::http_status`].

use std::fmt;
use std::io;

/// Unified error type covering every failure mode the server reports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested path or entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "path", "asset").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Access was refused, either by the filesystem or because the
    /// operation would write.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A `sort` query token names no known field.
    #[error("unsupported sorting {token:?}")]
    UnsupportedSort {
        /// The offending token, exactly as it appeared in the query.
        token: String,
    },

    /// The HTTP method is not served at this location.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Forbidden(_) => 403,
            Error::Validation(_) => 400,
            Error::UnsupportedSort { .. } => 400,
            Error::MethodNotAllowed(_) => 405,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Forbidden(_) => "forbidden",
            Error::Validation(_) => "validation_error",
            Error::UnsupportedSort { .. } => "unsupported_sort",
            Error::MethodNotAllowed(_) => "method_not_allowed",
            Error::Io { .. } => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::UnsupportedSort`].
    pub fn unsupported_sort(token: impl Into<String>) -> Self {
        Error::UnsupportedSort {
            token: token.into(),
        }
    }

    /// Translate a filesystem error for `path` into the taxonomy.
    pub fn from_io(path: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::not_found("path", display_path(path)),
            io::ErrorKind::PermissionDenied => {
                Error::Forbidden(format!("permission denied: {}", display_path(path)))
            }
            _ => Error::Io { source: err },
        }
    }

    /// True for errors whose detail must not be shown to clients.
    pub fn is_internal(&self) -> bool {
        self.http_status() >= 500
    }
}

fn display_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
