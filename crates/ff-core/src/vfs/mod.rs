//! Virtual filesystem contract.
//!
//! The server only ever reads through these traits. A [`FileSystem`] opens
//! root-relative, slash-separated paths into [`Handle`]s; a handle can be
//! stat'ed, read as a directory in pages, or turned into a byte reader.
//! Dropping a handle closes it.
//!
//! Implementations must tolerate unsynchronized concurrent `open` calls.

mod local;
mod memory;

pub use local::LocalFs;
pub use memory::MemoryFs;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncSeek};

use crate::entry::Kind;
use crate::error::{Error, Result};

/// Result of stat'ing a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    /// Base name; empty for the root.
    pub name: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
    pub kind: Kind,
}

impl Stat {
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Seekable byte reader over an opened file.
pub trait FileReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T> FileReader for T where T: AsyncRead + AsyncSeek + Send + Unpin {}

/// Read-only filesystem rooted somewhere.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Open `path`. Missing paths yield [`Error::NotFound`], refused ones
    /// [`Error::Forbidden`].
    async fn open(&self, path: &str) -> Result<Box<dyn Handle>>;
}

/// An opened file or directory.
#[async_trait]
pub trait Handle: Send {
    async fn stat(&self) -> Result<Stat>;

    /// Read up to `limit` children in filesystem order, continuing where
    /// the previous call stopped. `limit == 0` reads everything left. An
    /// exhausted directory returns an empty list.
    async fn read_dir(&mut self, limit: usize) -> Result<Vec<Stat>>;

    /// Consume the handle and read it as bytes. Fails for directories.
    async fn into_reader(self: Box<Self>) -> Result<Box<dyn FileReader>>;
}

/// Clean a request path into `/a/b` form.
///
/// `.` and empty segments are dropped and `..` pops a segment. Returns
/// `None` when `..` would climb above the root. Backslashes and NUL bytes
/// are refused outright.
pub fn normalize(path: &str) -> Option<String> {
    if path.contains('\0') || path.contains('\\') {
        return None;
    }

    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }

    Some(format!("/{}", parts.join("/")))
}

/// Normalize `path` or fail with [`Error::NotFound`].
pub fn clean(path: &str) -> Result<String> {
    normalize(path).ok_or_else(|| Error::not_found("path", path))
}

/// Join a child name onto a normalized directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Parent of a normalized path; the root is its own parent.
pub fn parent(path: &str) -> &str {
    match path.trim_end_matches('/').rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// Open `path` and stat it in one go.
pub async fn stat(fs: &dyn FileSystem, path: &str) -> Result<Stat> {
    fs.open(path).await?.stat().await
}
