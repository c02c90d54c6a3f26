//! Filesystem backed by a directory on disk.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{clean, FileReader, FileSystem, Handle, Stat};
use crate::entry::Kind;
use crate::error::{Error, Result};

/// Serves the tree below `root`. Symlinks are followed.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

#[async_trait]
impl FileSystem for LocalFs {
    async fn open(&self, path: &str) -> Result<Box<dyn Handle>> {
        let path = clean(path)?;
        let real = self.resolve(&path);
        let metadata = tokio::fs::metadata(&real)
            .await
            .map_err(|e| Error::from_io(&path, e))?;

        let name = if path == "/" {
            String::new()
        } else {
            real.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        Ok(Box::new(LocalHandle {
            stat: stat_from_metadata(name, &metadata),
            path,
            real,
            dir: None,
            exhausted: false,
        }))
    }
}

struct LocalHandle {
    path: String,
    real: PathBuf,
    stat: Stat,
    dir: Option<tokio::fs::ReadDir>,
    exhausted: bool,
}

#[async_trait]
impl Handle for LocalHandle {
    async fn stat(&self) -> Result<Stat> {
        Ok(self.stat.clone())
    }

    async fn read_dir(&mut self, limit: usize) -> Result<Vec<Stat>> {
        if !self.stat.is_dir() {
            return Err(Error::Validation(format!("{} is not a directory", self.path)));
        }
        if self.exhausted {
            return Ok(Vec::new());
        }

        let mut dir = match self.dir.take() {
            Some(dir) => dir,
            None => tokio::fs::read_dir(&self.real)
                .await
                .map_err(|e| Error::from_io(&self.path, e))?,
        };

        let mut children = Vec::new();
        while limit == 0 || children.len() < limit {
            let Some(child) = dir
                .next_entry()
                .await
                .map_err(|e| Error::from_io(&self.path, e))?
            else {
                self.exhausted = true;
                break;
            };

            let name = child.file_name().to_string_lossy().into_owned();
            // Follow symlinks; a dangling link is still listed, as itself.
            let metadata = match tokio::fs::metadata(child.path()).await {
                Ok(m) => m,
                Err(_) => child
                    .metadata()
                    .await
                    .map_err(|e| Error::from_io(&self.path, e))?,
            };
            children.push(stat_from_metadata(name, &metadata));
        }

        if !self.exhausted {
            self.dir = Some(dir);
        }
        Ok(children)
    }

    async fn into_reader(self: Box<Self>) -> Result<Box<dyn FileReader>> {
        if self.stat.is_dir() {
            return Err(Error::Validation(format!("{} is a directory", self.path)));
        }
        let file = tokio::fs::File::open(&self.real)
            .await
            .map_err(|e| Error::from_io(&self.path, e))?;
        Ok(Box::new(file))
    }
}

fn stat_from_metadata(name: String, metadata: &Metadata) -> Stat {
    let kind = if metadata.is_dir() {
        Kind::Directory
    } else if metadata.is_file() {
        Kind::File
    } else {
        Kind::Other
    };

    let mod_time = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));

    Stat {
        name,
        size: metadata.len(),
        mod_time,
        kind,
    }
}
