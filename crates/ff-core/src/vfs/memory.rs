//! Immutable in-memory filesystem.
//!
//! Used for the bundled UI assets and as a deterministic fixture in tests:
//! directory children are listed in insertion order.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{clean, join, parent, FileReader, FileSystem, Handle, Stat};
use crate::entry::Kind;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
enum Node {
    File {
        data: Arc<[u8]>,
        mod_time: DateTime<Utc>,
    },
    Dir {
        children: Vec<String>,
        mod_time: DateTime<Utc>,
    },
}

/// A tree of files held in memory. Built once, then only read.
#[derive(Debug, Clone)]
pub struct MemoryFs {
    nodes: HashMap<String, Node>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// An empty filesystem containing only the root directory.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            "/".to_string(),
            Node::Dir {
                children: Vec::new(),
                mod_time: epoch(),
            },
        );
        Self { nodes }
    }

    /// Add a file, creating missing parent directories.
    pub fn with_file(self, path: &str, data: impl AsRef<[u8]>) -> Self {
        self.with_file_at(path, data, epoch())
    }

    /// Add a file with an explicit modification time.
    pub fn with_file_at(
        mut self,
        path: &str,
        data: impl AsRef<[u8]>,
        mod_time: DateTime<Utc>,
    ) -> Self {
        let node = Node::File {
            data: Arc::from(data.as_ref()),
            mod_time,
        };
        self.insert(path, node);
        self
    }

    /// Add an empty directory with an explicit modification time.
    pub fn with_dir_at(mut self, path: &str, mod_time: DateTime<Utc>) -> Self {
        let node = Node::Dir {
            children: Vec::new(),
            mod_time,
        };
        self.insert(path, node);
        self
    }

    fn insert(&mut self, path: &str, node: Node) {
        let Some(path) = super::normalize(path) else {
            return;
        };
        if path == "/" {
            return;
        }
        self.ensure_dir(parent(&path));
        self.link(&path);

        // Keep children of a directory that was created implicitly.
        if let Node::Dir { mod_time, .. } = &node {
            if let Some(Node::Dir { children, .. }) = self.nodes.get(&path) {
                let merged = Node::Dir {
                    children: children.clone(),
                    mod_time: *mod_time,
                };
                self.nodes.insert(path, merged);
                return;
            }
        }
        self.nodes.insert(path, node);
    }

    fn ensure_dir(&mut self, path: &str) {
        if self.nodes.contains_key(path) {
            return;
        }
        self.ensure_dir(parent(path));
        self.link(path);
        self.nodes.insert(
            path.to_string(),
            Node::Dir {
                children: Vec::new(),
                mod_time: epoch(),
            },
        );
    }

    fn link(&mut self, path: &str) {
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        if let Some(Node::Dir { children, .. }) = self.nodes.get_mut(parent(path)) {
            if !children.contains(&name) {
                children.push(name);
            }
        }
    }

    fn stat_of(&self, path: &str) -> Option<Stat> {
        let name = if path == "/" {
            String::new()
        } else {
            path.rsplit('/').next().unwrap_or_default().to_string()
        };
        let stat = match self.nodes.get(path)? {
            Node::File { data, mod_time } => Stat {
                name,
                size: data.len() as u64,
                mod_time: *mod_time,
                kind: Kind::File,
            },
            Node::Dir { mod_time, .. } => Stat {
                name,
                size: 0,
                mod_time: *mod_time,
                kind: Kind::Directory,
            },
        };
        Some(stat)
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from(std::time::UNIX_EPOCH)
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn open(&self, path: &str) -> Result<Box<dyn Handle>> {
        let path = clean(path)?;
        let stat = self
            .stat_of(&path)
            .ok_or_else(|| Error::not_found("path", &path))?;

        let (data, children) = match self.nodes.get(&path) {
            Some(Node::File { data, .. }) => (Some(data.clone()), Vec::new()),
            Some(Node::Dir { children, .. }) => (
                None,
                children
                    .iter()
                    .filter_map(|name| self.stat_of(&join(&path, name)))
                    .collect(),
            ),
            None => return Err(Error::not_found("path", &path)),
        };

        Ok(Box::new(MemoryHandle {
            path,
            stat,
            data,
            children,
            cursor: 0,
        }))
    }
}

struct MemoryHandle {
    path: String,
    stat: Stat,
    data: Option<Arc<[u8]>>,
    children: Vec<Stat>,
    cursor: usize,
}

#[async_trait]
impl Handle for MemoryHandle {
    async fn stat(&self) -> Result<Stat> {
        Ok(self.stat.clone())
    }

    async fn read_dir(&mut self, limit: usize) -> Result<Vec<Stat>> {
        if !self.stat.is_dir() {
            return Err(Error::Validation(format!("{} is not a directory", self.path)));
        }
        let remaining = &self.children[self.cursor..];
        let take = if limit == 0 {
            remaining.len()
        } else {
            limit.min(remaining.len())
        };
        let page = remaining[..take].to_vec();
        self.cursor += take;
        Ok(page)
    }

    async fn into_reader(self: Box<Self>) -> Result<Box<dyn FileReader>> {
        match self.data {
            Some(data) => Ok(Box::new(Cursor::new(data))),
            None => Err(Error::Validation(format!("{} is a directory", self.path))),
        }
    }
}
