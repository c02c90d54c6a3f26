//! Normalized directory entries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::vfs::{self, Stat};

/// What a path refers to, decided once when it is stat'ed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    File,
    Directory,
    Other,
}

impl Kind {
    pub fn is_dir(self) -> bool {
        self == Kind::Directory
    }

    pub fn is_file(self) -> bool {
        self == Kind::File
    }

    /// Label used in JSON and listings.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::File => "file",
            Kind::Directory => "directory",
            Kind::Other => "other",
        }
    }
}

/// A file or directory inside a listing.
///
/// `path` is root-relative with a leading slash and can always be handed
/// back to [`crate::FileSystem::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub path: String,
    pub kind: Kind,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
}

impl Entry {
    /// Build the entry for `stat`, a child of the directory at `parent`.
    pub fn from_stat(parent: &str, stat: Stat) -> Self {
        let path = vfs::join(parent, &stat.name);
        Self {
            name: stat.name,
            path,
            kind: stat.kind,
            size: stat.size,
            mod_time: stat.mod_time,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    /// Names starting with a dot; listings drop them when `listing.show_hidden` is off.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}
