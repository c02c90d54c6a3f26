//! ff-core: shared types, errors, configuration, the virtual filesystem
//! contract and the directory sort engine.
//!
//! Every other ff-* crate depends on this one. Nothing here knows about
//! HTTP; the server crate maps [`Error`] onto status codes.

pub mod config;
pub mod entry;
pub mod error;
pub mod sort;
pub mod vfs;

// Re-export the most commonly used items at the crate root.
pub use entry::{Entry, Kind};
pub use error::{Error, Result};
pub use sort::{SortField, SortKey, SortSpec};
pub use vfs::{FileReader, FileSystem, Handle, LocalFs, MemoryFs, Stat};
