//! ff-media: media-aware helpers used by the fileforged interceptors.
//!
//! - [`subtitle`]: streaming SRT to WebVTT conversion and sibling subtitle
//!   naming for the video player page.
//! - [`mime`]: content type detection by file extension.

pub mod mime;
pub mod subtitle;

pub use subtitle::{SrtToVttReader, SubtitleFormat, SubtitleTrack, VTT_HEADER};
