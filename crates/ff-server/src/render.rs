//! HTML pages generated by the server: directory listings and the video
//! player. Markup is assembled by hand; every interpolated value goes
//! through `html_escape`.

use std::fmt::Write;

use ff_core::config::Config;
use ff_core::{Entry, SortField, SortKey, SortSpec};
use ff_media::{mime, SubtitleFormat, SubtitleTrack};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::context::{encode_path, encode_segment};

/// Stylesheet and script URLs linked from every generated page.
#[derive(Debug, Clone, Default)]
pub struct PageAssets {
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
}

impl PageAssets {
    /// Resolve the configured URLs; relative ones live under the asset
    /// prefix.
    pub fn from_config(config: &Config) -> Self {
        let prefix = config.routes.assets_prefix();
        let resolve = |urls: &[String]| -> Vec<String> {
            urls.iter().map(|url| resolve_asset(&prefix, url)).collect()
        };
        Self {
            stylesheets: resolve(&config.player.stylesheets),
            scripts: resolve(&config.player.scripts),
        }
    }

    fn head(&self, out: &mut String) {
        for href in &self.stylesheets {
            let _ = writeln!(out, r#"<link rel="stylesheet" href="{}">"#, attr(href));
        }
    }

    fn tail(&self, out: &mut String) {
        for src in &self.scripts {
            let _ = writeln!(out, r#"<script src="{}"></script>"#, attr(src));
        }
    }
}

fn resolve_asset(prefix: &str, url: &str) -> String {
    if url.starts_with('/') || url.contains("://") {
        url.to_string()
    } else {
        format!("{prefix}/{url}")
    }
}

/// A directory listing ready to render.
pub struct Listing<'a> {
    /// Normalized directory path.
    pub path: &'a str,
    /// Entries in display order.
    pub entries: &'a [Entry],
    pub sort: &'a SortSpec,
    /// Sort tokens that were skipped.
    pub rejected: &'a [String],
    pub assets: &'a PageAssets,
}

pub fn listing_page(listing: &Listing<'_>) -> String {
    let title = if listing.path == "/" {
        "/".to_string()
    } else {
        format!("{}/", listing.path)
    };

    let mut out = String::with_capacity(1024 + listing.entries.len() * 160);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>Index of {}</title>", text(&title));
    listing.assets.head(&mut out);
    out.push_str("</head>\n<body>\n");
    let _ = writeln!(out, "<h1>Index of {}</h1>", text(&title));

    for token in listing.rejected {
        let _ = writeln!(
            out,
            "<p class=\"notice\">unsupported sorting &quot;{}&quot;</p>",
            text(token)
        );
    }

    let primary = listing.sort.primary();
    out.push_str("<table class=\"listing\">\n<thead><tr>");
    let _ = write!(out, "<th>{}</th>", sort_link("Name", SortField::Name, primary));
    out.push_str("<th class=\"size\">Size</th>");
    let _ = write!(
        out,
        "<th>{}</th>",
        sort_link("Modified", SortField::ModTime, primary)
    );
    let _ = write!(out, "<th>{}</th>", sort_link("Type", SortField::Type, primary));
    out.push_str("</tr></thead>\n<tbody>\n");

    if listing.path != "/" {
        out.push_str(
            "<tr class=\"parent\"><td><a href=\"../\">../</a></td><td></td><td></td><td></td></tr>\n",
        );
    }

    for entry in listing.entries {
        row(&mut out, entry);
    }

    out.push_str("</tbody>\n</table>\n");
    listing.assets.tail(&mut out);
    out.push_str("</body>\n</html>\n");
    out
}

/// Header link toggling the direction when `field` is already primary.
fn sort_link(label: &str, field: SortField, primary: SortKey) -> String {
    let (next, marker) = if primary.field == field && primary.ascending {
        (SortKey::desc(field), " &#9650;")
    } else if primary.field == field {
        (SortKey::asc(field), " &#9660;")
    } else {
        (SortKey::asc(field), "")
    };
    format!("<a href=\"?sort={next}\">{label}</a>{marker}")
}

fn row(out: &mut String, entry: &Entry) {
    let mut href = encode_segment(&entry.name);
    let mut name = entry.name.clone();
    if entry.is_dir() {
        href.push('/');
        name.push('/');
    }

    let _ = write!(
        out,
        "<tr class=\"{}\"><td><a href=\"{}\">{}</a>",
        entry.kind.as_str(),
        attr(&href),
        text(&name)
    );
    if entry.kind.is_file() && mime::is_video(&entry.name) {
        let _ = write!(
            out,
            " <a class=\"play\" href=\"{}?mode=videoplayer\">play</a>",
            attr(&href)
        );
    }

    let size = if entry.is_dir() {
        "-".to_string()
    } else {
        format_size(entry.size)
    };
    let _ = writeln!(
        out,
        "</td><td class=\"size\">{}</td><td>{}</td><td>{}</td></tr>",
        size,
        entry.mod_time.format("%Y-%m-%d %H:%M:%S"),
        entry.kind.as_str()
    );
}

/// Human-readable size using binary units.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// The video player page for one file.
pub struct Player<'a> {
    /// Normalized path of the video.
    pub path: &'a str,
    pub tracks: &'a [SubtitleTrack],
    pub assets: &'a PageAssets,
}

pub fn player_page(player: &Player<'_>) -> String {
    let name = player.path.rsplit('/').next().unwrap_or_default();
    let src = encode_segment(name);

    let mut out = String::with_capacity(1024);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", text(name));
    player.assets.head(&mut out);
    out.push_str("</head>\n<body>\n");
    let _ = writeln!(out, "<h1>{}</h1>", text(name));
    out.push_str("<video controls autoplay preload=\"metadata\">\n");
    let _ = writeln!(
        out,
        "<source src=\"{}\" type=\"{}\">",
        attr(&src),
        attr(&mime::video_type(player.path))
    );

    for (i, track) in player.tracks.iter().enumerate() {
        let label = match track.format {
            SubtitleFormat::Vtt => "WebVTT",
            SubtitleFormat::Srt => "SubRip",
        };
        let _ = writeln!(
            out,
            "<track kind=\"subtitles\" src=\"{}\" label=\"{}\" srclang=\"und\"{}>",
            attr(&track_url(track)),
            label,
            if i == 0 { " default" } else { "" }
        );
    }

    out.push_str("</video>\n<p><a href=\"./\">Back to folder</a></p>\n");
    player.assets.tail(&mut out);
    out.push_str("</body>\n</html>\n");
    out
}

fn track_url(track: &SubtitleTrack) -> String {
    match track.src.split_once('?') {
        Some((path, query)) => format!("{}?{query}", encode_path(path)),
        None => encode_path(&track.src),
    }
}
