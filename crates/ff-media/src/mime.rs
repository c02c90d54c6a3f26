//! Content type detection by file extension.

/// Content types for media containers browsers care about. Checked before
/// falling back to `mime_guess`, whose answers for these vary.
fn media_content_type(ext: &str) -> Option<&'static str> {
    let ct = match ext {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "ts" | "m2ts" => "video/mp2t",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "vtt" => "text/vtt",
        "srt" => "text/srt",
        _ => return None,
    };
    Some(ct)
}

fn extension(path: &str) -> Option<String> {
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Content type for `path`, `application/octet-stream` when unknown.
/// Textual types carry a UTF-8 charset.
pub fn content_type(path: &str) -> String {
    let base = extension(path)
        .as_deref()
        .and_then(media_content_type)
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    if needs_charset(&base) {
        format!("{base}; charset=utf-8")
    } else {
        base
    }
}

fn needs_charset(essence: &str) -> bool {
    essence.starts_with("text/")
        || matches!(
            essence,
            "application/javascript" | "application/json" | "image/svg+xml"
        )
}

/// MIME type for the `<source type>` of a player page, `video/mp4` when the
/// extension says nothing useful.
pub fn video_type(path: &str) -> String {
    let ct = content_type(path);
    if ct.starts_with("video/") || ct.starts_with("audio/") {
        ct
    } else {
        "video/mp4".to_string()
    }
}

/// True when the extension names a video container.
pub fn is_video(path: &str) -> bool {
    content_type(path).starts_with("video/")
}
