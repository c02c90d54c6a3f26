//! SRT to WebVTT conversion.
//!
//! The two formats differ, for our purposes, only in the header and in the
//! decimal separator of cue timings: SRT writes `00:00:01,000 --> ...`
//! where WebVTT wants `00:00:01.000 --> ...`. [`SrtToVttReader`] rewrites a
//! byte stream on the fly without ever holding the whole file.
//!
//! # Chunk boundaries
//!
//! A timing line can arrive split across two source reads. The reader
//! therefore never converts the last `ARROW_LEN - 1` bytes it holds until
//! more input (or end of input) arrives; if a complete timing line
//! straddles that boundary the boundary moves to its end. The output is
//! the same as converting the whole input at once, whatever the read
//! sizes on either side.

use std::io;
use std::pin::Pin;
use std::sync::LazyLock;
use std::task::{ready, Context, Poll};

use bytes::BytesMut;
use regex::bytes::Regex;
use tokio::io::{AsyncRead, ReadBuf};

/// Written before the first converted byte.
pub const VTT_HEADER: &[u8] = b"WEBVTT\n\n";

/// Length of `HH:MM:SS,mmm --> HH:MM:SS,mmm`.
const ARROW_LEN: usize = 29;

const HOLD_BACK: usize = ARROW_LEN - 1;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const DEFAULT_CHUNK: usize = 8192;

static SRT_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{2}:[0-9]{2}:[0-9]{2}),([0-9]{3}) --> ([0-9]{2}:[0-9]{2}:[0-9]{2}),([0-9]{3})")
        .expect("timing pattern compiles")
});

const VTT_ARROW: &[u8] = b"${1}.${2} --> ${3}.${4}";

/// Rewrite every SRT timing line in `input`.
pub fn convert_timings(input: &[u8]) -> Vec<u8> {
    SRT_ARROW.replace_all(input, VTT_ARROW).into_owned()
}

/// Streaming adapter presenting an SRT source as WebVTT.
///
/// One reader serves one response. Read errors from the source are
/// returned unchanged; nothing is retried.
pub struct SrtToVttReader<R> {
    src: R,
    chunk: Box<[u8]>,
    /// Source bytes not yet converted.
    pending: BytesMut,
    /// Converted bytes not yet handed to the caller, header first.
    ready: BytesMut,
    /// Set once the first bytes have been handed out.
    started: bool,
    bom_checked: bool,
    eof: bool,
}

impl<R> SrtToVttReader<R> {
    pub fn new(src: R) -> Self {
        Self::with_chunk_size(src, DEFAULT_CHUNK)
    }

    /// Pull at most `chunk_size` bytes per source read. Sizes below the
    /// length of one timing line are raised to it.
    pub fn with_chunk_size(src: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(ARROW_LEN);
        Self {
            src,
            chunk: vec![0; chunk_size].into_boxed_slice(),
            pending: BytesMut::with_capacity(chunk_size + HOLD_BACK),
            ready: BytesMut::from(VTT_HEADER),
            started: false,
            bom_checked: false,
            eof: false,
        }
    }

    fn convert(&mut self) {
        if !self.bom_checked {
            if self.pending.len() < UTF8_BOM.len() && !self.eof {
                return;
            }
            if self.pending.starts_with(UTF8_BOM) {
                let _ = self.pending.split_to(UTF8_BOM.len());
            }
            self.bom_checked = true;
        }

        let mut cut = if self.eof {
            self.pending.len()
        } else {
            self.pending.len().saturating_sub(HOLD_BACK)
        };

        if !self.eof {
            for m in SRT_ARROW.find_iter(&self.pending) {
                if m.start() >= cut {
                    break;
                }
                if m.end() > cut {
                    cut = m.end();
                    break;
                }
            }
        }

        if cut == 0 {
            return;
        }

        let head = self.pending.split_to(cut);
        let converted = SRT_ARROW.replace_all(&head, VTT_ARROW);
        self.ready.extend_from_slice(&converted);
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for SrtToVttReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            // The header waits for converted content to go out with it;
            // an empty source gets the header alone.
            let has_content = this.started || this.ready.len() > VTT_HEADER.len();
            if !this.ready.is_empty() && (has_content || this.eof) {
                let n = buf.remaining().min(this.ready.len());
                buf.put_slice(&this.ready.split_to(n));
                this.started = true;
                return Poll::Ready(Ok(()));
            }
            if this.eof {
                return Poll::Ready(Ok(()));
            }

            let mut chunk = ReadBuf::new(&mut this.chunk);
            ready!(Pin::new(&mut this.src).poll_read(cx, &mut chunk))?;
            let n = chunk.filled().len();

            if n == 0 {
                this.eof = true;
            } else {
                this.pending.extend_from_slice(&this.chunk[..n]);
            }
            this.convert();
        }
    }
}

/// Subtitle formats a browser `<track>` can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// Served as is.
    Vtt,
    /// Served through `?mode=vtt`.
    Srt,
}

impl SubtitleFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Srt => "srt",
        }
    }
}

/// A subtitle file that may sit next to a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub format: SubtitleFormat,
    /// Filesystem path of the subtitle file.
    pub path: String,
    /// URL for the `<track src>` attribute, unescaped.
    pub src: String,
}

/// Candidate subtitle paths for the video at `path`, in preference order.
///
/// `/movies/a.mp4` yields `/movies/a.vtt` and `/movies/a.srt`. Only the
/// extension of the last segment is replaced.
pub fn sibling_tracks(path: &str) -> Vec<SubtitleTrack> {
    let stem = strip_extension(path);
    [SubtitleFormat::Vtt, SubtitleFormat::Srt]
        .into_iter()
        .map(|format| {
            let path = format!("{stem}.{}", format.extension());
            let src = match format {
                SubtitleFormat::Vtt => path.clone(),
                SubtitleFormat::Srt => format!("{path}?mode=vtt"),
            };
            SubtitleTrack { format, path, src }
        })
        .collect()
}

fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(0) | None => path,
        Some(dot) => &path[..name_start + dot],
    }
}

/// True when `path` names an `.srt` file, ignoring case.
pub fn is_srt(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case("srt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    const CUE: &str = "1\n00:00:01,000 --> 00:00:04,000\nHello there\n\n";

    async fn read_all<R: AsyncRead + Unpin>(reader: R) -> io::Result<Vec<u8>> {
        let mut reader = reader;
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await?;
        Ok(out)
    }

    #[test]
    fn convert_timings_rewrites_separator() {
        let out = convert_timings(b"00:00:01,000 --> 00:00:04,000");
        assert_eq!(out, b"00:00:01.000 --> 00:00:04.000");
    }

    #[test]
    fn convert_timings_leaves_other_commas() {
        let out = convert_timings(b"Well, 12:00:00,000 is noon");
        assert_eq!(out, b"Well, 12:00:00,000 is noon");
    }

    #[tokio::test]
    async fn single_chunk_is_converted_after_header() {
        let src = tokio_test::io::Builder::new()
            .read(b"00:00:01,000 --> 00:00:04,000")
            .build();
        let out = read_all(SrtToVttReader::new(src)).await.unwrap();
        assert_eq!(out, b"WEBVTT\n\n00:00:01.000 --> 00:00:04.000");
    }

    #[tokio::test]
    async fn timing_split_on_the_comma_is_still_converted() {
        let src = tokio_test::io::Builder::new()
            .read(b"1\n00:00:01")
            .read(b",000 --> 00:00:04,000\nHello there\n\n")
            .build();
        let out = read_all(SrtToVttReader::new(src)).await.unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "WEBVTT\n\n1\n00:00:01.000 --> 00:00:04.000\nHello there\n\n"
        );
    }

    #[tokio::test]
    async fn first_read_carries_header_and_content() {
        let src = tokio_test::io::Builder::new()
            .read(b"1\n00:")
            .read(b"00:01,000 --> 00:00:04,000\nHi\n")
            .build();
        let mut reader = SrtToVttReader::new(src);
        let mut buf = [0u8; 1024];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(
            std::str::from_utf8(&buf[..n]).unwrap(),
            "WEBVTT\n\n1\n00:00:01.000 --> 00:00:04.000"
        );

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"\nHi\n");
    }

    #[tokio::test]
    async fn output_is_independent_of_source_chunking() {
        let input = CUE.repeat(40);
        let expected = {
            let mut v = VTT_HEADER.to_vec();
            v.extend(convert_timings(input.as_bytes()));
            v
        };

        for size in [1, 2, 7, 28, 29, 30, 64, 1000] {
            let mut builder = tokio_test::io::Builder::new();
            for piece in input.as_bytes().chunks(size) {
                builder.read(piece);
            }
            let out = read_all(SrtToVttReader::with_chunk_size(builder.build(), 4096))
                .await
                .unwrap();
            assert_eq!(out, expected, "source chunk size {size}");
        }
    }

    #[tokio::test]
    async fn output_is_independent_of_caller_buffer_size() {
        let input = CUE.repeat(5);
        let mut reader = SrtToVttReader::with_chunk_size(input.as_bytes(), 32);
        let mut out = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            let n = reader.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }

        let mut expected = VTT_HEADER.to_vec();
        expected.extend(convert_timings(input.as_bytes()));
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn empty_source_yields_header_only() {
        let out = read_all(SrtToVttReader::new(&b""[..])).await.unwrap();
        assert_eq!(out, VTT_HEADER);
    }

    #[tokio::test]
    async fn leading_bom_is_dropped() {
        let mut input = UTF8_BOM.to_vec();
        input.extend_from_slice(CUE.as_bytes());
        let out = read_all(SrtToVttReader::new(&input[..])).await.unwrap();
        assert!(out.starts_with(b"WEBVTT\n\n1\n00:00:01.000"));
    }

    #[tokio::test]
    async fn crlf_input_is_converted() {
        let input = b"1\r\n00:00:01,500 --> 00:00:02,250\r\nHi\r\n";
        let out = read_all(SrtToVttReader::new(&input[..])).await.unwrap();
        assert_eq!(
            out,
            b"WEBVTT\n\n1\r\n00:00:01.500 --> 00:00:02.250\r\nHi\r\n".to_vec()
        );
    }

    #[tokio::test]
    async fn source_error_propagates() {
        let src = tokio_test::io::Builder::new()
            .read(CUE.as_bytes())
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "gone"))
            .build();
        let err = read_all(SrtToVttReader::new(src)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn sibling_tracks_replace_extension() {
        let tracks = sibling_tracks("/movies/a.b.mp4");
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].format, SubtitleFormat::Vtt);
        assert_eq!(tracks[0].path, "/movies/a.b.vtt");
        assert_eq!(tracks[0].src, "/movies/a.b.vtt");
        assert_eq!(tracks[1].path, "/movies/a.b.srt");
        assert_eq!(tracks[1].src, "/movies/a.b.srt?mode=vtt");
    }

    #[test]
    fn sibling_tracks_without_extension() {
        let tracks = sibling_tracks("/v.d/clip");
        assert_eq!(tracks[0].path, "/v.d/clip.vtt");
        let tracks = sibling_tracks("/.hidden");
        assert_eq!(tracks[1].path, "/.hidden.srt");
    }

    #[test]
    fn srt_detection() {
        assert!(is_srt("/a/b.srt"));
        assert!(is_srt("/a/B.SRT"));
        assert!(!is_srt("/a/b.vtt"));
        assert!(!is_srt("/a.srt/b"));
        assert!(!is_srt("/.srt"));
    }
}
