//! Source descriptors selected by the user.

use std::path::Path;

use bytes::Bytes;
use frameclean_ipc::InputMode;
use url::Url;

use crate::image::EncodedImage;

/// Length of a remote video identifier.
const VIDEO_ID_LEN: usize = 11;

/// A user-selected source.
#[derive(Debug, Clone)]
pub enum SourceDescriptor {
    /// A remote video, identified by its content id.
    Remote { content_id: String },

    /// A video file loaded from disk.
    LocalVideo(LocalMedia),

    /// A still image loaded from disk.
    Image(LocalMedia),
}

impl SourceDescriptor {
    /// Input mode this source belongs to.
    pub fn mode(&self) -> InputMode {
        match self {
            Self::Remote { .. } => InputMode::RemoteUrl,
            Self::LocalVideo(_) => InputMode::LocalUpload,
            Self::Image(_) => InputMode::Image,
        }
    }
}

/// A file loaded into memory.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    /// Original file name.
    pub name: String,

    /// MIME type.
    pub mime_type: String,

    /// File contents.
    pub data: Bytes,
}

impl LocalMedia {
    /// Create a new in-memory media file.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Create from a file name, guessing the MIME type from its extension.
    pub fn from_named_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = guess_mime_type(&name).to_string();
        Self::new(name, mime_type, data)
    }

    /// View as an encoded image.
    pub fn to_image(&self) -> EncodedImage {
        EncodedImage::new(self.data.clone(), self.mime_type.clone())
    }
}

/// Guess a MIME type from a file name's extension.
pub fn guess_mime_type(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "ogv" => "video/ogg",
        _ => "application/octet-stream",
    }
}

/// Extract the video identifier from a remote video URL.
///
/// Accepts watch, short-link, embed, shorts and live URLs, or a bare id.
pub fn parse_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if is_video_id(input) {
        return Some(input.to_string());
    }

    let url = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .or_else(|| host.strip_prefix("music."))
        .unwrap_or(&host);

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some("embed" | "shorts" | "live" | "v") => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    is_video_id(&candidate).then_some(candidate)
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == VIDEO_ID_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
