//! In-memory media served to the webview over the `media://` scheme.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tauri::http::header::{
    ACCEPT_RANGES, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_RANGE, CONTENT_TYPE, RANGE,
};
use tauri::http::{HeaderValue, Request, Response, StatusCode};
use tracing::{debug, warn};

use frameclean_capture::{LocalMedia, ObjectUrl};

/// URI scheme the registry is mounted on.
pub const MEDIA_SCHEME: &str = "media";

/// Loaded files, addressable by object URL until revoked.
#[derive(Default)]
pub struct MediaRegistry {
    entries: Mutex<HashMap<String, LocalMedia>>,
    next_id: AtomicU64,
}

impl MediaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `media` and return the URL the webview can load it from.
    pub fn register(&self, media: &LocalMedia) -> ObjectUrl {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let url = object_url(&id);
        self.entries.lock().insert(id, media.clone());
        debug!(url = url.as_str(), name = %media.name, "Media registered");
        url
    }

    /// Drop the entry behind `url`. Unknown URLs are ignored.
    pub fn revoke(&self, url: &ObjectUrl) {
        let Some(id) = url.as_str().rsplit('/').next() else {
            return;
        };
        if self.entries.lock().remove(id).is_some() {
            debug!(url = url.as_str(), "Media revoked");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn lookup(&self, id: &str) -> Option<LocalMedia> {
        self.entries.lock().get(id).cloned()
    }

    /// Serve a protocol request, honouring single byte ranges so video
    /// elements can seek.
    pub fn respond(&self, request: &Request<Vec<u8>>) -> Response<Vec<u8>> {
        let id = request.uri().path().trim_start_matches('/');
        let Some(media) = self.lookup(id) else {
            warn!(path = %request.uri().path(), "Request for unknown media");
            return status_response(StatusCode::NOT_FOUND);
        };

        let total = media.data.len();
        let range = request
            .headers()
            .get(RANGE)
            .and_then(|value| value.to_str().ok())
            .map(|value| parse_range(value, total));

        let (status, body, content_range) = match range {
            None => (StatusCode::OK, media.data.to_vec(), None),
            Some(Some((start, end))) => (
                StatusCode::PARTIAL_CONTENT,
                media.data.slice(start..=end).to_vec(),
                Some(format!("bytes {start}-{end}/{total}")),
            ),
            Some(None) => return status_response(StatusCode::RANGE_NOT_SATISFIABLE),
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        let headers = response.headers_mut();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&media.mime_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
        );
        headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        // Frames are drawn to a canvas; the app origin differs on some platforms.
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        if let Some(value) = content_range.and_then(|v| HeaderValue::from_str(&v).ok()) {
            headers.insert(CONTENT_RANGE, value);
        }
        response
    }
}

/// Where the webview reaches entry `id`. Windows and Android serve custom
/// schemes from an `http://<scheme>.localhost` origin.
fn object_url(id: &str) -> ObjectUrl {
    #[cfg(any(windows, target_os = "android"))]
    let url = format!("http://{MEDIA_SCHEME}.localhost/{id}");
    #[cfg(not(any(windows, target_os = "android")))]
    let url = format!("{MEDIA_SCHEME}://localhost/{id}");
    ObjectUrl(url)
}

fn status_response(status: StatusCode) -> Response<Vec<u8>> {
    let mut response = Response::new(Vec::new());
    *response.status_mut() = status;
    response
}

/// Parse a single `bytes=` range into inclusive bounds within `total`.
fn parse_range(header: &str, total: usize) -> Option<(usize, usize)> {
    let ranges = header.trim().strip_prefix("bytes=")?;
    if ranges.contains(',') || total == 0 {
        return None;
    }
    let (start, end) = ranges.split_once('-')?;
    let last = total - 1;

    match (start.trim(), end.trim()) {
        ("", suffix) => {
            let len: usize = suffix.parse().ok()?;
            (len > 0).then(|| (total.saturating_sub(len), last))
        }
        (start, "") => {
            let start: usize = start.parse().ok()?;
            (start <= last).then_some((start, last))
        }
        (start, end) => {
            let start: usize = start.parse().ok()?;
            let end: usize = end.parse::<usize>().ok()?.min(last);
            (start <= end).then_some((start, end))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> LocalMedia {
        LocalMedia::new("clip.mp4", "video/mp4", (0u8..100).collect::<Vec<_>>())
    }

    fn get(url: &ObjectUrl, range: Option<&str>) -> Request<Vec<u8>> {
        let mut builder = Request::builder().uri(url.as_str());
        if let Some(range) = range {
            builder = builder.header(RANGE, range);
        }
        builder.body(Vec::new()).unwrap()
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("bytes=0-9", 100), Some((0, 9)));
        assert_eq!(parse_range("bytes=90-", 100), Some((90, 99)));
        assert_eq!(parse_range("bytes=-10", 100), Some((90, 99)));
        assert_eq!(parse_range("bytes=50-500", 100), Some((50, 99)));
        assert_eq!(parse_range("bytes=100-", 100), None);
        assert_eq!(parse_range("bytes=0-1,4-5", 100), None);
        assert_eq!(parse_range("items=0-1", 100), None);
    }

    #[test]
    fn test_serves_registered_media() {
        let registry = MediaRegistry::new();
        let url = registry.register(&clip());

        let response = registry.respond(&get(&url, None));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().len(), 100);
        assert_eq!(response.headers()[CONTENT_TYPE], "video/mp4");
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let response = registry.respond(&get(&url, Some("bytes=10-19")));
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.body(), &(10u8..20).collect::<Vec<_>>());
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes 10-19/100");
    }

    #[test]
    fn test_object_url_matches_platform_origin() {
        let registry = MediaRegistry::new();
        let url = registry.register(&clip());

        #[cfg(any(windows, target_os = "android"))]
        assert_eq!(url.as_str(), "http://media.localhost/0");
        #[cfg(not(any(windows, target_os = "android")))]
        assert_eq!(url.as_str(), "media://localhost/0");

        let request = get(&url, None);
        assert_eq!(request.uri().path(), "/0");
        assert_eq!(registry.respond(&request).status(), StatusCode::OK);
    }

    #[test]
    fn test_revoked_media_is_gone() {
        let registry = MediaRegistry::new();
        let url = registry.register(&clip());
        registry.revoke(&url);

        assert_eq!(registry.len(), 0);
        assert_eq!(
            registry.respond(&get(&url, None)).status(),
            StatusCode::NOT_FOUND
        );
    }
}
