//! Encoded still images.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

/// An encoded still image (JPEG, PNG, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Encoded image bytes.
    pub data: Bytes,

    /// MIME type of `data`, e.g. `image/jpeg`.
    pub mime_type: String,
}

impl EncodedImage {
    /// Create a new encoded image.
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Create a JPEG image.
    pub fn jpeg(data: impl Into<Bytes>) -> Self {
        Self::new(data, "image/jpeg")
    }

    /// Decode from base64 payload.
    pub fn from_base64(payload: &str, mime_type: impl Into<String>) -> Result<Self, base64::DecodeError> {
        let data = STANDARD.decode(payload.trim())?;
        Ok(Self::new(data, mime_type))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let rest = url.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        let mime_type = if mime_type.is_empty() {
            "application/octet-stream"
        } else {
            mime_type
        };
        Self::from_base64(payload, mime_type).ok()
    }

    /// Base64 encoding of the image bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Render as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            "image/bmp" => "bmp",
            _ => "jpg",
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if there are no image bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let image = EncodedImage::jpeg(vec![0xff, 0xd8, 0xff]);
        let url = image.to_data_url();
        assert_eq!(url, "data:image/jpeg;base64,/9j/");
        assert_eq!(EncodedImage::from_data_url(&url), Some(image));
    }

    #[test]
    fn test_from_data_url_rejects_non_base64() {
        assert!(EncodedImage::from_data_url("data:text/plain,hello").is_none());
        assert!(EncodedImage::from_data_url("https://example.com/a.jpg").is_none());
    }

    #[test]
    fn test_extension_follows_mime() {
        assert_eq!(EncodedImage::new(vec![1], "image/png").extension(), "png");
        assert_eq!(EncodedImage::jpeg(vec![1]).extension(), "jpg");
    }
}
