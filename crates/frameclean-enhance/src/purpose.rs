//! What the enhancement should remove.

use serde::{Deserialize, Serialize};

/// The transformation requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purpose {
    /// Erase burned-in subtitles from a video frame.
    SubtitleRemoval,

    /// Erase logos and watermarks from a still image.
    LogoRemoval,
}

impl Purpose {
    /// Instruction text sent with the image.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::SubtitleRemoval => {
                "This is a screenshot from a video. Intelligently remove the subtitle text \
                 that appears at the bottom of the image. The output image must have the \
                 same dimensions as the input image. If there are no subtitles, return the \
                 original image."
            }
            Self::LogoRemoval => {
                "Intelligently remove any logo or watermark from this image. The output \
                 image must have the same dimensions as the input image. If there is no \
                 logo, return the original image."
            }
        }
    }

    /// MIME type assumed for a result that does not declare one.
    pub fn fallback_mime_type(self, input_mime_type: &str) -> String {
        match self {
            Self::SubtitleRemoval => "image/jpeg".to_string(),
            Self::LogoRemoval => input_mime_type.to_string(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SubtitleRemoval => "subtitle-removal",
            Self::LogoRemoval => "logo-removal",
        }
    }
}
