//! Capabilities consumed from the host: embed API, media host and frame grab.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use frameclean_ipc::EmbedOptions;
use serde::{Deserialize, Serialize};

use crate::image::EncodedImage;
use crate::source::LocalMedia;
use crate::CaptureResult;

/// The container element players are mounted in and frames are grabbed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderSurface {
    /// Host-side identifier of the container.
    pub id: String,
}

impl RenderSurface {
    /// Create a surface reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new("player-wrapper")
    }
}

/// A transient reference to in-memory media, valid until revoked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectUrl(pub String);

impl ObjectUrl {
    /// The URL string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Playback state reported by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlaybackStatus {
    /// Map the embed API's numeric state codes.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Unstarted),
            0 => Some(Self::Ended),
            1 => Some(Self::Playing),
            2 => Some(Self::Paused),
            3 => Some(Self::Buffering),
            5 => Some(Self::Cued),
            _ => None,
        }
    }
}

/// A signal raised by the active player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerSignal {
    /// The player finished loading and can be controlled.
    Ready,

    /// Playback state changed.
    StateChanged(PlaybackStatus),

    /// The player reported a native error code.
    Error(i32),
}

/// Convert a host-reported position in seconds, clamping garbage to zero.
pub fn position_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

/// The remote embed API, available once its one-time ready signal fired.
pub trait EmbedApi: Send + Sync {
    /// Construct a player for `content_id` inside `surface`.
    ///
    /// The host tags every signal from this player with `generation`.
    fn construct(
        &self,
        surface: &RenderSurface,
        content_id: &str,
        options: &EmbedOptions,
        generation: u64,
    ) -> CaptureResult<Arc<dyn EmbedHandle>>;
}

/// A constructed remote player.
#[async_trait]
pub trait EmbedHandle: Send + Sync {
    async fn play(&self) -> CaptureResult<()>;

    async fn pause(&self) -> CaptureResult<()>;

    async fn current_position(&self) -> CaptureResult<Duration>;

    /// Load different content into the same player without starting it.
    fn cue(&self, content_id: &str) -> CaptureResult<()>;

    /// Stop and tear the player down.
    fn destroy(&self);
}

/// A local media element playing an object URL.
#[async_trait]
pub trait MediaElement: Send + Sync {
    async fn play(&self) -> CaptureResult<()>;

    async fn pause(&self) -> CaptureResult<()>;

    async fn current_position(&self) -> CaptureResult<Duration>;

    /// Unmount the element.
    fn detach(&self);
}

/// Owner of transient media references and local media elements.
pub trait MediaHost: Send + Sync {
    /// Register in-memory media and return a reference to it.
    fn create_object_url(&self, media: &LocalMedia) -> CaptureResult<ObjectUrl>;

    /// Free a reference created by `create_object_url`.
    fn revoke_object_url(&self, url: &ObjectUrl);

    /// Mount a media element playing `url` inside `surface`.
    fn attach_video(
        &self,
        surface: &RenderSurface,
        url: &ObjectUrl,
        generation: u64,
    ) -> CaptureResult<Arc<dyn MediaElement>>;
}

/// The frame-grab primitive.
#[async_trait]
pub trait FrameGrabber: Send + Sync {
    /// Render `surface` into a lossy-encoded still image.
    async fn grab(&self, surface: &RenderSurface, quality: f32) -> CaptureResult<EncodedImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_status_codes() {
        assert_eq!(PlaybackStatus::from_code(1), Some(PlaybackStatus::Playing));
        assert_eq!(PlaybackStatus::from_code(5), Some(PlaybackStatus::Cued));
        assert_eq!(PlaybackStatus::from_code(4), None);
    }

    #[test]
    fn test_position_from_secs() {
        assert_eq!(position_from_secs(12.5), Duration::from_millis(12_500));
        assert_eq!(position_from_secs(-1.0), Duration::ZERO);
        assert_eq!(position_from_secs(f64::NAN), Duration::ZERO);
        assert_eq!(position_from_secs(f64::INFINITY), Duration::ZERO);
        assert_eq!(position_from_secs(1e30), Duration::ZERO);
    }
}
