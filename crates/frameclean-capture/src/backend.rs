//! The two playback backends behind one control surface.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::surface::{EmbedHandle, MediaElement, MediaHost, ObjectUrl};
use crate::CaptureResult;

/// Remote player error codes meaning the owner disallows embedding.
pub const EMBEDDING_RESTRICTED_CODES: [i32; 3] = [101, 150, 153];

/// Which backend variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    RemoteStream,
    LocalFile,
}

/// Remote player state.
#[derive(Clone)]
pub struct RemoteStreamPlayer {
    pub(crate) handle: Arc<dyn EmbedHandle>,
    pub(crate) content_id: String,
    pub(crate) ready: bool,
}

/// Local media element state.
#[derive(Clone)]
pub struct LocalFilePlayer {
    pub(crate) element: Arc<dyn MediaElement>,
    pub(crate) url: ObjectUrl,
}

/// The active playback backend.
///
/// Cloning yields another control view of the same underlying player.
#[derive(Clone)]
pub enum PlaybackBackend {
    RemoteStream(RemoteStreamPlayer),
    LocalFile(LocalFilePlayer),
}

impl PlaybackBackend {
    /// Which variant this is.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::RemoteStream(_) => BackendKind::RemoteStream,
            Self::LocalFile(_) => BackendKind::LocalFile,
        }
    }

    /// Whether the render surface can be grabbed from.
    pub fn is_ready(&self) -> bool {
        match self {
            Self::RemoteStream(player) => player.ready,
            Self::LocalFile(_) => true,
        }
    }

    pub async fn play(&self) -> CaptureResult<()> {
        match self {
            Self::RemoteStream(player) => player.handle.play().await,
            Self::LocalFile(player) => player.element.play().await,
        }
    }

    pub async fn pause(&self) -> CaptureResult<()> {
        match self {
            Self::RemoteStream(player) => player.handle.pause().await,
            Self::LocalFile(player) => player.element.pause().await,
        }
    }

    /// Current playback position.
    pub async fn current_position(&self) -> CaptureResult<Duration> {
        match self {
            Self::RemoteStream(player) => player.handle.current_position().await,
            Self::LocalFile(player) => player.element.current_position().await,
        }
    }

    /// Tear the backend down, freeing any transient media reference.
    pub(crate) fn release(self, host: &dyn MediaHost) {
        match self {
            Self::RemoteStream(player) => {
                debug!(content_id = %player.content_id, "Destroying remote player");
                player.handle.destroy();
            }
            Self::LocalFile(player) => {
                debug!(url = %player.url.as_str(), "Detaching local player");
                player.element.detach();
                host.revoke_object_url(&player.url);
            }
        }
    }
}

impl std::fmt::Debug for PlaybackBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemoteStream(player) => f
                .debug_struct("RemoteStream")
                .field("content_id", &player.content_id)
                .field("ready", &player.ready)
                .finish(),
            Self::LocalFile(player) => f
                .debug_struct("LocalFile")
                .field("url", &player.url)
                .finish(),
        }
    }
}

/// A player error, translated for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackFault {
    pub message: String,
    pub embedding_restricted: bool,
}

/// Translate a native player error code.
pub fn classify_player_error(kind: BackendKind, code: i32) -> PlaybackFault {
    match kind {
        BackendKind::RemoteStream if EMBEDDING_RESTRICTED_CODES.contains(&code) => PlaybackFault {
            message: "The owner of this video does not allow playback on other sites. \
                      Try another video, or download it and use the local upload mode."
                .to_string(),
            embedding_restricted: true,
        },
        BackendKind::RemoteStream => PlaybackFault {
            message: format!("The video player reported an error (code {code})."),
            embedding_restricted: false,
        },
        BackendKind::LocalFile => PlaybackFault {
            message: "The video file cannot be played. It may be corrupt or in an \
                      unsupported format."
                .to_string(),
            embedding_restricted: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_restriction_codes() {
        for code in EMBEDDING_RESTRICTED_CODES {
            assert!(classify_player_error(BackendKind::RemoteStream, code).embedding_restricted);
        }
    }

    #[test]
    fn test_generic_remote_error_mentions_code() {
        let fault = classify_player_error(BackendKind::RemoteStream, 5);
        assert!(!fault.embedding_restricted);
        assert!(fault.message.contains("code 5"));
    }

    #[test]
    fn test_local_errors_are_never_embedding_restrictions() {
        let fault = classify_player_error(BackendKind::LocalFile, 150);
        assert!(!fault.embedding_restricted);
    }
}
