//! Error types for the capture module.

use thiserror::Error;

/// Errors that can occur while driving playback or grabbing frames.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The embed API has not signalled readiness.
    #[error("Embed API not available")]
    EmbedApiUnavailable,

    /// A play/pause/seek command failed.
    #[error("Player command failed: {0}")]
    Control(String),

    /// The frame-grab primitive failed.
    #[error("Frame grab failed: {0}")]
    FrameGrab(String),

    /// Creating or attaching a transient media reference failed.
    #[error("Media host error: {0}")]
    MediaHost(String),

    /// The host did not answer in time.
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),
}
