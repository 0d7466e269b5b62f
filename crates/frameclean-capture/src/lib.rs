//! Playback backends and frame capture for frameclean.
//!
//! This crate puts the embedded remote player and the local media element
//! behind one control surface, and defines the consumed capabilities
//! (embed API, media host, frame grabber) the host application provides.

mod adapter;
mod backend;
mod error;
mod image;
mod readiness;
mod source;
mod surface;

pub use adapter::{Activation, FrameSourceAdapter};
pub use backend::{
    classify_player_error, BackendKind, LocalFilePlayer, PlaybackBackend, PlaybackFault,
    RemoteStreamPlayer, EMBEDDING_RESTRICTED_CODES,
};
pub use error::CaptureError;
pub use image::EncodedImage;
pub use readiness::EmbedReadiness;
pub use source::{guess_mime_type, parse_video_id, LocalMedia, SourceDescriptor};
pub use surface::{
    position_from_secs, EmbedApi, EmbedHandle, FrameGrabber, MediaElement, MediaHost, ObjectUrl,
    PlaybackStatus, PlayerSignal, RenderSurface,
};

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
