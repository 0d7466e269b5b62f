//! Error types for the studio.

use frameclean_capture::CaptureError;
use frameclean_enhance::EnhanceError;
use frameclean_ipc::ErrorKind;
use thiserror::Error;

/// Prompt shown when the service rejects the stored key.
pub const CREDENTIAL_REENTRY_PROMPT: &str =
    "Your API key is invalid or has expired. Please enter it again.";

/// Errors surfaced by studio operations.
#[derive(Debug, Error)]
pub enum StudioError {
    /// No credential present.
    #[error("Please provide an API key to continue.")]
    Configuration,

    /// Image mode without a loaded image.
    #[error("Please load an image to process.")]
    NoImageLoaded,

    /// The service rejected the credential; it has been cleared.
    #[error("Your API key is invalid or has expired. Please enter it again.")]
    CredentialRejected,

    /// No player, or its surface is not ready.
    #[error("The video player is not ready.")]
    PlaybackUnavailable,

    /// The player reported a native error.
    #[error("{message}")]
    PlaybackRuntime {
        message: String,
        embedding_restricted: bool,
    },

    /// Another operation is in flight.
    #[error("Another operation is in progress.")]
    Busy,

    /// Pausing, grabbing or querying the player failed.
    #[error("Something went wrong while capturing the frame: {0}")]
    Capture(#[from] CaptureError),

    /// The enhancer returned an error other than a credential rejection.
    #[error("Something went wrong while processing the image: {0}")]
    Enhancement(EnhanceError),

    /// No gallery entry at this index.
    #[error("Gallery entry {0} does not exist.")]
    UnknownArtifact(usize),

    /// Local file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    /// The user-facing category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration => ErrorKind::Configuration,
            Self::NoImageLoaded => ErrorKind::NoImageLoaded,
            Self::CredentialRejected => ErrorKind::CredentialRejected,
            Self::PlaybackUnavailable => ErrorKind::PlaybackUnavailable,
            Self::PlaybackRuntime { .. } => ErrorKind::PlaybackRuntime,
            Self::Busy => ErrorKind::Busy,
            Self::Capture(_) => ErrorKind::Capture,
            Self::Enhancement(_) => ErrorKind::Enhancement,
            Self::UnknownArtifact(_) => ErrorKind::Gallery,
            Self::Io(_) => ErrorKind::Storage,
        }
    }
}
