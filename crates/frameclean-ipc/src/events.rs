//! Events sent from the studio to the UI.

use serde::{Deserialize, Serialize};

use crate::state::{InputMode, OperationState};
use crate::types::{ArtifactView, ErrorKind};

/// Events that the studio can send to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StudioEvent {
    /// Operation state has changed.
    StateChanged {
        /// Previous state.
        previous: OperationState,

        /// Current state.
        current: OperationState,
    },

    /// The capture-pause latch flipped.
    PauseLatchChanged(bool),

    /// A new entry was placed in the gallery.
    ArtifactAdded {
        /// Position the entry was inserted at.
        index: usize,

        /// The entry itself.
        artifact: ArtifactView,
    },

    /// The gallery was emptied.
    ResultsCleared,

    /// A source was activated for the given mode.
    SourceActivated { mode: InputMode },

    /// Error occurred.
    Error {
        /// Error category.
        kind: ErrorKind,

        /// Error message.
        message: String,
    },

    /// The credential is missing or was rejected and must be re-entered.
    CredentialRequired {
        /// Why the prompt is shown, if not first use.
        reason: Option<String>,
    },

    /// Studio is ready.
    Ready,

    /// Studio has shut down.
    Shutdown,
}
