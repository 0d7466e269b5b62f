//! Studio state machine types.

use serde::{Deserialize, Serialize};

/// Which kind of source the user is working with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    /// A remote video, played through the embedded player.
    #[default]
    RemoteUrl,

    /// A video file loaded from disk.
    LocalUpload,

    /// A single still image.
    Image,
}

impl InputMode {
    /// Returns a simple string representation of the mode.
    pub fn name(self) -> &'static str {
        match self {
            Self::RemoteUrl => "RemoteUrl",
            Self::LocalUpload => "LocalUpload",
            Self::Image => "Image",
        }
    }
}

/// The single in-flight operation slot of the studio.
///
/// `Capturing` and `Enhancing` are the busy states; while either is set the
/// primary action is refused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    /// Nothing in flight.
    #[default]
    Idle,

    /// Playback is being paused and a frame grabbed.
    Capturing,

    /// The remote enhancement call is in flight.
    Enhancing,
}

impl OperationState {
    /// Returns true if the studio is idle.
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true while an operation is in flight.
    pub fn is_busy(self) -> bool {
        !self.is_idle()
    }

    /// Returns a simple string representation of the state.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Capturing => "Capturing",
            Self::Enhancing => "Enhancing",
        }
    }

    /// Progress message shown while busy, if any.
    pub fn busy_message(self, mode: InputMode) -> Option<&'static str> {
        match (self, mode) {
            (Self::Idle, _) => None,
            (Self::Capturing, _) => Some("Capturing frame..."),
            (Self::Enhancing, InputMode::Image) => Some("Removing logo..."),
            (Self::Enhancing, _) => Some("Removing subtitles..."),
        }
    }
}

/// What the primary button does right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryAction {
    /// Pause the video and capture the current frame.
    Capture,

    /// Resume playback after a capture.
    Resume,

    /// Enhance the loaded still image.
    Enhance,
}

impl PrimaryAction {
    /// Derive the action from the input mode and the pause latch.
    pub fn resolve(mode: InputMode, paused_by_capture: bool) -> Self {
        match mode {
            InputMode::Image => Self::Enhance,
            _ if paused_by_capture => Self::Resume,
            _ => Self::Capture,
        }
    }

    /// Button label for this action.
    pub fn label(self) -> &'static str {
        match self {
            Self::Capture => "Capture & remove subtitles",
            Self::Resume => "Resume playback",
            Self::Enhance => "Remove logo",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_action_resolution() {
        assert_eq!(
            PrimaryAction::resolve(InputMode::RemoteUrl, false),
            PrimaryAction::Capture
        );
        assert_eq!(
            PrimaryAction::resolve(InputMode::LocalUpload, true),
            PrimaryAction::Resume
        );
        // The latch has no meaning for still images.
        assert_eq!(
            PrimaryAction::resolve(InputMode::Image, true),
            PrimaryAction::Enhance
        );
    }

    #[test]
    fn test_busy_messages() {
        assert_eq!(OperationState::Idle.busy_message(InputMode::Image), None);
        assert_eq!(
            OperationState::Enhancing.busy_message(InputMode::Image),
            Some("Removing logo...")
        );
        assert_eq!(
            OperationState::Enhancing.busy_message(InputMode::RemoteUrl),
            Some("Removing subtitles...")
        );
        assert!(OperationState::Capturing.is_busy());
    }

    #[test]
    fn test_input_mode_serializes_kebab_case() {
        let json = serde_json::to_string(&InputMode::LocalUpload).unwrap();
        assert_eq!(json, "\"local-upload\"");
    }
}
