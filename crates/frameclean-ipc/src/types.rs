//! Common types used across IPC messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state::{InputMode, OperationState, PrimaryAction};

/// Studio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Delay between pausing playback and grabbing the frame, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Lossy encoding quality for grabbed frames (0.0 - 1.0).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: f32,

    /// Whether switching input mode discards the gallery.
    #[serde(default = "default_true")]
    pub clear_results_on_mode_switch: bool,

    /// Remote enhancement service settings.
    #[serde(default)]
    pub enhancement: EnhancementSettings,

    /// Options passed to the embedded remote player.
    #[serde(default)]
    pub embed: EmbedOptions,
}

impl StudioConfig {
    /// Settle delay as a `Duration`.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            jpeg_quality: default_jpeg_quality(),
            clear_results_on_mode_switch: true,
            enhancement: EnhancementSettings::default(),
            embed: EmbedOptions::default(),
        }
    }
}

/// Remote enhancement service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementSettings {
    /// Base URL of the generative image API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Image model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Options for the embedded remote player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedOptions {
    /// Play inline instead of going fullscreen on mobile webviews.
    #[serde(default = "default_true")]
    pub plays_inline: bool,

    /// Show the native player controls.
    #[serde(default = "default_true")]
    pub controls: bool,

    /// Show related videos at the end of playback.
    #[serde(default)]
    pub related_videos: bool,

    /// Reduce player branding.
    #[serde(default = "default_true")]
    pub modest_branding: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            plays_inline: true,
            controls: true,
            related_videos: false,
            modest_branding: true,
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    150
}

fn default_jpeg_quality() -> f32 {
    0.9
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// Category of a user-visible error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No credential present.
    Configuration,

    /// Image mode without a loaded image.
    NoImageLoaded,

    /// The enhancement service rejected the credential.
    CredentialRejected,

    /// No player, or its surface is not ready yet.
    PlaybackUnavailable,

    /// The player reported a native error.
    PlaybackRuntime,

    /// Another operation is in flight.
    Busy,

    /// Grabbing the frame failed.
    Capture,

    /// The enhancement step failed.
    Enhancement,

    /// The requested gallery entry does not exist.
    Gallery,

    /// Reading or writing local files failed.
    Storage,
}

/// A gallery entry as shown to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactView {
    /// Position in the gallery (0-based).
    pub index: usize,

    /// Capture position in seconds, for video captures.
    pub timestamp_secs: Option<f64>,

    /// Human readable capture position.
    pub timestamp_label: Option<String>,

    /// `data:` URL of the enhanced image.
    pub data_url: String,

    /// Suggested download file name.
    pub file_name: String,
}

/// Snapshot of what the UI needs to render its controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioStatus {
    pub state: OperationState,
    pub mode: InputMode,
    pub paused_by_capture: bool,

    /// What the primary button does, and its label.
    pub primary_action: PrimaryAction,
    pub action_label: String,

    /// False while busy or when nothing is loaded to act on.
    pub action_enabled: bool,

    pub busy_message: Option<String>,
    pub has_credential: bool,
    pub result_count: usize,
}

/// Format a playback position as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_timestamp(position: Duration) -> String {
    let total = position.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Duration::from_secs_f64(3.0)), "0:03");
        assert_eq!(format_timestamp(Duration::from_secs_f64(12.5)), "0:12");
        assert_eq!(format_timestamp(Duration::from_secs(754)), "12:34");
        assert_eq!(format_timestamp(Duration::from_secs(3725)), "1:02:05");
    }

    #[test]
    fn test_config_defaults_from_empty_toml() {
        let config: StudioConfig = toml::from_str("").unwrap();
        assert_eq!(config.settle_delay_ms, 150);
        assert_eq!(config.settle_delay(), Duration::from_millis(150));
        assert!(config.clear_results_on_mode_switch);
        assert_eq!(config.enhancement.model, "gemini-2.5-flash-image");
        assert_eq!(config.embed, EmbedOptions::default());
    }

    #[test]
    fn test_config_partial_override() {
        let config: StudioConfig = toml::from_str(
            r#"
            settle_delay_ms = 300

            [enhancement]
            timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.settle_delay_ms, 300);
        assert_eq!(config.enhancement.timeout_secs, 10);
        assert_eq!(
            config.enhancement.api_base_url,
            "https://generativelanguage.googleapis.com"
        );
    }
}
