//! Capture studio core for frameclean.
//!
//! This crate provides the studio that coordinates:
//! - Playback control through the frame source adapter
//! - Frame grabbing after a settle delay
//! - Subtitle and logo removal through the enhancement client
//! - The ordered gallery of results
//! - Credential persistence and invalidation

mod config;
mod credential;
mod error;
mod orchestrator;
mod results;

pub use config::{config_dir, default_config_path, load_config, load_default_config, CONFIG_FILE_NAME};
pub use credential::{CredentialHolder, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{StudioError, CREDENTIAL_REENTRY_PROMPT};
pub use orchestrator::{ActionOutcome, Studio, StudioDeps};
pub use results::{CaptureArtifact, ResultCollection};

/// Result type for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;
