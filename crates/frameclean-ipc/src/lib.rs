//! Typed UI<->Studio messages for frameclean.
//!
//! This crate defines the message types exchanged between the desktop
//! shell and the capture studio core, plus the user-tunable configuration.

mod events;
mod state;
mod types;

pub use events::StudioEvent;
pub use state::{InputMode, OperationState, PrimaryAction};
pub use types::{
    format_timestamp, ArtifactView, EmbedOptions, EnhancementSettings, ErrorKind, StudioConfig,
    StudioStatus,
};

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for events (Studio → UI).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<StudioEvent>, Receiver<StudioEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}
