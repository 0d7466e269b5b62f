//! Tauri command handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tauri::State;
use tracing::{debug, instrument};

use frameclean_capture::{LocalMedia, PlayerSignal};
use frameclean_engine::StudioError;
use frameclean_ipc::{ArtifactView, InputMode, StudioEvent, StudioStatus};

use crate::bridge::BridgeReply;
use crate::AppState;

fn to_message(e: StudioError) -> String {
    e.to_string()
}

async fn read_media(path: &Path) -> Result<LocalMedia, String> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media".to_string());
    Ok(LocalMedia::from_named_bytes(name, data))
}

/// Run the primary action and return the resulting status.
#[tauri::command]
#[instrument(skip(state))]
pub async fn primary_action(state: State<'_, AppState>) -> Result<StudioStatus, String> {
    debug!("primary_action command");
    state.studio.primary_action().await.map_err(to_message)?;
    Ok(state.studio.status())
}

/// Switch the input mode.
#[tauri::command]
#[instrument(skip(state))]
pub async fn set_mode(state: State<'_, AppState>, mode: InputMode) -> Result<(), String> {
    state.studio.set_mode(mode).map_err(to_message)
}

/// Select a remote video. Returns false when no video id was found.
#[tauri::command]
#[instrument(skip(state))]
pub async fn select_remote_url(state: State<'_, AppState>, url: String) -> Result<bool, String> {
    state
        .studio
        .select_remote_url(&url)
        .map(|activation| activation.is_some())
        .map_err(to_message)
}

/// Load a video file from disk.
#[tauri::command]
#[instrument(skip(state))]
pub async fn load_video_file(state: State<'_, AppState>, path: PathBuf) -> Result<(), String> {
    let media = read_media(&path).await?;
    state
        .studio
        .select_local_video(media)
        .map(|_| ())
        .map_err(to_message)
}

/// Load a still image from disk.
#[tauri::command]
#[instrument(skip(state))]
pub async fn load_image_file(state: State<'_, AppState>, path: PathBuf) -> Result<(), String> {
    let media = read_media(&path).await?;
    state
        .studio
        .select_image(media)
        .map(|_| ())
        .map_err(to_message)
}

/// Store a new API key.
#[tauri::command]
#[instrument(skip(state, key))]
pub async fn submit_credential(state: State<'_, AppState>, key: String) -> Result<(), String> {
    state.studio.submit_credential(&key).map_err(to_message)
}

/// The frontend finished loading the embed API.
#[tauri::command]
pub async fn embed_api_ready(state: State<'_, AppState>) -> Result<(), String> {
    state.studio.embed_api_ready(Arc::new(state.bridge.clone()));
    Ok(())
}

/// A player raised a signal.
#[tauri::command]
pub async fn player_signal(
    state: State<'_, AppState>,
    generation: u64,
    signal: PlayerSignal,
) -> Result<(), String> {
    state.studio.handle_player_signal(generation, signal);
    Ok(())
}

/// Answer to a `bridge:request` event.
#[tauri::command]
pub async fn bridge_reply(
    state: State<'_, AppState>,
    id: u64,
    reply: BridgeReply,
) -> Result<(), String> {
    state.bridge.resolve(id, reply);
    Ok(())
}

/// Poll for studio events (non-blocking).
#[tauri::command]
pub async fn poll_events(state: State<'_, AppState>) -> Result<Vec<StudioEvent>, String> {
    let rx = state.event_rx.lock();
    let mut events = Vec::new();

    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(crossbeam_channel::TryRecvError::Empty) => break,
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                return Err("Event channel disconnected".to_string());
            }
        }
    }

    Ok(events)
}

/// Gallery entries, in order.
#[tauri::command]
pub async fn get_gallery(state: State<'_, AppState>) -> Result<Vec<ArtifactView>, String> {
    Ok(state.studio.results())
}

/// Write gallery entry `index` to `path`.
#[tauri::command]
#[instrument(skip(state))]
pub async fn save_artifact(
    state: State<'_, AppState>,
    index: usize,
    path: PathBuf,
) -> Result<(), String> {
    state
        .studio
        .save_artifact(index, &path)
        .await
        .map_err(to_message)
}

/// Current control state.
#[tauri::command]
pub async fn get_status(state: State<'_, AppState>) -> Result<StudioStatus, String> {
    Ok(state.studio.status())
}
