//! frameclean Tauri application library.

mod bridge;
mod commands;
mod media;

use std::sync::Arc;

use anyhow::Context;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tauri::{AppHandle, Manager};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frameclean_engine::{
    load_default_config, CredentialStore, FileCredentialStore, MemoryCredentialStore, Studio,
    StudioDeps,
};
use frameclean_enhance::{EnhancementClient, GeminiBackend};
use frameclean_ipc::{event_channel, StudioConfig, StudioEvent};

use crate::bridge::WebviewBridge;
use crate::media::{MediaRegistry, MEDIA_SCHEME};

/// Application state shared with Tauri commands.
pub struct AppState {
    pub studio: Arc<Studio>,
    pub bridge: WebviewBridge,
    pub event_rx: Mutex<Receiver<StudioEvent>>,
}

/// Initialize logging.
fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "frameclean=debug,frameclean_lib=debug,frameclean_engine=debug,frameclean_capture=debug,frameclean_enhance=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn credential_store() -> Box<dyn CredentialStore> {
    match FileCredentialStore::in_config_dir() {
        Some(store) => Box::new(store),
        None => {
            warn!("No config directory, the API key will not be remembered");
            Box::new(MemoryCredentialStore::new())
        }
    }
}

fn build_state(
    app: AppHandle,
    config: StudioConfig,
    media: Arc<MediaRegistry>,
) -> anyhow::Result<AppState> {
    let backend = GeminiBackend::new(&config.enhancement)
        .context("Invalid enhancement service settings")?;
    let bridge = WebviewBridge::new(app, media);
    let (event_tx, event_rx) = event_channel();

    let deps = StudioDeps {
        media_host: Arc::new(bridge.clone()),
        grabber: Arc::new(bridge.clone()),
        enhancer: Arc::new(EnhancementClient::new(Arc::new(backend))),
        credential_store: credential_store(),
    };

    Ok(AppState {
        studio: Arc::new(Studio::new(config, deps, event_tx)),
        bridge,
        event_rx: Mutex::new(event_rx),
    })
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_logging();
    info!("frameclean starting");

    let config = load_default_config();
    let media = Arc::new(MediaRegistry::new());
    let protocol_media = Arc::clone(&media);

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .register_uri_scheme_protocol(MEDIA_SCHEME, move |_ctx, request| {
            protocol_media.respond(&request)
        })
        .setup(move |app| {
            let state = build_state(app.handle().clone(), config, media)?;
            state.studio.start();

            let studio = Arc::clone(&state.studio);
            tauri::async_runtime::spawn(async move {
                if let Err(e) = studio.build_deferred_player().await {
                    warn!("Deferred player was not built: {}", e);
                }
            });

            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::primary_action,
            commands::set_mode,
            commands::select_remote_url,
            commands::load_video_file,
            commands::load_image_file,
            commands::submit_credential,
            commands::embed_api_ready,
            commands::player_signal,
            commands::bridge_reply,
            commands::poll_events,
            commands::get_gallery,
            commands::save_artifact,
            commands::get_status,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|handle, event| {
        if let tauri::RunEvent::Exit = event {
            if let Some(state) = handle.try_state::<AppState>() {
                state.studio.shutdown();
            }
        }
    });
}
