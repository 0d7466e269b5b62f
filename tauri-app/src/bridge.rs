//! Webview implementations of the player, media and frame-grab surfaces.
//!
//! Commands are emitted to the frontend as `bridge:request` events. Calls
//! that need an answer wait on a oneshot channel until the frontend invokes
//! the `bridge_reply` command with the same id, or the request times out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Emitter};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use frameclean_capture::{
    position_from_secs, CaptureError, CaptureResult, EmbedApi, EmbedHandle, EncodedImage,
    FrameGrabber, LocalMedia, MediaElement, MediaHost, ObjectUrl, RenderSurface,
};
use frameclean_ipc::EmbedOptions;

use crate::media::MediaRegistry;

/// Event name for requests sent to the frontend.
pub const BRIDGE_REQUEST_EVENT: &str = "bridge:request";

const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// Operations the frontend performs on our behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BridgeOp {
    ConstructPlayer {
        surface: String,
        content_id: String,
        options: EmbedOptions,
        generation: u64,
    },
    CueContent { generation: u64, content_id: String },
    DestroyPlayer { generation: u64 },
    AttachVideo { surface: String, url: String, generation: u64 },
    DetachVideo { generation: u64 },
    Play { generation: u64 },
    Pause { generation: u64 },
    CurrentPosition { generation: u64 },
    GrabFrame { surface: String, quality: f32 },
}

impl BridgeOp {
    fn name(&self) -> &'static str {
        match self {
            Self::ConstructPlayer { .. } => "player construction",
            Self::CueContent { .. } => "cue",
            Self::DestroyPlayer { .. } => "player teardown",
            Self::AttachVideo { .. } => "video attach",
            Self::DetachVideo { .. } => "video detach",
            Self::Play { .. } => "play",
            Self::Pause { .. } => "pause",
            Self::CurrentPosition { .. } => "position query",
            Self::GrabFrame { .. } => "frame grab",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct BridgeRequest {
    /// Zero for fire-and-forget requests.
    id: u64,
    #[serde(flatten)]
    op: BridgeOp,
}

/// The frontend's answer to a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BridgeReply {
    Done,
    Position { secs: f64 },
    Frame { data_url: String },
    Failed { message: String },
}

/// Outstanding requests awaiting a reply.
#[derive(Default)]
struct PendingReplies {
    waiters: Mutex<HashMap<u64, oneshot::Sender<BridgeReply>>>,
    next_id: AtomicU64,
}

impl PendingReplies {
    fn register(&self) -> (u64, oneshot::Receiver<BridgeReply>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(id, tx);
        (id, rx)
    }

    fn resolve(&self, id: u64, reply: BridgeReply) -> bool {
        match self.waiters.lock().remove(&id) {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    fn forget(&self, id: u64) {
        self.waiters.lock().remove(&id);
    }
}

/// Talks to the frontend that hosts the players.
#[derive(Clone)]
pub struct WebviewBridge {
    app: AppHandle,
    media: Arc<MediaRegistry>,
    pending: Arc<PendingReplies>,
}

impl WebviewBridge {
    pub fn new(app: AppHandle, media: Arc<MediaRegistry>) -> Self {
        Self {
            app,
            media,
            pending: Arc::new(PendingReplies::default()),
        }
    }

    /// Hand a reply from the frontend to its waiting request.
    pub fn resolve(&self, id: u64, reply: BridgeReply) {
        if !self.pending.resolve(id, reply) {
            debug!(id, "Reply for unknown or expired request");
        }
    }

    fn notify(&self, op: BridgeOp) -> CaptureResult<()> {
        let name = op.name();
        self.app
            .emit(BRIDGE_REQUEST_EVENT, BridgeRequest { id: 0, op })
            .map_err(|e| CaptureError::Control(format!("{name}: {e}")))
    }

    async fn request(&self, op: BridgeOp) -> CaptureResult<BridgeReply> {
        let name = op.name();
        let (id, rx) = self.pending.register();

        if let Err(e) = self.app.emit(BRIDGE_REQUEST_EVENT, BridgeRequest { id, op }) {
            self.pending.forget(id);
            return Err(CaptureError::Control(format!("{name}: {e}")));
        }

        match tokio::time::timeout(REPLY_TIMEOUT, rx).await {
            Ok(Ok(BridgeReply::Failed { message })) => Err(CaptureError::Control(message)),
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(CaptureError::Control(format!("{name}: reply dropped"))),
            Err(_) => {
                self.pending.forget(id);
                warn!(id, "Frontend did not answer {}", name);
                Err(CaptureError::Timeout(name))
            }
        }
    }

    async fn expect_done(&self, op: BridgeOp) -> CaptureResult<()> {
        self.request(op).await.map(|_| ())
    }

    async fn position(&self, generation: u64) -> CaptureResult<Duration> {
        match self.request(BridgeOp::CurrentPosition { generation }).await? {
            BridgeReply::Position { secs } => Ok(position_from_secs(secs)),
            other => Err(CaptureError::Control(format!(
                "unexpected reply to position query: {other:?}"
            ))),
        }
    }
}

/// A player living in the webview, addressed by its generation.
struct BridgePlayer {
    bridge: WebviewBridge,
    generation: u64,
}

#[async_trait]
impl EmbedHandle for BridgePlayer {
    async fn play(&self) -> CaptureResult<()> {
        self.bridge
            .expect_done(BridgeOp::Play {
                generation: self.generation,
            })
            .await
    }

    async fn pause(&self) -> CaptureResult<()> {
        self.bridge
            .expect_done(BridgeOp::Pause {
                generation: self.generation,
            })
            .await
    }

    async fn current_position(&self) -> CaptureResult<Duration> {
        self.bridge.position(self.generation).await
    }

    fn cue(&self, content_id: &str) -> CaptureResult<()> {
        self.bridge.notify(BridgeOp::CueContent {
            generation: self.generation,
            content_id: content_id.to_string(),
        })
    }

    fn destroy(&self) {
        if let Err(e) = self.bridge.notify(BridgeOp::DestroyPlayer {
            generation: self.generation,
        }) {
            warn!("Failed to destroy player: {}", e);
        }
    }
}

#[async_trait]
impl MediaElement for BridgePlayer {
    async fn play(&self) -> CaptureResult<()> {
        EmbedHandle::play(self).await
    }

    async fn pause(&self) -> CaptureResult<()> {
        EmbedHandle::pause(self).await
    }

    async fn current_position(&self) -> CaptureResult<Duration> {
        self.bridge.position(self.generation).await
    }

    fn detach(&self) {
        if let Err(e) = self.bridge.notify(BridgeOp::DetachVideo {
            generation: self.generation,
        }) {
            warn!("Failed to detach video: {}", e);
        }
    }
}

impl EmbedApi for WebviewBridge {
    fn construct(
        &self,
        surface: &RenderSurface,
        content_id: &str,
        options: &EmbedOptions,
        generation: u64,
    ) -> CaptureResult<Arc<dyn EmbedHandle>> {
        self.notify(BridgeOp::ConstructPlayer {
            surface: surface.id.clone(),
            content_id: content_id.to_string(),
            options: options.clone(),
            generation,
        })?;
        Ok(Arc::new(BridgePlayer {
            bridge: self.clone(),
            generation,
        }))
    }
}

impl MediaHost for WebviewBridge {
    fn create_object_url(&self, media: &LocalMedia) -> CaptureResult<ObjectUrl> {
        Ok(self.media.register(media))
    }

    fn revoke_object_url(&self, url: &ObjectUrl) {
        self.media.revoke(url);
    }

    fn attach_video(
        &self,
        surface: &RenderSurface,
        url: &ObjectUrl,
        generation: u64,
    ) -> CaptureResult<Arc<dyn MediaElement>> {
        self.notify(BridgeOp::AttachVideo {
            surface: surface.id.clone(),
            url: url.as_str().to_string(),
            generation,
        })
        .map_err(|e| CaptureError::MediaHost(e.to_string()))?;
        Ok(Arc::new(BridgePlayer {
            bridge: self.clone(),
            generation,
        }))
    }
}

#[async_trait]
impl FrameGrabber for WebviewBridge {
    async fn grab(&self, surface: &RenderSurface, quality: f32) -> CaptureResult<EncodedImage> {
        let reply = self
            .request(BridgeOp::GrabFrame {
                surface: surface.id.clone(),
                quality,
            })
            .await
            .map_err(|e| CaptureError::FrameGrab(e.to_string()))?;

        match reply {
            BridgeReply::Frame { data_url } => EncodedImage::from_data_url(&data_url)
                .ok_or_else(|| CaptureError::FrameGrab("frame is not a base64 data URL".into())),
            other => Err(CaptureError::FrameGrab(format!("unexpected reply: {other:?}"))),
        }
    }
}
