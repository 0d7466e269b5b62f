//! Keeps exactly one playback backend in sync with the selected source.

use std::sync::Arc;

use frameclean_ipc::EmbedOptions;
use tracing::{debug, info, instrument, warn};

use crate::backend::{BackendKind, LocalFilePlayer, PlaybackBackend, RemoteStreamPlayer};
use crate::readiness::EmbedReadiness;
use crate::source::{LocalMedia, SourceDescriptor};
use crate::surface::{EmbedApi, MediaHost, ObjectUrl, RenderSurface};
use crate::CaptureResult;

/// Outcome of selecting a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// A new backend or image was activated.
    Activated { generation: u64 },

    /// The existing remote player now shows the new content.
    Reused { generation: u64 },

    /// The embed API is not loaded yet; the player is built once it is.
    Deferred,
}

enum ActiveSource {
    None,
    PendingRemote { content_id: String },
    Backend(PlaybackBackend),
    Image { media: LocalMedia, url: ObjectUrl },
}

/// Owns the active source and its backend.
///
/// Every activation gets a fresh generation number; hosts tag player
/// signals with it so callbacks from a released player can be told apart.
pub struct FrameSourceAdapter {
    surface: RenderSurface,
    embed_options: EmbedOptions,
    media_host: Arc<dyn MediaHost>,
    readiness: Arc<EmbedReadiness>,
    active: ActiveSource,
    generation: u64,
}

impl FrameSourceAdapter {
    /// Create an adapter with no source selected.
    pub fn new(
        surface: RenderSurface,
        embed_options: EmbedOptions,
        media_host: Arc<dyn MediaHost>,
        readiness: Arc<EmbedReadiness>,
    ) -> Self {
        Self {
            surface,
            embed_options,
            media_host,
            readiness,
            active: ActiveSource::None,
            generation: 0,
        }
    }

    /// The container players are mounted in.
    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    /// Generation of the current source.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns true if `generation` belongs to the current source.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && !matches!(self.active, ActiveSource::None)
    }

    /// Returns true if any source (even a deferred one) is selected.
    pub fn has_source(&self) -> bool {
        !matches!(self.active, ActiveSource::None)
    }

    /// A control view of the active backend.
    pub fn active_backend(&self) -> Option<PlaybackBackend> {
        match &self.active {
            ActiveSource::Backend(backend) => Some(backend.clone()),
            _ => None,
        }
    }

    /// Kind of the active backend.
    pub fn backend_kind(&self) -> Option<BackendKind> {
        match &self.active {
            ActiveSource::Backend(backend) => Some(backend.kind()),
            ActiveSource::PendingRemote { .. } => Some(BackendKind::RemoteStream),
            _ => None,
        }
    }

    /// The loaded still image, in image mode.
    pub fn loaded_image(&self) -> Option<&LocalMedia> {
        match &self.active {
            ActiveSource::Image { media, .. } => Some(media),
            _ => None,
        }
    }

    /// Activate `descriptor`, releasing whatever was active before.
    #[instrument(name = "select_source", skip(self, descriptor), fields(mode = ?descriptor.mode()))]
    pub fn select(&mut self, descriptor: SourceDescriptor) -> CaptureResult<Activation> {
        match descriptor {
            SourceDescriptor::Remote { content_id } => self.select_remote(content_id),
            SourceDescriptor::LocalVideo(media) => self.select_local_video(media),
            SourceDescriptor::Image(media) => self.select_image(media),
        }
    }

    fn select_remote(&mut self, content_id: String) -> CaptureResult<Activation> {
        match &mut self.active {
            ActiveSource::Backend(PlaybackBackend::RemoteStream(player)) => {
                if player.content_id != content_id {
                    debug!(%content_id, "Cueing new content into existing player");
                    player.handle.cue(&content_id)?;
                    player.content_id = content_id;
                }
                return Ok(Activation::Reused {
                    generation: self.generation,
                });
            }
            ActiveSource::PendingRemote { content_id: pending } => {
                debug!(%content_id, "Player construction already pending, updating content");
                *pending = content_id;
                return Ok(Activation::Deferred);
            }
            _ => {}
        }

        self.release();

        match self.readiness.get() {
            Some(api) => {
                let generation = self.construct_remote(api.as_ref(), content_id)?;
                Ok(Activation::Activated { generation })
            }
            None => {
                debug!(%content_id, "Embed API not ready, deferring player construction");
                self.active = ActiveSource::PendingRemote { content_id };
                Ok(Activation::Deferred)
            }
        }
    }

    /// Build the deferred remote player once the embed API is ready.
    ///
    /// Idempotent: returns `None` when nothing is pending or the API is
    /// still missing.
    pub fn complete_pending(&mut self) -> CaptureResult<Option<u64>> {
        let ActiveSource::PendingRemote { content_id } = &self.active else {
            return Ok(None);
        };
        let Some(api) = self.readiness.get() else {
            return Ok(None);
        };

        let content_id = content_id.clone();
        let generation = self.construct_remote(api.as_ref(), content_id)?;
        Ok(Some(generation))
    }

    fn construct_remote(&mut self, api: &dyn EmbedApi, content_id: String) -> CaptureResult<u64> {
        let generation = self.next_generation();
        let handle = match api.construct(&self.surface, &content_id, &self.embed_options, generation)
        {
            Ok(handle) => handle,
            Err(e) => {
                self.active = ActiveSource::None;
                return Err(e);
            }
        };

        info!(%content_id, generation, "Remote player constructed");
        self.active = ActiveSource::Backend(PlaybackBackend::RemoteStream(RemoteStreamPlayer {
            handle,
            content_id,
            ready: false,
        }));
        Ok(generation)
    }

    fn select_local_video(&mut self, media: LocalMedia) -> CaptureResult<Activation> {
        self.release();

        let url = self.media_host.create_object_url(&media)?;
        let generation = self.next_generation();
        let element = match self.media_host.attach_video(&self.surface, &url, generation) {
            Ok(element) => element,
            Err(e) => {
                self.media_host.revoke_object_url(&url);
                return Err(e);
            }
        };

        info!(name = %media.name, generation, "Local player attached");
        self.active = ActiveSource::Backend(PlaybackBackend::LocalFile(LocalFilePlayer {
            element,
            url,
        }));
        Ok(Activation::Activated { generation })
    }

    fn select_image(&mut self, media: LocalMedia) -> CaptureResult<Activation> {
        self.release();

        let url = self.media_host.create_object_url(&media)?;
        let generation = self.next_generation();

        info!(name = %media.name, bytes = media.data.len(), "Image loaded");
        self.active = ActiveSource::Image { media, url };
        Ok(Activation::Activated { generation })
    }

    /// Mark the remote player of `generation` as ready.
    ///
    /// Returns false for stale generations.
    pub fn mark_ready(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        match &mut self.active {
            ActiveSource::Backend(PlaybackBackend::RemoteStream(player)) => {
                player.ready = true;
                true
            }
            _ => false,
        }
    }

    /// Release the active source and free its resources.
    pub fn release(&mut self) {
        match std::mem::replace(&mut self.active, ActiveSource::None) {
            ActiveSource::None => return,
            ActiveSource::PendingRemote { content_id } => {
                debug!(%content_id, "Dropping pending remote player");
            }
            ActiveSource::Backend(backend) => backend.release(self.media_host.as_ref()),
            ActiveSource::Image { media, url } => {
                debug!(name = %media.name, "Releasing image");
                self.media_host.revoke_object_url(&url);
            }
        }
        self.next_generation();
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

impl Drop for FrameSourceAdapter {
    fn drop(&mut self) {
        if self.has_source() {
            warn!("Adapter dropped with an active source, releasing");
        }
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaptureError;
    use crate::surface::{EmbedHandle, MediaElement};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl Log {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    struct FakeHandle(Arc<Log>);

    #[async_trait]
    impl EmbedHandle for FakeHandle {
        async fn play(&self) -> CaptureResult<()> {
            Ok(())
        }
        async fn pause(&self) -> CaptureResult<()> {
            Ok(())
        }
        async fn current_position(&self) -> CaptureResult<Duration> {
            Ok(Duration::ZERO)
        }
        fn cue(&self, content_id: &str) -> CaptureResult<()> {
            self.0.push(format!("cue:{content_id}"));
            Ok(())
        }
        fn destroy(&self) {
            self.0.push("destroy");
        }
    }

    struct FakeApi(Arc<Log>);

    impl EmbedApi for FakeApi {
        fn construct(
            &self,
            _surface: &RenderSurface,
            content_id: &str,
            _options: &EmbedOptions,
            generation: u64,
        ) -> CaptureResult<Arc<dyn EmbedHandle>> {
            self.0.push(format!("construct:{content_id}:{generation}"));
            Ok(Arc::new(FakeHandle(Arc::clone(&self.0))))
        }
    }

    struct FakeElement(Arc<Log>);

    #[async_trait]
    impl MediaElement for FakeElement {
        async fn play(&self) -> CaptureResult<()> {
            Ok(())
        }
        async fn pause(&self) -> CaptureResult<()> {
            Ok(())
        }
        async fn current_position(&self) -> CaptureResult<Duration> {
            Ok(Duration::ZERO)
        }
        fn detach(&self) {
            self.0.push("detach");
        }
    }

    struct FakeHost {
        log: Arc<Log>,
        fail_attach: bool,
    }

    impl MediaHost for FakeHost {
        fn create_object_url(&self, media: &LocalMedia) -> CaptureResult<ObjectUrl> {
            self.log.push(format!("create:{}", media.name));
            Ok(ObjectUrl(format!("media://{}", media.name)))
        }
        fn revoke_object_url(&self, url: &ObjectUrl) {
            self.log.push(format!("revoke:{}", url.as_str()));
        }
        fn attach_video(
            &self,
            _surface: &RenderSurface,
            _url: &ObjectUrl,
            _generation: u64,
        ) -> CaptureResult<Arc<dyn MediaElement>> {
            if self.fail_attach {
                return Err(CaptureError::MediaHost("unsupported".into()));
            }
            Ok(Arc::new(FakeElement(Arc::clone(&self.log))))
        }
    }

    fn adapter(log: &Arc<Log>, fail_attach: bool) -> (FrameSourceAdapter, Arc<EmbedReadiness>) {
        let readiness = Arc::new(EmbedReadiness::new());
        let host = Arc::new(FakeHost {
            log: Arc::clone(log),
            fail_attach,
        });
        let adapter = FrameSourceAdapter::new(
            RenderSurface::default(),
            EmbedOptions::default(),
            host,
            Arc::clone(&readiness),
        );
        (adapter, readiness)
    }

    fn remote(id: &str) -> SourceDescriptor {
        SourceDescriptor::Remote {
            content_id: id.to_string(),
        }
    }

    fn video(name: &str) -> SourceDescriptor {
        SourceDescriptor::LocalVideo(LocalMedia::new(name, "video/mp4", vec![0u8; 4]))
    }

    #[test]
    fn test_remote_deferred_until_api_ready() {
        let log = Arc::new(Log::default());
        let (mut adapter, readiness) = adapter(&log, false);

        assert_eq!(adapter.select(remote("aaaaaaaaaaa")).unwrap(), Activation::Deferred);
        // A second request while pending must not build a second player.
        assert_eq!(adapter.select(remote("bbbbbbbbbbb")).unwrap(), Activation::Deferred);
        assert_eq!(adapter.complete_pending().unwrap(), None);

        readiness.signal_ready(Arc::new(FakeApi(Arc::clone(&log))));
        let generation = adapter.complete_pending().unwrap().unwrap();
        assert_eq!(adapter.complete_pending().unwrap(), None);

        assert_eq!(log.entries(), vec![format!("construct:bbbbbbbbbbb:{generation}")]);
        assert!(adapter.active_backend().is_some());
    }

    #[test]
    fn test_remote_player_is_reused() {
        let log = Arc::new(Log::default());
        let (mut adapter, readiness) = adapter(&log, false);
        readiness.signal_ready(Arc::new(FakeApi(Arc::clone(&log))));

        let first = adapter.select(remote("aaaaaaaaaaa")).unwrap();
        let Activation::Activated { generation } = first else {
            panic!("expected activation, got {first:?}");
        };
        assert_eq!(
            adapter.select(remote("bbbbbbbbbbb")).unwrap(),
            Activation::Reused { generation }
        );

        assert_eq!(
            log.entries(),
            vec![
                format!("construct:aaaaaaaaaaa:{generation}"),
                "cue:bbbbbbbbbbb".to_string(),
            ]
        );
    }

    #[test]
    fn test_switching_releases_previous_source_first() {
        let log = Arc::new(Log::default());
        let (mut adapter, readiness) = adapter(&log, false);
        readiness.signal_ready(Arc::new(FakeApi(Arc::clone(&log))));

        adapter.select(video("a.mp4")).unwrap();
        adapter.select(video("b.mp4")).unwrap();
        adapter.select(remote("aaaaaaaaaaa")).unwrap();

        let entries = log.entries();
        assert_eq!(
            &entries[..6],
            &[
                "create:a.mp4",
                "detach",
                "revoke:media://a.mp4",
                "create:b.mp4",
                "detach",
                "revoke:media://b.mp4",
            ]
        );
        assert!(entries[6].starts_with("construct:aaaaaaaaaaa"));
    }

    #[test]
    fn test_stale_generation_is_rejected() {
        let log = Arc::new(Log::default());
        let (mut adapter, readiness) = adapter(&log, false);
        readiness.signal_ready(Arc::new(FakeApi(Arc::clone(&log))));

        let Activation::Activated { generation: old } = adapter.select(remote("aaaaaaaaaaa")).unwrap()
        else {
            panic!("expected activation");
        };
        adapter.select(video("a.mp4")).unwrap();

        assert!(!adapter.is_current(old));
        assert!(!adapter.mark_ready(old));
        assert!(adapter.is_current(adapter.generation()));
    }

    #[test]
    fn test_remote_backend_ready_after_signal() {
        let log = Arc::new(Log::default());
        let (mut adapter, readiness) = adapter(&log, false);
        readiness.signal_ready(Arc::new(FakeApi(Arc::clone(&log))));
        adapter.select(remote("aaaaaaaaaaa")).unwrap();

        assert!(!adapter.active_backend().unwrap().is_ready());
        assert!(adapter.mark_ready(adapter.generation()));
        assert!(adapter.active_backend().unwrap().is_ready());
    }

    #[test]
    fn test_failed_attach_revokes_url() {
        let log = Arc::new(Log::default());
        let (mut adapter, _readiness) = adapter(&log, true);

        assert!(adapter.select(video("a.mp4")).is_err());
        assert!(!adapter.has_source());
        assert_eq!(log.entries(), vec!["create:a.mp4", "revoke:media://a.mp4"]);
    }

    #[test]
    fn test_drop_releases_image() {
        let log = Arc::new(Log::default());
        {
            let (mut adapter, _readiness) = adapter(&log, false);
            adapter
                .select(SourceDescriptor::Image(LocalMedia::new("p.png", "image/png", vec![1u8])))
                .unwrap();
            assert_eq!(adapter.loaded_image().unwrap().name, "p.png");
        }
        assert_eq!(log.entries(), vec!["create:p.png", "revoke:media://p.png"]);
    }
}
