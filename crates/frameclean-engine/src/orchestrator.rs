//! The capture and enhancement state machine.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use frameclean_capture::{
    classify_player_error, parse_video_id, Activation, EmbedApi, EmbedReadiness, EncodedImage,
    FrameGrabber, FrameSourceAdapter, LocalMedia, MediaHost, PlaybackBackend, PlaybackStatus,
    PlayerSignal, RenderSurface, SourceDescriptor,
};
use frameclean_enhance::{Credential, Enhancer, Purpose};
use frameclean_ipc::{
    ArtifactView, InputMode, OperationState, PrimaryAction, StudioConfig, StudioEvent,
    StudioStatus,
};

use crate::credential::{CredentialHolder, CredentialStore};
use crate::error::{StudioError, CREDENTIAL_REENTRY_PROMPT};
use crate::results::{CaptureArtifact, ResultCollection};
use crate::StudioResult;

/// What a primary action ended up doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionOutcome {
    /// Another operation was in flight; nothing happened.
    Ignored,

    /// Playback was resumed after a capture.
    Resumed,

    /// A video frame was captured, enhanced and stored at `index`.
    Captured { index: usize, timestamp: Duration },

    /// The still image was enhanced and stored at `index`.
    Enhanced { index: usize },
}

/// Collaborators the studio drives.
pub struct StudioDeps {
    pub media_host: Arc<dyn MediaHost>,
    pub grabber: Arc<dyn FrameGrabber>,
    pub enhancer: Arc<dyn Enhancer>,
    pub credential_store: Box<dyn CredentialStore>,
}

#[derive(Default)]
struct Session {
    mode: InputMode,
    paused_by_capture: bool,
    results: ResultCollection,
}

/// The capture studio.
///
/// At most one operation is in flight at a time; the busy state is claimed
/// atomically and always released when the operation ends.
pub struct Studio {
    config: StudioConfig,
    adapter: Mutex<FrameSourceAdapter>,
    readiness: Arc<EmbedReadiness>,
    grabber: Arc<dyn FrameGrabber>,
    enhancer: Arc<dyn Enhancer>,
    credential: CredentialHolder,
    session: Mutex<Session>,
    state: RwLock<OperationState>,
    event_tx: Sender<StudioEvent>,
}

impl Studio {
    /// Create a new studio.
    pub fn new(config: StudioConfig, deps: StudioDeps, event_tx: Sender<StudioEvent>) -> Self {
        let readiness = Arc::new(EmbedReadiness::new());
        let adapter = FrameSourceAdapter::new(
            RenderSurface::default(),
            config.embed.clone(),
            deps.media_host,
            Arc::clone(&readiness),
        );

        Self {
            config,
            adapter: Mutex::new(adapter),
            readiness,
            grabber: deps.grabber,
            enhancer: deps.enhancer,
            credential: CredentialHolder::new(deps.credential_store),
            session: Mutex::new(Session::default()),
            state: RwLock::new(OperationState::Idle),
            event_tx,
        }
    }

    /// Announce readiness, prompting for a credential if none is stored.
    pub fn start(&self) {
        info!("Studio starting");
        self.send_event(StudioEvent::Ready);
        if !self.credential.is_present() {
            self.send_event(StudioEvent::CredentialRequired { reason: None });
        }
    }

    /// Release every source and announce shutdown.
    pub fn shutdown(&self) {
        info!("Studio shutting down");
        self.adapter.lock().release();
        self.send_event(StudioEvent::Shutdown);
    }

    /// The single user-facing trigger: capture, resume or enhance depending
    /// on the mode and the pause latch.
    #[instrument(name = "primary_action", skip(self))]
    pub async fn primary_action(&self) -> StudioResult<ActionOutcome> {
        if self.state().is_busy() {
            debug!("Busy, ignoring primary action");
            return Ok(ActionOutcome::Ignored);
        }

        let result = self.run_primary_action().await;
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    async fn run_primary_action(&self) -> StudioResult<ActionOutcome> {
        let credential = self.credential.current().ok_or(StudioError::Configuration)?;

        match self.primary_action_kind() {
            PrimaryAction::Enhance => self.enhance_still(&credential).await,
            PrimaryAction::Resume => self.resume().await,
            PrimaryAction::Capture => self.capture(&credential).await,
        }
    }

    async fn enhance_still(&self, credential: &Credential) -> StudioResult<ActionOutcome> {
        let image = self
            .adapter
            .lock()
            .loaded_image()
            .map(LocalMedia::to_image)
            .ok_or(StudioError::NoImageLoaded)?;

        let Some(guard) = self.try_begin(OperationState::Enhancing) else {
            return Ok(ActionOutcome::Ignored);
        };

        let enhanced = self.enhance(image, Purpose::LogoRemoval, credential).await?;
        let index = self.add_artifact(CaptureArtifact::still(enhanced));
        drop(guard);

        info!(index, "Image enhanced");
        Ok(ActionOutcome::Enhanced { index })
    }

    async fn resume(&self) -> StudioResult<ActionOutcome> {
        let backend = self.adapter.lock().active_backend();
        if let Some(backend) = backend {
            backend.play().await?;
        }
        self.set_pause_latch(false);

        debug!("Playback resumed");
        Ok(ActionOutcome::Resumed)
    }

    async fn capture(&self, credential: &Credential) -> StudioResult<ActionOutcome> {
        let (backend, surface) = {
            let adapter = self.adapter.lock();
            let backend = adapter
                .active_backend()
                .filter(PlaybackBackend::is_ready)
                .ok_or(StudioError::PlaybackUnavailable)?;
            (backend, adapter.surface().clone())
        };

        let Some(guard) = self.try_begin(OperationState::Capturing) else {
            return Ok(ActionOutcome::Ignored);
        };

        backend.pause().await?;
        tokio::time::sleep(self.config.settle_delay()).await;
        let frame = self.grabber.grab(&surface, self.config.jpeg_quality).await?;
        debug!(bytes = frame.len(), "Frame grabbed");

        guard.advance(OperationState::Enhancing);
        let enhanced = self.enhance(frame, Purpose::SubtitleRemoval, credential).await?;

        let timestamp = match backend.current_position().await {
            Ok(position) => position,
            Err(e) => {
                warn!("Failed to read playback position, using zero: {}", e);
                Duration::ZERO
            }
        };
        let index = self.add_artifact(CaptureArtifact::video(timestamp, enhanced));
        self.set_pause_latch(true);
        drop(guard);

        info!(index, position = timestamp.as_secs_f64(), "Frame captured");
        Ok(ActionOutcome::Captured { index, timestamp })
    }

    async fn enhance(
        &self,
        image: EncodedImage,
        purpose: Purpose,
        credential: &Credential,
    ) -> StudioResult<EncodedImage> {
        match self.enhancer.enhance(image, purpose, credential).await {
            Ok(enhanced) => Ok(enhanced),
            Err(e) if e.is_credential_rejection() => {
                self.invalidate_credential();
                Err(StudioError::CredentialRejected)
            }
            Err(e) => Err(StudioError::Enhancement(e)),
        }
    }

    /// Switch the input mode, releasing every active source.
    #[instrument(name = "set_mode", skip(self))]
    pub fn set_mode(&self, mode: InputMode) -> StudioResult<()> {
        self.ensure_idle()?;
        self.apply_mode(mode);
        Ok(())
    }

    fn apply_mode(&self, mode: InputMode) {
        self.adapter.lock().release();

        let cleared = {
            let mut session = self.session.lock();
            session.mode = mode;
            let clear = self.config.clear_results_on_mode_switch && !session.results.is_empty();
            if clear {
                session.results.clear();
            }
            clear
        };

        self.set_pause_latch(false);
        if cleared {
            self.send_event(StudioEvent::ResultsCleared);
        }
        info!(mode = mode.name(), "Input mode changed");
    }

    /// Activate `descriptor`, switching mode first if it belongs to another one.
    #[instrument(name = "select_source", skip(self, descriptor), fields(mode = ?descriptor.mode()))]
    pub fn select_source(&self, descriptor: SourceDescriptor) -> StudioResult<Activation> {
        self.ensure_idle()?;

        let mode = descriptor.mode();
        if self.mode() != mode {
            self.apply_mode(mode);
        }

        let activation = self.adapter.lock().select(descriptor)?;
        self.set_pause_latch(false);
        if !matches!(activation, Activation::Deferred) {
            self.send_event(StudioEvent::SourceActivated { mode });
        }
        Ok(activation)
    }

    /// Parse `url` and activate the remote player.
    ///
    /// Returns `Ok(None)` without touching anything if no video id is found.
    pub fn select_remote_url(&self, url: &str) -> StudioResult<Option<Activation>> {
        let Some(content_id) = parse_video_id(url) else {
            debug!(url, "No video id in URL");
            return Ok(None);
        };
        self.select_source(SourceDescriptor::Remote { content_id })
            .map(Some)
    }

    pub fn select_local_video(&self, media: LocalMedia) -> StudioResult<Activation> {
        self.select_source(SourceDescriptor::LocalVideo(media))
    }

    pub fn select_image(&self, media: LocalMedia) -> StudioResult<Activation> {
        self.select_source(SourceDescriptor::Image(media))
    }

    /// The embed API finished loading. Later signals are ignored.
    pub fn embed_api_ready(&self, api: Arc<dyn EmbedApi>) {
        self.readiness.signal_ready(api);
    }

    /// Wait for the embed API, then build the remote player whose
    /// construction was deferred until it loaded.
    ///
    /// Sources selected after the API loaded are built immediately, so the
    /// host runs this once at startup.
    pub async fn build_deferred_player(&self) -> StudioResult<()> {
        self.readiness.wait().await?;

        let completed = self.adapter.lock().complete_pending();
        match completed {
            Ok(Some(generation)) => {
                debug!(generation, "Deferred player constructed");
                self.send_event(StudioEvent::SourceActivated {
                    mode: InputMode::RemoteUrl,
                });
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                let err = StudioError::Capture(e);
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Route a signal raised by the player of `generation`.
    pub fn handle_player_signal(&self, generation: u64, signal: PlayerSignal) {
        let kind = {
            let mut adapter = self.adapter.lock();
            if !adapter.is_current(generation) {
                debug!(generation, ?signal, "Ignoring signal from released player");
                return;
            }
            if signal == PlayerSignal::Ready {
                adapter.mark_ready(generation);
            }
            adapter.backend_kind()
        };

        match signal {
            PlayerSignal::Ready => info!(generation, "Player ready"),
            PlayerSignal::StateChanged(PlaybackStatus::Playing) => self.set_pause_latch(false),
            PlayerSignal::StateChanged(status) => debug!(?status, "Playback state changed"),
            PlayerSignal::Error(code) => {
                let Some(kind) = kind else {
                    return;
                };
                let fault = classify_player_error(kind, code);
                self.report(&StudioError::PlaybackRuntime {
                    message: fault.message,
                    embedding_restricted: fault.embedding_restricted,
                });
            }
        }
    }

    /// Store a new credential. Blank input is rejected.
    pub fn submit_credential(&self, key: &str) -> StudioResult<()> {
        let credential = Credential::new(key).ok_or(StudioError::Configuration)?;
        self.credential.set(credential);
        info!("Credential updated");
        Ok(())
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_present()
    }

    fn invalidate_credential(&self) {
        warn!("Credential rejected, clearing it");
        self.credential.clear();
        self.send_event(StudioEvent::CredentialRequired {
            reason: Some(CREDENTIAL_REENTRY_PROMPT.to_string()),
        });
    }

    /// Gallery entries, in order.
    pub fn results(&self) -> Vec<ArtifactView> {
        self.session.lock().results.views()
    }

    pub fn artifact(&self, index: usize) -> Option<CaptureArtifact> {
        self.session.lock().results.get(index).cloned()
    }

    /// Write the image of gallery entry `index` to `path`.
    pub async fn save_artifact(&self, index: usize, path: &Path) -> StudioResult<()> {
        let artifact = self
            .artifact(index)
            .ok_or(StudioError::UnknownArtifact(index))?;
        tokio::fs::write(path, &artifact.image().data).await?;
        info!(index, path = %path.display(), "Artifact saved");
        Ok(())
    }

    fn add_artifact(&self, artifact: CaptureArtifact) -> usize {
        let (index, view) = {
            let mut session = self.session.lock();
            let index = session.results.insert(artifact);
            let view = session.results.get(index).map(|a| a.to_view(index));
            (index, view)
        };
        if let Some(artifact) = view {
            self.send_event(StudioEvent::ArtifactAdded { index, artifact });
        }
        index
    }

    pub fn state(&self) -> OperationState {
        *self.state.read()
    }

    pub fn mode(&self) -> InputMode {
        self.session.lock().mode
    }

    pub fn is_paused_by_capture(&self) -> bool {
        self.session.lock().paused_by_capture
    }

    /// What the primary action would do right now.
    pub fn primary_action_kind(&self) -> PrimaryAction {
        let session = self.session.lock();
        PrimaryAction::resolve(session.mode, session.paused_by_capture)
    }

    /// True when idle and something is loaded to act on.
    pub fn action_enabled(&self) -> bool {
        if self.state().is_busy() {
            return false;
        }
        let adapter = self.adapter.lock();
        match self.mode() {
            InputMode::Image => adapter.loaded_image().is_some(),
            _ => adapter.has_source(),
        }
    }

    pub fn busy_message(&self) -> Option<&'static str> {
        self.state().busy_message(self.mode())
    }

    /// Everything the UI needs to render its controls.
    pub fn status(&self) -> StudioStatus {
        let primary_action = self.primary_action_kind();
        StudioStatus {
            state: self.state(),
            mode: self.mode(),
            paused_by_capture: self.is_paused_by_capture(),
            primary_action,
            action_label: primary_action.label().to_string(),
            action_enabled: self.action_enabled(),
            busy_message: self.busy_message().map(str::to_string),
            has_credential: self.has_credential(),
            result_count: self.session.lock().results.len(),
        }
    }

    fn ensure_idle(&self) -> StudioResult<()> {
        if self.state().is_busy() {
            return Err(StudioError::Busy);
        }
        Ok(())
    }

    /// Claim the busy slot, or `None` if another operation holds it.
    fn try_begin(&self, next: OperationState) -> Option<BusyGuard<'_>> {
        {
            let mut state = self.state.write();
            if state.is_busy() {
                return None;
            }
            *state = next;
        }
        self.announce_transition(OperationState::Idle, next);
        Some(BusyGuard { studio: self })
    }

    fn set_pause_latch(&self, paused: bool) {
        let changed = {
            let mut session = self.session.lock();
            let changed = session.paused_by_capture != paused;
            session.paused_by_capture = paused;
            changed
        };
        if changed {
            debug!(paused, "Pause latch changed");
            self.send_event(StudioEvent::PauseLatchChanged(paused));
        }
    }

    fn report(&self, err: &StudioError) {
        match err {
            StudioError::CredentialRejected => return,
            StudioError::Configuration
            | StudioError::NoImageLoaded
            | StudioError::PlaybackUnavailable
            | StudioError::Busy => warn!("{}", err),
            _ => error!("{}", err),
        }
        self.send_event(StudioEvent::Error {
            kind: err.kind(),
            message: err.to_string(),
        });
    }

    fn transition_to(&self, new_state: OperationState) {
        let previous = std::mem::replace(&mut *self.state.write(), new_state);
        self.announce_transition(previous, new_state);
    }

    fn announce_transition(&self, previous: OperationState, current: OperationState) {
        debug!(
            previous = %previous.name(),
            current = %current.name(),
            "State transition"
        );
        self.send_event(StudioEvent::StateChanged { previous, current });
    }

    fn send_event(&self, event: StudioEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("Failed to send event: {}", e);
        }
    }
}

/// Holds the busy slot; returns the studio to `Idle` on drop.
struct BusyGuard<'a> {
    studio: &'a Studio,
}

impl BusyGuard<'_> {
    fn advance(&self, next: OperationState) {
        self.studio.transition_to(next);
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.studio.transition_to(OperationState::Idle);
    }
}
