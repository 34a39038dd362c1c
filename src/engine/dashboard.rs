//! Dashboard engine
//!
//! One task owns every piece of mutable state: the store, the per-camera
//! frame pipelines, the synthesizer and the session handle. Everything else
//! reaches it as a message on one of its queues, so no locking is needed.
//!
//! ```text
//!   Session events ───────┐
//!   EngineHandle (user) ──┤                      ┌──► CameraStore
//!   REST acks (spawned) ──┼──► select! ──► Engine ┼──► FramePipeline ──► decode task
//!   Decode results ───────┤                      └──► Synthesizer
//!   AuthState watch ──────┘                             │
//!                                                        ▼
//!                                  broadcast<DashboardEvent> ──► subscribers
//! ```
//!
//! REST calls are spawned and post their result back as an acknowledgement
//! tagged with the session current at issue time. Acknowledgements from a
//! replaced session are dropped.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use image::RgbaImage;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::api::{AuthState, CommandApi, NewCamera};
use crate::audio::{AudioSink, Cue, Synthesizer};
use crate::error::TransportError;
use crate::overlay::{
    draw_annotations, hit_test, map_detections, ClickableRegion, Point, Size, SurfaceLayout,
};
use crate::render::{DecodeOutcome, DecodedFrame, FramePipeline, RenderState};
use crate::session::{Connector, InboundEvent, Session, SessionEvent, SessionId};
use crate::store::{CameraId, CameraStore, Detection, DetectionSet, DetectionView, StoreChange};

use super::command::{AckOutcome, CameraTile, CommandAck, DashboardSnapshot, UserCommand};
use super::config::EngineConfig;
use super::notice::Notice;

/// What the engine tells the outside world
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// A camera tile was redrawn
    Rendered {
        camera: CameraId,
        /// Clickable regions for this render pass
        regions: Vec<ClickableRegion>,
        /// Native-size picture with annotations drawn when enabled
        image: Arc<RgbaImage>,
    },
    /// A camera tile switched to its placeholder
    Placeholder { camera: CameraId },
    /// The user clicked a detection
    DetectionSelected {
        camera: CameraId,
        index: usize,
        detection: Detection,
    },
    Notice(Notice),
    /// A camera's status flags, error text or settings changed
    StateChanged { camera: CameraId },
    /// A camera and everything derived from it were removed
    CameraRemoved { camera: CameraId },
    /// The transport session opened or closed
    ConnectionChanged { connected: bool },
}

/// Cloneable handle for talking to a running [`Engine`]
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<UserCommand>,
    events: broadcast::Sender<DashboardEvent>,
}

impl EngineHandle {
    /// Submit a command
    ///
    /// Returns false if the engine has stopped.
    pub async fn send(&self, command: UserCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Receive dashboard events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub async fn start(&self, camera: CameraId) -> bool {
        self.send(UserCommand::Start(camera)).await
    }

    pub async fn stop(&self, camera: CameraId) -> bool {
        self.send(UserCommand::Stop(camera)).await
    }

    pub async fn set_detection(&self, camera: CameraId, enabled: bool) -> bool {
        self.send(UserCommand::SetDetection { camera, enabled }).await
    }

    pub async fn add_camera(&self, camera: NewCamera) -> bool {
        self.send(UserCommand::AddCamera(camera)).await
    }

    /// Current dashboard state, or `None` if the engine has stopped
    pub async fn snapshot(&self) -> Option<DashboardSnapshot> {
        let (tx, rx) = oneshot::channel();
        if !self.send(UserCommand::Snapshot(tx)).await {
            return None;
        }
        rx.await.ok()
    }

    /// Ask the engine to stop
    pub async fn shutdown(&self) {
        let _ = self.send(UserCommand::Shutdown).await;
    }
}

/// Render-side state of one camera tile
#[derive(Debug)]
struct CameraView {
    pipeline: FramePipeline,
    /// Displayed size; native size until the host reports a layout
    displayed: Option<Size>,
    offset: Point,
    regions: Vec<ClickableRegion>,
}

impl CameraView {
    fn new(camera: CameraId) -> Self {
        Self {
            pipeline: FramePipeline::new(camera),
            displayed: None,
            offset: Point::default(),
            regions: Vec::new(),
        }
    }

    fn layout(&self) -> SurfaceLayout {
        let native = Size::from(self.pipeline.surface().dimensions());
        SurfaceLayout::new(native, self.displayed.unwrap_or(native)).with_offset(self.offset)
    }
}

enum EngineInput {
    Session(Option<SessionEvent>),
    User(Option<UserCommand>),
    Ack(CommandAck),
    Decoded(DecodedFrame),
    /// Auth state changed; `false` once the sender is gone
    Auth(bool),
}

enum Flow {
    Continue,
    Stop,
}

/// Real-time camera dashboard engine
pub struct Engine<A: CommandApi, S: AudioSink, C: Connector> {
    config: EngineConfig,
    api: Arc<A>,
    connector: C,
    store: CameraStore,
    views: HashMap<CameraId, CameraView>,
    synth: Synthesizer<S>,

    session: Option<Session>,
    session_events: Option<mpsc::Receiver<SessionEvent>>,
    session_id: SessionId,
    next_session_id: u64,

    commands: mpsc::Receiver<UserCommand>,
    acks_tx: mpsc::UnboundedSender<CommandAck>,
    acks: mpsc::UnboundedReceiver<CommandAck>,
    decoded_tx: mpsc::UnboundedSender<DecodedFrame>,
    decoded: mpsc::UnboundedReceiver<DecodedFrame>,
    auth: watch::Receiver<AuthState>,
    auth_open: bool,
    events: broadcast::Sender<DashboardEvent>,
}

impl<A: CommandApi, S: AudioSink, C: Connector> Engine<A, S, C> {
    /// Create an engine and the handle used to drive it
    ///
    /// Nothing happens until [`run`](Self::run) is awaited.
    pub fn new(
        config: EngineConfig,
        api: A,
        connector: C,
        sink: S,
        auth: watch::Receiver<AuthState>,
    ) -> (Self, EngineHandle) {
        let (commands_tx, commands) = mpsc::channel(config.command_capacity.max(1));
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (acks_tx, acks) = mpsc::unbounded_channel();
        let (decoded_tx, decoded) = mpsc::unbounded_channel();

        let handle = EngineHandle {
            commands: commands_tx,
            events: events.clone(),
        };

        let engine = Self {
            synth: Synthesizer::new(config.synth.clone(), sink),
            config,
            api: Arc::new(api),
            connector,
            store: CameraStore::new(),
            views: HashMap::new(),
            session: None,
            session_events: None,
            session_id: SessionId(0),
            next_session_id: 1,
            commands,
            acks_tx,
            acks,
            decoded_tx,
            decoded,
            auth,
            auth_open: true,
            events,
        };

        (engine, handle)
    }

    /// Read access to the store
    pub fn store(&self) -> &CameraStore {
        &self.store
    }

    /// Run until shutdown, sign-out, or every handle is dropped
    ///
    /// Errors never escape: each one ends up in the log or as a
    /// [`Notice`].
    pub async fn run(mut self) {
        if !self.wait_for_sign_in().await {
            tracing::info!("Engine stopped before sign-in");
            return;
        }

        self.connect().await;
        self.bootstrap().await;

        loop {
            let input = tokio::select! {
                event = next_session_event(&mut self.session_events) => EngineInput::Session(event),
                command = self.commands.recv() => EngineInput::User(command),
                Some(ack) = self.acks.recv() => EngineInput::Ack(ack),
                Some(decoded) = self.decoded.recv() => EngineInput::Decoded(decoded),
                changed = self.auth.changed(), if self.auth_open => EngineInput::Auth(changed.is_ok()),
            };

            let flow = match input {
                EngineInput::Session(Some(event)) => {
                    self.on_session_event(event);
                    Flow::Continue
                }
                EngineInput::Session(None) => {
                    self.session_events = None;
                    Flow::Continue
                }
                EngineInput::User(Some(command)) => self.on_command(command).await,
                EngineInput::User(None) => {
                    tracing::info!("All engine handles dropped");
                    Flow::Stop
                }
                EngineInput::Ack(ack) => {
                    self.on_ack(ack);
                    Flow::Continue
                }
                EngineInput::Decoded(decoded) => {
                    self.on_decoded(decoded);
                    Flow::Continue
                }
                EngineInput::Auth(changed) => self.on_auth(changed),
            };

            if let Flow::Stop = flow {
                break;
            }
        }

        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
        tracing::info!("Engine stopped");
    }

    /// Hold until signed in, answering snapshots meanwhile
    async fn wait_for_sign_in(&mut self) -> bool {
        if *self.auth.borrow_and_update() == AuthState::SignedIn {
            return true;
        }

        tracing::info!("Waiting for sign-in");
        loop {
            tokio::select! {
                changed = self.auth.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                    if *self.auth.borrow_and_update() == AuthState::SignedIn {
                        return true;
                    }
                }
                command = self.commands.recv() => match command {
                    None | Some(UserCommand::Shutdown) => return false,
                    Some(UserCommand::Snapshot(reply)) => {
                        let _ = reply.send(self.snapshot());
                    }
                    Some(other) => tracing::debug!(command = ?other, "Ignoring command while signed out"),
                },
            }
        }
    }

    /// Open a new session
    ///
    /// The current session id only moves on success, so acknowledgements
    /// issued before a failed attempt still apply.
    async fn connect(&mut self) {
        let id = SessionId(self.next_session_id);
        self.next_session_id += 1;

        match Session::connect(&self.connector, id, &self.config.session).await {
            Ok((session, events)) => {
                self.session_id = id;
                self.session = Some(session);
                self.session_events = Some(events);
            }
            Err(e) => {
                self.store.set_connected(false);
                self.notify(Notice::error(format!("Connection failed: {}", e)));
            }
        }
    }

    async fn bootstrap(&mut self) {
        match self.api.list_cameras().await {
            Ok(records) => {
                self.store.bootstrap(&records);
                for record in records {
                    self.view_mut(&record.id);
                    self.load_settings(record.id.clone());
                    self.emit(DashboardEvent::StateChanged { camera: record.id });
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list cameras");
                self.notify(Notice::error(format!("Failed to load cameras: {}", e)));
            }
        }
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Opened => {
                self.store.set_connected(true);
                self.emit(DashboardEvent::ConnectionChanged { connected: true });

                // Cameras already streaming need their frames again
                let streaming: Vec<CameraId> = self
                    .store
                    .camera_ids()
                    .into_iter()
                    .filter(|id| self.store.state(id).map_or(false, |s| s.is_streaming))
                    .collect();
                for camera in streaming {
                    self.subscribe(&camera, true);
                }
            }
            SessionEvent::Inbound(event) => self.on_inbound(event),
            SessionEvent::Closed(reason) => {
                self.store.set_connected(false);
                self.session = None;

                if reason.is_unexpected() {
                    tracing::warn!(session_id = %self.session_id, reason = %reason, "Connection lost");
                    self.notify(Notice::warning(format!("Connection lost: {}", reason)));
                }

                self.emit(DashboardEvent::ConnectionChanged { connected: false });
                for camera in self.store.camera_ids() {
                    self.emit(DashboardEvent::StateChanged { camera });
                }
            }
        }
    }

    fn on_inbound(&mut self, event: InboundEvent) {
        tracing::debug!(kind = event.kind(), camera = ?event.camera_id(), "Inbound event");

        match &event {
            InboundEvent::Connected { client_id } => {
                tracing::info!(client_id = ?client_id, "Server confirmed session");
            }
            InboundEvent::ServerError { message } => {
                tracing::warn!(message = %message, "Server error");
                self.notify(Notice::error(message.clone()));
            }
            InboundEvent::CameraError { camera_id, message } => {
                tracing::warn!(camera = %camera_id, message = %message, "Camera error");
                self.notify(Notice::error(message.clone()).for_camera(camera_id.clone()));
            }
            _ => {}
        }

        let change = self.store.apply_event(&event);
        if let Some(camera) = event.camera_id() {
            self.on_store_change(camera, change);
        }
    }

    fn on_store_change(&mut self, camera: &CameraId, change: StoreChange) {
        match change {
            StoreChange::Unchanged => {}
            StoreChange::FrameReplaced { seq } => self.request_decode(camera, seq),
            StoreChange::DetectionsReplaced { new_classes } => {
                self.present(camera);
                self.sound_cues(camera, &new_classes);
                self.emit(DashboardEvent::StateChanged {
                    camera: camera.clone(),
                });
            }
            StoreChange::DetectionsCleared => {
                self.present(camera);
                self.emit(DashboardEvent::StateChanged {
                    camera: camera.clone(),
                });
            }
            StoreChange::StreamCleared => {
                self.show_placeholder(camera);
                self.emit(DashboardEvent::StateChanged {
                    camera: camera.clone(),
                });
            }
            StoreChange::StatusChanged => {
                self.emit(DashboardEvent::StateChanged {
                    camera: camera.clone(),
                });
            }
        }
    }

    fn request_decode(&mut self, camera: &CameraId, seq: u64) {
        let Some(frame) = self.store.frame(camera) else {
            return;
        };

        let view = self
            .views
            .entry(camera.clone())
            .or_insert_with(|| CameraView::new(camera.clone()));

        if let Some(job) = view.pipeline.request(seq, frame) {
            let results = self.decoded_tx.clone();
            tokio::spawn(async move {
                let _ = results.send(job.run().await);
            });
        }
    }

    fn on_decoded(&mut self, decoded: DecodedFrame) {
        let Some(view) = self.views.get_mut(&decoded.camera_id) else {
            tracing::debug!(camera = %decoded.camera_id, "Decode finished for a removed camera");
            return;
        };

        if let DecodeOutcome::Rendered = view.pipeline.complete(decoded.seq, decoded.result) {
            self.present(&decoded.camera_id);
        }
    }

    /// Recompute regions and publish the picture with its annotations
    fn present(&mut self, camera: &CameraId) {
        let Some(view) = self.views.get_mut(camera) else {
            return;
        };

        if view.pipeline.state() != RenderState::Showing {
            view.regions.clear();
            return;
        }

        let empty = DetectionSet::default();
        let set = match self.store.detection_view(camera) {
            Some(DetectionView::Live(set)) => set,
            _ => &empty,
        };
        let show_boxes = self.store.settings(camera).map_or(true, |s| s.show_boxes);

        view.regions = map_detections(set, &view.layout());

        let mut image = view.pipeline.surface().pixels().clone();
        if show_boxes {
            draw_annotations(&mut image, set);
        }

        let event = DashboardEvent::Rendered {
            camera: camera.clone(),
            regions: view.regions.clone(),
            image: Arc::new(image),
        };
        self.emit(event);
    }

    fn show_placeholder(&mut self, camera: &CameraId) {
        let view = self.view_mut(camera);
        if view.pipeline.show_placeholder() {
            view.regions.clear();
            self.emit(DashboardEvent::Placeholder {
                camera: camera.clone(),
            });
        }
    }

    fn sound_cues(&mut self, camera: &CameraId, new_classes: &[(String, f32)]) {
        let settings = self.store.settings(camera).cloned().unwrap_or_default();

        for (class, confidence) in new_classes {
            if !settings.allows_cue(class, *confidence) {
                tracing::debug!(camera = %camera, class = %class, "Cue suppressed by camera settings");
                continue;
            }

            let outcome = self
                .synth
                .play_object_detection_sound(class, Some(*confidence));
            tracing::debug!(camera = %camera, class = %class, outcome = ?outcome, "Detection cue");
        }
    }

    async fn on_command(&mut self, command: UserCommand) -> Flow {
        match command {
            UserCommand::Start(camera) => {
                tracing::info!(camera = %camera, "Starting camera");
                let change = self.store.begin_start(&camera);
                self.on_store_change(&camera, change);
                self.dispatch(move |api| async move {
                    let result = api.start_camera(&camera).await;
                    AckOutcome::Start { camera, result }
                });
            }
            UserCommand::Stop(camera) => {
                tracing::info!(camera = %camera, "Stopping camera");
                let change = self.store.begin_stop(&camera);
                self.on_store_change(&camera, change);
                self.dispatch(move |api| async move {
                    let result = api.stop_camera(&camera).await;
                    AckOutcome::Stop { camera, result }
                });
            }
            UserCommand::SetDetection { camera, enabled } => {
                tracing::info!(camera = %camera, enabled, "Switching detection");
                let change = self.store.begin_toggle(&camera, enabled);
                self.on_store_change(&camera, change);
                self.dispatch(move |api| async move {
                    let result = api.set_detection(&camera, enabled).await;
                    AckOutcome::Toggle {
                        camera,
                        enabled,
                        result,
                    }
                });
            }
            UserCommand::AddCamera(camera) => {
                tracing::info!(name = %camera.name, ip = %camera.ip_address, "Adding camera");
                self.dispatch(move |api| async move { AckOutcome::Added(api.add_camera(&camera).await) });
            }
            UserCommand::RemoveCamera(camera) => {
                tracing::info!(camera = %camera, "Removing camera");
                self.dispatch(move |api| async move {
                    let result = api.delete_camera(&camera).await;
                    AckOutcome::Removed { camera, result }
                });
            }
            UserCommand::UpdateSettings { camera, settings } => {
                self.dispatch(move |api| async move {
                    let result = api.update_settings(&camera, &settings).await;
                    AckOutcome::SettingsSaved { camera, result }
                });
            }
            UserCommand::Resize {
                camera,
                displayed,
                offset,
            } => {
                let view = self.view_mut(&camera);
                view.displayed = Some(displayed);
                view.offset = offset;
                self.present(&camera);
            }
            UserCommand::Click { camera, x, y } => self.on_click(camera, x, y),
            UserCommand::SetSoundEnabled(enabled) => {
                tracing::info!(enabled, "Sound cues switched");
                self.synth.set_enabled(enabled);
            }
            UserCommand::SetMasterVolume(volume) => {
                self.synth.set_master_volume(volume);
                tracing::debug!(volume = self.synth.master_volume(), "Master volume set");
            }
            UserCommand::ResumeAudio => {
                if self.synth.resume().is_ok() {
                    tracing::info!("Audio output resumed");
                }
            }
            UserCommand::Reconnect => {
                if self.session.as_ref().map_or(false, Session::is_open) {
                    tracing::debug!(session_id = %self.session_id, "Already connected");
                } else {
                    self.connect().await;
                }
            }
            UserCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            UserCommand::Shutdown => {
                tracing::info!("Shutdown requested");
                return Flow::Stop;
            }
        }

        Flow::Continue
    }

    fn on_click(&mut self, camera: CameraId, x: f64, y: f64) {
        let Some(index) = self
            .views
            .get(&camera)
            .and_then(|view| hit_test(&view.regions, x, y))
        else {
            return;
        };

        let Some(detection) = self
            .store
            .detections(&camera)
            .and_then(|set| set.get(index))
            .cloned()
        else {
            return;
        };

        self.synth.play(Cue::Click, 1.0);
        self.emit(DashboardEvent::DetectionSelected {
            camera,
            index,
            detection,
        });
    }

    fn on_ack(&mut self, ack: CommandAck) {
        if ack.session != self.session_id {
            tracing::debug!(
                session_id = %ack.session,
                current = %self.session_id,
                "Ignoring acknowledgement from a replaced session"
            );
            return;
        }

        match ack.outcome {
            AckOutcome::Start { camera, result } => {
                let change = self.store.ack_start(&camera, &result);
                match &result {
                    Ok(()) => {
                        tracing::info!(camera = %camera, "Camera started");
                        self.subscribe(&camera, true);
                        self.synth.play(Cue::CameraStart, 1.0);
                    }
                    Err(e) => {
                        self.notify(
                            Notice::error(format!("Failed to start camera: {}", e))
                                .for_camera(camera.clone()),
                        );
                        self.synth.play(Cue::Error, 1.0);
                    }
                }
                if !self.is_streaming(&camera) {
                    self.show_placeholder(&camera);
                }
                self.on_store_change(&camera, change);
            }
            AckOutcome::Stop { camera, result } => {
                let change = self.store.ack_stop(&camera, &result);
                match &result {
                    Ok(()) => {
                        tracing::info!(camera = %camera, "Camera stopped");
                        self.subscribe(&camera, false);
                        self.synth.play(Cue::CameraStop, 1.0);
                    }
                    Err(e) => {
                        self.notify(
                            Notice::error(format!("Failed to stop camera: {}", e))
                                .for_camera(camera.clone()),
                        );
                        self.synth.play(Cue::Error, 1.0);
                    }
                }
                self.on_store_change(&camera, change);
            }
            AckOutcome::Toggle {
                camera,
                enabled,
                result,
            } => {
                let change = self.store.ack_toggle(&camera, enabled, &result);
                match &result {
                    Ok(()) => tracing::info!(camera = %camera, enabled, "Detection switched"),
                    Err(e) => self.notify(
                        Notice::error(format!("Failed to switch detection: {}", e))
                            .for_camera(camera.clone()),
                    ),
                }
                self.on_store_change(&camera, change);
            }
            AckOutcome::Added(result) => match result {
                Ok(record) => {
                    tracing::info!(camera = %record.id, name = %record.name, "Camera added");
                    self.store.add_camera(&record);
                    self.view_mut(&record.id);
                    self.load_settings(record.id.clone());
                    self.notify(Notice::info(format!("Camera {} added", record.name)));
                    self.emit(DashboardEvent::StateChanged { camera: record.id });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to add camera");
                    self.notify(Notice::error(format!("Failed to add camera: {}", e)));
                }
            },
            AckOutcome::Removed { camera, result } => match result {
                Ok(()) => {
                    if self.is_streaming(&camera) && self.store.is_connected() {
                        self.subscribe(&camera, false);
                    }
                    self.store.remove_camera(&camera);
                    self.views.remove(&camera);
                    self.emit(DashboardEvent::CameraRemoved { camera });
                }
                Err(e) => {
                    tracing::warn!(camera = %camera, error = %e, "Failed to remove camera");
                    self.store.record_error(&camera, e.to_string());
                    self.notify(
                        Notice::error(format!("Failed to remove camera: {}", e))
                            .for_camera(camera.clone()),
                    );
                    self.emit(DashboardEvent::StateChanged { camera });
                }
            },
            AckOutcome::SettingsSaved { camera, result } => match result {
                Ok(settings) => {
                    tracing::info!(camera = %camera, "Camera settings saved");
                    self.store.set_settings(&camera, settings);
                    self.present(&camera);
                    self.emit(DashboardEvent::StateChanged { camera });
                }
                Err(e) => {
                    tracing::warn!(camera = %camera, error = %e, "Failed to save settings");
                    self.store.record_error(&camera, e.to_string());
                    self.notify(
                        Notice::error(format!("Failed to save settings: {}", e))
                            .for_camera(camera.clone()),
                    );
                    self.emit(DashboardEvent::StateChanged { camera });
                }
            },
            AckOutcome::SettingsLoaded { camera, result } => match result {
                Ok(settings) => {
                    self.store.set_settings(&camera, settings);
                    self.present(&camera);
                }
                Err(e) => {
                    tracing::debug!(camera = %camera, error = %e, "Keeping default settings");
                }
            },
        }
    }

    fn on_auth(&mut self, changed: bool) -> Flow {
        if !changed {
            tracing::debug!("Auth channel closed");
            self.auth_open = false;
            return Flow::Continue;
        }

        match *self.auth.borrow_and_update() {
            AuthState::SignedOut => {
                tracing::info!("Signed out, stopping engine");
                Flow::Stop
            }
            AuthState::SignedIn => Flow::Continue,
        }
    }

    /// Run a REST call off the loop and queue its acknowledgement
    fn dispatch<F, Fut>(&self, command: F)
    where
        F: FnOnce(Arc<A>) -> Fut,
        Fut: Future<Output = AckOutcome> + Send + 'static,
    {
        let acks = self.acks_tx.clone();
        let session = self.session_id;
        let call = command(Arc::clone(&self.api));

        tokio::spawn(async move {
            let outcome = call.await;
            let _ = acks.send(CommandAck { session, outcome });
        });
    }

    fn load_settings(&self, camera: CameraId) {
        self.dispatch(move |api| async move {
            let result = api.get_settings(&camera).await;
            AckOutcome::SettingsLoaded { camera, result }
        });
    }

    fn subscribe(&mut self, camera: &CameraId, subscribe: bool) {
        let result = match &self.session {
            Some(session) if subscribe => session.subscribe(camera),
            Some(session) => session.unsubscribe(camera),
            None => Err(TransportError::NotOpen),
        };

        if let Err(e) = result {
            tracing::warn!(camera = %camera, subscribe, error = %e, "Subscription not sent");
            self.notify(
                Notice::warning(format!("Not connected: {}", e)).for_camera(camera.clone()),
            );
        }
    }

    fn is_streaming(&self, camera: &CameraId) -> bool {
        self.store.state(camera).map_or(false, |s| s.is_streaming)
    }

    fn view_mut(&mut self, camera: &CameraId) -> &mut CameraView {
        self.views
            .entry(camera.clone())
            .or_insert_with(|| CameraView::new(camera.clone()))
    }

    fn snapshot(&self) -> DashboardSnapshot {
        let cameras = self
            .store
            .camera_ids()
            .into_iter()
            .filter_map(|id| {
                let snapshot = self.store.snapshot(&id)?;
                let presence = self.store.presence(&id)?;
                let detection = self.store.detection_view(&id)?.into();
                let view = self.views.get(&id);
                let tile = CameraTile {
                    snapshot,
                    presence,
                    detection,
                    render: view.map_or(RenderState::Placeholder, |v| v.pipeline.state()),
                    regions: view.map(|v| v.regions.clone()).unwrap_or_default(),
                };
                Some((id, tile))
            })
            .collect();

        DashboardSnapshot {
            connected: self.store.is_connected(),
            session_id: self.session_id,
            sound_enabled: self.synth.is_enabled(),
            master_volume: self.synth.master_volume(),
            cameras,
        }
    }

    fn notify(&self, notice: Notice) {
        tracing::debug!(notice = %notice, "Notice");
        self.emit(DashboardEvent::Notice(notice));
    }

    fn emit(&self, event: DashboardEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

async fn next_session_event(
    events: &mut Option<mpsc::Receiver<SessionEvent>>,
) -> Option<SessionEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
