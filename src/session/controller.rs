//! Session controller
//!
//! Owns the device, capture session, output surface, frame producer and GPU
//! texture of the one active session. `start_camera` and `stop` run on the
//! caller's thread; device and session callbacks run on the worker. Every
//! start bumps a generation number, and each callback carries the
//! generation it was created for, so callbacks that land after a `stop` (or
//! after a newer start) only release what they were handed.

use crate::config::CamTexConfig;
use crate::errors::CameraError;
use crate::identifier::CompositeAddress;
use crate::permissions::require_camera_permission;
use crate::platform::{
    CameraDevice, CameraService, CaptureSession, DeviceErrorCode, DeviceStateListener,
    FrameProducer, GraphicsBackend, OutputSurface, SessionConfiguration, SessionStateListener,
    TextureParams,
};
use crate::session::notice::{NoticeBoard, NoticeKind, SessionNotice};
use crate::session::request::{PreviewRequest, ZoomPolicy};
use crate::session::state::{next_phase, SessionEvent, SessionPhase};
use crate::types::TextureId;
use crate::worker::{Worker, WorkerHandle};
use crossbeam_channel::Receiver;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Controller knobs taken from configuration
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub apply_zoom_fallback: bool,
    pub worker_thread_name: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            apply_zoom_fallback: true,
            worker_thread_name: "CameraBackground".to_string(),
        }
    }
}

impl From<&CamTexConfig> for SessionSettings {
    fn from(config: &CamTexConfig) -> Self {
        Self {
            apply_zoom_fallback: config.session.apply_zoom_fallback,
            worker_thread_name: config.worker.thread_name.clone(),
        }
    }
}

/// Point-in-time view of the controller, for diagnostics and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub generation: u64,
    pub logical_id: Option<String>,
    pub physical_id: Option<String>,
    pub texture: Option<TextureId>,
    pub physical_session: bool,
    pub has_device: bool,
    pub has_session: bool,
    pub has_surface: bool,
    pub worker_running: bool,
}

struct SessionState {
    phase: SessionPhase,
    generation: u64,
    logical_id: Option<String>,
    target_physical_id: Option<String>,
    device: Option<Box<dyn CameraDevice>>,
    session: Option<Box<dyn CaptureSession>>,
    surface: Option<Arc<dyn OutputSurface>>,
    texture: Option<TextureId>,
    physical_session: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            generation: 0,
            logical_id: None,
            target_physical_id: None,
            device: None,
            session: None,
            surface: None,
            texture: None,
            physical_session: false,
        }
    }

    /// A callback from `generation` may act on the state for `event`
    fn accepts(&self, generation: u64, event: SessionEvent) -> bool {
        self.generation == generation && next_phase(self.phase, event).is_some()
    }

    fn apply(&mut self, event: SessionEvent) {
        if let Some(next) = next_phase(self.phase, event) {
            log::trace!("Session {}: {} -> {} on {:?}", self.generation, self.phase, next, event);
            self.phase = next;
        }
    }
}

struct Inner {
    state: Mutex<SessionState>,
    /// Kept apart from `state` so per-frame texture updates never wait on a callback
    producer: Mutex<Option<Arc<dyn FrameProducer>>>,
    notices: NoticeBoard,
    service: Arc<dyn CameraService>,
    apply_zoom_fallback: bool,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_producer(&self) -> MutexGuard<'_, Option<Arc<dyn FrameProducer>>> {
        self.producer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, generation: u64, kind: NoticeKind) {
        self.notices.publish(SessionNotice { generation, kind });
    }

    fn zoom_policy(&self) -> ZoomPolicy {
        ZoomPolicy {
            enabled: self.apply_zoom_fallback,
            platform_supported: self.service.capabilities().zoom_ratio,
        }
    }
}

/// Drives one capture session at a time from open to teardown
pub struct SessionController {
    graphics: Arc<dyn GraphicsBackend>,
    settings: SessionSettings,
    inner: Arc<Inner>,
    worker: Option<Worker>,
}

impl SessionController {
    pub fn new(service: Arc<dyn CameraService>, graphics: Arc<dyn GraphicsBackend>) -> Self {
        Self::with_settings(service, graphics, SessionSettings::default())
    }

    pub fn with_settings(
        service: Arc<dyn CameraService>,
        graphics: Arc<dyn GraphicsBackend>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            graphics,
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::new()),
                producer: Mutex::new(None),
                notices: NoticeBoard::new(),
                service,
                apply_zoom_fallback: settings.apply_zoom_fallback,
            }),
            settings,
            worker: None,
        }
    }

    /// Receive notices for every session started after this call
    pub fn subscribe(&self) -> Receiver<SessionNotice> {
        self.inner.notices.subscribe()
    }

    /// Tear down any running session, then start opening `request`.
    ///
    /// Returns as soon as the texture exists and the device open has been
    /// requested; frames appear once the session reaches `Previewing`.
    pub fn start_camera(
        &mut self,
        request: Option<&str>,
        width: u32,
        height: u32,
    ) -> Result<TextureId, CameraError> {
        self.stop();

        let address = CompositeAddress::from_request(request)?;
        require_camera_permission(self.inner.service.as_ref())?;

        if width == 0 || height == 0 {
            return Err(CameraError::InitializationError(format!(
                "invalid preview size {}x{}",
                width, height
            )));
        }

        match address.physical_id() {
            Some(physical) => log::info!(
                "Opening physical camera {} via logical camera {}",
                physical,
                address.logical_id()
            ),
            None => log::info!("Opening logical camera {}", address.logical_id()),
        }

        let worker = self.ensure_worker()?;
        let (texture, producer, surface) = match self.allocate_stream(width, height) {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("Failed to allocate camera texture: {}", e);
                self.stop();
                return Err(e);
            }
        };

        let generation = {
            let mut state = self.inner.lock_state();
            state.generation += 1;
            state.apply(SessionEvent::Start);
            state.logical_id = Some(address.logical_id().to_string());
            state.target_physical_id = address.physical_id().map(str::to_string);
            state.surface = Some(surface);
            state.texture = Some(texture);
            state.physical_session = false;
            state.generation
        };
        *self.inner.lock_producer() = Some(producer);

        self.inner.publish(
            generation,
            NoticeKind::Opening {
                logical_id: address.logical_id().to_string(),
                physical_id: address.physical_id().map(str::to_string),
            },
        );

        let listener = Arc::new(DeviceCallbacks {
            inner: Arc::clone(&self.inner),
            generation,
            worker: worker.clone(),
        });

        // Physical targeting only changes the session; the logical camera is what gets opened.
        if let Err(e) = self
            .inner
            .service
            .open_device(address.logical_id(), listener, &worker)
        {
            log::error!("Failed to open camera {}: {}", address.logical_id(), e);
            self.inner
                .notices
                .publish(SessionNotice::failed(generation, &e));
            self.stop();
            return Err(e);
        }

        Ok(texture)
    }

    /// Latch the newest frame into the texture. Safe in any phase.
    pub fn update_texture(&self) {
        let producer = self.inner.lock_producer().clone();
        if let Some(producer) = producer {
            if let Err(e) = producer.update_tex_image() {
                log::trace!("Texture update skipped: {}", e);
            }
        }
    }

    /// Release everything in dependency order and join the worker.
    ///
    /// Idempotent, and valid from every phase, including half-finished starts.
    pub fn stop(&mut self) {
        let (generation, was_active, session, device, surface, texture) = {
            let mut state = self.inner.lock_state();
            let was_active = state.phase != SessionPhase::Idle;
            state.apply(SessionEvent::Stop);
            state.logical_id = None;
            state.target_physical_id = None;
            state.physical_session = false;
            (
                state.generation,
                was_active,
                state.session.take(),
                state.device.take(),
                state.surface.take(),
                state.texture.take(),
            )
        };
        let producer = self.inner.lock_producer().take();

        if let Some(mut session) = session {
            session.close();
        }
        if let Some(mut device) = device {
            device.close();
        }
        if let Some(surface) = surface {
            surface.release();
        }
        if let Some(producer) = producer {
            producer.release();
        }
        if let Some(texture) = texture {
            self.graphics.delete_texture(texture);
        }

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.shutdown() {
                log::error!("Failed to stop camera worker: {}", e);
            }
        }

        if was_active {
            log::info!("Camera session {} stopped", generation);
            self.inner.publish(generation, NoticeKind::Stopped);
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.lock_state().phase
    }

    pub fn texture_id(&self) -> Option<TextureId> {
        self.inner.lock_state().texture
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock_state();
        SessionSnapshot {
            phase: state.phase,
            generation: state.generation,
            logical_id: state.logical_id.clone(),
            physical_id: state.target_physical_id.clone(),
            texture: state.texture,
            physical_session: state.physical_session,
            has_device: state.device.is_some(),
            has_session: state.session.is_some(),
            has_surface: state.surface.is_some(),
            worker_running: self.worker.as_ref().is_some_and(Worker::is_running),
        }
    }

    fn ensure_worker(&mut self) -> Result<WorkerHandle, CameraError> {
        if let Some(worker) = self.worker.as_ref().filter(|w| w.is_running()) {
            return Ok(worker.handle());
        }
        let worker = Worker::spawn(&self.settings.worker_thread_name)?;
        let handle = worker.handle();
        self.worker = Some(worker);
        Ok(handle)
    }

    /// Texture, frame producer and output surface, all or nothing
    fn allocate_stream(
        &self,
        width: u32,
        height: u32,
    ) -> Result<(TextureId, Arc<dyn FrameProducer>, Arc<dyn OutputSurface>), CameraError> {
        let texture = self.graphics.create_external_texture()?;

        let bound = self
            .graphics
            .configure_texture(texture, &TextureParams::video())
            .and_then(|_| {
                // The producer binds by name, so the texture must exist on the GPU first.
                self.graphics.flush();
                self.graphics.create_frame_producer(texture, width, height)
            });

        let producer = match bound {
            Ok(producer) => producer,
            Err(e) => {
                self.graphics.delete_texture(texture);
                return Err(e);
            }
        };

        match producer.output_surface() {
            Ok(surface) => Ok((texture, producer, surface)),
            Err(e) => {
                producer.release();
                self.graphics.delete_texture(texture);
                Err(e)
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.stop();
    }
}

struct DeviceCallbacks {
    inner: Arc<Inner>,
    generation: u64,
    worker: WorkerHandle,
}

impl DeviceCallbacks {
    fn lose_device(
        &self,
        mut device: Box<dyn CameraDevice>,
        error: CameraError,
        event: SessionEvent,
    ) {
        let device_id = device.id().to_string();
        device.close();

        let mut state = self.inner.lock_state();
        if !state.accepts(self.generation, event) {
            log::debug!("Ignoring stale {:?} for camera {}", event, device_id);
            return;
        }

        log::warn!("{}", error);
        state.apply(event);
        if let Some(mut session) = state.session.take() {
            session.close();
        }
        if let Some(mut held) = state.device.take() {
            held.close();
        }
        drop(state);

        self.inner
            .notices
            .publish(SessionNotice::failed(self.generation, &error));
    }
}

impl DeviceStateListener for DeviceCallbacks {
    fn on_opened(&self, mut device: Box<dyn CameraDevice>) {
        let mut state = self.inner.lock_state();
        if !state.accepts(self.generation, SessionEvent::DeviceOpened) {
            drop(state);
            log::debug!("Closing camera {} opened for a stale session", device.id());
            device.close();
            return;
        }

        let Some(surface) = state.surface.clone() else {
            drop(state);
            device.close();
            return;
        };

        let logical_id = device.id().to_string();
        state.apply(SessionEvent::DeviceOpened);
        self.inner.publish(
            self.generation,
            NoticeKind::DeviceOpened {
                logical_id: logical_id.clone(),
            },
        );

        let physical_streams = self.inner.service.capabilities().physical_streams;
        let configuration = match state.target_physical_id.as_deref() {
            Some(physical) if physical_streams => SessionConfiguration::physical(surface, physical),
            Some(physical) => {
                log::warn!(
                    "Physical streams unsupported; camera {} falls back to {}",
                    physical,
                    logical_id
                );
                SessionConfiguration::standard(surface)
            }
            None => SessionConfiguration::standard(surface),
        };
        state.physical_session = configuration.is_physical();

        let listener = Arc::new(SessionCallbacks {
            inner: Arc::clone(&self.inner),
            generation: self.generation,
            worker: self.worker.clone(),
            physical: configuration.is_physical(),
        });

        let created = device.create_capture_session(configuration, listener, &self.worker);
        state.device = Some(device);

        if let Err(e) = created {
            log::error!("Failed to create capture session on {}: {}", logical_id, e);
            state.apply(SessionEvent::SessionConfigureFailed);
            drop(state);
            self.inner
                .notices
                .publish(SessionNotice::failed(self.generation, &e));
        }
    }

    fn on_disconnected(&self, device: Box<dyn CameraDevice>) {
        let error = CameraError::DeviceError(format!("camera {} disconnected", device.id()));
        self.lose_device(device, error, SessionEvent::DeviceDisconnected);
    }

    fn on_error(&self, device: Box<dyn CameraDevice>, code: DeviceErrorCode) {
        let error = CameraError::DeviceError(format!("camera {} error {}", device.id(), code));
        self.lose_device(device, error, SessionEvent::DeviceError);
    }
}

struct SessionCallbacks {
    inner: Arc<Inner>,
    generation: u64,
    worker: WorkerHandle,
    physical: bool,
}

impl SessionStateListener for SessionCallbacks {
    fn on_configured(&self, mut session: Box<dyn CaptureSession>) {
        let mut state = self.inner.lock_state();
        let accepted = state.accepts(self.generation, SessionEvent::SessionConfigured);
        let device_id = state.device.as_ref().map(|device| device.id().to_string());
        let (true, Some(device_id), Some(surface)) = (accepted, device_id, state.surface.clone())
        else {
            drop(state);
            log::debug!("Closing capture session configured for a stale session");
            session.close();
            return;
        };
        state.apply(SessionEvent::SessionConfigured);

        let zoom_ratio = self
            .inner
            .zoom_policy()
            .resolve(self.physical, || {
                self.inner
                    .service
                    .characteristics(&device_id)
                    .map(|chars| chars.zoom_ratio_range)
            })
            .unwrap_or_else(|e| {
                log::warn!("Zoom lookup failed for camera {}: {}", device_id, e);
                None
            });

        let request = PreviewRequest::preview(surface).with_zoom_ratio(zoom_ratio);
        let submitted = session.set_repeating_request(&request, &self.worker);
        state.session = Some(session);

        match submitted {
            Ok(()) => {
                state.apply(SessionEvent::RepeatingRequestSubmitted);
                drop(state);
                match zoom_ratio {
                    Some(ratio) => log::info!("Preview started on {} at zoom {}", device_id, ratio),
                    None => log::info!("Preview started on {}", device_id),
                }
                self.inner.publish(
                    self.generation,
                    NoticeKind::PreviewStarted {
                        zoom_ratio,
                        physical: self.physical,
                    },
                );
            }
            Err(e) => {
                state.apply(SessionEvent::RepeatingRequestFailed);
                drop(state);
                log::error!("Repeating request rejected on {}: {}", device_id, e);
                self.inner
                    .notices
                    .publish(SessionNotice::failed(self.generation, &e));
            }
        }
    }

    fn on_configure_failed(&self, mut session: Box<dyn CaptureSession>) {
        session.close();

        let mut state = self.inner.lock_state();
        if !state.accepts(self.generation, SessionEvent::SessionConfigureFailed) {
            log::debug!("Ignoring stale configure failure");
            return;
        }
        state.apply(SessionEvent::SessionConfigureFailed);
        let camera = state.logical_id.clone().unwrap_or_default();
        drop(state);

        let error = CameraError::SessionError(format!(
            "capture session on camera {} could not be configured",
            camera
        ));
        log::error!("{}", error);
        self.inner
            .notices
            .publish(SessionNotice::failed(self.generation, &error));
    }
}
