//! Simulated camera service and graphics backend
//!
//! Cameras are described by a [`SimulatedRig`], built in code or loaded from
//! TOML. Device and session callbacks are posted on the executor handed in,
//! the way a real camera service delivers them, so tests run with the same
//! threading as production. Failures are injected through
//! [`SimulatedFaults`]; counters expose what was opened, submitted and leaked.

use crate::errors::CameraError;
use crate::permissions::PermissionStatus;
use crate::platform::{
    CameraDevice, CameraService, CaptureSession, DeviceErrorCode, DeviceStateListener,
    FrameProducer, GraphicsBackend, OutputSurface, SessionConfiguration, SessionStateListener,
    TextureParams,
};
use crate::session::request::PreviewRequest;
use crate::types::{CameraCharacteristics, LensFacing, PlatformCapabilities, TextureId, ZoomRange};
use crate::worker::WorkerHandle;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn default_api_level() -> u32 {
    PlatformCapabilities::ZOOM_RATIO_API_LEVEL
}

fn default_permission() -> PermissionStatus {
    PermissionStatus::Granted
}

fn default_listed() -> bool {
    true
}

/// One camera known to the simulated service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedCamera {
    pub id: String,
    /// Returned by the id list; unlisted cameras are only found by probing
    #[serde(default = "default_listed")]
    pub listed: bool,
    #[serde(default)]
    pub facing: Option<LensFacing>,
    #[serde(default)]
    pub focal_lengths: Option<Vec<f32>>,
    #[serde(default)]
    pub physical_ids: Option<Vec<String>>,
    #[serde(default)]
    pub zoom_range: Option<ZoomRange>,
    /// Characteristics queries fail for this camera
    #[serde(default)]
    pub broken: bool,
}

impl SimulatedCamera {
    pub fn new(id: impl Into<String>, facing: LensFacing) -> Self {
        Self {
            id: id.into(),
            listed: true,
            facing: Some(facing),
            focal_lengths: None,
            physical_ids: None,
            zoom_range: None,
            broken: false,
        }
    }

    pub fn focal_length(mut self, millimeters: f32) -> Self {
        self.focal_lengths = Some(vec![millimeters]);
        self
    }

    pub fn physical(mut self, ids: &[&str]) -> Self {
        self.physical_ids = Some(ids.iter().map(|id| id.to_string()).collect());
        self
    }

    pub fn zoom(mut self, lower: f32, upper: f32) -> Self {
        self.zoom_range = Some(ZoomRange::new(lower, upper));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.listed = false;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// Characteristics as a platform at `capabilities` would report them
    fn characteristics(&self, capabilities: PlatformCapabilities) -> CameraCharacteristics {
        CameraCharacteristics {
            lens_facing: self.facing,
            focal_lengths: self.focal_lengths.clone(),
            physical_camera_ids: self
                .physical_ids
                .clone()
                .filter(|_| capabilities.multi_camera),
            zoom_ratio_range: self.zoom_range.filter(|_| capabilities.zoom_ratio),
        }
    }
}

/// Description of a simulated device: OS level, permission state, cameras
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedRig {
    #[serde(default = "default_api_level")]
    pub api_level: u32,
    #[serde(default = "default_permission")]
    pub permission: PermissionStatus,
    #[serde(default, rename = "camera")]
    pub cameras: Vec<SimulatedCamera>,
}

impl Default for SimulatedRig {
    fn default() -> Self {
        Self {
            api_level: default_api_level(),
            permission: default_permission(),
            cameras: Vec::new(),
        }
    }
}

impl SimulatedRig {
    /// A phone with a back multi-camera (wide `2` and tele `3` behind `0`),
    /// a front camera `1` and a vendor camera `5` missing from the id list.
    pub fn multi_camera_phone() -> Self {
        Self::default()
            .with_camera(
                SimulatedCamera::new("0", LensFacing::Back)
                    .focal_length(4.38)
                    .physical(&["2", "3"])
                    .zoom(0.6, 10.0),
            )
            .with_camera(SimulatedCamera::new("1", LensFacing::Front).focal_length(2.2))
            .with_camera(
                SimulatedCamera::new("2", LensFacing::Back)
                    .focal_length(2.2)
                    .zoom(1.0, 2.0)
                    .hidden(),
            )
            .with_camera(
                SimulatedCamera::new("3", LensFacing::Back)
                    .focal_length(6.0)
                    .hidden(),
            )
            .with_camera(
                SimulatedCamera::new("5", LensFacing::External)
                    .focal_length(3.0)
                    .hidden(),
            )
    }

    pub fn with_camera(mut self, camera: SimulatedCamera) -> Self {
        self.cameras.push(camera);
        self
    }

    pub fn with_api_level(mut self, api_level: u32) -> Self {
        self.api_level = api_level;
        self
    }

    pub fn with_permission(mut self, permission: PermissionStatus) -> Self {
        self.permission = permission;
        self
    }

    pub fn camera(&self, camera_id: &str) -> Option<&SimulatedCamera> {
        self.cameras.iter().find(|camera| camera.id == camera_id)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, CameraError> {
        toml::from_str(contents)
            .map_err(|e| CameraError::ConfigError(format!("Failed to parse rig: {}", e)))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            CameraError::ConfigError(format!("Failed to read rig {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Failure injection knobs, read at the moment each call happens
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatedFaults {
    pub id_list_error: Option<String>,
    /// `open_device` fails synchronously
    pub open_error: Option<String>,
    /// The device reports this error code instead of opening
    pub open_callback_error: Option<DeviceErrorCode>,
    /// `create_capture_session` fails synchronously
    pub create_session_error: Option<String>,
    /// Sessions report configure failure
    pub configure_fails: bool,
    /// Repeating requests are rejected
    pub repeating_request_error: Option<String>,
}

/// A repeating request as the simulated session received it
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedRequest {
    pub camera_id: String,
    pub physical_camera_id: Option<String>,
    pub zoom_ratio: Option<f32>,
    pub target_count: usize,
}

struct OpenDevice {
    camera_id: String,
    closed: Arc<AtomicBool>,
    listener: Arc<dyn DeviceStateListener>,
    executor: WorkerHandle,
}

#[derive(Default)]
struct Shared {
    faults: Mutex<SimulatedFaults>,
    open_devices: Mutex<Vec<OpenDevice>>,
    requests: Mutex<Vec<SubmittedRequest>>,
    devices_opened: AtomicUsize,
    devices_closed: AtomicUsize,
    sessions_configured: AtomicUsize,
    sessions_closed: AtomicUsize,
    characteristics_queries: AtomicUsize,
}

impl Shared {
    fn faults(&self) -> SimulatedFaults {
        lock(&self.faults).clone()
    }
}

/// In-process [`CameraService`] over a [`SimulatedRig`]
pub struct SimulatedCameraService {
    rig: SimulatedRig,
    capabilities: PlatformCapabilities,
    permission: Mutex<PermissionStatus>,
    shared: Arc<Shared>,
}

impl SimulatedCameraService {
    pub fn new(rig: SimulatedRig) -> Self {
        let capabilities = PlatformCapabilities::from_api_level(rig.api_level);
        let permission = rig.permission;
        Self {
            rig,
            capabilities,
            permission: Mutex::new(permission),
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn rig(&self) -> &SimulatedRig {
        &self.rig
    }

    pub fn set_permission(&self, status: PermissionStatus) {
        *lock(&self.permission) = status;
    }

    pub fn set_faults(&self, faults: SimulatedFaults) {
        *lock(&self.shared.faults) = faults;
    }

    pub fn update_faults(&self, update: impl FnOnce(&mut SimulatedFaults)) {
        update(&mut lock(&self.shared.faults));
    }

    /// Report a disconnect for every device still open
    pub fn disconnect_all(&self) -> usize {
        self.notify_open_devices(|listener, device| listener.on_disconnected(device))
    }

    /// Report a device error for every device still open
    pub fn fail_open_devices(&self, code: DeviceErrorCode) -> usize {
        self.notify_open_devices(move |listener, device| listener.on_error(device, code))
    }

    fn notify_open_devices<F>(&self, notify: F) -> usize
    where
        F: Fn(&dyn DeviceStateListener, Box<dyn CameraDevice>) + Send + Sync + Clone + 'static,
    {
        let devices = lock(&self.shared.open_devices);
        let mut notified = 0;
        for open in devices.iter().filter(|d| !d.closed.load(Ordering::Acquire)) {
            let device: Box<dyn CameraDevice> = Box::new(SimulatedDevice {
                camera_id: open.camera_id.clone(),
                closed: Arc::clone(&open.closed),
                shared: Arc::clone(&self.shared),
            });
            let listener = Arc::clone(&open.listener);
            let notify = notify.clone();
            match open
                .executor
                .post(move || notify(listener.as_ref(), device))
            {
                Ok(()) => notified += 1,
                Err(e) => log::debug!("Device {} not notified: {}", open.camera_id, e),
            }
        }
        notified
    }

    pub fn devices_opened(&self) -> usize {
        self.shared.devices_opened.load(Ordering::Acquire)
    }

    /// Devices opened and not yet closed
    pub fn live_devices(&self) -> usize {
        self.devices_opened()
            .saturating_sub(self.shared.devices_closed.load(Ordering::Acquire))
    }

    pub fn sessions_configured(&self) -> usize {
        self.shared.sessions_configured.load(Ordering::Acquire)
    }

    /// Sessions configured and not yet closed
    pub fn live_sessions(&self) -> usize {
        self.sessions_configured()
            .saturating_sub(self.shared.sessions_closed.load(Ordering::Acquire))
    }

    pub fn submitted_requests(&self) -> Vec<SubmittedRequest> {
        lock(&self.shared.requests).clone()
    }

    pub fn last_request(&self) -> Option<SubmittedRequest> {
        lock(&self.shared.requests).last().cloned()
    }

    pub fn characteristics_queries(&self) -> usize {
        self.shared.characteristics_queries.load(Ordering::Acquire)
    }
}

impl CameraService for SimulatedCameraService {
    fn capabilities(&self) -> PlatformCapabilities {
        self.capabilities
    }

    fn permission_status(&self) -> PermissionStatus {
        *lock(&self.permission)
    }

    fn camera_id_list(&self) -> Result<Vec<String>, CameraError> {
        if let Some(message) = self.shared.faults().id_list_error {
            return Err(CameraError::EnumerationError(message));
        }
        Ok(self
            .rig
            .cameras
            .iter()
            .filter(|camera| camera.listed)
            .map(|camera| camera.id.clone())
            .collect())
    }

    fn characteristics(&self, camera_id: &str) -> Result<CameraCharacteristics, CameraError> {
        self.shared
            .characteristics_queries
            .fetch_add(1, Ordering::AcqRel);
        match self.rig.camera(camera_id) {
            Some(camera) if camera.broken => Err(CameraError::EnumerationError(format!(
                "characteristics of camera {} unavailable",
                camera_id
            ))),
            Some(camera) => Ok(camera.characteristics(self.capabilities)),
            None => Err(CameraError::EnumerationError(format!(
                "no camera with id {}",
                camera_id
            ))),
        }
    }

    fn open_device(
        &self,
        camera_id: &str,
        listener: Arc<dyn DeviceStateListener>,
        executor: &WorkerHandle,
    ) -> Result<(), CameraError> {
        let faults = self.shared.faults();
        if let Some(message) = faults.open_error {
            return Err(CameraError::DeviceError(message));
        }
        if self.rig.camera(camera_id).is_none() {
            return Err(CameraError::DeviceError(format!(
                "no camera with id {}",
                camera_id
            )));
        }

        let closed = Arc::new(AtomicBool::new(false));
        let device = SimulatedDevice {
            camera_id: camera_id.to_string(),
            closed: Arc::clone(&closed),
            shared: Arc::clone(&self.shared),
        };
        self.shared.devices_opened.fetch_add(1, Ordering::AcqRel);
        let mut open_devices = lock(&self.shared.open_devices);
        open_devices.retain(|open| !open.closed.load(Ordering::Acquire));
        open_devices.push(OpenDevice {
            camera_id: camera_id.to_string(),
            closed: Arc::clone(&closed),
            listener: Arc::clone(&listener),
            executor: executor.clone(),
        });
        drop(open_devices);

        let posted = match faults.open_callback_error {
            Some(code) => executor.post(move || listener.on_error(Box::new(device), code)),
            None => executor.post(move || listener.on_opened(Box::new(device))),
        };
        if posted.is_err() {
            // The device was dropped with the job.
            closed.store(true, Ordering::Release);
            self.shared.devices_closed.fetch_add(1, Ordering::AcqRel);
        }
        posted
    }
}

struct SimulatedDevice {
    camera_id: String,
    closed: Arc<AtomicBool>,
    shared: Arc<Shared>,
}

impl CameraDevice for SimulatedDevice {
    fn id(&self) -> &str {
        &self.camera_id
    }

    fn create_capture_session(
        &mut self,
        configuration: SessionConfiguration,
        listener: Arc<dyn SessionStateListener>,
        executor: &WorkerHandle,
    ) -> Result<(), CameraError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CameraError::DeviceError(format!(
                "camera {} is closed",
                self.camera_id
            )));
        }
        let faults = self.shared.faults();
        if let Some(message) = faults.create_session_error {
            return Err(CameraError::SessionError(message));
        }

        let session = SimulatedSession {
            camera_id: self.camera_id.clone(),
            physical_camera_id: configuration.physical_camera_id().map(str::to_string),
            closed: Arc::new(AtomicBool::new(false)),
            shared: Arc::clone(&self.shared),
        };
        self.shared.sessions_configured.fetch_add(1, Ordering::AcqRel);

        let posted = if faults.configure_fails {
            executor.post(move || listener.on_configure_failed(Box::new(session)))
        } else {
            executor.post(move || listener.on_configured(Box::new(session)))
        };
        if posted.is_err() {
            self.shared.sessions_closed.fetch_add(1, Ordering::AcqRel);
        }
        posted
    }

    fn close(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.shared.devices_closed.fetch_add(1, Ordering::AcqRel);
        }
    }
}

struct SimulatedSession {
    camera_id: String,
    physical_camera_id: Option<String>,
    closed: Arc<AtomicBool>,
    shared: Arc<Shared>,
}

impl CaptureSession for SimulatedSession {
    fn set_repeating_request(
        &mut self,
        request: &PreviewRequest,
        _executor: &WorkerHandle,
    ) -> Result<(), CameraError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CameraError::CaptureError("session is closed".to_string()));
        }
        if let Some(message) = self.shared.faults().repeating_request_error {
            return Err(CameraError::CaptureError(message));
        }

        lock(&self.shared.requests).push(SubmittedRequest {
            camera_id: self.camera_id.clone(),
            physical_camera_id: self.physical_camera_id.clone(),
            zoom_ratio: request.zoom_ratio,
            target_count: request.targets.len(),
        });
        Ok(())
    }

    fn close(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.shared.sessions_closed.fetch_add(1, Ordering::AcqRel);
        }
    }
}

struct SimulatedSurface {
    id: u64,
    released: AtomicBool,
}

impl OutputSurface for SimulatedSurface {
    fn id(&self) -> u64 {
        self.id
    }

    fn release(&self) {
        self.released.store(true, Ordering::Release);
    }
}

struct SimulatedProducer {
    surface: Arc<SimulatedSurface>,
    size: (u32, u32),
    frames_latched: AtomicU64,
    released: AtomicBool,
}

impl FrameProducer for SimulatedProducer {
    fn output_surface(&self) -> Result<Arc<dyn OutputSurface>, CameraError> {
        if self.released.load(Ordering::Acquire) {
            return Err(CameraError::TextureError("producer released".to_string()));
        }
        let surface: Arc<dyn OutputSurface> = self.surface.clone();
        Ok(surface)
    }

    fn update_tex_image(&self) -> Result<(), CameraError> {
        if self.released.load(Ordering::Acquire) {
            return Err(CameraError::TextureError("producer released".to_string()));
        }
        self.frames_latched.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::Release);
    }
}

/// In-process [`GraphicsBackend`] tracking texture names and producers
#[derive(Default)]
pub struct SimulatedGraphics {
    next_texture: AtomicU32,
    live: Mutex<HashSet<u32>>,
    producers: Mutex<HashMap<u32, Arc<SimulatedProducer>>>,
    configured: Mutex<Vec<(TextureId, TextureParams)>>,
    flushes: AtomicUsize,
    fail_texture_creation: AtomicBool,
    fail_producer_creation: AtomicBool,
}

impl SimulatedGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_texture_creation(&self, fail: bool) {
        self.fail_texture_creation.store(fail, Ordering::Release);
    }

    pub fn set_fail_producer_creation(&self, fail: bool) {
        self.fail_producer_creation.store(fail, Ordering::Release);
    }

    /// Textures created and not yet deleted
    pub fn live_textures(&self) -> usize {
        lock(&self.live).len()
    }

    pub fn is_live(&self, texture: TextureId) -> bool {
        lock(&self.live).contains(&texture.0)
    }

    pub fn texture_params(&self, texture: TextureId) -> Option<TextureParams> {
        lock(&self.configured)
            .iter()
            .rev()
            .find(|(id, _)| *id == texture)
            .map(|(_, params)| *params)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::Acquire)
    }

    /// Frames latched into `texture` through its producer
    pub fn frames_latched(&self, texture: TextureId) -> u64 {
        lock(&self.producers)
            .get(&texture.0)
            .map(|producer| producer.frames_latched.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// `(width, height)` the producer for `texture` was created with
    pub fn producer_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        lock(&self.producers)
            .get(&texture.0)
            .map(|producer| producer.size)
    }

    /// Producers not yet released
    pub fn live_producers(&self) -> usize {
        lock(&self.producers)
            .values()
            .filter(|producer| !producer.released.load(Ordering::Acquire))
            .count()
    }

    /// Surfaces handed out and not yet released
    pub fn live_surfaces(&self) -> usize {
        lock(&self.producers)
            .values()
            .filter(|producer| !producer.surface.released.load(Ordering::Acquire))
            .count()
    }
}

impl GraphicsBackend for SimulatedGraphics {
    fn create_external_texture(&self) -> Result<TextureId, CameraError> {
        if self.fail_texture_creation.load(Ordering::Acquire) {
            return Err(CameraError::TextureError(
                "texture allocation failed".to_string(),
            ));
        }
        let id = self.next_texture.fetch_add(1, Ordering::AcqRel) + 1;
        lock(&self.live).insert(id);
        Ok(TextureId(id))
    }

    fn configure_texture(
        &self,
        texture: TextureId,
        params: &TextureParams,
    ) -> Result<(), CameraError> {
        if !self.is_live(texture) {
            return Err(CameraError::TextureError(format!(
                "texture {} does not exist",
                texture.0
            )));
        }
        lock(&self.configured).push((texture, *params));
        Ok(())
    }

    fn flush(&self) {
        self.flushes.fetch_add(1, Ordering::AcqRel);
    }

    fn create_frame_producer(
        &self,
        texture: TextureId,
        width: u32,
        height: u32,
    ) -> Result<Arc<dyn FrameProducer>, CameraError> {
        if self.fail_producer_creation.load(Ordering::Acquire) {
            return Err(CameraError::TextureError(format!(
                "no producer for texture {} at {}x{}",
                texture.0, width, height
            )));
        }
        let producer = Arc::new(SimulatedProducer {
            surface: Arc::new(SimulatedSurface {
                id: u64::from(texture.0),
                released: AtomicBool::new(false),
            }),
            size: (width, height),
            frames_latched: AtomicU64::new(0),
            released: AtomicBool::new(false),
        });
        lock(&self.producers).insert(texture.0, Arc::clone(&producer));
        Ok(producer)
    }

    fn delete_texture(&self, texture: TextureId) {
        if !lock(&self.live).remove(&texture.0) {
            log::warn!("Deleting unknown texture {}", texture.0);
        }
    }
}
