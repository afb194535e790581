//! Platform seams
//!
//! The OS camera service and the GPU texture API are external
//! collaborators. They are reached only through the traits in this module,
//! shaped after the Android camera2 object model: a service that lists and
//! opens devices, devices that build capture sessions, sessions that accept
//! a repeating request. Callbacks are delivered on the [`WorkerHandle`]
//! passed in, never on the caller's thread.

use crate::errors::CameraError;
use crate::permissions::PermissionStatus;
use crate::session::request::PreviewRequest;
use crate::types::{CameraCharacteristics, PlatformCapabilities, TextureId};
use crate::worker::WorkerHandle;
use std::fmt;
use std::sync::Arc;

/// Error code reported with a device error callback
pub type DeviceErrorCode = i32;

/// The OS camera service
pub trait CameraService: Send + Sync {
    fn capabilities(&self) -> PlatformCapabilities;

    fn permission_status(&self) -> PermissionStatus;

    /// Ids the platform lists, in its own order
    fn camera_id_list(&self) -> Result<Vec<String>, CameraError>;

    /// Fails for ids that do not exist or cannot be queried
    fn characteristics(&self, camera_id: &str) -> Result<CameraCharacteristics, CameraError>;

    /// Start opening a device. The outcome arrives later through `listener`,
    /// posted on `executor`.
    fn open_device(
        &self,
        camera_id: &str,
        listener: Arc<dyn DeviceStateListener>,
        executor: &WorkerHandle,
    ) -> Result<(), CameraError>;
}

/// Device open / disconnect / error callbacks
pub trait DeviceStateListener: Send + Sync {
    fn on_opened(&self, device: Box<dyn CameraDevice>);
    fn on_disconnected(&self, device: Box<dyn CameraDevice>);
    fn on_error(&self, device: Box<dyn CameraDevice>, code: DeviceErrorCode);
}

/// An open camera device
pub trait CameraDevice: Send {
    fn id(&self) -> &str;

    /// Start building a capture session; the result arrives through `listener`.
    fn create_capture_session(
        &mut self,
        configuration: SessionConfiguration,
        listener: Arc<dyn SessionStateListener>,
        executor: &WorkerHandle,
    ) -> Result<(), CameraError>;

    fn close(&mut self);
}

/// Session configured / configure-failed callbacks
pub trait SessionStateListener: Send + Sync {
    fn on_configured(&self, session: Box<dyn CaptureSession>);
    fn on_configure_failed(&self, session: Box<dyn CaptureSession>);
}

/// A configured capture session
pub trait CaptureSession: Send {
    fn set_repeating_request(
        &mut self,
        request: &PreviewRequest,
        executor: &WorkerHandle,
    ) -> Result<(), CameraError>;

    fn close(&mut self);
}

/// Consumer-side surface a camera writes frames into
pub trait OutputSurface: Send + Sync {
    fn id(&self) -> u64;
    fn release(&self);
}

impl fmt::Debug for dyn OutputSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputSurface({})", self.id())
    }
}

/// One stream of a capture session, optionally pinned to a physical sensor
#[derive(Clone, Debug)]
pub struct OutputConfiguration {
    pub surface: Arc<dyn OutputSurface>,
    pub physical_camera_id: Option<String>,
}

/// Outputs a capture session is built from
#[derive(Clone, Debug)]
pub struct SessionConfiguration {
    pub outputs: Vec<OutputConfiguration>,
}

impl SessionConfiguration {
    /// Plain session writing straight into `surface`
    pub fn standard(surface: Arc<dyn OutputSurface>) -> Self {
        Self {
            outputs: vec![OutputConfiguration {
                surface,
                physical_camera_id: None,
            }],
        }
    }

    /// Session whose single output is fed by one physical sensor
    pub fn physical(
        surface: Arc<dyn OutputSurface>,
        physical_camera_id: impl Into<String>,
    ) -> Self {
        Self {
            outputs: vec![OutputConfiguration {
                surface,
                physical_camera_id: Some(physical_camera_id.into()),
            }],
        }
    }

    pub fn physical_camera_id(&self) -> Option<&str> {
        self.outputs
            .iter()
            .find_map(|output| output.physical_camera_id.as_deref())
    }

    pub fn is_physical(&self) -> bool {
        self.physical_camera_id().is_some()
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    Linear,
}

/// Texture coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    ClampToEdge,
}

/// Sampler state applied to the external video texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
}

impl TextureParams {
    /// Linear filtering with edge clamping; mobile GPUs sample external
    /// images incorrectly without it.
    pub fn video() -> Self {
        Self {
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
        }
    }
}

/// GPU texture API, called on the caller's (render) thread only
pub trait GraphicsBackend: Send + Sync {
    /// Allocate an external-image texture name
    fn create_external_texture(&self) -> Result<TextureId, CameraError>;

    fn configure_texture(
        &self,
        texture: TextureId,
        params: &TextureParams,
    ) -> Result<(), CameraError>;

    /// Push pending commands so the texture exists before it is bound elsewhere
    fn flush(&self);

    /// Bind a video frame producer of `width` x `height` buffers to `texture`
    fn create_frame_producer(
        &self,
        texture: TextureId,
        width: u32,
        height: u32,
    ) -> Result<Arc<dyn FrameProducer>, CameraError>;

    fn delete_texture(&self, texture: TextureId);
}

/// Video frame queue bound to a texture
pub trait FrameProducer: Send + Sync {
    /// Surface the camera writes into
    fn output_surface(&self) -> Result<Arc<dyn OutputSurface>, CameraError>;

    /// Latch the newest queued frame into the bound texture
    fn update_tex_image(&self) -> Result<(), CameraError>;

    fn release(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummySurface;

    impl OutputSurface for DummySurface {
        fn id(&self) -> u64 {
            7
        }
        fn release(&self) {}
    }

    #[test]
    fn test_session_configuration_forms() {
        let surface: Arc<dyn OutputSurface> = Arc::new(DummySurface);

        let standard = SessionConfiguration::standard(surface.clone());
        assert!(!standard.is_physical());
        assert_eq!(standard.outputs.len(), 1);

        let physical = SessionConfiguration::physical(surface, "2");
        assert_eq!(physical.physical_camera_id(), Some("2"));
        assert_eq!(physical.outputs[0].surface.id(), 7);
    }

    #[test]
    fn test_video_texture_params() {
        let params = TextureParams::video();
        assert_eq!(params.min_filter, TextureFilter::Linear);
        assert_eq!(params.mag_filter, TextureFilter::Linear);
        assert_eq!(params.wrap_s, TextureWrap::ClampToEdge);
        assert_eq!(params.wrap_t, TextureWrap::ClampToEdge);
    }
}
