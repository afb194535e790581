use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("Camera initialization error: {0}")]
    InitializationError(String),
    #[error("Permission denied error: {0}")]
    PermissionDenied(String),
    #[error("Camera enumeration error: {0}")]
    EnumerationError(String),
    #[error("Camera device error: {0}")]
    DeviceError(String),
    #[error("Capture session error: {0}")]
    SessionError(String),
    #[error("Capture request error: {0}")]
    CaptureError(String),
    #[error("Camera control error: {0}")]
    ControlError(String),
    #[error("Texture error: {0}")]
    TextureError(String),
    #[error("Worker error: {0}")]
    WorkerError(String),
    #[error("Invalid camera id: {0}")]
    InvalidCameraId(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Payload-free discriminant of [`CameraError`], used by session notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Initialization,
    PermissionDenied,
    Enumeration,
    Device,
    Session,
    Capture,
    Control,
    Texture,
    Worker,
    InvalidCameraId,
    Config,
}

impl CameraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CameraError::InitializationError(_) => ErrorKind::Initialization,
            CameraError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CameraError::EnumerationError(_) => ErrorKind::Enumeration,
            CameraError::DeviceError(_) => ErrorKind::Device,
            CameraError::SessionError(_) => ErrorKind::Session,
            CameraError::CaptureError(_) => ErrorKind::Capture,
            CameraError::ControlError(_) => ErrorKind::Control,
            CameraError::TextureError(_) => ErrorKind::Texture,
            CameraError::WorkerError(_) => ErrorKind::Worker,
            CameraError::InvalidCameraId(_) => ErrorKind::InvalidCameraId,
            CameraError::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// The message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            CameraError::InitializationError(msg)
            | CameraError::PermissionDenied(msg)
            | CameraError::EnumerationError(msg)
            | CameraError::DeviceError(msg)
            | CameraError::SessionError(msg)
            | CameraError::CaptureError(msg)
            | CameraError::ControlError(msg)
            | CameraError::TextureError(msg)
            | CameraError::WorkerError(msg)
            | CameraError::InvalidCameraId(msg)
            | CameraError::ConfigError(msg) => msg,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Initialization => "initialization",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::Enumeration => "enumeration",
            ErrorKind::Device => "device",
            ErrorKind::Session => "session",
            ErrorKind::Capture => "capture",
            ErrorKind::Control => "control",
            ErrorKind::Texture => "texture",
            ErrorKind::Worker => "worker",
            ErrorKind::InvalidCameraId => "invalid_camera_id",
            ErrorKind::Config => "config",
        };
        write!(f, "{}", name)
    }
}
