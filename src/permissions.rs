//! Runtime camera permission gate
//!
//! Requesting the permission is the host application's job; this crate
//! only refuses to start a session while it is missing.

use crate::errors::CameraError;
use crate::platform::CameraService;

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted (device policy, parental controls)
    Restricted,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Check camera permission status through the platform service
pub fn check_permission(service: &dyn CameraService) -> PermissionStatus {
    service.permission_status()
}

/// Fail with `PermissionDenied` unless the camera permission is granted
pub fn require_camera_permission(service: &dyn CameraService) -> Result<(), CameraError> {
    let status = check_permission(service);
    if status.is_granted() {
        Ok(())
    } else {
        log::warn!("Camera permission not granted ({})", status);
        Err(CameraError::PermissionDenied(format!(
            "camera permission is {}",
            status
        )))
    }
}
