#[cfg(test)]
mod error_tests {
    use camtex::errors::{CameraError, ErrorKind};
    use std::error::Error;

    #[test]
    fn test_camera_error_initialization() {
        let error = CameraError::InitializationError("Test init error".to_string());
        assert!(error.to_string().contains("Camera initialization error"));
        assert!(error.to_string().contains("Test init error"));
    }

    #[test]
    fn test_camera_error_permission_denied() {
        let error = CameraError::PermissionDenied("Access denied".to_string());
        assert!(error.to_string().contains("Permission denied"));
        assert_eq!(error.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_camera_error_display_trait() {
        let error = CameraError::SessionError("configure failed".to_string());
        assert_eq!(format!("{}", error), "Capture session error: configure failed");
        assert_eq!(error.message(), "configure failed");
    }

    #[test]
    fn test_camera_error_debug_format() {
        let error = CameraError::InvalidCameraId("2[".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("InvalidCameraId"));
        assert!(debug_str.contains("2["));
    }

    #[test]
    fn test_camera_error_is_std_error() {
        let error = CameraError::DeviceError("camera 0 disconnected".to_string());
        let boxed: Box<dyn Error> = Box::new(error);
        assert!(boxed.source().is_none());
        assert_eq!(boxed.to_string(), "Camera device error: camera 0 disconnected");
    }

    #[test]
    fn test_error_kind_serializes_as_variant_name() {
        let json = serde_json::to_string(&ErrorKind::Session).unwrap();
        assert_eq!(json, "\"Session\"");
        assert_eq!(ErrorKind::InvalidCameraId.to_string(), "invalid_camera_id");
    }

    #[test]
    fn test_camera_error_clone_and_eq() {
        let error = CameraError::TextureError("gone".to_string());
        assert_eq!(error.clone(), error);
        assert_ne!(error, CameraError::TextureError("other".to_string()));
    }
}
