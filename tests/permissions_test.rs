#[cfg(test)]
mod permissions_tests {
    use camtex::errors::ErrorKind;
    use camtex::permissions::{check_permission, require_camera_permission, PermissionStatus};
    use camtex::testing::{SimulatedCameraService, SimulatedRig};
    use std::sync::Arc;

    #[test]
    fn test_check_permission_reflects_service() {
        let service = SimulatedCameraService::new(SimulatedRig::default());
        assert_eq!(check_permission(&service), PermissionStatus::Granted);

        service.set_permission(PermissionStatus::Restricted);
        assert_eq!(check_permission(&service), PermissionStatus::Restricted);
    }

    #[test]
    fn test_only_granted_passes_the_gate() {
        let service = SimulatedCameraService::new(SimulatedRig::default());
        assert!(require_camera_permission(&service).is_ok());

        for status in [
            PermissionStatus::Denied,
            PermissionStatus::NotDetermined,
            PermissionStatus::Restricted,
        ] {
            service.set_permission(status);
            let err = require_camera_permission(&service).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PermissionDenied);
            assert!(err.message().contains(&status.to_string()));
        }
    }

    #[test]
    fn test_check_permission_concurrent() {
        let service = Arc::new(SimulatedCameraService::new(SimulatedRig::default()));
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || check_permission(service.as_ref()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), PermissionStatus::Granted);
        }
    }

    #[test]
    fn test_permission_status_serialization() {
        let json = serde_json::to_string(&PermissionStatus::NotDetermined).unwrap();
        let back: PermissionStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PermissionStatus::NotDetermined);
    }
}
