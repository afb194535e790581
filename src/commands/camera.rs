use super::registry;
use crate::session::{SessionNotice, SessionSnapshot};
use crossbeam_channel::Receiver;

/// Start streaming `camera_id` into a fresh texture.
///
/// Any running session is stopped first, even when the request is rejected.
/// Returns the texture name, or -1 when nothing is installed, the size is
/// not positive or the start failed. `None` and `""` open the configured
/// default camera.
pub fn start_camera(camera_id: Option<&str>, width: i32, height: i32) -> i32 {
    let mut registry = registry();
    let Some(installed) = registry.as_mut() else {
        log::warn!("start_camera called before a camera backend was installed");
        return -1;
    };

    let (Ok(width), Ok(height)) = (u32::try_from(width), u32::try_from(height)) else {
        log::error!("Invalid preview size {}x{}", width, height);
        installed.controller.stop();
        return -1;
    };

    let request = match camera_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => installed.config.session.default_camera_id.clone(),
    };

    match installed
        .controller
        .start_camera(Some(&request), width, height)
    {
        Ok(texture) => texture.as_raw(),
        Err(e) => {
            log::error!("Failed to start camera {}: {}", request, e);
            -1
        }
    }
}

/// Latch the newest frame; call once per rendered frame
pub fn update_texture() {
    if let Some(installed) = registry().as_ref() {
        installed.controller.update_texture();
    }
}

/// Tear down the running session; blocks until the worker has exited
pub fn stop_camera() {
    if let Some(installed) = registry().as_mut() {
        installed.controller.stop();
    }
}

pub fn session_snapshot() -> Option<SessionSnapshot> {
    registry()
        .as_ref()
        .map(|installed| installed.controller.snapshot())
}

pub fn subscribe_notices() -> Option<Receiver<SessionNotice>> {
    registry()
        .as_ref()
        .map(|installed| installed.controller.subscribe())
}
