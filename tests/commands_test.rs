//! Process-global command surface and its C ABI
//!
//! The registry is global, so every test takes `SERIAL` first.

use camtex::commands;
use camtex::config::CamTexConfig;
use camtex::ffi;
use camtex::permissions::PermissionStatus;
use camtex::session::notice::NoticeKind;
use camtex::session::{SessionNotice, SessionPhase};
use camtex::testing::{SimulatedCameraService, SimulatedGraphics, SimulatedRig};
use crossbeam_channel::Receiver;
use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

fn install_phone() -> (Arc<SimulatedCameraService>, Arc<SimulatedGraphics>) {
    let service = Arc::new(SimulatedCameraService::new(SimulatedRig::multi_camera_phone()));
    let graphics = Arc::new(SimulatedGraphics::new());
    commands::install(service.clone(), graphics.clone(), CamTexConfig::default()).unwrap();
    (service, graphics)
}

fn wait_for_preview(notices: &Receiver<SessionNotice>) {
    loop {
        let notice = notices
            .recv_timeout(Duration::from_secs(5))
            .expect("timed out waiting for preview");
        match notice.kind {
            NoticeKind::PreviewStarted { .. } => return,
            NoticeKind::Failed { message, .. } => panic!("preview failed: {}", message),
            _ => {}
        }
    }
}

#[test]
fn test_commands_without_backend() {
    let _guard = serial();
    commands::uninstall();

    assert!(!commands::is_installed());
    assert_eq!(commands::list_cameras(), "");
    assert_eq!(commands::start_camera(Some("0"), 1280, 720), -1);
    commands::update_texture();
    commands::stop_camera();
    assert!(commands::session_snapshot().is_none());
}

#[test]
fn test_list_cameras_wire_format() {
    let _guard = serial();
    install_phone();

    assert_eq!(
        commands::list_cameras(),
        "0:Logic-Back:4.38|2[0]:Phys-Back:2.2|3[0]:Phys-Back:6.0|1:Logic-Front:2.2|5:Hidden-Back:3.0"
    );
    let report = commands::camera_report().unwrap();
    assert!(report.diagnostics.is_empty());
    commands::uninstall();
}

#[test]
fn test_start_update_stop() {
    let _guard = serial();
    let (service, graphics) = install_phone();
    let notices = commands::subscribe_notices().unwrap();

    let texture = commands::start_camera(Some("2[0]"), 1280, 720);
    assert!(texture > 0);
    wait_for_preview(&notices);

    commands::update_texture();
    commands::update_texture();
    assert_eq!(graphics.frames_latched(camtex::TextureId(texture as u32)), 2);
    assert_eq!(
        service.last_request().unwrap().physical_camera_id.as_deref(),
        Some("2")
    );

    commands::stop_camera();
    commands::stop_camera();
    assert_eq!(graphics.live_textures(), 0);
    assert_eq!(service.live_devices(), 0);
    assert_eq!(
        commands::session_snapshot().map(|s| s.phase),
        Some(SessionPhase::Idle)
    );
    commands::uninstall();
}

#[test]
fn test_empty_id_opens_configured_default() {
    let _guard = serial();
    let service = Arc::new(SimulatedCameraService::new(SimulatedRig::multi_camera_phone()));
    let graphics = Arc::new(SimulatedGraphics::new());
    let mut config = CamTexConfig::default();
    config.session.default_camera_id = "1".to_string();
    commands::install(service.clone(), graphics, config).unwrap();
    let notices = commands::subscribe_notices().unwrap();

    assert!(commands::start_camera(Some(""), 640, 480) > 0);
    wait_for_preview(&notices);
    assert_eq!(service.last_request().unwrap().camera_id, "1");
    commands::uninstall();
}

#[test]
fn test_start_failures_return_minus_one() {
    let _guard = serial();
    let (service, graphics) = install_phone();

    assert_eq!(commands::start_camera(Some("0"), -1, 720), -1);
    assert_eq!(commands::start_camera(Some("0"), 1280, 0), -1);
    assert_eq!(commands::start_camera(Some("[0]"), 1280, 720), -1);

    service.set_permission(PermissionStatus::Denied);
    assert_eq!(commands::start_camera(Some("0"), 1280, 720), -1);
    assert_eq!(graphics.live_textures(), 0);
    assert_eq!(service.devices_opened(), 0);
    commands::uninstall();
}

#[test]
fn test_restart_through_commands_keeps_one_texture() {
    let _guard = serial();
    let (service, graphics) = install_phone();
    let notices = commands::subscribe_notices().unwrap();

    let first = commands::start_camera(Some("0"), 1280, 720);
    wait_for_preview(&notices);
    let second = commands::start_camera(Some("1"), 1280, 720);
    wait_for_preview(&notices);

    assert_ne!(first, second);
    assert_eq!(graphics.live_textures(), 1);
    assert_eq!(service.live_devices(), 1);
    commands::uninstall();
    assert_eq!(graphics.live_textures(), 0);
}

#[test]
fn test_install_rejects_invalid_config() {
    let _guard = serial();
    let service = Arc::new(SimulatedCameraService::new(SimulatedRig::default()));
    let graphics = Arc::new(SimulatedGraphics::new());
    let mut config = CamTexConfig::default();
    config.worker.thread_name.clear();

    assert!(commands::install(service, graphics, config).is_err());
}

#[test]
fn test_reinstall_stops_previous_session() {
    let _guard = serial();
    let (service, graphics) = install_phone();
    let notices = commands::subscribe_notices().unwrap();
    commands::start_camera(Some("0"), 1280, 720);
    wait_for_preview(&notices);

    install_phone();
    assert_eq!(service.live_devices(), 0);
    assert_eq!(graphics.live_textures(), 0);
    commands::uninstall();
}

#[test]
fn test_ffi_round_trip() {
    let _guard = serial();
    let (service, graphics) = install_phone();

    let catalog = ffi::camtex_list_cameras();
    assert!(!catalog.is_null());
    let text = unsafe { CStr::from_ptr(catalog) }.to_str().unwrap().to_string();
    unsafe { ffi::camtex_free_string(catalog) };
    assert!(text.starts_with("0:Logic-Back:4.38|"));
    unsafe { ffi::camtex_free_string(ptr::null_mut()) };

    let id = CString::new("1").unwrap();
    let texture = unsafe { ffi::camtex_start_camera(id.as_ptr(), 640, 480) };
    assert!(texture > 0);
    ffi::camtex_update_texture();
    ffi::camtex_stop_camera();
    assert_eq!(graphics.live_textures(), 0);

    // Null means the default camera.
    let texture = unsafe { ffi::camtex_start_camera(ptr::null(), 640, 480) };
    assert!(texture > 0);
    ffi::camtex_stop_camera();
    assert_eq!(service.live_devices(), 0);

    commands::uninstall();
}

#[test]
fn test_rejected_size_still_stops_running_session() {
    let _guard = serial();
    let (service, graphics) = install_phone();
    let notices = commands::subscribe_notices().unwrap();
    assert!(commands::start_camera(Some("0"), 1280, 720) > 0);
    wait_for_preview(&notices);

    assert_eq!(commands::start_camera(Some("1"), -1, 720), -1);
    assert_eq!(graphics.live_textures(), 0);
    assert_eq!(service.live_devices(), 0);
    assert_eq!(
        commands::session_snapshot().map(|s| s.phase),
        Some(SessionPhase::Idle)
    );

    assert!(commands::start_camera(Some("0"), 1280, 720) > 0);
    wait_for_preview(&notices);
    assert_eq!(commands::start_camera(Some("1"), 1280, -720), -1);
    assert_eq!(graphics.live_textures(), 0);
    commands::uninstall();
}

#[test]
fn test_ffi_non_utf8_id_stops_running_session() {
    let _guard = serial();
    let (service, graphics) = install_phone();
    let notices = commands::subscribe_notices().unwrap();
    assert!(commands::start_camera(Some("0"), 1280, 720) > 0);
    wait_for_preview(&notices);

    let invalid = CString::new(vec![0xff, 0xfe]).unwrap();
    let texture = unsafe { ffi::camtex_start_camera(invalid.as_ptr(), 1280, 720) };
    assert_eq!(texture, -1);
    assert_eq!(graphics.live_textures(), 0);
    assert_eq!(service.live_devices(), 0);
    commands::uninstall();
}
