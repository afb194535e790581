use camtex::config::{CamTexConfig, MAX_PROBE_ID};
use camtex::session::SessionSettings;
use tempfile::tempdir;

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("camtex.toml");

    let mut config = CamTexConfig::default();
    config.catalog.probe_max_id = 20;
    config.session.default_camera_id = "1".to_string();
    config.session.apply_zoom_fallback = false;
    config.worker.thread_name = "CamWorker".to_string();

    config.save_to_file(&path).unwrap();
    assert!(path.exists());

    let loaded = CamTexConfig::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let loaded = CamTexConfig::load_from_file(dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded, CamTexConfig::default());
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("camtex.toml");
    std::fs::write(&path, "[catalog\nprobe_max_id = ").unwrap();

    let err = CamTexConfig::load_from_file(&path).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
fn test_wrong_type_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("camtex.toml");
    std::fs::write(&path, "[catalog]\nprobe_max_id = \"sixty\"\n").unwrap();

    assert!(CamTexConfig::load_from_file(&path).is_err());
}

#[test]
fn test_validate_limits() {
    let mut config = CamTexConfig::default();
    config.catalog.probe_max_id = MAX_PROBE_ID;
    assert!(config.validate().is_ok());

    config.session.default_camera_id.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_session_settings_follow_config() {
    let mut config = CamTexConfig::default();
    config.session.apply_zoom_fallback = false;
    config.worker.thread_name = "Preview".to_string();

    let settings = SessionSettings::from(&config);
    assert!(!settings.apply_zoom_fallback);
    assert_eq!(settings.worker_thread_name, "Preview");
}
