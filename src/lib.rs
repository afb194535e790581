//! camtex: camera discovery and capture-session control feeding a GPU texture
//!
//! This crate enumerates the cameras a platform camera service exposes,
//! including physical sensors behind logical multi-cameras and vendor
//! cameras missing from the id list, opens one of them and streams its
//! preview into an external GPU texture owned by the host renderer.
//!
//! # Features
//! - Catalog of logical, physical and hidden cameras in a compact wire format
//! - `physical[logical]` addressing of individual sensors
//! - Capture-session state machine with ordered, idempotent teardown
//! - Zoom fallback to the widest available field of view
//! - Dedicated worker thread for every camera callback
//! - Process-global boundary and C ABI for engine plugins
//!
//! # Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use camtex::testing::{SimulatedCameraService, SimulatedGraphics, SimulatedRig};
//!
//! let service = Arc::new(SimulatedCameraService::new(SimulatedRig::multi_camera_phone()));
//! let graphics = Arc::new(SimulatedGraphics::new());
//! camtex::commands::install(service, graphics, camtex::CamTexConfig::default())?;
//!
//! println!("{}", camtex::commands::list_cameras());
//! let texture = camtex::commands::start_camera(Some("2[0]"), 1280, 720);
//! camtex::commands::update_texture();
//! camtex::commands::stop_camera();
//! ```
pub mod catalog;
pub mod commands;
pub mod config;
pub mod errors;
pub mod ffi;
pub mod identifier;
pub mod permissions;
pub mod platform;
pub mod session;
pub mod types;
pub mod worker;

// Testing utilities - simulated camera service and GPU backend
pub mod testing;

// Re-exports for convenience
pub use catalog::{CatalogReport, DeviceCatalog};
pub use config::CamTexConfig;
pub use errors::{CameraError, ErrorKind};
pub use identifier::CompositeAddress;
pub use platform::{CameraService, GraphicsBackend};
pub use session::{SessionController, SessionNotice, SessionPhase};
pub use types::{CameraIdentity, CameraKind, Facing, PlatformCapabilities, TextureId};

/// Initialize logging for the camera system
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "camtex=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
