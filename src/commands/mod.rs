//! Process-global command surface
//!
//! Engine plugins call into one installed camera backend through plain
//! strings and integers. `install` puts a service, a graphics backend and
//! a configuration behind a global registry; every command is a no-op (or
//! returns its failure value) until then.

pub mod camera;
pub mod catalog;

pub use camera::*;
pub use catalog::*;

use crate::config::CamTexConfig;
use crate::errors::CameraError;
use crate::platform::{CameraService, GraphicsBackend};
use crate::session::{SessionController, SessionSettings};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub(crate) struct Installed {
    pub(crate) service: Arc<dyn CameraService>,
    pub(crate) controller: SessionController,
    pub(crate) config: CamTexConfig,
}

lazy_static::lazy_static! {
    static ref REGISTRY: Mutex<Option<Installed>> = Mutex::new(None);
}

pub(crate) fn registry() -> MutexGuard<'static, Option<Installed>> {
    REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install the backend every command runs against, replacing (and stopping)
/// any previous one.
pub fn install(
    service: Arc<dyn CameraService>,
    graphics: Arc<dyn GraphicsBackend>,
    config: CamTexConfig,
) -> Result<(), CameraError> {
    config.validate()?;

    let controller = SessionController::with_settings(
        Arc::clone(&service),
        graphics,
        SessionSettings::from(&config),
    );
    let previous = registry().replace(Installed {
        service,
        controller,
        config,
    });

    if let Some(mut previous) = previous {
        log::info!("Replacing installed camera backend");
        previous.controller.stop();
    } else {
        log::info!("Camera backend installed");
    }
    Ok(())
}

/// Stop any session and remove the installed backend
pub fn uninstall() {
    let previous = registry().take();
    if let Some(mut previous) = previous {
        previous.controller.stop();
        log::info!("Camera backend uninstalled");
    }
}

pub fn is_installed() -> bool {
    registry().is_some()
}
