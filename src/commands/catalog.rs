use super::registry;
use crate::catalog::{CatalogReport, DeviceCatalog};

/// Wire-format catalog of every reachable camera; `""` when nothing is
/// installed or nothing was found.
pub fn list_cameras() -> String {
    camera_report()
        .map(|report| report.to_wire())
        .unwrap_or_default()
}

/// Full catalog, diagnostics included
pub fn camera_report() -> Option<CatalogReport> {
    let registry = registry();
    let Some(installed) = registry.as_ref() else {
        log::warn!("list_cameras called before a camera backend was installed");
        return None;
    };

    let catalog = DeviceCatalog::with_config(
        installed.service.as_ref(),
        installed.config.catalog.clone(),
    );
    let report = catalog.enumerate();
    log::info!("Found {} cameras", report.cameras.len());
    Some(report)
}
