//! Device catalog
//!
//! Three discovery passes, in this order:
//!
//! 1. ids the platform lists (logical cameras),
//! 2. physical sensors each logical camera exposes, when the platform
//!    reports them,
//! 3. a brute-force characteristics probe over numeric ids, which finds
//!    cameras some vendors leave out of the list.
//!
//! An id that has already been recorded is never recorded or probed again.
//! A failure on one id never aborts the walk; listed ids that fail end up in
//! the diagnostics, probe misses are expected and only traced.

use crate::config::CatalogConfig;
use crate::errors::CameraError;
use crate::platform::CameraService;
use crate::types::{CameraIdentity, CameraKind, Facing};
use serde::Serialize;
use std::collections::HashSet;

/// Separator between catalog entries on the wire
pub const ENTRY_SEPARATOR: &str = "|";

/// Why a listed camera was left out of the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeDiagnostic {
    /// Id as the caller would see it (`2[0]` for physical sensors)
    pub camera_id: String,
    pub error: String,
}

/// Result of one enumeration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogReport {
    pub cameras: Vec<CameraIdentity>,
    pub diagnostics: Vec<ProbeDiagnostic>,
}

impl CatalogReport {
    /// `|`-joined `<id>:<kind>-<facing>:<focal>` entries
    pub fn to_wire(&self) -> String {
        self.cameras
            .iter()
            .map(CameraIdentity::wire_entry)
            .collect::<Vec<_>>()
            .join(ENTRY_SEPARATOR)
    }

    pub fn find(&self, display_id: &str) -> Option<&CameraIdentity> {
        self.cameras.iter().find(|c| c.display_id() == display_id)
    }
}

/// Enumerates every camera reachable through a [`CameraService`]
pub struct DeviceCatalog<'a> {
    service: &'a dyn CameraService,
    config: CatalogConfig,
}

impl<'a> DeviceCatalog<'a> {
    pub fn new(service: &'a dyn CameraService) -> Self {
        Self::with_config(service, CatalogConfig::default())
    }

    pub fn with_config(service: &'a dyn CameraService, config: CatalogConfig) -> Self {
        Self { service, config }
    }

    pub fn enumerate(&self) -> CatalogReport {
        let mut walk = Walk::default();

        let listed = match self.service.camera_id_list() {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("Camera id list unavailable: {}", e);
                walk.diagnose("*", &e);
                Vec::new()
            }
        };

        let include_physical =
            self.config.include_physical && self.service.capabilities().multi_camera;

        for logical_id in &listed {
            self.record(&mut walk, logical_id, CameraKind::Logical);

            if include_physical {
                self.record_physical(&mut walk, logical_id);
            }
        }

        if self.config.probe_hidden {
            self.probe_hidden(&mut walk);
        }

        log::debug!(
            "Catalog: {} cameras, {} diagnostics",
            walk.report.cameras.len(),
            walk.report.diagnostics.len()
        );
        walk.report
    }

    fn record(&self, walk: &mut Walk, real_id: &str, kind: CameraKind) {
        if walk.seen.contains(real_id) {
            log::trace!("Camera {} already recorded", real_id);
            return;
        }

        let identity = CameraIdentity::new(real_id, kind);
        match self.service.characteristics(real_id) {
            Ok(chars) => {
                let identity = identity
                    .with_facing(Facing::from_lens(chars.lens_facing))
                    .with_focal_length(chars.primary_focal_length());
                walk.push(identity);
            }
            Err(e) => {
                log::warn!("Skipping camera {}: {}", identity.display_id(), e);
                walk.diagnose(&identity.display_id(), &e);
            }
        }
    }

    fn record_physical(&self, walk: &mut Walk, logical_id: &str) {
        let physical_ids = match self.service.characteristics(logical_id) {
            Ok(chars) => chars.physical_camera_ids.unwrap_or_default(),
            // Already reported by the logical pass.
            Err(_) => return,
        };

        for physical_id in physical_ids {
            self.record(
                walk,
                &physical_id,
                CameraKind::PhysicalOf(logical_id.to_string()),
            );
        }
    }

    fn probe_hidden(&self, walk: &mut Walk) {
        for numeric_id in 0..=self.config.probe_max_id {
            let id = numeric_id.to_string();
            if walk.seen.contains(&id) {
                continue;
            }

            match self.service.characteristics(&id) {
                Ok(chars) => {
                    log::info!("Found hidden camera {}", id);
                    let identity = CameraIdentity::new(id, CameraKind::Hidden)
                        .with_facing(Facing::from_lens(chars.lens_facing))
                        .with_focal_length(chars.primary_focal_length());
                    walk.push(identity);
                }
                Err(e) => log::trace!("Probe of camera {} missed: {}", id, e),
            }
        }
    }
}

#[derive(Default)]
struct Walk {
    report: CatalogReport,
    seen: HashSet<String>,
}

impl Walk {
    fn push(&mut self, identity: CameraIdentity) {
        self.seen.insert(identity.real_id.clone());
        self.report.cameras.push(identity);
    }

    fn diagnose(&mut self, camera_id: &str, error: &CameraError) {
        self.report.diagnostics.push(ProbeDiagnostic {
            camera_id: camera_id.to_string(),
            error: error.to_string(),
        });
    }
}

/// Enumerate with default settings and render the wire string
pub fn list_cameras(service: &dyn CameraService) -> String {
    DeviceCatalog::new(service).enumerate().to_wire()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_empty_string() {
        assert_eq!(CatalogReport::default().to_wire(), "");
    }

    #[test]
    fn test_wire_join() {
        let report = CatalogReport {
            cameras: vec![
                CameraIdentity::new("0", CameraKind::Logical)
                    .with_facing(Facing::Back)
                    .with_focal_length(4.38),
                CameraIdentity::new("1", CameraKind::Logical).with_facing(Facing::Front),
            ],
            diagnostics: Vec::new(),
        };
        assert_eq!(report.to_wire(), "0:Logic-Back:4.38|1:Logic-Front:0.0");
        assert!(report.find("1").is_some());
        assert!(report.find("2[0]").is_none());
    }
}
