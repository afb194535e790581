//! Shared data types for camera discovery and session control

use serde::{Deserialize, Serialize};

/// Lens direction as reported by the platform camera service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LensFacing {
    Front,
    Back,
    External,
}

/// Lens direction as carried in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Front,
    Back,
    Unknown,
}

impl Facing {
    /// External lenses map to `Back`, an unreadable value to `Unknown`
    pub fn from_lens(lens: Option<LensFacing>) -> Self {
        match lens {
            Some(LensFacing::Front) => Facing::Front,
            Some(LensFacing::Back) | Some(LensFacing::External) => Facing::Back,
            None => Facing::Unknown,
        }
    }

    /// Wire name; `Unknown` is reported as `Back`
    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::Front => "Front",
            Facing::Back | Facing::Unknown => "Back",
        }
    }
}

/// How a camera was discovered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraKind {
    /// Listed by the platform
    Logical,
    /// Constituent sensor exposed by the given logical camera
    PhysicalOf(String),
    /// Not listed, but answered a characteristics probe
    Hidden,
}

impl CameraKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraKind::Logical => "Logic",
            CameraKind::PhysicalOf(_) => "Phys",
            CameraKind::Hidden => "Hidden",
        }
    }
}

/// One addressable camera in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraIdentity {
    /// Id the platform knows the sensor by
    pub real_id: String,
    pub kind: CameraKind,
    pub facing: Facing,
    /// First advertised focal length, `0.0` when unavailable
    pub focal_length_mm: f32,
}

impl CameraIdentity {
    pub fn new(real_id: impl Into<String>, kind: CameraKind) -> Self {
        Self {
            real_id: real_id.into(),
            kind,
            facing: Facing::Unknown,
            focal_length_mm: 0.0,
        }
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    pub fn with_focal_length(mut self, focal_length_mm: f32) -> Self {
        self.focal_length_mm = focal_length_mm;
        self
    }

    /// Id a caller passes back to open this camera: `id` or `physical[logical]`
    pub fn display_id(&self) -> String {
        match &self.kind {
            CameraKind::PhysicalOf(parent) => format!("{}[{}]", self.real_id, parent),
            CameraKind::Logical | CameraKind::Hidden => self.real_id.clone(),
        }
    }

    /// `<id>:<kind>-<facing>:<focal>`
    pub fn wire_entry(&self) -> String {
        format!(
            "{}:{}-{}:{}",
            self.display_id(),
            self.kind.as_str(),
            self.facing.as_str(),
            format_focal_length(self.focal_length_mm)
        )
    }
}

/// Integral values keep one decimal (`4.0`), others print shortest (`4.38`).
pub fn format_focal_length(value: f32) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Supported zoom ratio range of a camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub lower: f32,
    pub upper: f32,
}

impl ZoomRange {
    pub fn new(lower: f32, upper: f32) -> Self {
        Self { lower, upper }
    }

    /// Whether the camera can zoom out past the default field of view
    pub fn is_ultra_wide(&self) -> bool {
        self.lower < 1.0
    }
}

/// Device characteristics returned by the platform camera service.
/// Every field is optional because any key may be missing on a given device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraCharacteristics {
    pub lens_facing: Option<LensFacing>,
    pub focal_lengths: Option<Vec<f32>>,
    pub physical_camera_ids: Option<Vec<String>>,
    pub zoom_ratio_range: Option<ZoomRange>,
}

impl CameraCharacteristics {
    pub fn primary_focal_length(&self) -> f32 {
        self.focal_lengths
            .as_ref()
            .and_then(|lengths| lengths.first().copied())
            .unwrap_or(0.0)
    }
}

/// Optional camera-service features, gated by OS API level on Android
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Logical cameras report their physical sensor ids
    pub multi_camera: bool,
    /// Sessions can pin an output to a physical sensor
    pub physical_streams: bool,
    /// Characteristics carry a zoom ratio range and requests accept a ratio
    pub zoom_ratio: bool,
}

impl PlatformCapabilities {
    pub const MULTI_CAMERA_API_LEVEL: u32 = 28;
    pub const ZOOM_RATIO_API_LEVEL: u32 = 30;

    pub fn from_api_level(level: u32) -> Self {
        Self {
            multi_camera: level >= Self::MULTI_CAMERA_API_LEVEL,
            physical_streams: level >= Self::MULTI_CAMERA_API_LEVEL,
            zoom_ratio: level >= Self::ZOOM_RATIO_API_LEVEL,
        }
    }

    pub fn all() -> Self {
        Self {
            multi_camera: true,
            physical_streams: true,
            zoom_ratio: true,
        }
    }

    pub fn none() -> Self {
        Self {
            multi_camera: false,
            physical_streams: false,
            zoom_ratio: false,
        }
    }
}

/// GPU texture name handed to the render pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(pub u32);

impl TextureId {
    /// Boundary representation; the render pipeline treats it as opaque
    pub fn as_raw(&self) -> i32 {
        self.0 as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_defaults_to_back_on_wire() {
        assert_eq!(Facing::from_lens(None), Facing::Unknown);
        assert_eq!(Facing::from_lens(None).as_str(), "Back");
        assert_eq!(Facing::from_lens(Some(LensFacing::External)).as_str(), "Back");
        assert_eq!(Facing::from_lens(Some(LensFacing::Front)).as_str(), "Front");
    }

    #[test]
    fn test_focal_length_formatting() {
        assert_eq!(format_focal_length(0.0), "0.0");
        assert_eq!(format_focal_length(4.0), "4.0");
        assert_eq!(format_focal_length(4.38), "4.38");
    }

    #[test]
    fn test_wire_entry_for_physical_camera() {
        let identity = CameraIdentity::new("2", CameraKind::PhysicalOf("0".to_string()))
            .with_facing(Facing::Back)
            .with_focal_length(2.2);
        assert_eq!(identity.display_id(), "2[0]");
        assert_eq!(identity.wire_entry(), "2[0]:Phys-Back:2.2");
    }

    #[test]
    fn test_capabilities_follow_api_level() {
        let pie = PlatformCapabilities::from_api_level(28);
        assert!(pie.multi_camera && pie.physical_streams);
        assert!(!pie.zoom_ratio);
        assert_eq!(PlatformCapabilities::from_api_level(30), PlatformCapabilities::all());
        assert_eq!(PlatformCapabilities::from_api_level(26), PlatformCapabilities::none());
    }

    #[test]
    fn test_primary_focal_length() {
        let chars = CameraCharacteristics {
            focal_lengths: Some(vec![4.38, 6.0]),
            ..Default::default()
        };
        assert_eq!(chars.primary_focal_length(), 4.38);
        assert_eq!(CameraCharacteristics::default().primary_focal_length(), 0.0);
    }
}
