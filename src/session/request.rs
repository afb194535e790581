//! Repeating preview request and the zoom-fallback policy

use crate::errors::CameraError;
use crate::platform::OutputSurface;
use crate::types::ZoomRange;
use std::sync::Arc;

/// Ratio requested when the camera cannot zoom out
pub const DEFAULT_ZOOM_RATIO: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTemplate {
    Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFocusMode {
    ContinuousPicture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoExposureMode {
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoWhiteBalanceMode {
    Auto,
}

/// Capture request resubmitted continuously to feed the preview surface
#[derive(Clone, Debug)]
pub struct PreviewRequest {
    pub template: RequestTemplate,
    pub targets: Vec<Arc<dyn OutputSurface>>,
    pub af_mode: AutoFocusMode,
    pub ae_mode: AutoExposureMode,
    pub awb_mode: AutoWhiteBalanceMode,
    /// `None` leaves the device default in place
    pub zoom_ratio: Option<f32>,
}

impl PreviewRequest {
    /// Preview template with continuous autofocus, auto exposure and auto white balance
    pub fn preview(target: Arc<dyn OutputSurface>) -> Self {
        Self {
            template: RequestTemplate::Preview,
            targets: vec![target],
            af_mode: AutoFocusMode::ContinuousPicture,
            ae_mode: AutoExposureMode::On,
            awb_mode: AutoWhiteBalanceMode::Auto,
            zoom_ratio: None,
        }
    }

    pub fn with_zoom_ratio(mut self, ratio: Option<f32>) -> Self {
        self.zoom_ratio = ratio;
        self
    }
}

/// Widest ratio the range allows, or `1.0` for cameras that cannot go below it
pub fn fallback_zoom_ratio(range: ZoomRange) -> f32 {
    if range.is_ultra_wide() {
        range.lower
    } else {
        DEFAULT_ZOOM_RATIO
    }
}

/// Decides the zoom override for a new preview request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomPolicy {
    /// Switched off through configuration
    pub enabled: bool,
    /// Platform supports zoom ratios at all
    pub platform_supported: bool,
}

impl ZoomPolicy {
    /// Physical-targeted sessions keep the sensor's native field of view and
    /// never look at the range. Otherwise `range` is consulted; a missing
    /// range means no override, a failed lookup is returned to the caller as
    /// a [`CameraError::ControlError`].
    pub fn resolve<F>(&self, physical_session: bool, range: F) -> Result<Option<f32>, CameraError>
    where
        F: FnOnce() -> Result<Option<ZoomRange>, CameraError>,
    {
        if physical_session || !self.enabled || !self.platform_supported {
            return Ok(None);
        }
        let range = range().map_err(|e| {
            CameraError::ControlError(format!("Zoom ratio range unavailable: {}", e.message()))
        })?;
        Ok(range.map(fallback_zoom_ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    const ENABLED: ZoomPolicy = ZoomPolicy {
        enabled: true,
        platform_supported: true,
    };

    #[test]
    fn test_ultra_wide_range_requests_its_minimum() {
        let ratio = ENABLED
            .resolve(false, || Ok(Some(ZoomRange::new(0.5, 10.0))))
            .unwrap();
        assert_eq!(ratio, Some(0.5));
    }

    #[test]
    fn test_narrow_range_requests_one() {
        let ratio = ENABLED
            .resolve(false, || Ok(Some(ZoomRange::new(1.2, 8.0))))
            .unwrap();
        assert_eq!(ratio, Some(1.0));
    }

    #[test]
    fn test_physical_session_never_zooms() {
        let ratio = ENABLED
            .resolve(true, || panic!("range must not be consulted"))
            .unwrap();
        assert_eq!(ratio, None);
    }

    #[test]
    fn test_missing_range_or_unsupported_platform() {
        assert_eq!(ENABLED.resolve(false, || Ok(None)).unwrap(), None);

        let unsupported = ZoomPolicy {
            enabled: true,
            platform_supported: false,
        };
        assert_eq!(
            unsupported
                .resolve(false, || Ok(Some(ZoomRange::new(0.5, 2.0))))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_lookup_failure_becomes_control_error() {
        let err = ENABLED
            .resolve(false, || {
                Err(CameraError::EnumerationError("gone".to_string()))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Control);
        assert!(err.message().contains("gone"));
    }

    #[test]
    fn test_exactly_one_is_not_ultra_wide() {
        assert_eq!(fallback_zoom_ratio(ZoomRange::new(1.0, 4.0)), 1.0);
        assert_eq!(fallback_zoom_ratio(ZoomRange::new(0.6, 4.0)), 0.6);
    }
}
