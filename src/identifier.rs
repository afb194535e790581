//! Camera request ids
//!
//! Callers address a camera either by its logical id (`"0"`) or by a
//! physical sensor reached through a logical camera (`"2[0]"`: physical
//! sensor `2` behind logical camera `0`). The same grammar is produced by
//! [`CameraIdentity::display_id`](crate::types::CameraIdentity::display_id).

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical id opened when a request is empty
pub const DEFAULT_CAMERA_ID: &str = "0";

/// Decoded camera request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositeAddress {
    Logical(String),
    PhysicalViaLogical { physical_id: String, logical_id: String },
}

impl CompositeAddress {
    /// Parse a boundary request; `None` and `""` both mean camera `"0"`.
    pub fn from_request(request: Option<&str>) -> Result<Self, CameraError> {
        match request {
            Some(id) if !id.is_empty() => id.parse(),
            _ => Ok(CompositeAddress::Logical(DEFAULT_CAMERA_ID.to_string())),
        }
    }

    /// The device that actually gets opened
    pub fn logical_id(&self) -> &str {
        match self {
            CompositeAddress::Logical(id) => id,
            CompositeAddress::PhysicalViaLogical { logical_id, .. } => logical_id,
        }
    }

    pub fn physical_id(&self) -> Option<&str> {
        match self {
            CompositeAddress::Logical(_) => None,
            CompositeAddress::PhysicalViaLogical { physical_id, .. } => Some(physical_id),
        }
    }

    pub fn is_physical(&self) -> bool {
        self.physical_id().is_some()
    }
}

impl FromStr for CompositeAddress {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(CompositeAddress::Logical(DEFAULT_CAMERA_ID.to_string()));
        }

        let Some((physical, rest)) = s.split_once('[') else {
            return Ok(CompositeAddress::Logical(s.to_string()));
        };

        let logical = rest.trim_end_matches(']');
        let nested = logical.contains(|c: char| c == '[' || c == ']');
        if physical.is_empty() || logical.is_empty() || nested {
            return Err(CameraError::InvalidCameraId(format!(
                "expected `physical[logical]`, got `{}`",
                s
            )));
        }

        Ok(CompositeAddress::PhysicalViaLogical {
            physical_id: physical.to_string(),
            logical_id: logical.to_string(),
        })
    }
}

impl fmt::Display for CompositeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeAddress::Logical(id) => write!(f, "{}", id),
            CompositeAddress::PhysicalViaLogical {
                physical_id,
                logical_id,
            } => write!(f, "{}[{}]", physical_id, logical_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_id_is_logical() {
        let address: CompositeAddress = "1".parse().unwrap();
        assert_eq!(address, CompositeAddress::Logical("1".to_string()));
        assert_eq!(address.logical_id(), "1");
        assert!(!address.is_physical());
    }

    #[test]
    fn test_composite_id() {
        let address: CompositeAddress = "2[0]".parse().unwrap();
        assert_eq!(address.physical_id(), Some("2"));
        assert_eq!(address.logical_id(), "0");
        assert_eq!(address.to_string(), "2[0]");
    }

    #[test]
    fn test_empty_and_missing_default_to_zero() {
        let zero = CompositeAddress::from_request(Some("0")).unwrap();
        assert_eq!(CompositeAddress::from_request(Some("")).unwrap(), zero);
        assert_eq!(CompositeAddress::from_request(None).unwrap(), zero);
    }

    #[test]
    fn test_missing_closing_bracket_is_tolerated() {
        let address: CompositeAddress = "3[1".parse().unwrap();
        assert_eq!(address.physical_id(), Some("3"));
        assert_eq!(address.logical_id(), "1");
    }

    #[test]
    fn test_malformed_composites_are_rejected() {
        for bad in ["[0]", "2[]", "2[", "2[0[1]]"] {
            assert!(bad.parse::<CompositeAddress>().is_err(), "{bad} should fail");
        }
    }
}
