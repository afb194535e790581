//! Camera id grammar: `logical` or `physical[logical]`

use camtex::errors::ErrorKind;
use camtex::identifier::CompositeAddress;
use camtex::types::{CameraIdentity, CameraKind};
use proptest::prelude::*;

#[test]
fn test_catalog_ids_parse_back_to_their_targets() {
    let physical = CameraIdentity::new("2", CameraKind::PhysicalOf("0".to_string()));
    let address: CompositeAddress = physical.display_id().parse().unwrap();
    assert_eq!(
        address,
        CompositeAddress::PhysicalViaLogical {
            physical_id: "2".to_string(),
            logical_id: "0".to_string(),
        }
    );

    let hidden = CameraIdentity::new("5", CameraKind::Hidden);
    let address: CompositeAddress = hidden.display_id().parse().unwrap();
    assert_eq!(address, CompositeAddress::Logical("5".to_string()));
}

#[test]
fn test_invalid_ids_report_invalid_camera_id() {
    let err = "[0]".parse::<CompositeAddress>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidCameraId);
    assert!(err.to_string().contains("[0]"));
}

#[test]
fn test_default_request() {
    let address = CompositeAddress::from_request(None).unwrap();
    assert_eq!(address.logical_id(), "0");
    assert_eq!(address.physical_id(), None);
}

fn camera_id() -> impl Strategy<Value = String> {
    prop_oneof!["[0-9]{1,3}", "[a-z][a-z0-9_.-]{0,8}"]
}

proptest! {
    /// Rendering a composite id and parsing it again is lossless
    #[test]
    fn composite_round_trip(physical in camera_id(), logical in camera_id()) {
        let rendered = format!("{}[{}]", physical, logical);
        let address: CompositeAddress = rendered.parse().unwrap();
        prop_assert_eq!(address.physical_id(), Some(physical.as_str()));
        prop_assert_eq!(address.logical_id(), logical.as_str());
        prop_assert_eq!(address.to_string(), rendered);
    }

    /// Ids without a bracket are always logical and unchanged
    #[test]
    fn plain_ids_are_logical(id in camera_id()) {
        let address: CompositeAddress = id.parse().unwrap();
        prop_assert!(!address.is_physical());
        prop_assert_eq!(address.to_string(), id);
    }

    /// Parsing never panics on arbitrary input
    #[test]
    fn parse_never_panics(input in ".{0,16}") {
        let _ = input.parse::<CompositeAddress>();
    }
}
