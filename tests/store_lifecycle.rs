use vision_bridge_lib::core::ObjectSpec;
use vision_bridge_lib::{BridgeError, ObjectKind, VisionBridge};

#[test]
fn handles_resolve_until_cleared() {
    let mut bridge = VisionBridge::default();
    let point = bridge.create_object(ObjectSpec::Point { x: 4, y: 9 }).unwrap();
    let mat = bridge.frame_buffer_to_mat(1, 2, 1, &[5, 6]).unwrap();

    assert_eq!(bridge.to_value(&point).unwrap()["x"], 4);
    assert_eq!(bridge.store().len(), 2);

    bridge.clear_buffers();
    assert!(bridge.store().is_empty());
    assert!(matches!(bridge.to_value(&point), Err(BridgeError::Lookup(_))));
    assert!(matches!(bridge.mat_data(&mat), Err(BridgeError::Lookup(_))));
}

#[test]
fn reused_slots_do_not_revive_old_handles() {
    let mut bridge = VisionBridge::default();
    let old = bridge.create_object(ObjectSpec::Size { width: 1, height: 2 }).unwrap();
    bridge.clear_buffers();
    let fresh = bridge.create_object(ObjectSpec::Size { width: 3, height: 4 }).unwrap();

    assert_ne!(old.id, fresh.id);
    assert!(bridge.to_value(&old).unwrap_err().is_lookup());
    assert_eq!(bridge.to_value(&fresh).unwrap()["width"], 3);
}

#[test]
fn malformed_ids_are_lookup_errors() {
    let bridge = VisionBridge::default();
    let bogus = vision_bridge_lib::WrappedValue {
        kind: ObjectKind::Mat,
        id: "not-a-handle".into(),
    };
    assert!(bridge.to_value(&bogus).unwrap_err().is_lookup());
}
