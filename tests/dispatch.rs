use vision_bridge_lib::core::ObjectSpec;
use vision_bridge_lib::dispatch::fnv1a;
use vision_bridge_lib::{Arg, BridgeError, BufferType, ObjectKind, Outcome, Verb, VisionBridge, WrappedValue};

fn gray(bridge: &mut VisionBridge, rows: usize, cols: usize, bytes: &[u8]) -> WrappedValue {
    bridge.frame_buffer_to_mat(rows, cols, 1, bytes).unwrap()
}

fn bytes(bridge: &VisionBridge, mat: &WrappedValue) -> Vec<u8> {
    bridge.mat_data(mat).unwrap().data
}

#[test]
fn unknown_verb_is_rejected() {
    let mut bridge = VisionBridge::default();
    let err = bridge.invoke("definitelyNotAVerb", &[]).unwrap_err();
    assert_eq!(err, BridgeError::UnknownVerb("definitelyNotAVerb".into()));
    assert!(bridge.store().is_empty());
}

#[test]
fn verb_resolution_is_deterministic() {
    for verb in Verb::ALL {
        assert_eq!(fnv1a(verb.name()), fnv1a(verb.name()));
        assert_eq!(Verb::resolve(verb.name()).unwrap(), *verb);
    }
}

#[test]
fn threshold_writes_destination_and_reports_threshold() {
    let mut bridge = VisionBridge::default();
    let src = gray(&mut bridge, 1, 4, &[10, 100, 150, 250]);
    let dst = gray(&mut bridge, 1, 1, &[0]);
    let outcome = bridge
        .invoke(
            "threshold",
            &[src.into(), (&dst).into(), 120.0.into(), 255.0.into(), 0.into()],
        )
        .unwrap();
    assert_eq!(outcome, Outcome::Value(120.0));
    assert_eq!(bytes(&bridge, &dst), vec![0, 0, 255, 255]);
}

#[test]
fn argument_errors_name_verb_and_position() {
    let mut bridge = VisionBridge::default();
    let src = gray(&mut bridge, 1, 1, &[1]);
    let err = bridge.invoke("flip", &[src.into()]).unwrap_err();
    assert_eq!(err, BridgeError::argument("flip", 1, "mat"));
}

#[test]
fn allocating_verbs_hand_back_new_objects() {
    let mut bridge = VisionBridge::default();
    let center = bridge.create_object(ObjectSpec::Point { x: 5, y: 5 }).unwrap();
    let outcome = bridge
        .invoke("getRotationMatrix2D", &[center.into(), 90.0.into(), 1.0.into()])
        .unwrap();
    let matrix = outcome.wrapped().unwrap().clone();
    assert_eq!(matrix.kind, ObjectKind::Mat);
    let buffer = bridge.mat_to_buffer(&matrix, BufferType::Float32).unwrap();
    assert_eq!((buffer.rows, buffer.cols), (2, 3));
}

#[test]
fn mean_wraps_a_scalar() {
    let mut bridge = VisionBridge::default();
    let src = gray(&mut bridge, 2, 2, &[0, 10, 20, 30]);
    let outcome = bridge.invoke("mean", &[src.into()]).unwrap();
    let scalar = outcome.wrapped().unwrap();
    assert_eq!(scalar.kind, ObjectKind::Scalar);
    assert_eq!(bridge.to_value(scalar).unwrap()["a"], 15.0);
}

#[test]
fn contours_can_be_drawn_back() {
    let mut bridge = VisionBridge::default();
    let mut pixels = vec![0u8; 64];
    for r in 2..6 {
        for c in 2..6 {
            pixels[r * 8 + c] = 255;
        }
    }
    let src = gray(&mut bridge, 8, 8, &pixels);
    let contours = bridge.create_object(ObjectSpec::MatVector { mats: vec![] }).unwrap();
    bridge
        .invoke(
            "findContours",
            &[(&src).into(), (&contours).into(), 0.into(), 2.into()],
        )
        .unwrap();
    assert_eq!(bridge.to_value(&contours).unwrap()["array"].as_array().unwrap().len(), 1);

    let canvas = bridge
        .create_object(ObjectSpec::Mat {
            rows: 8,
            cols: 8,
            mat_type: 0,
            data: None,
        })
        .unwrap();
    let white = bridge.create_object(ObjectSpec::Scalar { values: vec![255.0] }).unwrap();
    bridge
        .invoke(
            "drawContours",
            &[(&canvas).into(), contours.into(), Arg::from(-1), white.into(), Arg::from(-1)],
        )
        .unwrap();
    assert_eq!(bytes(&bridge, &canvas), pixels);
}

#[test]
fn wrong_stored_kind_is_a_type_mismatch() {
    let mut bridge = VisionBridge::default();
    let rect = bridge
        .create_object(ObjectSpec::Rect {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        })
        .unwrap();
    let disguised = WrappedValue {
        kind: ObjectKind::Mat,
        id: rect.id.clone(),
    };
    let err = bridge.invoke("transpose", &[disguised.clone().into(), disguised.into()]).unwrap_err();
    assert!(matches!(err, BridgeError::TypeMismatch { .. }));
}

#[test]
fn empty_mats_are_processing_errors() {
    let mut bridge = VisionBridge::default();
    let empty = bridge.frame_buffer_to_mat(0, 0, 1, &[]).unwrap();
    let dst = gray(&mut bridge, 1, 1, &[0]);
    let matrix = bridge
        .create_object(ObjectSpec::Mat {
            rows: 2,
            cols: 3,
            mat_type: 6,
            data: Some(vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
        })
        .unwrap();
    let dsize = bridge.create_object(ObjectSpec::Size { width: 3, height: 3 }).unwrap();
    let err = bridge
        .invoke(
            "warpAffine",
            &[(&empty).into(), (&dst).into(), matrix.into(), (&dsize).into()],
        )
        .unwrap_err();
    assert!(matches!(err, BridgeError::Processing(_)));
    let err = bridge
        .invoke("resize", &[(&empty).into(), (&dst).into(), dsize.into()])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Processing(_)));
}

#[test]
fn find_contours_retrieval_mode_reaches_the_native_call() {
    let mut bridge = VisionBridge::default();
    // 7x7 square with a 3x3 hole: an outer and an inner boundary.
    let mut pixels = vec![0u8; 81];
    for r in 1..8 {
        for c in 1..8 {
            let hole = (3..6).contains(&r) && (3..6).contains(&c);
            pixels[r * 9 + c] = if hole { 0 } else { 255 };
        }
    }
    let src = gray(&mut bridge, 9, 9, &pixels);
    let traced = |bridge: &mut VisionBridge, mode: i32| {
        let contours = bridge.create_object(ObjectSpec::MatVector { mats: vec![] }).unwrap();
        bridge
            .invoke(
                "findContours",
                &[(&src).into(), (&contours).into(), mode.into(), 2.into()],
            )
            .unwrap();
        bridge.to_value(&contours).unwrap()["array"].as_array().unwrap().len()
    };
    assert_eq!(traced(&mut bridge, 1), 2);
    assert_eq!(traced(&mut bridge, 0), 1);
}

#[test]
fn line_type_is_passed_through() {
    let mut bridge = VisionBridge::default();
    let p1 = bridge.create_object(ObjectSpec::Point { x: 0, y: 0 }).unwrap();
    let p2 = bridge.create_object(ObjectSpec::Point { x: 4, y: 4 }).unwrap();
    let white = bridge.create_object(ObjectSpec::Scalar { values: vec![255.0] }).unwrap();
    let mut painted = |line_type: i32| {
        let canvas = gray(&mut bridge, 5, 5, &[0; 25]);
        bridge
            .invoke(
                "line",
                &[
                    (&canvas).into(),
                    (&p1).into(),
                    (&p2).into(),
                    (&white).into(),
                    1.into(),
                    line_type.into(),
                ],
            )
            .unwrap();
        bytes(&bridge, &canvas).iter().filter(|b| **b == 255).count()
    };
    // An 8-connected diagonal steps corner to corner; a 4-connected one
    // needs an extra pixel per step.
    assert_eq!(painted(8), 5);
    assert_eq!(painted(4), 9);
}
