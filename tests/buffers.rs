use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use vision_bridge_lib::core::{BufferData, ObjectSpec};
use vision_bridge_lib::processing::mat;
use vision_bridge_lib::utils::encode_png;
use vision_bridge_lib::{BridgeError, BufferType, VisionBridge};

#[test]
fn bytes_round_trip_through_ingest_and_egress() {
    let mut bridge = VisionBridge::default();
    let bytes: Vec<u8> = (0..=255).cycle().take(4 * 5 * 3).collect();
    let mat = bridge.frame_buffer_to_mat(4, 5, 3, &bytes).unwrap();

    let out = bridge.mat_to_buffer(&mat, BufferType::Uint8).unwrap();
    assert_eq!(out.buffer.len(), 4 * 5 * 3);
    assert_eq!(out.buffer, BufferData::Uint8(bytes));
}

#[test]
fn float_values_round_trip_through_float32_egress() {
    let mut bridge = VisionBridge::default();
    let values = vec![0.5, -1.25, 3.0, 1e6, 0.0, 42.0];
    let mat = bridge
        .create_object(ObjectSpec::Mat {
            rows: 3,
            cols: 1,
            mat_type: 13,
            data: Some(values.clone()),
        })
        .unwrap();
    let out = bridge.mat_to_buffer(&mat, BufferType::Float32).unwrap();
    assert_eq!(out.channels, 2);
    assert_eq!(
        out.buffer,
        BufferData::Float32(values.iter().map(|v| *v as f32).collect())
    );
}

#[test]
fn egress_length_is_rows_cols_channels() {
    let mut bridge = VisionBridge::default();
    for (rows, cols, channels) in [(1, 1, 1), (3, 7, 4), (0, 5, 3)] {
        let mat = bridge
            .frame_buffer_to_mat(rows, cols, channels, &vec![1; rows * cols * channels])
            .unwrap();
        for kind in [BufferType::Uint8, BufferType::Float32] {
            let out = bridge.mat_to_buffer(&mat, kind).unwrap();
            assert_eq!(out.buffer.len(), rows * cols * channels);
        }
    }
}

#[test]
fn roi_partially_outside_source() {
    let mut bridge = VisionBridge::default();
    let source: Vec<u8> = (1..=100).collect();
    let mat = bridge.frame_buffer_to_mat(10, 10, 1, &source).unwrap();
    let rect = bridge
        .create_object(ObjectSpec::Rect {
            x: 8,
            y: 8,
            width: 5,
            height: 5,
        })
        .unwrap();

    let roi = bridge.mat_roi(&mat, &rect).unwrap();
    let data = bridge.mat_data(&roi).unwrap();
    assert_eq!((data.rows, data.cols, data.size), (5, 5, 25));
    assert_eq!(data.data.iter().filter(|b| **b == 0).count(), 21);
    assert_eq!(&data.data[0..2], &[89, 90]);
    assert_eq!(&data.data[5..7], &[99, 100]);
}

#[test]
fn base64_png_decodes_to_bgr() {
    let mut bridge = VisionBridge::default();
    // One red pixel then one blue pixel, in BGR order.
    let pixels = mat::from_bytes(1, 2, 3, &[0, 0, 255, 255, 0, 0]).unwrap();
    let png = encode_png(&pixels).unwrap();
    let encoded = format!("data:image/png;base64,{}", STANDARD.encode(&png));

    let mat = bridge.base64_to_mat(&encoded).unwrap();
    let data = bridge.mat_data(&mat).unwrap();
    assert_eq!((data.rows, data.cols), (1, 2));
    assert_eq!(data.data, vec![0, 0, 255, 255, 0, 0]);
}

#[test]
fn oversized_shapes_are_unsupported_input() {
    let mut bridge = VisionBridge::default();
    let err = bridge
        .create_object(ObjectSpec::Mat {
            rows: 1 << 40,
            cols: 1 << 40,
            mat_type: 0,
            data: None,
        })
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedInput(_)));

    let mat = bridge.frame_buffer_to_mat(1, 1, 1, &[9]).unwrap();
    let rect = bridge
        .create_object(ObjectSpec::Rect {
            x: -5,
            y: -5,
            width: 1 << 30,
            height: 1 << 30,
        })
        .unwrap();
    assert!(matches!(bridge.mat_roi(&mat, &rect), Err(BridgeError::UnsupportedInput(_))));
    assert_eq!(bridge.store().len(), 2);
}
