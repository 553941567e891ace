use opencv::prelude::*;
use tracing::debug;

use crate::bridge::VisionBridge;
use crate::core::{BufferData, BufferType, MatBuffer, MatData, WrappedValue};
use crate::processing::mat;
use crate::processing::{Mat, Rect};
use crate::store::ObjectKind;
use crate::utils::{BridgeResult, decode_base64, decode_image_bgr, validate_frame, validate_region};

/// The first `rows * cols * channels` bytes of the element data, read as-is.
fn leading_bytes(src: &Mat) -> BridgeResult<Vec<u8>> {
    if src.empty() {
        return Ok(Vec::new());
    }
    let len = src.total() * src.channels() as usize;
    if src.is_continuous() {
        return Ok(src.data_bytes()?[..len].to_vec());
    }
    Ok(src.try_clone()?.data_bytes()?[..len].to_vec())
}

impl VisionBridge {
    /// Wraps a raw interleaved 8-bit frame as a new mat.
    pub fn frame_buffer_to_mat(
        &mut self,
        rows: usize,
        cols: usize,
        channels: usize,
        bytes: &[u8],
    ) -> BridgeResult<WrappedValue> {
        validate_frame(rows, cols, channels, bytes.len())?;
        let mat = mat::from_bytes(rows as i64, cols as i64, channels, bytes)?;
        self.save_mat(mat)
    }

    /// Decodes a base64 image (optionally a `data:` URL) into a BGR mat.
    pub fn base64_to_mat(&mut self, encoded: &str) -> BridgeResult<WrappedValue> {
        let bytes = decode_base64(encoded)?;
        let mat = decode_image_bgr(&bytes)?;
        self.save_mat(mat)
    }

    /// `rows * cols * channels` values. `Uint8` hands back the element bytes
    /// untouched; `Float32` converts mats of other depths first.
    pub fn mat_to_buffer(&self, wrapped: &WrappedValue, buffer_type: BufferType) -> BridgeResult<MatBuffer> {
        let mat = self.mat(wrapped)?;
        let buffer = match buffer_type {
            BufferType::Uint8 => BufferData::Uint8(leading_bytes(mat)?),
            BufferType::Float32 => BufferData::Float32(mat::to_f32_vec(mat)?),
        };
        Ok(MatBuffer {
            cols: mat.cols() as usize,
            rows: mat.rows() as usize,
            channels: mat.channels() as usize,
            buffer,
        })
    }

    /// Elements saturated to 8 bits plus the mat's dimensions.
    pub fn mat_data(&self, wrapped: &WrappedValue) -> BridgeResult<MatData> {
        let mat = self.mat(wrapped)?;
        Ok(MatData {
            size: mat.total(),
            cols: mat.cols() as usize,
            rows: mat.rows() as usize,
            data: mat::to_u8_vec(mat)?,
        })
    }

    /// New mat of exactly the rect's size: pixels under the source are
    /// copied, the rest stays zero.
    pub fn mat_roi(&mut self, wrapped: &WrappedValue, rect: &WrappedValue) -> BridgeResult<WrappedValue> {
        let rect_handle = self.resolve(rect)?;
        let region = *self.store.get::<Rect>(&rect_handle)?;
        validate_region(&region)?;
        let out = mat::roi_padded(self.mat(wrapped)?, region)?;
        debug!("ROI {}x{} at ({}, {})", region.width, region.height, region.x, region.y);
        self.save_mat(out)
    }

    fn mat(&self, wrapped: &WrappedValue) -> BridgeResult<&Mat> {
        let handle = self.resolve(wrapped)?;
        self.store.get::<Mat>(&handle)
    }

    fn save_mat(&mut self, mat: Mat) -> BridgeResult<WrappedValue> {
        let handle = self.store.save(mat)?;
        Ok(WrappedValue::wrap(ObjectKind::Mat, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObjectSpec;
    use crate::utils::BridgeError;

    #[test]
    fn frame_round_trips_through_uint8_buffer() {
        let mut bridge = VisionBridge::default();
        let bytes: Vec<u8> = (0..24).collect();
        let mat = bridge.frame_buffer_to_mat(2, 3, 4, &bytes).unwrap();
        let out = bridge.mat_to_buffer(&mat, BufferType::Uint8).unwrap();
        assert_eq!((out.rows, out.cols, out.channels), (2, 3, 4));
        assert_eq!(out.buffer, BufferData::Uint8(bytes));
    }

    #[test]
    fn short_frame_is_unsupported_input() {
        let mut bridge = VisionBridge::default();
        let err = bridge.frame_buffer_to_mat(2, 2, 3, &[0; 11]).unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedInput(_)));
        assert!(bridge.store().is_empty());
    }

    #[test]
    fn roi_beyond_source_is_zero_padded() {
        let mut bridge = VisionBridge::default();
        let mat = bridge.frame_buffer_to_mat(10, 10, 1, &[7; 100]).unwrap();
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
        assert_eq!((data.rows, data.cols), (5, 5));
        assert_eq!(data.data.iter().filter(|b| **b == 7).count(), 4);
        assert_eq!(data.data.iter().filter(|b| **b == 0).count(), 21);
        assert_eq!(&data.data[..2], &[7, 7]);
        assert_eq!(&data.data[5..7], &[7, 7]);
    }

    #[test]
    fn huge_roi_is_unsupported_input() {
        let mut bridge = VisionBridge::default();
        let mat = bridge.frame_buffer_to_mat(2, 2, 1, &[1; 4]).unwrap();
        let rect = bridge
            .create_object(ObjectSpec::Rect {
                x: 0,
                y: 0,
                width: i32::MAX,
                height: i32::MAX,
            })
            .unwrap();
        assert!(matches!(
            bridge.mat_roi(&mat, &rect),
            Err(BridgeError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn buffers_keep_native_depth() {
        let mut bridge = VisionBridge::default();
        let floats = bridge
            .create_object(ObjectSpec::Mat {
                rows: 1,
                cols: 2,
                mat_type: 5,
                data: Some(vec![0.25, 300.0]),
            })
            .unwrap();
        let out = bridge.mat_to_buffer(&floats, BufferType::Float32).unwrap();
        assert_eq!(out.buffer, BufferData::Float32(vec![0.25, 300.0]));
        let raw = bridge.mat_to_buffer(&floats, BufferType::Uint8).unwrap();
        assert_eq!(raw.buffer, BufferData::Uint8(0.25f32.to_ne_bytes()[..2].to_vec()));
        // The 8-bit dump saturates instead.
        assert_eq!(bridge.mat_data(&floats).unwrap().data, vec![0, 255]);
    }

    #[test]
    fn roi_needs_a_rect_handle() {
        let mut bridge = VisionBridge::default();
        let mat = bridge.frame_buffer_to_mat(1, 1, 1, &[1]).unwrap();
        assert!(matches!(
            bridge.mat_roi(&mat, &mat),
            Err(BridgeError::TypeMismatch { .. })
        ));
    }
}
