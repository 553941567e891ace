//! Helpers around the native [`Mat`]: type codes, checked allocation and the
//! element conversions the bridge needs at its edges.
//!
//! Mats keep their native element depth. Every allocation whose size comes
//! from the host goes through [`byte_len`] first, so an absurd shape is an
//! input error instead of an allocator abort.

use opencv::core::{self, Mat, Point, Rect, Scalar};
use opencv::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::{BridgeError, BridgeResult};

/// Largest element buffer a single mat may hold.
pub const MAX_MAT_BYTES: usize = 1 << 30;

/// Element depth, numbered like the OpenCV `CV_8U`..`CV_16F` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    U8 = 0,
    S8 = 1,
    U16 = 2,
    S16 = 3,
    S32 = 4,
    F32 = 5,
    F64 = 6,
    F16 = 7,
}

impl Depth {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::U8),
            1 => Some(Self::S8),
            2 => Some(Self::U16),
            3 => Some(Self::S16),
            4 => Some(Self::S32),
            5 => Some(Self::F32),
            6 => Some(Self::F64),
            7 => Some(Self::F16),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Bytes per channel value.
    pub fn size(self) -> usize {
        match self {
            Self::U8 | Self::S8 => 1,
            Self::U16 | Self::S16 | Self::F16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Depth plus channel count, encoded as `depth + ((channels - 1) << 3)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatType {
    pub depth: Depth,
    pub channels: usize,
}

impl MatType {
    pub const MAX_CHANNELS: usize = 512;

    pub fn new(depth: Depth, channels: usize) -> Self {
        Self { depth, channels }
    }

    pub fn from_code(code: i32) -> BridgeResult<Self> {
        if code < 0 {
            return Err(BridgeError::processing(format!("Invalid mat type code: {code}")));
        }
        let depth = Depth::from_code(code & 7)
            .ok_or_else(|| BridgeError::processing(format!("Invalid depth in type code: {code}")))?;
        let channels = ((code >> 3) as usize) + 1;
        if channels > Self::MAX_CHANNELS {
            return Err(BridgeError::processing(format!("Too many channels in type code: {code}")));
        }
        Ok(Self { depth, channels })
    }

    pub fn of(mat: &Mat) -> BridgeResult<Self> {
        Self::from_code(mat.typ())
    }

    pub fn code(self) -> i32 {
        self.depth.code() + (((self.channels as i32) - 1) << 3)
    }

    pub fn elem_size(self) -> usize {
        self.depth.size() * self.channels
    }
}

/// Byte size of a `rows x cols` mat of `mat_type`, rejected as unsupported
/// input when negative, overflowing or above [`MAX_MAT_BYTES`].
pub fn byte_len(rows: i64, cols: i64, mat_type: MatType) -> BridgeResult<usize> {
    if rows < 0 || cols < 0 {
        return Err(BridgeError::unsupported(format!("Invalid mat size {rows}x{cols}")));
    }
    let len = usize::try_from(rows)
        .ok()
        .zip(usize::try_from(cols).ok())
        .and_then(|(r, c)| r.checked_mul(c))
        .and_then(|n| n.checked_mul(mat_type.elem_size()))
        .filter(|n| *n <= MAX_MAT_BYTES)
        .ok_or_else(|| {
            BridgeError::unsupported(format!(
                "A {rows}x{cols} mat with {} channel(s) exceeds {MAX_MAT_BYTES} bytes",
                mat_type.channels
            ))
        })?;
    Ok(len)
}

/// Zero-filled mat after a size check.
pub fn zeros(rows: i64, cols: i64, mat_type: MatType) -> BridgeResult<Mat> {
    byte_len(rows, cols, mat_type)?;
    Ok(Mat::new_rows_cols_with_default(
        rows as i32,
        cols as i32,
        mat_type.code(),
        Scalar::all(0.0),
    )?)
}

/// Builds a mat from interleaved element values, saturated to the depth.
pub fn from_values(rows: i64, cols: i64, mat_type: MatType, data: &[f64]) -> BridgeResult<Mat> {
    let expected = byte_len(rows, cols, mat_type)? / mat_type.depth.size();
    if data.len() != expected {
        return Err(BridgeError::unsupported(format!(
            "Expected {expected} elements for a {rows}x{cols}x{} mat, got {}",
            mat_type.channels,
            data.len()
        )));
    }
    if data.is_empty() {
        return zeros(rows, cols, mat_type);
    }
    let channels = mat_type.channels as i32;
    let mut flat = Mat::new_rows_cols_with_default(
        rows as i32,
        cols as i32 * channels,
        core::CV_64FC1,
        Scalar::all(0.0),
    )?;
    flat.data_typed_mut::<f64>()?.copy_from_slice(data);
    let shaped = flat.reshape(channels, rows as i32)?;
    let mut out = Mat::default();
    shaped.convert_to(&mut out, mat_type.depth.code(), 1.0, 0.0)?;
    Ok(out)
}

/// Wraps an interleaved 8-bit frame, copying it once.
pub fn from_bytes(rows: i64, cols: i64, channels: usize, bytes: &[u8]) -> BridgeResult<Mat> {
    let mut mat = zeros(rows, cols, MatType::new(Depth::U8, channels))?;
    if !bytes.is_empty() {
        mat.data_bytes_mut()?.copy_from_slice(bytes);
    }
    Ok(mat)
}

/// Column of points as an `N x 1` `CV_32SC2` mat, the layout contours travel in.
pub fn from_points(points: Vec<Point>) -> BridgeResult<Mat> {
    if points.is_empty() {
        return Ok(Mat::default());
    }
    Ok(Mat::from_exact_iter(points.into_iter())?)
}

/// Reads a mat as a point list: two channels per element, or a
/// single-channel `N x 2` matrix. Float coordinates are rounded.
pub fn to_points(mat: &Mat) -> BridgeResult<Vec<Point>> {
    if mat.empty() {
        return Ok(Vec::new());
    }
    let pairs = if mat.channels() == 2 {
        mat.try_clone()?
    } else if mat.channels() == 1 && mat.cols() == 2 {
        mat.reshape(2, mat.rows())?.try_clone()?
    } else {
        return Err(BridgeError::processing(format!(
            "Mat of {}x{}x{} is not a point set",
            mat.rows(),
            mat.cols(),
            mat.channels()
        )));
    };
    let pairs = if pairs.depth() == core::CV_32S {
        pairs
    } else {
        let mut converted = Mat::default();
        pairs.convert_to(&mut converted, core::CV_32S, 1.0, 0.0)?;
        converted
    };
    Ok(pairs.data_typed::<Point>()?.to_vec())
}

/// Deep copy, which is always continuous.
fn continuous(mat: &Mat) -> BridgeResult<Mat> {
    Ok(mat.try_clone()?)
}

/// Elements as bytes, row-major and interleaved. 8-bit mats are copied
/// verbatim; other depths are saturated to 8 bits first.
pub fn to_u8_vec(mat: &Mat) -> BridgeResult<Vec<u8>> {
    if mat.empty() {
        return Ok(Vec::new());
    }
    if mat.depth() == core::CV_8U {
        if mat.is_continuous() {
            return Ok(mat.data_bytes()?.to_vec());
        }
        return Ok(continuous(mat)?.data_bytes()?.to_vec());
    }
    let mut narrowed = Mat::default();
    mat.convert_to(&mut narrowed, core::CV_8U, 1.0, 0.0)?;
    Ok(narrowed.data_bytes()?.to_vec())
}

/// Elements as `f32`, converting other depths first.
pub fn to_f32_vec(mat: &Mat) -> BridgeResult<Vec<f32>> {
    if mat.empty() {
        return Ok(Vec::new());
    }
    let floats = if mat.depth() == core::CV_32F {
        continuous(mat)?
    } else {
        let mut converted = Mat::default();
        mat.convert_to(&mut converted, core::CV_32F, 1.0, 0.0)?;
        converted
    };
    Ok(floats
        .data_bytes()?
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Region of exactly `region`'s size: pixels under the source are copied,
/// the rest is zero.
pub fn roi_padded(src: &Mat, region: Rect) -> BridgeResult<Mat> {
    let mat_type = MatType::of(src)?;
    byte_len(region.height as i64, region.width as i64, mat_type)?;
    let x0 = region.x.max(0);
    let y0 = region.y.max(0);
    let x1 = (region.x as i64 + region.width as i64).min(src.cols() as i64) as i32;
    let y1 = (region.y as i64 + region.height as i64).min(src.rows() as i64) as i32;
    if x1 <= x0 || y1 <= y0 {
        return zeros(region.height as i64, region.width as i64, mat_type);
    }
    let inside = Mat::roi(src, Rect::new(x0, y0, x1 - x0, y1 - y0))?.try_clone()?;
    let mut out = Mat::default();
    core::copy_make_border(
        &inside,
        &mut out,
        y0 - region.y,
        (region.y as i64 + region.height as i64 - y1 as i64) as i32,
        x0 - region.x,
        (region.x as i64 + region.width as i64 - x1 as i64) as i32,
        core::BORDER_CONSTANT,
        Scalar::all(0.0),
    )?;
    Ok(out)
}

pub fn ensure_not_empty(mat: &Mat, op: &str) -> BridgeResult<()> {
    if mat.empty() {
        Err(BridgeError::processing(format!("{op} needs a non-empty source mat")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_follow_opencv_layout() {
        let t = MatType::from_code(16).unwrap();
        assert_eq!(t, MatType::new(Depth::U8, 3));
        assert_eq!(MatType::new(Depth::F32, 1).code(), core::CV_32FC1);
        assert_eq!(MatType::new(Depth::F32, 3).code(), core::CV_32FC3);
        assert!(MatType::from_code(-1).is_err());
    }

    #[test]
    fn oversized_shapes_are_unsupported_input() {
        let rgb = MatType::new(Depth::U8, 3);
        assert!(matches!(
            byte_len(i32::MAX as i64, i32::MAX as i64, rgb),
            Err(BridgeError::UnsupportedInput(_))
        ));
        assert!(matches!(zeros(-1, 4, rgb), Err(BridgeError::UnsupportedInput(_))));
        assert_eq!(byte_len(2, 3, MatType::new(Depth::F64, 2)).unwrap(), 96);
    }

    #[test]
    fn values_saturate_to_depth() {
        let m = from_values(1, 3, MatType::new(Depth::U8, 1), &[300.0, -4.0, 2.4]).unwrap();
        assert_eq!(m.typ(), core::CV_8UC1);
        assert_eq!(to_u8_vec(&m).unwrap(), vec![255, 0, 2]);
    }

    #[test]
    fn bytes_keep_native_depth() {
        let m = from_bytes(2, 2, 3, &[7; 12]).unwrap();
        assert_eq!(m.typ(), core::CV_8UC3);
        assert_eq!(m.total() * m.elem_size().unwrap(), 12);
    }

    #[test]
    fn points_round_trip_through_contour_layout() {
        let pts = vec![Point::new(1, 2), Point::new(3, 4)];
        let m = from_points(pts.clone()).unwrap();
        assert_eq!((m.rows(), m.cols(), m.typ()), (2, 1, core::CV_32SC2));
        assert_eq!(to_points(&m).unwrap(), pts);
    }

    #[test]
    fn padded_roi_fills_outside_with_zero() {
        let src = from_bytes(3, 3, 1, &[1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        let roi = roi_padded(&src, Rect::new(1, 1, 3, 3)).unwrap();
        assert_eq!(to_u8_vec(&roi).unwrap(), vec![5, 6, 0, 8, 9, 0, 0, 0, 0]);
        let outside = roi_padded(&src, Rect::new(10, 10, 2, 2)).unwrap();
        assert_eq!(to_u8_vec(&outside).unwrap(), vec![0; 4]);
    }
}
