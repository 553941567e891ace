//! Image codec helpers for ingestion and value conversion.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use opencv::core::{self, Mat, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;
use tracing::debug;

use crate::utils::{BridgeError, BridgeResult};

/// Drops a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url(input: &str) -> &str {
    match input.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map_or(rest, |(_, payload)| payload),
        None => input,
    }
}

pub fn decode_base64(input: &str) -> BridgeResult<Vec<u8>> {
    let payload = strip_data_url(input.trim());
    Ok(STANDARD.decode(payload)?)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes any supported container into a 3-channel 8-bit BGR mat.
pub fn decode_image_bgr(bytes: &[u8]) -> BridgeResult<Mat> {
    let buf = Vector::<u8>::from_slice(bytes);
    let mat = imgcodecs::imdecode(&buf, imgcodecs::IMREAD_COLOR)?;
    if mat.empty() {
        return Err(BridgeError::unsupported("Payload is not a decodable image"));
    }
    debug!("Decoded image of {}x{}", mat.cols(), mat.rows());
    Ok(mat)
}

/// Encodes a mat as PNG after saturating it to 8 bits. One, three and four
/// channel mats are taken as gray, BGR and BGRA.
pub fn encode_png(mat: &Mat) -> BridgeResult<Vec<u8>> {
    match mat.channels() {
        1 | 3 | 4 => {}
        n => {
            return Err(BridgeError::unsupported(format!(
                "Cannot encode a {n}-channel mat as PNG"
            )));
        }
    }
    if mat.empty() {
        return Err(BridgeError::unsupported("Cannot encode an empty mat as PNG"));
    }
    let narrowed;
    let src = if mat.depth() == core::CV_8U {
        mat
    } else {
        let mut out = Mat::default();
        mat.convert_to(&mut out, core::CV_8U, 1.0, 0.0)?;
        narrowed = out;
        &narrowed
    };
    let mut buf = Vector::<u8>::new();
    if !imgcodecs::imencode(".png", src, &mut buf, &Vector::new())? {
        return Err(BridgeError::processing("PNG encoder refused the mat"));
    }
    Ok(buf.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::mat::{self, Depth, MatType};

    #[test]
    fn data_url_prefix_is_optional() {
        assert_eq!(strip_data_url("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_url("QUJD"), "QUJD");
        assert_eq!(decode_base64("data:image/png;base64,QUJD").unwrap(), b"ABC");
    }

    #[test]
    fn png_round_trip_keeps_bgr_order() {
        let data = [10, 20, 30, 200, 100, 0];
        let m = mat::from_bytes(1, 2, 3, &data).unwrap();
        let png = encode_png(&m).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let back = decode_image_bgr(&png).unwrap();
        assert_eq!(mat::to_u8_vec(&back).unwrap(), data);
    }

    #[test]
    fn garbage_is_unsupported_input() {
        let err = decode_image_bgr(b"not an image").unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedInput(_)));
        let two = mat::zeros(2, 2, MatType::new(Depth::U8, 2)).unwrap();
        assert!(encode_png(&two).is_err());
    }
}
