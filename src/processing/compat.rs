//! Wrappers over native calls whose signatures differ between OpenCV
//! releases. OpenCV 4.11 added an `AlgorithmHint` parameter to several
//! imgproc functions, so these go through the `_def` variants and rebuild
//! the remaining parameters on top.

use opencv::core::{self, Mat, Point, Size, Vector};
use opencv::imgproc;
use opencv::prelude::*;

use crate::utils::{BridgeError, BridgeResult};

/// Colour conversion; a non-zero `dst_cn` must match what the code produces.
pub fn cvt_color(src: &Mat, code: i32, dst_cn: i32) -> BridgeResult<Mat> {
    let mut out = Mat::default();
    imgproc::cvt_color_def(src, &mut out, code)?;
    if dst_cn > 0 && out.channels() != dst_cn {
        return Err(BridgeError::processing(format!(
            "Colour code {code} yields {} channel(s), not {dst_cn}",
            out.channels()
        )));
    }
    Ok(out)
}

pub fn demosaicing(src: &Mat, code: i32, dst_cn: i32) -> BridgeResult<Mat> {
    let mut out = Mat::default();
    imgproc::demosaicing_def(src, &mut out, code)?;
    if dst_cn > 0 && out.channels() != dst_cn {
        return Err(BridgeError::processing(format!(
            "Demosaicing code {code} yields {} channel(s), not {dst_cn}",
            out.channels()
        )));
    }
    Ok(out)
}

/// Two-plane YUV conversion, rebuilt as the single-buffer layout the same
/// colour codes accept: luma rows followed by interleaved chroma rows.
pub fn cvt_color_two_plane(y: &Mat, uv: &Mat, code: i32) -> BridgeResult<Mat> {
    if y.channels() != 1 || uv.channels() != 2 || uv.cols() * 2 != y.cols() || uv.rows() * 2 != y.rows() {
        return Err(BridgeError::processing(format!(
            "cvtColorTwoPlane needs a WxH luma plane and a W/2xH/2 two-channel chroma plane, got {}x{}x{} and {}x{}x{}",
            y.cols(),
            y.rows(),
            y.channels(),
            uv.cols(),
            uv.rows(),
            uv.channels()
        )));
    }
    let chroma = uv.reshape(1, uv.rows())?.try_clone()?;
    let planes = Vector::<Mat>::from_iter([y.try_clone()?, chroma]);
    let mut stacked = Mat::default();
    core::vconcat(&planes, &mut stacked)?;
    cvt_color(&stacked, code, 0)
}

/// Kernel length OpenCV derives from sigma when the size is left at zero.
fn gaussian_len(sigma: f64, depth: i32) -> i32 {
    let radius = if depth == core::CV_8U { 3.0 } else { 4.0 };
    (((sigma * radius * 2.0 + 1.0).round() as i32) | 1).max(1)
}

/// Gaussian blur. The common case of a derived `sigma_y` and the default
/// border goes straight to the native call; anything else is rebuilt as a
/// separable filter with the same kernels.
pub fn gaussian_blur(
    src: &Mat,
    ksize: Size,
    sigma_x: f64,
    sigma_y: f64,
    border_type: i32,
) -> BridgeResult<Mat> {
    let mut out = Mat::default();
    if sigma_y == 0.0 && border_type == core::BORDER_DEFAULT {
        imgproc::gaussian_blur_def(src, &mut out, ksize, sigma_x)?;
        return Ok(out);
    }
    let sigma_y = if sigma_y > 0.0 { sigma_y } else { sigma_x };
    let kx = if ksize.width > 0 { ksize.width } else { gaussian_len(sigma_x, src.depth()) };
    let ky = if ksize.height > 0 { ksize.height } else { gaussian_len(sigma_y, src.depth()) };
    let kernel_x = imgproc::get_gaussian_kernel(kx, sigma_x, core::CV_64F)?;
    let kernel_y = imgproc::get_gaussian_kernel(ky, sigma_y, core::CV_64F)?;
    imgproc::sep_filter_2d(
        src,
        &mut out,
        -1,
        &kernel_x,
        &kernel_y,
        Point::new(-1, -1),
        0.0,
        border_type,
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::mat;

    #[test]
    fn bgr_to_gray_uses_luma_weights() {
        let red = mat::from_bytes(1, 1, 3, &[0, 0, 255]).unwrap();
        let gray = cvt_color(&red, imgproc::COLOR_BGR2GRAY, 0).unwrap();
        assert_eq!(gray.channels(), 1);
        assert_eq!(mat::to_u8_vec(&gray).unwrap(), vec![76]);
        assert!(cvt_color(&red, imgproc::COLOR_BGR2GRAY, 3).is_err());
    }

    #[test]
    fn two_plane_nv12_matches_flat_gray() {
        let y = mat::from_bytes(2, 2, 1, &[128; 4]).unwrap();
        let uv = mat::from_bytes(1, 1, 2, &[128, 128]).unwrap();
        let bgr = cvt_color_two_plane(&y, &uv, imgproc::COLOR_YUV2BGR_NV12).unwrap();
        assert_eq!((bgr.rows(), bgr.cols(), bgr.channels()), (2, 2, 3));
        let px = mat::to_u8_vec(&bgr).unwrap();
        assert!(px.windows(2).all(|w| w[0] == w[1]));
        assert!(cvt_color_two_plane(&uv, &y, imgproc::COLOR_YUV2BGR_NV12).is_err());
    }

    #[test]
    fn explicit_border_blur_keeps_flat_images_flat() {
        let flat = mat::from_bytes(4, 4, 1, &[50; 16]).unwrap();
        let out = gaussian_blur(&flat, Size::new(3, 3), 1.0, 2.0, core::BORDER_REPLICATE).unwrap();
        assert_eq!(mat::to_u8_vec(&out).unwrap(), vec![50; 16]);
        let derived = gaussian_blur(&flat, Size::new(0, 0), 1.5, 0.0, core::BORDER_DEFAULT).unwrap();
        assert_eq!(mat::to_u8_vec(&derived).unwrap(), vec![50; 16]);
    }
}
