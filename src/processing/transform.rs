//! Rotation helpers composed from the native affine warp.

use opencv::core::{self, Mat, Point2f, Scalar, Size};
use opencv::imgproc;
use opencv::prelude::*;

use crate::processing::mat::ensure_not_empty;
use crate::utils::{BridgeError, BridgeResult};

fn shift_translation(m: &mut Mat, dx: f64, dy: f64) -> BridgeResult<()> {
    *m.at_2d_mut::<f64>(0, 2)? += dx;
    *m.at_2d_mut::<f64>(1, 2)? += dy;
    Ok(())
}

fn warp_linear(src: &Mat, m: &Mat, width: i32, height: i32) -> BridgeResult<Mat> {
    if width <= 0 || height <= 0 {
        return Err(BridgeError::processing(format!(
            "Warp target of {width}x{height} is empty"
        )));
    }
    let mut out = Mat::default();
    imgproc::warp_affine(
        src,
        &mut out,
        m,
        Size::new(width, height),
        imgproc::INTER_LINEAR,
        core::BORDER_CONSTANT,
        Scalar::default(),
    )?;
    Ok(out)
}

/// Rotates about the image centre, growing the canvas so no corner is cut.
pub fn rotate_bound(src: &Mat, angle: f64, scale: f64) -> BridgeResult<Mat> {
    ensure_not_empty(src, "rotateBound")?;
    let (width, height) = (src.cols() as f64, src.rows() as f64);
    let radians = angle.to_radians();
    let (cos, sin) = (radians.cos().abs(), radians.sin().abs());
    let new_width = ((height * sin + width * cos) * scale) as i32;
    let new_height = ((height * cos + width * sin) * scale) as i32;
    let center = Point2f::new((width / 2.0) as f32, (height / 2.0) as f32);
    let mut rotation = imgproc::get_rotation_matrix_2d(center, angle, scale)?;
    shift_translation(
        &mut rotation,
        new_width as f64 / 2.0 - center.x as f64,
        new_height as f64 / 2.0 - center.y as f64,
    )?;
    warp_linear(src, &rotation, new_width, new_height)
}

/// Rotates and scales about `eye`, then moves `eye` to the centre of a
/// `width x height` output.
pub fn crop_and_align(
    src: &Mat,
    width: i32,
    height: i32,
    eye: Point2f,
    scale: f64,
    angle: f64,
) -> BridgeResult<Mat> {
    ensure_not_empty(src, "cropAndAlign")?;
    let mut rotation = imgproc::get_rotation_matrix_2d(eye, angle, scale)?;
    shift_translation(
        &mut rotation,
        width as f64 / 2.0 - eye.x as f64,
        height as f64 / 2.0 - eye.y as f64,
    )?;
    warp_linear(src, &rotation, width, height)
}
