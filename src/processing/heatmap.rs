//! Composite helpers used by model post-processing: pasting patches and
//! collapsing multi-channel score maps into one heat map.

use opencv::core::{self, Mat, Rect, Vector};
use opencv::prelude::*;

use crate::utils::{BridgeError, BridgeResult};

fn intersect(a: Rect, b: Rect) -> Rect {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = (a.x as i64 + a.width as i64).min(b.x as i64 + b.width as i64);
    let y1 = (a.y as i64 + a.height as i64).min(b.y as i64 + b.height as i64);
    if x1 <= x0 as i64 || y1 <= y0 as i64 {
        return Rect::default();
    }
    Rect::new(x0, y0, (x1 - x0 as i64) as i32, (y1 - y0 as i64) as i32)
}

/// Copies `src` into `dst` at `rect`, keeping whichever value is larger per
/// element. The region is clipped to both mats.
pub fn copy_to_by_rect(src: &Mat, dst: &mut Mat, rect: Rect) -> BridgeResult<()> {
    if src.typ() != dst.typ() {
        return Err(BridgeError::processing(format!(
            "copyToByRect needs matching types, got {} and {}",
            src.typ(),
            dst.typ()
        )));
    }
    let window = intersect(
        intersect(rect, Rect::new(0, 0, dst.cols(), dst.rows())),
        Rect::new(rect.x, rect.y, src.cols(), src.rows()),
    );
    if window.width == 0 || window.height == 0 {
        return Ok(());
    }
    let patch = Mat::roi(
        src,
        Rect::new(window.x - rect.x, window.y - rect.y, window.width, window.height),
    )?;
    let under = Mat::roi(dst, window)?.try_clone()?;
    let mut merged = Mat::default();
    core::max(&*patch, &under, &mut merged)?;
    let mut target = Mat::roi_mut(dst, window)?;
    merged.copy_to(&mut *target)?;
    Ok(())
}

/// Places a single-channel map in the red plane of an 8-bit BGR image.
pub fn gray_to_red_heatmap(src: &Mat) -> BridgeResult<Mat> {
    if src.channels() != 1 {
        return Err(BridgeError::processing(format!(
            "grayScaleToRedHeatmap needs one channel, got {}",
            src.channels()
        )));
    }
    let mut red = Mat::default();
    src.convert_to(&mut red, core::CV_8U, 1.0, 0.0)?;
    let blank = Mat::zeros(red.rows(), red.cols(), core::CV_8UC1)?.to_mat()?;
    let planes = Vector::<Mat>::from_iter([blank.try_clone()?, blank, red]);
    let mut out = Mat::default();
    core::merge(&planes, &mut out)?;
    Ok(out)
}

/// Splits into `F32` planes, each rescaled to `[0, 1]` by its own range when
/// `normalize` is set. Flat planes become zero.
fn float_planes(src: &Mat, normalize: bool) -> BridgeResult<Vec<Mat>> {
    let mut planes = Vector::<Mat>::new();
    core::split(src, &mut planes)?;
    planes
        .iter()
        .map(|plane| {
            let (alpha, beta) = if normalize {
                let (mut lo, mut hi) = (0.0, 0.0);
                core::min_max_loc(&plane, Some(&mut lo), Some(&mut hi), None, None, &core::no_array())?;
                let range = hi - lo;
                if range > 0.0 { (1.0 / range, -lo / range) } else { (0.0, 0.0) }
            } else {
                (1.0, 0.0)
            };
            let mut out = Mat::default();
            plane.convert_to(&mut out, core::CV_32F, alpha, beta)?;
            Ok(out)
        })
        .collect()
}

fn max_across(planes: Vec<Mat>) -> BridgeResult<Mat> {
    let mut planes = planes.into_iter();
    let Some(mut peak) = planes.next() else {
        return Ok(Mat::default());
    };
    for plane in planes {
        let mut next = Mat::default();
        core::max(&peak, &plane, &mut next)?;
        peak = next;
    }
    Ok(peak)
}

/// Per-channel min-max normalisation followed by a per-pixel maximum,
/// yielding a single-channel `F32` map.
pub fn min_max_norm(src: &Mat) -> BridgeResult<Mat> {
    max_across(float_planes(src, true)?)
}

/// Per-pixel channel maximum scaled to `[0, 255]` as an 8-bit map;
/// `make_norm` first normalises each channel by its own range.
pub fn heat_map_from_buffer(src: &Mat, make_norm: bool) -> BridgeResult<Mat> {
    let peak = max_across(float_planes(src, make_norm)?)?;
    let mut out = Mat::default();
    peak.convert_to(&mut out, core::CV_8U, 255.0, 0.0)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::mat::{self, Depth, MatType};

    fn scores() -> Mat {
        mat::from_values(1, 3, MatType::new(Depth::F32, 2), &[0.0, 2.0, 1.0, 4.0, 2.0, 6.0]).unwrap()
    }

    #[test]
    fn paste_keeps_the_brighter_pixel_and_clips() {
        let mut dst = mat::zeros(3, 3, MatType::new(Depth::U8, 1)).unwrap();
        *dst.at_2d_mut::<u8>(2, 2).unwrap() = 200;
        let patch = mat::from_bytes(2, 2, 1, &[100; 4]).unwrap();
        copy_to_by_rect(&patch, &mut dst, Rect::new(2, 2, 2, 2)).unwrap();
        assert_eq!(*dst.at_2d::<u8>(2, 2).unwrap(), 200);
        copy_to_by_rect(&patch, &mut dst, Rect::new(0, 0, 2, 2)).unwrap();
        assert_eq!(*dst.at_2d::<u8>(1, 1).unwrap(), 100);
        assert_eq!(*dst.at_2d::<u8>(1, 2).unwrap(), 0);
    }

    #[test]
    fn red_heatmap_fills_last_plane() {
        let gray = mat::from_bytes(1, 2, 1, &[9, 40]).unwrap();
        let out = gray_to_red_heatmap(&gray).unwrap();
        assert_eq!(mat::to_u8_vec(&out).unwrap(), vec![0, 0, 9, 0, 0, 40]);
    }

    #[test]
    fn min_max_norm_takes_channel_peak() {
        let out = min_max_norm(&scores()).unwrap();
        assert_eq!(out.typ(), core::CV_32FC1);
        assert_eq!(mat::to_f32_vec(&out).unwrap(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn heat_map_scales_and_saturates() {
        let raw = heat_map_from_buffer(&scores(), false).unwrap();
        assert_eq!(mat::to_u8_vec(&raw).unwrap(), vec![255, 255, 255]);
        let normed = heat_map_from_buffer(&scores(), true).unwrap();
        assert_eq!(normed.typ(), core::CV_8UC1);
        assert_eq!(mat::to_u8_vec(&normed).unwrap(), vec![0, 128, 255]);
    }
}
