//! Executes a parsed [`Call`] against the object store.
//!
//! Inputs are read through shared borrows and each native operation writes
//! into a fresh result; only then is the destination handle overwritten.
//! Drawing verbs paint into the stored image in place.

use std::ops::Deref;

use opencv::core::{self, Mat, Point, Point2f, Rect, RotatedRect, Scalar, Size, Vector};
use opencv::imgproc;
use opencv::prelude::*;
use tracing::{debug, warn};

use crate::core::{Outcome, WrappedValue};
use crate::dispatch::args::{Arg, Args};
use crate::dispatch::call::{BitwiseOp, Call, Curve, Curves, MathOp, MorphOp, Source};
use crate::dispatch::verb::Verb;
use crate::processing::mat::{self, Depth, MatType};
use crate::processing::{compat, heatmap, transform};
use crate::store::{Handle, ObjectKind, ObjectStore, Storable, StoredValue};
use crate::utils::{BridgeError, BridgeResult};

/// Resolves `verb`, validates `args` and runs exactly one operation.
pub fn invoke(store: &mut ObjectStore, verb: &str, args: &[Arg]) -> BridgeResult<Outcome> {
    let resolved = Verb::resolve(verb).inspect_err(|_| warn!("Rejected unknown verb '{}'", verb))?;
    let call = Call::parse(resolved, &Args::new(resolved.name(), args))?;
    debug!("Dispatching {} with {} argument(s)", resolved.name(), args.len());
    execute(store, call).inspect_err(|e| warn!("{} failed: {}", resolved.name(), e))
}

/// A value borrowed from the store, or one assembled for a single call.
enum Input<'a, T> {
    Stored(&'a T),
    Built(T),
}

impl<T> Deref for Input<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Self::Stored(v) => v,
            Self::Built(v) => v,
        }
    }
}

fn mat<'s>(store: &'s ObjectStore, handle: &Handle) -> BridgeResult<&'s Mat> {
    store.get::<Mat>(handle)
}

fn mats<'s>(store: &'s ObjectStore, handle: &Handle) -> BridgeResult<&'s Vector<Mat>> {
    store.get::<Vector<Mat>>(handle)
}

fn opt_mat<'s>(store: &'s ObjectStore, handle: Option<Handle>) -> BridgeResult<Option<&'s Mat>> {
    handle.map(|h| store.get::<Mat>(&h)).transpose()
}

/// An optional mat argument; absent means the native empty array.
fn mat_or_empty(store: &ObjectStore, handle: Option<Handle>) -> BridgeResult<Input<'_, Mat>> {
    Ok(match opt_mat(store, handle)? {
        Some(m) => Input::Stored(m),
        None => Input::Built(Mat::default()),
    })
}

fn point(store: &ObjectStore, handle: &Handle) -> BridgeResult<Point> {
    store.get::<Point>(handle).copied()
}

/// Anchor at the kernel centre unless one is given.
fn anchor(store: &ObjectStore, handle: Option<Handle>) -> BridgeResult<Point> {
    Ok(handle.map(|h| point(store, &h)).transpose()?.unwrap_or(Point::new(-1, -1)))
}

fn scalar(store: &ObjectStore, handle: &Handle) -> BridgeResult<Scalar> {
    store.get::<Scalar>(handle).copied()
}

fn size(store: &ObjectStore, handle: &Handle) -> BridgeResult<Size> {
    store.get::<Size>(handle).copied()
}

/// Runs one native call into a fresh output mat.
fn native(op: impl FnOnce(&mut Mat) -> opencv::Result<()>) -> BridgeResult<Mat> {
    let mut out = Mat::default();
    op(&mut out)?;
    Ok(out)
}

/// Runs a masked native call. With a mask the current destination is the
/// starting point, so pixels outside the mask keep their values.
fn masked(
    store: &ObjectStore,
    dst: &Handle,
    mask: Option<Handle>,
    op: impl FnOnce(&mut Mat, &Mat) -> opencv::Result<()>,
) -> BridgeResult<Mat> {
    let mut out = match mask {
        Some(_) => mat(store, dst)?.try_clone()?,
        None => Mat::default(),
    };
    let mask = mat_or_empty(store, mask)?;
    op(&mut out, &mask)?;
    Ok(out)
}

fn write(store: &mut ObjectStore, dst: &Handle, result: Mat) -> BridgeResult<Outcome> {
    store.replace(dst, StoredValue::Mat(result))?;
    Ok(Outcome::Unit)
}

fn save<T: Storable>(store: &mut ObjectStore, value: T) -> BridgeResult<Outcome> {
    let handle = store.save(value)?;
    Ok(Outcome::Wrapped(WrappedValue::wrap(T::KIND, handle)))
}

/// Stores a point mat as-is, or as a point vector when the destination
/// currently holds one.
fn write_points(store: &mut ObjectStore, dst: &Handle, points: Mat) -> BridgeResult<Outcome> {
    let value = match store.kind_of(dst)? {
        ObjectKind::PointVector => StoredValue::PointVector(Vector::from_iter(mat::to_points(&points)?)),
        _ => StoredValue::Mat(points),
    };
    store.replace(dst, value)?;
    Ok(Outcome::Unit)
}

/// Paints into the stored image. The image is moved out for the duration so
/// the other arguments stay readable, and is put back whatever the result.
fn paint(
    store: &mut ObjectStore,
    img: &Handle,
    op: impl FnOnce(&ObjectStore, &mut Mat) -> BridgeResult<()>,
) -> BridgeResult<Outcome> {
    let mut canvas = std::mem::take(store.get_mut::<Mat>(img)?);
    let painted = op(store, &mut canvas);
    *store.get_mut::<Mat>(img)? = canvas;
    painted.map(|()| Outcome::Unit)
}

fn vstack(parts: &Vector<Mat>) -> BridgeResult<Mat> {
    native(|out| core::vconcat(parts, out))
}

/// A mat source, with a vector source stacked vertically into one mat.
fn stacked(store: &ObjectStore, src: Source) -> BridgeResult<Input<'_, Mat>> {
    Ok(match src {
        Source::Mat(h) => Input::Stored(mat(store, &h)?),
        Source::Vector(h) => Input::Built(vstack(mats(store, &h)?)?),
    })
}

/// Row counts of the parts of a source, for splitting a stacked result.
fn heights(store: &ObjectStore, src: Source) -> BridgeResult<Vec<i32>> {
    Ok(match src {
        Source::Mat(h) => vec![mat(store, &h)?.rows()],
        Source::Vector(h) => mats(store, &h)?.iter().map(|m| m.rows()).collect(),
    })
}

/// Stores a stacked result whole, or split back into parts of `heights`
/// rows when the destination is a mat vector.
fn write_parts(store: &mut ObjectStore, dst: &Handle, out: Mat, heights: &[i32]) -> BridgeResult<()> {
    let value = match store.kind_of(dst)? {
        ObjectKind::MatVector => {
            let mut parts = Vector::<Mat>::new();
            let mut top = 0;
            for &rows in heights {
                parts.push(Mat::roi(&out, Rect::new(0, top, out.cols(), rows))?.try_clone()?);
                top += rows;
            }
            StoredValue::MatVector(parts)
        }
        _ => StoredValue::Mat(out),
    };
    store.replace(dst, value)
}

/// Applies an in-place native op to a mat, or to each mat of a vector.
fn update_each(store: &mut ObjectStore, target: Source, op: impl Fn(&mut Mat) -> opencv::Result<()>) -> BridgeResult<()> {
    let (handle, value) = match target {
        Source::Mat(h) => {
            let mut m = mat(store, &h)?.try_clone()?;
            op(&mut m)?;
            (h, StoredValue::Mat(m))
        }
        Source::Vector(h) => {
            let mut updated = Vector::<Mat>::new();
            for part in mats(store, &h)?.iter() {
                let mut m = part.try_clone()?;
                op(&mut m)?;
                updated.push(m);
            }
            (h, StoredValue::MatVector(updated))
        }
    };
    store.replace(&handle, value)
}

/// A curve as one point mat; a vector of point mats is read back to back.
fn curve_of(store: &ObjectStore, curve: Curve) -> BridgeResult<Input<'_, Mat>> {
    Ok(match curve {
        Curve::Mat(h) => Input::Stored(mat(store, &h)?),
        Curve::Points(h) => Input::Built(mat::from_points(store.get::<Vector<Point>>(&h)?.to_vec())?),
        Curve::Mats(h) => Input::Built(vstack(mats(store, &h)?)?),
    })
}

fn curves_of(store: &ObjectStore, curves: Curves) -> BridgeResult<Input<'_, Vector<Mat>>> {
    Ok(match curves {
        Curves::Mats(h) => Input::Stored(mats(store, &h)?),
        Curves::Points(h) => {
            let single = mat::from_points(store.get::<Vector<Point>>(&h)?.to_vec())?;
            Input::Built(Vector::from_iter([single]))
        }
    })
}

/// Statistics land in a scalar destination as a scalar, or in a mat
/// destination as the native `channels x 1` `F64` column.
fn stat_value(store: &ObjectStore, dst: &Handle, column: Mat) -> BridgeResult<StoredValue> {
    Ok(match store.kind_of(dst)? {
        ObjectKind::Scalar => {
            let mut value = Scalar::default();
            for (slot, v) in value.0.iter_mut().zip(column.data_typed::<f64>()?) {
                *slot = *v;
            }
            StoredValue::Scalar(value)
        }
        _ => StoredValue::Mat(column),
    })
}

pub fn execute(store: &mut ObjectStore, call: Call) -> BridgeResult<Outcome> {
    match call {
        Call::Absdiff { a, b, dst } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = native(|out| core::absdiff(a, b, out))?;
            write(store, &dst, out)
        }
        Call::Add { a, b, dst, mask, dtype } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = masked(store, &dst, mask, |out, m| core::add(a, b, out, m, dtype.unwrap_or(-1)))?;
            write(store, &dst, out)
        }
        Call::Subtract { a, b, dst, mask, dtype } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = masked(store, &dst, mask, |out, m| core::subtract(a, b, out, m, dtype.unwrap_or(-1)))?;
            write(store, &dst, out)
        }
        Call::AddWeighted { a, alpha, b, beta, gamma, dst, dtype } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = native(|out| core::add_weighted(a, alpha, b, beta, gamma, out, dtype.unwrap_or(-1)))?;
            write(store, &dst, out)
        }
        Call::BatchDistance { a, b, dist, dtype, nidx, norm_type, k, mask, update, crosscheck } => {
            let (dist_out, nidx_out) = {
                let (a, b) = (mat(store, &a)?, mat(store, &b)?);
                let mask = mat_or_empty(store, mask)?;
                // A non-zero update reads the previous results back in.
                let (mut d, mut n) = if update != 0 {
                    (mat(store, &dist)?.try_clone()?, mat(store, &nidx)?.try_clone()?)
                } else {
                    (Mat::default(), Mat::default())
                };
                core::batch_distance(a, b, &mut d, dtype, &mut n, norm_type, k, &*mask, update, crosscheck)?;
                (d, n)
            };
            store.replace(&dist, StoredValue::Mat(dist_out))?;
            write(store, &nidx, nidx_out)
        }
        Call::Multiply { a, b, dst, scale, dtype } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = native(|out| core::multiply(a, b, out, scale, dtype.unwrap_or(-1)))?;
            write(store, &dst, out)
        }
        Call::Divide { a, b, dst, scale, dtype } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = native(|out| core::divide2(a, b, out, scale, dtype.unwrap_or(-1)))?;
            write(store, &dst, out)
        }
        Call::ScaleAdd { a, alpha, b, dst } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = native(|out| core::scale_add(a, alpha, b, out))?;
            write(store, &dst, out)
        }
        Call::Bitwise { op, a, b, dst, mask } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = masked(store, &dst, mask, |out, m| match op {
                BitwiseOp::And => core::bitwise_and(a, b, out, m),
                BitwiseOp::Or => core::bitwise_or(a, b, out, m),
                BitwiseOp::Xor => core::bitwise_xor(a, b, out, m),
            })?;
            write(store, &dst, out)
        }
        Call::BitwiseNot { src, dst, mask } => {
            let src = mat(store, &src)?;
            let out = masked(store, &dst, mask, |out, m| core::bitwise_not(src, out, m))?;
            write(store, &dst, out)
        }
        Call::BorderInterpolate { p, len, border_type } => {
            Ok(Outcome::Value(core::border_interpolate(p, len, border_type)? as f64))
        }
        Call::CalcCovarMatrix { samples, nsamples, covar, mean, flags, ctype } => {
            let (covar_out, mean_out) = {
                let all = mats(store, &samples)?;
                if nsamples < 0 || nsamples as usize > all.len() {
                    return Err(BridgeError::processing(format!(
                        "calcCovarMatrix asked for {nsamples} of {} sample(s)",
                        all.len()
                    )));
                }
                let picked: Vector<Mat> = all.iter().take(nsamples as usize).collect();
                let mut mean_out = mat(store, &mean)?.try_clone()?;
                let mut covar_out = Mat::default();
                core::calc_covar_matrix(&picked, &mut covar_out, &mut mean_out, flags, ctype)?;
                (covar_out, mean_out)
            };
            store.replace(&covar, StoredValue::Mat(covar_out))?;
            write(store, &mean, mean_out)
        }
        Call::CartToPolar { x, y, magnitude, angle, degrees } => {
            let (mag, ang, rows) = {
                let (xs, ys) = (stacked(store, x)?, stacked(store, y)?);
                let (mut mag, mut ang) = (Mat::default(), Mat::default());
                core::cart_to_polar(&*xs, &*ys, &mut mag, &mut ang, degrees)?;
                (mag, ang, heights(store, x)?)
            };
            write_parts(store, &magnitude, mag, &rows)?;
            write_parts(store, &angle, ang, &rows)?;
            Ok(Outcome::Unit)
        }
        Call::CheckRange { src, quiet, pos, min_val, max_val } => {
            let mut at = Point::default();
            let in_range = match src {
                Source::Mat(h) => core::check_range(mat(store, &h)?, quiet, &mut at, min_val, max_val)?,
                Source::Vector(h) => core::check_range(mats(store, &h)?, quiet, &mut at, min_val, max_val)?,
            };
            if let Some(pos) = pos {
                store.replace(&pos, StoredValue::Point(at))?;
            }
            Ok(Outcome::Flag(in_range))
        }
        Call::Compare { a, b, dst, cmpop } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = native(|out| core::compare(a, b, out, cmpop))?;
            write(store, &dst, out)
        }
        Call::CompleteSymm { target, lower_to_upper } => {
            update_each(store, target, |m| core::complete_symm(m, lower_to_upper))?;
            Ok(Outcome::Unit)
        }
        Call::ConvertFp16 { src, dst } => {
            let src = mat(store, &src)?;
            let rtype = match Depth::from_code(src.depth()) {
                Some(Depth::F32) => core::CV_16F,
                Some(Depth::F16) => core::CV_32F,
                _ => {
                    return Err(BridgeError::processing(format!(
                        "convertFp16 needs a F32 or F16 mat, got depth {}",
                        src.depth()
                    )));
                }
            };
            let out = native(|out| src.convert_to(out, rtype, 1.0, 0.0))?;
            write(store, &dst, out)
        }
        Call::ConvertScaleAbs { src, dst, alpha, beta } => {
            let src = mat(store, &src)?;
            let out = native(|out| core::convert_scale_abs(src, out, alpha, beta))?;
            write(store, &dst, out)
        }
        Call::CopyMakeBorder { src, dst, top, bottom, left, right, border_type, value } => {
            let value = value.map(|h| scalar(store, &h)).transpose()?.unwrap_or_default();
            let src = mat(store, &src)?;
            let out = native(|out| core::copy_make_border(src, out, top, bottom, left, right, border_type, value))?;
            write(store, &dst, out)
        }
        Call::CopyTo { src, dst, mask } => {
            let src = mat(store, &src)?;
            let out = masked(store, &dst, mask, |out, m| src.copy_to_masked(out, m))?;
            write(store, &dst, out)
        }
        Call::CountNonZero { src } => {
            let total = match src {
                Source::Mat(h) => core::count_non_zero(mat(store, &h)?)? as i64,
                Source::Vector(h) => {
                    let mut total = 0i64;
                    for m in mats(store, &h)?.iter() {
                        total += core::count_non_zero(&m)? as i64;
                    }
                    total
                }
            };
            Ok(Outcome::Value(total as f64))
        }
        Call::Dct { src, dst, flags } => {
            let src = mat(store, &src)?;
            let out = native(|out| core::dct(src, out, flags))?;
            write(store, &dst, out)
        }
        Call::Dft { inverse, src, dst, flags, nonzero_rows } => {
            let src = mat(store, &src)?;
            let out = if inverse {
                native(|out| core::idft(src, out, flags, nonzero_rows))?
            } else {
                native(|out| core::dft(src, out, flags, nonzero_rows))?
            };
            write(store, &dst, out)
        }
        Call::Determinant { src } => Ok(Outcome::Value(core::determinant(mat(store, &src)?)?)),
        Call::Eigen { symmetric, src, values, vectors } => {
            let src = mat(store, &src)?;
            let (mut vals, mut vecs) = (Mat::default(), Mat::default());
            let outcome = if symmetric {
                Outcome::Flag(core::eigen(src, &mut vals, &mut vecs)?)
            } else {
                core::eigen_non_symmetric(src, &mut vals, &mut vecs)?;
                Outcome::Unit
            };
            store.replace(&values, StoredValue::Mat(vals))?;
            store.replace(&vectors, StoredValue::Mat(vecs))?;
            Ok(outcome)
        }
        Call::Math { op, src, dst } => {
            let src = mat(store, &src)?;
            let out = native(|out| match op {
                MathOp::Exp => core::exp(src, out),
                MathOp::Log => core::log(src, out),
                MathOp::Sqrt => core::sqrt(src, out),
            })?;
            write(store, &dst, out)
        }
        Call::Pow { src, power, dst } => {
            let src = mat(store, &src)?;
            let out = native(|out| core::pow(src, power, out))?;
            write(store, &dst, out)
        }
        Call::Magnitude { x, y, dst } => {
            let out = {
                let (xs, ys) = (stacked(store, x)?, stacked(store, y)?);
                native(|out| core::magnitude(&*xs, &*ys, out))?
            };
            write(store, &dst, out)
        }
        Call::Phase { x, y, angle, degrees } => {
            let (out, rows) = {
                let (xs, ys) = (stacked(store, x)?, stacked(store, y)?);
                (native(|out| core::phase(&*xs, &*ys, out, degrees))?, heights(store, x)?)
            };
            write_parts(store, &angle, out, &rows)?;
            Ok(Outcome::Unit)
        }
        Call::Mahalanobis { a, b, icovar } => {
            let (va, vb) = (stacked(store, a)?, stacked(store, b)?);
            Ok(Outcome::Value(core::mahalanobis(&*va, &*vb, mat(store, &icovar)?)?))
        }
        Call::ExtractChannel { src, dst, coi } => {
            let src = mat(store, &src)?;
            let out = native(|out| core::extract_channel(src, out, coi))?;
            write(store, &dst, out)
        }
        Call::InsertChannel { src, dst, coi } => {
            let mut out = mat(store, &dst)?.try_clone()?;
            core::insert_channel(mat(store, &src)?, &mut out, coi)?;
            write(store, &dst, out)
        }
        Call::FindNonZero { src, dst } => {
            let src = mat(store, &src)?;
            let out = native(|out| core::find_non_zero(src, out))?;
            write_points(store, &dst, out)
        }
        Call::Flip { src, dst, flip_code } => {
            let src = mat(store, &src)?;
            let out = native(|out| core::flip(src, out, flip_code))?;
            write(store, &dst, out)
        }
        Call::Gemm { a, b, alpha, c, beta, dst, flags } => {
            let out = {
                let (a, b) = (mat(store, &a)?, mat(store, &b)?);
                let c = mat_or_empty(store, c)?;
                native(|out| core::gemm(a, b, alpha, &*c, beta, out, flags))?
            };
            write(store, &dst, out)
        }
        Call::GetOptimalDftSize { vecsize } => Ok(Outcome::Value(core::get_optimal_dft_size(vecsize)? as f64)),
        Call::Concat { horizontal, srcs, dst } => {
            let parts = mats(store, &srcs)?;
            let out = if horizontal {
                native(|out| core::hconcat(parts, out))?
            } else {
                vstack(parts)?
            };
            write(store, &dst, out)
        }
        Call::InRange { src, lower, upper, dst } => {
            let (lower, upper) = (scalar(store, &lower)?, scalar(store, &upper)?);
            let src = mat(store, &src)?;
            let out = native(|out| core::in_range(src, &lower, &upper, out))?;
            write(store, &dst, out)
        }
        Call::Invert { src, dst, flags } => {
            let src = mat(store, &src)?;
            let mut out = Mat::default();
            let result = core::invert(src, &mut out, flags)?;
            write(store, &dst, out)?;
            Ok(Outcome::Value(result))
        }
        Call::Lut { src, table, dst } => {
            let (src, table) = (mat(store, &src)?, mat(store, &table)?);
            let out = native(|out| core::lut(src, table, out))?;
            write(store, &dst, out)
        }
        Call::Extremum { max, a, b, dst } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = if max {
                native(|out| core::max(a, b, out))?
            } else {
                native(|out| core::min(a, b, out))?
            };
            write(store, &dst, out)
        }
        Call::Mean { src, mask } => {
            let value = {
                let mask = mat_or_empty(store, mask)?;
                core::mean(mat(store, &src)?, &*mask)?
            };
            save(store, value)
        }
        Call::MeanStdDev { src, mean, stddev, mask } => {
            let (mean_value, stddev_value) = {
                let mask = mat_or_empty(store, mask)?;
                let (mut m, mut s) = (Mat::default(), Mat::default());
                core::mean_std_dev(mat(store, &src)?, &mut m, &mut s, &*mask)?;
                (stat_value(store, &mean, m)?, stat_value(store, &stddev, s)?)
            };
            store.replace(&mean, mean_value)?;
            store.replace(&stddev, stddev_value)?;
            Ok(Outcome::Unit)
        }
        Call::MinMaxLoc { src, mask } => {
            let mask = mat_or_empty(store, mask)?;
            let (mut lo, mut hi) = (0.0, 0.0);
            core::min_max_loc(mat(store, &src)?, Some(&mut lo), Some(&mut hi), None, None, &*mask)?;
            Ok(Outcome::Fields(vec![("minVal", lo), ("maxVal", hi)]))
        }
        Call::MulSpectrums { a, b, dst, flags, conj_b } => {
            let (a, b) = (mat(store, &a)?, mat(store, &b)?);
            let out = native(|out| core::mul_spectrums(a, b, out, flags, conj_b))?;
            write(store, &dst, out)
        }
        Call::MulTransposed { src, dst, a_ta, delta, scale, dtype } => {
            let out = {
                let src = mat(store, &src)?;
                let delta = mat_or_empty(store, delta)?;
                native(|out| core::mul_transposed(src, out, a_ta, &*delta, scale, dtype))?
            };
            write(store, &dst, out)
        }
        Call::Norm { src, norm_type, mask } => {
            let mask = mat_or_empty(store, mask)?;
            let n = core::norm(mat(store, &src)?, norm_type, &*mask)?;
            Ok(Outcome::Fields(vec![("norm", n)]))
        }
        Call::Normalize { src, dst, alpha, norm_type, beta, dtype } => {
            let src = mat(store, &src)?;
            let out = native(|out| {
                core::normalize(src, out, alpha, beta, norm_type, dtype.unwrap_or(-1), &Mat::default())
            })?;
            write(store, &dst, out)
        }
        Call::PatchNans { target, value } => {
            update_each(store, target, |m| core::patch_na_ns(m, value))?;
            Ok(Outcome::Unit)
        }
        Call::PerspectiveTransform { src, dst, m } => {
            let (src, m) = (mat(store, &src)?, mat(store, &m)?);
            let out = native(|out| core::perspective_transform(src, out, m))?;
            write(store, &dst, out)
        }
        Call::Psnr { a, b, r } => {
            let value = core::psnr(mat(store, &a)?, mat(store, &b)?, r)?;
            Ok(Outcome::Fields(vec![("psnr", value)]))
        }
        Call::Reduce { src, dst, dim, rtype, dtype } => {
            let src = mat(store, &src)?;
            let out = native(|out| core::reduce(src, out, dim, rtype, dtype))?;
            write(store, &dst, out)
        }
        Call::Repeat { src, ny, nx, dst } => {
            let src = mat(store, &src)?;
            let out = native(|out| core::repeat(src, ny, nx, out))?;
            write(store, &dst, out)
        }
        Call::Solve { a, b, dst, flags } => {
            let mut out = Mat::default();
            let resolved = core::solve(mat(store, &a)?, mat(store, &b)?, &mut out, flags)?;
            write(store, &dst, out)?;
            Ok(Outcome::NamedFlag("resolved", resolved))
        }
        Call::SolveCubic { coeffs, roots } => {
            let mut out = Mat::default();
            let found = core::solve_cubic(mat(store, &coeffs)?, &mut out)?;
            write(store, &roots, out)?;
            Ok(Outcome::Value(found as f64))
        }
        Call::SolvePoly { coeffs, roots, max_iters } => {
            let mut out = Mat::default();
            let residual = core::solve_poly(mat(store, &coeffs)?, &mut out, max_iters)?;
            write(store, &roots, out)?;
            Ok(Outcome::Value(residual))
        }
        Call::Sort { indices, src, dst, flags } => {
            let src = mat(store, &src)?;
            let out = if indices {
                native(|out| core::sort_idx(src, out, flags))?
            } else {
                native(|out| core::sort(src, out, flags))?
            };
            write(store, &dst, out)
        }
        Call::Split { src, dst } => {
            let mut planes = Vector::<Mat>::new();
            core::split(mat(store, &src)?, &mut planes)?;
            store.replace(&dst, StoredValue::MatVector(planes))?;
            Ok(Outcome::Unit)
        }
        Call::Merge { srcs, dst } => {
            let parts = mats(store, &srcs)?;
            let out = native(|out| core::merge(parts, out))?;
            write(store, &dst, out)
        }
        Call::Sum { src } => {
            let total = match src {
                Source::Mat(h) => core::sum_elems(mat(store, &h)?)?,
                Source::Vector(h) => {
                    let mut total = Scalar::default();
                    for m in mats(store, &h)?.iter() {
                        let part = core::sum_elems(&m)?;
                        for (slot, v) in total.0.iter_mut().zip(part.0) {
                            *slot += v;
                        }
                    }
                    total
                }
            };
            save(store, total)
        }
        Call::Trace { src } => {
            let value = core::trace(mat(store, &src)?)?;
            save(store, value)
        }
        Call::Transform { src, dst, m } => {
            let (src, m) = (mat(store, &src)?, mat(store, &m)?);
            let out = native(|out| core::transform(src, out, m))?;
            write(store, &dst, out)
        }
        Call::Transpose { src, dst } => {
            let src = mat(store, &src)?;
            let out = native(|out| core::transpose(src, out))?;
            write(store, &dst, out)
        }
        Call::ConvertTo { src, dst, rtype, alpha, beta } => {
            let src = mat(store, &src)?;
            let out = native(|out| src.convert_to(out, rtype, alpha, beta))?;
            write(store, &dst, out)
        }
        Call::Zeros { rows, cols, mat_type } => {
            let out = mat::zeros(rows as i64, cols as i64, MatType::from_code(mat_type)?)?;
            save(store, out)
        }
        Call::CvtColor { src, dst, code, dst_cn } => {
            let out = compat::cvt_color(mat(store, &src)?, code, dst_cn.unwrap_or(0))?;
            write(store, &dst, out)
        }
        Call::CvtColorTwoPlane { y, uv, dst, code } => {
            let out = compat::cvt_color_two_plane(mat(store, &y)?, mat(store, &uv)?, code)?;
            write(store, &dst, out)
        }
        Call::Demosaicing { src, dst, code, dst_cn } => {
            let out = compat::demosaicing(mat(store, &src)?, code, dst_cn.unwrap_or(0))?;
            write(store, &dst, out)
        }
        Call::ApplyColorMap { src, dst, colormap } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::apply_color_map(src, out, colormap))?;
            write(store, &dst, out)
        }
        Call::GrayScaleToRedHeatmap { src, dst } => {
            let out = heatmap::gray_to_red_heatmap(mat(store, &src)?)?;
            write(store, &dst, out)
        }
        Call::Line { img, p1, p2, color, stroke } => paint(store, &img, |s, canvas| {
            let (p1, p2, color) = (point(s, &p1)?, point(s, &p2)?, scalar(s, &color)?);
            imgproc::line(canvas, p1, p2, color, stroke.thickness, stroke.line_type, stroke.shift)?;
            Ok(())
        }),
        Call::ArrowedLine { img, p1, p2, color, stroke, tip_length } => paint(store, &img, |s, canvas| {
            let (p1, p2, color) = (point(s, &p1)?, point(s, &p2)?, scalar(s, &color)?);
            imgproc::arrowed_line(
                canvas,
                p1,
                p2,
                color,
                stroke.thickness,
                stroke.line_type,
                stroke.shift,
                tip_length,
            )?;
            Ok(())
        }),
        Call::Rectangle { img, p1, p2, color, stroke } => paint(store, &img, |s, canvas| {
            let (p1, p2, color) = (point(s, &p1)?, point(s, &p2)?, scalar(s, &color)?);
            imgproc::rectangle_points(canvas, p1, p2, color, stroke.thickness, stroke.line_type, stroke.shift)?;
            Ok(())
        }),
        Call::Circle { img, center, radius, color, stroke } => paint(store, &img, |s, canvas| {
            let (center, color) = (point(s, &center)?, scalar(s, &color)?);
            imgproc::circle(canvas, center, radius, color, stroke.thickness, stroke.line_type, stroke.shift)?;
            Ok(())
        }),
        Call::Ellipse { img, center, axes, angle, start_angle, end_angle, color, stroke } => {
            paint(store, &img, |s, canvas| {
                let (center, axes, color) = (point(s, &center)?, size(s, &axes)?, scalar(s, &color)?);
                imgproc::ellipse(
                    canvas,
                    center,
                    axes,
                    angle,
                    start_angle,
                    end_angle,
                    color,
                    stroke.thickness,
                    stroke.line_type,
                    stroke.shift,
                )?;
                Ok(())
            })
        }
        Call::DrawMarker { img, position, color, marker_type, marker_size, stroke } => {
            paint(store, &img, |s, canvas| {
                let (position, color) = (point(s, &position)?, scalar(s, &color)?);
                imgproc::draw_marker(
                    canvas,
                    position,
                    color,
                    marker_type,
                    marker_size,
                    stroke.thickness,
                    stroke.line_type,
                )?;
                Ok(())
            })
        }
        Call::ClipLine { size: bounds, p1, p2 } => {
            let bounds = size(store, &bounds)?;
            let (mut a, mut b) = (point(store, &p1)?, point(store, &p2)?);
            let visible = imgproc::clip_line(bounds, &mut a, &mut b)?;
            store.replace(&p1, StoredValue::Point(a))?;
            store.replace(&p2, StoredValue::Point(b))?;
            Ok(Outcome::Flag(visible))
        }
        Call::Polylines { img, curves, closed, color, stroke } => paint(store, &img, |s, canvas| {
            let (curves, color) = (curves_of(s, curves)?, scalar(s, &color)?);
            imgproc::polylines(
                canvas,
                &*curves,
                closed,
                color,
                stroke.thickness,
                stroke.line_type,
                stroke.shift,
            )?;
            Ok(())
        }),
        Call::FillPoly { img, curves, color, line_type, shift } => paint(store, &img, |s, canvas| {
            let (curves, color) = (curves_of(s, curves)?, scalar(s, &color)?);
            imgproc::fill_poly(canvas, &*curves, color, line_type, shift, Point::default())?;
            Ok(())
        }),
        Call::FillConvexPoly { img, curve, color, line_type, shift } => paint(store, &img, |s, canvas| {
            let (points, color) = (curve_of(s, curve)?, scalar(s, &color)?);
            imgproc::fill_convex_poly(canvas, &*points, color, line_type, shift)?;
            Ok(())
        }),
        Call::DrawContours { img, curves, index, color, stroke } => paint(store, &img, |s, canvas| {
            let (curves, color) = (curves_of(s, curves)?, scalar(s, &color)?);
            imgproc::draw_contours(
                canvas,
                &*curves,
                index,
                color,
                stroke.thickness,
                stroke.line_type,
                &Mat::default(),
                i32::MAX,
                Point::default(),
            )?;
            Ok(())
        }),
        Call::Canny { src, dst, threshold1, threshold2, aperture_size, l2_gradient } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::canny(src, out, threshold1, threshold2, aperture_size, l2_gradient))?;
            write(store, &dst, out)
        }
        Call::CornerHarris { src, dst, block_size, ksize, k, border_type } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::corner_harris(src, out, block_size, ksize, k, border_type))?;
            write(store, &dst, out)
        }
        Call::CornerMinEigenVal { src, dst, block_size, ksize, border_type } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::corner_min_eigen_val(src, out, block_size, ksize, border_type))?;
            write(store, &dst, out)
        }
        Call::GoodFeaturesToTrack {
            src,
            dst,
            max_corners,
            quality_level,
            min_distance,
            mask,
            block_size,
            use_harris,
            k,
        } => {
            let corners = {
                let src = mat(store, &src)?;
                let mask = mat_or_empty(store, mask)?;
                native(|out| {
                    imgproc::good_features_to_track(
                        src,
                        out,
                        max_corners,
                        quality_level,
                        min_distance,
                        &*mask,
                        block_size,
                        use_harris,
                        k,
                    )
                })?
            };
            write_points(store, &dst, corners)
        }
        Call::HoughCircles { src, dst, method, dp, min_dist, param1, param2, min_radius, max_radius } => {
            let src = mat(store, &src)?;
            let out = native(|out| {
                imgproc::hough_circles(src, out, method, dp, min_dist, param1, param2, min_radius, max_radius)
            })?;
            write(store, &dst, out)
        }
        Call::HoughLines { src, dst, rho, theta, threshold } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::hough_lines_def(src, out, rho, theta, threshold))?;
            write(store, &dst, out)
        }
        Call::HoughLinesP { src, dst, rho, theta, threshold, min_line_length, max_line_gap } => {
            let src = mat(store, &src)?;
            let out =
                native(|out| imgproc::hough_lines_p(src, out, rho, theta, threshold, min_line_length, max_line_gap))?;
            write(store, &dst, out)
        }
        Call::BilateralFilter { src, dst, d, sigma_color, sigma_space, border_type } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::bilateral_filter(src, out, d, sigma_color, sigma_space, border_type))?;
            write(store, &dst, out)
        }
        Call::BoxFilter { src, dst, ddepth, ksize, anchor: at, normalize, border_type } => {
            let (ksize, at) = (size(store, &ksize)?, anchor(store, at)?);
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::box_filter(src, out, ddepth, ksize, at, normalize, border_type))?;
            write(store, &dst, out)
        }
        Call::BuildPyramid { src, dst, max_level, border_type } => {
            let mut levels = Vector::<Mat>::new();
            imgproc::build_pyramid(mat(store, &src)?, &mut levels, max_level, border_type)?;
            store.replace(&dst, StoredValue::MatVector(levels))?;
            Ok(Outcome::Unit)
        }
        Call::Filter2D { src, dst, ddepth, kernel, anchor: at, delta, border_type } => {
            let at = anchor(store, at)?;
            let (src, kernel) = (mat(store, &src)?, mat(store, &kernel)?);
            let out = native(|out| imgproc::filter_2d(src, out, ddepth, kernel, at, delta, border_type))?;
            write(store, &dst, out)
        }
        Call::GaussianBlur { src, dst, ksize, sigma_x, sigma_y, border_type } => {
            let ksize = size(store, &ksize)?;
            let out = compat::gaussian_blur(mat(store, &src)?, ksize, sigma_x, sigma_y, border_type)?;
            write(store, &dst, out)
        }
        Call::GetGaborKernel { ksize, sigma, theta, lambd, gamma, psi, ktype } => {
            let kernel = imgproc::get_gabor_kernel(size(store, &ksize)?, sigma, theta, lambd, gamma, psi, ktype)?;
            save(store, kernel)
        }
        Call::GetGaussianKernel { ksize, sigma, ktype } => {
            let kernel = imgproc::get_gaussian_kernel(ksize, sigma, ktype)?;
            save(store, kernel)
        }
        Call::Laplacian { src, dst, ddepth, ksize, scale, delta, border_type } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::laplacian(src, out, ddepth, ksize, scale, delta, border_type))?;
            write(store, &dst, out)
        }
        Call::MedianBlur { src, dst, ksize } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::median_blur(src, out, ksize))?;
            write(store, &dst, out)
        }
        Call::Morphology { op, src, dst, kernel, anchor: at, iterations, border_type, border_value } => {
            let at = anchor(store, at)?;
            let border_value = match border_value {
                Some(h) => scalar(store, &h)?,
                None => imgproc::morphology_default_border_value()?,
            };
            let out = {
                let src = mat(store, &src)?;
                let kernel = mat_or_empty(store, kernel)?;
                native(|out| match op {
                    MorphOp::Erode => imgproc::erode(src, out, &*kernel, at, iterations, border_type, border_value),
                    MorphOp::Dilate => imgproc::dilate(src, out, &*kernel, at, iterations, border_type, border_value),
                    MorphOp::Ex(code) => {
                        imgproc::morphology_ex(src, out, code, &*kernel, at, iterations, border_type, border_value)
                    }
                })?
            };
            write(store, &dst, out)
        }
        Call::Threshold { src, dst, thresh, maxval, thresh_type } => {
            let mut out = Mat::default();
            let used = imgproc::threshold(mat(store, &src)?, &mut out, thresh, maxval, thresh_type)?;
            write(store, &dst, out)?;
            Ok(Outcome::Value(used))
        }
        Call::AdaptiveThreshold { src, dst, max_value, method, thresh_type, block_size, c } => {
            let src = mat(store, &src)?;
            let out =
                native(|out| imgproc::adaptive_threshold(src, out, max_value, method, thresh_type, block_size, c))?;
            write(store, &dst, out)
        }
        Call::DistanceTransform { src, dst, distance_type, mask_size, dst_type } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::distance_transform(src, out, distance_type, mask_size, dst_type))?;
            write(store, &dst, out)
        }
        Call::Integral { src, dst, sdepth } => {
            let src = mat(store, &src)?;
            let out = native(|out| imgproc::integral(src, out, sdepth))?;
            write(store, &dst, out)
        }
        Call::MatchTemplate { src, templ, dst, method, mask } => {
            let out = {
                let (src, templ) = (mat(store, &src)?, mat(store, &templ)?);
                let mask = mat_or_empty(store, mask)?;
                native(|out| imgproc::match_template(src, templ, out, method, &*mask))?
            };
            write(store, &dst, out)
        }
        Call::FindContours { src, dst, mode, method } => {
            let mut contours = Vector::<Mat>::new();
            imgproc::find_contours(mat(store, &src)?, &mut contours, mode, method, Point::default())?;
            debug!("findContours traced {} contour(s) in mode {}", contours.len(), mode);
            store.replace(&dst, StoredValue::MatVector(contours))?;
            Ok(Outcome::Unit)
        }
        Call::BoundingRect { curve } => {
            let rect: Rect = imgproc::bounding_rect(&*curve_of(store, curve)?)?;
            save(store, rect)
        }
        Call::ContourArea { curve, oriented } => {
            Ok(Outcome::Value(imgproc::contour_area(&*curve_of(store, curve)?, oriented)?))
        }
        Call::ArcLength { curve, closed } => Ok(Outcome::Value(imgproc::arc_length(&*curve_of(store, curve)?, closed)?)),
        Call::ConvexHull { curve, dst, clockwise, return_points } => {
            let hull = {
                let points = curve_of(store, curve)?;
                native(|out| imgproc::convex_hull(&*points, out, clockwise, return_points))?
            };
            if return_points {
                write_points(store, &dst, hull)
            } else {
                write(store, &dst, hull)
            }
        }
        Call::ConvexityDefects { curve, hull, dst } => {
            let defects = {
                let points = curve_of(store, curve)?;
                let hull = mat(store, &hull)?;
                native(|out| imgproc::convexity_defects(&*points, hull, out))?
            };
            write(store, &dst, defects)
        }
        Call::IsContourConvex { curve } => Ok(Outcome::Flag(imgproc::is_contour_convex(&*curve_of(store, curve)?)?)),
        Call::ApproxPolyDp { curve, dst, epsilon, closed } => {
            let approx = {
                let points = curve_of(store, curve)?;
                native(|out| imgproc::approx_poly_dp(&*points, out, epsilon, closed))?
            };
            write_points(store, &dst, approx)
        }
        Call::MinAreaRect { curve } => {
            let rect: RotatedRect = imgproc::min_area_rect(&*curve_of(store, curve)?)?;
            save(store, rect)
        }
        Call::FitLine { curve, dst, dist_type, param, reps, aeps } => {
            let line = {
                let points = curve_of(store, curve)?;
                native(|out| imgproc::fit_line(&*points, out, dist_type, param, reps, aeps))?
            };
            write(store, &dst, line)
        }
        Call::MatchShapes { a, b, method, parameter } => {
            let (ca, cb) = (curve_of(store, a)?, curve_of(store, b)?);
            Ok(Outcome::Value(imgproc::match_shapes(&*ca, &*cb, method, parameter)?))
        }
        Call::ConnectedComponents { src, labels, stats, connectivity, ltype } => {
            let src = mat(store, &src)?;
            let mut label_out = Mat::default();
            let count = match stats {
                None => {
                    let count = imgproc::connected_components(src, &mut label_out, connectivity, ltype)?;
                    write(store, &labels, label_out)?;
                    count
                }
                Some((stats, centroids)) => {
                    let (mut stats_out, mut centroids_out) = (Mat::default(), Mat::default());
                    let count = imgproc::connected_components_with_stats(
                        src,
                        &mut label_out,
                        &mut stats_out,
                        &mut centroids_out,
                        connectivity,
                        ltype,
                    )?;
                    write(store, &labels, label_out)?;
                    write(store, &stats, stats_out)?;
                    write(store, &centroids, centroids_out)?;
                    count
                }
            };
            Ok(Outcome::Value(count as f64))
        }
        Call::Resize { src, dst, dsize, fx, fy, interpolation } => {
            let dsize = size(store, &dsize)?;
            let src = mat(store, &src)?;
            mat::ensure_not_empty(src, "resize")?;
            let out = native(|out| imgproc::resize(src, out, dsize, fx, fy, interpolation))?;
            write(store, &dst, out)
        }
        Call::WarpAffine { src, dst, m, dsize, flags, border_mode, border_value } => {
            let dsize = size(store, &dsize)?;
            let border_value = border_value.map(|h| scalar(store, &h)).transpose()?.unwrap_or_default();
            let (src, m) = (mat(store, &src)?, mat(store, &m)?);
            mat::ensure_not_empty(src, "warpAffine")?;
            let out = native(|out| imgproc::warp_affine(src, out, m, dsize, flags, border_mode, border_value))?;
            write(store, &dst, out)
        }
        Call::GetRotationMatrix2D { center, angle, scale } => {
            let center = point(store, &center)?;
            let center = Point2f::new(center.x as f32, center.y as f32);
            save(store, imgproc::get_rotation_matrix_2d(center, angle, scale)?)
        }
        Call::RotateBound { src, angle, scale } => {
            let out = transform::rotate_bound(mat(store, &src)?, angle, scale)?;
            save(store, out)
        }
        Call::CropAndAlign { src, width, height, left, top, scale, angle } => {
            let eye = Point2f::new(left as f32, top as f32);
            let out = transform::crop_and_align(mat(store, &src)?, width, height, eye, scale, angle)?;
            save(store, out)
        }
        Call::CopyToByRect { src, dst, rect } => paint(store, &dst, |s, canvas| {
            let rect = *s.get::<Rect>(&rect)?;
            heatmap::copy_to_by_rect(mat(s, &src)?, canvas, rect)
        }),
        Call::MinMaxNorm { src, dst } => {
            let out = heatmap::min_max_norm(mat(store, &src)?)?;
            write(store, &dst, out)
        }
        Call::GetHeatMapFromBuffer { src, dst, make_norm } => {
            let out = heatmap::heat_map_from_buffer(mat(store, &src)?, make_norm)?;
            write(store, &dst, out)
        }
    }
}
