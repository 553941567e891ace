//! Per-verb argument shapes, validated once before anything executes.
//!
//! Positions are counted after the verb name. Trailing arguments the host may
//! leave out take the native library's defaults.

use crate::dispatch::args::Args;
use crate::dispatch::verb::Verb;
use crate::store::{Handle, ObjectKind};
use crate::utils::{BridgeError, BridgeResult};

use ObjectKind::{Mat, MatVector, Point, PointVector, Rect, Scalar, Size};

const LINE_8: i32 = 8;
const BORDER_DEFAULT: i32 = 4;
const NORM_L2: i32 = 4;
const CV_32S: i32 = 4;
const CV_32F: i32 = 5;
const CV_64F: i32 = 6;

/// Either a single mat or a vector of mats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Mat(Handle),
    Vector(Handle),
}

/// A point sequence held as a point mat, a point vector, or a vector of
/// point mats read back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Mat(Handle),
    Points(Handle),
    Mats(Handle),
}

/// A set of curves: a vector of point mats, or one point vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curves {
    Mats(Handle),
    Points(Handle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Exp,
    Log,
    Sqrt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphOp {
    Erode,
    Dilate,
    Ex(i32),
}

/// Stroke settings shared by the outline drawing verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stroke {
    pub thickness: i32,
    pub line_type: i32,
    pub shift: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Absdiff { a: Handle, b: Handle, dst: Handle },
    Add { a: Handle, b: Handle, dst: Handle, mask: Option<Handle>, dtype: Option<i32> },
    Subtract { a: Handle, b: Handle, dst: Handle, mask: Option<Handle>, dtype: Option<i32> },
    AddWeighted { a: Handle, alpha: f64, b: Handle, beta: f64, gamma: f64, dst: Handle, dtype: Option<i32> },
    BatchDistance {
        a: Handle,
        b: Handle,
        dist: Handle,
        dtype: i32,
        nidx: Handle,
        norm_type: i32,
        k: i32,
        mask: Option<Handle>,
        update: i32,
        crosscheck: bool,
    },
    Multiply { a: Handle, b: Handle, dst: Handle, scale: f64, dtype: Option<i32> },
    Divide { a: Handle, b: Handle, dst: Handle, scale: f64, dtype: Option<i32> },
    ScaleAdd { a: Handle, alpha: f64, b: Handle, dst: Handle },
    Bitwise { op: BitwiseOp, a: Handle, b: Handle, dst: Handle, mask: Option<Handle> },
    BitwiseNot { src: Handle, dst: Handle, mask: Option<Handle> },
    BorderInterpolate { p: i32, len: i32, border_type: i32 },
    CalcCovarMatrix { samples: Handle, nsamples: i32, covar: Handle, mean: Handle, flags: i32, ctype: i32 },
    CartToPolar { x: Source, y: Source, magnitude: Handle, angle: Handle, degrees: bool },
    CheckRange { src: Source, quiet: bool, pos: Option<Handle>, min_val: f64, max_val: f64 },
    Compare { a: Handle, b: Handle, dst: Handle, cmpop: i32 },
    CompleteSymm { target: Source, lower_to_upper: bool },
    ConvertFp16 { src: Handle, dst: Handle },
    ConvertScaleAbs { src: Handle, dst: Handle, alpha: f64, beta: f64 },
    CopyMakeBorder {
        src: Handle,
        dst: Handle,
        top: i32,
        bottom: i32,
        left: i32,
        right: i32,
        border_type: i32,
        value: Option<Handle>,
    },
    CopyTo { src: Handle, dst: Handle, mask: Option<Handle> },
    CountNonZero { src: Source },
    Dct { src: Handle, dst: Handle, flags: i32 },
    Dft { inverse: bool, src: Handle, dst: Handle, flags: i32, nonzero_rows: i32 },
    Determinant { src: Handle },
    Eigen { symmetric: bool, src: Handle, values: Handle, vectors: Handle },
    Math { op: MathOp, src: Handle, dst: Handle },
    Pow { src: Handle, power: f64, dst: Handle },
    Magnitude { x: Source, y: Source, dst: Handle },
    Phase { x: Source, y: Source, angle: Handle, degrees: bool },
    Mahalanobis { a: Source, b: Source, icovar: Handle },
    ExtractChannel { src: Handle, dst: Handle, coi: i32 },
    InsertChannel { src: Handle, dst: Handle, coi: i32 },
    FindNonZero { src: Handle, dst: Handle },
    Flip { src: Handle, dst: Handle, flip_code: i32 },
    Gemm { a: Handle, b: Handle, alpha: f64, c: Option<Handle>, beta: f64, dst: Handle, flags: i32 },
    GetOptimalDftSize { vecsize: i32 },
    Concat { horizontal: bool, srcs: Handle, dst: Handle },
    InRange { src: Handle, lower: Handle, upper: Handle, dst: Handle },
    Invert { src: Handle, dst: Handle, flags: i32 },
    Lut { src: Handle, table: Handle, dst: Handle },
    Extremum { max: bool, a: Handle, b: Handle, dst: Handle },
    Mean { src: Handle, mask: Option<Handle> },
    MeanStdDev { src: Handle, mean: Handle, stddev: Handle, mask: Option<Handle> },
    MinMaxLoc { src: Handle, mask: Option<Handle> },
    MulSpectrums { a: Handle, b: Handle, dst: Handle, flags: i32, conj_b: bool },
    MulTransposed { src: Handle, dst: Handle, a_ta: bool, delta: Option<Handle>, scale: f64, dtype: i32 },
    Norm { src: Handle, norm_type: i32, mask: Option<Handle> },
    Normalize { src: Handle, dst: Handle, alpha: f64, norm_type: i32, beta: f64, dtype: Option<i32> },
    PatchNans { target: Source, value: f64 },
    PerspectiveTransform { src: Handle, dst: Handle, m: Handle },
    Psnr { a: Handle, b: Handle, r: f64 },
    Reduce { src: Handle, dst: Handle, dim: i32, rtype: i32, dtype: i32 },
    Repeat { src: Handle, ny: i32, nx: i32, dst: Handle },
    Solve { a: Handle, b: Handle, dst: Handle, flags: i32 },
    SolveCubic { coeffs: Handle, roots: Handle },
    SolvePoly { coeffs: Handle, roots: Handle, max_iters: i32 },
    Sort { indices: bool, src: Handle, dst: Handle, flags: i32 },
    Split { src: Handle, dst: Handle },
    Merge { srcs: Handle, dst: Handle },
    Sum { src: Source },
    Trace { src: Handle },
    Transform { src: Handle, dst: Handle, m: Handle },
    Transpose { src: Handle, dst: Handle },
    ConvertTo { src: Handle, dst: Handle, rtype: i32, alpha: f64, beta: f64 },
    Zeros { rows: i32, cols: i32, mat_type: i32 },
    CvtColor { src: Handle, dst: Handle, code: i32, dst_cn: Option<i32> },
    CvtColorTwoPlane { y: Handle, uv: Handle, dst: Handle, code: i32 },
    Demosaicing { src: Handle, dst: Handle, code: i32, dst_cn: Option<i32> },
    ApplyColorMap { src: Handle, dst: Handle, colormap: i32 },
    GrayScaleToRedHeatmap { src: Handle, dst: Handle },
    Line { img: Handle, p1: Handle, p2: Handle, color: Handle, stroke: Stroke },
    ArrowedLine { img: Handle, p1: Handle, p2: Handle, color: Handle, stroke: Stroke, tip_length: f64 },
    Rectangle { img: Handle, p1: Handle, p2: Handle, color: Handle, stroke: Stroke },
    Circle { img: Handle, center: Handle, radius: i32, color: Handle, stroke: Stroke },
    Ellipse {
        img: Handle,
        center: Handle,
        axes: Handle,
        angle: f64,
        start_angle: f64,
        end_angle: f64,
        color: Handle,
        stroke: Stroke,
    },
    DrawMarker { img: Handle, position: Handle, color: Handle, marker_type: i32, marker_size: i32, stroke: Stroke },
    ClipLine { size: Handle, p1: Handle, p2: Handle },
    Polylines { img: Handle, curves: Curves, closed: bool, color: Handle, stroke: Stroke },
    FillPoly { img: Handle, curves: Curves, color: Handle, line_type: i32, shift: i32 },
    FillConvexPoly { img: Handle, curve: Curve, color: Handle, line_type: i32, shift: i32 },
    DrawContours { img: Handle, curves: Curves, index: i32, color: Handle, stroke: Stroke },
    Canny { src: Handle, dst: Handle, threshold1: f64, threshold2: f64, aperture_size: i32, l2_gradient: bool },
    CornerHarris { src: Handle, dst: Handle, block_size: i32, ksize: i32, k: f64, border_type: i32 },
    CornerMinEigenVal { src: Handle, dst: Handle, block_size: i32, ksize: i32, border_type: i32 },
    GoodFeaturesToTrack {
        src: Handle,
        dst: Handle,
        max_corners: i32,
        quality_level: f64,
        min_distance: f64,
        mask: Option<Handle>,
        block_size: i32,
        use_harris: bool,
        k: f64,
    },
    HoughCircles {
        src: Handle,
        dst: Handle,
        method: i32,
        dp: f64,
        min_dist: f64,
        param1: f64,
        param2: f64,
        min_radius: i32,
        max_radius: i32,
    },
    HoughLines { src: Handle, dst: Handle, rho: f64, theta: f64, threshold: i32 },
    HoughLinesP {
        src: Handle,
        dst: Handle,
        rho: f64,
        theta: f64,
        threshold: i32,
        min_line_length: f64,
        max_line_gap: f64,
    },
    BilateralFilter { src: Handle, dst: Handle, d: i32, sigma_color: f64, sigma_space: f64, border_type: i32 },
    BoxFilter {
        src: Handle,
        dst: Handle,
        ddepth: i32,
        ksize: Handle,
        anchor: Option<Handle>,
        normalize: bool,
        border_type: i32,
    },
    BuildPyramid { src: Handle, dst: Handle, max_level: i32, border_type: i32 },
    Filter2D {
        src: Handle,
        dst: Handle,
        ddepth: i32,
        kernel: Handle,
        anchor: Option<Handle>,
        delta: f64,
        border_type: i32,
    },
    GaussianBlur { src: Handle, dst: Handle, ksize: Handle, sigma_x: f64, sigma_y: f64, border_type: i32 },
    GetGaborKernel { ksize: Handle, sigma: f64, theta: f64, lambd: f64, gamma: f64, psi: f64, ktype: i32 },
    GetGaussianKernel { ksize: i32, sigma: f64, ktype: i32 },
    Laplacian { src: Handle, dst: Handle, ddepth: i32, ksize: i32, scale: f64, delta: f64, border_type: i32 },
    MedianBlur { src: Handle, dst: Handle, ksize: i32 },
    Morphology {
        op: MorphOp,
        src: Handle,
        dst: Handle,
        kernel: Option<Handle>,
        anchor: Option<Handle>,
        iterations: i32,
        border_type: i32,
        border_value: Option<Handle>,
    },
    Threshold { src: Handle, dst: Handle, thresh: f64, maxval: f64, thresh_type: i32 },
    AdaptiveThreshold {
        src: Handle,
        dst: Handle,
        max_value: f64,
        method: i32,
        thresh_type: i32,
        block_size: i32,
        c: f64,
    },
    DistanceTransform { src: Handle, dst: Handle, distance_type: i32, mask_size: i32, dst_type: i32 },
    Integral { src: Handle, dst: Handle, sdepth: i32 },
    MatchTemplate { src: Handle, templ: Handle, dst: Handle, method: i32, mask: Option<Handle> },
    FindContours { src: Handle, dst: Handle, mode: i32, method: i32 },
    BoundingRect { curve: Curve },
    ContourArea { curve: Curve, oriented: bool },
    ArcLength { curve: Curve, closed: bool },
    ConvexHull { curve: Curve, dst: Handle, clockwise: bool, return_points: bool },
    ConvexityDefects { curve: Curve, hull: Handle, dst: Handle },
    IsContourConvex { curve: Curve },
    ApproxPolyDp { curve: Curve, dst: Handle, epsilon: f64, closed: bool },
    MinAreaRect { curve: Curve },
    FitLine { curve: Curve, dst: Handle, dist_type: i32, param: f64, reps: f64, aeps: f64 },
    MatchShapes { a: Curve, b: Curve, method: i32, parameter: f64 },
    ConnectedComponents {
        src: Handle,
        labels: Handle,
        stats: Option<(Handle, Handle)>,
        connectivity: i32,
        ltype: i32,
    },
    Resize { src: Handle, dst: Handle, dsize: Handle, fx: f64, fy: f64, interpolation: i32 },
    WarpAffine {
        src: Handle,
        dst: Handle,
        m: Handle,
        dsize: Handle,
        flags: i32,
        border_mode: i32,
        border_value: Option<Handle>,
    },
    GetRotationMatrix2D { center: Handle, angle: f64, scale: f64 },
    RotateBound { src: Handle, angle: f64, scale: f64 },
    CropAndAlign { src: Handle, width: i32, height: i32, left: f64, top: f64, scale: f64, angle: f64 },
    CopyToByRect { src: Handle, dst: Handle, rect: Handle },
    MinMaxNorm { src: Handle, dst: Handle },
    GetHeatMapFromBuffer { src: Handle, dst: Handle, make_norm: bool },
}

impl Call {
    /// Validates the positional arguments of `verb` into its typed shape.
    pub fn parse(verb: Verb, args: &Args<'_>) -> BridgeResult<Self> {
        let mat = |pos| args.handle(pos, Mat);
        let points_dst = |pos| args.handle_of(pos, &[Mat, PointVector]);
        let num_or = |pos, default: f64| args.opt_number(pos).unwrap_or(default);
        let int_or = |pos, default: i32| -> BridgeResult<i32> { Ok(args.opt_int(pos)?.unwrap_or(default)) };
        let stroke = |pos| -> BridgeResult<Stroke> {
            Ok(Stroke {
                thickness: int_or(pos, 1)?,
                line_type: int_or(pos + 1, LINE_8)?,
                shift: int_or(pos + 2, 0)?,
            })
        };
        Ok(match verb {
            Verb::Absdiff => Self::Absdiff { a: mat(0)?, b: mat(1)?, dst: mat(2)? },
            Verb::Add | Verb::Subtract => {
                // A trailing dtype implies the mask slot is filled.
                let (mask, dtype) = if args.is_number(4) {
                    (Some(mat(3)?), Some(args.int(4)?))
                } else {
                    (args.opt_handle(3, Mat)?, None)
                };
                let (a, b, dst) = (mat(0)?, mat(1)?, mat(2)?);
                if verb == Verb::Add {
                    Self::Add { a, b, dst, mask, dtype }
                } else {
                    Self::Subtract { a, b, dst, mask, dtype }
                }
            }
            Verb::AddWeighted => Self::AddWeighted {
                a: mat(0)?,
                alpha: args.number(1)?,
                b: mat(2)?,
                beta: args.number(3)?,
                gamma: args.number(4)?,
                dst: mat(5)?,
                dtype: args.opt_int(6)?,
            },
            Verb::BatchDistance => Self::BatchDistance {
                a: mat(0)?,
                b: mat(1)?,
                dist: mat(2)?,
                dtype: args.int(3)?,
                nidx: mat(4)?,
                norm_type: int_or(5, NORM_L2)?,
                k: int_or(6, 0)?,
                mask: args.opt_handle(7, Mat)?,
                update: int_or(8, 0)?,
                crosscheck: args.opt_bool(9).unwrap_or_else(|| num_or(9, 0.0) != 0.0),
            },
            Verb::Multiply | Verb::Divide => {
                let (a, b, dst) = (mat(0)?, mat(1)?, mat(2)?);
                let scale = num_or(3, 1.0);
                let dtype = args.opt_int(4)?;
                if verb == Verb::Multiply {
                    Self::Multiply { a, b, dst, scale, dtype }
                } else {
                    Self::Divide { a, b, dst, scale, dtype }
                }
            }
            Verb::ScaleAdd => Self::ScaleAdd { a: mat(0)?, alpha: args.number(1)?, b: mat(2)?, dst: mat(3)? },
            Verb::BitwiseAnd | Verb::BitwiseOr | Verb::BitwiseXor => Self::Bitwise {
                op: match verb {
                    Verb::BitwiseAnd => BitwiseOp::And,
                    Verb::BitwiseOr => BitwiseOp::Or,
                    _ => BitwiseOp::Xor,
                },
                a: mat(0)?,
                b: mat(1)?,
                dst: mat(2)?,
                mask: args.opt_handle(3, Mat)?,
            },
            Verb::BitwiseNot => Self::BitwiseNot { src: mat(0)?, dst: mat(1)?, mask: args.opt_handle(2, Mat)? },
            Verb::BorderInterpolate => Self::BorderInterpolate {
                p: args.int(0)?,
                len: args.int(1)?,
                border_type: args.int(2)?,
            },
            Verb::CalcCovarMatrix => Self::CalcCovarMatrix {
                samples: args.handle(0, MatVector)?,
                nsamples: args.int(1)?,
                covar: mat(2)?,
                mean: mat(3)?,
                flags: args.int(4)?,
                ctype: int_or(5, CV_64F)?,
            },
            Verb::CartToPolar => Self::CartToPolar {
                x: source(args, 0)?,
                y: source(args, 1)?,
                magnitude: args.handle_of(2, &[Mat, MatVector])?,
                angle: args.handle_of(3, &[Mat, MatVector])?,
                degrees: args.opt_bool(4).unwrap_or(false),
            },
            Verb::CheckRange => Self::CheckRange {
                src: source(args, 0)?,
                quiet: args.opt_bool(1).unwrap_or(true),
                pos: args.opt_handle(2, Point)?,
                min_val: num_or(3, f64::MIN),
                max_val: num_or(4, f64::MAX),
            },
            Verb::Compare => Self::Compare { a: mat(0)?, b: mat(1)?, dst: mat(2)?, cmpop: args.int(3)? },
            Verb::CompleteSymm => Self::CompleteSymm {
                target: source(args, 0)?,
                lower_to_upper: args.opt_bool(1).unwrap_or(false),
            },
            Verb::ConvertFp16 => Self::ConvertFp16 { src: mat(0)?, dst: mat(1)? },
            Verb::ConvertScaleAbs => Self::ConvertScaleAbs {
                src: mat(0)?,
                dst: mat(1)?,
                alpha: num_or(2, 1.0),
                beta: num_or(3, 0.0),
            },
            Verb::CopyMakeBorder => Self::CopyMakeBorder {
                src: mat(0)?,
                dst: mat(1)?,
                top: args.int(2)?,
                bottom: args.int(3)?,
                left: args.int(4)?,
                right: args.int(5)?,
                border_type: args.int(6)?,
                value: args.opt_handle(7, Scalar)?,
            },
            Verb::CopyTo => Self::CopyTo { src: mat(0)?, dst: mat(1)?, mask: args.opt_handle(2, Mat)? },
            Verb::CountNonZero => Self::CountNonZero { src: source(args, 0)? },
            Verb::Dct => Self::Dct { src: mat(0)?, dst: mat(1)?, flags: int_or(2, 0)? },
            Verb::Dft | Verb::Idft => Self::Dft {
                inverse: verb == Verb::Idft,
                src: mat(0)?,
                dst: mat(1)?,
                flags: int_or(2, 0)?,
                nonzero_rows: int_or(3, 0)?,
            },
            Verb::Determinant => Self::Determinant { src: mat(0)? },
            Verb::Eigen | Verb::EigenNonSymmetric => Self::Eigen {
                symmetric: verb == Verb::Eigen,
                src: mat(0)?,
                values: mat(1)?,
                vectors: mat(2)?,
            },
            Verb::Exp | Verb::Log | Verb::Sqrt => Self::Math {
                op: match verb {
                    Verb::Exp => MathOp::Exp,
                    Verb::Log => MathOp::Log,
                    _ => MathOp::Sqrt,
                },
                src: mat(0)?,
                dst: mat(1)?,
            },
            Verb::Pow => Self::Pow { src: mat(0)?, power: args.number(1)?, dst: mat(2)? },
            Verb::Magnitude => Self::Magnitude { x: source(args, 0)?, y: source(args, 1)?, dst: mat(2)? },
            Verb::Phase => Self::Phase {
                x: source(args, 0)?,
                y: source(args, 1)?,
                angle: args.handle_of(2, &[Mat, MatVector])?,
                degrees: args.opt_bool(3).unwrap_or(false),
            },
            Verb::Mahalanobis => Self::Mahalanobis { a: source(args, 0)?, b: source(args, 1)?, icovar: mat(2)? },
            Verb::ExtractChannel => Self::ExtractChannel { src: mat(0)?, dst: mat(1)?, coi: args.int(2)? },
            Verb::InsertChannel => Self::InsertChannel { src: mat(0)?, dst: mat(1)?, coi: args.int(2)? },
            Verb::FindNonZero => Self::FindNonZero { src: mat(0)?, dst: points_dst(1)? },
            Verb::Flip => Self::Flip { src: mat(0)?, dst: mat(1)?, flip_code: args.int(2)? },
            Verb::Gemm => Self::Gemm {
                a: mat(0)?,
                b: mat(1)?,
                alpha: args.number(2)?,
                c: args.opt_handle(3, Mat)?,
                beta: args.number(4)?,
                dst: mat(5)?,
                flags: int_or(6, 0)?,
            },
            Verb::GetOptimalDftSize => Self::GetOptimalDftSize { vecsize: args.int(0)? },
            Verb::Hconcat | Verb::Vconcat => Self::Concat {
                horizontal: verb == Verb::Hconcat,
                srcs: args.handle(0, MatVector)?,
                dst: mat(1)?,
            },
            Verb::InRange => Self::InRange {
                src: mat(0)?,
                lower: args.handle(1, Scalar)?,
                upper: args.handle(2, Scalar)?,
                dst: mat(3)?,
            },
            Verb::Invert => Self::Invert { src: mat(0)?, dst: mat(1)?, flags: int_or(2, 0)? },
            Verb::Lut => Self::Lut { src: mat(0)?, table: mat(1)?, dst: mat(2)? },
            Verb::Max | Verb::Min => Self::Extremum { max: verb == Verb::Max, a: mat(0)?, b: mat(1)?, dst: mat(2)? },
            Verb::Mean => Self::Mean { src: mat(0)?, mask: args.opt_handle(1, Mat)? },
            Verb::MeanStdDev => Self::MeanStdDev {
                src: mat(0)?,
                mean: args.handle_of(1, &[Mat, Scalar])?,
                stddev: args.handle_of(2, &[Mat, Scalar])?,
                mask: args.opt_handle(3, Mat)?,
            },
            Verb::MinMaxLoc => Self::MinMaxLoc { src: mat(0)?, mask: args.opt_handle(1, Mat)? },
            Verb::MulSpectrums => Self::MulSpectrums {
                a: mat(0)?,
                b: mat(1)?,
                dst: mat(2)?,
                flags: args.int(3)?,
                conj_b: args.opt_bool(4).unwrap_or(false),
            },
            Verb::MulTransposed => Self::MulTransposed {
                src: mat(0)?,
                dst: mat(1)?,
                a_ta: args.bool(2)?,
                delta: args.opt_handle(3, Mat)?,
                scale: num_or(4, 1.0),
                dtype: int_or(5, -1)?,
            },
            Verb::Norm => Self::Norm { src: mat(0)?, norm_type: int_or(1, NORM_L2)?, mask: args.opt_handle(2, Mat)? },
            Verb::Normalize => Self::Normalize {
                src: mat(0)?,
                dst: mat(1)?,
                alpha: args.number(2)?,
                norm_type: args.int(3)?,
                beta: num_or(4, 0.0),
                dtype: args.opt_int(5)?,
            },
            Verb::PatchNans => Self::PatchNans { target: source(args, 0)?, value: num_or(1, 0.0) },
            Verb::PerspectiveTransform => Self::PerspectiveTransform { src: mat(0)?, dst: mat(1)?, m: mat(2)? },
            Verb::Psnr => Self::Psnr { a: mat(0)?, b: mat(1)?, r: num_or(2, 255.0) },
            Verb::Reduce => Self::Reduce {
                src: mat(0)?,
                dst: mat(1)?,
                dim: args.int(2)?,
                rtype: args.int(3)?,
                dtype: int_or(4, -1)?,
            },
            Verb::Repeat => Self::Repeat { src: mat(0)?, ny: args.int(1)?, nx: args.int(2)?, dst: mat(3)? },
            Verb::Solve => Self::Solve { a: mat(0)?, b: mat(1)?, dst: mat(2)?, flags: int_or(3, 0)? },
            Verb::SolveCubic => Self::SolveCubic { coeffs: mat(0)?, roots: mat(1)? },
            Verb::SolvePoly => Self::SolvePoly { coeffs: mat(0)?, roots: mat(1)?, max_iters: int_or(2, 300)? },
            Verb::Sort | Verb::SortIdx => Self::Sort {
                indices: verb == Verb::SortIdx,
                src: mat(0)?,
                dst: mat(1)?,
                flags: args.int(2)?,
            },
            Verb::Split => Self::Split { src: mat(0)?, dst: args.handle(1, MatVector)? },
            Verb::Merge => Self::Merge { srcs: args.handle(0, MatVector)?, dst: mat(1)? },
            Verb::Sum => Self::Sum { src: source(args, 0)? },
            Verb::Trace => Self::Trace { src: mat(0)? },
            Verb::Transform => Self::Transform { src: mat(0)?, dst: mat(1)?, m: mat(2)? },
            Verb::Transpose => Self::Transpose { src: mat(0)?, dst: mat(1)? },
            Verb::ConvertTo => Self::ConvertTo {
                src: mat(0)?,
                dst: mat(1)?,
                rtype: args.int(2)?,
                alpha: num_or(3, 1.0),
                beta: num_or(4, 0.0),
            },
            Verb::Zeros => Self::Zeros { rows: args.int(0)?, cols: args.int(1)?, mat_type: args.int(2)? },
            Verb::CvtColor => Self::CvtColor { src: mat(0)?, dst: mat(1)?, code: args.int(2)?, dst_cn: args.opt_int(3)? },
            Verb::CvtColorTwoPlane => Self::CvtColorTwoPlane { y: mat(0)?, uv: mat(1)?, dst: mat(2)?, code: args.int(3)? },
            Verb::Demosaicing => Self::Demosaicing {
                src: mat(0)?,
                dst: mat(1)?,
                code: args.int(2)?,
                dst_cn: args.opt_int(3)?,
            },
            Verb::ApplyColorMap => Self::ApplyColorMap { src: mat(0)?, dst: mat(1)?, colormap: args.int(2)? },
            Verb::GrayScaleToRedHeatmap => Self::GrayScaleToRedHeatmap { src: mat(0)?, dst: mat(1)? },
            Verb::Line | Verb::Rectangle => {
                let (img, p1, p2) = (mat(0)?, args.handle(1, Point)?, args.handle(2, Point)?);
                let color = args.handle(3, Scalar)?;
                let stroke = stroke(4)?;
                if verb == Verb::Line {
                    Self::Line { img, p1, p2, color, stroke }
                } else {
                    Self::Rectangle { img, p1, p2, color, stroke }
                }
            }
            Verb::ArrowedLine => Self::ArrowedLine {
                img: mat(0)?,
                p1: args.handle(1, Point)?,
                p2: args.handle(2, Point)?,
                color: args.handle(3, Scalar)?,
                stroke: stroke(4)?,
                tip_length: num_or(7, 0.1),
            },
            Verb::Circle => Self::Circle {
                img: mat(0)?,
                center: args.handle(1, Point)?,
                radius: args.int(2)?,
                color: args.handle(3, Scalar)?,
                stroke: stroke(4)?,
            },
            Verb::Ellipse => Self::Ellipse {
                img: mat(0)?,
                center: args.handle(1, Point)?,
                axes: args.handle(2, Size)?,
                angle: args.number(3)?,
                start_angle: args.number(4)?,
                end_angle: args.number(5)?,
                color: args.handle(6, Scalar)?,
                stroke: stroke(7)?,
            },
            Verb::DrawMarker => Self::DrawMarker {
                img: mat(0)?,
                position: args.handle(1, Point)?,
                color: args.handle(2, Scalar)?,
                marker_type: int_or(3, 0)?,
                marker_size: int_or(4, 20)?,
                stroke: Stroke { thickness: int_or(5, 1)?, line_type: int_or(6, LINE_8)?, shift: 0 },
            },
            Verb::ClipLine => Self::ClipLine {
                size: args.handle(0, Size)?,
                p1: args.handle(1, Point)?,
                p2: args.handle(2, Point)?,
            },
            Verb::Polylines => Self::Polylines {
                img: mat(0)?,
                curves: curves(args, 1)?,
                closed: args.bool(2)?,
                color: args.handle(3, Scalar)?,
                stroke: stroke(4)?,
            },
            Verb::FillPoly => Self::FillPoly {
                img: mat(0)?,
                curves: curves(args, 1)?,
                color: args.handle(2, Scalar)?,
                line_type: int_or(3, LINE_8)?,
                shift: int_or(4, 0)?,
            },
            Verb::FillConvexPoly => Self::FillConvexPoly {
                img: mat(0)?,
                curve: polygon(args, 1)?,
                color: args.handle(2, Scalar)?,
                line_type: int_or(3, LINE_8)?,
                shift: int_or(4, 0)?,
            },
            Verb::DrawContours => Self::DrawContours {
                img: mat(0)?,
                curves: curves(args, 1)?,
                index: args.int(2)?,
                color: args.handle(3, Scalar)?,
                stroke: Stroke { thickness: int_or(4, 1)?, line_type: int_or(5, LINE_8)?, shift: 0 },
            },
            Verb::Canny => Self::Canny {
                src: mat(0)?,
                dst: mat(1)?,
                threshold1: args.number(2)?,
                threshold2: args.number(3)?,
                aperture_size: int_or(4, 3)?,
                l2_gradient: args.opt_bool(5).unwrap_or(false),
            },
            Verb::CornerHarris => Self::CornerHarris {
                src: mat(0)?,
                dst: mat(1)?,
                block_size: args.int(2)?,
                ksize: args.int(3)?,
                k: args.number(4)?,
                border_type: int_or(5, BORDER_DEFAULT)?,
            },
            Verb::CornerMinEigenVal => Self::CornerMinEigenVal {
                src: mat(0)?,
                dst: mat(1)?,
                block_size: args.int(2)?,
                ksize: int_or(3, 3)?,
                border_type: int_or(4, BORDER_DEFAULT)?,
            },
            Verb::GoodFeaturesToTrack => Self::GoodFeaturesToTrack {
                src: mat(0)?,
                dst: points_dst(1)?,
                max_corners: args.int(2)?,
                quality_level: args.number(3)?,
                min_distance: args.number(4)?,
                mask: args.opt_handle(5, Mat)?,
                block_size: int_or(6, 3)?,
                use_harris: args.opt_bool(7).unwrap_or(false),
                k: num_or(8, 0.04),
            },
            Verb::HoughCircles => Self::HoughCircles {
                src: mat(0)?,
                dst: mat(1)?,
                method: args.int(2)?,
                dp: args.number(3)?,
                min_dist: args.number(4)?,
                param1: num_or(5, 100.0),
                param2: num_or(6, 100.0),
                min_radius: int_or(7, 0)?,
                max_radius: int_or(8, 0)?,
            },
            Verb::HoughLines => Self::HoughLines {
                src: mat(0)?,
                dst: mat(1)?,
                rho: args.number(2)?,
                theta: args.number(3)?,
                threshold: args.int(4)?,
            },
            Verb::HoughLinesP => Self::HoughLinesP {
                src: mat(0)?,
                dst: mat(1)?,
                rho: args.number(2)?,
                theta: args.number(3)?,
                threshold: args.int(4)?,
                min_line_length: num_or(5, 0.0),
                max_line_gap: num_or(6, 0.0),
            },
            Verb::BilateralFilter => Self::BilateralFilter {
                src: mat(0)?,
                dst: mat(1)?,
                d: args.int(2)?,
                sigma_color: args.number(3)?,
                sigma_space: args.number(4)?,
                border_type: int_or(5, BORDER_DEFAULT)?,
            },
            Verb::Blur => Self::BoxFilter {
                src: mat(0)?,
                dst: mat(1)?,
                ddepth: -1,
                ksize: args.handle(2, Size)?,
                anchor: args.opt_handle(3, Point)?,
                normalize: true,
                border_type: int_or(4, BORDER_DEFAULT)?,
            },
            Verb::BoxFilter => Self::BoxFilter {
                src: mat(0)?,
                dst: mat(1)?,
                ddepth: args.int(2)?,
                ksize: args.handle(3, Size)?,
                anchor: args.opt_handle(4, Point)?,
                normalize: args.opt_bool(5).unwrap_or(true),
                border_type: int_or(6, BORDER_DEFAULT)?,
            },
            Verb::BuildPyramid => Self::BuildPyramid {
                src: mat(0)?,
                dst: args.handle(1, MatVector)?,
                max_level: args.int(2)?,
                border_type: int_or(3, BORDER_DEFAULT)?,
            },
            Verb::Filter2D => Self::Filter2D {
                src: mat(0)?,
                dst: mat(1)?,
                ddepth: args.int(2)?,
                kernel: mat(3)?,
                anchor: args.opt_handle(4, Point)?,
                delta: num_or(5, 0.0),
                border_type: int_or(6, BORDER_DEFAULT)?,
            },
            Verb::GaussianBlur => Self::GaussianBlur {
                src: mat(0)?,
                dst: mat(1)?,
                ksize: args.handle(2, Size)?,
                sigma_x: args.number(3)?,
                sigma_y: num_or(4, 0.0),
                border_type: int_or(5, BORDER_DEFAULT)?,
            },
            Verb::GetGaborKernel => Self::GetGaborKernel {
                ksize: args.handle(0, Size)?,
                sigma: args.number(1)?,
                theta: args.number(2)?,
                lambd: args.number(3)?,
                gamma: args.number(4)?,
                psi: num_or(5, std::f64::consts::FRAC_PI_2),
                ktype: int_or(6, CV_64F)?,
            },
            Verb::GetGaussianKernel => Self::GetGaussianKernel {
                ksize: args.int(0)?,
                sigma: args.number(1)?,
                ktype: int_or(2, CV_64F)?,
            },
            Verb::Laplacian => Self::Laplacian {
                src: mat(0)?,
                dst: mat(1)?,
                ddepth: args.int(2)?,
                ksize: int_or(3, 1)?,
                scale: num_or(4, 1.0),
                delta: num_or(5, 0.0),
                border_type: int_or(6, BORDER_DEFAULT)?,
            },
            Verb::MedianBlur => Self::MedianBlur { src: mat(0)?, dst: mat(1)?, ksize: args.int(2)? },
            Verb::Erode | Verb::Dilate => Self::Morphology {
                op: if verb == Verb::Erode { MorphOp::Erode } else { MorphOp::Dilate },
                src: mat(0)?,
                dst: mat(1)?,
                kernel: args.opt_handle(2, Mat)?,
                anchor: args.opt_handle(3, Point)?,
                iterations: int_or(4, 1)?,
                border_type: int_or(5, 0)?,
                border_value: args.opt_handle(6, Scalar)?,
            },
            Verb::MorphologyEx => Self::Morphology {
                op: MorphOp::Ex(args.int(2)?),
                src: mat(0)?,
                dst: mat(1)?,
                kernel: args.opt_handle(3, Mat)?,
                anchor: args.opt_handle(4, Point)?,
                iterations: int_or(5, 1)?,
                border_type: int_or(6, 0)?,
                border_value: args.opt_handle(7, Scalar)?,
            },
            Verb::Threshold => Self::Threshold {
                src: mat(0)?,
                dst: mat(1)?,
                thresh: args.number(2)?,
                maxval: args.number(3)?,
                thresh_type: args.int(4)?,
            },
            Verb::AdaptiveThreshold => Self::AdaptiveThreshold {
                src: mat(0)?,
                dst: mat(1)?,
                max_value: args.number(2)?,
                method: args.int(3)?,
                thresh_type: args.int(4)?,
                block_size: args.int(5)?,
                c: args.number(6)?,
            },
            Verb::DistanceTransform => Self::DistanceTransform {
                src: mat(0)?,
                dst: mat(1)?,
                distance_type: args.int(2)?,
                mask_size: args.int(3)?,
                dst_type: int_or(4, CV_32F)?,
            },
            Verb::Integral => Self::Integral { src: mat(0)?, dst: mat(1)?, sdepth: int_or(2, -1)? },
            Verb::MatchTemplate => Self::MatchTemplate {
                src: mat(0)?,
                templ: mat(1)?,
                dst: mat(2)?,
                method: args.int(3)?,
                mask: args.opt_handle(4, Mat)?,
            },
            Verb::FindContours => Self::FindContours {
                src: mat(0)?,
                dst: args.handle(1, MatVector)?,
                mode: args.int(2)?,
                method: args.int(3)?,
            },
            Verb::BoundingRect => Self::BoundingRect { curve: curve(args, 0)? },
            Verb::ContourArea => Self::ContourArea { curve: curve(args, 0)?, oriented: args.opt_bool(1).unwrap_or(false) },
            Verb::ArcLength => Self::ArcLength { curve: curve(args, 0)?, closed: args.bool(1)? },
            Verb::ConvexHull => Self::ConvexHull {
                curve: curve(args, 0)?,
                dst: points_dst(1)?,
                clockwise: args.opt_bool(2).unwrap_or(false),
                return_points: args.opt_bool(3).unwrap_or(true),
            },
            Verb::ConvexityDefects => Self::ConvexityDefects { curve: curve(args, 0)?, hull: mat(1)?, dst: mat(2)? },
            Verb::IsContourConvex => Self::IsContourConvex { curve: curve(args, 0)? },
            Verb::ApproxPolyDp => Self::ApproxPolyDp {
                curve: curve(args, 0)?,
                dst: points_dst(1)?,
                epsilon: args.number(2)?,
                closed: args.bool(3)?,
            },
            Verb::MinAreaRect => Self::MinAreaRect { curve: curve(args, 0)? },
            Verb::FitLine => Self::FitLine {
                curve: curve(args, 0)?,
                dst: mat(1)?,
                dist_type: args.int(2)?,
                param: args.number(3)?,
                reps: args.number(4)?,
                aeps: args.number(5)?,
            },
            Verb::MatchShapes => Self::MatchShapes {
                a: curve(args, 0)?,
                b: curve(args, 1)?,
                method: args.int(2)?,
                parameter: num_or(3, 0.0),
            },
            Verb::ConnectedComponents => Self::ConnectedComponents {
                src: mat(0)?,
                labels: mat(1)?,
                stats: None,
                connectivity: int_or(2, 8)?,
                ltype: int_or(3, CV_32S)?,
            },
            Verb::ConnectedComponentsWithStats => Self::ConnectedComponents {
                src: mat(0)?,
                labels: mat(1)?,
                stats: Some((mat(2)?, mat(3)?)),
                connectivity: int_or(4, 8)?,
                ltype: int_or(5, CV_32S)?,
            },
            Verb::Resize => Self::Resize {
                src: mat(0)?,
                dst: mat(1)?,
                dsize: args.handle(2, Size)?,
                fx: num_or(3, 0.0),
                fy: num_or(4, 0.0),
                interpolation: int_or(5, 1)?,
            },
            Verb::WarpAffine => Self::WarpAffine {
                src: mat(0)?,
                dst: mat(1)?,
                m: mat(2)?,
                dsize: args.handle(3, Size)?,
                flags: int_or(4, 1)?,
                border_mode: int_or(5, 0)?,
                border_value: args.opt_handle(6, Scalar)?,
            },
            Verb::GetRotationMatrix2D => Self::GetRotationMatrix2D {
                center: args.handle(0, Point)?,
                angle: args.number(1)?,
                scale: args.number(2)?,
            },
            Verb::RotateBound => Self::RotateBound { src: mat(0)?, angle: args.number(1)?, scale: args.number(2)? },
            Verb::CropAndAlign => {
                // The face-centre point is required but alignment pivots on
                // the eye coordinates that follow it.
                args.handle(3, Point)?;
                Self::CropAndAlign {
                    src: mat(0)?,
                    width: args.int(1)?,
                    height: args.int(2)?,
                    left: args.number(4)?,
                    top: args.number(5)?,
                    scale: args.number(6)?,
                    angle: args.number(7)?,
                }
            }
            Verb::CopyToByRect => Self::CopyToByRect { src: mat(0)?, dst: mat(1)?, rect: args.handle(2, Rect)? },
            Verb::MinMaxNorm => Self::MinMaxNorm { src: mat(0)?, dst: mat(1)? },
            Verb::GetHeatMapFromBuffer => Self::GetHeatMapFromBuffer {
                src: mat(0)?,
                dst: mat(1)?,
                make_norm: args.bool(2)?,
            },
        })
    }
}

fn source(args: &Args<'_>, position: usize) -> BridgeResult<Source> {
    let handle = args.handle_of(position, &[Mat, MatVector])?;
    Ok(if args.is_kind(position, Mat) {
        Source::Mat(handle)
    } else {
        Source::Vector(handle)
    })
}

fn curve(args: &Args<'_>, position: usize) -> BridgeResult<Curve> {
    let handle = args.handle_of(position, &[Mat, PointVector])?;
    Ok(if args.is_kind(position, Mat) {
        Curve::Mat(handle)
    } else {
        Curve::Points(handle)
    })
}

/// A single polygon, which may also arrive as a vector of point mats.
fn polygon(args: &Args<'_>, position: usize) -> BridgeResult<Curve> {
    if args.is_kind(position, MatVector) {
        return Ok(Curve::Mats(args.handle(position, MatVector)?));
    }
    curve(args, position)
        .map_err(|_| BridgeError::argument(args.verb(), position, "mat or point_vector or mat_vector"))
}

fn curves(args: &Args<'_>, position: usize) -> BridgeResult<Curves> {
    let handle = args.handle_of(position, &[MatVector, PointVector])?;
    Ok(if args.is_kind(position, MatVector) {
        Curves::Mats(handle)
    } else {
        Curves::Points(handle)
    })
}
