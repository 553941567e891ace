//! Verb vocabulary and name resolution.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::utils::{BridgeError, BridgeResult};

const FNV_OFFSET: u64 = 14695981039346656037;
const FNV_PRIME: u64 = 1099511628211;

/// 64-bit FNV-1a over the UTF-8 bytes of `name`.
pub const fn fnv1a(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

macro_rules! verbs {
    ($($variant:ident => $name:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Verb {
            $($variant),*
        }

        impl Verb {
            pub const ALL: &'static [Verb] = &[$(Verb::$variant),*];

            /// Name the host uses to invoke this verb.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Verb::$variant => $name),*
                }
            }
        }
    };
}

verbs! {
    Absdiff => "absdiff",
    Add => "add",
    AddWeighted => "addWeighted",
    BatchDistance => "batchDistance",
    BitwiseAnd => "bitwise_and",
    BitwiseNot => "bitwise_not",
    BitwiseOr => "bitwise_or",
    BitwiseXor => "bitwise_xor",
    BorderInterpolate => "borderInterpolate",
    CalcCovarMatrix => "calcCovarMatrix",
    CartToPolar => "cartToPolar",
    CheckRange => "checkRange",
    Compare => "compare",
    CompleteSymm => "completeSymm",
    ConvertFp16 => "convertFp16",
    ConvertScaleAbs => "convertScaleAbs",
    CopyMakeBorder => "copyMakeBorder",
    CopyTo => "copyTo",
    CountNonZero => "countNonZero",
    Dct => "dct",
    Determinant => "determinant",
    Dft => "dft",
    Divide => "divide",
    Eigen => "eigen",
    EigenNonSymmetric => "eigenNonSymmetric",
    Exp => "exp",
    ExtractChannel => "extractChannel",
    FindNonZero => "findNonZero",
    Flip => "flip",
    Gemm => "gemm",
    GetOptimalDftSize => "getOptimalDFTSize",
    Hconcat => "hconcat",
    Idft => "idft",
    InRange => "inRange",
    InsertChannel => "insertChannel",
    Invert => "invert",
    Log => "log",
    Lut => "LUT",
    Magnitude => "magnitude",
    Mahalanobis => "Mahalanobis",
    Max => "max",
    Mean => "mean",
    MeanStdDev => "meanStdDev",
    Merge => "merge",
    Min => "min",
    MinMaxLoc => "minMaxLoc",
    MulSpectrums => "mulSpectrums",
    Multiply => "multiply",
    MulTransposed => "mulTransposed",
    Norm => "norm",
    Normalize => "normalize",
    PatchNans => "patchNaNs",
    PerspectiveTransform => "perspectiveTransform",
    Phase => "phase",
    Pow => "pow",
    Psnr => "PSNR",
    Reduce => "reduce",
    Repeat => "repeat",
    ScaleAdd => "scaleAdd",
    Solve => "solve",
    SolveCubic => "solveCubic",
    SolvePoly => "solvePoly",
    Sort => "sort",
    SortIdx => "sortIdx",
    Split => "split",
    Sqrt => "sqrt",
    Subtract => "subtract",
    Sum => "sum",
    Trace => "trace",
    Transform => "transform",
    Transpose => "transpose",
    Vconcat => "vconcat",
    CvtColor => "cvtColor",
    CvtColorTwoPlane => "cvtColorTwoPlane",
    Demosaicing => "demosaicing",
    ApplyColorMap => "applyColorMap",
    ArrowedLine => "arrowedLine",
    Circle => "circle",
    ClipLine => "clipLine",
    DrawContours => "drawContours",
    DrawMarker => "drawMarker",
    Ellipse => "ellipse",
    FillConvexPoly => "fillConvexPoly",
    FillPoly => "fillPoly",
    Line => "line",
    Polylines => "polylines",
    Rectangle => "rectangle",
    Canny => "Canny",
    CornerHarris => "cornerHarris",
    CornerMinEigenVal => "cornerMinEigenVal",
    GoodFeaturesToTrack => "goodFeaturesToTrack",
    HoughCircles => "HoughCircles",
    HoughLines => "HoughLines",
    HoughLinesP => "HoughLinesP",
    BilateralFilter => "bilateralFilter",
    Blur => "blur",
    BoxFilter => "boxFilter",
    BuildPyramid => "buildPyramid",
    Dilate => "dilate",
    Erode => "erode",
    Filter2D => "filter2D",
    GaussianBlur => "GaussianBlur",
    GetGaborKernel => "getGaborKernel",
    GetGaussianKernel => "getGaussianKernel",
    Laplacian => "Laplacian",
    MedianBlur => "medianBlur",
    MorphologyEx => "morphologyEx",
    AdaptiveThreshold => "adaptiveThreshold",
    DistanceTransform => "distanceTransform",
    Integral => "integral",
    Threshold => "threshold",
    MatchTemplate => "matchTemplate",
    ApproxPolyDp => "approxPolyDP",
    ArcLength => "arcLength",
    BoundingRect => "boundingRect",
    ConnectedComponents => "connectedComponents",
    ConnectedComponentsWithStats => "connectedComponentsWithStats",
    ContourArea => "contourArea",
    ConvexHull => "convexHull",
    ConvexityDefects => "convexityDefects",
    FindContours => "findContours",
    FitLine => "fitLine",
    IsContourConvex => "isContourConvex",
    MatchShapes => "matchShapes",
    MinAreaRect => "minAreaRect",
    ConvertTo => "convertTo",
    Resize => "resize",
    WarpAffine => "warpAffine",
    GetRotationMatrix2D => "getRotationMatrix2D",
    RotateBound => "rotateBound",
    CropAndAlign => "cropAndAlign",
    Zeros => "zeros",
    CopyToByRect => "copyToByRect",
    GrayScaleToRedHeatmap => "grayScaleToRedHeatmap",
    MinMaxNorm => "minMaxNorm",
    GetHeatMapFromBuffer => "getHeatMapFromBuffer",
}

lazy_static! {
    static ref VERB_TABLE: HashMap<u64, Verb> =
        Verb::ALL.iter().map(|verb| (fnv1a(verb.name()), *verb)).collect();
}

impl Verb {
    /// Hash lookup confirmed by name equality, so a colliding string can
    /// never reach the wrong operation.
    pub fn resolve(name: &str) -> BridgeResult<Self> {
        VERB_TABLE
            .get(&fnv1a(name))
            .copied()
            .filter(|verb| verb.name() == name)
            .ok_or_else(|| BridgeError::UnknownVerb(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fnv1a_matches_reference_values() {
        assert_eq!(fnv1a(""), 0xcbf29ce484222325);
        assert_eq!(fnv1a("a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn every_verb_resolves_to_itself() {
        for verb in Verb::ALL {
            assert_eq!(Verb::resolve(verb.name()).unwrap(), *verb);
        }
    }

    #[test]
    fn vocabulary_has_no_hash_collisions() {
        let hashes: HashSet<u64> = Verb::ALL.iter().map(|v| fnv1a(v.name())).collect();
        assert_eq!(hashes.len(), Verb::ALL.len());
        assert_eq!(VERB_TABLE.len(), Verb::ALL.len());
    }

    #[test]
    fn vocabulary_covers_core_and_imgproc_names() {
        assert_eq!(Verb::ALL.len(), 136);
        for name in ["batchDistance", "Mahalanobis", "HoughLinesP", "connectedComponentsWithStats", "PSNR"] {
            assert_eq!(Verb::resolve(name).unwrap().name(), name);
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(matches!(Verb::resolve("gaussianblur"), Err(BridgeError::UnknownVerb(_))));
        assert!(matches!(Verb::resolve("lut"), Err(BridgeError::UnknownVerb(_))));
    }
}
