//! Native vision primitives plus the few composites the bridge adds on top.

pub mod compat;
pub mod heatmap;
pub mod mat;
pub mod transform;

pub use mat::{Depth, MatType};
pub use opencv::core::{
    Mat, Point, Point2f, Rect, RotatedRect, Scalar, Size, Size2f, Vec3b, VecN, Vector,
};
