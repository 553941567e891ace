//! The closed set of values the store can hold.

use std::fmt;

use serde::{Deserialize, Serialize};

use opencv::prelude::*;

use crate::processing::{Mat, Point, Rect, RotatedRect, Scalar, Size, Vec3b, Vector};
use crate::utils::BridgeResult;

/// Kind tag of a stored value, serialized with its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Mat,
    MatVector,
    Point,
    PointVector,
    Rect,
    RectVector,
    Size,
    Scalar,
    RotatedRect,
    #[serde(rename = "vec3b")]
    Vec3b,
}

impl ObjectKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Mat => "mat",
            Self::MatVector => "mat_vector",
            Self::Point => "point",
            Self::PointVector => "point_vector",
            Self::Rect => "rect",
            Self::RectVector => "rect_vector",
            Self::Size => "size",
            Self::Scalar => "scalar",
            Self::RotatedRect => "rotated_rect",
            Self::Vec3b => "vec3b",
        }
    }

    /// Whether values of this kind are sequences that support element copy.
    pub fn is_vector(self) -> bool {
        matches!(self, Self::MatVector | Self::PointVector | Self::RectVector)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug)]
pub enum StoredValue {
    Mat(Mat),
    MatVector(Vector<Mat>),
    Point(Point),
    PointVector(Vector<Point>),
    Rect(Rect),
    RectVector(Vector<Rect>),
    Size(Size),
    Scalar(Scalar),
    RotatedRect(RotatedRect),
    Vec3b(Vec3b),
}

impl StoredValue {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Mat(_) => ObjectKind::Mat,
            Self::MatVector(_) => ObjectKind::MatVector,
            Self::Point(_) => ObjectKind::Point,
            Self::PointVector(_) => ObjectKind::PointVector,
            Self::Rect(_) => ObjectKind::Rect,
            Self::RectVector(_) => ObjectKind::RectVector,
            Self::Size(_) => ObjectKind::Size,
            Self::Scalar(_) => ObjectKind::Scalar,
            Self::RotatedRect(_) => ObjectKind::RotatedRect,
            Self::Vec3b(_) => ObjectKind::Vec3b,
        }
    }

    /// Element `index` of a vector value as a standalone value. Mats are
    /// deep-copied so the element does not share pixels with the vector.
    pub fn element(&self, index: usize) -> BridgeResult<Option<StoredValue>> {
        Ok(match self {
            Self::MatVector(v) if index < v.len() => Some(Self::Mat(v.get(index)?.try_clone()?)),
            Self::PointVector(v) if index < v.len() => Some(Self::Point(v.get(index)?)),
            Self::RectVector(v) if index < v.len() => Some(Self::Rect(v.get(index)?)),
            _ => None,
        })
    }

    /// Independent copy of the value.
    pub fn try_clone(&self) -> BridgeResult<StoredValue> {
        Ok(match self {
            Self::Mat(m) => Self::Mat(m.try_clone()?),
            Self::MatVector(v) => Self::MatVector(
                v.iter()
                    .map(|m| m.try_clone())
                    .collect::<opencv::Result<Vector<Mat>>>()?,
            ),
            Self::Point(p) => Self::Point(*p),
            Self::PointVector(v) => Self::PointVector(v.clone()),
            Self::Rect(r) => Self::Rect(*r),
            Self::RectVector(v) => Self::RectVector(v.clone()),
            Self::Size(s) => Self::Size(*s),
            Self::Scalar(s) => Self::Scalar(*s),
            Self::RotatedRect(r) => Self::RotatedRect(*r),
            Self::Vec3b(v) => Self::Vec3b(*v),
        })
    }
}

/// Rust types that map onto exactly one [`StoredValue`] variant, giving the
/// store typed access.
pub trait Storable: Sized {
    const KIND: ObjectKind;

    fn from_ref(value: &StoredValue) -> Option<&Self>;
    fn from_mut(value: &mut StoredValue) -> Option<&mut Self>;
    fn into_value(self) -> StoredValue;
}

macro_rules! storable {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Storable for $ty {
                const KIND: ObjectKind = ObjectKind::$variant;

                fn from_ref(value: &StoredValue) -> Option<&Self> {
                    match value {
                        StoredValue::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn from_mut(value: &mut StoredValue) -> Option<&mut Self> {
                    match value {
                        StoredValue::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn into_value(self) -> StoredValue {
                    StoredValue::$variant(self)
                }
            }
        )*
    };
}

storable! {
    Mat => Mat,
    Vector<Mat> => MatVector,
    Point => Point,
    Vector<Point> => PointVector,
    Rect => Rect,
    Vector<Rect> => RectVector,
    Size => Size,
    Scalar => Scalar,
    RotatedRect => RotatedRect,
    Vec3b => Vec3b,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_tags() {
        for kind in [ObjectKind::MatVector, ObjectKind::RotatedRect, ObjectKind::Vec3b] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.tag());
            assert_eq!(serde_json::from_value::<ObjectKind>(json).unwrap(), kind);
        }
    }

    #[test]
    fn vector_elements_come_out_as_scalars_of_their_kind() {
        let points = StoredValue::PointVector(Vector::from_slice(&[Point::new(1, 2), Point::new(3, 4)]));
        assert!(matches!(
            points.element(1).unwrap(),
            Some(StoredValue::Point(p)) if p == Point::new(3, 4)
        ));
        assert!(points.element(2).unwrap().is_none());
        assert!(StoredValue::Size(Size::new(1, 1)).element(0).unwrap().is_none());
    }

    #[test]
    fn mat_elements_are_deep_copies() {
        let source = crate::processing::mat::from_bytes(1, 2, 1, &[3, 4]).unwrap();
        let mats = StoredValue::MatVector(Vector::from_iter([source]));
        let Some(StoredValue::Mat(mut copy)) = mats.element(0).unwrap() else {
            panic!("expected a mat element");
        };
        *copy.at_2d_mut::<u8>(0, 0).unwrap() = 99;
        let StoredValue::MatVector(v) = &mats else { unreachable!() };
        assert_eq!(*v.get(0).unwrap().at_2d::<u8>(0, 0).unwrap(), 3);
    }
}
