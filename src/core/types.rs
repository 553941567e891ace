//! Types that cross the bridge boundary.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::store::{Handle, ObjectKind};
use crate::utils::BridgeResult;

/// Host-side reference to a stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedValue {
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: String,
}

impl WrappedValue {
    pub fn wrap(kind: ObjectKind, handle: Handle) -> Self {
        Self {
            kind,
            id: handle.id(),
        }
    }

    /// Parses the id back into a handle; malformed ids are lookup errors.
    pub fn handle(&self) -> BridgeResult<Handle> {
        self.id.parse()
    }
}

/// Result of one dispatched verb.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Side effect only; serializes as `{}`.
    Unit,
    Value(f64),
    Flag(bool),
    /// A boolean under its own key, such as `resolved`.
    NamedFlag(&'static str, bool),
    /// Named scalars such as `minVal`/`maxVal`.
    Fields(Vec<(&'static str, f64)>),
    Wrapped(WrappedValue),
}

impl Outcome {
    pub fn wrapped(&self) -> Option<&WrappedValue> {
        match self {
            Self::Wrapped(w) => Some(w),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// Looks up a named field, also accepting `"value"` for plain values.
    pub fn field(&self, name: &str) -> Option<f64> {
        match self {
            Self::Value(v) if name == "value" => Some(*v),
            Self::Fields(fields) => fields.iter().find(|(k, _)| *k == name).map(|(_, v)| *v),
            _ => None,
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unit => serializer.serialize_map(Some(0))?.end(),
            Self::Value(v) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("value", v)?;
                map.end()
            }
            Self::Flag(b) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("value", b)?;
                map.end()
            }
            Self::NamedFlag(name, b) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, b)?;
                map.end()
            }
            Self::Fields(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Wrapped(w) => w.serialize(serializer),
        }
    }
}

/// Element type of an egress buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferType {
    Uint8,
    Float32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BufferData {
    Uint8(Vec<u8>),
    Float32(Vec<f32>),
}

impl BufferData {
    pub fn len(&self) -> usize {
        match self {
            Self::Uint8(b) => b.len(),
            Self::Float32(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Typed copy of a mat's elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatBuffer {
    pub cols: usize,
    pub rows: usize,
    pub channels: usize,
    pub buffer: BufferData,
}

/// 8-bit element dump of a mat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatData {
    pub size: usize,
    pub cols: usize,
    pub rows: usize,
    pub data: Vec<u8>,
}

/// Recipe for `create_object`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectSpec {
    Mat {
        rows: usize,
        cols: usize,
        #[serde(rename = "matType")]
        mat_type: i32,
        #[serde(default)]
        data: Option<Vec<f64>>,
    },
    MatVector {
        #[serde(default)]
        mats: Vec<WrappedValue>,
    },
    Point {
        x: i32,
        y: i32,
    },
    PointVector {
        #[serde(default)]
        points: Vec<[i32; 2]>,
    },
    Rect {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    RectVector {
        #[serde(default)]
        rects: Vec<WrappedValue>,
    },
    Size {
        width: i32,
        height: i32,
    },
    Scalar {
        values: Vec<f64>,
    },
    #[serde(rename = "vec3b")]
    Vec3b {
        values: [u8; 3],
    },
}
