use serde_json::{Value, json};
use tracing::debug;

use crate::bridge::VisionBridge;
use crate::core::{ObjectSpec, WrappedValue};
use opencv::prelude::*;

use crate::processing::mat::{self, MatType};
use crate::processing::{Mat, Point, Rect, Scalar, Size, VecN, Vector};
use crate::store::StoredValue;
use crate::utils::{BridgeError, BridgeResult, encode_base64, encode_png};

/// Host dimensions above the signed range are left for the size check to
/// reject.
fn dim(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl VisionBridge {
    /// Builds a value from its recipe and stores it.
    pub fn create_object(&mut self, spec: ObjectSpec) -> BridgeResult<WrappedValue> {
        let value = match spec {
            ObjectSpec::Mat {
                rows,
                cols,
                mat_type,
                data,
            } => {
                let mat_type = MatType::from_code(mat_type)?;
                let mat = match data {
                    Some(data) => mat::from_values(dim(rows), dim(cols), mat_type, &data)?,
                    None => mat::zeros(dim(rows), dim(cols), mat_type)?,
                };
                StoredValue::Mat(mat)
            }
            ObjectSpec::MatVector { mats } => {
                let mut items = Vector::<Mat>::with_capacity(mats.len());
                for wrapped in &mats {
                    let handle = self.resolve(wrapped)?;
                    items.push(self.store.get::<Mat>(&handle)?.try_clone()?);
                }
                StoredValue::MatVector(items)
            }
            ObjectSpec::Point { x, y } => StoredValue::Point(Point::new(x, y)),
            ObjectSpec::PointVector { points } => {
                StoredValue::PointVector(points.iter().map(|[x, y]| Point::new(*x, *y)).collect())
            }
            ObjectSpec::Rect { x, y, width, height } => StoredValue::Rect(Rect::new(x, y, width, height)),
            ObjectSpec::RectVector { rects } => {
                let mut items = Vector::<Rect>::with_capacity(rects.len());
                for wrapped in &rects {
                    let handle = self.resolve(wrapped)?;
                    items.push(*self.store.get::<Rect>(&handle)?);
                }
                StoredValue::RectVector(items)
            }
            ObjectSpec::Size { width, height } => StoredValue::Size(Size::new(width, height)),
            ObjectSpec::Scalar { values } => {
                if values.is_empty() || values.len() > 4 {
                    return Err(BridgeError::unsupported(format!(
                        "Scalar takes 1 to 4 components, got {}",
                        values.len()
                    )));
                }
                let mut scalar = Scalar::default();
                for (slot, v) in scalar.0.iter_mut().zip(&values) {
                    *slot = *v;
                }
                StoredValue::Scalar(scalar)
            }
            ObjectSpec::Vec3b { values } => StoredValue::Vec3b(VecN(values)),
        };
        let kind = value.kind();
        let handle = self.store.save_value(value)?;
        debug!("Created {} {}", kind, handle);
        Ok(WrappedValue::wrap(kind, handle))
    }

    /// Plain host representation of a stored value.
    pub fn to_value(&self, wrapped: &WrappedValue) -> BridgeResult<Value> {
        let handle = self.resolve(wrapped)?;
        Ok(match self.store.get_value(&handle)? {
            StoredValue::Mat(mat) => {
                let base64 = if mat.empty() {
                    String::new()
                } else {
                    encode_base64(&encode_png(mat)?)
                };
                json!({
                    "size": mat.rows() * mat.cols(),
                    "cols": mat.cols(),
                    "rows": mat.rows(),
                    "base64": base64,
                })
            }
            StoredValue::MatVector(mats) => json!({
                "array": mats
                    .iter()
                    .map(|m| json!({"size": m.rows() * m.cols(), "cols": m.cols(), "rows": m.rows()}))
                    .collect::<Vec<_>>(),
            }),
            StoredValue::Point(p) => point_json(p),
            StoredValue::PointVector(points) => json!({"array": points.iter().map(|p| point_json(&p)).collect::<Vec<_>>()}),
            StoredValue::Rect(r) => rect_json(r),
            StoredValue::RectVector(rects) => json!({"array": rects.iter().map(|r| rect_json(&r)).collect::<Vec<_>>()}),
            StoredValue::Size(s) => json!({"width": s.width, "height": s.height}),
            StoredValue::Scalar(s) => json!({"a": s.0[0], "b": s.0[1], "c": s.0[2], "d": s.0[3]}),
            StoredValue::RotatedRect(r) => json!({
                "center": {"x": r.center.x, "y": r.center.y},
                "size": {"width": r.size.width, "height": r.size.height},
                "angle": r.angle,
            }),
            StoredValue::Vec3b(v) => json!({"a": v.0[0], "b": v.0[1], "c": v.0[2]}),
        })
    }

    /// Copies element `index` of a stored vector into a new handle.
    pub fn copy_object_from_vector(&mut self, vector: &WrappedValue, index: usize) -> BridgeResult<WrappedValue> {
        let handle = self.resolve(vector)?;
        if !vector.kind.is_vector() {
            return Err(BridgeError::type_mismatch(&vector.id, "vector", vector.kind.tag()));
        }
        let element = self
            .store
            .get_value(&handle)?
            .element(index)?
            .ok_or_else(|| BridgeError::argument("copyObjectFromVector", 1, "index within the vector"))?;
        let kind = element.kind();
        let copy = self.store.save_value(element)?;
        Ok(WrappedValue::wrap(kind, copy))
    }
}

fn point_json(p: &Point) -> Value {
    json!({"x": p.x, "y": p.y})
}

fn rect_json(r: &Rect) -> Value {
    json!({"x": r.x, "y": r.y, "width": r.width, "height": r.height})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ObjectKind;

    #[test]
    fn scalar_values_fill_missing_components_with_zero() {
        let mut bridge = VisionBridge::default();
        let wrapped = bridge.create_object(ObjectSpec::Scalar { values: vec![1.0, 2.0] }).unwrap();
        assert_eq!(wrapped.kind, ObjectKind::Scalar);
        assert_eq!(
            bridge.to_value(&wrapped).unwrap(),
            json!({"a": 1.0, "b": 2.0, "c": 0.0, "d": 0.0})
        );
        assert!(bridge.create_object(ObjectSpec::Scalar { values: vec![] }).is_err());
    }

    #[test]
    fn mat_data_must_match_declared_shape() {
        let mut bridge = VisionBridge::default();
        let err = bridge
            .create_object(ObjectSpec::Mat {
                rows: 2,
                cols: 2,
                mat_type: 0,
                data: Some(vec![1.0, 2.0, 3.0]),
            })
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedInput(_)));
    }

    #[test]
    fn oversized_mat_is_unsupported_input() {
        let mut bridge = VisionBridge::default();
        for (rows, cols) in [(usize::MAX, 2), (1 << 20, 1 << 20)] {
            let err = bridge
                .create_object(ObjectSpec::Mat {
                    rows,
                    cols,
                    mat_type: 16,
                    data: None,
                })
                .unwrap_err();
            assert!(matches!(err, BridgeError::UnsupportedInput(_)));
        }
        assert!(bridge.store().is_empty());
    }

    #[test]
    fn mat_values_carry_png_payload() {
        let mut bridge = VisionBridge::default();
        let wrapped = bridge
            .create_object(ObjectSpec::Mat {
                rows: 2,
                cols: 3,
                mat_type: 16,
                data: None,
            })
            .unwrap();
        let value = bridge.to_value(&wrapped).unwrap();
        assert_eq!(value["size"], 6);
        assert_eq!(value["cols"], 3);
        assert!(value["base64"].as_str().unwrap().starts_with("iVBOR"));
    }

    #[test]
    fn vector_elements_copy_into_new_handles() {
        let mut bridge = VisionBridge::default();
        let points = bridge
            .create_object(ObjectSpec::PointVector {
                points: vec![[1, 2], [3, 4]],
            })
            .unwrap();
        let second = bridge.copy_object_from_vector(&points, 1).unwrap();
        assert_eq!(second.kind, ObjectKind::Point);
        assert_eq!(bridge.to_value(&second).unwrap(), json!({"x": 3, "y": 4}));
        assert_eq!(
            bridge.to_value(&points).unwrap(),
            json!({"array": [{"x": 1, "y": 2}, {"x": 3, "y": 4}]})
        );
        assert!(matches!(
            bridge.copy_object_from_vector(&points, 2),
            Err(BridgeError::Argument { .. })
        ));
    }

    #[test]
    fn mat_vector_elements_are_independent_copies() {
        let mut bridge = VisionBridge::default();
        let m = bridge
            .create_object(ObjectSpec::Mat {
                rows: 1,
                cols: 2,
                mat_type: 0,
                data: Some(vec![4.0, 5.0]),
            })
            .unwrap();
        let mats = bridge.create_object(ObjectSpec::MatVector { mats: vec![m.clone()] }).unwrap();
        let copy = bridge.copy_object_from_vector(&mats, 0).unwrap();
        assert_eq!(copy.kind, ObjectKind::Mat);
        assert_ne!(copy.id, m.id);
        assert_eq!(bridge.to_value(&mats).unwrap(), json!({"array": [{"size": 2, "cols": 2, "rows": 1}]}));
    }

    #[test]
    fn rect_vectors_are_built_from_stored_rects() {
        let mut bridge = VisionBridge::default();
        let rect = bridge
            .create_object(ObjectSpec::Rect {
                x: 1,
                y: 2,
                width: 3,
                height: 4,
            })
            .unwrap();
        let rects = bridge.create_object(ObjectSpec::RectVector { rects: vec![rect.clone()] }).unwrap();
        let copy = bridge.copy_object_from_vector(&rects, 0).unwrap();
        assert_eq!(bridge.to_value(&copy).unwrap(), bridge.to_value(&rect).unwrap());
        assert!(matches!(
            bridge.copy_object_from_vector(&rect, 0),
            Err(BridgeError::TypeMismatch { .. })
        ));
    }
}
