//! Loosely typed positional arguments and their checked readers.

use serde::{Deserialize, Serialize};

use crate::core::WrappedValue;
use crate::store::{Handle, ObjectKind};
use crate::utils::{BridgeError, BridgeResult};

/// One positional argument as the host sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    Null,
    Bool(bool),
    Number(f64),
    Object(WrappedValue),
    Text(String),
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<WrappedValue> for Arg {
    fn from(v: WrappedValue) -> Self {
        Self::Object(v)
    }
}

impl From<&WrappedValue> for Arg {
    fn from(v: &WrappedValue) -> Self {
        Self::Object(v.clone())
    }
}

/// Read-only view over a verb's arguments. Every reader is bounds-checked and
/// reports failures as argument errors naming the verb and position.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    verb: &'static str,
    args: &'a [Arg],
}

impl<'a> Args<'a> {
    pub fn new(verb: &'static str, args: &'a [Arg]) -> Self {
        Self { verb, args }
    }

    pub fn verb(&self) -> &'static str {
        self.verb
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    fn error(&self, position: usize, expected: impl Into<String>) -> BridgeError {
        BridgeError::argument(self.verb, position, expected)
    }

    fn get(&self, position: usize) -> Option<&'a Arg> {
        self.args.get(position)
    }

    pub fn is_number(&self, position: usize) -> bool {
        matches!(self.get(position), Some(Arg::Number(_)))
    }

    pub fn is_bool(&self, position: usize) -> bool {
        matches!(self.get(position), Some(Arg::Bool(_)))
    }

    pub fn is_object(&self, position: usize) -> bool {
        matches!(self.get(position), Some(Arg::Object(_)))
    }

    pub fn is_kind(&self, position: usize, kind: ObjectKind) -> bool {
        matches!(self.get(position), Some(Arg::Object(w)) if w.kind == kind)
    }

    pub fn number(&self, position: usize) -> BridgeResult<f64> {
        match self.get(position) {
            Some(Arg::Number(v)) => Ok(*v),
            _ => Err(self.error(position, "number")),
        }
    }

    /// Number truncated toward zero, as a native integer parameter would be.
    pub fn int(&self, position: usize) -> BridgeResult<i32> {
        let v = self.number(position)?;
        if !v.is_finite() {
            return Err(self.error(position, "finite integer"));
        }
        Ok(v.trunc().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
    }

    pub fn bool(&self, position: usize) -> BridgeResult<bool> {
        match self.get(position) {
            Some(Arg::Bool(b)) => Ok(*b),
            _ => Err(self.error(position, "boolean")),
        }
    }

    /// Handle of a wrapped object whose declared kind is `kind`.
    pub fn handle(&self, position: usize, kind: ObjectKind) -> BridgeResult<Handle> {
        self.handle_of(position, &[kind])
    }

    /// Handle of a wrapped object whose declared kind is any of `kinds`.
    pub fn handle_of(&self, position: usize, kinds: &[ObjectKind]) -> BridgeResult<Handle> {
        match self.get(position) {
            Some(Arg::Object(w)) if kinds.contains(&w.kind) => w.handle(),
            _ => Err(self.error(position, expected_kinds(kinds))),
        }
    }

    /// Declared kind of the object at `position`.
    pub fn kind(&self, position: usize) -> BridgeResult<ObjectKind> {
        match self.get(position) {
            Some(Arg::Object(w)) => Ok(w.kind),
            _ => Err(self.error(position, "object")),
        }
    }

    pub fn opt_number(&self, position: usize) -> Option<f64> {
        self.number(position).ok()
    }

    pub fn opt_int(&self, position: usize) -> BridgeResult<Option<i32>> {
        if self.is_number(position) {
            self.int(position).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn opt_bool(&self, position: usize) -> Option<bool> {
        self.bool(position).ok()
    }

    /// Optional trailing object: absent or `null` gives `None`, anything else
    /// must be an object of `kind`.
    pub fn opt_handle(&self, position: usize, kind: ObjectKind) -> BridgeResult<Option<Handle>> {
        match self.get(position) {
            None | Some(Arg::Null) => Ok(None),
            _ => self.handle(position, kind).map(Some),
        }
    }
}

fn expected_kinds(kinds: &[ObjectKind]) -> String {
    kinds.iter().map(|k| k.tag()).collect::<Vec<_>>().join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wrapped(kind: ObjectKind, id: &str) -> Arg {
        Arg::Object(WrappedValue {
            kind,
            id: id.into(),
        })
    }

    #[test]
    fn host_json_maps_onto_variants() {
        let args: Vec<Arg> =
            serde_json::from_value(json!([null, true, 3, {"type": "mat", "id": "0:0"}, "x"])).unwrap();
        assert_eq!(args[0], Arg::Null);
        assert_eq!(args[1], Arg::Bool(true));
        assert_eq!(args[2], Arg::Number(3.0));
        assert_eq!(args[3], wrapped(ObjectKind::Mat, "0:0"));
        assert_eq!(args[4], Arg::Text("x".into()));
    }

    #[test]
    fn readers_check_type_and_bounds() {
        let list = vec![Arg::Number(2.7), wrapped(ObjectKind::Point, "1:0")];
        let args = Args::new("flip", &list);
        assert_eq!(args.int(0).unwrap(), 2);
        assert_eq!(args.handle(1, ObjectKind::Point).unwrap().index(), 1);
        assert_eq!(
            args.handle(1, ObjectKind::Mat).unwrap_err(),
            BridgeError::argument("flip", 1, "mat")
        );
        assert_eq!(args.number(5).unwrap_err(), BridgeError::argument("flip", 5, "number"));
        assert!(args.bool(0).is_err());
    }

    #[test]
    fn optional_readers_treat_null_as_absent() {
        let list = vec![Arg::Null, wrapped(ObjectKind::Size, "0:0")];
        let args = Args::new("blur", &list);
        assert_eq!(args.opt_handle(0, ObjectKind::Mat).unwrap(), None);
        assert_eq!(args.opt_handle(4, ObjectKind::Mat).unwrap(), None);
        assert!(args.opt_handle(1, ObjectKind::Mat).is_err());
        assert_eq!(args.opt_int(0).unwrap(), None);
        assert_eq!(args.opt_number(1), None);
    }
}
