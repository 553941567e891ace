//! Opaque-handle object store.
//!
//! Values live in a generational arena; callers only ever see [`Handle`]s,
//! whose string form is what crosses the bridge.

mod arena;
mod handle;
mod value;

pub use arena::ObjectStore;
pub use handle::Handle;
pub use value::{ObjectKind, Storable, StoredValue};
