//! Host-facing bridge object.
//!
//! [`VisionBridge`] owns the object store and exposes every surface a host
//! runtime needs: verb invocation, object creation and conversion, buffer
//! ingestion and egress, region extraction and bulk clear. It is a plain
//! single-threaded object; [`crate::worker::WorkerPool`] shares it across
//! async callers.

mod buffers;
mod objects;

use tracing::{debug, info};

use crate::core::{BridgeConfig, Outcome, WrappedValue};
use crate::dispatch::{self, Arg};
use crate::store::{Handle, ObjectStore};
use crate::utils::{BridgeError, BridgeResult};

#[derive(Debug)]
pub struct VisionBridge {
    store: ObjectStore,
    config: BridgeConfig,
}

impl Default for VisionBridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl VisionBridge {
    pub fn new(config: BridgeConfig) -> Self {
        let store = match config.max_objects {
            Some(limit) => ObjectStore::with_limit(limit),
            None => ObjectStore::new(),
        };
        debug!("Bridge created (max objects: {:?})", config.max_objects);
        Self { store, config }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    /// Runs the named verb against the store.
    pub fn invoke(&mut self, verb: &str, args: &[Arg]) -> BridgeResult<Outcome> {
        dispatch::invoke(&mut self.store, verb, args)
    }

    /// Drops every stored object. Handles issued before this call stop
    /// resolving.
    pub fn clear_buffers(&mut self) {
        let dropped = self.store.len();
        self.store.clear();
        info!("Cleared {} stored object(s)", dropped);
    }

    /// Handle of `wrapped`, checked against the kind actually stored.
    fn resolve(&self, wrapped: &WrappedValue) -> BridgeResult<Handle> {
        let handle = wrapped.handle()?;
        let found = self.store.kind_of(&handle)?;
        if found != wrapped.kind {
            return Err(BridgeError::type_mismatch(&wrapped.id, wrapped.kind.tag(), found.tag()));
        }
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::Point;
    use crate::store::ObjectKind;

    #[test]
    fn configured_limit_caps_the_store() {
        let mut bridge = VisionBridge::new(BridgeConfig {
            max_objects: Some(1),
            ..BridgeConfig::default()
        });
        bridge.store_mut().save(Point::new(1, 1)).unwrap();
        assert_eq!(
            bridge.store_mut().save(Point::new(2, 2)).unwrap_err(),
            BridgeError::Capacity(1)
        );
    }

    #[test]
    fn clear_invalidates_wrapped_handles() {
        let mut bridge = VisionBridge::default();
        let h = bridge.store_mut().save(Point::new(3, 4)).unwrap();
        let wrapped = WrappedValue::wrap(ObjectKind::Point, h);
        assert!(bridge.resolve(&wrapped).is_ok());
        bridge.clear_buffers();
        assert!(bridge.resolve(&wrapped).unwrap_err().is_lookup());
    }

    #[test]
    fn declared_kind_must_match_stored_kind() {
        let mut bridge = VisionBridge::default();
        let h = bridge.store_mut().save(Point::new(3, 4)).unwrap();
        let lying = WrappedValue::wrap(ObjectKind::Rect, h);
        assert!(matches!(
            bridge.resolve(&lying),
            Err(BridgeError::TypeMismatch { .. })
        ));
    }
}
