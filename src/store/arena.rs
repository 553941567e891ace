use tracing::{debug, info};

use crate::store::handle::Handle;
use crate::store::value::{ObjectKind, Storable, StoredValue};
use crate::utils::{BridgeError, BridgeResult};

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    value: Option<StoredValue>,
}

/// Generational arena owning every value reachable through a handle.
#[derive(Debug, Default)]
pub struct ObjectStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    max_objects: Option<usize>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses to hold more than `max_objects` live values.
    pub fn with_limit(max_objects: usize) -> Self {
        Self {
            max_objects: Some(max_objects),
            ..Self::default()
        }
    }

    pub fn save<T: Storable>(&mut self, value: T) -> BridgeResult<Handle> {
        self.save_value(value.into_value())
    }

    pub fn save_value(&mut self, value: StoredValue) -> BridgeResult<Handle> {
        if let Some(limit) = self.max_objects {
            if self.live >= limit {
                return Err(BridgeError::Capacity(limit));
            }
        }
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| BridgeError::Capacity(u32::MAX as usize))?;
                self.slots.push(Slot::default());
                index
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        self.live += 1;
        Ok(Handle::new(index, slot.generation))
    }

    fn slot(&self, handle: &Handle) -> BridgeResult<&StoredValue> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
            .ok_or_else(|| BridgeError::lookup(handle.id()))
    }

    fn slot_mut(&mut self, handle: &Handle) -> BridgeResult<&mut StoredValue> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
            .ok_or_else(|| BridgeError::lookup(handle.id()))
    }

    pub fn get_value(&self, handle: &Handle) -> BridgeResult<&StoredValue> {
        self.slot(handle)
    }

    pub fn kind_of(&self, handle: &Handle) -> BridgeResult<ObjectKind> {
        Ok(self.slot(handle)?.kind())
    }

    pub fn get<T: Storable>(&self, handle: &Handle) -> BridgeResult<&T> {
        let value = self.slot(handle)?;
        T::from_ref(value).ok_or_else(|| BridgeError::type_mismatch(handle.id(), T::KIND.tag(), value.kind().tag()))
    }

    pub fn get_mut<T: Storable>(&mut self, handle: &Handle) -> BridgeResult<&mut T> {
        let value = self.slot_mut(handle)?;
        let found = value.kind();
        T::from_mut(value).ok_or_else(|| BridgeError::type_mismatch(handle.id(), T::KIND.tag(), found.tag()))
    }

    /// Overwrites the referent of a live handle, whatever its kind was.
    pub fn replace(&mut self, handle: &Handle, value: StoredValue) -> BridgeResult<()> {
        *self.slot_mut(handle)? = value;
        Ok(())
    }

    /// Drops every value and invalidates every issued handle.
    pub fn clear(&mut self) {
        let dropped = self.live;
        for slot in &mut self.slots {
            slot.value = None;
            slot.generation = slot.generation.wrapping_add(1);
        }
        self.free = (0..self.slots.len() as u32).rev().collect();
        self.live = 0;
        info!("Object store cleared ({} objects released)", dropped);
        debug!("{} slots available for reuse", self.free.len());
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{mat, Depth, Mat, MatType, Point, Rect};

    #[test]
    fn saved_values_resolve_by_handle() {
        let mut store = ObjectStore::new();
        let a = store.save(Point::new(1, 2)).unwrap();
        let b = store.save(Rect::new(0, 0, 3, 3)).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.get::<Point>(&a).unwrap(), &Point::new(1, 2));
        assert_eq!(store.kind_of(&b).unwrap(), ObjectKind::Rect);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn wrong_kind_reports_both_kinds() {
        let mut store = ObjectStore::new();
        let h = store.save(Point::new(1, 2)).unwrap();
        let err = store.get::<Mat>(&h).unwrap_err();
        assert_eq!(
            err,
            BridgeError::type_mismatch(h.id(), "mat", "point")
        );
    }

    #[test]
    fn clear_invalidates_old_handles_and_reuses_slots() {
        let mut store = ObjectStore::new();
        let old = store.save(mat::zeros(2, 2, MatType::new(Depth::U8, 1)).unwrap()).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert!(store.get::<Mat>(&old).unwrap_err().is_lookup());

        let fresh = store.save(Point::new(0, 0)).unwrap();
        assert_eq!(fresh.index(), old.index());
        assert_ne!(fresh.generation(), old.generation());
        assert!(store.get_value(&old).is_err());
    }

    #[test]
    fn replace_can_change_kind() {
        let mut store = ObjectStore::new();
        let h = store.save(Point::new(0, 0)).unwrap();
        store.replace(&h, StoredValue::Rect(Rect::new(1, 1, 1, 1))).unwrap();
        assert_eq!(store.kind_of(&h).unwrap(), ObjectKind::Rect);
        store.get_mut::<Rect>(&h).unwrap().width = 5;
        assert_eq!(store.get::<Rect>(&h).unwrap().width, 5);
    }

    #[test]
    fn limit_is_enforced() {
        let mut store = ObjectStore::with_limit(1);
        store.save(Point::new(0, 0)).unwrap();
        assert_eq!(store.save(Point::new(1, 1)).unwrap_err(), BridgeError::Capacity(1));
        store.clear();
        assert!(store.save(Point::new(1, 1)).is_ok());
    }
}
