//! Per-type component storage.
//!
//! A [`ComponentStore`] is a sparse set: `sparse[entity.index()]` holds the
//! row of the entity's component in the dense arrays, and the dense arrays
//! hold the owning handle and the value side by side. Lookups are O(1) and
//! iteration walks contiguous memory. Removal swap-removes, so dense order is
//! not stable across insert/remove cycles.

use std::any::Any;

use crate::component::Component;
use crate::entity::Entity;
use crate::error::EcsError;

/// Dense storage mapping live entities to at most one `T` each.
#[derive(Debug)]
pub struct ComponentStore<T> {
    sparse: Vec<Option<u32>>,
    entities: Vec<Entity>,
    data: Vec<T>,
}

impl<T: Component> ComponentStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            data: Vec::new(),
        }
    }

    fn row(&self, entity: Entity) -> Option<usize> {
        let row = (*self.sparse.get(entity.index() as usize)?)? as usize;
        (self.entities[row] == entity).then_some(row)
    }

    /// Stores `value` for `entity` and returns a reference to it.
    ///
    /// The store does not know about liveness; the manager checks it before
    /// calling in.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateComponent`] if `entity` already has a `T`.
    ///
    /// # Panics
    ///
    /// Panics if the slot holds a component for an older generation of the
    /// same index, which means a destroyed entity was never purged.
    pub fn insert(&mut self, entity: Entity, value: T) -> Result<&mut T, EcsError> {
        let index = entity.index() as usize;
        if index >= self.sparse.len() {
            self.sparse.resize(index + 1, None);
        }

        if let Some(row) = self.sparse[index] {
            let owner = self.entities[row as usize];
            assert_eq!(
                owner,
                entity,
                "`{}` store holds {owner} but the registry reissued its slot as {entity}",
                T::type_name(),
            );
            return Err(EcsError::DuplicateComponent {
                entity,
                component: T::type_name(),
            });
        }

        let row = self.data.len();
        self.sparse[index] = Some(row as u32);
        self.entities.push(entity);
        self.data.push(value);
        Ok(&mut self.data[row])
    }

    /// Returns the component of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if there is none, including when
    /// the entity is dead.
    pub fn get(&self, entity: Entity) -> Result<&T, EcsError> {
        self.try_get(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: T::type_name(),
        })
    }

    /// Mutable variant of [`ComponentStore::get`].
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if there is none.
    pub fn get_mut(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.try_get_mut(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: T::type_name(),
        })
    }

    /// Non-failing lookup.
    #[must_use]
    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        self.row(entity).map(|row| &self.data[row])
    }

    /// Non-failing mutable lookup.
    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.row(entity).map(|row| &mut self.data[row])
    }

    /// Returns `true` if `entity` has a `T`.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.row(entity).is_some()
    }

    /// Removes and returns the component of `entity`. Absent is not an error.
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let row = self.row(entity)?;
        self.sparse[entity.index() as usize] = None;

        let last = self.data.len() - 1;
        if row != last {
            let moved = self.entities[last];
            self.sparse[moved.index() as usize] = Some(row as u32);
        }
        self.entities.swap_remove(row);
        Some(self.data.swap_remove(row))
    }

    /// Number of stored components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Owning entities in dense order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Iterates over `(entity, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.data.iter())
    }

    /// Iterates mutably over `(entity, component)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.data.iter_mut())
    }

    /// Drops every component.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.data.clear();
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`ComponentStore`], used by the manager to hold one
/// store per component type in a single map.
pub(crate) trait ErasedStore: Any {
    /// Name of the stored component type.
    fn type_name(&self) -> &'static str;

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Removes the entity's component if present.
    fn purge(&mut self, entity: Entity) -> bool;

    /// Drops every component.
    fn clear(&mut self);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn len(&self) -> usize {
        ComponentStore::len(self)
    }

    fn purge(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn clear(&mut self) {
        ComponentStore::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position(f32, f32);

    impl Component for Position {}

    fn e(index: u32) -> Entity {
        Entity::new(index, 0)
    }

    #[test]
    fn test_insert_then_get() {
        let mut store = ComponentStore::new();
        store.insert(e(3), Position(1.0, 2.0)).unwrap();
        assert_eq!(store.get(e(3)).unwrap(), &Position(1.0, 2.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_returns_live_reference() {
        let mut store = ComponentStore::new();
        let pos = store.insert(e(0), Position(0.0, 0.0)).unwrap();
        pos.0 = 5.0;
        assert_eq!(store.get(e(0)).unwrap().0, 5.0);
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let mut store = ComponentStore::new();
        store.insert(e(1), Position(0.0, 0.0)).unwrap();
        let err = store.insert(e(1), Position(9.0, 9.0)).unwrap_err();
        assert!(matches!(err, EcsError::DuplicateComponent { .. }));
        assert_eq!(store.get(e(1)).unwrap(), &Position(0.0, 0.0));
    }

    #[test]
    fn test_get_missing_fails() {
        let store: ComponentStore<Position> = ComponentStore::new();
        assert!(matches!(
            store.get(e(0)),
            Err(EcsError::MissingComponent { .. })
        ));
        assert!(store.try_get(e(0)).is_none());
    }

    #[test]
    fn test_lookup_with_stale_generation_misses() {
        let mut store = ComponentStore::new();
        store.insert(e(2), Position(1.0, 1.0)).unwrap();
        assert!(store.try_get(Entity::new(2, 1)).is_none());
        assert!(!store.contains(Entity::new(2, 1)));
    }

    #[test]
    #[should_panic(expected = "reissued its slot")]
    fn test_unpurged_slot_panics() {
        let mut store = ComponentStore::new();
        store.insert(e(2), Position(1.0, 1.0)).unwrap();
        let _ = store.insert(Entity::new(2, 1), Position(0.0, 0.0));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = ComponentStore::new();
        store.insert(e(0), Position(1.0, 0.0)).unwrap();
        assert_eq!(store.remove(e(0)), Some(Position(1.0, 0.0)));
        assert_eq!(store.remove(e(0)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_swap_remove_keeps_moved_entry_reachable() {
        let mut store = ComponentStore::new();
        store.insert(e(0), Position(0.0, 0.0)).unwrap();
        store.insert(e(1), Position(1.0, 1.0)).unwrap();
        store.insert(e(2), Position(2.0, 2.0)).unwrap();

        store.remove(e(0));

        assert_eq!(store.get(e(2)).unwrap(), &Position(2.0, 2.0));
        assert_eq!(store.get(e(1)).unwrap(), &Position(1.0, 1.0));
        assert_eq!(store.entities(), &[e(2), e(1)]);
    }

    #[test]
    fn test_iter_mut_pairs() {
        let mut store = ComponentStore::new();
        store.insert(e(4), Position(1.0, 0.0)).unwrap();
        store.insert(e(9), Position(2.0, 0.0)).unwrap();

        for (_, pos) in store.iter_mut() {
            pos.1 = pos.0 * 10.0;
        }

        let collected: Vec<_> = store.iter().map(|(e, p)| (e.index(), p.1)).collect();
        assert_eq!(collected, vec![(4, 10.0), (9, 20.0)]);
    }

    #[test]
    fn test_erased_purge_and_downcast() {
        let mut store: Box<dyn ErasedStore> = Box::new(ComponentStore::<Position>::new());
        store
            .as_any_mut()
            .downcast_mut::<ComponentStore<Position>>()
            .unwrap()
            .insert(e(0), Position(0.0, 0.0))
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.purge(e(0)));
        assert!(!store.purge(e(0)));
        assert!(store.type_name().ends_with("Position"));
    }
}
