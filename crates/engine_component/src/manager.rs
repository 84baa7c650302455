//! The [`ComponentManager`] facade.
//!
//! The manager exclusively owns the entity registry and one
//! [`ComponentStore`] per registered component type. Stores are kept
//! type-erased in a map keyed by [`ComponentTypeId`] and downcast back to
//! their concrete type at each generic call site.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, trace};

use crate::component::{Component, ComponentTypeId};
use crate::entity::{Entity, EntityRegistry};
use crate::error::EcsError;
use crate::storage::{ComponentStore, ErasedStore};

pub(crate) type StoreMap = HashMap<ComponentTypeId, Box<dyn ErasedStore>>;

/// Owns all entity and component state.
///
/// Client code holds only [`Entity`] handles and short-lived references
/// returned by accessors. Those references borrow the manager, so they cannot
/// outlive the next structural change.
#[derive(Default)]
pub struct ComponentManager {
    registry: EntityRegistry,
    pub(crate) stores: StoreMap,
    /// Driver entities of the query in flight, reused between calls.
    pub(crate) query_scratch: Vec<Entity>,
}

impl ComponentManager {
    /// Creates an empty manager with no registered component types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty manager with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: EntityRegistry::with_capacity(capacity),
            ..Self::default()
        }
    }

    // -- Registration --

    /// Registers a store for `T`.
    ///
    /// Returns `false` if `T` was already registered.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TypeIdCollision`] if another type already owns
    /// `T`'s [`ComponentTypeId`].
    pub fn register<T: Component>(&mut self) -> Result<bool, EcsError> {
        match self.stores.entry(T::component_type_id()) {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                if existing.as_any().is::<ComponentStore<T>>() {
                    Ok(false)
                } else {
                    Err(EcsError::TypeIdCollision {
                        existing: existing.type_name(),
                        new: T::type_name(),
                    })
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Box::new(ComponentStore::<T>::new()));
                debug!(component = T::type_name(), "registered component store");
                Ok(true)
            }
        }
    }

    /// Returns `true` if a store exists for `T`.
    #[must_use]
    pub fn is_registered<T: Component>(&self) -> bool {
        self.stores
            .get(&T::component_type_id())
            .is_some_and(|store| store.as_any().is::<ComponentStore<T>>())
    }

    /// Returns the store for `T`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::UnregisteredComponentType`] if `T` has no store.
    /// - [`EcsError::TypeIdCollision`] if `T`'s id belongs to another type.
    pub fn store<T: Component>(&self) -> Result<&ComponentStore<T>, EcsError> {
        let store = self
            .stores
            .get(&T::component_type_id())
            .ok_or(EcsError::UnregisteredComponentType(T::type_name()))?;
        downcast_store_ref(&**store)
    }

    fn store_mut<T: Component>(&mut self) -> Result<&mut ComponentStore<T>, EcsError> {
        let store = self
            .stores
            .get_mut(&T::component_type_id())
            .ok_or(EcsError::UnregisteredComponentType(T::type_name()))?;
        downcast_store(store)
    }

    // -- Entity lifecycle --

    /// Allocates a new entity.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.registry.create();
        debug!(%entity, "created entity");
        entity
    }

    /// Destroys an entity and eagerly removes its components from every store.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidEntity`] if the handle is stale or already
    /// destroyed. Destroying twice is an error, not a no-op.
    pub fn destroy_entity(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.registry.destroy(entity)?;

        let mut purged = 0usize;
        for store in self.stores.values_mut() {
            if store.purge(entity) {
                purged += 1;
            }
        }
        debug!(%entity, purged, "destroyed entity");
        Ok(())
    }

    /// Returns `true` if the handle refers to a live entity.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.registry.is_alive(entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.registry.alive_count()
    }

    /// Iterates over live entities in index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.registry.iter()
    }

    /// Read access to the entity registry.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    // -- Component lifecycle --

    /// Attaches `value` to `entity` and returns a reference to the stored
    /// component.
    ///
    /// # Errors
    ///
    /// - [`EcsError::UnregisteredComponentType`] if `T` has no store.
    /// - [`EcsError::InvalidEntity`] if `entity` is not alive.
    /// - [`EcsError::DuplicateComponent`] if `entity` already has a `T`.
    pub fn create_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<&mut T, EcsError> {
        let alive = self.registry.is_alive(entity);
        let store = self.store_mut::<T>()?;
        if !alive {
            return Err(EcsError::InvalidEntity(entity));
        }
        let component = store.insert(entity, value)?;
        trace!(%entity, component = T::type_name(), "created component");
        Ok(component)
    }

    /// Returns the `T` of `entity`.
    ///
    /// # Errors
    ///
    /// - [`EcsError::UnregisteredComponentType`] if `T` has no store.
    /// - [`EcsError::MissingComponent`] if `entity` has no `T` or is dead.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.store::<T>()?.get(entity)
    }

    /// Mutable variant of [`ComponentManager::get_component`].
    ///
    /// # Errors
    ///
    /// Same as [`ComponentManager::get_component`].
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.store_mut::<T>()?.get_mut(entity)
    }

    /// Non-failing lookup. Returns `None` when `T` is unregistered or absent.
    #[must_use]
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.store::<T>().ok()?.try_get(entity)
    }

    /// Returns `true` if `entity` currently has a `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.try_get_component::<T>(entity).is_some()
    }

    /// Detaches and returns the `T` of `entity`.
    ///
    /// Removing an absent component is not an error and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponentType`] if `T` has no store.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<Option<T>, EcsError> {
        let removed = self.store_mut::<T>()?.remove(entity);
        if removed.is_some() {
            trace!(%entity, component = T::type_name(), "removed component");
        }
        Ok(removed)
    }

    /// Returns the number of live `T` components.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnregisteredComponentType`] if `T` has no store.
    pub fn component_count<T: Component>(&self) -> Result<usize, EcsError> {
        Ok(self.store::<T>()?.len())
    }

    /// Destroys every entity and component. Registrations are kept.
    pub fn clear(&mut self) {
        for store in self.stores.values_mut() {
            store.clear();
        }
        self.registry.clear();
        debug!("cleared component manager");
    }
}

impl std::fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stores: HashMap<&'static str, usize> = self
            .stores
            .values()
            .map(|store| (store.type_name(), store.len()))
            .collect();
        f.debug_struct("ComponentManager")
            .field("entities", &self.registry.alive_count())
            .field("stores", &stores)
            .finish()
    }
}

/// Downcasts a type-erased store back to `ComponentStore<T>`.
///
/// # Errors
///
/// Returns [`EcsError::TypeIdCollision`] if the store under `T`'s id holds
/// another type. `register` rejects such pairs, but an unregistered `T` can
/// still share the id of a registered one.
pub(crate) fn downcast_store<T: Component>(
    store: &mut Box<dyn ErasedStore>,
) -> Result<&mut ComponentStore<T>, EcsError> {
    let existing = store.type_name();
    store
        .as_any_mut()
        .downcast_mut::<ComponentStore<T>>()
        .ok_or(EcsError::TypeIdCollision {
            existing,
            new: T::type_name(),
        })
}

fn downcast_store_ref<T: Component>(store: &dyn ErasedStore) -> Result<&ComponentStore<T>, EcsError> {
    store
        .as_any()
        .downcast_ref::<ComponentStore<T>>()
        .ok_or(EcsError::TypeIdCollision {
            existing: store.type_name(),
            new: T::type_name(),
        })
}
