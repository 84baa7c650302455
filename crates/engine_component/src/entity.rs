//! Entity handles and the registry that allocates them.
//!
//! An [`Entity`] is an opaque `(index, generation)` pair. The index addresses
//! a slot in the [`EntityRegistry`]; the generation tells a handle issued for
//! the current occupant of that slot apart from handles issued for earlier,
//! already destroyed occupants.

use std::collections::BTreeSet;

use crate::error::EcsError;

/// A handle identifying an entity.
///
/// Entities carry no data of their own. Two handles are equal only when both
/// index and generation match, so a handle kept past `destroy_entity` never
/// compares equal to the entity that later reuses its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index of this handle.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time this handle was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    alive: bool,
}

/// Allocates and recycles entity handles and tracks their liveness.
///
/// Freed indices are reused lowest-first. Each destruction bumps the slot's
/// generation, which turns every previously issued handle for that index
/// into an invalid one.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    slots: Vec<Slot>,
    free: BTreeSet<u32>,
    alive_count: usize,
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Allocates the lowest free index and returns a handle for it.
    pub fn create(&mut self) -> Entity {
        self.alive_count += 1;

        if let Some(index) = self.free.pop_first() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            return Entity::new(index, slot.generation);
        }

        let index = u32::try_from(self.slots.len()).unwrap_or_else(|_| {
            panic!("entity registry exhausted: more than {} slots", u32::MAX)
        });
        self.slots.push(Slot {
            generation: 0,
            alive: true,
        });
        Entity::new(index, 0)
    }

    /// Marks the entity dead and invalidates every handle issued for it.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidEntity`] if the handle is unknown, stale, or
    /// already destroyed.
    pub fn destroy(&mut self, entity: Entity) -> Result<(), EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::InvalidEntity(entity));
        }

        let slot = &mut self.slots[entity.index() as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.insert(entity.index());
        self.alive_count -= 1;
        Ok(())
    }

    /// Returns `true` iff the index is alive and the generation matches.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.slots
            .get(entity.index() as usize)
            .is_some_and(|slot| slot.alive && slot.generation == entity.generation())
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the number of slots ever allocated, live or free.
    #[must_use]
    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of slots waiting to be reused.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Iterates over live handles in index order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.alive.then(|| Entity::new(index as u32, slot.generation)))
    }

    /// Destroys every live entity.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.alive {
                slot.alive = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.insert(index as u32);
            }
        }
        self.alive_count = 0;
    }
}
