//! Deferred structural changes.
//!
//! Queries borrow the manager exclusively, so systems record entity and
//! component creation/destruction into a [`Commands`] buffer and the host
//! applies it at the frame boundary.

use std::collections::VecDeque;

use tracing::warn;

use crate::component::Component;
use crate::entity::Entity;
use crate::error::EcsError;
use crate::manager::ComponentManager;

type Command = Box<dyn FnOnce(&mut ComponentManager) -> Result<(), EcsError>>;

struct Queued {
    label: &'static str,
    entity: Option<Entity>,
    run: Command,
}

/// A FIFO buffer of structural changes to apply to a [`ComponentManager`].
///
/// # Examples
///
/// ```rust
/// use engine_component::{Commands, Component, ComponentManager};
///
/// struct Health(i32);
/// impl Component for Health {}
///
/// let mut manager = ComponentManager::new();
/// manager.register::<Health>().unwrap();
/// let e = manager.create_entity();
/// manager.create_component(e, Health(0)).unwrap();
///
/// let mut commands = Commands::new();
/// manager
///     .for_each::<Health, _>(|entity, health| {
///         if health.0 <= 0 {
///             commands.destroy_entity(entity);
///         }
///     })
///     .unwrap();
/// commands.apply(&mut manager).unwrap();
/// assert!(!manager.is_alive(e));
/// ```
#[derive(Default)]
pub struct Commands {
    queue: VecDeque<Queued>,
}

impl Commands {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, label: &'static str, entity: Option<Entity>, run: Command) {
        self.queue.push_back(Queued { label, entity, run });
    }

    /// Queues the creation of an entity, then runs `build` to attach its
    /// components. If `build` fails the new entity is destroyed again.
    pub fn spawn<F>(&mut self, build: F)
    where
        F: FnOnce(&mut ComponentManager, Entity) -> Result<(), EcsError> + 'static,
    {
        self.push(
            "spawn",
            None,
            Box::new(move |manager: &mut ComponentManager| {
                let entity = manager.create_entity();
                build(&mut *manager, entity).inspect_err(|_| {
                    // `build` may already have destroyed it.
                    let _ = manager.destroy_entity(entity);
                })
            }),
        );
    }

    /// Queues the destruction of `entity`.
    pub fn destroy_entity(&mut self, entity: Entity) {
        self.push(
            "destroy_entity",
            Some(entity),
            Box::new(move |manager: &mut ComponentManager| manager.destroy_entity(entity)),
        );
    }

    /// Queues attaching `value` to `entity`.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) {
        self.push(
            "insert",
            Some(entity),
            Box::new(move |manager: &mut ComponentManager| {
                manager.create_component(entity, value).map(|_| ())
            }),
        );
    }

    /// Queues removing the `T` of `entity`.
    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.push(
            "remove",
            Some(entity),
            Box::new(move |manager: &mut ComponentManager| {
                manager.remove_component::<T>(entity).map(|_| ())
            }),
        );
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Discards every queued command.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Applies queued commands in recording order and returns how many ran.
    ///
    /// # Errors
    ///
    /// Stops at the first command that fails and returns its error. That
    /// command is consumed; the ones after it stay queued.
    pub fn apply(&mut self, manager: &mut ComponentManager) -> Result<usize, EcsError> {
        let mut applied = 0usize;
        while let Some(command) = self.queue.pop_front() {
            if let Err(err) = (command.run)(&mut *manager) {
                warn!(
                    command = command.label,
                    entity = ?command.entity,
                    remaining = self.queue.len(),
                    %err,
                    "queued command failed"
                );
                return Err(err);
            }
            applied += 1;
        }
        Ok(applied)
    }
}

impl std::fmt::Debug for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.queue.iter().map(|queued| (queued.label, queued.entity)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(i32);
    impl Component for Health {}

    #[derive(Debug, Clone, PartialEq)]
    struct Poisoned;
    impl Component for Poisoned {}

    fn manager() -> ComponentManager {
        let mut manager = ComponentManager::new();
        manager.register::<Health>().unwrap();
        manager.register::<Poisoned>().unwrap();
        manager
    }

    #[test]
    fn test_changes_are_deferred_until_apply() {
        let mut manager = manager();
        let e = manager.create_entity();
        let mut commands = Commands::new();

        commands.insert(e, Health(10));
        assert!(!manager.has_component::<Health>(e));
        assert_eq!(commands.len(), 1);

        assert_eq!(commands.apply(&mut manager).unwrap(), 1);
        assert_eq!(manager.get_component::<Health>(e).unwrap(), &Health(10));
        assert!(commands.is_empty());
    }

    #[test]
    fn test_destroy_recorded_during_query() {
        let mut manager = manager();
        let dying = manager.create_entity();
        let healthy = manager.create_entity();
        manager.create_component(dying, Health(0)).unwrap();
        manager.create_component(healthy, Health(5)).unwrap();

        let mut commands = Commands::new();
        manager
            .for_each::<Health, _>(|entity, health| {
                if health.0 <= 0 {
                    commands.destroy_entity(entity);
                }
            })
            .unwrap();

        // The query saw both entities; nothing changed structurally yet.
        assert!(manager.is_alive(dying));
        commands.apply(&mut manager).unwrap();
        assert!(!manager.is_alive(dying));
        assert!(manager.is_alive(healthy));
    }

    #[test]
    fn test_insert_recorded_during_query() {
        let mut manager = manager();
        let e = manager.create_entity();
        manager.create_component(e, Health(3)).unwrap();

        let mut commands = Commands::new();
        manager
            .for_each::<Health, _>(|entity, _| commands.insert(entity, Poisoned))
            .unwrap();
        commands.apply(&mut manager).unwrap();

        assert!(manager.has_component::<Poisoned>(e));
    }

    #[test]
    fn test_spawn_builds_entity() {
        let mut manager = manager();
        let mut commands = Commands::new();
        commands.spawn(|manager, entity| {
            manager.create_component(entity, Health(7))?;
            Ok(())
        });
        commands.apply(&mut manager).unwrap();

        assert_eq!(manager.entity_count(), 1);
        assert_eq!(manager.component_count::<Health>().unwrap(), 1);
    }

    #[test]
    fn test_failed_spawn_leaves_no_entity() {
        let mut manager = manager();
        let mut commands = Commands::new();
        commands.spawn(|manager, entity| {
            manager.create_component(entity, Health(1))?;
            manager.create_component(entity, Health(2))?;
            Ok(())
        });

        assert!(matches!(
            commands.apply(&mut manager),
            Err(EcsError::DuplicateComponent { .. })
        ));
        assert_eq!(manager.entity_count(), 0);
        assert_eq!(manager.component_count::<Health>().unwrap(), 0);
    }

    #[test]
    fn test_apply_stops_at_first_failure_and_keeps_rest() {
        let mut manager = manager();
        let e = manager.create_entity();
        let mut commands = Commands::new();

        commands.destroy_entity(e);
        commands.destroy_entity(e);
        commands.insert(e, Health(1));

        assert_eq!(commands.apply(&mut manager), Err(EcsError::InvalidEntity(e)));
        assert_eq!(commands.len(), 1);

        commands.clear();
        assert!(commands.is_empty());
    }

    #[test]
    fn test_remove_of_absent_component_is_not_an_error() {
        let mut manager = manager();
        let e = manager.create_entity();
        let mut commands = Commands::new();
        commands.remove::<Poisoned>(e);
        assert_eq!(commands.apply(&mut manager), Ok(1));
    }
}
