//! Error types for the ECS core.

use crate::entity::Entity;

/// Errors returned by entity, component, and instance operations.
///
/// Every variant is a recoverable, caller-visible condition. Corrupted
/// internal state is reported by panicking instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The handle refers to an unknown index or carries a stale generation.
    #[error("invalid entity {0}")]
    InvalidEntity(Entity),

    /// The entity already holds a component of this type.
    #[error("entity {entity} already has a `{component}` component")]
    DuplicateComponent {
        /// The entity the component was created on.
        entity: Entity,
        /// Name of the component type.
        component: &'static str,
    },

    /// The entity holds no component of this type.
    #[error("entity {entity} has no `{component}` component")]
    MissingComponent {
        /// The entity that was queried.
        entity: Entity,
        /// Name of the component type.
        component: &'static str,
    },

    /// No store has been registered for this component type.
    #[error("component type `{0}` is not registered")]
    UnregisteredComponentType(&'static str),

    /// Two distinct component types hash to the same type id. Raised when the
    /// second type registers or is used against the first type's store.
    #[error("component type `{new}` collides with registered type `{existing}`")]
    TypeIdCollision {
        /// The type already owning the id.
        existing: &'static str,
        /// The type being registered or looked up.
        new: &'static str,
    },

    /// A query named the same component type more than once.
    #[error("query names component type `{0}` more than once")]
    AliasedQuery(&'static str),

    /// A manager instance is already live.
    #[error("a component manager instance already exists")]
    InstanceAlreadyExists,
}
