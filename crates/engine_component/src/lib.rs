//! # engine_component
//!
//! The ECS core: entity handles, per-type component storage, and typed
//! multi-component iteration.
//!
//! This crate provides:
//!
//! - [`Entity`] / [`EntityRegistry`]: generational handles with lowest-index
//!   slot reuse.
//! - [`Component`] / [`ComponentTypeId`]: the component contract and its
//!   stable type identity.
//! - [`ComponentStore`]: sparse-set storage for one component type.
//! - [`ComponentManager`]: the facade owning the registry and all stores,
//!   plus the `for_each*` query engine.
//! - [`Commands`]: deferred structural changes applied at frame boundaries.
//! - [`InstanceController`]: explicit create/get/destroy of the shared
//!   manager.
//!
//! ## Usage
//!
//! ```rust
//! use engine_component::{Component, InstanceController};
//!
//! #[derive(Debug)]
//! struct Position(f32);
//! impl Component for Position {}
//!
//! #[derive(Debug)]
//! struct Velocity(f32);
//! impl Component for Velocity {}
//!
//! let mut instance = InstanceController::new();
//! let manager = instance.create().unwrap();
//! manager.register::<Position>().unwrap();
//! manager.register::<Velocity>().unwrap();
//!
//! let e = manager.create_entity();
//! manager.create_component(e, Position(0.0)).unwrap();
//! manager.create_component(e, Velocity(2.0)).unwrap();
//!
//! manager
//!     .for_each2::<Position, Velocity, _>(|_, pos, vel| pos.0 += vel.0)
//!     .unwrap();
//! assert_eq!(manager.get_component::<Position>(e).unwrap().0, 2.0);
//!
//! instance.destroy();
//! ```
//!
//! Structural changes from inside a query do not compile; record them into
//! [`Commands`] instead:
//!
//! ```compile_fail
//! use engine_component::{Component, ComponentManager};
//!
//! struct Health(i32);
//! impl Component for Health {}
//!
//! let mut manager = ComponentManager::new();
//! manager.register::<Health>().unwrap();
//! manager
//!     .for_each::<Health, _>(|_, _| {
//!         manager.create_entity();
//!     })
//!     .unwrap();
//! ```

pub mod commands;
pub mod component;
pub mod entity;
pub mod error;
pub mod instance;
pub mod manager;
pub mod query;
pub mod storage;

pub use commands::Commands;
pub use component::{Component, ComponentTypeId};
pub use entity::{Entity, EntityRegistry};
pub use error::EcsError;
pub use instance::InstanceController;
pub use manager::ComponentManager;
pub use storage::ComponentStore;
