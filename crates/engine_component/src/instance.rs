//! Explicit ownership of the shared [`ComponentManager`].
//!
//! There is no global. The host creates one [`InstanceController`] at
//! startup, passes it into the game loop, and creates and destroys the
//! manager through it explicitly.

use tracing::info;

use crate::error::EcsError;
use crate::manager::ComponentManager;

/// Holds at most one live [`ComponentManager`].
#[derive(Debug, Default)]
pub struct InstanceController {
    manager: Option<ComponentManager>,
}

impl InstanceController {
    /// Creates a controller with no live instance.
    #[must_use]
    pub const fn new() -> Self {
        Self { manager: None }
    }

    /// Constructs the shared manager.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InstanceAlreadyExists`] if one is already live.
    pub fn create(&mut self) -> Result<&mut ComponentManager, EcsError> {
        if self.manager.is_some() {
            return Err(EcsError::InstanceAlreadyExists);
        }
        info!("component manager instance created");
        Ok(self.manager.insert(ComponentManager::new()))
    }

    /// Returns the live manager, if any.
    #[must_use]
    pub fn get(&self) -> Option<&ComponentManager> {
        self.manager.as_ref()
    }

    /// Returns the live manager mutably, if any.
    pub fn get_mut(&mut self) -> Option<&mut ComponentManager> {
        self.manager.as_mut()
    }

    /// Destroys the live manager along with every entity and component it
    /// owns. Returns `false`, without error, when there was nothing to
    /// destroy.
    pub fn destroy(&mut self) -> bool {
        match self.manager.take() {
            Some(manager) => {
                info!(entities = manager.entity_count(), "component manager instance destroyed");
                true
            }
            None => false,
        }
    }

    /// Returns `true` while an instance is live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.manager.is_some()
    }
}
