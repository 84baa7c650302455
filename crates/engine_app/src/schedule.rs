//! Ordered system execution.
//!
//! Systems run one after another in registration order, so component writes
//! made by one system are visible to every system after it in the same
//! frame. Structural changes go into the shared [`Commands`] buffer and are
//! applied once, after the last system.

use engine_component::{Commands, ComponentManager, EcsError};
use tracing::{debug, trace};

use crate::components::{ControlsComponent, MovementComponent, RenderComponent};
use crate::input::InputState;

/// What a system sees while it runs.
pub struct FrameContext<'a> {
    pub manager: &'a mut ComponentManager,
    pub commands: &'a mut Commands,
    pub input: &'a InputState,
    /// Seconds since the previous frame.
    pub dt: f32,
}

pub type SystemFn = Box<dyn FnMut(&mut FrameContext<'_>) -> Result<(), EcsError>>;

struct RegisteredSystem {
    name: String,
    run: SystemFn,
}

#[derive(Default)]
pub struct Schedule {
    systems: Vec<RegisteredSystem>,
    commands: Commands,
}

impl Schedule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a system. Names are for logging and need not be unique.
    pub fn add_system<F>(&mut self, name: impl Into<String>, system: F) -> &mut Self
    where
        F: FnMut(&mut FrameContext<'_>) -> Result<(), EcsError> + 'static,
    {
        let name = name.into();
        debug!(system = %name, position = self.systems.len(), "system added");
        self.systems.push(RegisteredSystem {
            name,
            run: Box::new(system),
        });
        self
    }

    pub fn system_names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|system| system.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Runs every system once, then applies the structural changes they
    /// queued. Returns the number of commands applied.
    ///
    /// # Errors
    ///
    /// The first system error aborts the frame; commands queued so far are
    /// discarded. A failing command is returned after the commands ahead of
    /// it have been applied, and the commands behind it are discarded. No
    /// command outlives the frame that queued it.
    pub fn run(
        &mut self,
        manager: &mut ComponentManager,
        input: &InputState,
        dt: f32,
    ) -> Result<usize, EcsError> {
        let mut ctx = FrameContext {
            manager,
            commands: &mut self.commands,
            input,
            dt,
        };

        for system in &mut self.systems {
            trace!(system = %system.name, "running system");
            if let Err(err) = (system.run)(&mut ctx) {
                ctx.commands.clear();
                return Err(err);
            }
        }

        let applied = ctx.commands.apply(&mut *ctx.manager).inspect_err(|_| {
            // Nothing queued outlives its frame.
            ctx.commands.clear();
        })?;
        if applied > 0 {
            debug!(applied, "frame commands applied");
        }
        Ok(applied)
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("systems", &self.system_names().collect::<Vec<_>>())
            .field("commands", &self.commands)
            .finish()
    }
}

/// Points every keyboard-controlled entity along the held arrow keys.
pub fn controls_system(ctx: &mut FrameContext<'_>) -> Result<(), EcsError> {
    let input = ctx.input;
    ctx.manager
        .for_each2::<ControlsComponent, MovementComponent, _>(|_, controls, movement| {
            controls.update(input, movement);
        })?;
    Ok(())
}

/// Moves every sprite that has a movement component.
pub fn movement_system(ctx: &mut FrameContext<'_>) -> Result<(), EcsError> {
    let dt = ctx.dt;
    ctx.manager
        .for_each2::<MovementComponent, RenderComponent, _>(|_, movement, render| {
            movement.update(dt, render);
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use engine_component::Component;
    use engine_math::Vec2;

    use super::*;
    use crate::input::Key;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);
    impl Component for Counter {}

    fn manager() -> ComponentManager {
        let mut manager = ComponentManager::new();
        manager.register::<Counter>().unwrap();
        manager.register::<ControlsComponent>().unwrap();
        manager.register::<MovementComponent>().unwrap();
        manager.register::<RenderComponent>().unwrap();
        manager
    }

    #[test]
    fn test_systems_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut schedule = Schedule::new();
        for name in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            schedule.add_system(name, move |_| {
                log.borrow_mut().push(name);
                Ok(())
            });
        }

        schedule.run(&mut manager(), &InputState::new(), 0.0).unwrap();

        assert_eq!(*log.borrow(), ["first", "second", "third"]);
        assert_eq!(
            schedule.system_names().collect::<Vec<_>>(),
            ["first", "second", "third"]
        );
    }

    #[test]
    fn test_later_system_sees_earlier_writes() {
        let mut manager = manager();
        let e = manager.create_entity();
        manager.create_component(e, Counter(0)).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_system = Rc::clone(&seen);
        let mut schedule = Schedule::new();
        schedule
            .add_system("increment", |ctx| {
                ctx.manager.for_each::<Counter, _>(|_, c| c.0 += 1)?;
                Ok(())
            })
            .add_system("observe", move |ctx| {
                ctx.manager
                    .for_each::<Counter, _>(|_, c| seen_in_system.borrow_mut().push(c.0))?;
                Ok(())
            });

        schedule.run(&mut manager, &InputState::new(), 0.0).unwrap();
        schedule.run(&mut manager, &InputState::new(), 0.0).unwrap();

        assert_eq!(*seen.borrow(), [1, 2]);
    }

    #[test]
    fn test_commands_apply_after_last_system() {
        let mut manager = manager();
        let e = manager.create_entity();
        manager.create_component(e, Counter(0)).unwrap();

        let mut schedule = Schedule::new();
        schedule
            .add_system("despawn", |ctx| {
                let commands = &mut *ctx.commands;
                ctx.manager
                    .for_each::<Counter, _>(|entity, _| commands.destroy_entity(entity))?;
                Ok(())
            })
            .add_system("still_there", move |ctx| {
                assert!(ctx.manager.is_alive(e));
                Ok(())
            });

        assert_eq!(schedule.run(&mut manager, &InputState::new(), 0.0), Ok(1));
        assert!(!manager.is_alive(e));
    }

    #[test]
    fn test_system_error_discards_queued_commands() {
        let mut manager = manager();
        let mut schedule = Schedule::new();
        schedule
            .add_system("spawner", |ctx| {
                ctx.commands.spawn(|_, _| Ok(()));
                Ok(())
            })
            .add_system("broken", |ctx| {
                ctx.manager.for_each::<Counter, _>(|_, _| {})?;
                Err(EcsError::AliasedQuery("broken"))
            });

        assert!(schedule.run(&mut manager, &InputState::new(), 0.0).is_err());
        assert_eq!(manager.entity_count(), 0);
        assert_eq!(schedule.run(&mut manager, &InputState::new(), 0.0).ok(), None);
        assert_eq!(manager.entity_count(), 0);
    }

    #[test]
    fn test_failed_command_does_not_leak_into_next_frame() {
        let mut manager = manager();
        let e = manager.create_entity();
        let first_frame = Rc::new(RefCell::new(true));

        let mut schedule = Schedule::new();
        let queue_once = Rc::clone(&first_frame);
        schedule.add_system("double_destroy", move |ctx| {
            if queue_once.replace(false) {
                ctx.commands.destroy_entity(e);
                ctx.commands.destroy_entity(e);
                ctx.commands.insert(e, Counter(1));
            }
            Ok(())
        });

        assert_eq!(
            schedule.run(&mut manager, &InputState::new(), 0.0),
            Err(EcsError::InvalidEntity(e))
        );
        assert!(!manager.is_alive(e));
        assert_eq!(schedule.run(&mut manager, &InputState::new(), 0.0), Ok(0));
        assert_eq!(manager.component_count::<Counter>().unwrap(), 0);
    }

    #[test]
    fn test_controls_then_movement_in_one_frame() {
        let mut manager = manager();
        let e = manager.create_entity();
        manager.create_component(e, ControlsComponent).unwrap();
        manager.create_component(e, MovementComponent::new(10.0)).unwrap();
        manager
            .create_component(
                e,
                RenderComponent {
                    texture: "bomb".to_owned(),
                    position: Vec2::ZERO,
                    size: Vec2::splat(64.0),
                    texture_rect: Default::default(),
                    color: Default::default(),
                },
            )
            .unwrap();

        let mut schedule = Schedule::new();
        schedule
            .add_system("controls", controls_system)
            .add_system("movement", movement_system);

        let mut input = InputState::new();
        input.press(Key::Right);
        schedule.run(&mut manager, &input, 0.5).unwrap();

        let render = manager.get_component::<RenderComponent>(e).unwrap();
        assert_eq!(render.position, Vec2::new(5.0, 0.0));
    }
}
