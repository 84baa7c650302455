//! The game's components.
//!
//! A controllable sprite carries all three: [`ControlsComponent`] turns held
//! keys into a direction, [`MovementComponent`] turns that direction into
//! displacement, and [`RenderComponent`] holds where and how it is drawn.

use engine_component::Component;
use engine_math::{Color, IVec2, IntRect, Vec2};

use crate::input::{InputState, Key};
use crate::resources::{ResourceError, ResourceManager};
use crate::surface::Sprite;

/// Marks an entity as steered by the keyboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlsComponent;

impl ControlsComponent {
    /// Writes the unit direction of the held arrow keys into `movement`.
    /// Opposing keys cancel out.
    pub fn update(&self, input: &InputState, movement: &mut MovementComponent) {
        let mut direction = Vec2::ZERO;
        if input.is_held(Key::Left) {
            direction.x -= 1.0;
        }
        if input.is_held(Key::Right) {
            direction.x += 1.0;
        }
        if input.is_held(Key::Up) {
            direction.y -= 1.0;
        }
        if input.is_held(Key::Down) {
            direction.y += 1.0;
        }
        movement.direction = direction.normalize_or_zero();
    }
}

impl Component for ControlsComponent {
    fn type_name() -> &'static str {
        "ControlsComponent"
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementComponent {
    /// World units per second.
    pub speed: f32,
    pub direction: Vec2,
}

impl MovementComponent {
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            direction: Vec2::ZERO,
        }
    }

    /// Moves `render` along the current direction for `dt` seconds.
    pub fn update(&self, dt: f32, render: &mut RenderComponent) {
        render.move_position(self.direction * self.speed * dt);
    }
}

impl Component for MovementComponent {
    fn type_name() -> &'static str {
        "MovementComponent"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderComponent {
    pub texture: String,
    pub position: Vec2,
    pub size: Vec2,
    /// Source region; empty means the whole texture.
    pub texture_rect: IntRect,
    pub color: Color,
}

impl RenderComponent {
    /// A sprite of the whole texture registered as `texture_name`.
    pub fn new(resources: &ResourceManager, texture_name: &str) -> Result<Self, ResourceError> {
        Self::with_texture_rect(resources, texture_name, IntRect::default())
    }

    /// A sprite of the `texture_rect` region of `texture_name`.
    pub fn with_texture_rect(
        resources: &ResourceManager,
        texture_name: &str,
        texture_rect: IntRect,
    ) -> Result<Self, ResourceError> {
        let texture = resources.texture(texture_name)?;
        Ok(Self {
            texture: texture.name.clone(),
            position: Vec2::ZERO,
            size: texture_rect.size().as_vec2(),
            texture_rect,
            color: Color::WHITE,
        })
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn move_position(&mut self, distance: Vec2) {
        self.position += distance;
    }

    /// Slides the source region, e.g. to the next animation frame.
    pub fn set_texture_rect_position(&mut self, position: IVec2) {
        self.texture_rect.set_position(position);
    }

    #[must_use]
    pub fn texture_rect_position(&self) -> IVec2 {
        self.texture_rect.position()
    }

    #[must_use]
    pub fn sprite(&self) -> Sprite {
        Sprite {
            texture: self.texture.clone(),
            position: self.position,
            size: self.size,
            texture_rect: self.texture_rect,
            color: self.color,
        }
    }
}

impl Component for RenderComponent {
    fn type_name() -> &'static str {
        "RenderComponent"
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::resources::Texture;

    fn resources() -> ResourceManager {
        let mut resources = ResourceManager::new();
        resources.insert_texture(Texture {
            name: "bomb".to_owned(),
            path: PathBuf::from("bomb.png"),
        });
        resources
    }

    #[test]
    fn test_controls_normalize_diagonal() {
        let mut input = InputState::new();
        input.press(Key::Right);
        input.press(Key::Down);
        let mut movement = MovementComponent::new(10.0);

        ControlsComponent.update(&input, &mut movement);

        let expected = Vec2::new(1.0, 1.0).normalize();
        assert!((movement.direction - expected).length() < 1e-6);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut input = InputState::new();
        input.press(Key::Left);
        input.press(Key::Right);
        let mut movement = MovementComponent {
            speed: 1.0,
            direction: Vec2::X,
        };

        ControlsComponent.update(&input, &mut movement);
        assert_eq!(movement.direction, Vec2::ZERO);
    }

    #[test]
    fn test_movement_advances_render_position() {
        let mut render = RenderComponent::new(&resources(), "bomb").unwrap();
        let movement = MovementComponent {
            speed: 100.0,
            direction: Vec2::new(0.0, -1.0),
        };

        movement.update(0.5, &mut render);
        assert_eq!(render.position, Vec2::new(0.0, -50.0));
    }

    #[test]
    fn test_render_requires_known_texture() {
        assert!(matches!(
            RenderComponent::new(&resources(), "nope"),
            Err(ResourceError::UnknownTexture(_))
        ));
    }

    #[test]
    fn test_texture_rect_sets_initial_size() {
        let mut render =
            RenderComponent::with_texture_rect(&resources(), "bomb", IntRect::new(0, 0, 32, 16))
                .unwrap();
        assert_eq!(render.size, Vec2::new(32.0, 16.0));

        render.set_texture_rect_position(IVec2::new(32, 0));
        assert_eq!(render.texture_rect_position(), IVec2::new(32, 0));
        assert_eq!(render.sprite().texture_rect, IntRect::new(32, 0, 32, 16));
    }
}
