//! Axis-aligned rectangles.
//!
//! [`IntRect`] addresses pixels inside a texture. [`FloatRect`] describes
//! world-space bounds and viewport fractions.

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

/// An integer rectangle, typically a sub-region of a texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl IntRect {
    #[must_use]
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub fn from_position_size(position: IVec2, size: IVec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    #[must_use]
    pub fn position(&self) -> IVec2 {
        IVec2::new(self.left, self.top)
    }

    #[must_use]
    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    /// Moves the rectangle so its top-left corner sits at `position`,
    /// keeping its size.
    pub fn set_position(&mut self, position: IVec2) {
        self.left = position.x;
        self.top = position.y;
    }

    /// Returns `true` if `point` lies inside. The right and bottom edges are
    /// exclusive.
    #[must_use]
    pub fn contains(&self, point: IVec2) -> bool {
        point.x >= self.left
            && point.y >= self.top
            && point.x < self.left + self.width
            && point.y < self.top + self.height
    }
}

/// A floating-point rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FloatRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl FloatRect {
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self::new(position.x, position.y, size.x, size.y)
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position() + self.size() * 0.5
    }

    /// Scales every component by `factor`, turning a fraction of a surface
    /// into an absolute rectangle on it.
    #[must_use]
    pub fn scaled(&self, factor: Vec2) -> Self {
        Self::from_position_size(self.position() * factor, self.size() * factor)
    }

    /// Returns `true` if `point` lies inside. The right and bottom edges are
    /// exclusive.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left
            && point.y >= self.top
            && point.x < self.left + self.width
            && point.y < self.top + self.height
    }
}
