//! # engine_math
//!
//! Math types for the engine. Re-exports [`glam`] vectors for positions and
//! sizes and defines the small value types that render components carry:
//! [`IntRect`], [`FloatRect`] and [`Color`].

pub mod color;
pub mod rect;

// Re-export glam types for convenience.
pub use glam::{IVec2, UVec2, Vec2};

pub use color::Color;
pub use rect::{FloatRect, IntRect};
