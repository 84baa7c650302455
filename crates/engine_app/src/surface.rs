//! The drawable surface the game renders into.
//!
//! [`Surface`] is the seam between the frame loop and a window backend.
//! [`HeadlessSurface`] keeps no pixels; it counts what would have been drawn.

use engine_math::{Color, FloatRect, IntRect, UVec2, Vec2};
use tracing::trace;

/// A camera onto world space and the part of the surface it draws into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: Vec2,
    pub size: Vec2,
    /// Target area as a fraction of the surface.
    pub viewport: FloatRect,
}

impl View {
    /// Pixel coordinates over the whole surface.
    #[must_use]
    pub fn full_window(size: UVec2) -> Self {
        let size = size.as_vec2();
        Self {
            center: size * 0.5,
            size,
            viewport: FloatRect::new(0.0, 0.0, 1.0, 1.0),
        }
    }
}

/// One textured quad.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: String,
    pub position: Vec2,
    pub size: Vec2,
    /// Source region; an empty rectangle means the whole texture.
    pub texture_rect: IntRect,
    pub color: Color,
}

impl Sprite {
    /// An untinted sprite showing the whole of `texture` at the origin.
    #[must_use]
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            texture_rect: IntRect::default(),
            color: Color::WHITE,
        }
    }
}

pub trait Surface {
    /// (Re)creates the backing window at `size`.
    fn open(&mut self, size: UVec2, fullscreen: bool);

    fn size(&self) -> UVec2;

    /// Applies a window resize reported by the input backend.
    fn resize(&mut self, size: UVec2);

    fn set_view(&mut self, view: View);

    fn clear(&mut self);

    fn draw(&mut self, sprite: &Sprite);

    /// Presents everything drawn since the last [`clear`](Surface::clear).
    fn display(&mut self);
}

/// A surface with no window behind it.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    size: UVec2,
    fullscreen: bool,
    view: Option<View>,
    pending: Vec<Sprite>,
    last_frame: Vec<Sprite>,
    frames_presented: u64,
    total_draws: u64,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    #[must_use]
    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    /// Sprites drawn in the most recently presented frame.
    #[must_use]
    pub fn last_frame(&self) -> &[Sprite] {
        &self.last_frame
    }

    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    #[must_use]
    pub fn total_draws(&self) -> u64 {
        self.total_draws
    }
}

impl Surface for HeadlessSurface {
    fn open(&mut self, size: UVec2, fullscreen: bool) {
        self.size = size;
        self.fullscreen = fullscreen;
        self.view = Some(View::full_window(size));
    }

    fn size(&self) -> UVec2 {
        self.size
    }

    fn resize(&mut self, size: UVec2) {
        self.size = size;
    }

    fn set_view(&mut self, view: View) {
        self.view = Some(view);
    }

    fn clear(&mut self) {
        self.pending.clear();
    }

    fn draw(&mut self, sprite: &Sprite) {
        self.pending.push(sprite.clone());
        self.total_draws += 1;
    }

    fn display(&mut self) {
        self.frames_presented += 1;
        trace!(
            frame = self.frames_presented,
            draws = self.pending.len(),
            "frame presented"
        );
        std::mem::swap(&mut self.last_frame, &mut self.pending);
        self.pending.clear();
    }
}
