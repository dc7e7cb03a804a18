// Drawing surface lifecycle and particle rendering

mod sprite;
mod surface;

pub use sprite::{Sprite, SPRITE_SIZE};
pub use surface::{DrawCommand, DrawList, PixelSurface, Surface};

use crate::field::{Particle, WorkingBounds};
use tracing::debug;

/// Result of a visibility change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    Paused,
    /// Callers must reset the spawn cadence before the next frame
    Resumed,
    Unchanged,
}

/// Draws the live particle set onto a surface it owns
#[derive(Debug)]
pub struct Renderer<S: Surface> {
    surface: S,
    sprite: Sprite,
    bounds: WorkingBounds,
    visible: bool,
}

impl<S: Surface> Renderer<S> {
    pub fn new(mut surface: S, width: f32, height: f32) -> Self {
        let bounds = WorkingBounds::new(width, height);
        surface.resize(bounds.width as u32, bounds.height as u32);
        Self {
            surface,
            sprite: Sprite::radial(sprite_size_for(bounds)),
            bounds,
            visible: true,
        }
    }

    /// Resize the surface and return the new working bounds.
    ///
    /// The sprite is regenerated when the new surface changes its size.
    pub fn resize(&mut self, width: f32, height: f32) -> WorkingBounds {
        self.bounds = WorkingBounds::new(width, height);
        self.surface
            .resize(self.bounds.width as u32, self.bounds.height as u32);
        let sprite_size = sprite_size_for(self.bounds);
        if sprite_size != self.sprite.size() {
            self.sprite = Sprite::radial(sprite_size);
        }
        debug!(
            width = self.bounds.width,
            height = self.bounds.height,
            sprite_size,
            "Surface resized"
        );
        self.bounds
    }

    pub fn set_visible(&mut self, visible: bool) -> VisibilityChange {
        if visible == self.visible {
            return VisibilityChange::Unchanged;
        }
        self.visible = visible;
        if visible {
            VisibilityChange::Resumed
        } else {
            VisibilityChange::Paused
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn bounds(&self) -> WorkingBounds {
        self.bounds
    }

    /// Clear the surface and stamp every drawable particle; returns how many were drawn
    pub fn draw<'a, I>(&mut self, particles: I) -> usize
    where
        I: IntoIterator<Item = &'a Particle>,
    {
        self.surface.clear();
        let mut drawn = 0;
        for p in particles {
            if !p.is_finite() || p.opacity <= 0.0 || p.size <= 0.0 {
                continue;
            }
            self.surface.stamp(&self.sprite, p.x, p.y, p.size, p.opacity);
            drawn += 1;
        }
        drawn
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }
}

/// Sprite edge: `SPRITE_SIZE`, capped by the shorter surface side
fn sprite_size_for(bounds: WorkingBounds) -> u32 {
    let side = bounds.width.min(bounds.height) as u32;
    SPRITE_SIZE.min(side).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(x: f32, y: f32, opacity: f32) -> Particle {
        Particle {
            x,
            y,
            size: 8.0,
            opacity,
            perspective_scale: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_draw_records_only_drawable_particles() {
        let mut renderer = Renderer::new(DrawList::new(), 100.0, 100.0);
        let particles = vec![
            particle(10.0, 10.0, 0.5),
            particle(20.0, 20.0, 0.0),
            particle(f32::NAN, 20.0, 0.5),
        ];

        assert_eq!(renderer.draw(&particles), 1);
        assert_eq!(
            renderer.surface().commands(),
            &[DrawCommand {
                x: 10.0,
                y: 10.0,
                size: 8.0,
                opacity: 0.5
            }]
        );

        // Each frame starts from a clear surface
        assert_eq!(renderer.draw(&[]), 0);
        assert!(renderer.surface().commands().is_empty());
    }

    #[test]
    fn test_resize_updates_bounds_and_surface() {
        let mut renderer = Renderer::new(DrawList::new(), 100.0, 100.0);
        let bounds = renderer.resize(640.0, 480.0);
        assert_eq!(bounds, WorkingBounds::new(640.0, 480.0));
        assert_eq!(renderer.surface().dimensions(), (640, 480));
        assert_eq!(renderer.sprite().size(), SPRITE_SIZE);
    }

    #[test]
    fn test_sprite_follows_small_surfaces() {
        let mut renderer = Renderer::new(DrawList::new(), 800.0, 600.0);
        assert_eq!(renderer.sprite().size(), SPRITE_SIZE);

        renderer.resize(16.0, 40.0);
        assert_eq!(renderer.sprite().size(), 16);

        renderer.resize(48.0, 48.0);
        assert_eq!(renderer.sprite().size(), 48);

        renderer.resize(1024.0, 768.0);
        assert_eq!(renderer.sprite().size(), SPRITE_SIZE);
    }

    #[test]
    fn test_visibility_transitions() {
        let mut renderer = Renderer::new(DrawList::new(), 10.0, 10.0);
        assert_eq!(renderer.set_visible(true), VisibilityChange::Unchanged);
        assert_eq!(renderer.set_visible(false), VisibilityChange::Paused);
        assert!(!renderer.is_visible());
        assert_eq!(renderer.set_visible(false), VisibilityChange::Unchanged);
        assert_eq!(renderer.set_visible(true), VisibilityChange::Resumed);
    }

    #[test]
    fn test_pixel_surface_blends_particle() {
        let mut renderer = Renderer::new(PixelSurface::new(1, 1), 32.0, 32.0);
        renderer.draw(&[particle(16.0, 16.0, 1.0)]);
        let centre = renderer.surface().pixel(16, 16).unwrap();
        assert!(centre[3] > 0);
        assert_eq!(renderer.surface().pixel(0, 0).unwrap(), [0, 0, 0, 0]);
        assert!(renderer.surface().pixel(32, 0).is_none());
        assert_eq!(renderer.surface().as_rgba().count(), 32 * 32 * 4);
    }
}
