use crate::render::sprite::Sprite;
use serde::Serialize;

/// Something particles can be stamped onto
pub trait Surface {
    fn resize(&mut self, width: u32, height: u32);
    fn clear(&mut self);
    /// Draw `sprite` centred at `(x, y)` with side `size` and the given opacity
    fn stamp(&mut self, sprite: &Sprite, x: f32, y: f32, size: f32, opacity: f32);
}

/// One recorded particle draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawCommand {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub opacity: f32,
}

/// Surface that records draws instead of rasterizing them.
///
/// This is what the presentation layer receives as the particle list.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Surface for DrawList {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self) {
        self.commands.clear();
    }

    fn stamp(&mut self, _sprite: &Sprite, x: f32, y: f32, size: f32, opacity: f32) {
        self.commands.push(DrawCommand {
            x,
            y,
            size,
            opacity,
        });
    }
}

/// Software RGBA8 raster with source-over blending
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0; 4]; (width as usize) * (height as usize)],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
    }

    pub fn as_rgba(&self) -> impl Iterator<Item = u8> + '_ {
        self.pixels.iter().flat_map(|p| p.iter().copied())
    }
}

impl Surface for PixelSurface {
    fn resize(&mut self, width: u32, height: u32) {
        *self = PixelSurface::new(width, height);
    }

    fn clear(&mut self) {
        self.pixels.fill([0; 4]);
    }

    fn stamp(&mut self, sprite: &Sprite, x: f32, y: f32, size: f32, opacity: f32) {
        if size <= 0.0 || opacity <= 0.0 {
            return;
        }
        let opacity = opacity.min(1.0);
        let left = x - size / 2.0;
        let top = y - size / 2.0;

        let x0 = left.floor().max(0.0) as u32;
        let y0 = top.floor().max(0.0) as u32;
        let x1 = ((left + size).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((top + size).ceil().max(0.0) as u32).min(self.height);

        for py in y0..y1 {
            let v = (py as f32 + 0.5 - top) / size;
            if !(0.0..1.0).contains(&v) {
                continue;
            }
            for px in x0..x1 {
                let u = (px as f32 + 0.5 - left) / size;
                if !(0.0..1.0).contains(&u) {
                    continue;
                }
                let texel = sprite.sample(u, v);
                let alpha = texel[3] as f32 / 255.0 * opacity;
                if alpha <= 0.0 {
                    continue;
                }
                let idx = (py as usize) * (self.width as usize) + px as usize;
                self.pixels[idx] = blend(self.pixels[idx], texel, alpha);
            }
        }
    }
}

fn blend(dst: [u8; 4], src: [u8; 4], alpha: f32) -> [u8; 4] {
    let channel = |d: u8, s: u8| (s as f32 * alpha + d as f32 * (1.0 - alpha)).round() as u8;
    let out_alpha = alpha + dst[3] as f32 / 255.0 * (1.0 - alpha);
    [
        channel(dst[0], src[0]),
        channel(dst[1], src[1]),
        channel(dst[2], src[2]),
        (out_alpha * 255.0).round().min(255.0) as u8,
    ]
}
