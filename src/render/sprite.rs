/// Cached radial-gradient stamp used to draw every particle
#[derive(Debug, Clone)]
pub struct Sprite {
    size: u32,
    pixels: Vec<[u8; 4]>,
}

/// (offset, rgb, alpha) stops from the centre to the rim
const STOPS: [(f32, [f32; 3], f32); 4] = [
    (0.0, [255.0, 255.0, 255.0], 1.0),
    (0.4, [255.0, 255.0, 255.0], 0.8),
    (0.7, [14.0, 165.0, 233.0], 0.3),
    (1.0, [14.0, 165.0, 233.0], 0.0),
];

pub const SPRITE_SIZE: u32 = 64;

impl Sprite {
    /// White core fading to transparent sky blue at the rim
    pub fn radial(size: u32) -> Self {
        let size = size.max(1);
        let half = size as f32 / 2.0;
        let mut pixels = Vec::with_capacity((size * size) as usize);

        for py in 0..size {
            for px in 0..size {
                let dx = px as f32 + 0.5 - half;
                let dy = py as f32 + 0.5 - half;
                let t = (dx * dx + dy * dy).sqrt() / half;
                pixels.push(gradient(t));
            }
        }

        Self { size, pixels }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Texel at normalized coordinates in [0, 1)
    pub fn sample(&self, u: f32, v: f32) -> [u8; 4] {
        let max = (self.size - 1) as f32;
        let x = (u * self.size as f32).clamp(0.0, max) as u32;
        let y = (v * self.size as f32).clamp(0.0, max) as u32;
        self.pixels[(y * self.size + x) as usize]
    }
}

fn gradient(t: f32) -> [u8; 4] {
    if t >= 1.0 {
        return [14, 165, 233, 0];
    }
    let mut lower = STOPS[0];
    let mut upper = STOPS[STOPS.len() - 1];
    for pair in STOPS.windows(2) {
        if t >= pair[0].0 && t < pair[1].0 {
            lower = pair[0];
            upper = pair[1];
            break;
        }
    }
    let f = (t - lower.0) / (upper.0 - lower.0);
    let mix = |a: f32, b: f32| a + (b - a) * f;
    [
        mix(lower.1[0], upper.1[0]).round() as u8,
        mix(lower.1[1], upper.1[1]).round() as u8,
        mix(lower.1[2], upper.1[2]).round() as u8,
        (mix(lower.2, upper.2) * 255.0).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centre_is_opaque_white_and_corner_transparent() {
        let sprite = Sprite::radial(SPRITE_SIZE);
        assert_eq!(sprite.size(), SPRITE_SIZE);
        let centre = sprite.sample(0.5, 0.5);
        assert_eq!(&centre[..3], &[255, 255, 255]);
        assert!(centre[3] > 240);
        assert_eq!(sprite.sample(0.0, 0.0)[3], 0);
    }

    #[test]
    fn test_alpha_falls_off_toward_rim() {
        let sprite = Sprite::radial(SPRITE_SIZE);
        let inner = sprite.sample(0.5, 0.55)[3];
        let outer = sprite.sample(0.5, 0.9)[3];
        assert!(inner > outer);
    }

    #[test]
    fn test_sample_clamps_out_of_range() {
        let sprite = Sprite::radial(4);
        assert_eq!(sprite.sample(-1.0, 2.0), sprite.sample(0.0, 0.99));
    }
}
