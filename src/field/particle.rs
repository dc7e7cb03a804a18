/// Per-tick physics constants shared by every particle
#[derive(Debug, Clone, Copy)]
pub struct Physics {
    pub gravity: f32,
    pub friction: f32,
    pub near_radius: f32,
    pub absorb_decay: f32,
    pub perspective: f32,
}

/// What happened to a particle during one integration step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Alive,
    /// Life or opacity reached zero
    Expired,
    /// Left the working bounds by more than the cull margin
    Escaped,
    /// A coordinate, size or opacity became non-finite
    Invalid,
}

/// A single particle in the field
#[derive(Clone, Debug, Default)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Distance behind the screen plane
    pub depth: f32,
    pub vz: f32,
    /// Remaining life in [0, 1]
    pub life: f32,
    pub life_decay: f32,
    /// Fixed at spawn
    pub base_size: f32,
    /// Fixed at spawn
    pub base_opacity: f32,

    // Recomputed every step
    pub perspective_scale: f32,
    pub size: f32,
    pub opacity: f32,
}

impl Particle {
    /// Advance one tick toward the focal point `(cx, cy)`
    pub fn integrate(&mut self, physics: &Physics, cx: f32, cy: f32) -> Fate {
        let dx = cx - self.x;
        let dy = cy - self.y;
        let mut dist = (dx * dx + dy * dy).sqrt();
        if dist == 0.0 {
            dist = 1.0;
        }

        let (ax, ay) = if dist > physics.near_radius {
            (physics.gravity * dx / dist, physics.gravity * dy / dist)
        } else {
            (0.0, 0.0)
        };

        self.vx = (self.vx + ax) * physics.friction;
        self.vy = (self.vy + ay) * physics.friction;
        self.x += self.vx;
        self.y += self.vy;
        self.depth += self.vz;

        let absorbing = dist < physics.near_radius;
        let fade = if absorbing {
            dist / physics.near_radius
        } else {
            1.0
        };
        if absorbing {
            self.life -= physics.absorb_decay;
        }
        self.life -= self.life_decay;

        self.perspective_scale = physics.perspective / (physics.perspective + self.depth);
        self.size = self.base_size * self.perspective_scale;
        self.opacity = self.base_opacity * self.life.max(0.0) * fade * self.perspective_scale;

        if !self.is_finite() || self.perspective_scale <= 0.0 {
            return Fate::Invalid;
        }
        if self.life <= 0.0 || self.opacity <= 0.0 {
            return Fate::Expired;
        }
        Fate::Alive
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.size.is_finite()
            && self.opacity.is_finite()
            && self.perspective_scale.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn physics() -> Physics {
        Physics {
            gravity: 0.0375,
            friction: 0.99,
            near_radius: 40.0,
            absorb_decay: 0.05,
            perspective: 800.0,
        }
    }

    fn particle_at(x: f32, y: f32) -> Particle {
        Particle {
            x,
            y,
            life: 1.0,
            life_decay: 0.002,
            base_size: 4.0,
            base_opacity: 0.8,
            ..Default::default()
        }
    }

    #[test]
    fn test_far_particle_is_pulled_toward_center() {
        let mut p = particle_at(0.0, 500.0);
        assert_eq!(p.integrate(&physics(), 500.0, 500.0), Fate::Alive);
        assert!(p.vx > 0.0);
        assert!(p.x > 0.0);
        assert!((p.life - 0.998).abs() < 1e-6);
        assert!((p.opacity - 0.8 * p.life).abs() < 1e-6);
    }

    #[test]
    fn test_near_center_fades_faster() {
        let mut p = particle_at(490.0, 500.0);
        p.integrate(&physics(), 500.0, 500.0);
        assert!((p.life - (1.0 - 0.05 - 0.002)).abs() < 1e-6);
        assert!(p.opacity < p.base_opacity * p.life);
    }

    #[test]
    fn test_depth_shrinks_size() {
        let mut p = particle_at(0.0, 0.0);
        p.depth = 800.0;
        p.integrate(&physics(), 500.0, 500.0);
        assert!((p.perspective_scale - 0.5).abs() < 1e-6);
        assert!((p.size - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_exhausted_life_expires() {
        let mut p = particle_at(0.0, 0.0);
        p.life = 0.001;
        assert_eq!(p.integrate(&physics(), 500.0, 500.0), Fate::Expired);
    }

    #[test]
    fn test_non_finite_state_is_invalid() {
        let mut p = particle_at(f32::NAN, 0.0);
        assert_eq!(p.integrate(&physics(), 500.0, 500.0), Fate::Invalid);

        let mut p = particle_at(0.0, 0.0);
        p.depth = -800.0;
        assert_eq!(p.integrate(&physics(), 500.0, 500.0), Fate::Invalid);
    }
}
