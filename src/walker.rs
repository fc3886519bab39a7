//! Stochastic motion for force origins.
//!
//! A [`ForceWalker`] produces an endless, smoothly wandering sequence of positions
//! inside a box. Each walker owns its RNG, so a seeded walker replays the same path.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::spawn::random_unit_vector;

/// Axis-aligned box a walker is confined to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WalkerBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl WalkerBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The box `-half..=half` on every axis.
    pub fn symmetric(half: Vec3) -> Self {
        let half = half.abs();
        Self { min: -half, max: half }
    }
}

/// Motion constants shared by every walker in a force field.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WalkerMotion {
    /// Distance travelled per update along the current velocity.
    pub speed: f32,
    /// Weight of the fresh random direction when blended into the velocity.
    pub steer_weight: f32,
    /// Velocity component forced onto an axis whose bound was crossed.
    pub push_back: f32,
}

impl Default for WalkerMotion {
    fn default() -> Self {
        Self {
            speed: 0.0,
            steer_weight: 0.1,
            push_back: 5.0,
        }
    }
}

/// A smoothly wandering point.
#[derive(Clone, Debug)]
pub struct ForceWalker {
    position: Vec3,
    velocity: Vec3,
    bounds: WalkerBounds,
    motion: WalkerMotion,
    rng: SmallRng,
}

impl ForceWalker {
    pub fn new(start: Vec3, bounds: WalkerBounds, motion: WalkerMotion, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let velocity = random_unit_vector(&mut rng);
        Self {
            position: start,
            velocity,
            bounds,
            motion,
            rng,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.motion.speed
    }

    /// Advance one step and return the new position.
    ///
    /// Only the first crossed bound is corrected per call, checked in the order x-low,
    /// x-high, y-low, y-high, z-low, z-high. A walker past two bounds at once is pushed
    /// back along one axis now and the other on a later call.
    pub fn update(&mut self) -> Vec3 {
        let sample = random_unit_vector(&mut self.rng);
        let w = self.motion.steer_weight;
        self.velocity = self.velocity * (1.0 - w) + sample * w;
        self.position += self.velocity * self.motion.speed;
        self.push_back_first_crossed();
        self.position
    }

    fn push_back_first_crossed(&mut self) {
        let p = self.position;
        let (lo, hi) = (self.bounds.min, self.bounds.max);
        let push = self.motion.push_back;

        if p.x < lo.x {
            self.velocity.x = push;
        } else if p.x > hi.x {
            self.velocity.x = -push;
        } else if p.y < lo.y {
            self.velocity.y = push;
        } else if p.y > hi.y {
            self.velocity.y = -push;
        } else if p.z < lo.z {
            self.velocity.z = push;
        } else if p.z > hi.z {
            self.velocity.z = -push;
        }
    }
}

impl Iterator for ForceWalker {
    type Item = Vec3;

    fn next(&mut self) -> Option<Vec3> {
        Some(self.update())
    }
}
