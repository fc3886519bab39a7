//! Driver-side force configuration.
//!
//! The engine only sees a slice of [`Force`] records each frame. Which forces exist and
//! how they move is decided here: a [`ForceMode`] picks one of four layouts, and every
//! force gets its own [`ForceWalker`] that animates its origin.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::force::Force;
use crate::walker::{ForceWalker, WalkerBounds, WalkerMotion};

/// The four force layouts, in activation order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ForceMode {
    #[default]
    None,
    SingleAttractor,
    SingleRepellor,
    Mixed,
}

impl ForceMode {
    /// The mode after this one: none, attractor, repellor, mixed, then back to none.
    pub fn next(self) -> Self {
        match self {
            ForceMode::None => ForceMode::SingleAttractor,
            ForceMode::SingleAttractor => ForceMode::SingleRepellor,
            ForceMode::SingleRepellor => ForceMode::Mixed,
            ForceMode::Mixed => ForceMode::None,
        }
    }

    /// Reference force layout for this mode.
    pub fn forces(self) -> Vec<Force> {
        match self {
            ForceMode::None => Vec::new(),
            ForceMode::SingleAttractor => vec![Force::attractor(5.0, 3.0, Vec3::ZERO)],
            ForceMode::SingleRepellor => vec![Force::repellor(2.0, 150.0, Vec3::new(10.0, 0.0, 0.0))],
            ForceMode::Mixed => vec![
                Force::repellor(2.0, 150.0, Vec3::new(-10.0, 0.0, 0.0)),
                Force::attractor(5.0, 10.0, Vec3::ZERO),
                Force::repellor(2.0, 150.0, Vec3::new(10.0, 0.0, 0.0)),
            ],
        }
    }

    /// Whether this layout lights the attractor's point light.
    pub fn shows_point_light(self) -> bool {
        matches!(self, ForceMode::SingleAttractor | ForceMode::Mixed)
    }
}

/// Walker speeds by force kind, plus shared walker motion constants.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WalkerPolicy {
    pub attractor_speed: f32,
    pub repellor_speed: f32,
    pub steer_weight: f32,
    pub push_back: f32,
}

impl Default for WalkerPolicy {
    fn default() -> Self {
        Self {
            attractor_speed: 0.0,
            repellor_speed: 0.02,
            steer_weight: 0.1,
            push_back: 5.0,
        }
    }
}

impl WalkerPolicy {
    fn motion_for(&self, force: &Force) -> WalkerMotion {
        WalkerMotion {
            speed: if force.is_attractor() { self.attractor_speed } else { self.repellor_speed },
            steer_weight: self.steer_weight,
            push_back: self.push_back,
        }
    }
}

/// The active forces and the walkers animating them.
///
/// `forces[i]` is always driven by `walkers[i]`. Changing mode throws both lists away
/// and builds new ones.
pub struct ForceField {
    mode: ForceMode,
    forces: Vec<Force>,
    walkers: Vec<ForceWalker>,
    bounds: WalkerBounds,
    policy: WalkerPolicy,
    rng: SmallRng,
}

impl ForceField {
    /// An empty field whose walkers will roam `-bounds..=bounds`.
    pub fn new(bounds: Vec3, policy: WalkerPolicy, seed: u64) -> Self {
        Self {
            mode: ForceMode::None,
            forces: Vec::new(),
            walkers: Vec::new(),
            bounds: WalkerBounds::symmetric(bounds),
            policy,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn mode(&self) -> ForceMode {
        self.mode
    }

    #[inline]
    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    #[inline]
    pub fn walkers(&self) -> &[ForceWalker] {
        &self.walkers
    }

    pub fn shows_point_light(&self) -> bool {
        self.mode.shows_point_light()
    }

    /// Move to the next mode and rebuild. Returns the new mode.
    pub fn cycle(&mut self) -> ForceMode {
        let next = self.mode.next();
        self.set_mode(next);
        next
    }

    /// Replace every force and walker with the layout for `mode`.
    pub fn set_mode(&mut self, mode: ForceMode) {
        self.mode = mode;
        self.forces = mode.forces();
        self.walkers = self
            .forces
            .iter()
            .map(|force| {
                ForceWalker::new(
                    force.position(),
                    self.bounds,
                    self.policy.motion_for(force),
                    self.rng.gen(),
                )
            })
            .collect();
        log::info!("Force mode {:?}: {} force(s)", mode, self.forces.len());
    }

    /// Advance every walker one step and move its force there.
    pub fn update(&mut self) {
        for (force, walker) in self.forces.iter_mut().zip(self.walkers.iter_mut()) {
            force.set_position(walker.update());
        }
    }
}
