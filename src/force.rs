//! External attractor/repellor records.
//!
//! A [`Force`] is laid out exactly as the kernel's `Force` struct: two scalars, an
//! explicit 8-byte pad, then a `vec3<f32>` that WGSL aligns to 16 bytes. The record is
//! 32 bytes wide with 28 bytes in use.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Upper bound on simultaneously active forces.
///
/// The GPU backend sizes its per-frame force buffers to this many slots.
pub const MAX_FORCES: usize = 16;

/// One point of attraction (positive strength) or repulsion (negative strength).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Force {
    /// Agents further than this from `position` are unaffected.
    pub radius: f32,
    /// Signed magnitude. Positive pulls agents in, negative pushes them away.
    pub strength: f32,
    _pad0: [f32; 2],
    /// World-space origin of the force.
    pub position: [f32; 3],
    _pad1: f32,
}

impl Force {
    pub fn new(radius: f32, strength: f32, position: Vec3) -> Self {
        Self {
            radius,
            strength,
            _pad0: [0.0; 2],
            position: position.to_array(),
            _pad1: 0.0,
        }
    }

    /// An attractor. `strength` is taken by magnitude.
    pub fn attractor(radius: f32, strength: f32, position: Vec3) -> Self {
        Self::new(radius, strength.abs(), position)
    }

    /// A repellor. `strength` is taken by magnitude and stored negated.
    pub fn repellor(radius: f32, strength: f32, position: Vec3) -> Self {
        Self::new(radius, -strength.abs(), position)
    }

    #[inline]
    pub fn is_attractor(&self) -> bool {
        self.strength > 0.0
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position.to_array();
    }
}

/// Copy `forces` into a kernel-ready slice that always holds at least one slot.
///
/// The kernel binds the force array unconditionally, so an empty force list still
/// produces a single zeroed record. The real count travels in the parameters.
pub fn pack_forces(forces: &[Force]) -> Vec<Force> {
    if forces.is_empty() {
        vec![Force::zeroed()]
    } else {
        forces.to_vec()
    }
}
