//! Host-side agent storage: the padded vector element and the double-buffered arenas.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// A `vec3<f32>` padded to the 16-byte stride WGSL uses for `array<vec3<f32>>`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    _pad: f32,
}

impl GpuVec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, _pad: 0.0 }
    }
}

impl From<Vec3> for GpuVec3 {
    #[inline]
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<GpuVec3> for Vec3 {
    #[inline]
    fn from(v: GpuVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Convert a slice of glam vectors to kernel layout.
pub fn to_gpu_vec3s(values: &[Vec3]) -> Vec<GpuVec3> {
    values.iter().copied().map(GpuVec3::from).collect()
}

/// Convert kernel-layout vectors back to glam.
pub fn from_gpu_vec3s(values: &[GpuVec3]) -> Vec<Vec3> {
    values.iter().copied().map(Vec3::from).collect()
}

/// Two full copies each of position and velocity state with a single role flag.
///
/// The pair at `read` is the committed state: the kernel's input and what renderers
/// see. The other pair is where the next step writes. [`swap`](Self::swap) flips both
/// roles at once, so positions and velocities can never drift out of phase.
pub(crate) struct AgentBuffers<B> {
    positions: [B; 2],
    velocities: [B; 2],
    read: usize,
}

/// Borrowed view of one role's position and velocity buffers.
pub struct BufferPair<'a, B> {
    pub positions: &'a B,
    pub velocities: &'a B,
}

/// Mutable view of the pair a step writes into.
pub struct BufferPairMut<'a, B> {
    pub positions: &'a mut B,
    pub velocities: &'a mut B,
}

impl<B> AgentBuffers<B> {
    pub fn new(read_positions: B, read_velocities: B, write_positions: B, write_velocities: B) -> Self {
        Self {
            positions: [read_positions, write_positions],
            velocities: [read_velocities, write_velocities],
            read: 0,
        }
    }

    pub fn read(&self) -> BufferPair<'_, B> {
        BufferPair {
            positions: &self.positions[self.read],
            velocities: &self.velocities[self.read],
        }
    }

    /// Read pair and write pair borrowed together for a step.
    pub fn split(&mut self) -> (BufferPair<'_, B>, BufferPairMut<'_, B>) {
        let (pos_lo, pos_hi) = self.positions.split_at_mut(1);
        let (vel_lo, vel_hi) = self.velocities.split_at_mut(1);
        if self.read == 0 {
            (
                BufferPair { positions: &pos_lo[0], velocities: &vel_lo[0] },
                BufferPairMut { positions: &mut pos_hi[0], velocities: &mut vel_hi[0] },
            )
        } else {
            (
                BufferPair { positions: &pos_hi[0], velocities: &vel_hi[0] },
                BufferPairMut { positions: &mut pos_lo[0], velocities: &mut vel_lo[0] },
            )
        }
    }

    pub fn swap(&mut self) {
        self.read ^= 1;
    }

    /// Index (0 or 1) of the arena currently in the read role.
    pub fn read_index(&self) -> usize {
        self.read
    }
}
