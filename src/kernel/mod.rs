//! Compute backends for the per-agent flock update.
//!
//! A [`FlockKernel`] owns whatever device the update runs on and the buffer type that
//! lives there. [`GpuKernel`] runs `shaders/flock_step.wgsl` through wgpu; [`CpuKernel`]
//! runs the same math on the rayon thread pool against host vectors. The engine is
//! generic over the trait and never looks inside a buffer except through
//! [`read_buffer`](FlockKernel::read_buffer).

mod cpu;
mod gpu;

pub use cpu::{bounds_steering, force_steering, gather_neighbours, update_agent, CpuKernel, NeighbourSums};
pub use gpu::{GpuKernel, FLOCK_STEP_WGSL};

use std::fmt;

use crate::buffers::{BufferPair, BufferPairMut, GpuVec3};
use crate::error::EngineError;
use crate::force::Force;
use crate::params::SimulationParameters;

/// Workgroup size of the compute kernel. Must match `@workgroup_size` in the shader.
pub const WORKGROUP_SIZE: u32 = 256;

/// Distances at or below this are treated as coincident.
///
/// Keeps the separation term and the force falloff finite when two points overlap.
pub const EPSILON: f32 = 1e-6;

/// A dispatch that could not be encoded or submitted.
///
/// Not fatal: the engine reports the frame as skipped and leaves state alone.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchError(pub String);

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flock dispatch failed: {}", self.0)
    }
}

impl std::error::Error for DispatchError {}

/// A device that can run one flock step.
pub trait FlockKernel {
    /// Storage for one array of agent vectors.
    type Buffer;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Allocate a buffer holding `data`.
    fn create_buffer(&self, label: &str, data: &[GpuVec3]) -> Result<Self::Buffer, EngineError>;

    /// Allocate a zero-filled buffer of `len` elements.
    fn create_empty_buffer(&self, label: &str, len: usize) -> Result<Self::Buffer, EngineError> {
        self.create_buffer(label, &vec![GpuVec3::ZERO; len])
    }

    /// Run one update, reading `read` and writing every agent of `write`.
    ///
    /// `forces` always holds at least one slot; only the first
    /// `params.num_forces` entries are meaningful. Returns once the update has completed.
    fn dispatch(
        &mut self,
        params: &SimulationParameters,
        forces: &[Force],
        read: BufferPair<'_, Self::Buffer>,
        write: BufferPairMut<'_, Self::Buffer>,
    ) -> Result<(), DispatchError>;

    /// Copy the first `len` elements of `buffer` back to the host.
    fn read_buffer(&self, buffer: &Self::Buffer, len: usize) -> Result<Vec<GpuVec3>, EngineError>;
}
