//! The flock simulation engine.
//!
//! [`FlockEngine`] owns two copies of every agent's position and velocity. One copy is
//! committed: the kernel reads it and renderers draw it. [`step`](FlockEngine::step)
//! writes the next state into the other copy, and [`swap_buffers`](FlockEngine::swap_buffers)
//! commits it. The pair must alternate; calling either one twice in a row is an error.
//!
//! # Example
//!
//! ```
//! use maxboid::{CpuKernel, FlockEngine, SimulationParameters, StepOutcome};
//! use rand::{rngs::SmallRng, SeedableRng};
//!
//! let mut rng = SmallRng::seed_from_u64(1);
//! let mut engine = FlockEngine::initialize(CpuKernel::new(), 64, 2.5, &mut rng).unwrap();
//!
//! let mut params = SimulationParameters::new(64);
//! params.set_neighbour_radius(1.5);
//! params.boid_speed = 7.0;
//! params.delta_time = 1.0 / 60.0;
//!
//! assert_eq!(engine.step(&params, &[]).unwrap(), StepOutcome::Advanced);
//! engine.swap_buffers().unwrap();
//! ```

use glam::Vec3;
use rand::Rng;

use crate::buffers::{from_gpu_vec3s, to_gpu_vec3s, AgentBuffers};
use crate::error::EngineError;
use crate::force::{pack_forces, Force, MAX_FORCES};
use crate::kernel::FlockKernel;
use crate::params::SimulationParameters;
use crate::spawn::{generate_random_positions_in_cube, generate_random_velocities};

/// Result of a [`FlockEngine::step`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The write buffers hold the next state. Call `swap_buffers` to commit it.
    Advanced,
    /// The kernel could not run this frame. Nothing changed and no swap is due.
    Skipped,
}

/// Double-buffered agent state driven by a [`FlockKernel`].
pub struct FlockEngine<K: FlockKernel> {
    kernel: K,
    buffers: AgentBuffers<K::Buffer>,
    agent_count: usize,
    parameters: SimulationParameters,
    pending_swap: bool,
    steps: u64,
}

impl<K: FlockKernel> FlockEngine<K> {
    /// Spawn `agent_count` agents with positions uniform in `-spawn_range..=spawn_range`
    /// and random unit velocities.
    pub fn initialize<R: Rng + ?Sized>(
        kernel: K,
        agent_count: usize,
        spawn_range: f32,
        rng: &mut R,
    ) -> Result<Self, EngineError> {
        let positions = generate_random_positions_in_cube(rng, agent_count, spawn_range);
        let velocities = generate_random_velocities(rng, agent_count);
        Self::from_state(kernel, &positions, &velocities)
    }

    /// Start from explicit state. Both slices must have the same length.
    pub fn from_state(kernel: K, positions: &[Vec3], velocities: &[Vec3]) -> Result<Self, EngineError> {
        if positions.len() != velocities.len() {
            return Err(EngineError::StateLengthMismatch {
                positions: positions.len(),
                velocities: velocities.len(),
            });
        }
        let agent_count = positions.len();

        let buffers = AgentBuffers::new(
            kernel.create_buffer("Positions A", &to_gpu_vec3s(positions))?,
            kernel.create_buffer("Velocities A", &to_gpu_vec3s(velocities))?,
            kernel.create_empty_buffer("Positions B", agent_count)?,
            kernel.create_empty_buffer("Velocities B", agent_count)?,
        );

        log::info!("Flock engine initialized: {} agents on {} kernel", agent_count, kernel.name());

        Ok(Self {
            kernel,
            buffers,
            agent_count,
            parameters: SimulationParameters::new(agent_count),
            pending_swap: false,
            steps: 0,
        })
    }

    /// Compute the next state into the write buffers.
    ///
    /// `parameters.num_agents` must match the engine and `parameters.num_forces` must
    /// match `forces.len()`. Blocks until the kernel has finished. A kernel failure is
    /// reported as [`StepOutcome::Skipped`], leaving the committed state as it was.
    pub fn step(&mut self, parameters: &SimulationParameters, forces: &[Force]) -> Result<StepOutcome, EngineError> {
        if self.pending_swap {
            return Err(EngineError::StepPendingSwap);
        }
        if parameters.agent_count() != self.agent_count {
            return Err(EngineError::AgentCountMismatch {
                expected: self.agent_count,
                actual: parameters.agent_count(),
            });
        }
        if forces.len() > MAX_FORCES {
            return Err(EngineError::TooManyForces { count: forces.len(), max: MAX_FORCES });
        }
        if parameters.force_count() != forces.len() {
            return Err(EngineError::ForceCountMismatch {
                declared: parameters.force_count(),
                provided: forces.len(),
            });
        }

        let packed = pack_forces(forces);
        let (read, write) = self.buffers.split();
        if let Err(e) = self.kernel.dispatch(parameters, &packed, read, write) {
            log::warn!("Skipping frame {}: {}", self.steps + 1, e);
            return Ok(StepOutcome::Skipped);
        }

        self.parameters = *parameters;
        self.pending_swap = true;
        self.steps += 1;
        log::debug!(
            "Step {}: {} agents, {} forces, dt {:.4}",
            self.steps,
            self.agent_count,
            forces.len(),
            parameters.delta_time
        );
        Ok(StepOutcome::Advanced)
    }

    /// Commit the last step by exchanging read and write roles.
    pub fn swap_buffers(&mut self) -> Result<(), EngineError> {
        if !self.pending_swap {
            return Err(EngineError::SwapWithoutStep);
        }
        self.buffers.swap();
        self.pending_swap = false;
        Ok(())
    }

    /// Committed positions.
    pub fn current_position_buffer(&self) -> &K::Buffer {
        self.buffers.read().positions
    }

    /// Committed velocities.
    pub fn current_velocity_buffer(&self) -> &K::Buffer {
        self.buffers.read().velocities
    }

    /// Copy the committed positions back to the host.
    pub fn positions(&self) -> Result<Vec<Vec3>, EngineError> {
        let raw = self.kernel.read_buffer(self.current_position_buffer(), self.agent_count)?;
        Ok(from_gpu_vec3s(&raw))
    }

    /// Copy the committed velocities back to the host.
    pub fn velocities(&self) -> Result<Vec<Vec3>, EngineError> {
        let raw = self.kernel.read_buffer(self.current_velocity_buffer(), self.agent_count)?;
        Ok(from_gpu_vec3s(&raw))
    }

    #[inline]
    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    /// Parameters of the last advanced step.
    #[inline]
    pub fn parameters(&self) -> &SimulationParameters {
        &self.parameters
    }

    /// Whether a step has completed that has not been swapped in yet.
    #[inline]
    pub fn has_pending_swap(&self) -> bool {
        self.pending_swap
    }

    /// Number of advanced steps so far.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}
