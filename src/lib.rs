//! # maxboid - flocking simulation engine
//!
//! Thousands of boids steering by alignment, separation and cohesion, pushed around by
//! wandering attractors and repellors, updated every frame by a parallel compute kernel.
//!
//! ## Quick Start
//!
//! ```
//! use maxboid::prelude::*;
//!
//! let config = FlockConfig { agent_count: 500, seed: Some(7), ..Default::default() };
//! let mut driver = FrameDriver::from_config(CpuKernel::new(), &config).unwrap();
//!
//! driver.cycle_force_mode(); // single attractor
//! for _ in 0..10 {
//!     driver.advance(1.0 / 60.0).unwrap();
//! }
//! let stats = driver.stats().unwrap();
//! assert_eq!(stats.agent_count, 500);
//! ```
//!
//! ## Core Concepts
//!
//! ### Engine
//!
//! [`FlockEngine`] holds agent state twice. [`step`](FlockEngine::step) reads the
//! committed copy and writes the other; [`swap_buffers`](FlockEngine::swap_buffers)
//! commits the result. A renderer reads [`FlockEngine::current_position_buffer`] and
//! [`FlockEngine::current_velocity_buffer`] between frames.
//!
//! ### Kernels
//!
//! The per-agent update runs on a [`FlockKernel`]:
//! - [`GpuKernel`] - wgpu compute shader; agent buffers are usable as vertex buffers
//! - [`CpuKernel`] - the same math on rayon, for tests and machines without a GPU
//!
//! ### Parameters
//!
//! [`SimulationParameters`] is the fixed-layout block the kernel reads: neighbour radius,
//! the three steering weights, world bounds, speed, smoothing and the frame's delta time.
//! [`FlockConfig`] builds one from JSON-friendly settings.
//!
//! ### Forces
//!
//! A [`Force`] attracts (positive strength) or repels (negative strength) agents within
//! its radius. [`ForceField`] cycles through the preset layouts of [`ForceMode`] and moves
//! each force with a [`ForceWalker`].
//!
//! ### Frame pacing
//!
//! [`FramePool`] rotates per-frame upload buffers so the host can prepare the next frame
//! while the device still reads the previous one. [`FrameClock`] produces clamped delta
//! times and [`FrameDriver`] runs the whole loop.

pub mod buffers;
pub mod config;
mod driver;
mod engine;
pub mod error;
pub mod force;
pub mod force_field;
mod frame_pool;
pub mod kernel;
mod params;
pub mod spawn;
pub mod time;
pub mod walker;

pub use buffers::{BufferPair, BufferPairMut, GpuVec3};
pub use bytemuck;
pub use config::{Backend, FlockConfig, WalkerConfig};
pub use driver::{FlockStats, FrameDriver, FrameReport};
pub use engine::{FlockEngine, StepOutcome};
pub use error::{ConfigError, EngineError, GpuError, PoolError};
pub use force::{Force, MAX_FORCES};
pub use force_field::{ForceField, ForceMode, WalkerPolicy};
pub use frame_pool::{FramePool, FrameSlot};
pub use glam::{Mat4, Vec3};
pub use kernel::{CpuKernel, DispatchError, FlockKernel, GpuKernel, WORKGROUP_SIZE};
pub use params::SimulationParameters;
pub use spawn::{generate_random_positions, generate_random_velocities};
pub use time::FrameClock;
pub use walker::{ForceWalker, WalkerBounds, WalkerMotion};

/// Convenient re-exports for common usage.
///
/// ```
/// use maxboid::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Backend, FlockConfig};
    pub use crate::driver::{FlockStats, FrameDriver, FrameReport};
    pub use crate::engine::{FlockEngine, StepOutcome};
    pub use crate::error::{EngineError, GpuError};
    pub use crate::force::Force;
    pub use crate::force_field::{ForceField, ForceMode};
    pub use crate::kernel::{CpuKernel, FlockKernel, GpuKernel};
    pub use crate::params::SimulationParameters;
    pub use crate::time::FrameClock;
    pub use crate::{Mat4, Vec3};
}
