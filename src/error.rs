//! Error types for maxboid.
//!
//! Construction-time failures (no adapter, kernel that won't compile) are fatal and
//! surface as [`GpuError`]. Caller contract violations on the engine surface as
//! [`EngineError`] instead of silently corrupting agent state.

use std::fmt;

/// Errors that can occur while bringing up the compute device.
#[derive(Debug)]
pub enum GpuError {
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The flock update kernel failed to compile or link into a pipeline.
    ShaderCompilation(String),
    /// Failed to map buffer for reading.
    BufferMapping(String),
    /// The per-frame upload ring could not be built.
    FramePool(PoolError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::ShaderCompilation(msg) => write!(f, "Failed to build flock kernel: {}", msg),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
            GpuError::FramePool(e) => write!(f, "Failed to build frame buffers: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::FramePool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

impl From<PoolError> for GpuError {
    fn from(e: PoolError) -> Self {
        GpuError::FramePool(e)
    }
}

/// Errors returned by [`FlockEngine`](crate::FlockEngine) operations.
#[derive(Debug)]
pub enum EngineError {
    /// A device-level failure.
    Gpu(GpuError),
    /// `num_agents` in the parameters does not match the engine.
    AgentCountMismatch { expected: usize, actual: usize },
    /// `num_forces` in the parameters does not match the force slice.
    ForceCountMismatch { declared: usize, provided: usize },
    /// More forces than the kernel's force buffer can hold.
    TooManyForces { count: usize, max: usize },
    /// Position and velocity state passed to the engine differ in length.
    StateLengthMismatch { positions: usize, velocities: usize },
    /// `swap_buffers` called without a completed step since the last swap.
    SwapWithoutStep,
    /// `step` called while the previous step's result has not been swapped in.
    StepPendingSwap,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Gpu(e) => write!(f, "GPU error: {}", e),
            EngineError::AgentCountMismatch { expected, actual } => write!(
                f,
                "Parameters describe {} agents but the engine holds {}",
                actual, expected
            ),
            EngineError::ForceCountMismatch { declared, provided } => write!(
                f,
                "Parameters declare {} forces but {} were provided",
                declared, provided
            ),
            EngineError::TooManyForces { count, max } => {
                write!(f, "{} forces exceeds the maximum of {}", count, max)
            }
            EngineError::StateLengthMismatch { positions, velocities } => write!(
                f,
                "Got {} positions but {} velocities",
                positions, velocities
            ),
            EngineError::SwapWithoutStep => {
                write!(f, "swap_buffers called without a completed step")
            }
            EngineError::StepPendingSwap => {
                write!(f, "step called before the previous step was swapped in")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Gpu(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GpuError> for EngineError {
    fn from(e: GpuError) -> Self {
        EngineError::Gpu(e)
    }
}

/// Errors that can occur while loading or validating a [`FlockConfig`](crate::FlockConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    Io(std::io::Error),
    /// The file is not valid config JSON.
    Parse(serde_json::Error),
    /// A value is outside its allowed range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to access config file: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors from constructing a [`FramePool`](crate::FramePool).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Fewer than two slots; a single slot cannot overlap host and device work.
    TooFewSlots(usize),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::TooFewSlots(n) => {
                write!(f, "Frame pool needs at least 2 slots, got {}", n)
            }
        }
    }
}

impl std::error::Error for PoolError {}
