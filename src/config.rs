//! Flock configuration, loadable from JSON.
//!
//! Every field has a default, so a file only needs the values it changes:
//!
//! ```json
//! { "agent_count": 2000, "backend": "cpu", "walker": { "repellor_speed": 0.05 } }
//! ```

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::force_field::WalkerPolicy;
use crate::params::SimulationParameters;

/// Which [`FlockKernel`](crate::FlockKernel) runs the update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Rayon on the host.
    Cpu,
    /// wgpu compute.
    #[default]
    Gpu,
}

/// Force walker tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    pub attractor_speed: f32,
    pub repellor_speed: f32,
    pub push_back: f32,
    pub steer_weight: f32,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        let policy = WalkerPolicy::default();
        Self {
            attractor_speed: policy.attractor_speed,
            repellor_speed: policy.repellor_speed,
            push_back: policy.push_back,
            steer_weight: policy.steer_weight,
        }
    }
}

/// Complete flock setup: population, steering weights, world box and runtime knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    pub agent_count: usize,
    /// Agents spawn uniformly in `-spawn_range..=spawn_range` on every axis.
    pub spawn_range: f32,
    pub neighbour_radius: f32,
    pub alignment_weight: f32,
    pub separation_weight: f32,
    pub cohesion_weight: f32,
    /// Half-extents of the world box.
    pub bounds: [f32; 3],
    pub bounds_weight: f32,
    pub boid_speed: f32,
    pub reaction_factor: f32,
    /// Longest frame the clock will report, in seconds.
    pub max_delta_time: f32,
    /// Upload slots the GPU backend rotates through.
    pub frames_in_flight: usize,
    /// RNG seed for spawning and walkers. Random when absent.
    pub seed: Option<u64>,
    pub backend: Backend,
    pub walker: WalkerConfig,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            agent_count: 8000,
            spawn_range: 2.5,
            neighbour_radius: 1.5,
            alignment_weight: 2.0,
            separation_weight: 2.0,
            cohesion_weight: 4.0,
            bounds: [15.0, 6.0, 1.5],
            bounds_weight: 2.0,
            boid_speed: 7.0,
            reaction_factor: 0.9,
            max_delta_time: 0.5,
            frames_in_flight: 3,
            seed: None,
            backend: Backend::Gpu,
            walker: WalkerConfig::default(),
        }
    }
}

impl FlockConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, msg: impl FnOnce() -> String) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::Invalid(msg()))
            }
        }

        check(self.neighbour_radius.is_finite() && self.neighbour_radius > 0.0, || {
            format!("neighbour_radius must be positive, got {}", self.neighbour_radius)
        })?;
        check((0.0..=1.0).contains(&self.reaction_factor), || {
            format!("reaction_factor must be in [0, 1], got {}", self.reaction_factor)
        })?;
        check(self.frames_in_flight >= 2, || {
            format!("frames_in_flight must be at least 2, got {}", self.frames_in_flight)
        })?;
        check(self.bounds.iter().all(|&b| b.is_finite() && b > 0.0), || {
            format!("bounds must be positive, got {:?}", self.bounds)
        })?;
        check(self.boid_speed >= 0.0, || {
            format!("boid_speed must be non-negative, got {}", self.boid_speed)
        })?;
        check(self.spawn_range >= 0.0, || {
            format!("spawn_range must be non-negative, got {}", self.spawn_range)
        })?;
        check(self.max_delta_time > 0.0, || {
            format!("max_delta_time must be positive, got {}", self.max_delta_time)
        })?;
        check(self.walker.attractor_speed >= 0.0 && self.walker.repellor_speed >= 0.0, || {
            "walker speeds must be non-negative".to_string()
        })?;
        check((0.0..=1.0).contains(&self.walker.steer_weight), || {
            format!("walker.steer_weight must be in [0, 1], got {}", self.walker.steer_weight)
        })?;
        Ok(())
    }

    #[inline]
    pub fn bounds(&self) -> Vec3 {
        Vec3::from_array(self.bounds)
    }

    /// Base parameters for a frame. Delta time and force count are left for the driver.
    pub fn to_parameters(&self) -> SimulationParameters {
        let mut params = SimulationParameters::new(self.agent_count);
        params.set_neighbour_radius(self.neighbour_radius);
        params.alignment_weight = self.alignment_weight;
        params.separation_weight = self.separation_weight;
        params.cohesion_weight = self.cohesion_weight;
        params.set_bounds(self.bounds());
        params.bounds_weight = self.bounds_weight;
        params.boid_speed = self.boid_speed;
        params.reaction_factor = self.reaction_factor;
        params
    }

    pub fn walker_policy(&self) -> WalkerPolicy {
        WalkerPolicy {
            attractor_speed: self.walker.attractor_speed,
            repellor_speed: self.walker.repellor_speed,
            steer_weight: self.walker.steer_weight,
            push_back: self.walker.push_back,
        }
    }
}
