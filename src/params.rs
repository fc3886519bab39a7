//! Per-frame simulation parameters shared with the flock kernel.
//!
//! The struct mirrors `SimParams` in `shaders/flock_step.wgsl` field for field: sixteen
//! `f32` scalars (the last one explicit padding) followed by a column-major 4x4 model
//! transform. Counts are stored as floats because the kernel reads them that way.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Tunable coefficients for one simulation step.
///
/// Exactly one instance is filled in per frame and uploaded right before dispatch.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SimulationParameters {
    /// Number of agents. Fixed for the engine's lifetime.
    pub num_agents: f32,
    /// Number of active entries in the force buffer.
    pub num_forces: f32,
    /// Agents within this distance of each other are neighbours.
    pub neighbour_radius: f32,
    /// `neighbour_radius` squared, so the kernel never takes a per-pair square root.
    pub neighbour_radius_sq: f32,
    pub alignment_weight: f32,
    pub separation_weight: f32,
    pub cohesion_weight: f32,
    /// Seconds since the previous frame.
    pub delta_time: f32,
    /// Half-extent of the world along x; agents steer back inside `-x_bounds..=x_bounds`.
    pub x_bounds: f32,
    pub y_bounds: f32,
    pub z_bounds: f32,
    /// How hard agents outside the bounds are turned back.
    pub bounds_weight: f32,
    pub boid_speed: f32,
    /// Velocity smoothing in `[0, 1]`. 0 adopts the steering blend, 1 keeps the old velocity.
    pub reaction_factor: f32,
    /// Non-zero while an attractor is lit. Only the renderer reads it.
    pub show_point_light: f32,
    _pad: f32,
    /// Transform applied to every rendered agent.
    pub model_transform: [[f32; 4]; 4],
}

impl SimulationParameters {
    /// Byte size of the record as the kernel sees it.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Parameters with every weight zeroed and an identity transform.
    pub fn new(num_agents: usize) -> Self {
        Self {
            num_agents: num_agents as f32,
            model_transform: Mat4::IDENTITY.to_cols_array_2d(),
            ..Self::zeroed()
        }
    }

    /// Set the neighbour radius and its square together.
    pub fn set_neighbour_radius(&mut self, radius: f32) {
        self.neighbour_radius = radius;
        self.neighbour_radius_sq = radius * radius;
    }

    pub fn set_bounds(&mut self, bounds: Vec3) {
        self.x_bounds = bounds.x;
        self.y_bounds = bounds.y;
        self.z_bounds = bounds.z;
    }

    #[inline]
    pub fn bounds(&self) -> Vec3 {
        Vec3::new(self.x_bounds, self.y_bounds, self.z_bounds)
    }

    pub fn set_model_transform(&mut self, transform: Mat4) {
        self.model_transform = transform.to_cols_array_2d();
    }

    #[inline]
    pub fn model_transform(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model_transform)
    }

    pub fn set_show_point_light(&mut self, on: bool) {
        self.show_point_light = if on { 1.0 } else { 0.0 };
    }

    #[inline]
    pub fn agent_count(&self) -> usize {
        self.num_agents.max(0.0) as usize
    }

    #[inline]
    pub fn force_count(&self) -> usize {
        self.num_forces.max(0.0) as usize
    }

    /// Raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn test_parameters_layout() {
        assert_eq!(SimulationParameters::SIZE, 128);
        assert_eq!(offset_of!(SimulationParameters, num_agents), 0);
        assert_eq!(offset_of!(SimulationParameters, neighbour_radius_sq), 12);
        assert_eq!(offset_of!(SimulationParameters, delta_time), 28);
        assert_eq!(offset_of!(SimulationParameters, reaction_factor), 52);
        assert_eq!(offset_of!(SimulationParameters, show_point_light), 56);
        assert_eq!(offset_of!(SimulationParameters, model_transform), 64);
    }

    #[test]
    fn test_neighbour_radius_keeps_square() {
        let mut p = SimulationParameters::new(10);
        p.set_neighbour_radius(1.5);
        assert_eq!(p.neighbour_radius, 1.5);
        assert_eq!(p.neighbour_radius_sq, 2.25);
    }

    #[test]
    fn test_new_has_identity_transform() {
        let p = SimulationParameters::new(42);
        assert_eq!(p.agent_count(), 42);
        assert_eq!(p.force_count(), 0);
        assert_eq!(p.model_transform(), Mat4::IDENTITY);
        assert_eq!(p.as_bytes().len(), 128);
    }

    #[test]
    fn test_point_light_flag() {
        let mut p = SimulationParameters::new(1);
        p.set_show_point_light(true);
        assert_eq!(p.show_point_light, 1.0);
        p.set_show_point_light(false);
        assert_eq!(p.show_point_light, 0.0);
    }
}
