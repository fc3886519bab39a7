//! Host reference backend.
//!
//! Every agent update is independent, so the write arrays are filled with one rayon
//! parallel iterator. The per-agent functions are public so the math can be checked one
//! agent at a time; `shaders/flock_step.wgsl` computes the same thing in the same order.

use glam::Vec3;
use rayon::prelude::*;

use super::{DispatchError, FlockKernel, EPSILON};
use crate::buffers::{BufferPair, BufferPairMut, GpuVec3};
use crate::error::EngineError;
use crate::force::Force;
use crate::params::SimulationParameters;

/// Raw neighbour totals for one agent, before averaging.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct NeighbourSums {
    pub count: u32,
    /// Sum of neighbour velocities.
    pub alignment: Vec3,
    /// Sum of `offset / dist²` over neighbours, pointing away from each.
    pub separation: Vec3,
    /// Sum of neighbour positions.
    pub cohesion: Vec3,
}

impl NeighbourSums {
    /// Weighted flocking steer for an agent at `position`. Zero without neighbours.
    pub fn steering(&self, position: Vec3, params: &SimulationParameters) -> Vec3 {
        if self.count == 0 {
            return Vec3::ZERO;
        }
        let n = self.count as f32;
        let alignment = self.alignment / n;
        let separation = self.separation / n;
        let cohesion = self.cohesion / n - position;
        alignment * params.alignment_weight
            + separation * params.separation_weight
            + cohesion * params.cohesion_weight
    }
}

/// Sum neighbour contributions for agent `index`.
///
/// An agent is a neighbour when its squared distance is at most `radius_sq`. The boundary
/// is inclusive.
pub fn gather_neighbours(
    index: usize,
    positions: &[GpuVec3],
    velocities: &[GpuVec3],
    radius_sq: f32,
) -> NeighbourSums {
    let position = Vec3::from(positions[index]);
    let mut sums = NeighbourSums::default();

    for (j, (&other_pos, &other_vel)) in positions.iter().zip(velocities).enumerate() {
        if j == index {
            continue;
        }
        let other_pos = Vec3::from(other_pos);
        let offset = position - other_pos;
        let dist_sq = offset.length_squared();
        if dist_sq > radius_sq {
            continue;
        }
        sums.count += 1;
        sums.alignment += Vec3::from(other_vel);
        if dist_sq > EPSILON {
            sums.separation += offset / dist_sq;
        }
        sums.cohesion += other_pos;
    }

    sums
}

/// Pull of the active forces on a point. Each force acts within its radius with
/// magnitude `strength / dist`.
pub fn force_steering(position: Vec3, forces: &[Force]) -> Vec3 {
    forces.iter().fold(Vec3::ZERO, |acc, force| {
        let to_force = force.position() - position;
        let dist = to_force.length();
        if dist > EPSILON && dist <= force.radius {
            acc + (to_force / dist) * (force.strength / dist)
        } else {
            acc
        }
    })
}

/// Constant push back toward the origin on every axis the point is outside of.
pub fn bounds_steering(position: Vec3, params: &SimulationParameters) -> Vec3 {
    let bounds = params.bounds();
    let w = params.bounds_weight;
    let axis = |p: f32, b: f32| {
        if p > b {
            -w
        } else if p < -b {
            w
        } else {
            0.0
        }
    };
    Vec3::new(
        axis(position.x, bounds.x),
        axis(position.y, bounds.y),
        axis(position.z, bounds.z),
    )
}

/// New position and velocity for agent `index`.
///
/// The target velocity is the steering blend itself, eased in by `reaction_factor`:
/// 0 takes the blend outright, 1 keeps the old velocity. Only the first
/// `params.num_forces` entries of `forces` are read.
pub fn update_agent(
    index: usize,
    positions: &[GpuVec3],
    velocities: &[GpuVec3],
    forces: &[Force],
    params: &SimulationParameters,
) -> (Vec3, Vec3) {
    let position = Vec3::from(positions[index]);
    let velocity = Vec3::from(velocities[index]);

    let active = &forces[..params.force_count().min(forces.len())];
    let steering = gather_neighbours(index, positions, velocities, params.neighbour_radius_sq)
        .steering(position, params)
        + force_steering(position, active)
        + bounds_steering(position, params);

    // An agent with nothing to react to keeps its heading.
    let desired = if steering == Vec3::ZERO { velocity } else { steering };

    let rf = params.reaction_factor;
    let smoothed = desired * (1.0 - rf) + velocity * rf;

    (position + smoothed * params.boid_speed * params.delta_time, smoothed)
}

/// Runs the flock update on the rayon thread pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuKernel;

impl CpuKernel {
    pub fn new() -> Self {
        Self
    }
}

impl FlockKernel for CpuKernel {
    type Buffer = Vec<GpuVec3>;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn create_buffer(&self, _label: &str, data: &[GpuVec3]) -> Result<Self::Buffer, EngineError> {
        Ok(data.to_vec())
    }

    fn dispatch(
        &mut self,
        params: &SimulationParameters,
        forces: &[Force],
        read: BufferPair<'_, Self::Buffer>,
        write: BufferPairMut<'_, Self::Buffer>,
    ) -> Result<(), DispatchError> {
        let n = read.positions.len();
        if read.velocities.len() != n || write.positions.len() != n || write.velocities.len() != n {
            return Err(DispatchError(format!(
                "buffer lengths disagree: read {}/{}, write {}/{}",
                n,
                read.velocities.len(),
                write.positions.len(),
                write.velocities.len()
            )));
        }

        let positions = read.positions.as_slice();
        let velocities = read.velocities.as_slice();

        write
            .positions
            .par_iter_mut()
            .zip(write.velocities.par_iter_mut())
            .enumerate()
            .for_each(|(i, (out_pos, out_vel))| {
                let (p, v) = update_agent(i, positions, velocities, forces, params);
                *out_pos = p.into();
                *out_vel = v.into();
            });

        Ok(())
    }

    fn read_buffer(&self, buffer: &Self::Buffer, len: usize) -> Result<Vec<GpuVec3>, EngineError> {
        Ok(buffer[..len.min(buffer.len())].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(n: usize) -> SimulationParameters {
        let mut p = SimulationParameters::new(n);
        p.set_neighbour_radius(1.5);
        p.alignment_weight = 2.0;
        p.separation_weight = 2.0;
        p.cohesion_weight = 4.0;
        p.set_bounds(Vec3::new(15.0, 6.0, 1.5));
        p.bounds_weight = 2.0;
        p.boid_speed = 7.0;
        p.reaction_factor = 0.9;
        p.delta_time = 1.0 / 60.0;
        p
    }

    fn vecs(values: &[[f32; 3]]) -> Vec<GpuVec3> {
        values.iter().map(|&[x, y, z]| GpuVec3::new(x, y, z)).collect()
    }

    fn run(p: &SimulationParameters, forces: &[Force], pos: &[GpuVec3], vel: &[GpuVec3]) -> (Vec<GpuVec3>, Vec<GpuVec3>) {
        let read_pos = pos.to_vec();
        let read_vel = vel.to_vec();
        let mut write_pos = vec![GpuVec3::ZERO; pos.len()];
        let mut write_vel = vec![GpuVec3::ZERO; pos.len()];
        CpuKernel::new()
            .dispatch(
                p,
                forces,
                BufferPair { positions: &read_pos, velocities: &read_vel },
                BufferPairMut { positions: &mut write_pos, velocities: &mut write_vel },
            )
            .unwrap();
        (write_pos, write_vel)
    }

    #[test]
    fn test_neighbour_radius_is_inclusive() {
        let vel = vecs(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);

        let at_radius = vecs(&[[0.0, 0.0, 0.0], [1.5, 0.0, 0.0]]);
        assert_eq!(gather_neighbours(0, &at_radius, &vel, 2.25).count, 1);
        assert_eq!(gather_neighbours(1, &at_radius, &vel, 2.25).count, 1);

        // One ulp past the radius.
        let just_past = f32::from_bits(1.5f32.to_bits() + 1);
        let beyond = vecs(&[[0.0, 0.0, 0.0], [just_past, 0.0, 0.0]]);
        assert_eq!(gather_neighbours(0, &beyond, &vel, 2.25).count, 0);
        assert_eq!(gather_neighbours(1, &beyond, &vel, 2.25).count, 0);
    }

    #[test]
    fn test_agent_is_not_its_own_neighbour() {
        let pos = vecs(&[[0.0, 0.0, 0.0]]);
        let vel = vecs(&[[1.0, 0.0, 0.0]]);
        assert_eq!(gather_neighbours(0, &pos, &vel, 100.0), NeighbourSums::default());
    }

    #[test]
    fn test_coincident_neighbour_skips_separation() {
        let pos = vecs(&[[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]]);
        let vel = vecs(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let sums = gather_neighbours(0, &pos, &vel, 2.25);
        assert_eq!(sums.count, 1);
        assert_eq!(sums.separation, Vec3::ZERO);
        assert_eq!(sums.alignment, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_inactive_force_slot_is_ignored() {
        let p = params(2);
        let pos = vecs(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let vel = vecs(&[[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);

        let zeroed = run(&p, &[Force::default()], &pos, &vel);
        let garbage = run(&p, &[Force::attractor(100.0, 1.0e6, Vec3::new(0.5, 0.5, 0.5))], &pos, &vel);

        assert_eq!(zeroed, garbage);
    }

    #[test]
    fn test_bounds_reverse_heading() {
        let mut p = params(1);
        p.set_bounds(Vec3::splat(10.0));
        p.bounds_weight = 0.5;
        p.reaction_factor = 0.0;
        let pos = vecs(&[[11.0, 0.0, 0.0]]);
        let vel = vecs(&[[1.0, 0.0, 0.0]]);

        let (_, v) = update_agent(0, &pos, &vel, &[], &p);
        assert!(v.x < 0.0);
        assert_eq!(v, Vec3::new(-0.5, 0.0, 0.0));
    }

    #[test]
    fn test_agent_inside_bounds_is_unaffected() {
        let mut p = params(1);
        p.set_bounds(Vec3::splat(10.0));
        p.bounds_weight = 0.5;
        p.reaction_factor = 0.0;
        let pos = vecs(&[[9.0, -9.0, 0.0]]);
        let vel = vecs(&[[1.0, 0.0, 0.0]]);

        assert_eq!(bounds_steering(Vec3::from(pos[0]), &p), Vec3::ZERO);
        let (new_pos, v) = update_agent(0, &pos, &vel, &[], &p);
        assert_eq!(v, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(new_pos.x, 9.0 + p.boid_speed * p.delta_time);
    }

    #[test]
    fn test_reaction_factor_extremes() {
        let mut p = params(2);
        p.num_forces = 1.0;
        let forces = [Force::attractor(3.0, 4.0, Vec3::new(0.0, 2.0, 0.0))];
        let pos = vecs(&[[0.0, 0.0, 0.0], [1.0, 0.5, 0.0]]);
        let vel = vecs(&[[0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]);

        p.reaction_factor = 1.0;
        let (_, v) = update_agent(0, &pos, &vel, &forces, &p);
        assert_eq!(v, Vec3::new(0.0, 1.0, 0.0));

        p.reaction_factor = 0.0;
        let position = Vec3::from(pos[0]);
        let blend = gather_neighbours(0, &pos, &vel, p.neighbour_radius_sq).steering(position, &p)
            + force_steering(position, &forces)
            + bounds_steering(position, &p);
        let (new_pos, v) = update_agent(0, &pos, &vel, &forces, &p);
        assert_ne!(blend, Vec3::ZERO);
        assert_eq!(v, blend);
        assert_eq!(new_pos, position + blend * p.boid_speed * p.delta_time);
    }

    #[test]
    fn test_reaction_factor_blends_linearly() {
        let mut p = params(1);
        p.set_bounds(Vec3::splat(10.0));
        p.bounds_weight = 2.0;
        p.reaction_factor = 0.25;
        let pos = vecs(&[[12.0, 0.0, 0.0]]);
        let vel = vecs(&[[0.0, 1.0, 0.0]]);

        let (_, v) = update_agent(0, &pos, &vel, &[], &p);
        assert_relative_eq!(v.x, -1.5);
        assert_relative_eq!(v.y, 0.25);
        assert_eq!(v.z, 0.0);
    }

    #[test]
    fn test_attractor_and_repellor_directions() {
        let mut p = params(1);
        p.reaction_factor = 0.0;
        let pos = vecs(&[[0.0, 0.0, 0.0]]);
        let vel = vecs(&[[0.0, 1.0, 0.0]]);

        let attract = [Force::attractor(5.0, 3.0, Vec3::new(1.0, 0.0, 0.0))];
        p.num_forces = 1.0;
        let (_, v) = update_agent(0, &pos, &vel, &attract, &p);
        assert!(v.x > 0.0);

        let repel = [Force::repellor(5.0, 3.0, Vec3::new(1.0, 0.0, 0.0))];
        let (_, v) = update_agent(0, &pos, &vel, &repel, &p);
        assert!(v.x < 0.0);
    }

    #[test]
    fn test_force_outside_radius_has_no_effect() {
        let force = Force::attractor(1.0, 10.0, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(force_steering(Vec3::ZERO, &[force]), Vec3::ZERO);
        assert_eq!(force_steering(Vec3::new(3.0, 0.0, 0.0), &[force]), Vec3::ZERO);
    }

    #[test]
    fn test_two_agent_mirror() {
        let p = params(2);
        let pos = vecs(&[[-0.5, 0.0, 0.0], [0.5, 0.0, 0.0]]);
        let vel = vecs(&[[0.0, 1.0, 0.0], [0.0, -1.0, 0.0]]);

        let (out_pos, out_vel) = run(&p, &[Force::default()], &pos, &vel);
        let (p0, p1) = (Vec3::from(out_pos[0]), Vec3::from(out_pos[1]));
        let (v0, v1) = (Vec3::from(out_vel[0]), Vec3::from(out_vel[1]));

        assert_relative_eq!(p0.x, -p1.x, epsilon = 1e-6);
        assert_relative_eq!(p0.y, -p1.y, epsilon = 1e-6);
        assert_relative_eq!(v0.x, -v1.x, epsilon = 1e-6);
        assert_relative_eq!(v0.y, -v1.y, epsilon = 1e-6);
        assert_eq!(p0.z, 0.0);
        assert_eq!(p1.z, 0.0);
    }

    #[test]
    fn test_head_on_pair_mirrors_about_midpoint() {
        let mut p = SimulationParameters::new(2);
        p.set_neighbour_radius(1.5);
        p.alignment_weight = 1.0;
        p.separation_weight = 1.0;
        p.cohesion_weight = 1.0;
        p.set_bounds(Vec3::splat(10.0));
        p.delta_time = 1.0;
        p.boid_speed = 1.0;
        p.reaction_factor = 0.0;

        let pos = vecs(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let vel = vecs(&[[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]);

        let sums = gather_neighbours(0, &pos, &vel, p.neighbour_radius_sq);
        assert_eq!(sums.count, 1);
        assert_eq!(sums.alignment, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(sums.separation, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(sums.cohesion - Vec3::from(pos[0]), Vec3::new(1.0, 0.0, 0.0));

        let (out_pos, out_vel) = run(&p, &[Force::default()], &pos, &vel);
        let (p0, p1) = (Vec3::from(out_pos[0]), Vec3::from(out_pos[1]));
        let (v0, v1) = (Vec3::from(out_vel[0]), Vec3::from(out_vel[1]));

        // The blend of alignment, separation and cohesion turns agent 0 around.
        assert_eq!(sums.steering(Vec3::from(pos[0]), &p), Vec3::new(-1.0, 0.0, 0.0));
        assert!(v0.x < 0.0);
        assert_eq!(v0, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(v0, -v1);
        assert_eq!(p0 + p1, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_mismatched_write_buffers_rejected() {
        let p = params(2);
        let pos = vecs(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let mut short_pos = vec![GpuVec3::ZERO; 1];
        let mut short_vel = vec![GpuVec3::ZERO; 1];
        let result = CpuKernel::new().dispatch(
            &p,
            &[Force::default()],
            BufferPair { positions: &pos, velocities: &pos },
            BufferPairMut { positions: &mut short_pos, velocities: &mut short_vel },
        );
        assert!(result.is_err());
    }
}
