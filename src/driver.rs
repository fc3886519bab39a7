//! The per-frame control loop.
//!
//! [`FrameDriver`] ties the pieces together the way an application's render loop would:
//! tick the clock, move the forces, fill in this frame's parameters, step the engine and
//! commit the result.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::FlockConfig;
use crate::engine::{FlockEngine, StepOutcome};
use crate::error::EngineError;
use crate::force_field::{ForceField, ForceMode};
use crate::kernel::FlockKernel;
use crate::params::SimulationParameters;
use crate::time::FrameClock;

/// What happened in one driven frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// 1-based count of frames driven so far, skipped ones included.
    pub frame: u64,
    pub delta_time: f32,
    pub outcome: StepOutcome,
    pub force_count: usize,
}

/// Summary of the committed flock state.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlockStats {
    pub agent_count: usize,
    pub centroid: Vec3,
    pub mean_speed: f32,
    /// Corners of the axis-aligned box around every agent.
    pub min: Vec3,
    pub max: Vec3,
}

impl FlockStats {
    pub fn from_state(positions: &[Vec3], velocities: &[Vec3]) -> Self {
        if positions.is_empty() {
            return Self {
                agent_count: 0,
                centroid: Vec3::ZERO,
                mean_speed: 0.0,
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            };
        }

        let n = positions.len() as f32;
        let (sum, min, max) = positions.iter().fold(
            (Vec3::ZERO, Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(sum, min, max), &p| (sum + p, min.min(p), max.max(p)),
        );
        let speed_sum: f32 = velocities.iter().map(|v| v.length()).sum();

        Self {
            agent_count: positions.len(),
            centroid: sum / n,
            mean_speed: speed_sum / velocities.len().max(1) as f32,
            min,
            max,
        }
    }

    /// Size of the bounding box.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Drives a [`FlockEngine`] one frame at a time.
pub struct FrameDriver<K: FlockKernel> {
    engine: FlockEngine<K>,
    field: ForceField,
    clock: FrameClock,
    base: SimulationParameters,
    frame: u64,
}

impl<K: FlockKernel> FrameDriver<K> {
    pub fn new(engine: FlockEngine<K>, field: ForceField, clock: FrameClock, base: SimulationParameters) -> Self {
        Self {
            engine,
            field,
            clock,
            base,
            frame: 0,
        }
    }

    /// Spawn a flock on `kernel` and wire it up as `config` describes.
    pub fn from_config(kernel: K, config: &FlockConfig) -> Result<Self, EngineError> {
        let seed = config.seed.unwrap_or_else(rand::random);
        log::info!("Seed {}", seed);

        let mut rng = SmallRng::seed_from_u64(seed);
        let engine = FlockEngine::initialize(kernel, config.agent_count, config.spawn_range, &mut rng)?;
        let field = ForceField::new(config.bounds(), config.walker_policy(), rng.gen());
        let clock = FrameClock::new(config.max_delta_time);

        Ok(Self::new(engine, field, clock, config.to_parameters()))
    }

    /// Tick the clock and advance by the measured delta.
    ///
    /// Returns `None` when the clock produced no delta: on the first call, right after
    /// resuming, and while paused.
    pub fn frame(&mut self) -> Result<Option<FrameReport>, EngineError> {
        match self.clock.tick() {
            Some(delta_time) => self.advance(delta_time).map(Some),
            None => Ok(None),
        }
    }

    /// Advance by an explicit `delta_time`, bypassing the clock.
    pub fn advance(&mut self, delta_time: f32) -> Result<FrameReport, EngineError> {
        self.field.update();

        let forces = self.field.forces();
        let mut params = self.base;
        params.delta_time = delta_time;
        params.num_forces = forces.len() as f32;
        params.set_show_point_light(self.field.shows_point_light());

        let outcome = self.engine.step(&params, forces)?;
        if outcome == StepOutcome::Advanced {
            self.engine.swap_buffers()?;
        }

        self.frame += 1;
        Ok(FrameReport {
            frame: self.frame,
            delta_time,
            outcome,
            force_count: forces.len(),
        })
    }

    /// Switch to the next force layout.
    pub fn cycle_force_mode(&mut self) -> ForceMode {
        self.field.cycle()
    }

    pub fn set_force_mode(&mut self, mode: ForceMode) {
        self.field.set_mode(mode);
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) {
        self.clock.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn engine(&self) -> &FlockEngine<K> {
        &self.engine
    }

    pub fn force_field(&self) -> &ForceField {
        &self.field
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Parameters every frame starts from. Renderers set the model transform here.
    pub fn base_parameters_mut(&mut self) -> &mut SimulationParameters {
        &mut self.base
    }

    /// Read back the committed state and summarize it.
    pub fn stats(&self) -> Result<FlockStats, EngineError> {
        Ok(FlockStats::from_state(&self.engine.positions()?, &self.engine.velocities()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::CpuKernel;

    fn config(seed: u64) -> FlockConfig {
        FlockConfig {
            agent_count: 64,
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn driver(seed: u64) -> FrameDriver<CpuKernel> {
        FrameDriver::from_config(CpuKernel::new(), &config(seed)).unwrap()
    }

    #[test]
    fn test_first_frame_only_sets_baseline() {
        let mut d = driver(1);
        assert_eq!(d.frame().unwrap(), None);
        assert_eq!(d.engine().steps(), 0);
    }

    #[test]
    fn test_advance_steps_and_swaps() {
        let mut d = driver(1);
        let report = d.advance(1.0 / 60.0).unwrap();
        assert_eq!(report.frame, 1);
        assert_eq!(report.outcome, StepOutcome::Advanced);
        assert_eq!(report.force_count, 0);
        assert!(!d.engine().has_pending_swap());
        assert_eq!(d.engine().parameters().delta_time, 1.0 / 60.0);
    }

    #[test]
    fn test_force_mode_reaches_parameters() {
        let mut d = driver(2);
        assert_eq!(d.cycle_force_mode(), ForceMode::SingleAttractor);
        let report = d.advance(0.016).unwrap();
        assert_eq!(report.force_count, 1);
        assert_eq!(d.engine().parameters().num_forces, 1.0);
        assert_eq!(d.engine().parameters().show_point_light, 1.0);

        d.set_force_mode(ForceMode::Mixed);
        assert_eq!(d.advance(0.016).unwrap().force_count, 3);

        d.set_force_mode(ForceMode::SingleRepellor);
        d.advance(0.016).unwrap();
        assert_eq!(d.engine().parameters().show_point_light, 0.0);
    }

    #[test]
    fn test_paused_driver_does_nothing() {
        let mut d = driver(3);
        d.pause();
        assert!(d.is_paused());
        for _ in 0..3 {
            assert_eq!(d.frame().unwrap(), None);
        }
        assert_eq!(d.engine().steps(), 0);
        d.resume();
        assert!(!d.is_paused());
    }

    #[test]
    fn test_same_seed_same_flock() {
        let mut a = driver(7);
        let mut b = driver(7);
        a.set_force_mode(ForceMode::Mixed);
        b.set_force_mode(ForceMode::Mixed);
        for _ in 0..10 {
            a.advance(1.0 / 60.0).unwrap();
            b.advance(1.0 / 60.0).unwrap();
        }
        assert_eq!(a.engine().positions().unwrap(), b.engine().positions().unwrap());
    }

    #[test]
    fn test_stats() {
        let positions = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 0.0)];
        let velocities = [Vec3::X, Vec3::Y * 3.0];
        let stats = FlockStats::from_state(&positions, &velocities);
        assert_eq!(stats.agent_count, 2);
        assert_eq!(stats.centroid, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(stats.mean_speed, 2.0);
        assert_eq!(stats.extent(), Vec3::new(2.0, 2.0, 0.0));

        let empty = FlockStats::from_state(&[], &[]);
        assert_eq!(empty.agent_count, 0);
    }
}
