//! Initial agent state generators.
//!
//! Both generators take the random source as a parameter, so a seeded RNG gives a
//! reproducible flock and the generators can be tested without an engine.

use glam::Vec3;
use rand::Rng;
use std::ops::RangeInclusive;

/// Independent uniform positions inside an axis-aligned box.
pub fn generate_random_positions<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    x_range: RangeInclusive<f32>,
    y_range: RangeInclusive<f32>,
    z_range: RangeInclusive<f32>,
) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(x_range.clone()),
                rng.gen_range(y_range.clone()),
                rng.gen_range(z_range.clone()),
            )
        })
        .collect()
}

/// Independent uniform positions inside the cube `-range..=range` on every axis.
pub fn generate_random_positions_in_cube<R: Rng + ?Sized>(rng: &mut R, count: usize, range: f32) -> Vec<Vec3> {
    let range = range.abs();
    generate_random_positions(rng, count, -range..=range, -range..=range, -range..=range)
}

/// Independent unit-length velocities with uniformly random direction.
pub fn generate_random_velocities<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Vec3> {
    (0..count).map(|_| random_unit_vector(rng)).collect()
}

/// A random direction of length 1.
///
/// Samples the `[-1, 1]` cube and normalizes, rejecting the rare sample too close to
/// the origin to normalize.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if let Some(n) = v.try_normalize() {
            return n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_positions_within_range() {
        let mut rng = SmallRng::seed_from_u64(7);
        let positions = generate_random_positions(&mut rng, 500, -1.0..=1.0, -2.0..=2.0, 0.0..=0.5);
        assert_eq!(positions.len(), 500);
        for p in positions {
            assert!((-1.0..=1.0).contains(&p.x));
            assert!((-2.0..=2.0).contains(&p.y));
            assert!((0.0..=0.5).contains(&p.z));
        }
    }

    #[test]
    fn test_velocities_are_unit_length() {
        let mut rng = SmallRng::seed_from_u64(11);
        for v in generate_random_velocities(&mut rng, 500) {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_random_positions_in_cube(&mut SmallRng::seed_from_u64(3), 64, 2.5);
        let b = generate_random_positions_in_cube(&mut SmallRng::seed_from_u64(3), 64, 2.5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_count() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(generate_random_positions_in_cube(&mut rng, 0, 1.0).is_empty());
        assert!(generate_random_velocities(&mut rng, 0).is_empty());
    }
}
