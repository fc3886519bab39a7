//! Benchmarks for one flock step on the CPU kernel.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use maxboid::kernel::update_agent;
use maxboid::{
    buffers::to_gpu_vec3s, generate_random_positions, generate_random_velocities, CpuKernel, FlockConfig,
    FlockEngine, ForceMode,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn bench_engine_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_step");
    group.sample_size(20);

    for &n in &[500usize, 2000, 8000] {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut engine = FlockEngine::initialize(CpuKernel::new(), n, 2.5, &mut rng).unwrap();
        let forces = ForceMode::Mixed.forces();
        let mut params = FlockConfig { agent_count: n, ..Default::default() }.to_parameters();
        params.delta_time = 1.0 / 60.0;
        params.num_forces = forces.len() as f32;

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                engine.step(black_box(&params), black_box(&forces)).unwrap();
                engine.swap_buffers().unwrap();
            })
        });
    }

    group.finish();
}

fn bench_single_agent(c: &mut Criterion) {
    let n = 8000;
    let mut rng = SmallRng::seed_from_u64(0);
    let positions = to_gpu_vec3s(&generate_random_positions(&mut rng, n, -2.5..=2.5, -2.5..=2.5, -2.5..=2.5));
    let velocities = to_gpu_vec3s(&generate_random_velocities(&mut rng, n));
    let params = FlockConfig { agent_count: n, ..Default::default() }.to_parameters();

    c.bench_function("update_agent_8000", |b| {
        b.iter(|| black_box(update_agent(black_box(17), &positions, &velocities, &[], &params)))
    });
}

criterion_group!(benches, bench_engine_step, bench_single_agent);
criterion_main!(benches);
