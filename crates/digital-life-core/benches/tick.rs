use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use digital_life_core::prelude::*;

fn populated(population: usize) -> Ecosystem {
    let config = EcosystemConfig {
        initial_population: population,
        min_population: population / 2,
        max_population: population,
        ..Default::default()
    }
    .with_seed(0xF1EF);
    let mut eco = match Ecosystem::new(config) {
        Ok(eco) => eco,
        Err(e) => panic!("bench config rejected: {}", e),
    };
    eco.init();
    for i in 0..3 {
        if let Some(id) = eco.create_planet(Digit::from_bit(i % 2 == 0), 200.0 + i as f32 * 200.0, 300.0) {
            if let Some(planet) = eco.planet_mut(id) {
                planet.mature_now();
            }
        }
    }
    // Past the birth phase so collisions and planet effects are live
    for _ in 0..1_200 {
        eco.tick(16.0);
    }
    eco
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecosystem_tick");
    for population in [20usize, 50, 200] {
        let base = populated(population);
        let mut buffer = Vec::new();
        if base.save(&mut buffer).is_err() {
            continue;
        }
        group.bench_function(format!("population_{}", population), |b| {
            b.iter_batched(
                || Ecosystem::load(buffer.as_slice()).ok(),
                |eco| {
                    if let Some(mut eco) = eco {
                        for _ in 0..60 {
                            eco.tick(16.0);
                        }
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_particles(c: &mut Criterion) {
    c.bench_function("particles_planet_birth", |b| {
        b.iter_batched(
            || {
                let mut particles = ParticleSystem::new(3);
                particles.planet_birth(Vec2::new(400.0, 300.0), PlanetKind::UnitySphere);
                particles
            },
            |mut particles| {
                for _ in 0..60 {
                    particles.update(16.0);
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_tick, bench_particles);
criterion_main!(benches);
