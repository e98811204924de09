//! Performance benchmarks for microcosm

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use microcosm::board::Board;
use microcosm::genetics::{crossover, Genes};
use microcosm::terrain::{TerrainMap, TileKind};
use microcosm::vector::Vec2;
use microcosm::{Config, World};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn grass_world(creatures: usize, fruit: usize, seed: u64) -> World {
    let mut config = Config::default();
    config.population.initial_creatures = creatures;
    config.population.initial_fruit = fruit;

    let terrain = TerrainMap::uniform(config.world.width, config.world.height, TileKind::Grass);
    World::new_with_seed(config, terrain, seed)
}

fn benchmark_world_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("world_step");

    for population in [10, 50, 200].iter() {
        let mut world = grass_world(*population, population * 3, 42);

        // Warm up
        world.run(10);

        group.bench_with_input(
            BenchmarkId::new("creatures", population),
            population,
            |b, _| {
                b.iter(|| {
                    world.step();
                });
            },
        );
    }

    group.finish();
}

fn benchmark_nearby_query(c: &mut Criterion) {
    let mut world = grass_world(100, 300, 7);
    world.run(20);

    let board: &Board = &world.board;
    let query = Vec2::new(300.0, 300.0);

    c.bench_function("board_nearby_r75", |b| {
        b.iter(|| board.nearby(black_box(query), black_box(75.0), &world.entities));
    });
}

fn benchmark_crossover(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let a = Genes::generate(&mut rng);
    let b_genes = Genes::generate(&mut rng);

    c.bench_function("genetics_crossover", |b| {
        b.iter(|| crossover(black_box(&a), black_box(&b_genes), 1.0, &mut rng));
    });
}

criterion_group!(
    benches,
    benchmark_world_step,
    benchmark_nearby_query,
    benchmark_crossover
);
criterion_main!(benches);
