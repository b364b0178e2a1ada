//! Benchmarks for the sampling hot paths: character lookup, total-rate
//! walks, and full mutation draws.
use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use phylevo::evolve::MutationSampler;
use phylevo::genome::{RefChrom, VarChrom};
use phylevo::sample::vitter_d;
use phylevo::EvolutionParams;

fn test_params(chunk: usize) -> EvolutionParams {
    EvolutionParams {
        pi_tcag: [0.25; 4],
        alpha_1: 1.0,
        alpha_2: 1.0,
        beta: 0.8,
        xi: 0.2,
        psi: 1.0,
        rel_insertion_rates: vec![1.0, 1.0],
        rel_deletion_rates: vec![1.0, 1.0],
        chunk_size: chunk,
    }
}

fn mutated_variant(size: usize, n_muts: usize) -> VarChrom {
    let bases: Vec<u8> = (0..size).map(|i| b"TCAG"[(i * 7 + 1) % 4]).collect();
    let mut vc = VarChrom::new(Arc::new(RefChrom::new("chr1", bases)));
    let mut sampler =
        MutationSampler::from_params(&test_params(0), &[(size, 1.0)], size).unwrap();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    for _ in 0..n_muts {
        sampler.mutate(&mut vc, &mut rng);
    }
    vc
}

fn bench_char_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("char_at");
    for &n_muts in &[0usize, 100, 1_000] {
        let vc = mutated_variant(100_000, n_muts);
        group.throughput(Throughput::Elements(vc.size() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n_muts), &vc, |b, vc| {
            b.iter(|| {
                let mut acc = 0u64;
                for p in (0..vc.size()).step_by(97) {
                    acc += vc.char_at(black_box(p)).unwrap() as u64;
                }
                acc
            })
        });
    }
    group.finish();
}

fn bench_total_rate(c: &mut Criterion) {
    let mut group = c.benchmark_group("total_rate");
    for &n_muts in &[0usize, 1_000] {
        let vc = mutated_variant(100_000, n_muts);
        let size = vc.size();
        let sampler =
            MutationSampler::from_params(&test_params(0), &[(size, 1.0)], size).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n_muts), &vc, |b, vc| {
            b.iter(|| sampler.total_rate(black_box(vc), 0, 0, false))
        });
    }
    group.finish();
}

fn bench_mutate(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutate");
    for &chunk in &[0usize, 128] {
        group.bench_with_input(
            BenchmarkId::new("chunk", chunk),
            &chunk,
            |b, &chunk| {
                let size = 50_000;
                let bases: Vec<u8> = (0..size).map(|i| b"TCAG"[i % 4]).collect();
                let vc0 = VarChrom::new(Arc::new(RefChrom::new("chr1", bases)));
                let sampler0 =
                    MutationSampler::from_params(&test_params(chunk), &[(size, 1.0)], size)
                        .unwrap();
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
                b.iter(|| {
                    let mut vc = vc0.clone();
                    let mut sampler = sampler0.clone();
                    let mut acc = 0.0;
                    for _ in 0..20 {
                        acc += sampler.mutate(&mut vc, &mut rng);
                    }
                    acc
                })
            },
        );
    }
    group.finish();
}

fn bench_vitter_d(c: &mut Criterion) {
    let mut group = c.benchmark_group("vitter_d");
    for &n in &[100usize, 1_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
            let mut buf = vec![0usize; n];
            b.iter(|| {
                vitter_d(black_box(&mut buf), 10_000_000, &mut rng);
                buf[n - 1]
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_char_at,
    bench_total_rate,
    bench_mutate,
    bench_vitter_d
);
criterion_main!(benches);
