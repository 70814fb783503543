use benchmarks::scorer_for;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use factoring_core::{is_prime, primes_up_to, Algorithm};
use spectral_duality::{coherence, spectral_vector};

const SEMIPRIMES: [u64; 4] = [143, 2021, 8051, 1_022_117];

fn bench_sieve(c: &mut Criterion) {
    let mut group = c.benchmark_group("primes_up_to");
    for limit in [10_000u64, 100_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| primes_up_to(limit));
        });
    }
    group.finish();
}

fn bench_is_prime(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_prime");
    for n in [1_000_003u64, 2_147_483_647, 2_305_843_009_213_693_951] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| is_prime(black_box(n)));
        });
    }
    group.finish();
}

fn bench_spectral(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectral");
    for n in SEMIPRIMES {
        group.bench_with_input(BenchmarkId::new("spectral_vector", n), &n, |b, &n| {
            b.iter(|| spectral_vector(black_box(n)));
        });
        let p = (2..n).find(|d| n % d == 0).unwrap_or(1);
        group.bench_with_input(BenchmarkId::new("coherence", n), &(p, n / p, n), |b, &(p, q, n)| {
            b.iter(|| coherence(p, q, n));
        });
    }
    group.finish();
}

fn bench_axiom_scorers(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_divisors");
    group.sample_size(20);
    for axiom in Algorithm::AXIOMS {
        let Some(scorer) = scorer_for(axiom) else { continue };
        for n in SEMIPRIMES {
            group.bench_with_input(BenchmarkId::new(axiom.key(), n), &n, |b, &n| {
                b.iter(|| scorer(black_box(n)));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_sieve, bench_is_prime, bench_spectral, bench_axiom_scorers);
criterion_main!(benches);
