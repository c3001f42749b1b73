use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pfa::prelude::*;

fn example() -> Pfa {
    Pfa::builder()
        .with_states(["q0", "q1", "q2"])
        .with_alphabet(['a', 'b'])
        .with_transition("q0", 'a', [("q0", 0.5), ("q1", 0.5)])
        .with_transition("q1", 'a', [("q1", 0.3), ("q2", 0.7)])
        .with_transition("q2", 'a', [("q0", 0.6), ("q2", 0.4)])
        .with_transition("q1", 'b', [("q0", 1.0)])
        .with_start("q0")
        .with_accepting(["q2"])
        .build()
        .unwrap()
}

fn powers(c: &mut Criterion) {
    let pfa = example();
    let config = StochasticConfig::new(1_000).with_seed(0);
    let mut group = c.benchmark_group("power");

    for k in [10usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("exact", k), &k, |b, &k| {
            b.iter(|| pfa.evaluate_exact_power(&'a', black_box(k)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("stochastic", k), &k, |b, &k| {
            b.iter(|| {
                pfa.evaluate_stochastic_power(&'a', black_box(k), &config)
                    .unwrap()
            })
        });
    }
    group.bench_function("exact/100000", |b| {
        b.iter(|| pfa.evaluate_exact_power(&'a', black_box(100_000)).unwrap())
    });
    group.finish();
}

fn words(c: &mut Criterion) {
    let pfa = example();
    let word: Vec<char> = "aabaabaaab".chars().collect();
    c.bench_function("word/exact", |b| {
        b.iter(|| pfa.evaluate_exact(black_box(&word)))
    });
    c.bench_function("word/stochastic", |b| {
        b.iter(|| {
            pfa.evaluate_stochastic(black_box(&word), &StochasticConfig::new(1_000))
                .unwrap()
        })
    });
}

criterion_group!(benches, powers, words);
criterion_main!(benches);
