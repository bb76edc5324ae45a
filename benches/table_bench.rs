use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use probe_table::{HashOptions, OpenAddressingTable, ProbeStrategy};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn table(strategy: ProbeStrategy) -> OpenAddressingTable<u64> {
    OpenAddressingTable::with_options_and_rng(
        HashOptions::new().strategy(strategy),
        &mut StdRng::seed_from_u64(0xfeed),
    )
    .unwrap()
}

fn filled(strategy: ProbeStrategy, seed: u64, n: usize) -> OpenAddressingTable<u64> {
    let mut t = table(strategy);
    for (i, x) in lcg(seed).take(n).enumerate() {
        t.insert(key(x), i as u64).unwrap();
    }
    t
}

fn bench_insert_fresh_100k(c: &mut Criterion) {
    for (name, strategy) in [
        ("table::insert_fresh_100k_linear", ProbeStrategy::Linear),
        ("table::insert_fresh_100k_quadratic", ProbeStrategy::Quadratic),
        ("table::insert_fresh_100k_double_hash", ProbeStrategy::DoubleHash),
    ] {
        c.bench_function(name, |b| {
            b.iter_batched(
                || table(strategy),
                |mut t| {
                    for (i, x) in lcg(1).take(100_000).enumerate() {
                        let _ = t.insert(key(x), i as u64).unwrap();
                    }
                    black_box(t)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_lookup_hit_100k(c: &mut Criterion) {
    let t = filled(ProbeStrategy::Linear, 7, 100_000);
    let keys: Vec<String> = lcg(7).take(100_000).map(key).collect();
    c.bench_function("table::lookup_hit_100k", |b| {
        b.iter(|| {
            for k in &keys {
                black_box(t.lookup(k));
            }
        })
    });
}

fn bench_lookup_miss_100k(c: &mut Criterion) {
    let t = filled(ProbeStrategy::Linear, 7, 100_000);
    let keys: Vec<String> = lcg(8).take(100_000).map(key).collect();
    c.bench_function("table::lookup_miss_100k", |b| {
        b.iter(|| {
            for k in &keys {
                black_box(t.lookup(k));
            }
        })
    });
}

fn bench_delete_random_10k(c: &mut Criterion) {
    c.bench_function("table::delete_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let t = filled(ProbeStrategy::DoubleHash, 5, 110_000);
                let victims: Vec<String> = lcg(5).take(110_000).step_by(11).map(key).collect();
                (t, victims)
            },
            |(mut t, victims)| {
                for k in &victims {
                    let _ = t.delete(k);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

// Delete/insert churn keeps tombstones on every probe path.
fn bench_churn_10k(c: &mut Criterion) {
    c.bench_function("table::churn_10k", |b| {
        b.iter_batched(
            || filled(ProbeStrategy::Linear, 9, 50_000),
            |mut t| {
                for (i, x) in lcg(9).take(10_000).enumerate() {
                    let _ = t.delete(key(x));
                    let _ = t.insert(key(x ^ 1), i as u64);
                }
                black_box(t)
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(Duration::from_secs(1))
        .measurement_time(Duration::from_secs(3));
    targets = bench_insert_fresh_100k,
        bench_lookup_hit_100k,
        bench_lookup_miss_100k,
        bench_delete_random_10k,
        bench_churn_10k
}
criterion_main!(benches);
