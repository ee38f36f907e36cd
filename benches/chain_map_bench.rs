use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use mesh_map::{ChainMap, UnivMap};
use rand_core::{RngCore, SeedableRng};
use rand_pcg::Lcg128Xsl64 as Pcg;
use std::time::Duration;

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain::insert");
    group.throughput(Throughput::Elements(100_000));
    group.bench_function("fresh_100k", |b| {
        b.iter_batched(
            ChainMap::<String, u64>::new,
            |mut m| {
                let mut rng = Pcg::seed_from_u64(1);
                for i in 0..100_000 {
                    m.try_insert(key(rng.next_u64()), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("univ_fresh_100k", |b| {
        b.iter_batched(
            UnivMap::<usize, usize>::new,
            |mut m| {
                for k in 0..100_000usize {
                    m.enter(k, k);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain::remove");
    group.throughput(Throughput::Elements(10_000));
    group.bench_function("random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let mut m = ChainMap::new();
                let mut rng = Pcg::seed_from_u64(5);
                let keys: Vec<String> = (0..110_000).map(|_| key(rng.next_u64())).collect();
                for (i, k) in keys.iter().enumerate() {
                    m.try_insert(k.clone(), i as u64);
                }
                let mut idx_rng = Pcg::seed_from_u64(0x9e3779b97f4a7c15);
                let to_remove: Vec<String> = (0..10_000)
                    .map(|_| keys[(idx_rng.next_u64() as usize) % keys.len()].clone())
                    .collect();
                (m, to_remove)
            },
            |(mut m, to_remove)| {
                for k in &to_remove {
                    black_box(m.remove(k.as_str()));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain::query");
    group.throughput(Throughput::Elements(10_000));
    let mut m = ChainMap::new();
    let mut rng_keys = Pcg::seed_from_u64(7);
    let keys: Vec<String> = (0..100_000).map(|_| key(rng_keys.next_u64())).collect();
    for (i, k) in keys.iter().enumerate() {
        m.try_insert(k.clone(), i as u64);
    }
    let mut rng_q = Pcg::seed_from_u64(0x9e3779b97f4a7c15);
    let queries: Vec<String> = (0..10_000)
        .map(|_| keys[(rng_q.next_u64() as usize) % keys.len()].clone())
        .collect();
    group.bench_function("hit_10k_on_100k", |b| {
        b.iter(|| {
            for k in &queries {
                black_box(m.lookup(k.as_str()));
            }
        })
    });
    let mut miss = Pcg::seed_from_u64(0xdead_beef);
    group.bench_function("miss_10k_on_100k", |b| {
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next_u64());
                black_box(m.lookup(k.as_str()));
            }
        })
    });
    group.bench_function("slot_increment_10k", |b| {
        b.iter(|| {
            for k in &queries {
                if let Some(v) = m.slot(k.as_str()) {
                    *v = v.wrapping_add(1);
                }
            }
        })
    });
    group.finish();
}

fn bench_traverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain::traverse");
    group.throughput(Throughput::Elements(100_000));
    let mut m: ChainMap<u64, u64> = ChainMap::new();
    for k in 0..100_000u64 {
        m.insert(k, k);
    }
    group.bench_function("cursor_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            let mut cur = m.cursor();
            while cur.is_positioned() {
                sum = sum.wrapping_add(*cur.value());
                cur.advance();
            }
            black_box(sum)
        })
    });
    let mut rng = Pcg::seed_from_u64(13);
    group.bench_function("random_cursor_100k", |b| {
        b.iter(|| black_box(m.iter_random(&mut rng).map(|(_, v)| *v).sum::<u64>()))
    });
    group.finish();
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_insert, bench_remove
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_query, bench_traverse
}
criterion_main!(benches_insert, benches_ops);
