use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quick_cache::sync::Cache;

const INSERT_MANY: usize = 100_000;
const GET_MANY: usize = 10_000;

fn insert_many(cache: &Cache<usize, usize>) {
    for i in 0..INSERT_MANY {
        cache.insert(i, i);
    }
}

fn insert_and_lookup(cache: &Cache<usize, usize>) {
    for i in 0..GET_MANY {
        cache.insert(i, i);
    }

    for i in 0..GET_MANY {
        black_box(cache.get(&i));
    }
}

fn churn(cache: &Cache<usize, usize>) {
    for i in 0..GET_MANY {
        let key = i % (GET_MANY / 2 * 3);
        black_box(cache.get_or_insert_with(&key, || Ok::<_, ()>(i)).unwrap());
    }
}

fn bencher(c: &mut Criterion) {
    let cache = Cache::new(INSERT_MANY);
    c.bench_function("quick cache insert many", |b| b.iter(|| insert_many(&cache)));

    let cache = Cache::new(GET_MANY);
    c.bench_function("quick cache insert and lookup", |b| b.iter(|| insert_and_lookup(&cache)));

    let cache = Cache::new(GET_MANY);
    c.bench_function("quick cache churn", |b| b.iter(|| churn(&cache)));
}

criterion_group!(benches, bencher);
criterion_main!(benches);
