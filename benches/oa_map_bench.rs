use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use oa_hashmap::OpenAddressingMap;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("oa_map_insert_10k", |b| {
        b.iter_batched(
            OpenAddressingMap::<String, u64>::new,
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("oa_map_get_hit", |b| {
        let mut m = OpenAddressingMap::new();
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        for (i, k) in keys.iter().cloned().enumerate() {
            m.insert(k, i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            let v = m.get(k.as_str()).unwrap();
            black_box(v);
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("oa_map_get_miss", |b| {
        let mut m = OpenAddressingMap::new();
        for (i, x) in lcg(11).take(10_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            let k = key(miss.next().unwrap());
            black_box(m.get(k.as_str()));
        })
    });
}

// Remove/reinsert cycles keep tombstones on the probe paths, so this
// measures probing through deleted slots rather than clean chains.
fn bench_churn(c: &mut Criterion) {
    c.bench_function("oa_map_churn_remove_reinsert", |b| {
        let mut m = OpenAddressingMap::new();
        let keys: Vec<_> = lcg(23).take(10_000).map(key).collect();
        for (i, k) in keys.iter().cloned().enumerate() {
            m.insert(k, i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            let v = m.remove(k.as_str()).unwrap();
            m.insert(k.clone(), v);
        })
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_get_hit,
    bench_get_miss,
    bench_churn
);
criterion_main!(benches);
