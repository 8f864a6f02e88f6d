use criterion::{black_box, criterion_group, criterion_main, Criterion};
use interval_map::IntervalMap;
use rand::{thread_rng, Rng};

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("add random ranges, space=65536", |b| {
        let mut map = IntervalMap::new();
        let mut rng = thread_rng();

        b.iter(|| {
            let start = rng.gen_range(0u64..65536);
            let len = rng.gen_range(1u64..256);
            map.add(start, start + len, 1u32).expect("add should work");
        })
    });

    c.bench_function("add/delete churn, space=65536", |b| {
        let mut map = IntervalMap::new();
        let mut rng = thread_rng();

        b.iter(|| {
            let start = rng.gen_range(0u64..65536);
            let len = rng.gen_range(1u64..256);
            if rng.gen::<bool>() {
                map.add(start, start + len, 1u32).expect("add should work");
            } else {
                map.delete(start, start + len).expect("delete should work");
            }
        })
    });

    c.bench_function("lookup_point, 1024 ranges", |b| {
        let mut map = IntervalMap::new();
        for i in 0..1024u64 {
            map.add(i * 64, i * 64 + 32, (i % 7) as u32)
                .expect("add should work");
        }
        let mut rng = thread_rng();

        b.iter(|| {
            let addr = rng.gen_range(0u64..65536);
            black_box(map.lookup_point(addr).ok());
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
