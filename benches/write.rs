use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use prefs_gateway::{Gateway, PrefStore, Value};

fn benchmark_gateway_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("gateway_writes");
    group.sample_size(10);
    for iters in [10_u64, 100_u64, 250_u64, 1000_u64].iter() {
        group.throughput(Throughput::Elements(*iters));
        group.bench_with_input(BenchmarkId::from_parameter(iters), iters, |b, &iters| {
            let gateway =
                Gateway::new(PrefStore::in_memory().unwrap(), "prefs.bench").unwrap();
            b.iter(|| {
                for i in 0..iters {
                    let fields = vec![(format!("key-{i}"), Value::Long(i as i64))];
                    gateway.insert("long/bench/", &fields).unwrap();
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_gateway_writes);
criterion_main!(benches);
