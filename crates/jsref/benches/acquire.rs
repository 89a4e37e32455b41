use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use jsref::{Bridge, BridgeOptions, JsNumber, JsRef};
use jsref_sdk::mock::MockRuntime;

fn bench_acquire_hit(c: &mut Criterion) {
    let rt = Arc::new(MockRuntime::new());
    let bridge = Bridge::new(rt.clone());
    let raw = rt.boxed_number(1.0);
    let _held: JsNumber = bridge.acquire(bridge.handle(raw)).unwrap();

    c.bench_function("acquire_hit", |b| {
        b.iter(|| {
            let proxy = bridge.acquire_any(bridge.handle(rt.retain(black_box(raw))));
            proxy.unwrap()
        });
    });
}

fn bench_acquire_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("acquire_miss");

    for resolve_types in [true, false] {
        let rt = Arc::new(MockRuntime::new());
        let options = BridgeOptions {
            resolve_types,
            ..BridgeOptions::default()
        };
        let bridge = Bridge::with_options(rt.clone(), options);
        let raw = rt.boxed_number(1.0);

        group.bench_with_input(
            BenchmarkId::new("resolve_types", resolve_types),
            &raw,
            |b, raw| {
                b.iter(|| {
                    // dropped at the end of each iteration, so every acquire misses
                    let proxy: JsRef = bridge.acquire(bridge.handle(rt.retain(*raw))).unwrap();
                    black_box(proxy.class())
                });
            },
        );
    }

    group.finish();
}

fn bench_construct(c: &mut Criterion) {
    let rt = Arc::new(MockRuntime::new());
    let bridge = Bridge::new(rt.clone());
    let raw = rt.boxed_number(1.0);

    c.bench_function("construct", |b| {
        b.iter(|| {
            let proxy: JsNumber = bridge.construct(bridge.handle(rt.retain(black_box(raw)))).unwrap();
            proxy
        });
    });
}

criterion_group!(benches, bench_acquire_hit, bench_acquire_miss, bench_construct);
criterion_main!(benches);
