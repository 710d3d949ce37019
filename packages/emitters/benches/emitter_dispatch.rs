//! Benchmarks for event dispatch overhead.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint;

use criterion::{Criterion, criterion_group, criterion_main};
use emitters::EventEmitter;

fn emitter_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("emitter_dispatch");

    group.bench_function("dispatch_1_subscriber", |b| {
        let emitter = EventEmitter::<u64>::new();
        emitter.subscribe(|value: &u64| {
            hint::black_box(*value);
        });

        b.iter(|| emitter.dispatch(hint::black_box(&42)));
    });

    group.bench_function("dispatch_16_subscribers", |b| {
        let emitter = EventEmitter::<u64>::new();
        for _ in 0..16 {
            emitter.subscribe(|value: &u64| {
                hint::black_box(*value);
            });
        }

        b.iter(|| emitter.dispatch(hint::black_box(&42)));
    });

    group.bench_function("subscribe_dispatch_unsubscribe", |b| {
        let emitter = EventEmitter::<u64>::new();

        b.iter(|| {
            let subscription = emitter.subscribe(|value: &u64| {
                hint::black_box(*value);
            });
            emitter.dispatch(hint::black_box(&42));
            subscription.dispose();
        });
    });

    group.finish();
}

criterion_group!(benches, emitter_dispatch);
criterion_main!(benches);
