#![allow(missing_docs)]

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wirebox::{ContainerBuilder, Dc, ExplicitArguments};

#[derive(Default)]
struct Counter(u64);

#[derive(Default)]
struct Cache(Vec<u64>);

struct Transient {
    counter: Dc<Counter>,
    cache: Dc<Cache>,
}

fn benchmark(c: &mut Criterion) {
    let mut builder = ContainerBuilder::new();
    builder
        .register_singleton(Counter::default())
        .register_scoped_default::<Cache>()
        .register_transient_factory(|counter: Dc<Counter>, cache: Dc<Cache>| Ok(Transient { counter, cache }));
    let container = builder.build();

    c.bench_function("singleton", |b| b.iter(|| black_box(container.get::<Counter>().unwrap().0)));
    c.bench_function("scoped", |b| b.iter(|| black_box(container.get::<Cache>().unwrap().0.len())));
    c.bench_function("transient", |b| {
        b.iter(|| {
            let transient = container.get::<Transient>().unwrap();
            black_box((transient.counter.0, transient.cache.0.len()))
        })
    });
    c.bench_function("explicit_arguments", |b| {
        b.iter(|| {
            let args = ExplicitArguments::new().set(Counter(42));
            black_box(container.with(args).get::<Transient>().unwrap().counter.0)
        })
    });
    c.bench_function("nested_container", |b| {
        b.iter(|| {
            let nested = container.get_nested_container().unwrap();
            let cache = nested.get::<Cache>().unwrap();
            nested.dispose().unwrap();
            black_box(cache.0.len())
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
