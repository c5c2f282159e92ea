//! Marshal and unmarshal benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use entimap_bench::{random_users, stored_users};
use entimap_core::Mapper;
use entimap_testkit::fixtures::{scenarios, Customer, User};

/// Benchmark marshalling single fixtures.
fn bench_marshal(c: &mut Criterion) {
    let mut group = c.benchmark_group("marshal");
    let mapper = Mapper::default();

    group.bench_function("user", |b| {
        let user = scenarios::sample_user();
        b.iter(|| {
            let native = mapper.marshal(black_box(&user)).unwrap();
            black_box(native);
        });
    });

    group.bench_function("customer_embedded", |b| {
        let customer = scenarios::sample_customer();
        b.iter(|| {
            let native = mapper.marshal(black_box(&customer)).unwrap();
            black_box(native);
        });
    });

    group.bench_function("order_custom_converter", |b| {
        let order = scenarios::sample_order();
        b.iter(|| {
            let native = mapper.marshal(black_box(&order)).unwrap();
            black_box(native);
        });
    });

    group.finish();
}

/// Benchmark batch marshalling.
fn bench_marshal_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("marshal_batch");

    for batch_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let mapper = Mapper::default();
                let users = random_users(batch_size);

                b.iter(|| {
                    let natives = mapper.marshal_all(black_box(&users)).unwrap();
                    black_box(natives);
                });
            },
        );
    }
    group.finish();
}

/// Benchmark unmarshalling stored entities.
fn bench_unmarshal(c: &mut Criterion) {
    let mut group = c.benchmark_group("unmarshal");
    let mapper = Mapper::default();

    group.bench_function("user", |b| {
        let native = mapper.marshal(&scenarios::sample_user()).unwrap();
        b.iter(|| {
            let user: User = mapper.unmarshal(black_box(&native)).unwrap();
            black_box(user);
        });
    });

    group.bench_function("customer_embedded", |b| {
        let native = mapper.marshal(&scenarios::sample_customer()).unwrap();
        b.iter(|| {
            let customer: Customer = mapper.unmarshal(black_box(&native)).unwrap();
            black_box(customer);
        });
    });

    group.finish();
}

/// Benchmark batch unmarshalling.
fn bench_unmarshal_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("unmarshal_batch");

    for batch_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let mapper = Mapper::default();
                let natives = stored_users(batch_size);

                b.iter(|| {
                    let users: Vec<User> = mapper.unmarshal_all(black_box(&natives)).unwrap();
                    black_box(users);
                });
            },
        );
    }
    group.finish();
}

/// Benchmark a full round trip.
fn bench_round_trip(c: &mut Criterion) {
    c.bench_function("round_trip_user", |b| {
        let mapper = Mapper::default();
        let user = scenarios::sample_user();

        b.iter(|| {
            let native = mapper.marshal(black_box(&user)).unwrap();
            let back: User = mapper.unmarshal(&native).unwrap();
            black_box(back);
        });
    });
}

criterion_group!(
    benches,
    bench_marshal,
    bench_marshal_batch,
    bench_unmarshal,
    bench_unmarshal_batch,
    bench_round_trip,
);

criterion_main!(benches);
