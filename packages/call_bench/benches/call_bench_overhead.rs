//! Measures the overhead call_bench itself adds on top of the measured calls: handing out
//! tickets, recording outcomes and looking up percentiles.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::num::NonZero;
use std::time::{Duration, Instant};

use call_bench::{
    Percentile, Recorder, Recording, RecordingPolicy, RunResult, Sample, WorkerPool, dispatch,
};
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("call_bench_overhead");

    let mut single_worker = WorkerPool::new(NonZero::new(1).unwrap());
    let mut four_workers = WorkerPool::new(NonZero::new(4).unwrap());

    group.bench_function("dispatch_one_worker", |b| {
        b.iter_custom(|iters| measure_dispatch(&mut single_worker, iters));
    });

    group.bench_function("dispatch_four_workers", |b| {
        b.iter_custom(|iters| measure_dispatch(&mut four_workers, iters));
    });

    group.bench_function("dispatch_and_record_four_workers", |b| {
        b.iter_custom(|iters| {
            let recorder = Recorder::new(iters);

            let start = Instant::now();
            dispatch(&mut four_workers, iters, |ticket| {
                recorder.record(ticket, || black_box(Ok::<(), &str>(())));
            });
            let elapsed = start.elapsed();

            black_box(recorder.finish());
            elapsed
        });
    });

    let result = RunResult::reduce(
        "lookup",
        Recording::from_samples(
            (0..100_000_u64)
                .rev()
                .map(|n| Sample::Success(Duration::from_nanos(n)))
                .collect(),
        ),
        Duration::from_secs(1),
        &[Percentile::P99],
        RecordingPolicy::ExcludeFailures,
    );

    group.bench_function("percentile_cached", |b| {
        b.iter(|| black_box(result.percentile(black_box(Percentile::P99))));
    });

    group.bench_function("reduce_10k", |b| {
        b.iter_with_setup(
            || {
                Recording::from_samples(
                    (0..10_000_u64)
                        .map(|n| Sample::Success(Duration::from_nanos(n.wrapping_mul(7919) % 10_007)))
                        .collect(),
                )
            },
            |recording| {
                black_box(RunResult::reduce(
                    "reduce",
                    recording,
                    Duration::from_secs(1),
                    &[Percentile::P50, Percentile::P999],
                    RecordingPolicy::ExcludeFailures,
                ))
            },
        );
    });

    group.finish();
}

fn measure_dispatch(pool: &mut WorkerPool, iterations: u64) -> Duration {
    let start = Instant::now();

    black_box(dispatch(pool, iterations, |ticket| {
        black_box(ticket);
    }));

    start.elapsed()
}
