//! Benchmarks a simulated remote call that occasionally fails and prints the report.
//!
//! The target sleeps for roughly a millisecond and fails on every 25th invocation.

#![allow(missing_docs, reason = "No need for API documentation in example code")]

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use call_bench::{Benchmark, CachedReport, Percentile, RunConfig};

const CONCURRENCY: usize = 8;
const CALLS: u64 = 2_000;

fn main() {
    let config = RunConfig::new(CONCURRENCY, CALLS)
        .expect("constants are non-zero")
        .with_percentiles([Percentile::P50, Percentile::P99, Percentile::P999]);

    let mut benchmark = Benchmark::new("simulated_rpc", config);
    let invocations = AtomicU64::new(0);

    let simulated_rpc = || {
        let n = invocations.fetch_add(1, Ordering::Relaxed).wrapping_add(1);

        if n % 25 == 0 {
            return Err(format!("timeout on invocation {n}"));
        }

        thread::sleep(Duration::from_micros(800 + n % 400));
        Ok(())
    };

    benchmark.warmup(100, simulated_rpc);
    let result = benchmark.run(simulated_rpc);

    println!("{}", CachedReport::new(&result));
    println!();
    println!("Distinct failure messages: {}", result.errors().len());
}
