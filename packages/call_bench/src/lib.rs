#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Latency benchmarking of arbitrary calls across a pool of worker threads.
//!
//! This package drives a fixed number of calls to a user-supplied function from a fixed number
//! of worker threads, measures how long each call took and whether it succeeded, and reduces the
//! measurements into summary statistics: min, max and mean latency, success and failure rates,
//! throughput and nearest-rank percentiles.
//!
//! The core functionality includes:
//! - [`Benchmark`] - Warms up and runs a named benchmark on its own worker threads
//! - [`RunConfig`] - How many workers, how many calls, which percentiles and which
//!   [`RecordingPolicy`]
//! - [`dispatch()`] - Hands out numbered tickets to every worker of a [`WorkerPool`]
//! - [`Recorder`] - Times calls and stores each outcome in its ticket's slot
//! - [`RunResult`] - The reduced statistics, with memoized [`Percentile`] lookups
//! - [`Report`] - A fixed-layout human-readable rendering of a result
//!
//! This package is not meant for use in production, serving only as a development tool for
//! benchmarking and performance analysis.
//!
//! # Operating Principles
//!
//! ## Dispatch
//!
//! There is no work queue. All workers share one counter and claim the next ticket by atomically
//! incrementing it. A worker stops as soon as it claims a ticket beyond the configured call
//! count. Each ticket is therefore processed exactly once, and fast workers naturally take more
//! tickets than slow ones.
//!
//! ## Recording
//!
//! Ticket `n` owns slot `n - 1` of a pre-sized slot array, so slots are written without locking.
//! Success and failure counts are atomics. Failure messages are tallied in a map guarded by a
//! mutex. A failing call is data, never an error of the benchmark itself.
//!
//! ## Percentiles
//!
//! Percentiles use the nearest-rank method over the sorted samples. Values of three or more
//! digits encode extra digits of precision: `999` is the 99.9th percentile, `9999` the 99.99th
//! and `100` the 10th.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use call_bench::{Benchmark, Percentile, Report, RunConfig};
//!
//! # fn main() {
//! let config = RunConfig::new(4, 8)
//!     .unwrap()
//!     .with_percentiles([Percentile::P50, Percentile::P999]);
//!
//! let mut benchmark = Benchmark::new("flaky", config);
//! let attempt = std::sync::atomic::AtomicU64::new(0);
//!
//! let result = benchmark.run(|| {
//!     let n = attempt.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!     if n == 7 {
//!         return Err("simulated failure");
//!     }
//!     std::thread::sleep(Duration::from_millis(1));
//!     Ok(())
//! });
//!
//! assert_eq!(result.succeeded(), 7);
//! assert_eq!(result.failed(), 1);
//!
//! println!("{}", Report::new(&result));
//! # }
//! ```

mod benchmark;
mod config;
mod dispatch;
mod error;
mod percentile;
mod pool;
mod recorder;
mod report;
mod stats;

pub use benchmark::*;
pub use config::*;
pub use dispatch::*;
pub use error::*;
pub use percentile::*;
pub use pool::*;
pub use recorder::*;
pub use report::*;
pub use stats::*;
