use std::fmt::Display;
use std::time::Instant;

use crate::{Recorder, RunConfig, RunResult, WorkerPool, dispatch};

/// A named benchmark that calls a function a fixed number of times from a fixed number of
/// worker threads and reduces the outcomes into a [`RunResult`].
///
/// The worker threads are created once, when the benchmark is created, and reused by
/// [`warmup()`][Self::warmup] and [`run()`][Self::run].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use call_bench::{Benchmark, Percentile, Report, RunConfig};
///
/// let config = RunConfig::new(4, 40)
///     .unwrap()
///     .with_percentiles([Percentile::P50, Percentile::P99]);
///
/// let mut benchmark = Benchmark::new("sleep", config);
///
/// benchmark.warmup(8, || {
///     std::thread::sleep(Duration::from_micros(100));
///     Ok::<(), String>(())
/// });
///
/// let result = benchmark.run(|| {
///     std::thread::sleep(Duration::from_micros(100));
///     Ok::<(), String>(())
/// });
///
/// assert_eq!(result.succeeded(), 40);
/// println!("{}", Report::new(&result));
/// ```
#[derive(Debug)]
pub struct Benchmark {
    name: String,
    config: RunConfig,
    pool: WorkerPool,
}

impl Benchmark {
    /// Creates the benchmark and starts its worker threads.
    #[must_use]
    pub fn new(name: impl Into<String>, config: RunConfig) -> Self {
        let pool = WorkerPool::new(config.concurrency());

        Self {
            name: name.into(),
            config,
            pool,
        }
    }

    /// The name shown in reports.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration of the measured run.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Calls `call` `times` times on the worker threads without recording anything.
    ///
    /// Use this to bring caches, connection pools and the like into a steady state before
    /// the measured run.
    pub fn warmup<F, E>(&mut self, times: u64, call: F)
    where
        F: Fn() -> Result<(), E> + Sync,
    {
        tracing::debug!(name = self.name.as_str(), times, "warming up");

        dispatch(&mut self.pool, times, |_| {
            // Outcomes of warmup calls are irrelevant.
            drop(call());
        });
    }

    /// Executes the measured run and reduces it.
    ///
    /// Every call's outcome is recorded; failing calls never stop the run. The result always
    /// exists, even if every call failed.
    pub fn run<F, E>(&mut self, call: F) -> RunResult
    where
        F: Fn() -> Result<(), E> + Sync,
        E: Display,
    {
        let total_calls = self.config.total_calls().get();

        tracing::debug!(
            name = self.name.as_str(),
            concurrency = self.config.concurrency().get(),
            total_calls,
            "starting measured run"
        );

        let recorder = Recorder::new(total_calls);

        let begin = Instant::now();

        dispatch(&mut self.pool, total_calls, |ticket| {
            recorder.record(ticket, &call);
        });

        let elapsed = begin.elapsed();

        RunResult::reduce(
            self.name.clone(),
            recorder.finish(),
            elapsed,
            self.config.percentiles(),
            self.config.policy(),
        )
    }
}
