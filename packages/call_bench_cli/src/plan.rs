use std::path::Path;
use std::time::Duration;

use call_bench::{DEFAULT_PERCENTILES, Percentile, RecordingPolicy, RunConfig};
use proc_sampler::SampleOptions;
use serde::Deserialize;

use crate::{CliError, Result};

/// Everything the driver needs to know to run one benchmark.
///
/// A plan is usually assembled from a TOML file, with command-line flags applied on top via
/// [`Plan::apply()`]. Every field has a default, so an empty file is a valid plan.
///
/// ```toml
/// name = "checkout"
/// concurrency = 8
/// calls = 5000
/// warmup = 200
/// percentiles = [50, 99, 999]
/// policy = "include_failures"
///
/// [workload]
/// delay_ms = 2
/// fail_every = 100
///
/// [sampler]
/// interval_ms = 250
/// network = false
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Plan {
    /// Name shown in the report.
    pub name: String,

    /// Number of worker threads.
    pub concurrency: usize,

    /// Number of measured calls.
    pub calls: u64,

    /// Number of unmeasured calls made before the measured run.
    pub warmup: u64,

    /// Percentiles to report, in report order.
    pub percentiles: Vec<Percentile>,

    /// Which durations enter the latency statistics.
    pub policy: RecordingPolicy,

    /// The synthetic call being benchmarked.
    pub workload: WorkloadPlan,

    /// Observation of the benchmarking process while the measured run executes.
    pub sampler: SamplerPlan,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            name: "synthetic".to_string(),
            concurrency: 4,
            calls: 1_000,
            warmup: 0,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            policy: RecordingPolicy::default(),
            workload: WorkloadPlan::default(),
            sampler: SamplerPlan::default(),
        }
    }
}

/// Shape of the synthetic call.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkloadPlan {
    /// How long each successful call sleeps, in milliseconds.
    pub delay_ms: u64,

    /// Every call with a number divisible by this fails. Zero disables failures.
    pub fail_every: u64,
}

impl WorkloadPlan {
    /// The sleep of each successful call.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for WorkloadPlan {
    fn default() -> Self {
        Self {
            delay_ms: 1,
            fail_every: 0,
        }
    }
}

/// What the process sampler records.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag independently toggles one sampled dimension"
)]
pub struct SamplerPlan {
    /// Whether to sample at all.
    pub enabled: bool,

    /// Time between two readings, in milliseconds.
    pub interval_ms: u64,

    /// Record CPU usage.
    pub cpu: bool,

    /// Record memory usage.
    pub memory: bool,

    /// Record disk IO counters.
    pub io: bool,

    /// Record network interface counters.
    pub network: bool,
}

impl SamplerPlan {
    /// The sampler settings in the form the sampler accepts.
    #[must_use]
    pub fn options(&self) -> SampleOptions {
        SampleOptions::default()
            .with_cpu(self.cpu)
            .with_memory(self.memory)
            .with_io(self.io)
            .with_network(self.network)
            .with_interval(Duration::from_millis(self.interval_ms))
    }
}

impl Default for SamplerPlan {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 100,
            cpu: true,
            memory: true,
            io: true,
            network: true,
        }
    }
}

/// Values given on the command line. Every `Some` replaces the corresponding plan value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PlanOverrides {
    /// Replaces [`Plan::name`].
    pub name: Option<String>,

    /// Replaces [`Plan::concurrency`].
    pub concurrency: Option<usize>,

    /// Replaces [`Plan::calls`].
    pub calls: Option<u64>,

    /// Replaces [`Plan::warmup`].
    pub warmup: Option<u64>,

    /// Replaces [`Plan::percentiles`].
    pub percentiles: Option<Vec<Percentile>>,

    /// Replaces [`Plan::policy`].
    pub policy: Option<RecordingPolicy>,

    /// Replaces [`WorkloadPlan::delay_ms`].
    pub delay_ms: Option<u64>,

    /// Replaces [`WorkloadPlan::fail_every`].
    pub fail_every: Option<u64>,

    /// Replaces [`SamplerPlan::interval_ms`].
    pub sample_interval_ms: Option<u64>,

    /// When set, disables the sampler regardless of the plan.
    pub no_sampler: bool,
}

impl Plan {
    /// Parses a plan from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ParsePlan`] if the text is not valid TOML, contains unknown keys or
    /// has values of the wrong type.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a plan file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ReadPlan`] if the file cannot be read, otherwise the same errors as
    /// [`Plan::from_toml()`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadPlan {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "loaded plan file");

        Self::from_toml(&text)
    }

    /// Applies command-line values on top of the plan.
    #[must_use]
    pub fn apply(mut self, overrides: PlanOverrides) -> Self {
        if let Some(name) = overrides.name {
            self.name = name;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(calls) = overrides.calls {
            self.calls = calls;
        }
        if let Some(warmup) = overrides.warmup {
            self.warmup = warmup;
        }
        if let Some(percentiles) = overrides.percentiles {
            self.percentiles = percentiles;
        }
        if let Some(policy) = overrides.policy {
            self.policy = policy;
        }
        if let Some(delay_ms) = overrides.delay_ms {
            self.workload.delay_ms = delay_ms;
        }
        if let Some(fail_every) = overrides.fail_every {
            self.workload.fail_every = fail_every;
        }
        if let Some(interval_ms) = overrides.sample_interval_ms {
            self.sampler.interval_ms = interval_ms;
        }
        if overrides.no_sampler {
            self.sampler.enabled = false;
        }

        self
    }

    /// The run configuration described by this plan.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Benchmark`] if the concurrency or the call count is zero.
    pub fn run_config(&self) -> Result<RunConfig> {
        Ok(RunConfig::new(self.concurrency, self.calls)?
            .with_percentiles(self.percentiles.iter().copied())
            .with_policy(self.policy))
    }
}

/// Parses a comma-separated percentile list such as `50,99,TP999`.
///
/// # Errors
///
/// Returns [`CliError::Benchmark`] if any entry is not an integer percentile.
pub fn parse_percentile_list(text: &str) -> Result<Vec<Percentile>> {
    text.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.parse::<Percentile>().map_err(CliError::from))
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_default_plan() {
        assert_eq!(Plan::from_toml("").unwrap(), Plan::default());
    }

    #[test]
    fn full_plan() {
        let plan = Plan::from_toml(
            r#"
            name = "checkout"
            concurrency = 8
            calls = 5000
            warmup = 200
            percentiles = [50, 99, 999]
            policy = "include_failures"

            [workload]
            delay_ms = 2
            fail_every = 100

            [sampler]
            interval_ms = 250
            network = false
            "#,
        )
        .unwrap();

        assert_eq!(plan.name, "checkout");
        assert_eq!(plan.concurrency, 8);
        assert_eq!(plan.calls, 5000);
        assert_eq!(plan.warmup, 200);
        assert_eq!(
            plan.percentiles,
            [Percentile::P50, Percentile::P99, Percentile::P999]
        );
        assert_eq!(plan.policy, RecordingPolicy::IncludeFailures);
        assert_eq!(plan.workload.delay(), Duration::from_millis(2));
        assert_eq!(plan.workload.fail_every, 100);
        assert!(plan.sampler.enabled);
        assert!(!plan.sampler.network);
        assert_eq!(
            plan.sampler.options().interval(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn negative_percentile_in_file_is_clamped() {
        let plan = Plan::from_toml("percentiles = [-3, 90]").unwrap();

        assert_eq!(plan.percentiles, [Percentile::new(0), Percentile::new(90)]);
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(matches!(
            Plan::from_toml("concurency = 3"),
            Err(CliError::ParsePlan(_))
        ));
    }

    #[test]
    fn overrides_win() {
        let plan = Plan::default().apply(PlanOverrides {
            concurrency: Some(16),
            percentiles: Some(vec![Percentile::P999]),
            fail_every: Some(7),
            no_sampler: true,
            ..PlanOverrides::default()
        });

        assert_eq!(plan.concurrency, 16);
        assert_eq!(plan.calls, Plan::default().calls);
        assert_eq!(plan.percentiles, [Percentile::P999]);
        assert_eq!(plan.workload.fail_every, 7);
        assert!(!plan.sampler.enabled);
    }

    #[test]
    fn zero_calls_is_rejected_at_run_config() {
        let plan = Plan {
            calls: 0,
            ..Plan::default()
        };

        assert!(matches!(
            plan.run_config(),
            Err(CliError::Benchmark(call_bench::Error::InvalidConfig { .. }))
        ));
    }

    #[test]
    fn percentile_list() {
        assert_eq!(
            parse_percentile_list("50, p99,TP999,").unwrap(),
            [Percentile::P50, Percentile::P99, Percentile::P999]
        );
        assert!(matches!(
            parse_percentile_list("50,ninety"),
            Err(CliError::Benchmark(call_bench::Error::InvalidPercentile { .. }))
        ));
    }
}
