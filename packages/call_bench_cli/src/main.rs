#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Binary entry point for the `call-bench` tool.
//!
//! This module is excluded from mutation testing because testing process entry/exit behavior
//! is impractical - it requires spawning subprocesses and checking exit codes.

use std::path::PathBuf;
use std::process::ExitCode;

use argh::FromArgs;
use call_bench::RecordingPolicy;
use call_bench_cli::{
    CliError, Plan, PlanOverrides, execute, parse_percentile_list, render_json, render_text,
};
use tracing_subscriber::EnvFilter;

/// Benchmarks a synthetic call that sleeps and occasionally fails, reporting latency statistics
/// and the resource usage of this process. Set `RUST_LOG` to see diagnostic output on stderr.
#[derive(FromArgs)]
struct Args {
    /// TOML plan file with the benchmark settings; flags override its values
    #[argh(option)]
    plan: Option<PathBuf>,

    /// name shown in the report
    #[argh(option)]
    name: Option<String>,

    /// number of worker threads
    #[argh(option, short = 'c')]
    concurrency: Option<usize>,

    /// number of measured calls
    #[argh(option, short = 'n')]
    calls: Option<u64>,

    /// number of unmeasured calls made before the measured run
    #[argh(option)]
    warmup: Option<u64>,

    /// comma-separated percentiles to report, such as 50,99,999
    #[argh(option)]
    percentiles: Option<String>,

    /// which durations enter the statistics (exclude_failures, include_failures)
    #[argh(option)]
    policy: Option<RecordingPolicy>,

    /// how long each successful synthetic call sleeps, in milliseconds
    #[argh(option)]
    delay_ms: Option<u64>,

    /// fail every Nth synthetic call (0 never fails)
    #[argh(option)]
    fail_every: Option<u64>,

    /// time between two resource usage readings, in milliseconds
    #[argh(option)]
    sample_interval_ms: Option<u64>,

    /// do not sample resource usage
    #[argh(switch)]
    no_sampler: bool,

    /// print JSON instead of the text report
    #[argh(switch)]
    json: bool,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();

    match run(args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<String, CliError> {
    let plan = match &args.plan {
        Some(path) => Plan::load(path)?,
        None => Plan::default(),
    };

    let percentiles = args
        .percentiles
        .as_deref()
        .map(parse_percentile_list)
        .transpose()?;

    let plan = plan.apply(PlanOverrides {
        name: args.name,
        concurrency: args.concurrency,
        calls: args.calls,
        warmup: args.warmup,
        percentiles,
        policy: args.policy,
        delay_ms: args.delay_ms,
        fail_every: args.fail_every,
        sample_interval_ms: args.sample_interval_ms,
        no_sampler: args.no_sampler,
    });

    tracing::debug!(?plan, "effective plan");

    let output = execute(&plan)?;

    if args.json {
        render_json(&output)
    } else {
        Ok(render_text(&output))
    }
}
