use std::fmt::Write as _;

use call_bench::{Benchmark, CachedReport, RunResult};
use proc_sampler::{SampleSeries, Sampler, format_bytes};

use crate::{Plan, Result, SyntheticCall};

/// Width of the label column, matching the benchmark report.
const LABEL_WIDTH: usize = 9;

const WRITE_TO_STRING: &str = "writing to a String never fails";

/// The outcome of one driver invocation.
#[derive(Debug)]
pub struct RunOutput {
    /// The reduced benchmark result.
    pub result: RunResult,

    /// Readings taken during the measured run, if sampling was enabled.
    pub series: Option<SampleSeries>,
}

/// Runs the benchmark described by the plan: optional warmup, then the measured run while the
/// sampler (if enabled) observes the current process.
///
/// # Errors
///
/// Returns an error if the plan does not describe a runnable benchmark.
pub fn execute(plan: &Plan) -> Result<RunOutput> {
    let config = plan.run_config()?;
    let workload = SyntheticCall::new(plan.workload.delay(), plan.workload.fail_every);

    let mut benchmark = Benchmark::new(plan.name.clone(), config);

    if plan.warmup > 0 {
        benchmark.warmup(plan.warmup, || workload.call());
    }

    let sampler = plan
        .sampler
        .enabled
        .then(|| Sampler::current_process().start(plan.sampler.options()));

    let result = benchmark.run(|| workload.call());
    let series = sampler.map(proc_sampler::RunningSampler::stop);

    tracing::info!(
        name = plan.name.as_str(),
        succeeded = result.succeeded(),
        failed = result.failed(),
        "benchmark finished"
    );

    Ok(RunOutput { result, series })
}

/// Renders the output as human-readable text: the benchmark report, the failure tally and a
/// summary of the sampled resource usage.
#[must_use]
pub fn render_text(output: &RunOutput) -> String {
    let mut text = CachedReport::new(&output.result).to_string();

    if !output.result.errors().is_empty() {
        text.push_str("\nERRORS   :");
        for (message, count) in output.result.errors().iter() {
            write!(text, "\n  {count} x {message}").expect(WRITE_TO_STRING);
        }
    }

    if let Some(series) = &output.series {
        render_series(&mut text, series);
    }

    text
}

fn render_series(text: &mut String, series: &SampleSeries) {
    let percent = |value: Option<f64>| value.map_or_else(na, |v| format!("{v:.2}%"));
    let bytes = |value: Option<u64>| value.map_or_else(na, format_bytes);

    let lines = [
        ("CPU MIN", percent(series.cpu_min())),
        ("CPU AVG", percent(series.cpu_mean())),
        ("CPU MAX", percent(series.cpu_max())),
        ("RSS AVG", bytes(series.rss_mean())),
        ("RSS MAX", bytes(series.rss_max())),
        ("VMS MAX", bytes(series.vms_max())),
        ("DISK R", bytes(series.io_read_max())),
        ("DISK W", bytes(series.io_written_max())),
    ];

    for (label, value) in lines {
        write!(text, "\n{label:<LABEL_WIDTH$}: {value}").expect(WRITE_TO_STRING);
    }

    for (interface, growth) in series.network_growth() {
        write!(
            text,
            "\nNET {interface}: {} in, {} out, {} packets in, {} packets out",
            format_bytes(growth.bytes_received),
            format_bytes(growth.bytes_sent),
            growth.packets_received,
            growth.packets_sent
        )
        .expect(WRITE_TO_STRING);
    }
}

fn na() -> String {
    "n/a".to_string()
}

/// Renders the output as one JSON document with a `result` member and, if sampling was
/// enabled, a `sampler` member.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(output: &RunOutput) -> Result<String> {
    let mut document = serde_json::Map::new();

    document.insert(
        "result".to_string(),
        serde_json::from_str(&output.result.to_json()?)?,
    );

    if let Some(series) = &output.series {
        document.insert("sampler".to_string(), serde_json::to_value(series)?);
    }

    Ok(serde_json::to_string_pretty(&document)?)
}
