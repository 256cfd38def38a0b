#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Command-line driver for `call_bench`.
//!
//! Runs a synthetic workload (a call that sleeps and occasionally fails) through a
//! [`call_bench::Benchmark`] while a [`proc_sampler::Sampler`] observes the process, then
//! renders the report as text or JSON.
//!
//! The settings come from a TOML [`Plan`] file, command-line flags or both, with flags taking
//! precedence. The binary entry point is in `main.rs`; this library holds the logic so that it
//! can be tested without spawning processes.

mod error;
mod plan;
mod runner;
mod workload;

pub use error::*;
pub use plan::*;
pub use runner::*;
pub use workload::*;
