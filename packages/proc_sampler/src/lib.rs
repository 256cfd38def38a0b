#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Samples the resource usage of a process while something else keeps it busy.
//!
//! A [`Sampler`] is bound to one process, either the calling process, a process ID or a process
//! name. Once started, a background thread takes one reading per interval of:
//!
//! - CPU usage, in percent of one processor
//! - resident and virtual memory size
//! - cumulative disk bytes read and written
//! - cumulative byte and packet counters of every network interface
//!
//! Stopping the sampler yields a [`SampleSeries`] with the raw readings, summary figures
//! (minimum, maximum, mean, trimmed mean) and a JSON export.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use proc_sampler::{SampleOptions, Sampler, format_bytes};
//!
//! let running = Sampler::current_process()
//!     .start(SampleOptions::default().with_interval(Duration::from_millis(10)));
//!
//! // Keep the process busy for a while.
//! let mut buffers = Vec::new();
//! for _ in 0..10 {
//!     buffers.push(vec![0_u8; 1024 * 1024]);
//!     std::thread::sleep(Duration::from_millis(5));
//! }
//!
//! let series = running.stop();
//!
//! if let Some(rss) = series.rss_max() {
//!     println!("peak RSS: {}", format_bytes(rss));
//! }
//! ```

mod error;
mod format;
mod options;
mod pal;
mod sampler;
mod series;

pub use error::*;
pub use format::*;
pub use options::*;
pub use sampler::*;
pub use series::*;
