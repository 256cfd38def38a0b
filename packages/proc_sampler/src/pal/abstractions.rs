//! Platform abstraction trait definitions.

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::{IoSample, MemorySample, NetworkSample};

/// One reading of the counters of a single process.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct ProcessReading {
    /// Percent of one processor used since the previous reading of the same process.
    pub(crate) cpu_percent: f64,
    pub(crate) memory: MemorySample,
    pub(crate) io: IoSample,
}

/// Provides process and network counters.
///
/// Readings are stateful: CPU usage is measured relative to the previous reading, which is why
/// the methods take `&mut self`.
pub(crate) trait Platform: Debug + Send + 'static {
    /// The process ID of the calling process.
    fn current_pid(&self) -> u32;

    /// Whether a live process with the given ID exists.
    fn process_exists(&mut self, pid: u32) -> bool;

    /// The ID of a live process with exactly the given name. When several match, the lowest
    /// process ID wins.
    fn find_process(&mut self, name: &str) -> Option<u32>;

    /// Reads the counters of a process, or `None` if it no longer exists.
    fn read_process(&mut self, pid: u32) -> Option<ProcessReading>;

    /// Reads the cumulative counters of every network interface.
    fn read_networks(&mut self) -> BTreeMap<String, NetworkSample>;
}
