//! Fake platform implementation for testing.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::NetworkSample;
use crate::pal::{Platform, ProcessReading};

/// Process ID reported as the current process by [`FakePlatform`].
pub(crate) const FAKE_CURRENT_PID: u32 = 1000;

#[derive(Debug, Default)]
struct FakePlatformState {
    /// Live processes as (pid, name).
    processes: Vec<(u32, String)>,

    /// Readings handed out one per `read_process()` call. The last one repeats forever.
    readings: VecDeque<ProcessReading>,

    networks: BTreeMap<String, NetworkSample>,

    process_reads: usize,
    network_reads: usize,
}

/// Fake implementation of the platform abstraction for testing.
///
/// Clones share the same state, so a test can keep one clone to script readings and inspect
/// call counts while another clone is owned by the sampler thread.
#[derive(Clone, Debug, Default)]
pub(crate) struct FakePlatform {
    state: Arc<Mutex<FakePlatformState>>,
}

impl FakePlatform {
    /// Creates a fake platform where only the current process exists.
    pub(crate) fn new() -> Self {
        let platform = Self::default();
        platform.add_process(FAKE_CURRENT_PID, "current");
        platform
    }

    pub(crate) fn add_process(&self, pid: u32, name: &str) {
        self.state().processes.push((pid, name.to_string()));
    }

    pub(crate) fn remove_process(&self, pid: u32) {
        self.state().processes.retain(|(p, _)| *p != pid);
    }

    pub(crate) fn push_reading(&self, reading: ProcessReading) {
        self.state().readings.push_back(reading);
    }

    pub(crate) fn set_network(&self, interface: &str, sample: NetworkSample) {
        self.state()
            .networks
            .insert(interface.to_string(), sample);
    }

    pub(crate) fn process_reads(&self) -> usize {
        self.state().process_reads
    }

    pub(crate) fn network_reads(&self) -> usize {
        self.state().network_reads
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakePlatformState> {
        self.state
            .lock()
            .expect("FakePlatform state lock should not be poisoned")
    }
}

impl Platform for FakePlatform {
    fn current_pid(&self) -> u32 {
        FAKE_CURRENT_PID
    }

    fn process_exists(&mut self, pid: u32) -> bool {
        self.state().processes.iter().any(|(p, _)| *p == pid)
    }

    fn find_process(&mut self, name: &str) -> Option<u32> {
        self.state()
            .processes
            .iter()
            .filter(|(_, n)| n == name)
            .map(|(p, _)| *p)
            .min()
    }

    fn read_process(&mut self, pid: u32) -> Option<ProcessReading> {
        let mut state = self.state();
        state.process_reads = state.process_reads.saturating_add(1);

        if !state.processes.iter().any(|(p, _)| *p == pid) {
            return None;
        }

        if state.readings.len() > 1 {
            state.readings.pop_front()
        } else {
            Some(state.readings.front().copied().unwrap_or_default())
        }
    }

    fn read_networks(&mut self) -> BTreeMap<String, NetworkSample> {
        let mut state = self.state();
        state.network_reads = state.network_reads.saturating_add(1);
        state.networks.clone()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn last_reading_repeats() {
        let mut platform = FakePlatform::new();
        platform.push_reading(ProcessReading {
            cpu_percent: 1.0,
            ..ProcessReading::default()
        });
        platform.push_reading(ProcessReading {
            cpu_percent: 2.0,
            ..ProcessReading::default()
        });

        let cpu = (0..4)
            .map(|_| platform.read_process(FAKE_CURRENT_PID).unwrap().cpu_percent)
            .collect::<Vec<_>>();

        assert_eq!(cpu, [1.0, 2.0, 2.0, 2.0]);
        assert_eq!(platform.process_reads(), 4);
    }

    #[test]
    fn removed_process_has_no_readings() {
        let mut platform = FakePlatform::new();
        platform.remove_process(FAKE_CURRENT_PID);

        assert!(!platform.process_exists(FAKE_CURRENT_PID));
        assert_eq!(platform.read_process(FAKE_CURRENT_PID), None);
    }

    #[test]
    fn lowest_pid_wins_name_lookup() {
        let mut platform = FakePlatform::new();
        platform.add_process(77, "worker");
        platform.add_process(12, "worker");

        assert_eq!(platform.find_process("worker"), Some(12));
        assert_eq!(platform.find_process("missing"), None);
    }

    #[test]
    fn clones_share_state() {
        let platform = FakePlatform::new();
        let mut clone = platform.clone();

        platform.set_network("eth0", NetworkSample::default());

        assert_eq!(clone.read_networks().len(), 1);
        assert_eq!(platform.network_reads(), 1);
    }
}
