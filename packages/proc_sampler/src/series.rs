use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Memory usage of the sampled process at one instant, in bytes.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MemorySample {
    /// Resident set size.
    pub rss: u64,

    /// Virtual memory size.
    pub vms: u64,
}

/// Cumulative disk IO of the sampled process at one instant, in bytes.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct IoSample {
    /// Bytes read from disk since the process started.
    pub read_bytes: u64,

    /// Bytes written to disk since the process started.
    pub written_bytes: u64,
}

/// Cumulative counters of one network interface at one instant.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NetworkSample {
    /// Bytes received since the counters were last reset.
    pub bytes_received: u64,

    /// Bytes sent since the counters were last reset.
    pub bytes_sent: u64,

    /// Packets received since the counters were last reset.
    pub packets_received: u64,

    /// Packets sent since the counters were last reset.
    pub packets_sent: u64,
}

impl NetworkSample {
    /// The counter growth from `earlier` to `self`. Counters that went backwards (for example
    /// because the interface was reset) count as zero growth.
    #[must_use]
    pub fn growth_since(&self, earlier: &Self) -> Self {
        Self {
            bytes_received: self.bytes_received.saturating_sub(earlier.bytes_received),
            bytes_sent: self.bytes_sent.saturating_sub(earlier.bytes_sent),
            packets_received: self.packets_received.saturating_sub(earlier.packets_received),
            packets_sent: self.packets_sent.saturating_sub(earlier.packets_sent),
        }
    }
}

/// The readings collected by one sampling session, one entry per tick for each enabled
/// dimension, in the order they were taken.
///
/// Summaries return `None` when the underlying series is empty.
///
/// The first CPU reading of a session has no earlier reading to measure against and is
/// typically zero, so CPU minimum and mean skip it whenever more than one reading exists.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SampleSeries {
    cpu: Vec<f64>,
    memory: Vec<MemorySample>,
    io: Vec<IoSample>,
    network: BTreeMap<String, Vec<NetworkSample>>,
}

impl SampleSeries {
    /// CPU usage readings in percent of one processor. Values above 100 mean the process kept
    /// more than one processor busy.
    #[must_use]
    pub fn cpu(&self) -> &[f64] {
        &self.cpu
    }

    /// Memory readings.
    #[must_use]
    pub fn memory(&self) -> &[MemorySample] {
        &self.memory
    }

    /// Disk IO readings.
    #[must_use]
    pub fn io(&self) -> &[IoSample] {
        &self.io
    }

    /// Network readings keyed by interface name.
    #[must_use]
    pub fn network(&self) -> &BTreeMap<String, Vec<NetworkSample>> {
        &self.network
    }

    /// Whether no reading of any dimension was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
            && self.memory.is_empty()
            && self.io.is_empty()
            && self.network.values().all(Vec::is_empty)
    }

    /// The lowest CPU reading, skipping the first one when more than one exists.
    #[must_use]
    pub fn cpu_min(&self) -> Option<f64> {
        self.cpu_with_baseline().iter().copied().reduce(f64::min)
    }

    /// The highest CPU reading.
    #[must_use]
    pub fn cpu_max(&self) -> Option<f64> {
        self.cpu.iter().copied().reduce(f64::max)
    }

    /// The mean CPU reading, skipping the first one when more than one exists.
    #[must_use]
    pub fn cpu_mean(&self) -> Option<f64> {
        mean_f64(self.cpu_with_baseline())
    }

    /// The mean CPU reading after dropping `head` readings from the start and `tail` readings
    /// from the end, which removes ramp-up and ramp-down periods from the figure.
    ///
    /// If fewer readings exist than should be dropped, `head` and `tail` are both reduced one
    /// step at a time until they fit. Returns `None` if no reading remains.
    #[must_use]
    pub fn cpu_mean_trimmed(&self, head: usize, tail: usize) -> Option<f64> {
        mean_f64(trimmed(&self.cpu, head, tail))
    }

    /// The lowest resident set size.
    #[must_use]
    pub fn rss_min(&self) -> Option<u64> {
        self.memory.iter().map(|m| m.rss).min()
    }

    /// The highest resident set size.
    #[must_use]
    pub fn rss_max(&self) -> Option<u64> {
        self.memory.iter().map(|m| m.rss).max()
    }

    /// The mean resident set size.
    #[must_use]
    pub fn rss_mean(&self) -> Option<u64> {
        mean_u64(self.memory.iter().map(|m| m.rss))
    }

    /// The mean resident set size after dropping `head` readings from the start and `tail`
    /// readings from the end, trimmed the same way as
    /// [`cpu_mean_trimmed()`][Self::cpu_mean_trimmed].
    #[must_use]
    pub fn rss_mean_trimmed(&self, head: usize, tail: usize) -> Option<u64> {
        mean_u64(trimmed(&self.memory, head, tail).iter().map(|m| m.rss))
    }

    /// The lowest virtual memory size.
    #[must_use]
    pub fn vms_min(&self) -> Option<u64> {
        self.memory.iter().map(|m| m.vms).min()
    }

    /// The highest virtual memory size.
    #[must_use]
    pub fn vms_max(&self) -> Option<u64> {
        self.memory.iter().map(|m| m.vms).max()
    }

    /// The mean virtual memory size.
    #[must_use]
    pub fn vms_mean(&self) -> Option<u64> {
        mean_u64(self.memory.iter().map(|m| m.vms))
    }

    /// The lowest cumulative read byte count.
    #[must_use]
    pub fn io_read_min(&self) -> Option<u64> {
        self.io.iter().map(|s| s.read_bytes).min()
    }

    /// The highest cumulative read byte count.
    #[must_use]
    pub fn io_read_max(&self) -> Option<u64> {
        self.io.iter().map(|s| s.read_bytes).max()
    }

    /// The mean cumulative read byte count.
    #[must_use]
    pub fn io_read_mean(&self) -> Option<u64> {
        mean_u64(self.io.iter().map(|s| s.read_bytes))
    }

    /// The lowest cumulative written byte count.
    #[must_use]
    pub fn io_written_min(&self) -> Option<u64> {
        self.io.iter().map(|s| s.written_bytes).min()
    }

    /// The highest cumulative written byte count.
    #[must_use]
    pub fn io_written_max(&self) -> Option<u64> {
        self.io.iter().map(|s| s.written_bytes).max()
    }

    /// The mean cumulative written byte count.
    #[must_use]
    pub fn io_written_mean(&self) -> Option<u64> {
        mean_u64(self.io.iter().map(|s| s.written_bytes))
    }

    /// How much the counters of each interface grew between its first and last reading.
    #[must_use]
    pub fn network_growth(&self) -> BTreeMap<&str, NetworkSample> {
        self.network
            .iter()
            .filter_map(|(name, readings)| {
                let first = readings.first()?;
                let last = readings.last()?;
                Some((name.as_str(), last.growth_since(first)))
            })
            .collect()
    }

    /// Serializes the series as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Serialization`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a series previously produced by [`to_json()`][Self::to_json].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Serialization`] if the text is not a valid series.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn push_cpu(&mut self, percent: f64) {
        self.cpu.push(percent);
    }

    pub(crate) fn push_memory(&mut self, sample: MemorySample) {
        self.memory.push(sample);
    }

    pub(crate) fn push_io(&mut self, sample: IoSample) {
        self.io.push(sample);
    }

    pub(crate) fn push_network(&mut self, interface: &str, sample: NetworkSample) {
        self.network
            .entry(interface.to_string())
            .or_default()
            .push(sample);
    }

    fn cpu_with_baseline(&self) -> &[f64] {
        match self.cpu.as_slice() {
            [_first, rest @ ..] if !rest.is_empty() => rest,
            all => all,
        }
    }
}

/// Drops `head` values from the start and `tail` from the end. While the two together exceed
/// the number of values, both shrink by one.
fn trimmed<T>(values: &[T], head: usize, tail: usize) -> &[T] {
    let (mut head, mut tail) = (head, tail);

    while head.saturating_add(tail) > values.len() {
        head = head.saturating_sub(1);
        tail = tail.saturating_sub(1);
    }

    let end = values.len().saturating_sub(tail);
    values.get(head..end).unwrap_or_default()
}

fn mean_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "sample counts are far below the precision limit of f64"
    )]
    let count = values.len() as f64;

    Some(values.iter().sum::<f64>() / count)
}

fn mean_u64(values: impl ExactSizeIterator<Item = u64>) -> Option<u64> {
    let count = u128::try_from(values.len()).expect("usize always fits in u128");
    let sum = values.map(u128::from).sum::<u128>();

    let mean = sum.checked_div(count)?;
    Some(u64::try_from(mean).expect("the mean of u64 values always fits in u64"))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::Error;

    fn cpu_series(values: &[f64]) -> SampleSeries {
        let mut series = SampleSeries::default();
        for value in values {
            series.push_cpu(*value);
        }
        series
    }

    #[test]
    fn empty_series_has_no_summaries() {
        let series = SampleSeries::default();

        assert!(series.is_empty());
        assert_eq!(series.cpu_min(), None);
        assert_eq!(series.cpu_max(), None);
        assert_eq!(series.cpu_mean(), None);
        assert_eq!(series.cpu_mean_trimmed(1, 1), None);
        assert_eq!(series.rss_mean(), None);
        assert_eq!(series.vms_min(), None);
        assert_eq!(series.io_written_max(), None);
        assert!(series.network_growth().is_empty());
    }

    #[test]
    fn single_cpu_reading_is_used_as_is() {
        let series = cpu_series(&[42.0]);

        assert_eq!(series.cpu_min(), Some(42.0));
        assert_eq!(series.cpu_max(), Some(42.0));
        assert_eq!(series.cpu_mean(), Some(42.0));
    }

    #[test]
    fn cpu_min_and_mean_skip_first_reading() {
        let series = cpu_series(&[0.0, 50.0, 100.0, 30.0]);

        assert_eq!(series.cpu_min(), Some(30.0));
        assert_eq!(series.cpu_max(), Some(100.0));
        assert_eq!(series.cpu_mean(), Some(60.0));
    }

    #[test]
    fn trimmed_mean_drops_both_ends() {
        let series = cpu_series(&[0.0, 10.0, 20.0, 30.0, 1000.0]);

        assert_eq!(series.cpu_mean_trimmed(1, 1), Some(20.0));
        assert_eq!(series.cpu_mean_trimmed(0, 0), Some(212.0));
        assert_eq!(series.cpu_mean_trimmed(2, 0), Some(350.0));
    }

    #[test]
    fn rss_trimmed_mean_drops_both_ends() {
        let mut series = SampleSeries::default();
        for rss in [10, 200, 300, 400, 9000] {
            series.push_memory(MemorySample { rss, vms: 0 });
        }

        assert_eq!(series.rss_mean_trimmed(1, 1), Some(300));
        assert_eq!(series.rss_mean_trimmed(0, 0), Some(1982));
        assert_eq!(series.rss_mean_trimmed(4, 4), Some(300));
        assert_eq!(series.rss_mean_trimmed(6, 0), None);
        assert_eq!(SampleSeries::default().rss_mean_trimmed(0, 0), None);
    }

    #[test]
    fn trimmed_mean_shrinks_oversized_trim() {
        let series = cpu_series(&[10.0, 20.0, 30.0]);

        // 5 + 5 shrinks to 1 + 1, leaving the middle reading.
        assert_eq!(series.cpu_mean_trimmed(5, 5), Some(20.0));

        // 4 + 0 shrinks to 3 + 0, leaving nothing.
        assert_eq!(series.cpu_mean_trimmed(4, 0), None);
    }

    #[test]
    fn memory_and_io_summaries() {
        let mut series = SampleSeries::default();
        series.push_memory(MemorySample { rss: 100, vms: 1000 });
        series.push_memory(MemorySample { rss: 300, vms: 3000 });
        series.push_memory(MemorySample { rss: 200, vms: 2001 });
        series.push_io(IoSample {
            read_bytes: 5,
            written_bytes: 50,
        });
        series.push_io(IoSample {
            read_bytes: 15,
            written_bytes: 51,
        });

        assert_eq!(series.rss_min(), Some(100));
        assert_eq!(series.rss_max(), Some(300));
        assert_eq!(series.rss_mean(), Some(200));
        assert_eq!(series.vms_min(), Some(1000));
        assert_eq!(series.vms_max(), Some(3000));
        assert_eq!(series.vms_mean(), Some(2000));
        assert_eq!(series.io_read_min(), Some(5));
        assert_eq!(series.io_read_max(), Some(15));
        assert_eq!(series.io_read_mean(), Some(10));
        assert_eq!(series.io_written_min(), Some(50));
        assert_eq!(series.io_written_max(), Some(51));
        assert_eq!(series.io_written_mean(), Some(50));
    }

    #[test]
    fn mean_does_not_overflow() {
        let mut series = SampleSeries::default();
        series.push_memory(MemorySample {
            rss: u64::MAX,
            vms: 0,
        });
        series.push_memory(MemorySample {
            rss: u64::MAX,
            vms: 0,
        });

        assert_eq!(series.rss_mean(), Some(u64::MAX));
    }

    #[test]
    fn network_growth_per_interface() {
        let mut series = SampleSeries::default();
        series.push_network(
            "eth0",
            NetworkSample {
                bytes_received: 1_000,
                bytes_sent: 500,
                packets_received: 10,
                packets_sent: 5,
            },
        );
        series.push_network(
            "eth0",
            NetworkSample {
                bytes_received: 4_000,
                bytes_sent: 600,
                packets_received: 40,
                packets_sent: 6,
            },
        );
        series.push_network("lo", NetworkSample::default());

        let growth = series.network_growth();

        assert_eq!(growth.len(), 2);
        assert_eq!(
            growth.get("eth0"),
            Some(&NetworkSample {
                bytes_received: 3_000,
                bytes_sent: 100,
                packets_received: 30,
                packets_sent: 1,
            })
        );
        assert_eq!(growth.get("lo"), Some(&NetworkSample::default()));
        assert_eq!(series.network().get("eth0").map(Vec::len), Some(2));
    }

    #[test]
    fn reset_counters_count_as_no_growth() {
        let later = NetworkSample {
            bytes_received: 10,
            ..NetworkSample::default()
        };
        let earlier = NetworkSample {
            bytes_received: 99,
            bytes_sent: 1,
            ..NetworkSample::default()
        };

        assert_eq!(later.growth_since(&earlier), NetworkSample::default());
    }

    #[test]
    fn json_round_trip() {
        let mut series = cpu_series(&[1.5, 2.5]);
        series.push_memory(MemorySample { rss: 7, vms: 8 });
        series.push_network("eth0", NetworkSample::default());

        let json = series.to_json().unwrap();
        assert!(json.contains("\"rss\": 7"));

        assert_eq!(SampleSeries::from_json(&json).unwrap(), series);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            SampleSeries::from_json("[1, 2"),
            Err(Error::Serialization(_))
        ));
    }
}
