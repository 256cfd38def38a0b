use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::pal::{Platform, PlatformFacade};
use crate::{Error, Result, SampleOptions, SampleSeries};

/// Periodically records resource usage of one process on a background thread.
///
/// A sampler is bound to a process when created and starts recording when
/// [`start()`][Self::start] is called. Recording ends when the returned [`RunningSampler`] is
/// stopped, which yields the collected [`SampleSeries`].
///
/// Network counters are read from the network interfaces of the whole system, as operating
/// systems do not attribute interface traffic to individual processes.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use proc_sampler::{SampleOptions, Sampler};
///
/// let sampler = Sampler::current_process();
/// let running = sampler.start(SampleOptions::default().with_interval(Duration::from_millis(10)));
///
/// std::thread::sleep(Duration::from_millis(50));
///
/// let series = running.stop();
/// println!("peak CPU: {:?}%", series.cpu_max());
/// ```
#[derive(Debug)]
pub struct Sampler {
    pid: u32,
    platform: PlatformFacade,
}

impl Sampler {
    /// Creates a sampler for the calling process.
    #[must_use]
    pub fn current_process() -> Self {
        Self::current_process_with(PlatformFacade::real())
    }

    /// Creates a sampler for the process with the given ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProcessNotFound`] if no such process exists.
    pub fn for_pid(pid: u32) -> Result<Self> {
        Self::for_pid_with(PlatformFacade::real(), pid)
    }

    /// Creates a sampler for the process with exactly the given name. When several processes
    /// share the name, the one with the lowest process ID is sampled. An empty name selects the
    /// calling process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProcessNameNotFound`] if no such process exists.
    pub fn for_process_name(name: &str) -> Result<Self> {
        Self::for_process_name_with(PlatformFacade::real(), name)
    }

    fn current_process_with(platform: PlatformFacade) -> Self {
        Self {
            pid: platform.current_pid(),
            platform,
        }
    }

    fn for_pid_with(mut platform: PlatformFacade, pid: u32) -> Result<Self> {
        if !platform.process_exists(pid) {
            return Err(Error::ProcessNotFound { pid });
        }

        Ok(Self { pid, platform })
    }

    fn for_process_name_with(mut platform: PlatformFacade, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Ok(Self::current_process_with(platform));
        }

        let pid = platform
            .find_process(name)
            .ok_or_else(|| Error::ProcessNameNotFound {
                name: name.to_string(),
            })?;

        Ok(Self { pid, platform })
    }

    /// The ID of the sampled process.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Starts recording on a background thread, taking one reading of every enabled dimension
    /// per [`SampleOptions::interval()`]. The first reading is taken one interval after start.
    ///
    /// # Panics
    ///
    /// Panics if the operating system refuses to create the sampling thread.
    #[must_use]
    pub fn start(self, options: SampleOptions) -> RunningSampler {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        tracing::debug!(
            pid = self.pid,
            interval_ms = options.interval().as_millis(),
            "starting process sampler"
        );

        let collector = Collector {
            pid: self.pid,
            options,
            platform: self.platform,
            series: SampleSeries::default(),
        };

        let join_handle = thread::Builder::new()
            .name("proc-sampler".to_string())
            .spawn(move || collector.run(&stop_rx, options.interval()))
            .expect("the operating system should allow creating the sampler thread");

        RunningSampler {
            pid: self.pid,
            stop_tx: Some(stop_tx),
            join_handle: Some(join_handle),
        }
    }
}

/// A sampler that is recording in the background.
///
/// Dropping it without calling [`stop()`][Self::stop] also stops the background thread but
/// discards the readings.
#[derive(Debug)]
pub struct RunningSampler {
    pid: u32,

    // Dropping the sender wakes up and ends the sampling thread.
    stop_tx: Option<mpsc::Sender<()>>,
    join_handle: Option<JoinHandle<SampleSeries>>,
}

impl RunningSampler {
    /// The ID of the sampled process.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Stops recording and returns every reading taken so far.
    ///
    /// # Panics
    ///
    /// Resumes the panic if the sampling thread panicked.
    #[must_use]
    pub fn stop(mut self) -> SampleSeries {
        drop(self.stop_tx.take());

        let join_handle = self
            .join_handle
            .take()
            .expect("the join handle is only taken by stop() or drop()");

        let series = join_handle
            .join()
            .unwrap_or_else(|payload| std::panic::resume_unwind(payload));

        tracing::debug!(
            pid = self.pid,
            cpu_readings = series.cpu().len(),
            memory_readings = series.memory().len(),
            io_readings = series.io().len(),
            interfaces = series.network().len(),
            "stopped process sampler"
        );

        series
    }
}

impl Drop for RunningSampler {
    fn drop(&mut self) {
        drop(self.stop_tx.take());

        if let Some(join_handle) = self.join_handle.take() {
            // A panic on the sampling thread has nobody left to report to.
            drop(join_handle.join());
        }
    }
}

/// State owned by the sampling thread.
#[derive(Debug)]
struct Collector {
    pid: u32,
    options: SampleOptions,
    platform: PlatformFacade,
    series: SampleSeries,
}

impl Collector {
    // Timing-bound loop; the tick logic is tested separately.
    #[cfg_attr(test, mutants::skip)]
    fn run(mut self, stop_rx: &mpsc::Receiver<()>, interval: Duration) -> SampleSeries {
        loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => self.tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.series
    }

    fn tick(&mut self) {
        if self.options.needs_process() {
            match self.platform.read_process(self.pid) {
                Some(reading) => {
                    if self.options.cpu() {
                        self.series.push_cpu(reading.cpu_percent);
                    }

                    if self.options.memory() {
                        self.series.push_memory(reading.memory);
                    }

                    if self.options.io() {
                        self.series.push_io(reading.io);
                    }
                }
                None => {
                    tracing::trace!(pid = self.pid, "sampled process has no reading this tick");
                }
            }
        }

        if self.options.network() {
            for (interface, sample) in self.platform.read_networks() {
                self.series.push_network(&interface, sample);
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Instant;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{IoSample, MemorySample, NetworkSample};
    use crate::pal::{FAKE_CURRENT_PID, FakePlatform, ProcessReading};

    assert_impl_all!(Sampler: Send);
    assert_impl_all!(RunningSampler: Send);

    fn reading(cpu_percent: f64, rss: u64) -> ProcessReading {
        ProcessReading {
            cpu_percent,
            memory: MemorySample { rss, vms: rss * 2 },
            io: IoSample {
                read_bytes: rss / 10,
                written_bytes: rss / 20,
            },
        }
    }

    fn collector(platform: &FakePlatform, options: SampleOptions) -> Collector {
        Collector {
            pid: FAKE_CURRENT_PID,
            options,
            platform: PlatformFacade::fake(platform.clone()),
            series: SampleSeries::default(),
        }
    }

    #[test]
    fn current_process_uses_platform_pid() {
        let sampler = Sampler::current_process_with(PlatformFacade::fake(FakePlatform::new()));

        assert_eq!(sampler.pid(), FAKE_CURRENT_PID);
    }

    #[test]
    fn unknown_pid_is_rejected() {
        let result = Sampler::for_pid_with(PlatformFacade::fake(FakePlatform::new()), 4);

        assert!(matches!(result, Err(Error::ProcessNotFound { pid: 4 })));
    }

    #[test]
    fn known_pid_is_accepted() {
        let platform = FakePlatform::new();
        platform.add_process(4, "four");

        let sampler = Sampler::for_pid_with(PlatformFacade::fake(platform), 4).unwrap();

        assert_eq!(sampler.pid(), 4);
    }

    #[test]
    fn name_lookup() {
        let platform = FakePlatform::new();
        platform.add_process(55, "redis-server");

        let sampler =
            Sampler::for_process_name_with(PlatformFacade::fake(platform.clone()), "redis-server")
                .unwrap();
        assert_eq!(sampler.pid(), 55);

        let missing = Sampler::for_process_name_with(PlatformFacade::fake(platform), "nginx");
        assert!(matches!(
            missing,
            Err(Error::ProcessNameNotFound { name }) if name == "nginx"
        ));
    }

    #[test]
    fn empty_name_selects_current_process() {
        let sampler =
            Sampler::for_process_name_with(PlatformFacade::fake(FakePlatform::new()), "").unwrap();

        assert_eq!(sampler.pid(), FAKE_CURRENT_PID);
    }

    #[test]
    fn tick_appends_enabled_dimensions() {
        let platform = FakePlatform::new();
        platform.push_reading(reading(0.0, 1_000));
        platform.push_reading(reading(50.0, 2_000));
        platform.set_network("eth0", NetworkSample::default());

        let mut collector = collector(&platform, SampleOptions::default());
        collector.tick();
        collector.tick();

        let series = collector.series;
        assert_eq!(series.cpu(), [0.0, 50.0]);
        assert_eq!(series.rss_max(), Some(2_000));
        assert_eq!(series.vms_max(), Some(4_000));
        assert_eq!(series.io_read_max(), Some(200));
        assert_eq!(series.io_written_max(), Some(100));
        assert_eq!(series.network().get("eth0").map(Vec::len), Some(2));
    }

    #[test]
    fn disabled_dimensions_stay_empty() {
        let platform = FakePlatform::new();
        platform.push_reading(reading(10.0, 1_000));
        platform.set_network("eth0", NetworkSample::default());

        let options = SampleOptions::default()
            .with_memory(false)
            .with_io(false)
            .with_network(false);

        let mut collector = collector(&platform, options);
        collector.tick();

        assert_eq!(collector.series.cpu(), [10.0]);
        assert!(collector.series.memory().is_empty());
        assert!(collector.series.io().is_empty());
        assert!(collector.series.network().is_empty());
        assert_eq!(platform.network_reads(), 0);
    }

    #[test]
    fn network_only_does_not_touch_process() {
        let platform = FakePlatform::new();
        platform.set_network("lo", NetworkSample::default());

        let options = SampleOptions::default()
            .with_cpu(false)
            .with_memory(false)
            .with_io(false);

        let mut collector = collector(&platform, options);
        collector.tick();

        assert_eq!(platform.process_reads(), 0);
        assert_eq!(collector.series.network().len(), 1);
    }

    #[test]
    fn vanished_process_skips_tick() {
        let platform = FakePlatform::new();
        platform.push_reading(reading(10.0, 1_000));

        let mut collector = collector(&platform, SampleOptions::default().with_network(false));
        collector.tick();
        platform.remove_process(FAKE_CURRENT_PID);
        collector.tick();

        assert_eq!(collector.series.cpu().len(), 1);
        assert_eq!(collector.series.memory().len(), 1);
    }

    #[cfg(not(miri))] // Real threads are too slow under Miri.
    #[test]
    fn background_thread_collects_until_stopped() {
        testing::with_watchdog(|| {
            let platform = FakePlatform::new();
            platform.push_reading(reading(25.0, 1_000));

            let sampler = Sampler::current_process_with(PlatformFacade::fake(platform.clone()));
            let running = sampler.start(
                SampleOptions::default()
                    .with_network(false)
                    .with_interval(Duration::from_millis(1)),
            );

            let deadline = Instant::now() + Duration::from_secs(10);
            while platform.process_reads() < 3 && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(1));
            }

            let series = running.stop();
            let reads_at_stop = platform.process_reads();

            assert!(series.cpu().len() >= 3);
            assert_eq!(series.cpu().len(), series.memory().len());
            assert_eq!(series.cpu().len(), series.io().len());

            // Nothing is read once stop() has returned.
            thread::sleep(Duration::from_millis(10));
            assert_eq!(platform.process_reads(), reads_at_stop);
        });
    }

    #[cfg(not(miri))] // Real threads are too slow under Miri.
    #[test]
    fn dropping_running_sampler_ends_thread() {
        testing::with_watchdog(|| {
            let platform = FakePlatform::new();

            let running = Sampler::current_process_with(PlatformFacade::fake(platform.clone()))
                .start(SampleOptions::default().with_interval(Duration::from_millis(1)));
            drop(running);

            let reads_after_drop = platform.process_reads();
            thread::sleep(Duration::from_millis(10));
            assert_eq!(platform.process_reads(), reads_after_drop);
        });
    }
}
