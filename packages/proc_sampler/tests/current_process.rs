//! Samples the test process itself through the real operating system counters.
#![cfg(not(miri))] // Miri cannot call into the operating system APIs used for sampling.

use std::hint::black_box;
use std::time::{Duration, Instant};

use proc_sampler::{Error, SampleOptions, SampleSeries, Sampler};

#[test]
fn samples_own_process() {
    testing::with_watchdog(|| {
        let sampler = Sampler::current_process();
        assert_eq!(sampler.pid(), std::process::id());

        let running = sampler.start(
            SampleOptions::default()
                .with_network(false)
                .with_interval(Duration::from_millis(20)),
        );

        // Burn some CPU so there is something to see.
        let deadline = Instant::now() + Duration::from_millis(200);
        let mut counter = 0_u64;
        while Instant::now() < deadline {
            counter = black_box(counter.wrapping_add(1));
        }

        let series = running.stop();

        assert!(!series.cpu().is_empty());
        assert_eq!(series.cpu().len(), series.memory().len());
        assert!(series.rss_max().is_some_and(|rss| rss > 0));
        assert!(series.cpu_max().is_some_and(|cpu| cpu >= 0.0));
    });
}

#[test]
fn own_pid_is_found() {
    let sampler = Sampler::for_pid(std::process::id()).unwrap();

    assert_eq!(sampler.pid(), std::process::id());
}

#[test]
fn implausible_pid_is_rejected() {
    assert!(matches!(
        Sampler::for_pid(u32::MAX - 1),
        Err(Error::ProcessNotFound { .. })
    ));
}

#[test]
fn implausible_name_is_rejected() {
    assert!(matches!(
        Sampler::for_process_name("no-such-process-for-proc-sampler-tests"),
        Err(Error::ProcessNameNotFound { .. })
    ));
}

#[test]
fn series_survives_json() {
    testing::with_watchdog(|| {
        let running = Sampler::current_process()
            .start(SampleOptions::default().with_interval(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(30));
        let series = running.stop();

        let parsed = SampleSeries::from_json(&series.to_json().unwrap()).unwrap();

        assert_eq!(parsed.cpu().len(), series.cpu().len());
        assert_eq!(parsed.memory(), series.memory());
        assert_eq!(parsed.network(), series.network());
    });
}
