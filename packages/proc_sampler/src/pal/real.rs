// Real platform that reads counters through `sysinfo`.
//
// This is a thin forwarder to system APIs and is excluded from coverage and mutation testing.

use std::collections::BTreeMap;
use std::fmt;

use sysinfo::{Networks, Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::pal::{Platform, ProcessReading};
use crate::{IoSample, MemorySample, NetworkSample};

/// Reads process and network counters of the running operating system.
pub(crate) struct SysinfoPlatform {
    system: System,
}

impl SysinfoPlatform {
    pub(crate) fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    fn refresh(&mut self, pid: u32) {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[Pid::from_u32(pid)]),
            true,
            ProcessRefreshKind::nothing()
                .with_cpu()
                .with_memory()
                .with_disk_usage(),
        );
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl fmt::Debug for SysinfoPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SysinfoPlatform").finish_non_exhaustive()
    }
}

// Trivial forwarder to system APIs - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Platform for SysinfoPlatform {
    fn current_pid(&self) -> u32 {
        std::process::id()
    }

    fn process_exists(&mut self, pid: u32) -> bool {
        self.refresh(pid);
        self.system.process(Pid::from_u32(pid)).is_some()
    }

    fn find_process(&mut self, name: &str) -> Option<u32> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        self.system
            .processes()
            .iter()
            .filter(|(_, process)| process.name().to_string_lossy() == name)
            .map(|(pid, _)| pid.as_u32())
            .min()
    }

    fn read_process(&mut self, pid: u32) -> Option<ProcessReading> {
        self.refresh(pid);

        let process = self.system.process(Pid::from_u32(pid))?;
        let disk = process.disk_usage();

        Some(ProcessReading {
            cpu_percent: f64::from(process.cpu_usage()),
            memory: MemorySample {
                rss: process.memory(),
                vms: process.virtual_memory(),
            },
            io: IoSample {
                read_bytes: disk.total_read_bytes,
                written_bytes: disk.total_written_bytes,
            },
        })
    }

    fn read_networks(&mut self) -> BTreeMap<String, NetworkSample> {
        let networks = Networks::new_with_refreshed_list();

        networks
            .list()
            .iter()
            .map(|(name, data)| {
                (
                    name.clone(),
                    NetworkSample {
                        bytes_received: data.total_received(),
                        bytes_sent: data.total_transmitted(),
                        packets_received: data.total_packets_received(),
                        packets_sent: data.total_packets_transmitted(),
                    },
                )
            })
            .collect()
    }
}
