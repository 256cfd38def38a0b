// Facade that dispatches to either the real platform or a fake in tests.

use std::collections::BTreeMap;

#[cfg(test)]
use crate::pal::FakePlatform;
use crate::pal::{Platform, ProcessReading, SysinfoPlatform};
use crate::NetworkSample;

/// Facade over platform operations, dispatching to the real or fake implementation.
///
/// In production this always wraps a [`SysinfoPlatform`]. In tests it can also wrap a
/// [`FakePlatform`] with scripted readings.
#[derive(Debug)]
pub(crate) enum PlatformFacade {
    Real(SysinfoPlatform),

    #[cfg(test)]
    Fake(FakePlatform),
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl PlatformFacade {
    pub(crate) fn real() -> Self {
        Self::Real(SysinfoPlatform::new())
    }

    #[cfg(test)]
    pub(crate) fn fake(platform: FakePlatform) -> Self {
        Self::Fake(platform)
    }
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Platform for PlatformFacade {
    fn current_pid(&self) -> u32 {
        match self {
            Self::Real(p) => p.current_pid(),
            #[cfg(test)]
            Self::Fake(p) => p.current_pid(),
        }
    }

    fn process_exists(&mut self, pid: u32) -> bool {
        match self {
            Self::Real(p) => p.process_exists(pid),
            #[cfg(test)]
            Self::Fake(p) => p.process_exists(pid),
        }
    }

    fn find_process(&mut self, name: &str) -> Option<u32> {
        match self {
            Self::Real(p) => p.find_process(name),
            #[cfg(test)]
            Self::Fake(p) => p.find_process(name),
        }
    }

    fn read_process(&mut self, pid: u32) -> Option<ProcessReading> {
        match self {
            Self::Real(p) => p.read_process(pid),
            #[cfg(test)]
            Self::Fake(p) => p.read_process(pid),
        }
    }

    fn read_networks(&mut self) -> BTreeMap<String, NetworkSample> {
        match self {
            Self::Real(p) => p.read_networks(),
            #[cfg(test)]
            Self::Fake(p) => p.read_networks(),
        }
    }
}
