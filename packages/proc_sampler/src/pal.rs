//! Platform abstraction layer for process and network counters.
//!
//! Production code reads the counters through `sysinfo`. Tests substitute a fake platform
//! whose readings are scripted, so sampler logic can be verified deterministically.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::{Platform, ProcessReading};
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::{FAKE_CURRENT_PID, FakePlatform};
pub(crate) use real::SysinfoPlatform;
