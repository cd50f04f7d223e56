use std::os::fd::{AsRawFd, OwnedFd};

use tracing::trace;

use crate::error::{Error, Result};
use crate::ffi::{
    perf_event_open, perf_ioctl, read_counter, PerfEventAttr, PERF_EVENT_IOC_DISABLE, PERF_EVENT_IOC_ENABLE,
    PERF_EVENT_IOC_RESET, PERF_FLAG_FD_CLOEXEC,
};
use crate::perf::types::{CounterReading, CounterTarget, MetricDefinition};
use crate::traits::{PerfCounter, PerfEventSource};

/// Counters backed by `perf_event_open(2)`
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxPerfSource;

impl PerfEventSource for LinuxPerfSource {
    fn open(&self, target: CounterTarget, cpu: u32, metric: &MetricDefinition) -> Result<Box<dyn PerfCounter>> {
        let attr = PerfEventAttr::counting(metric.event);
        let flags = PERF_FLAG_FD_CLOEXEC | target.open_flags();
        let fd = perf_event_open(&attr, target.raw(), cpu as i32, flags)
            .map_err(|e| Error::counter_open(target.raw(), cpu, metric.name.as_str(), e))?;
        trace!(%target, cpu, metric = %metric.name, fd = fd.as_raw_fd(), "opened counter");
        Ok(Box::new(LinuxPerfCounter { fd }))
    }
}

/// An open perf descriptor; closed when dropped
#[derive(Debug)]
pub struct LinuxPerfCounter {
    fd: OwnedFd,
}

impl PerfCounter for LinuxPerfCounter {
    fn reset(&mut self) -> Result<()> {
        perf_ioctl(self.fd.as_raw_fd(), PERF_EVENT_IOC_RESET).map_err(|e| Error::counter_control("reset", e))
    }

    fn enable(&mut self) -> Result<()> {
        perf_ioctl(self.fd.as_raw_fd(), PERF_EVENT_IOC_ENABLE).map_err(|e| Error::counter_control("enable", e))
    }

    fn disable(&mut self) -> Result<()> {
        perf_ioctl(self.fd.as_raw_fd(), PERF_EVENT_IOC_DISABLE).map_err(|e| Error::counter_control("disable", e))
    }

    fn read(&mut self) -> Result<CounterReading> {
        let rf = read_counter(self.fd.as_raw_fd()).map_err(Error::counter_read)?;
        Ok(CounterReading::new(rf.value, rf.time_enabled, rf.time_running))
    }
}
