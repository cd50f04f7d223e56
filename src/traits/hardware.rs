use crate::error::Result;
use crate::perf::{CounterReading, CounterTarget, MetricDefinition};
use crate::rdt::{RdtGroupId, RdtSnapshot};
use crate::scheduler::OutputRecord;
use crate::Pid;

#[cfg(test)]
use mockall::automock;

/// A single open hardware counter.
///
/// Implementations own the underlying descriptor and release it on drop, so a
/// counter can never outlive the collection pass that opened it.
pub trait PerfCounter {
    /// Zero the counter value
    fn reset(&mut self) -> Result<()>;

    /// Start counting
    fn enable(&mut self) -> Result<()>;

    /// Stop counting
    fn disable(&mut self) -> Result<()>;

    /// Read the raw value together with the enabled/running times
    fn read(&mut self) -> Result<CounterReading>;
}

/// Source of hardware counters.
///
/// The Linux implementation goes through `perf_event_open(2)`; tests swap in
/// fakes so the bank's open/enable/read/scale logic runs without privileges.
#[cfg_attr(test, automock)]
pub trait PerfEventSource {
    /// Open one counter for `metric` on `target`, pinned to `cpu`, initially disabled.
    fn open(&self, target: CounterTarget, cpu: u32, metric: &MetricDefinition) -> Result<Box<dyn PerfCounter>>;
}

/// Kernel-side cache and memory bandwidth monitoring.
#[cfg_attr(test, automock)]
pub trait RdtBackend {
    /// Create a monitoring group covering `pids`.
    fn start(&mut self, name: &str, pids: &[Pid]) -> Result<RdtGroupId>;

    /// Read LLC occupancy and the bandwidth consumed since the previous poll.
    fn poll(&mut self, group: RdtGroupId) -> Result<RdtSnapshot>;

    /// Tear the monitoring group down.
    fn stop(&mut self, group: RdtGroupId) -> Result<()>;
}

/// Destination for output records.
pub trait RecordSink {
    fn emit(&mut self, record: &OutputRecord) -> Result<()>;

    /// Called once at the end of every cycle.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
