//! Hardware performance counter collection
//!
//! [`PerfCounterBank`] measures every monitored group over a fixed window by
//! opening one counter per (target, metric, CPU) triple, enabling them all in
//! one bulk phase, sleeping for the window, then reading, scaling and summing
//! the results per (group, metric).
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use pgos::group::GroupRegistry;
//! use pgos::perf::{CounterScope, LinuxPerfSource, MetricDefinition, PerfCounterBank};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> pgos::Result<()> {
//!     let registry = GroupRegistry::load(["/sys/fs/cgroup/perf_event/web"]);
//!     let metrics = MetricDefinition::resolve_all(&["instructions", "cycles"])?;
//!     let bank = PerfCounterBank::new(LinuxPerfSource, CounterScope::Process);
//!
//!     let matrix = bank.collect(registry.groups(), 4, &metrics, Duration::from_secs(1)).await?;
//!     println!("instructions: {}", matrix.get(0, 0));
//!     Ok(())
//! }
//! ```

/// Metric table
pub mod constants;

mod counter;
mod types;

pub use counter::{LinuxPerfCounter, LinuxPerfSource};
pub use types::{CounterMatrix, CounterReading, CounterScope, CounterTarget, MetricDefinition};

use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::Result;
use crate::group::MonitoredGroup;
use crate::traits::{PerfCounter, PerfEventSource};

/// A counter opened during one pass, tagged with the matrix cell it feeds
struct OpenCounter {
    group: usize,
    metric: usize,
    cpu: u32,
    target: CounterTarget,
    counter: Box<dyn PerfCounter>,
}

/// Opens, enables, reads and scales counters for a pid × metric × CPU matrix
#[derive(Debug)]
pub struct PerfCounterBank<S> {
    source: S,
    scope: CounterScope,
}

impl<S: PerfEventSource> PerfCounterBank<S> {
    pub fn new(source: S, scope: CounterScope) -> Self {
        Self { source, scope }
    }

    pub fn scope(&self) -> CounterScope {
        self.scope
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one measurement pass.
    ///
    /// Every counter in the matrix is opened before any is enabled. If an open,
    /// reset or enable fails the pass is abandoned and every counter opened so
    /// far is closed. A read failure only drops that counter's contribution.
    /// Counters never outlive the call.
    pub async fn collect(
        &self,
        groups: &[MonitoredGroup],
        cpu_count: u32,
        metrics: &[MetricDefinition],
        period: Duration,
    ) -> Result<CounterMatrix> {
        let mut matrix = CounterMatrix::zeroed(groups.len(), metrics.len());
        let mut open = self.open_all(groups, cpu_count, metrics)?;

        for oc in open.iter_mut() {
            oc.counter.reset()?;
            oc.counter.enable()?;
        }
        debug!(counters = open.len(), ?period, "counters enabled");

        tokio::time::sleep(period).await;

        for oc in open.iter_mut() {
            if let Err(e) = oc.counter.disable() {
                warn!(target = %oc.target, cpu = oc.cpu, error = %e, "failed to disable counter");
            }
        }

        // Each counter is dropped, and its descriptor closed, as soon as it has
        // been read, whether or not the read succeeded.
        for mut oc in open.drain(..) {
            match oc.counter.read() {
                Ok(reading) => matrix.add(oc.group, oc.metric, reading.scaled()),
                Err(e) => warn!(
                    group = %groups[oc.group].name(),
                    metric = %metrics[oc.metric].name,
                    target = %oc.target,
                    cpu = oc.cpu,
                    error = %e,
                    "skipping counter"
                ),
            }
        }

        Ok(matrix)
    }

    fn open_all(
        &self,
        groups: &[MonitoredGroup],
        cpu_count: u32,
        metrics: &[MetricDefinition],
    ) -> Result<Vec<OpenCounter>> {
        let mut open = Vec::new();
        for (gi, group) in groups.iter().enumerate() {
            for target in group.counter_targets(self.scope) {
                for (mi, metric) in metrics.iter().enumerate() {
                    for cpu in 0..cpu_count {
                        let counter = self.source.open(target, cpu, metric).inspect_err(|e| {
                            error!(group = %group.name(), error = %e, "aborting collection pass");
                        })?;
                        open.push(OpenCounter {
                            group: gi,
                            metric: mi,
                            cpu,
                            target,
                            counter,
                        });
                    }
                }
            }
        }
        Ok(open)
    }
}
