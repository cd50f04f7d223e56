//! pgos - per-group hardware counter and RDT telemetry for Linux
//!
//! This crate samples hardware performance counters and Intel RDT cache and
//! memory bandwidth monitoring for sets of processes grouped by control group.
//! Counters are opened through `perf_event_open(2)`; RDT data comes from the
//! resctrl filesystem.
//!
//! # Features
//!
//! - **Groups**: Resolve control-group directories into named process sets
//! - **PMU Counters**: Open, enable, read and multiplex-scale counters per
//!   process, metric and CPU, summed per group
//! - **RDT Monitoring**: LLC occupancy and local/remote memory bandwidth per
//!   group from a bounded pool of monitoring slots
//! - **Scheduling**: Fixed-cadence sampling cycles emitting tab-separated
//!   records
//!
//! # Examples
//!
//! ```no_run
//! use pgos::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let config = SamplerConfig::from_json_str(
//!         r#"{"cgroups": ["/sys/fs/cgroup/perf_event/web"], "cycles": 3}"#,
//!     )?;
//!     let backend = ResctrlBackend::new(&config.resctrl_root);
//!     let mut scheduler = SampleScheduler::new(config, LinuxPerfSource, backend)?;
//!     scheduler.setup();
//!
//!     let mut records: Vec<OutputRecord> = Vec::new();
//!     scheduler.run(&mut records).await?;
//!     for record in &records {
//!         println!("{record}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Safety
//!
//! Counter descriptors are owned by their handles and closed on drop, on
//! success and error paths alike. RDT monitoring groups are removed when the
//! monitor is dropped.

pub mod config;
pub mod error;
pub mod ffi;
pub mod group;
pub mod logging;
pub mod perf;
pub mod rdt;
pub mod scheduler;
pub mod traits;

#[cfg(test)]
mod test_utils;

pub use error::{Error, Result};

/// Operating-system process identifier
pub type Pid = u32;

/// Re-export common types for convenience
pub mod prelude {
    pub use crate::config::SamplerConfig;
    pub use crate::group::{GroupRegistry, MonitoredGroup};
    pub use crate::perf::{CounterScope, LinuxPerfSource, MetricDefinition, PerfCounterBank};
    pub use crate::rdt::{RdtMonitor, ResctrlBackend};
    pub use crate::scheduler::{MetricValue, OutputRecord, SampleScheduler, TsvSink};
    pub use crate::traits::RecordSink;
    pub use crate::Error;
    pub use crate::Result;
}
