//! Sampler configuration
//!
//! The engine is configured by a small JSON document; every field except the
//! group list has a default.
//!
//! ```json
//! {
//!     "cgroups": ["/sys/fs/cgroup/perf_event/web", "/sys/fs/cgroup/perf_event/batch"],
//!     "cycles": 10,
//!     "cadence_secs": 5,
//!     "period_secs": 1
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::perf::constants::DEFAULT_METRICS;
use crate::perf::{CounterScope, MetricDefinition};
use crate::rdt::{DEFAULT_CAPACITY, DEFAULT_RESCTRL_ROOT};

/// Default number of sampling cycles
pub const DEFAULT_CYCLES: u32 = 1;

/// Default time between the starts of two cycles, in seconds
pub const DEFAULT_CADENCE_SECS: u64 = 5;

/// Default measurement window, in seconds
pub const DEFAULT_PERIOD_SECS: u64 = 1;

/// Where the RDT diagnostic log is written
pub const DEFAULT_RDT_LOG_PATH: &str = "/tmp/pqos.log";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplerConfig {
    /// Control-group directories to monitor
    pub cgroups: Vec<PathBuf>,
    /// CPUs to open counters on, `0..cpu_count`
    pub cpu_count: u32,
    pub cycles: u32,
    pub cadence_secs: u64,
    /// Must be shorter than the cadence
    pub period_secs: u64,
    /// Display names from the built-in metric table
    pub metrics: Vec<String>,
    pub scope: CounterScope,
    pub rdt_capacity: usize,
    pub resctrl_root: PathBuf,
    pub rdt_log_path: PathBuf,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            cgroups: Vec::new(),
            cpu_count: online_cpus(),
            cycles: DEFAULT_CYCLES,
            cadence_secs: DEFAULT_CADENCE_SECS,
            period_secs: DEFAULT_PERIOD_SECS,
            metrics: DEFAULT_METRICS.iter().map(|m| m.to_string()).collect(),
            scope: CounterScope::default(),
            rdt_capacity: DEFAULT_CAPACITY,
            resctrl_root: PathBuf::from(DEFAULT_RESCTRL_ROOT),
            rdt_log_path: PathBuf::from(DEFAULT_RDT_LOG_PATH),
        }
    }
}

impl SamplerConfig {
    /// Load and validate a JSON configuration file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cgroups.is_empty() {
            return Err(Error::invalid_config("no cgroups to monitor"));
        }
        if self.cpu_count == 0 {
            return Err(Error::invalid_config("cpu_count must be at least 1"));
        }
        if self.cycles == 0 {
            return Err(Error::invalid_config("cycles must be at least 1"));
        }
        if self.period_secs == 0 {
            return Err(Error::invalid_config("period_secs must be at least 1"));
        }
        if self.period_secs >= self.cadence_secs {
            return Err(Error::invalid_config(format!(
                "period_secs ({}) must be shorter than cadence_secs ({})",
                self.period_secs, self.cadence_secs
            )));
        }
        if self.rdt_capacity == 0 {
            return Err(Error::invalid_config("rdt_capacity must be at least 1"));
        }
        if self.metrics.is_empty() {
            return Err(Error::invalid_config("no metrics selected"));
        }
        self.metric_definitions()?;
        Ok(())
    }

    pub fn metric_definitions(&self) -> Result<Vec<MetricDefinition>> {
        MetricDefinition::resolve_all(&self.metrics)
    }

    /// Measurement window inside each cycle
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.cadence_secs)
    }

    /// Pause between the end of one measurement window and the next cycle
    pub fn pause(&self) -> Duration {
        self.cadence().saturating_sub(self.period())
    }
}

/// Number of online CPUs, falling back to 1
pub fn online_cpus() -> u32 {
    // SAFETY: sysconf has no memory-safety preconditions.
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    u32::try_from(n).ok().filter(|&n| n > 0).unwrap_or(1)
}
