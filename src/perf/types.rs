use std::fmt;
use std::os::fd::RawFd;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::ffi::PERF_FLAG_PID_CGROUP;
use crate::perf::constants::BUILTIN_METRICS;
use crate::Pid;

/// A named hardware event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    /// Name used in output records
    pub name: String,
    /// Generic hardware event code (`PERF_COUNT_HW_*`)
    pub event: u64,
}

impl MetricDefinition {
    pub fn new(name: impl Into<String>, event: u64) -> Self {
        Self { name: name.into(), event }
    }

    /// Look a metric up in the built-in table by display name
    pub fn builtin(name: &str) -> Result<Self> {
        BUILTIN_METRICS
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(known, event)| Self::new(*known, *event))
            .ok_or_else(|| Error::invalid_config(format!("unknown metric {name:?}")))
    }

    /// Resolve a list of display names, failing on the first unknown one
    pub fn resolve_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>> {
        names.iter().map(|name| Self::builtin(name.as_ref())).collect()
    }
}

/// One raw read from a counter in counting mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterReading {
    pub value: u64,
    pub time_enabled: u64,
    pub time_running: u64,
}

impl CounterReading {
    pub fn new(value: u64, time_enabled: u64, time_running: u64) -> Self {
        Self {
            value,
            time_enabled,
            time_running,
        }
    }

    /// Estimate the full-window count for a multiplexed counter.
    ///
    /// A counter that never ran scales to zero. One that ran for only part of
    /// the time it was enabled is extrapolated as
    /// `round(value * enabled / running)`; otherwise the raw value is exact.
    pub fn scaled(&self) -> u64 {
        if self.time_running == 0 {
            return 0;
        }
        if self.time_running < self.time_enabled {
            let running = u128::from(self.time_running);
            let product = u128::from(self.value) * u128::from(self.time_enabled);
            let rounded = (product + running / 2) / running;
            return u64::try_from(rounded).unwrap_or(u64::MAX);
        }
        self.value
    }
}

/// How a group is presented to `perf_event_open`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterScope {
    /// One counter per member pid
    #[default]
    Process,
    /// One counter per group, targeting the cgroup directory
    Cgroup,
}

/// What a single counter measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterTarget {
    Process(Pid),
    /// Open descriptor of a cgroup directory
    Cgroup(RawFd),
}

impl CounterTarget {
    /// Value passed as the `pid` argument of `perf_event_open`
    pub fn raw(&self) -> i32 {
        match *self {
            Self::Process(pid) => pid as i32,
            Self::Cgroup(fd) => fd,
        }
    }

    /// Extra `perf_event_open` flags this target needs
    pub fn open_flags(&self) -> libc::c_ulong {
        match self {
            Self::Process(_) => 0,
            Self::Cgroup(_) => PERF_FLAG_PID_CGROUP,
        }
    }
}

impl fmt::Display for CounterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Process(pid) => write!(f, "pid {pid}"),
            Self::Cgroup(fd) => write!(f, "cgroup fd {fd}"),
        }
    }
}

/// Accumulated scaled counts, one cell per (group, metric)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterMatrix {
    metrics: usize,
    values: Vec<u64>,
}

impl CounterMatrix {
    /// All-zero matrix, also what a failed pass reports
    pub fn zeroed(groups: usize, metrics: usize) -> Self {
        Self {
            metrics,
            values: vec![0; groups * metrics],
        }
    }

    pub fn groups(&self) -> usize {
        if self.metrics == 0 {
            0
        } else {
            self.values.len() / self.metrics
        }
    }

    pub fn metrics(&self) -> usize {
        self.metrics
    }

    /// Value for a cell; out-of-range cells read as zero
    pub fn get(&self, group: usize, metric: usize) -> u64 {
        if metric >= self.metrics {
            return 0;
        }
        self.values.get(group * self.metrics + metric).copied().unwrap_or(0)
    }

    pub(crate) fn add(&mut self, group: usize, metric: usize, value: u64) {
        if metric >= self.metrics {
            return;
        }
        if let Some(cell) = self.values.get_mut(group * self.metrics + metric) {
            *cell = cell.saturating_add(value);
        }
    }

    /// Row of per-metric values for one group
    pub fn row(&self, group: usize) -> &[u64] {
        let start = group * self.metrics;
        self.values.get(start..start + self.metrics).unwrap_or(&[])
    }
}
