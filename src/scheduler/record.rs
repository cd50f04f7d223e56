use std::fmt;
use std::io::Write;

use crate::error::Result;
use crate::traits::RecordSink;

/// Names of the RDT-derived records emitted for every group
pub const LLC_OCCUPANCY: &str = "LLC occupancy";
pub const MEMORY_BANDWIDTH_LOCAL: &str = "Memory bandwidth local";
pub const MEMORY_BANDWIDTH_REMOTE: &str = "Memory bandwidth remote";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// Event counts and KiB of occupancy
    Count(u64),
    /// MiB/s
    Rate(f64),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(v) => write!(f, "{v}"),
            Self::Rate(v) => write!(f, "{v}"),
        }
    }
}

/// One sampled value
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub group: String,
    pub metric: String,
    /// Unix seconds at the start of the cycle
    pub timestamp: u64,
    pub value: MetricValue,
}

impl OutputRecord {
    pub fn new(group: impl Into<String>, metric: impl Into<String>, timestamp: u64, value: MetricValue) -> Self {
        Self {
            group: group.into(),
            metric: metric.into(),
            timestamp,
            value,
        }
    }
}

/// `<group>\t<metric>\t<unix-seconds>\t<value>`
impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}\t{}", self.group, self.metric, self.timestamp, self.value)
    }
}

/// Writes one tab-separated line per record
#[derive(Debug)]
pub struct TsvSink<W: Write> {
    out: W,
}

impl<W: Write> TsvSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for TsvSink<W> {
    fn emit(&mut self, record: &OutputRecord) -> Result<()> {
        writeln!(self.out, "{record}")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Collects records in memory
impl RecordSink for Vec<OutputRecord> {
    fn emit(&mut self, record: &OutputRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}
