use std::time::Duration;

const MIB: f64 = 1024.0 * 1024.0;

/// Index of a started slot in an [`RdtMonitor`](crate::rdt::RdtMonitor) pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotHandle(usize);

impl SlotHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Backend-assigned identifier of a kernel monitoring group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RdtGroupId(pub u64);

/// One poll of a monitoring group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RdtSnapshot {
    /// Current last-level cache occupancy
    pub llc_occupancy_bytes: u64,
    /// Local memory traffic since the previous poll
    pub mbm_local_delta_bytes: u64,
    /// Remote memory traffic since the previous poll
    pub mbm_remote_delta_bytes: u64,
}

impl RdtSnapshot {
    /// LLC occupancy in whole KiB
    pub fn llc_kib(&self) -> u64 {
        self.llc_occupancy_bytes / 1024
    }

    /// Local bandwidth in MiB/s averaged over `period`
    pub fn local_mib_per_sec(&self, period: Duration) -> f64 {
        rate(self.mbm_local_delta_bytes, period)
    }

    /// Remote bandwidth in MiB/s averaged over `period`
    pub fn remote_mib_per_sec(&self, period: Duration) -> f64 {
        rate(self.mbm_remote_delta_bytes, period)
    }
}

fn rate(bytes: u64, period: Duration) -> f64 {
    let secs = period.as_secs_f64();
    if secs == 0.0 {
        return 0.0;
    }
    bytes as f64 / MIB / secs
}
