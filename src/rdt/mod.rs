//! Cache occupancy and memory bandwidth monitoring
//!
//! [`RdtMonitor`] owns a bounded pool of kernel monitoring groups. Slots are
//! started once per monitored group at setup and only released by
//! [`RdtMonitor::stop_all`] (or when the monitor is dropped), never one at a
//! time during sampling.
//!
//! # Example
//!
//! ```no_run
//! use pgos::rdt::{RdtMonitor, ResctrlBackend, DEFAULT_CAPACITY};
//!
//! let mut rdt = RdtMonitor::new(ResctrlBackend::new("/sys/fs/resctrl"), DEFAULT_CAPACITY);
//! let slot = rdt.start("web", &[1234, 1235])?;
//! let snapshot = rdt.poll(slot);
//! println!("LLC occupancy: {} KiB", snapshot.llc_kib());
//! rdt.stop_all();
//! # Ok::<(), pgos::Error>(())
//! ```

mod resctrl;
mod types;

pub use resctrl::{ResctrlBackend, DEFAULT_RESCTRL_ROOT};
pub use types::{RdtGroupId, RdtSnapshot, SlotHandle};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::traits::RdtBackend;
use crate::Pid;

/// Default number of monitoring slots
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug)]
struct RdtSlot {
    name: String,
    group: RdtGroupId,
}

/// Fixed-capacity pool of monitoring slots over an [`RdtBackend`]
#[derive(Debug)]
pub struct RdtMonitor<B: RdtBackend> {
    backend: B,
    capacity: usize,
    slots: Vec<RdtSlot>,
}

impl<B: RdtBackend> RdtMonitor<B> {
    pub fn new(backend: B, capacity: usize) -> Self {
        Self {
            backend,
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start monitoring `pids` in a new slot.
    ///
    /// Fails with [`Error::PoolExhausted`] once every slot is taken; existing
    /// slots are left untouched.
    pub fn start(&mut self, name: &str, pids: &[Pid]) -> Result<SlotHandle> {
        if self.slots.len() >= self.capacity {
            return Err(Error::PoolExhausted { capacity: self.capacity });
        }
        if pids.is_empty() {
            return Err(Error::rdt(format!("group {name} has no processes to monitor")));
        }

        let group = self.backend.start(name, pids)?;
        let handle = SlotHandle::new(self.slots.len());
        self.slots.push(RdtSlot {
            name: name.to_string(),
            group,
        });
        debug!(group = name, slot = handle.index(), pids = pids.len(), "started RDT monitoring");
        Ok(handle)
    }

    /// Poll one slot.
    ///
    /// A handle that does not name an active slot, or a backend failure,
    /// yields an all-zero snapshot.
    pub fn poll(&mut self, handle: SlotHandle) -> RdtSnapshot {
        let Some(slot) = self.slots.get(handle.index()) else {
            debug!(slot = handle.index(), active = self.slots.len(), "poll of inactive slot");
            return RdtSnapshot::default();
        };

        match self.backend.poll(slot.group) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(group = %slot.name, error = %e, "RDT poll failed");
                RdtSnapshot::default()
            }
        }
    }

    /// Release every active slot
    pub fn stop_all(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        let count = self.slots.len();
        for slot in self.slots.drain(..) {
            if let Err(e) = self.backend.stop(slot.group) {
                warn!(group = %slot.name, error = %e, "failed to stop RDT monitoring");
            }
        }
        info!(slots = count, "stopped RDT monitoring");
    }
}

impl<B: RdtBackend> Drop for RdtMonitor<B> {
    fn drop(&mut self) {
        self.stop_all();
    }
}
