use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::rdt::types::{RdtGroupId, RdtSnapshot};
use crate::traits::RdtBackend;
use crate::Pid;

/// Usual mount point of the resctrl filesystem
pub const DEFAULT_RESCTRL_ROOT: &str = "/sys/fs/resctrl";

const L3_MON_INFO: &str = "info/L3_MON";
const MON_GROUPS: &str = "mon_groups";
const MON_DATA: &str = "mon_data";
const L3_DOMAIN_PREFIX: &str = "mon_L3_";
const LLC_OCCUPANCY: &str = "llc_occupancy";
const MBM_LOCAL: &str = "mbm_local_bytes";
const MBM_TOTAL: &str = "mbm_total_bytes";
const UNAVAILABLE: &str = "Unavailable";

/// Cumulative counters summed over every L3 domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MonCounters {
    llc: u64,
    local: u64,
    total: u64,
}

impl MonCounters {
    fn remote(&self) -> u64 {
        self.total.saturating_sub(self.local)
    }
}

#[derive(Debug)]
struct MonGroup {
    dir: PathBuf,
    last: MonCounters,
}

/// RDT monitoring through the Linux resctrl filesystem.
///
/// Every started group becomes a `mon_groups/` directory whose `tasks` file
/// receives the member pids. Bandwidth deltas are computed against the
/// previous poll, or against the baseline read when the group was created.
#[derive(Debug)]
pub struct ResctrlBackend {
    root: PathBuf,
    next_id: u64,
    groups: HashMap<u64, MonGroup>,
}

impl ResctrlBackend {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            next_id: 0,
            groups: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the mounted resctrl exposes L3 monitoring
    pub fn is_supported(&self) -> bool {
        self.root.join(L3_MON_INFO).is_dir()
    }

    fn group_dir(&self, id: u64, name: &str) -> PathBuf {
        let label: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root
            .join(MON_GROUPS)
            .join(format!("pgos-{}-{id}-{label}", std::process::id()))
    }
}

impl RdtBackend for ResctrlBackend {
    fn start(&mut self, name: &str, pids: &[Pid]) -> Result<RdtGroupId> {
        if !self.is_supported() {
            return Err(Error::rdt(format!(
                "L3 monitoring not available under {}",
                self.root.display()
            )));
        }

        if pids.is_empty() {
            return Err(Error::rdt(format!("no pids to monitor for {name}")));
        }

        let id = self.next_id;
        let dir = self.group_dir(id, name);
        fs::create_dir(&dir).map_err(|e| Error::rdt(format!("create {}: {e}", dir.display())))?;

        // Remove the half-built group again if populating it fails.
        let guard = scopeguard::guard(dir, |dir| {
            if let Err(e) = fs::remove_dir(&dir) {
                warn!(dir = %dir.display(), error = %e, "failed to remove monitoring group");
            }
        });

        let assigned = assign_tasks(&guard, pids)?;
        if assigned == 0 {
            return Err(Error::rdt(format!("none of {} pids could be assigned to {name}", pids.len())));
        }

        let last = read_counters(&guard).unwrap_or_else(|e| {
            debug!(group = name, error = %e, "no baseline, starting from zero");
            MonCounters::default()
        });

        let dir = scopeguard::ScopeGuard::into_inner(guard);
        debug!(group = name, dir = %dir.display(), assigned, "created monitoring group");
        self.groups.insert(id, MonGroup { dir, last });
        self.next_id += 1;
        Ok(RdtGroupId(id))
    }

    fn poll(&mut self, group: RdtGroupId) -> Result<RdtSnapshot> {
        let mon = self
            .groups
            .get_mut(&group.0)
            .ok_or_else(|| Error::rdt(format!("unknown monitoring group {}", group.0)))?;

        let now = read_counters(&mon.dir)?;
        let snapshot = RdtSnapshot {
            llc_occupancy_bytes: now.llc,
            mbm_local_delta_bytes: now.local.saturating_sub(mon.last.local),
            mbm_remote_delta_bytes: now.remote().saturating_sub(mon.last.remote()),
        };
        trace!(dir = %mon.dir.display(), ?now, ?snapshot, "polled monitoring group");
        mon.last = now;
        Ok(snapshot)
    }

    fn stop(&mut self, group: RdtGroupId) -> Result<()> {
        let mon = self
            .groups
            .remove(&group.0)
            .ok_or_else(|| Error::rdt(format!("unknown monitoring group {}", group.0)))?;
        fs::remove_dir(&mon.dir).map_err(|e| Error::rdt(format!("remove {}: {e}", mon.dir.display())))?;
        debug!(dir = %mon.dir.display(), "removed monitoring group");
        Ok(())
    }
}

/// Write each pid to the group's `tasks` file, one per write.
///
/// Pids that have exited are skipped. Returns how many were assigned.
fn assign_tasks(dir: &Path, pids: &[Pid]) -> Result<usize> {
    let tasks = dir.join("tasks");
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&tasks)
        .map_err(|e| Error::rdt(format!("open {}: {e}", tasks.display())))?;

    let mut assigned = 0;
    for pid in pids {
        match file.write_all(format!("{pid}\n").as_bytes()) {
            Ok(()) => assigned += 1,
            Err(e) => warn!(pid, error = %e, "could not assign pid to monitoring group"),
        }
    }
    Ok(assigned)
}

fn read_counters(dir: &Path) -> Result<MonCounters> {
    let data = dir.join(MON_DATA);
    let entries = fs::read_dir(&data).map_err(|e| Error::rdt(format!("read {}: {e}", data.display())))?;

    let mut counters = MonCounters::default();
    for entry in entries {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().starts_with(L3_DOMAIN_PREFIX) {
            continue;
        }
        let domain = entry.path();
        counters.llc = counters.llc.saturating_add(read_value(&domain.join(LLC_OCCUPANCY))?);
        counters.local = counters.local.saturating_add(read_value(&domain.join(MBM_LOCAL))?);
        counters.total = counters.total.saturating_add(read_value(&domain.join(MBM_TOTAL))?);
    }
    Ok(counters)
}

/// Read one counter file; missing or unavailable counters read as zero
fn read_value(path: &Path) -> Result<u64> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(Error::rdt(format!("read {}: {e}", path.display()))),
    };
    let raw = raw.trim();
    if raw == UNAVAILABLE {
        trace!(path = %path.display(), "counter unavailable");
        return Ok(0);
    }
    raw.parse()
        .map_err(|_| Error::rdt(format!("unexpected value {raw:?} in {}", path.display())))
}
