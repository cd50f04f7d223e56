//! Monitored process groups
//!
//! A group is a control-group directory whose task-membership file is read
//! exactly once, when the group is resolved. Later membership changes are not
//! tracked.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::perf::{CounterScope, CounterTarget};
use crate::rdt::SlotHandle;
use crate::Pid;

/// Membership file of a cgroup v1 hierarchy
pub const TASKS_FILE: &str = "tasks";

/// Membership file of a cgroup v2 hierarchy
pub const PROCS_FILE: &str = "cgroup.procs";

/// Largest pid the kernel can hand out; `perf_event_open` takes an `i32`
const MAX_PID: Pid = i32::MAX as Pid;

/// A set of processes sampled together
#[derive(Debug)]
pub struct MonitoredGroup {
    name: String,
    path: PathBuf,
    pids: Vec<Pid>,
    rdt: Option<SlotHandle>,
    dir: Option<File>,
}

impl MonitoredGroup {
    /// Build a group from an explicit pid list, with no backing directory
    pub fn from_pids(name: impl Into<String>, pids: impl IntoIterator<Item = Pid>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            pids: dedup(pids),
            rdt: None,
            dir: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pids(&self) -> &[Pid] {
        &self.pids
    }

    /// RDT slot attached by the monitor, if monitoring could be started
    pub fn rdt(&self) -> Option<SlotHandle> {
        self.rdt
    }

    pub fn attach_rdt(&mut self, handle: SlotHandle) {
        self.rdt = Some(handle);
    }

    /// Targets to open counters against under `scope`
    pub fn counter_targets(&self, scope: CounterScope) -> Vec<CounterTarget> {
        match scope {
            CounterScope::Process => self.pids.iter().copied().map(CounterTarget::Process).collect(),
            CounterScope::Cgroup => match &self.dir {
                Some(dir) => vec![CounterTarget::Cgroup(dir.as_raw_fd())],
                None => {
                    warn!(group = %self.name, "no cgroup directory to count against");
                    Vec::new()
                }
            },
        }
    }
}

/// Groups resolved at startup
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<MonitoredGroup>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every path, skipping (and logging) the ones that cannot be opened.
    ///
    /// Paths naming a directory already loaded are skipped, so no process is
    /// counted twice.
    pub fn load<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut registry = Self::new();
        let mut seen = HashSet::new();
        for path in paths {
            let path = path.as_ref();
            let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            if !seen.insert(key) {
                warn!(path = %path.display(), "skipping duplicate group");
                continue;
            }
            match Self::resolve(path) {
                Ok(group) => registry.push(group),
                Err(e) => warn!(error = %e, "skipping group"),
            }
        }
        registry
    }

    /// Resolve one group directory into its current pid set.
    ///
    /// Reading stops at end of file or at the first line that is not a pid;
    /// whatever was parsed before that point is kept.
    pub fn resolve(path: &Path) -> Result<MonitoredGroup> {
        let dir = File::open(path).map_err(|e| Error::path_unavailable(path, e))?;
        let (membership_path, membership) = open_membership(path)?;
        let pids = read_pids(BufReader::new(membership), &membership_path);
        let name = group_name(path);
        debug!(group = %name, pids = pids.len(), "resolved group");

        Ok(MonitoredGroup {
            name,
            path: path.to_path_buf(),
            pids,
            rdt: None,
            dir: Some(dir),
        })
    }

    pub fn push(&mut self, group: MonitoredGroup) {
        self.groups.push(group);
    }

    pub fn groups(&self) -> &[MonitoredGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [MonitoredGroup] {
        &mut self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

fn open_membership(dir: &Path) -> Result<(PathBuf, File)> {
    let tasks = dir.join(TASKS_FILE);
    match File::open(&tasks) {
        Ok(file) => Ok((tasks, file)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let procs = dir.join(PROCS_FILE);
            let file = File::open(&procs).map_err(|e| Error::path_unavailable(&procs, e))?;
            Ok((procs, file))
        }
        Err(e) => Err(Error::path_unavailable(tasks, e)),
    }
}

/// Parse one pid per line until end of stream or the first bad line.
pub(crate) fn read_pids<R: BufRead>(reader: R, source: &Path) -> Vec<Pid> {
    let mut seen = HashSet::new();
    let mut pids = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(path = %source.display(), error = %e, "membership read interrupted");
                break;
            }
        };
        match line.trim().parse::<Pid>().ok().filter(|pid| (1..=MAX_PID).contains(pid)) {
            Some(pid) => {
                if seen.insert(pid) {
                    pids.push(pid);
                }
            }
            None => {
                warn!(error = %Error::parse(source, idx + 1, line), "truncating pid list");
                break;
            }
        }
    }
    pids
}

/// Last component of the group path
fn group_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn dedup(pids: impl IntoIterator<Item = Pid>) -> Vec<Pid> {
    let mut seen = HashSet::new();
    pids.into_iter().filter(|pid| seen.insert(*pid)).collect()
}

#[cfg(test)]
mod tests;
