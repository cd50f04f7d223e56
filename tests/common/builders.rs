use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Builds a throwaway directory tree of cgroup-like group directories
pub struct CgroupTreeBuilder {
    root: TempDir,
    paths: Vec<PathBuf>,
}

impl CgroupTreeBuilder {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("temp dir"),
            paths: Vec::new(),
        }
    }

    /// Add a group whose `tasks` file lists `pids`
    pub fn with_group(mut self, name: &str, pids: &[u32]) -> Self {
        let dir = self.root.path().join(name);
        fs::create_dir_all(&dir).expect("group dir");
        let tasks: String = pids.iter().map(|p| format!("{p}\n")).collect();
        fs::write(dir.join("tasks"), tasks).expect("tasks file");
        self.paths.push(dir);
        self
    }

    /// Add a group using only the cgroup v2 membership file
    pub fn with_v2_group(mut self, name: &str, pids: &[u32]) -> Self {
        let dir = self.root.path().join(name);
        fs::create_dir_all(&dir).expect("group dir");
        let procs: String = pids.iter().map(|p| format!("{p}\n")).collect();
        fs::write(dir.join("cgroup.procs"), procs).expect("procs file");
        self.paths.push(dir);
        self
    }

    /// Add a path that does not exist
    pub fn with_missing_group(mut self, name: &str) -> Self {
        self.paths.push(self.root.path().join(name));
        self
    }

    /// The root directory must outlive the returned paths
    pub fn build(self) -> (TempDir, Vec<PathBuf>) {
        (self.root, self.paths)
    }
}
