use super::*;
use std::fs;
use std::io::Cursor;

fn cgroup_dir(membership: &str, file: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(file), membership).unwrap();
    dir
}

#[test]
fn test_read_pids_all_valid() {
    let pids = read_pids(Cursor::new("10\n20\n30\n"), Path::new("tasks"));
    assert_eq!(pids, vec![10, 20, 30]);
}

#[test]
fn test_read_pids_stops_at_first_bad_line() {
    let pids = read_pids(Cursor::new("10\n20\nnot-a-pid\n30\n"), Path::new("tasks"));
    assert_eq!(pids, vec![10, 20]);
}

#[test]
fn test_read_pids_blank_line_truncates() {
    let pids = read_pids(Cursor::new("7\n\n8\n"), Path::new("tasks"));
    assert_eq!(pids, vec![7]);
}

#[test]
fn test_read_pids_rejects_negative() {
    let pids = read_pids(Cursor::new("5\n-1\n"), Path::new("tasks"));
    assert_eq!(pids, vec![5]);
}

#[test]
fn test_read_pids_keeps_first_occurrence_order() {
    let pids = read_pids(Cursor::new("3\n1\n3\n2\n1\n"), Path::new("tasks"));
    assert_eq!(pids, vec![3, 1, 2]);
}

#[test]
fn test_read_pids_empty() {
    let pids = read_pids(Cursor::new(""), Path::new("tasks"));
    assert!(pids.is_empty());
}

#[test]
fn test_resolve_uses_tasks_file() {
    let dir = cgroup_dir("100\n200\n", TASKS_FILE);
    let group = GroupRegistry::resolve(dir.path()).unwrap();

    assert_eq!(group.pids(), &[100, 200]);
    assert_eq!(group.path(), dir.path());
    assert_eq!(group.name(), dir.path().file_name().unwrap().to_str().unwrap());
    assert!(group.rdt().is_none());
}

#[test]
fn test_resolve_falls_back_to_cgroup_procs() {
    let dir = cgroup_dir("42\n", PROCS_FILE);
    let group = GroupRegistry::resolve(dir.path()).unwrap();
    assert_eq!(group.pids(), &[42]);
}

#[test]
fn test_resolve_missing_path() {
    let err = GroupRegistry::resolve(Path::new("/nonexistent/pgos/group")).unwrap_err();
    assert!(matches!(err, Error::PathUnavailable { .. }));
}

#[test]
fn test_resolve_without_membership_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = GroupRegistry::resolve(dir.path()).unwrap_err();
    match err {
        Error::PathUnavailable { path, .. } => assert!(path.ends_with(PROCS_FILE)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_load_skips_unavailable_groups() {
    let a = cgroup_dir("1\n", TASKS_FILE);
    let b = cgroup_dir("2\n3\n", TASKS_FILE);
    let missing = a.path().join("gone");

    let registry = GroupRegistry::load([a.path(), missing.as_path(), b.path()]);

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.groups()[0].pids(), &[1]);
    assert_eq!(registry.groups()[1].pids(), &[2, 3]);
}

#[test]
fn test_load_skips_duplicate_paths() {
    let a = cgroup_dir("1\n", TASKS_FILE);
    let alias = a.path().join(".").join("..").join(a.path().file_name().unwrap());

    let registry = GroupRegistry::load([a.path(), a.path(), alias.as_path()]);

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.groups()[0].pids(), &[1]);
}

#[test]
fn test_read_pids_rejects_out_of_range() {
    let pids = read_pids(Cursor::new("5\n4294967295\n6\n"), Path::new("tasks"));
    assert_eq!(pids, vec![5]);

    let pids = read_pids(Cursor::new("5\n0\n6\n"), Path::new("tasks"));
    assert_eq!(pids, vec![5]);

    let pids = read_pids(Cursor::new("2147483647\n2147483648\n"), Path::new("tasks"));
    assert_eq!(pids, vec![2_147_483_647]);
}

#[test]
fn test_group_name_is_last_component() {
    assert_eq!(group_name(Path::new("/sys/fs/cgroup/perf_event/web/")), "web");
    assert_eq!(group_name(Path::new("batch")), "batch");
    assert_eq!(group_name(Path::new("/")), "/");
}

#[test]
fn test_counter_targets_process_scope() {
    let group = MonitoredGroup::from_pids("g", [4, 5, 4]);
    assert_eq!(
        group.counter_targets(CounterScope::Process),
        vec![CounterTarget::Process(4), CounterTarget::Process(5)]
    );
}

#[test]
fn test_counter_targets_cgroup_scope() {
    let dir = cgroup_dir("1\n2\n", TASKS_FILE);
    let group = GroupRegistry::resolve(dir.path()).unwrap();
    let targets = group.counter_targets(CounterScope::Cgroup);
    assert_eq!(targets.len(), 1);
    assert!(matches!(targets[0], CounterTarget::Cgroup(fd) if fd >= 0));

    let detached = MonitoredGroup::from_pids("g", [1]);
    assert!(detached.counter_targets(CounterScope::Cgroup).is_empty());
}

#[test]
fn test_attach_rdt() {
    let mut group = MonitoredGroup::from_pids("g", [1]);
    group.attach_rdt(SlotHandle::new(3));
    assert_eq!(group.rdt(), Some(SlotHandle::new(3)));
}
