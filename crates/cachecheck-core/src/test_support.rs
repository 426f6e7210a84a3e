//! Fixtures shared by unit tests.

use std::fs;
use std::path::{Path, PathBuf};

use crate::keys::key_file_path;
use crate::workload::workload_file_name;

/// Write an executable `/bin/sh` script.
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Candidate that answers with the workload's capacity.
pub(crate) fn echo_capacity_script(dir: &Path, name: &str) -> PathBuf {
    write_script(dir, name, "read cap n rest\necho \"$cap\"")
}

/// One workload per capacity, named `test_000001.txt` onward.
pub(crate) fn write_workloads(dir: &Path, capacities: &[u64]) {
    fs::create_dir_all(dir).unwrap();
    for (i, cap) in capacities.iter().enumerate() {
        fs::write(dir.join(workload_file_name(i + 1)), format!("{cap} 2 1 2\n")).unwrap();
    }
}

pub(crate) fn write_keys(dir: &Path, policy: &str, lines: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(key_file_path(dir, policy), content).unwrap();
}
