#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cachecheck_core::{BinaryResolver, HarnessConfig};
use tempfile::TempDir;

/// Scratch project: `tests/`, `keys/` and fake candidates under `bin/`.
pub struct Project {
    pub root: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.path().join("tests")
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.path().join("keys")
    }

    /// Workloads with the given capacities and a short fixed sequence.
    pub fn workloads(&self, capacities: &[u64]) -> &Self {
        let dir = self.tests_dir();
        fs::create_dir_all(&dir).unwrap();
        for (i, cap) in capacities.iter().enumerate() {
            let name = format!("test_{:06}.txt", i + 1);
            fs::write(dir.join(name), format!("{cap} 3 1 2 1\n")).unwrap();
        }
        self
    }

    pub fn keys(&self, policy: &str, content: &str) -> &Self {
        let dir = self.keys_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{policy}.txt")), content).unwrap();
        self
    }

    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let dir = self.path().join("bin");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Candidate that prints the workload's capacity.
    pub fn echo_capacity(&self, name: &str) -> PathBuf {
        self.script(name, "read cap n rest\necho \"$cap\"")
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            tests_dir: self.tests_dir(),
            keys_dir: self.keys_dir(),
            timeout: Duration::from_secs(5),
            ..HarnessConfig::default()
        }
    }

    /// Resolver isolated from the real environment and PATH.
    pub fn resolver(&self) -> BinaryResolver {
        BinaryResolver::new(self.path())
            .with_env(|_| None)
            .with_search_path(None)
    }
}
