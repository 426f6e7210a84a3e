//! Recorded expected answers ("keys").
//!
//! Each policy has `<keys-dir>/<policy>.txt` holding one line per workload,
//! aligned by position with the sorted workload listing.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

/// Path of the key file for `policy`.
pub fn key_file_path(keys_dir: &Path, policy: &str) -> PathBuf {
    keys_dir.join(format!("{policy}.txt"))
}

/// Expected outputs of one policy, in workload order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySet {
    policy: String,
    path: PathBuf,
    lines: Vec<String>,
}

impl KeySet {
    /// Build from file content. Lines are trimmed so that they compare equal
    /// to what a correct program prints.
    pub fn parse(policy: impl Into<String>, path: impl Into<PathBuf>, content: &str) -> Self {
        Self {
            policy: policy.into(),
            path: path.into(),
            lines: content.lines().map(|l| l.trim().to_string()).collect(),
        }
    }

    /// Read `<keys_dir>/<policy>.txt`.
    pub fn load(keys_dir: &Path, policy: &str) -> HarnessResult<Self> {
        let path = key_file_path(keys_dir, policy);
        if !path.is_file() {
            return Err(HarnessError::MissingKeys {
                policy: policy.to_string(),
                path,
            });
        }
        let content = fs::read_to_string(&path).map_err(|source| HarnessError::Io {
            path: path.clone(),
            source,
        })?;
        let keys = Self::parse(policy, path, &content);
        debug!(policy, keys = keys.len(), path = %keys.path.display(), "loaded keys");
        Ok(keys)
    }

    /// Enforce one key per workload. A mismatch is never truncated.
    pub fn validate_against(&self, workloads: usize) -> HarnessResult<()> {
        if self.lines.len() != workloads {
            return Err(HarnessError::KeyCountMismatch {
                policy: self.policy.clone(),
                path: self.path.clone(),
                keys: self.lines.len(),
                workloads,
            });
        }
        Ok(())
    }

    /// Expected output for the workload at `index` in the sorted listing.
    pub fn expected(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn policy(&self) -> &str {
        &self.policy
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Load and validate the key sets of `policies`, in order. Stops at the first
/// missing file or count mismatch.
pub fn load_key_sets(
    keys_dir: &Path,
    policies: &[&str],
    workloads: usize,
) -> HarnessResult<Vec<KeySet>> {
    policies
        .iter()
        .map(|policy| {
            let keys = KeySet::load(keys_dir, policy)?;
            keys.validate_against(workloads)?;
            Ok(keys)
        })
        .collect()
}
