//! Key recording: run reference executables and store their answers as key
//! files, one line per workload in sorted order.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::exec::{execute, ExecError};
use crate::keys::key_file_path;
use crate::resolver::PolicyBinding;
use crate::workload::WorkloadListing;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("{policy} failed on {workload} (rc={exit_code}): {stderr}")]
    CaseFailed {
        policy: String,
        workload: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("{policy} printed more than one line for {workload}")]
    MultiLine { policy: String, workload: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A key file written by [`record_keys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedKeys {
    pub policy: String,
    pub path: PathBuf,
    pub lines: usize,
}

/// Record a key file for every binding. Each file is written only after all
/// of its workloads succeeded, so a failure never leaves a short key file.
pub async fn record_keys<W: Write>(
    workloads: &WorkloadListing,
    bindings: &[PolicyBinding],
    keys_dir: &Path,
    timeout: Duration,
    out: &mut W,
) -> Result<Vec<RecordedKeys>, RecordError> {
    fs::create_dir_all(keys_dir).map_err(|source| RecordError::Write {
        path: keys_dir.to_path_buf(),
        source,
    })?;

    let mut recorded = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let mut lines = Vec::with_capacity(workloads.len());
        for workload in workloads {
            let output = execute(&binding.path, &workload.path, timeout).await?;
            if output.exit_code != 0 {
                return Err(RecordError::CaseFailed {
                    policy: binding.name.clone(),
                    workload: workload.name.clone(),
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                });
            }
            if output.stdout.contains('\n') {
                return Err(RecordError::MultiLine {
                    policy: binding.name.clone(),
                    workload: workload.name.clone(),
                });
            }
            lines.push(output.stdout);
        }

        let path = key_file_path(keys_dir, &binding.name);
        write_key_file(&path, &lines)?;
        info!(policy = %binding.name, lines = lines.len(), path = %path.display(), "recorded keys");
        writeln!(out, "  [{}] {} keys -> {}", binding.name, lines.len(), path.display())
            .map_err(|source| RecordError::Write {
                path: path.clone(),
                source,
            })?;
        recorded.push(RecordedKeys {
            policy: binding.name.clone(),
            path,
            lines: lines.len(),
        });
    }
    Ok(recorded)
}

fn write_key_file(path: &Path, lines: &[String]) -> Result<(), RecordError> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    let tmp = path.with_extension("txt.tmp");
    fs::write(&tmp, content)
        .and_then(|()| fs::rename(&tmp, path))
        .map_err(|source| RecordError::Write {
            path: path.to_path_buf(),
            source,
        })
}
