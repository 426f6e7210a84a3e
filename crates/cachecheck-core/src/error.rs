//! Error types for the harness.

use std::path::PathBuf;

/// All cases passed.
pub const EXIT_SUCCESS: i32 = 0;
/// One or more cases failed (including an early stop).
pub const EXIT_CASE_FAILURES: i32 = 1;
/// No workload files were found.
pub const EXIT_NO_WORKLOADS: i32 = 2;
/// One or more policy executables could not be resolved.
pub const EXIT_UNRESOLVED_BINARY: i32 = 3;
/// A key file is missing.
pub const EXIT_MISSING_KEYS: i32 = 4;
/// A key file does not have one line per workload.
pub const EXIT_KEY_COUNT_MISMATCH: i32 = 5;

/// Result alias for fallible harness setup.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Fatal configuration errors.
///
/// Every variant is detected before the first case executes and halts the
/// run. None of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The tests directory is missing or holds no `test_*.txt` files.
    #[error("no test_*.txt found in {}", dir.display())]
    NoWorkloads { dir: PathBuf },

    /// At least one requested policy has no executable.
    #[error("could not find executables for: {}", policies.join(", "))]
    Unresolved {
        policies: Vec<String>,
        flags: Vec<String>,
        env_vars: Vec<String>,
    },

    /// The key file for a policy does not exist.
    #[error("missing key file for {policy}: {}", path.display())]
    MissingKeys { policy: String, path: PathBuf },

    /// The key file line count differs from the workload count.
    #[error("keys/tests mismatch for {policy}: {keys} keys vs {workloads} tests")]
    KeyCountMismatch {
        policy: String,
        path: PathBuf,
        keys: usize,
        workloads: usize,
    },

    /// Arguments that passed parsing but cannot drive a run.
    #[error("invalid arguments: {message}")]
    InvalidArgs { message: String },

    /// Filesystem failure while listing workloads or reading keys.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoWorkloads { .. } => EXIT_NO_WORKLOADS,
            Self::Unresolved { .. } => EXIT_UNRESOLVED_BINARY,
            Self::MissingKeys { .. } => EXIT_MISSING_KEYS,
            Self::KeyCountMismatch { .. } => EXIT_KEY_COUNT_MISMATCH,
            Self::InvalidArgs { .. } | Self::Io { .. } => EXIT_NO_WORKLOADS,
        }
    }

    /// One-line actionable hint printed after the error.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NoWorkloads { dir } => Some(format!(
                "Hint: expected test_*.txt files in {}; pass --tests-dir or run `cachecheck generate --outdir {}`.",
                dir.display(),
                dir.display()
            )),
            Self::Unresolved {
                flags, env_vars, ..
            } => Some(format!(
                "Hint: pass {} or set {}.",
                flags.join("/"),
                env_vars.join("/")
            )),
            Self::MissingKeys { path, .. } => Some(format!(
                "Hint: expected {} with one line per workload; record it with `cachecheck record`.",
                path.display()
            )),
            Self::KeyCountMismatch {
                path, workloads, ..
            } => Some(format!(
                "Hint: make sure {} has {} lines, one per test, in the same sorted order as test_*.txt.",
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
                workloads
            )),
            Self::InvalidArgs { .. } | Self::Io { .. } => None,
        }
    }
}
