//! Process exit codes of `cachecheck`.
//! These codes are part of the public contract; scripts and CI depend on them.

pub use cachecheck_core::error::{
    EXIT_CASE_FAILURES, EXIT_KEY_COUNT_MISMATCH, EXIT_MISSING_KEYS, EXIT_NO_WORKLOADS,
    EXIT_SUCCESS, EXIT_UNRESOLVED_BINARY,
};

/// Bad arguments or an unexpected internal failure.
pub const EXIT_CONFIG_ERROR: i32 = 2;
