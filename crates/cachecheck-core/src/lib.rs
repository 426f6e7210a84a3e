//! Black-box verification harness for cache-policy simulators.
//!
//! This crate runs external policy executables (LRU, LFU, Belady's optimal
//! or any other registered policy) against a directory of workload files and
//! compares every answer with a recorded key file:
//!
//! - Workload listing and strict workload parser
//! - Per-policy key store aligned with the sorted listing
//! - Executable resolution (explicit → env → build dir → project root → PATH)
//! - Sequential execution with a per-case wall-clock timeout
//! - Per-policy counters, console report and JSON report
//! - Key recording and a seeded workload generator
//!
//! # Quick Start
//!
//! ```no_run
//! use cachecheck_core::{BinaryResolver, Harness, HarnessConfig, PolicyRequest};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let resolver = BinaryResolver::new(".");
//! let requests = vec![PolicyRequest::new("lru"), PolicyRequest::new("lfu")];
//! let harness = Harness::prepare(HarnessConfig::default(), &requests, &resolver)?;
//!
//! let summary = harness.run(&mut std::io::stdout()).await?;
//! std::process::exit(summary.exit_code());
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `LRU_BIN` | Path to the LRU executable |
//! | `LFU_BIN` | Path to the LFU executable |
//! | `IDEAL_BIN` | Path to the optimal-policy executable |
//! | `<NAME>_BIN` | Path to the executable of any other policy |

pub mod error;
pub mod exec;
pub mod generate;
pub mod keys;
pub mod record;
pub mod report;
pub mod resolver;
pub mod runner;
pub mod verdict;
pub mod workload;

#[cfg(all(test, unix))]
mod test_support;

// Re-export main types
pub use error::{HarnessError, HarnessResult};
pub use exec::{execute, CaseOutput, ExecError, TIMEOUT_EXIT_CODE};
pub use generate::{generate, GeneratorConfig};
pub use keys::{load_key_sets, KeySet};
pub use record::{record_keys, RecordError, RecordedKeys};
pub use report::{PolicyReport, PolicySummary, RunReport, RunSummary};
pub use resolver::{
    BinaryResolver, PolicyBinding, PolicyRequest, ResolveSource, DEFAULT_POLICIES,
};
pub use runner::{Harness, HarnessConfig, DEFAULT_TIMEOUT};
pub use verdict::{CaseResult, Verdict};
pub use workload::{Workload, WorkloadError, WorkloadFile, WorkloadListing};
