//! Run orchestration.
//!
//! [`Harness::prepare`] performs every fatal check up front (workloads,
//! executables, keys) so that a configuration error never leaves a partial
//! run behind. [`Harness::run`] then walks workloads in sorted order and,
//! for each, the policies in registration order, one subprocess at a time.

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::exec::{execute, CaseOutput};
use crate::keys::{load_key_sets, KeySet};
use crate::report::console;
use crate::report::RunSummary;
use crate::resolver::{BinaryResolver, PolicyBinding, PolicyRequest};
use crate::verdict::CaseResult;
use crate::workload::WorkloadListing;

/// Per-case timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub tests_dir: PathBuf,
    pub keys_dir: PathBuf,
    pub timeout: Duration,
    /// Abort on the first failing case.
    pub stop_on_fail: bool,
    /// Print passing cases and per-workload headers too.
    pub verbose: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tests_dir: PathBuf::from("tests/tests"),
            keys_dir: PathBuf::from("tests/keys"),
            timeout: DEFAULT_TIMEOUT,
            stop_on_fail: false,
            verbose: false,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> HarnessResult<()> {
        if self.timeout.is_zero() {
            return Err(HarnessError::InvalidArgs {
                message: "timeout must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// A validated run: workloads listed, executables bound, keys aligned.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
    workloads: WorkloadListing,
    bindings: Vec<PolicyBinding>,
    keys: Vec<KeySet>,
}

impl Harness {
    /// Fatal checks, in order: workload listing, executables for all
    /// policies, then each policy's key file.
    pub fn prepare(
        config: HarnessConfig,
        requests: &[PolicyRequest],
        resolver: &BinaryResolver,
    ) -> HarnessResult<Self> {
        config.validate()?;
        if requests.is_empty() {
            return Err(HarnessError::InvalidArgs {
                message: "no policies requested".into(),
            });
        }

        let workloads = WorkloadListing::discover(&config.tests_dir)?;
        let bindings = resolver.resolve_all(requests)?;
        let names: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
        let keys = load_key_sets(&config.keys_dir, &names, workloads.len())?;

        Ok(Self {
            config,
            workloads,
            bindings,
            keys,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn workloads(&self) -> &WorkloadListing {
        &self.workloads
    }

    pub fn bindings(&self) -> &[PolicyBinding] {
        &self.bindings
    }

    /// Execute the full matrix, writing the report to `out`.
    ///
    /// Per-case failures never abort the loop unless `stop_on_fail` is set;
    /// then the first failure ends the run and no summary block is written.
    pub async fn run<W: Write>(&self, out: &mut W) -> io::Result<RunSummary> {
        let names: Vec<&str> = self.bindings.iter().map(|b| b.name.as_str()).collect();
        let total = self.workloads.len();
        let mut summary = RunSummary::new(names.iter().copied());

        info!(workloads = total, policies = ?names, timeout = ?self.config.timeout, "starting run");
        writeln!(out, "{}", console::format_run_header(total, &names))?;
        writeln!(out)?;

        for (idx, workload) in self.workloads.iter().enumerate() {
            if self.config.verbose {
                writeln!(
                    out,
                    "{}",
                    console::format_workload_header(&workload.name, idx, total)
                )?;
            }

            for (binding, keys) in self.bindings.iter().zip(&self.keys) {
                let expected = keys.expected(idx).unwrap_or_default();
                let started = Instant::now();
                let output = match execute(&binding.path, &workload.path, self.config.timeout).await
                {
                    Ok(output) => output,
                    Err(e) => {
                        warn!(policy = %binding.name, workload = %workload.name, error = %e, "case could not run");
                        CaseOutput::from_exec_error(&e, started.elapsed())
                    }
                };

                let result = CaseResult::new(&workload.name, &binding.name, expected, output);
                summary.record(&result);
                console::write_case(out, &result, self.config.verbose)?;

                if result.verdict.failed() && self.config.stop_on_fail {
                    summary.stopped_early = true;
                    writeln!(out)?;
                    writeln!(out, "Stopping early due to --stop-on-fail.")?;
                    out.flush()?;
                    info!(cases = summary.total_cases, "stopped early");
                    return Ok(summary);
                }
            }
        }

        console::write_summary(out, &summary)?;
        out.flush()?;
        info!(
            cases = summary.total_cases,
            failures = summary.failures(),
            "run finished"
        );
        Ok(summary)
    }
}
