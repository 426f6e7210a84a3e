//! Per-policy counters and the machine-readable run report.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EXIT_CASE_FAILURES, EXIT_SUCCESS};
use crate::resolver::PolicyBinding;
use crate::runner::HarnessConfig;
use crate::verdict::{CaseResult, Verdict};

/// Current schema version for the JSON report.
pub const SCHEMA_VERSION: u32 = 1;

/// Running counters of one policy.
///
/// `ok + fail` is the number of cases run. `timeout` and `nonzero_rc` count
/// failure causes and may overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub ok: usize,
    pub fail: usize,
    pub timeout: usize,
    pub nonzero_rc: usize,
}

impl PolicySummary {
    pub fn record(&mut self, verdict: &Verdict) {
        if verdict.passed {
            self.ok += 1;
        } else {
            self.fail += 1;
        }
        if verdict.timed_out {
            self.timeout += 1;
        }
        if verdict.nonzero_rc {
            self.nonzero_rc += 1;
        }
    }

    pub fn cases(&self) -> usize {
        self.ok + self.fail
    }
}

/// Aggregated state of a run, keyed by policy in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    policies: Vec<(String, PolicySummary)>,
    /// Cases executed so far.
    pub total_cases: usize,
    /// Set when `--stop-on-fail` cut the run short.
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn new<I, S>(policies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            policies: policies
                .into_iter()
                .map(|p| (p.into(), PolicySummary::default()))
                .collect(),
            total_cases: 0,
            stopped_early: false,
        }
    }

    /// Fold one case into its policy's counters.
    pub fn record(&mut self, result: &CaseResult) {
        self.total_cases += 1;
        let idx = match self.policies.iter().position(|(p, _)| *p == result.policy) {
            Some(idx) => idx,
            None => {
                self.policies
                    .push((result.policy.clone(), PolicySummary::default()));
                self.policies.len() - 1
            }
        };
        self.policies[idx].1.record(&result.verdict);
    }

    pub fn policy(&self, name: &str) -> Option<&PolicySummary> {
        self.policies
            .iter()
            .find(|(p, _)| p == name)
            .map(|(_, s)| s)
    }

    pub fn policies(&self) -> impl Iterator<Item = (&str, &PolicySummary)> {
        self.policies.iter().map(|(p, s)| (p.as_str(), s))
    }

    /// Failing cases across all policies.
    pub fn failures(&self) -> usize {
        self.policies.iter().map(|(_, s)| s.fail).sum()
    }

    /// 0 iff nothing failed.
    pub fn exit_code(&self) -> i32 {
        if self.failures() == 0 && !self.stopped_early {
            EXIT_SUCCESS
        } else {
            EXIT_CASE_FAILURES
        }
    }
}

/// Machine-readable report written by `run --json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version for compatibility detection
    pub schema_version: u32,

    /// RFC 3339 timestamp of report creation
    pub generated_at: String,

    pub tests_dir: String,
    pub keys_dir: String,
    pub timeout_secs: f64,
    pub stop_on_fail: bool,
    pub stopped_early: bool,
    pub total_cases: usize,
    pub failing_cases: usize,

    /// Process exit code of the run: 0=pass, 1=failures
    pub exit_code: i32,

    pub policies: Vec<PolicyReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyReport {
    pub name: String,
    pub executable: String,
    /// Resolver step that found the executable
    pub source: String,
    #[serde(flatten)]
    pub counts: PolicySummary,
}

impl RunReport {
    pub fn new(summary: &RunSummary, bindings: &[PolicyBinding], config: &HarnessConfig) -> Self {
        let policies = summary
            .policies()
            .map(|(name, counts)| {
                let binding = bindings.iter().find(|b| b.name == name);
                PolicyReport {
                    name: name.to_string(),
                    executable: binding
                        .map(|b| b.path.display().to_string())
                        .unwrap_or_default(),
                    source: binding.map(|b| b.source.to_string()).unwrap_or_default(),
                    counts: *counts,
                }
            })
            .collect();

        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: chrono::Utc::now().to_rfc3339(),
            tests_dir: config.tests_dir.display().to_string(),
            keys_dir: config.keys_dir.display().to_string(),
            timeout_secs: config.timeout.as_secs_f64(),
            stop_on_fail: config.stop_on_fail,
            stopped_early: summary.stopped_early,
            total_cases: summary.total_cases,
            failing_cases: summary.failures(),
            exit_code: summary.exit_code(),
            policies,
        }
    }

    pub fn write(&self, out: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(out, json)?;
        Ok(())
    }
}
