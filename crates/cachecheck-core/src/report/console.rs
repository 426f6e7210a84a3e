//! Human-readable report lines.
//!
//! Formatting is kept in pure functions so the exact text is unit-testable;
//! the `write_*` helpers only send those lines to a sink.

use std::io::{self, Write};

use crate::report::summary::{PolicySummary, RunSummary};
use crate::verdict::CaseResult;

pub fn format_run_header(workloads: usize, policies: &[&str]) -> String {
    format!(
        "Running {} tests for programs: {}",
        workloads,
        policies.join(", ")
    )
}

pub fn format_workload_header(name: &str, index: usize, total: usize) -> String {
    format!("==> {} ({}/{})", name, index + 1, total)
}

pub fn format_case_ok(r: &CaseResult) -> String {
    format!(
        "  [{}] OK  rc=0  {:.3}s  out={}",
        r.policy,
        r.output.elapsed.as_secs_f64(),
        r.output.stdout
    )
}

pub fn format_case_fail(r: &CaseResult) -> String {
    format!(
        "  [{}] FAIL rc={} {:.3}s; expected='{}' got='{}'",
        r.policy,
        r.output.exit_code,
        r.output.elapsed.as_secs_f64(),
        r.expected,
        r.output.stdout
    )
}

pub fn format_stderr(stderr: &str) -> String {
    format!("           stderr: {}", stderr)
}

pub fn format_policy_summary(name: &str, s: &PolicySummary) -> String {
    format!(
        "  {:>5}: ok={} fail={} timeout={} nonzero_rc={}",
        name, s.ok, s.fail, s.timeout, s.nonzero_rc
    )
}

pub fn format_verdict_line(summary: &RunSummary) -> String {
    let failures = summary.failures();
    if failures == 0 {
        format!("ALL GOOD ({} cases)", summary.total_cases)
    } else {
        format!(
            "FAILED ({} failing case{} / {})",
            failures,
            if failures == 1 { "" } else { "s" },
            summary.total_cases
        )
    }
}

/// Case line, plus stderr when a failure captured any. Passing cases are
/// only written in verbose mode.
pub fn write_case<W: Write>(out: &mut W, r: &CaseResult, verbose: bool) -> io::Result<()> {
    if r.verdict.passed {
        if verbose {
            writeln!(out, "{}", format_case_ok(r))?;
        }
        return Ok(());
    }
    writeln!(out, "{}", format_case_fail(r))?;
    if !r.output.stderr.is_empty() {
        writeln!(out, "{}", format_stderr(&r.output.stderr))?;
    }
    Ok(())
}

pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Summary:")?;
    for (name, counts) in summary.policies() {
        writeln!(out, "{}", format_policy_summary(name, counts))?;
    }
    writeln!(out)?;
    writeln!(out, "{}", format_verdict_line(summary))
}
