//! Case classification.
//!
//! A case passes iff the candidate exited with code 0 and its trimmed stdout
//! equals the recorded key exactly. `timed_out` and `nonzero_rc` are
//! diagnostic sub-flags of a failure; they never change the pass/fail split.

use crate::exec::{CaseOutput, TIMEOUT_EXIT_CODE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub timed_out: bool,
    pub nonzero_rc: bool,
}

impl Verdict {
    pub fn classify(output: &CaseOutput, expected: &str) -> Self {
        Self {
            passed: output.exit_code == 0 && output.stdout == expected.trim(),
            timed_out: output.exit_code == TIMEOUT_EXIT_CODE,
            nonzero_rc: output.exit_code != 0,
        }
    }

    pub fn failed(&self) -> bool {
        !self.passed
    }
}

/// One (workload, policy) execution and its verdict. Consumed by the
/// aggregator right away.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseResult {
    pub workload: String,
    pub policy: String,
    pub expected: String,
    pub output: CaseOutput,
    pub verdict: Verdict,
}

impl CaseResult {
    pub fn new(
        workload: impl Into<String>,
        policy: impl Into<String>,
        expected: impl Into<String>,
        output: CaseOutput,
    ) -> Self {
        let expected = expected.into();
        let verdict = Verdict::classify(&output, &expected);
        Self {
            workload: workload.into(),
            policy: policy.into(),
            expected,
            output,
            verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn output(exit_code: i32, stdout: &str) -> CaseOutput {
        CaseOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
            elapsed: Duration::from_millis(3),
            timed_out: exit_code == TIMEOUT_EXIT_CODE,
        }
    }

    #[test]
    fn ok_requires_zero_exit_and_exact_match() {
        let v = Verdict::classify(&output(0, "17"), "17");
        assert_eq!(
            v,
            Verdict {
                passed: true,
                timed_out: false,
                nonzero_rc: false
            }
        );

        assert!(Verdict::classify(&output(0, "17"), "18").failed());
        assert!(Verdict::classify(&output(0, "17"), "017").failed());
    }

    #[test]
    fn trailing_whitespace_in_key_is_ignored() {
        assert!(Verdict::classify(&output(0, "17"), "17  ").passed);
    }

    #[test]
    fn nonzero_exit_fails_even_with_matching_output() {
        let v = Verdict::classify(&output(1, "17"), "17");
        assert!(v.failed());
        assert!(v.nonzero_rc);
        assert!(!v.timed_out);
    }

    #[test]
    fn nonzero_exit_with_empty_output_and_empty_key_still_fails() {
        let v = Verdict::classify(&output(2, ""), "");
        assert!(v.failed());
        assert!(v.nonzero_rc);
    }

    #[test]
    fn timeout_is_failure_timeout_and_nonzero() {
        let v = Verdict::classify(&output(TIMEOUT_EXIT_CODE, ""), "5");
        assert!(v.failed());
        assert!(v.timed_out);
        assert!(v.nonzero_rc);
    }

    #[test]
    fn case_result_classifies_on_construction() {
        let r = CaseResult::new("test_000001.txt", "lru", "9", output(0, "9"));
        assert!(r.verdict.passed);
        assert_eq!(r.policy, "lru");
    }
}
