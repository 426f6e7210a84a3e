#![cfg(unix)]
#![allow(deprecated)] // cargo_bin is deprecated but still supported by assert_cmd
//! Exit-code contract of `cachecheck run`.
//! Scripts and CI depend on these values; do not change them casually.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().expect("tempdir");
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn workloads(&self, capacities: &[u64]) {
        let tests = self.root().join("tests/tests");
        fs::create_dir_all(&tests).unwrap();
        for (i, cap) in capacities.iter().enumerate() {
            fs::write(
                tests.join(format!("test_{:06}.txt", i + 1)),
                format!("{cap} 2 0 1\n"),
            )
            .unwrap();
        }
    }

    fn keys(&self, policy: &str, content: &str) {
        let keys = self.root().join("tests/keys");
        fs::create_dir_all(&keys).unwrap();
        fs::write(keys.join(format!("{policy}.txt")), content).unwrap();
    }

    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn echo_capacity(&self, name: &str) -> PathBuf {
        self.script(name, "read cap rest\necho \"$cap\"")
    }

    /// `cachecheck run` in the fixture root with the policy env vars cleared.
    fn run(&self) -> Command {
        let mut cmd = Command::cargo_bin("cachecheck").expect("cachecheck binary");
        cmd.current_dir(self.root())
            .env_remove("LRU_BIN")
            .env_remove("LFU_BIN")
            .env_remove("IDEAL_BIN")
            .env_remove("RUST_LOG")
            .arg("run");
        cmd
    }
}

#[test]
fn exit_0_when_every_case_matches() {
    let f = Fixture::new();
    f.workloads(&[3, 1, 2]);
    f.keys("lru", "3\n1\n2\n");
    let exe = f.echo_capacity("lru-impl");

    f.run()
        .args(["--policy", "lru", "--lru-bin"])
        .arg(&exe)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Running 3 tests for programs: lru"))
        .stdout(predicate::str::contains(
            "lru: ok=3 fail=0 timeout=0 nonzero_rc=0",
        ))
        .stdout(predicate::str::contains("ALL GOOD (3 cases)"));
}

#[test]
fn exit_1_on_mismatch() {
    let f = Fixture::new();
    f.workloads(&[3, 1]);
    f.keys("lfu", "3\n7\n");
    let exe = f.echo_capacity("lfu-impl");

    f.run()
        .args(["--policy", "lfu", "--lfu-bin"])
        .arg(&exe)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[lfu] FAIL rc=0"))
        .stdout(predicate::str::contains("expected='7' got='1'"))
        .stdout(predicate::str::contains("FAILED (1 failing case / 2)"));
}

#[test]
fn exit_1_on_early_stop_with_json_report() {
    let f = Fixture::new();
    f.workloads(&[1, 2, 3]);
    f.keys("lru", "0\n2\n3\n");
    let exe = f.echo_capacity("lru-impl");
    let json = f.root().join("report.json");

    f.run()
        .args(["--policy", "lru", "--stop-on-fail", "--json"])
        .arg(&json)
        .arg("--lru-bin")
        .arg(&exe)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Stopping early due to --stop-on-fail."))
        .stdout(predicate::str::contains("Summary:").not());

    let report: Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(report["exit_code"], 1);
    assert_eq!(report["stopped_early"], true);
    assert_eq!(report["total_cases"], 1);
    assert_eq!(report["policies"][0]["source"], "explicit");
}

#[test]
fn env_var_resolves_the_executable() {
    let f = Fixture::new();
    f.workloads(&[4]);
    f.keys("ideal", "4\n");
    let exe = f.echo_capacity("ideal-impl");

    f.run()
        .env("IDEAL_BIN", &exe)
        .args(["--policy", "ideal"])
        .assert()
        .code(0);
}

#[test]
fn exit_2_without_workloads() {
    let f = Fixture::new();
    let exe = f.echo_capacity("lru-impl");

    f.run()
        .args(["--policy", "lru", "--lru-bin"])
        .arg(&exe)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no test_*.txt found"));
}

#[test]
fn exit_3_lists_every_unresolved_policy() {
    let f = Fixture::new();
    f.workloads(&[1]);

    f.run()
        .env("PATH", "")
        .assert()
        .code(3)
        .stderr(predicate::str::contains(
            "could not find executables for: lru, lfu, ideal",
        ))
        .stderr(predicate::str::contains(
            "Hint: pass --lru-bin/--lfu-bin/--ideal-bin or set LRU_BIN/LFU_BIN/IDEAL_BIN.",
        ));
}

#[test]
fn exit_4_when_a_key_file_is_missing() {
    let f = Fixture::new();
    f.workloads(&[1]);
    let exe = f.echo_capacity("lru-impl");

    f.run()
        .args(["--policy", "lru", "--lru-bin"])
        .arg(&exe)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("missing key file for lru"));
}

#[test]
fn exit_5_on_key_count_mismatch_without_running_cases() {
    let f = Fixture::new();
    f.workloads(&[1, 2, 3, 4, 5]);
    f.keys("lru", "1\n2\n3\n4\n");
    let exe = f.echo_capacity("lru-impl");

    f.run()
        .args(["--policy", "lru", "--lru-bin"])
        .arg(&exe)
        .assert()
        .code(5)
        .stdout(predicate::str::contains("Running").not())
        .stderr(predicate::str::contains(
            "keys/tests mismatch for lru: 4 keys vs 5 tests",
        ))
        .stderr(predicate::str::contains("lru.txt has 5 lines"));
}

#[test]
fn invalid_timeout_is_a_usage_error() {
    let f = Fixture::new();
    f.run().args(["--timeout", "0"]).assert().code(2);
}
