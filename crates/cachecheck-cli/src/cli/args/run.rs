//! Run and record command arguments.

use std::path::PathBuf;
use std::time::Duration;

use cachecheck_core::{BinaryResolver, HarnessConfig, PolicyRequest, DEFAULT_POLICIES};
use clap::Parser;
use tracing::warn;

/// Options shared by every command that drives candidate executables.
#[derive(Parser, Debug, Clone)]
pub struct HarnessArgs {
    /// Directory containing test_*.txt workloads
    #[arg(long, default_value = "tests/tests")]
    pub tests_dir: PathBuf,

    /// Directory containing one <policy>.txt key file per policy
    #[arg(long, default_value = "tests/keys")]
    pub keys_dir: PathBuf,

    /// Policy to check, repeatable; order is kept (default: lru, lfu, ideal)
    #[arg(long = "policy", value_name = "NAME")]
    pub policies: Vec<String>,

    /// Path to the LRU executable
    #[arg(long, value_name = "PATH")]
    pub lru_bin: Option<PathBuf>,

    /// Path to the LFU executable
    #[arg(long, value_name = "PATH")]
    pub lfu_bin: Option<PathBuf>,

    /// Path to the optimal-policy executable
    #[arg(long, value_name = "PATH")]
    pub ideal_bin: Option<PathBuf>,

    /// Executable for any policy, as NAME=PATH (repeatable)
    #[arg(long = "bin", value_name = "NAME=PATH", value_parser = parse_binding)]
    pub bins: Vec<(String, PathBuf)>,

    /// Root searched for build/<name> and <name> executables
    /// (default: the current directory, not the location of cachecheck)
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,

    /// Per-case wall-clock timeout in seconds
    #[arg(long, default_value = "2.0", value_parser = parse_timeout)]
    pub timeout: Duration,
}

impl HarnessArgs {
    /// Requested policy names, deduplicated, in command-line order.
    pub fn policy_names(&self) -> Vec<String> {
        if self.policies.is_empty() {
            return DEFAULT_POLICIES.iter().map(|p| p.to_string()).collect();
        }
        let mut names: Vec<String> = Vec::with_capacity(self.policies.len());
        for p in &self.policies {
            if !names.contains(p) {
                names.push(p.clone());
            }
        }
        names
    }

    /// Requests with explicit overrides attached. A dedicated `--<name>-bin`
    /// flag wins over `--bin name=...`; among `--bin` values the last wins.
    pub fn policy_requests(&self) -> Vec<PolicyRequest> {
        let names = self.policy_names();
        for (name, _) in &self.bins {
            if !names.contains(name) {
                warn!(policy = %name, "--bin given for a policy that is not requested");
            }
        }

        names
            .into_iter()
            .map(|name| {
                let dedicated = match name.as_str() {
                    "lru" => self.lru_bin.clone(),
                    "lfu" => self.lfu_bin.clone(),
                    "ideal" => self.ideal_bin.clone(),
                    _ => None,
                };
                let generic = self
                    .bins
                    .iter()
                    .rev()
                    .find(|(n, _)| *n == name)
                    .map(|(_, p)| p.clone());
                let request = PolicyRequest::new(name);
                match dedicated.or(generic) {
                    Some(path) => request.with_explicit(path),
                    None => request,
                }
            })
            .collect()
    }

    pub fn resolver(&self) -> BinaryResolver {
        BinaryResolver::new(&self.project_root)
    }

    pub fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            tests_dir: self.tests_dir.clone(),
            keys_dir: self.keys_dir.clone(),
            timeout: self.timeout,
            ..HarnessConfig::default()
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub harness: HarnessArgs,

    /// Abort on the first failing case (exit 1)
    #[arg(long)]
    pub stop_on_fail: bool,

    /// Print every case, not only failures
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write a JSON summary to this file
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct RecordArgs {
    #[command(flatten)]
    pub harness: HarnessArgs,
}

fn parse_binding(s: &str) -> Result<(String, PathBuf), String> {
    let (name, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() || path.is_empty() {
        return Err(format!("expected NAME=PATH, got '{s}'"));
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number of seconds"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds, got '{s}'"));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}
